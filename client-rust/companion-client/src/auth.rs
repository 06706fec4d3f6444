use crate::error::ClientError;
use crate::remote::RemoteStore;
use crate::session::{Session, SessionContext};
use common_lib::api::{AuthResponse, SignInRequest, SignUpRequest};
use common_lib::validation::{self, Contact, ValidationError};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistrationStep {
    Contact,
    Password,
    Profile,
    Done,
}

/// Collects registration data one screen at a time; each step validates
/// its input before moving on.
#[derive(Clone, Debug)]
pub struct RegistrationWizard {
    step: RegistrationStep,
    contact: Option<Contact>,
    password: Option<String>,
    name: Option<String>,
}

impl Default for RegistrationWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationWizard {
    pub fn new() -> Self {
        RegistrationWizard {
            step: RegistrationStep::Contact,
            contact: None,
            password: None,
            name: None,
        }
    }

    pub fn step(&self) -> RegistrationStep {
        self.step
    }

    pub fn contact(&self) -> Option<&Contact> {
        self.contact.as_ref()
    }

    pub fn submit_contact(&mut self, contact: &str) -> Result<RegistrationStep, ClientError> {
        self.contact = Some(validation::parse_contact(contact)?);
        self.step = RegistrationStep::Password;
        Ok(self.step)
    }

    pub fn submit_password(
        &mut self,
        password: &str,
        confirmation: &str,
    ) -> Result<RegistrationStep, ClientError> {
        if self.step == RegistrationStep::Contact {
            return Err(ValidationError::MissingField("contact").into());
        }
        validation::validate_password(password)?;
        if password != confirmation {
            return Err(ClientError::Validation("Passwords do not match".to_string()));
        }

        self.password = Some(password.to_string());
        self.step = RegistrationStep::Profile;
        Ok(self.step)
    }

    pub fn submit_name(&mut self, name: &str) -> Result<RegistrationStep, ClientError> {
        if self.password.is_none() {
            return Err(ValidationError::MissingField("password").into());
        }
        let name = name.trim();
        validation::validate_display_name(name)?;

        self.name = Some(name.to_string());
        self.step = RegistrationStep::Done;
        Ok(self.step)
    }

    /// Returns to the previous step, keeping what was entered.
    pub fn back(&mut self) -> RegistrationStep {
        self.step = match self.step {
            RegistrationStep::Contact | RegistrationStep::Password => RegistrationStep::Contact,
            RegistrationStep::Profile => RegistrationStep::Password,
            RegistrationStep::Done => RegistrationStep::Profile,
        };
        self.step
    }

    pub fn request(&self) -> Result<SignUpRequest, ClientError> {
        match (self.step, &self.contact, &self.password, &self.name) {
            (RegistrationStep::Done, Some(contact), Some(password), Some(name)) => {
                Ok(SignUpRequest {
                    contact: contact.as_str().to_string(),
                    password: password.clone(),
                    name: name.clone(),
                })
            }
            (_, None, _, _) => Err(ValidationError::MissingField("contact").into()),
            (_, _, None, _) => Err(ValidationError::MissingField("password").into()),
            _ => Err(ValidationError::MissingField("name").into()),
        }
    }
}

/// Sign-in, registration and sign-out against the hosted auth provider.
pub struct AuthFlow {
    remote: Arc<dyn RemoteStore>,
    session: Arc<SessionContext>,
}

impl AuthFlow {
    pub fn new(remote: Arc<dyn RemoteStore>, session: Arc<SessionContext>) -> Self {
        AuthFlow { remote, session }
    }

    pub async fn sign_in(&self, contact: &str, password: &str) -> Result<Session, ClientError> {
        let contact = validation::parse_contact(contact)?;
        if password.is_empty() {
            return Err(ValidationError::MissingField("password").into());
        }

        let request = SignInRequest {
            contact: contact.as_str().to_string(),
            password: password.to_string(),
        };
        let response = match self.remote.sign_in(&request).await {
            Ok(response) => response,
            Err(ClientError::Unauthenticated) => {
                log::info!("sign in - rejected, contact: {}", request.contact);
                return Err(ClientError::Validation(
                    "Invalid contact or password".to_string(),
                ));
            }
            Err(e) => return Err(e),
        };

        self.start(response)
    }

    pub async fn register(&self, wizard: &RegistrationWizard) -> Result<Session, ClientError> {
        let request = wizard.request()?;
        let response = self.remote.sign_up(&request).await?;
        self.start(response)
    }

    pub fn sign_out(&self) -> Result<(), ClientError> {
        self.session.end()
    }

    fn start(&self, response: AuthResponse) -> Result<Session, ClientError> {
        if let Some(error) = response.error.filter(|_| !response.success) {
            return Err(if error.to_lowercase().contains("already") {
                ClientError::Conflict(error)
            } else {
                ClientError::Validation(error)
            });
        }

        match (response.user, response.access_token) {
            (Some(user), Some(token)) if !token.is_empty() => self.session.begin(user, token),
            _ => Err(ClientError::Malformed(
                "auth response without user or access token".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn wizard_at_profile() -> RegistrationWizard {
        let mut wizard = RegistrationWizard::new();
        wizard.submit_contact("Ada@Example.com").unwrap();
        wizard.submit_password("pedal2024", "pedal2024").unwrap();
        wizard
    }

    #[test]
    fn wizard_walks_all_steps() {
        let mut wizard = wizard_at_profile();

        assert_eq!(wizard.submit_name("  Ada  ").unwrap(), RegistrationStep::Done);
        assert_eq!(
            wizard.request().unwrap(),
            SignUpRequest {
                contact: "ada@example.com".to_string(),
                password: "pedal2024".to_string(),
                name: "Ada".to_string(),
            }
        );
    }

    #[test]
    fn wizard_rejects_bad_input_and_stays() {
        let mut wizard = RegistrationWizard::new();

        assert_matches!(wizard.submit_contact("not a contact"), Err(ClientError::Validation(_)));
        assert_eq!(wizard.step(), RegistrationStep::Contact);

        wizard.submit_contact("+44 20 7946 0958").unwrap();
        assert_matches!(wizard.submit_password("short", "short"), Err(ClientError::Validation(_)));
        assert_matches!(
            wizard.submit_password("pedal2024", "pedal2025"),
            Err(ClientError::Validation(m)) if m == "Passwords do not match"
        );
        assert_eq!(wizard.step(), RegistrationStep::Password);
    }

    #[test]
    fn incomplete_wizard_has_no_request() {
        let mut wizard = wizard_at_profile();

        assert_matches!(wizard.request(), Err(ClientError::Validation(_)));
        assert_eq!(wizard.back(), RegistrationStep::Password);
        assert_eq!(wizard.back(), RegistrationStep::Contact);
        assert_eq!(wizard.contact(), Some(&Contact::Email("ada@example.com".to_string())));
    }
}
