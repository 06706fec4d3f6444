use email_address::EmailAddress;
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_POST_LENGTH: usize = 2000;
pub const MAX_COMMENT_LENGTH: usize = 1000;
pub const MAX_NAME_LENGTH: usize = 64;

static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("valid phone pattern"));

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters and contain a letter and a digit")]
    WeakPassword,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field {field} is longer than {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Sign-in identifier: riders register with either an email or a phone number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Contact {
    Email(String),
    Phone(String),
}

impl Contact {
    pub fn as_str(&self) -> &str {
        match self {
            Contact::Email(value) | Contact::Phone(value) => value,
        }
    }
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    EmailAddress::from_str(email)
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidEmail(e.to_string()))
}

/// Normalizes a phone number (spaces, dashes and parentheses are dropped)
/// and checks it looks like an international number.
pub fn normalize_phone(phone: &str) -> Result<String, ValidationError> {
    let normalized: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    if PHONE_REGEX.is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(ValidationError::InvalidPhone(phone.to_string()))
    }
}

pub fn parse_contact(contact: &str) -> Result<Contact, ValidationError> {
    let contact = contact.trim();
    if contact.is_empty() {
        Err(ValidationError::MissingField("contact"))
    } else if contact.contains('@') {
        validate_email(contact)?;
        Ok(Contact::Email(contact.to_lowercase()))
    } else {
        normalize_phone(contact).map(Contact::Phone)
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LENGTH;
    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_letter && has_digit {
        Ok(())
    } else {
        Err(ValidationError::WeakPassword)
    }
}

pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        Err(ValidationError::MissingField("name"))
    } else if name.chars().count() > MAX_NAME_LENGTH {
        Err(ValidationError::TooLong {
            field: "name",
            max: MAX_NAME_LENGTH,
        })
    } else {
        Ok(())
    }
}

/// A post needs a body or a media reference; the body is bounded.
pub fn validate_post(body: &str, media: Option<&str>) -> Result<(), ValidationError> {
    let has_media = media.is_some_and(|m| !m.trim().is_empty());
    if body.trim().is_empty() && !has_media {
        Err(ValidationError::MissingField("body"))
    } else if body.chars().count() > MAX_POST_LENGTH {
        Err(ValidationError::TooLong {
            field: "body",
            max: MAX_POST_LENGTH,
        })
    } else {
        Ok(())
    }
}

pub fn validate_comment(body: &str) -> Result<(), ValidationError> {
    if body.trim().is_empty() {
        Err(ValidationError::MissingField("body"))
    } else if body.chars().count() > MAX_COMMENT_LENGTH {
        Err(ValidationError::TooLong {
            field: "body",
            max: MAX_COMMENT_LENGTH,
        })
    } else {
        Ok(())
    }
}
