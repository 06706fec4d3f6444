use crate::error::ClientError;
use crate::storage::{load_json, save_json, LocalStorage};
use common_lib::api::AuthUser;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

const SESSION_KEY: &str = "session:current";

/// Signed-in rider plus the bearer token for the API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Session {
    pub user: AuthUser,
    pub access_token: String,
}

/// The one place that knows who is signed in.
///
/// Created at startup and handed to every controller that needs
/// credentials. A session starts on login ([`SessionContext::begin`]), ends on
/// logout ([`SessionContext::end`]) and is cached in local storage so the app
/// can resume it after a restart.
pub struct SessionContext {
    storage: Arc<dyn LocalStorage>,
    current: RwLock<Option<Session>>,
}

impl SessionContext {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        SessionContext {
            storage,
            current: RwLock::new(None),
        }
    }

    /// Resumes the cached session, if any. A corrupt cache is discarded.
    pub fn restore(storage: Arc<dyn LocalStorage>) -> Self {
        let cached = match load_json::<Session>(storage.as_ref(), SESSION_KEY) {
            Ok(session) => session,
            Err(e) => {
                log::warn!("session - discarding cached session: {e}");
                None
            }
        };

        if let Some(session) = &cached {
            log::info!("session - resumed, user id: {}", session.user.id);
        }

        SessionContext {
            storage,
            current: RwLock::new(cached),
        }
    }

    pub fn begin(&self, user: AuthUser, access_token: String) -> Result<Session, ClientError> {
        let session = Session { user, access_token };
        save_json(self.storage.as_ref(), SESSION_KEY, &session)?;

        log::info!("session - started, user id: {}", session.user.id);

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(session)
    }

    pub fn end(&self) -> Result<(), ClientError> {
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(session) = previous {
            log::info!("session - ended, user id: {}", session.user.id);
        }

        self.storage.remove(SESSION_KEY)
    }

    /// Drops the session the API rejected `access_token` for. A session
    /// started since with another token stays. Returns whether one was ended.
    pub fn invalidate(&self, access_token: &str) -> bool {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        match current.as_ref() {
            Some(session) if session.access_token == access_token => {}
            _ => {
                log::debug!("session - ignoring rejection of a stale token");
                return false;
            }
        }

        if let Some(session) = current.take() {
            log::warn!(
                "session - rejected by the server, user id: {}, sign in required",
                session.user.id
            );
        }
        // storage is cleared under the lock so a concurrent begin is not lost
        if let Err(e) = self.storage.remove(SESSION_KEY) {
            log::warn!("session - failed to clear cached session: {e}");
        }
        true
    }

    pub fn current(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn require(&self) -> Result<Session, ClientError> {
        self.current().ok_or(ClientError::Unauthenticated)
    }

    pub fn access_token(&self) -> Option<String> {
        self.current().map(|s| s.access_token)
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.current().map(|s| s.user)
    }

    pub fn user_id(&self) -> Option<String> {
        self.current().map(|s| s.user.id)
    }

    pub fn is_active(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
