use common_lib::validation::ValidationError;
use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ClientError {
    #[error("Not signed in or session expired")]
    Unauthenticated,

    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Malformed(String),

    #[error("Local storage error: {0}")]
    Storage(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Maps a non-success HTTP status and the server's message to an error.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => ClientError::Unauthenticated,
            403 => ClientError::Forbidden(message),
            404 => ClientError::NotFound(message),
            409 => ClientError::Conflict(message),
            400 | 422 => ClientError::Validation(message),
            _ => ClientError::Transport(format!("status {status}: {message}")),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Unauthenticated)
    }

    /// Text shown in the dismissable alert of the app.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Unauthenticated => "Please sign in again.".to_string(),
            ClientError::Validation(message) => message.clone(),
            ClientError::NotFound(_) => "This item no longer exists.".to_string(),
            ClientError::Conflict(message) => format!("Already exists: {message}"),
            ClientError::Forbidden(_) => "You are not allowed to do that.".to_string(),
            ClientError::Transport(_) | ClientError::Malformed(_) => {
                "Could not reach the server, please try again.".to_string()
            }
            ClientError::Storage(_) => "Could not save data on this device.".to_string(),
            ClientError::Cancelled => "The request was cancelled.".to_string(),
            ClientError::Config(message) => message.clone(),
        }
    }
}

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        ClientError::Validation(err.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Malformed(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ClientError::from_status(401, "token expired".to_string()),
            ClientError::Unauthenticated
        );
        assert_eq!(
            ClientError::from_status(404, "Post not exists".to_string()),
            ClientError::NotFound("Post not exists".to_string())
        );
        assert_eq!(
            ClientError::from_status(409, "User already registered".to_string()),
            ClientError::Conflict("User already registered".to_string())
        );
        assert_eq!(
            ClientError::from_status(422, "Invalid email".to_string()),
            ClientError::Validation("Invalid email".to_string())
        );
        assert!(matches!(
            ClientError::from_status(502, "Bad Gateway".to_string()),
            ClientError::Transport(_)
        ));
    }

    #[test]
    fn validation_errors_keep_their_message() {
        let err: ClientError = ValidationError::WeakPassword.into();

        assert!(err.user_message().starts_with("Password must be"));
        assert!(!err.is_auth());
        assert!(ClientError::Unauthenticated.is_auth());
    }
}
