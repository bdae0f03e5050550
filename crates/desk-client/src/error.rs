use repairdesk_types::Role;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Internal client error")]
    InternalClientError,

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    StatusError(reqwest::StatusCode),

    #[error("Session is not authenticated")]
    Unauthorized,

    #[error("Role {required} is required")]
    Forbidden { required: Role },

    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("{message}")]
    LoginRejected {
        message: String,
        resolution: Option<String>,
    },

    #[error("Logout failed: {0}")]
    LogoutRejected(String),

    #[error("Session file error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ClientError {
    /// True when the backend rejected the session even after a token refresh.
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
