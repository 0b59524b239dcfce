//! Gmail-specific error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GmailError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl GmailError {
    /// User-friendly error message for the console.
    pub fn user_message(&self) -> String {
        match self {
            Self::TokenExpired => "Your Gmail session has expired. Run again to refresh it.".to_string(),
            Self::Forbidden(_) => {
                "Gmail refused the request. Check the granted scopes or delete token.json.".to_string()
            }
            Self::RateLimited(secs) => format!("Too many requests. Please wait {} seconds.", secs),
            Self::NotFound(_) => "Gmail resource not found".to_string(),
            Self::InvalidMessage(msg) => format!("Could not build the email: {}", msg),
            Self::ApiError(msg) => format!("Gmail error: {}", msg),
            Self::NetworkError(_) => "Network error. Check your connection.".to_string(),
        }
    }
}
