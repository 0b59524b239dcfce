//! Authentication error types.

use gardencast_core::{NetworkError, ReqwestErrorExt};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid client secrets file: {0}")]
    ClientSecrets(String),

    #[error("Token cache error: {0}")]
    Storage(String),

    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("Authorization was declined: {0}")]
    ConsentDenied(String),

    #[error("OAuth state mismatch in callback")]
    StateMismatch,

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        AuthError::Network(e.into_network_error())
    }
}

impl AuthError {
    /// Message suitable for the operator's console.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ClientSecrets(_) => {
                "credentials.json is missing or invalid. Download it from the Google Cloud console."
            }
            Self::Storage(_) => "Could not read or write the token cache.",
            Self::OAuthFailed(_) => "Sign-in failed. Please try again.",
            Self::ConsentDenied(_) => "Sign-in was cancelled.",
            Self::StateMismatch => "Sign-in response did not match the request. Please try again.",
            Self::RefreshFailed(_) => {
                "Your saved sign-in could not be renewed. Delete token.json and sign in again."
            }
            Self::Network(e) => e.user_message(),
            Self::Io(_) => "A file or socket operation failed.",
        }
    }
}
