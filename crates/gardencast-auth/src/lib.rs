//! OAuth credentials for sending mail through the Gmail API.
//!
//! The token cache and the credential state machine only know about the
//! `CredentialProvider` trait; `GoogleOAuth2Provider` is the real
//! implementation with a browser-based consent flow.

pub mod callback;
pub mod credentials;
pub mod error;
pub mod google;
pub mod secrets;
pub mod storage;

pub use credentials::{ensure_credentials, CredentialProvider, CredentialState};
pub use error::AuthError;
pub use google::{GoogleOAuth2Provider, GoogleTokenResponse, GMAIL_READONLY_SCOPE, GMAIL_SEND_SCOPE};
pub use secrets::ClientSecrets;
pub use storage::{OAuthClient, TokenCache, TokenSet};
