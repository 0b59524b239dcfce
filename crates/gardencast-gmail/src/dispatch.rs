//! Authenticate, resolve the sender, and mail the report to them.

use gardencast_auth::{ensure_credentials, AuthError, CredentialProvider, TokenCache};
use thiserror::Error;

use crate::client::GmailClient;
use crate::error::GmailError;
use crate::message::html_envelope;
use crate::types::SentMessage;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Gmail request failed: {0}")]
    Gmail(#[from] GmailError),
}

/// Send `report` as an HTML email from the authorized account to itself.
///
/// `api_base` is the Gmail API root, normally [`crate::GMAIL_API_BASE`].
///
/// # Errors
/// Credentials could not be obtained, or Gmail rejected a request.
pub async fn dispatch_report<P: CredentialProvider>(
    provider: &P,
    cache: &TokenCache,
    report: &str,
    subject: &str,
    api_base: &str,
) -> Result<SentMessage, DispatchError> {
    let token = ensure_credentials(provider, cache).await?;
    let client = GmailClient::with_base_url(&token.access_token, api_base);

    let profile = client.get_profile().await?;
    tracing::info!("Sending report to {}", profile.email_address);

    let sent = client
        .send_html(
            &profile.email_address,
            &profile.email_address,
            subject,
            &html_envelope(report),
        )
        .await?;
    tracing::info!("Message sent with id {}", sent.id);

    Ok(sent)
}
