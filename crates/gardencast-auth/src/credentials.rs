//! Credential state machine shared by every run.

use crate::error::AuthError;
use crate::storage::{TokenCache, TokenSet};

/// Source of OAuth tokens.
///
/// `ensure_credentials` only talks to this trait, so tests can drive the
/// state machine without a browser or network.
#[allow(async_fn_in_trait)]
pub trait CredentialProvider {
    /// Whether a cached token can be used as-is
    fn is_valid(&self, token: &TokenSet) -> bool {
        !token.is_expired()
    }

    /// Exchange the token's refresh token for a new access token
    async fn refresh(&self, token: &TokenSet) -> Result<TokenSet, AuthError>;

    /// Obtain a brand-new token through user consent
    async fn authorize_interactive(&self) -> Result<TokenSet, AuthError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    NoCredentials,
    CachedValid,
    CachedExpiredRefreshable,
    CachedExpiredNonRefreshable,
}

impl CredentialState {
    pub fn classify<P: CredentialProvider>(
        token: Option<&TokenSet>,
        provider: &P,
    ) -> Self {
        match token {
            None => Self::NoCredentials,
            Some(t) if provider.is_valid(t) => Self::CachedValid,
            Some(t) if t.can_refresh() => Self::CachedExpiredRefreshable,
            Some(_) => Self::CachedExpiredNonRefreshable,
        }
    }
}

/// Return usable credentials, refreshing or re-authorizing as needed.
///
/// The cache is rewritten whenever a new token is obtained. A cache file
/// that cannot be parsed is treated as absent.
///
/// # Errors
/// Refresh or interactive authorization failed, or the new token could not
/// be persisted.
pub async fn ensure_credentials<P: CredentialProvider>(
    provider: &P,
    cache: &TokenCache,
) -> Result<TokenSet, AuthError> {
    let cached = cache.load().unwrap_or_else(|e| {
        tracing::warn!("Ignoring unreadable token cache: {}", e);
        None
    });

    let state = CredentialState::classify(cached.as_ref(), provider);
    tracing::info!("Credential state: {:?}", state);

    let token = match (state, cached) {
        (CredentialState::CachedValid, Some(token)) => return Ok(token),
        (CredentialState::CachedExpiredRefreshable, Some(token)) => {
            let mut refreshed = provider.refresh(&token).await?;
            if !refreshed.can_refresh() {
                refreshed.refresh_token = token.refresh_token;
            }
            if refreshed.client.is_none() {
                refreshed.client = token.client;
            }
            refreshed
        }
        _ => provider.authorize_interactive().await?,
    };

    cache.store(&token)?;
    Ok(token)
}
