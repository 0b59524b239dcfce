//! File-backed cache for the Gmail authorization token.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::AuthError;

/// Seconds before `expires_at` at which a token stops being trusted
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// OAuth client identity needed to refresh a token without re-reading
/// the client secrets file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
    pub token_uri: String,
}

/// Token set for OAuth2 authentication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token for API requests
    pub access_token: String,

    /// Optional refresh token for token renewal
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Token expiration timestamp (Unix timestamp)
    pub expires_at: i64,

    /// Scopes granted to this token
    #[serde(default)]
    pub scopes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<OAuthClient>,
}

impl TokenSet {
    /// Check if the token is expired, allowing for clock skew
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at - EXPIRY_MARGIN_SECS
    }

    /// A refresh token is present and non-empty
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// The on-disk token cache; one JSON document at `path`
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached token.
    ///
    /// Returns `Ok(None)` when no cache file exists yet.
    ///
    /// # Errors
    /// The file exists but cannot be read or does not hold a token.
    pub fn load(&self) -> Result<Option<TokenSet>, AuthError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No token cache at {:?}", self.path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let token = serde_json::from_str(&json).map_err(|e| {
            AuthError::Storage(format!("{}: {}", self.path.display(), e))
        })?;

        tracing::debug!("Loaded token cache from {:?}", self.path);
        Ok(Some(token))
    }

    /// Write the token, replacing any previous cache contents.
    ///
    /// # Errors
    /// The parent directory or the file cannot be written.
    pub fn store(&self, token: &TokenSet) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(token)
            .map_err(|e| AuthError::Storage(format!("Failed to serialize token: {}", e)))?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;

        // `mode` only applies on creation; tighten a pre-existing file too
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(json.as_bytes())?;

        tracing::info!("Stored token cache at {:?}", self.path);
        Ok(())
    }
}
