//! Google client secrets descriptor (`credentials.json`).

use serde::Deserialize;
use std::path::Path;

use crate::error::AuthError;
use crate::storage::OAuthClient;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// The file wraps the secrets in an `installed` (desktop) or `web` object
#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// # Errors
    /// The file is missing, not JSON, or has neither an `installed` nor a
    /// `web` section.
    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| AuthError::ClientSecrets(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let file: SecretsFile =
            serde_json::from_str(json).map_err(|e| AuthError::ClientSecrets(e.to_string()))?;

        let secrets = file.installed.or(file.web).ok_or_else(|| {
            AuthError::ClientSecrets("expected an \"installed\" or \"web\" client".to_string())
        })?;

        if secrets.client_id.is_empty() {
            return Err(AuthError::ClientSecrets("client_id is empty".to_string()));
        }
        Ok(secrets)
    }

    pub fn client(&self) -> OAuthClient {
        OAuthClient {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            token_uri: self.token_uri.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_installed_client() {
        let secrets = ClientSecrets::from_json(
            r#"{
                "installed": {
                    "client_id": "123.apps.googleusercontent.com",
                    "project_id": "garden",
                    "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                    "token_uri": "https://oauth2.googleapis.com/token",
                    "client_secret": "shh",
                    "redirect_uris": ["http://localhost"]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(secrets.client_id, "123.apps.googleusercontent.com");
        assert_eq!(secrets.client_secret, "shh");
        assert_eq!(secrets.client().token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_web_client_with_defaults() {
        let secrets =
            ClientSecrets::from_json(r#"{"web": {"client_id": "id", "client_secret": "s"}}"#)
                .unwrap();
        assert_eq!(secrets.auth_uri, DEFAULT_AUTH_URI);
        assert_eq!(secrets.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_malformed_descriptor() {
        for json in ["", "[]", "{}", r#"{"installed": {"client_id": "id"}}"#] {
            let err = ClientSecrets::from_json(json).unwrap_err();
            assert!(matches!(err, AuthError::ClientSecrets(_)), "{}", json);
        }
    }

    #[test]
    fn test_missing_file() {
        let err = ClientSecrets::from_file(Path::new("/nonexistent/credentials.json")).unwrap_err();
        assert!(matches!(err, AuthError::ClientSecrets(_)));
    }
}
