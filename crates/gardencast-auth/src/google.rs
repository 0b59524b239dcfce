//! Google OAuth2 provider for Gmail access.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::callback::CallbackListener;
use crate::credentials::CredentialProvider;
use crate::error::AuthError;
use crate::secrets::ClientSecrets;
use crate::storage::{OAuthClient, TokenSet};

pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";
pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

const SCOPES: [&str; 2] = [GMAIL_SEND_SCOPE, GMAIL_READONLY_SCOPE];

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
}

impl GoogleTokenResponse {
    pub fn into_token_set(self, client: OAuthClient, now: i64) -> TokenSet {
        TokenSet {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: now + self.expires_in,
            scopes: self.scope.split_whitespace().map(str::to_string).collect(),
            client: Some(client),
        }
    }
}

pub struct GoogleOAuth2Provider {
    client_secrets_path: PathBuf,
    http: reqwest::Client,
}

impl GoogleOAuth2Provider {
    /// `client_secrets_path` is only read when a consent flow is needed or
    /// a cached token does not carry its client identity.
    pub fn new(client_secrets_path: impl Into<PathBuf>) -> Self {
        Self {
            client_secrets_path: client_secrets_path.into(),
            http: reqwest::Client::new(),
        }
    }

    fn load_secrets(&self) -> Result<ClientSecrets, AuthError> {
        ClientSecrets::from_file(&self.client_secrets_path)
    }

    /// Generate authorization URL for OAuth flow.
    /// Returns (url, state) where state should be verified on callback.
    pub fn authorization_url(&self, secrets: &ClientSecrets, redirect_uri: &str) -> (String, String) {
        let state = uuid::Uuid::new_v4().to_string();
        let scopes = SCOPES.join(" ");

        let url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&access_type=offline&prompt=consent",
            secrets.auth_uri,
            urlencoding::encode(&secrets.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes),
            urlencoding::encode(&state),
        );

        (url, state)
    }

    /// Exchange authorization code for tokens.
    #[tracing::instrument(skip(self, secrets, code), level = "info")]
    pub async fn exchange_code(
        &self,
        secrets: &ClientSecrets,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenSet, AuthError> {
        let response = self
            .http
            .post(&secrets.token_uri)
            .form(&[
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuthError::OAuthFailed(format!(
                "Token exchange failed ({}): {}",
                status, error_text
            )));
        }

        let tokens: GoogleTokenResponse = response.json().await?;
        Ok(tokens.into_token_set(secrets.client(), chrono::Utc::now().timestamp()))
    }

    /// Refresh an expired access token.
    #[tracing::instrument(skip(self, client, refresh_token), level = "info")]
    pub async fn refresh_token(
        &self,
        client: &OAuthClient,
        refresh_token: &str,
    ) -> Result<GoogleTokenResponse, AuthError> {
        let response = self
            .http
            .post(&client.token_uri)
            .form(&[
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuthError::RefreshFailed(format!("{}: {}", status, error_text)));
        }

        Ok(response.json().await?)
    }
}

impl CredentialProvider for GoogleOAuth2Provider {
    async fn refresh(&self, token: &TokenSet) -> Result<TokenSet, AuthError> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| AuthError::RefreshFailed("No refresh token".to_string()))?;

        let client = match &token.client {
            Some(client) => client.clone(),
            None => self.load_secrets()?.client(),
        };

        tracing::info!("Refreshing Gmail access token");
        let response = self.refresh_token(&client, refresh_token).await?;
        Ok(response.into_token_set(client, chrono::Utc::now().timestamp()))
    }

    async fn authorize_interactive(&self) -> Result<TokenSet, AuthError> {
        let secrets = self.load_secrets()?;
        let listener = CallbackListener::bind().await?;
        let redirect_uri = listener.redirect_uri();
        let (url, state) = self.authorization_url(&secrets, &redirect_uri);

        println!("Please visit this URL to authorize this application: {}", url);
        if let Err(e) = webbrowser::open(&url) {
            tracing::warn!("Could not open a browser: {}", e);
        }

        let code = listener.wait_for_code(&state).await?;
        tracing::info!("Received authorization code, exchanging for tokens");
        self.exchange_code(&secrets, &code, &redirect_uri).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn secrets(token_uri: &str) -> ClientSecrets {
        ClientSecrets {
            client_id: "test_client_id".to_string(),
            client_secret: "test_client_secret".to_string(),
            auth_uri: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_uri: token_uri.to_string(),
        }
    }

    fn expired(refresh: &str, client: Option<OAuthClient>) -> TokenSet {
        TokenSet {
            access_token: "stale".to_string(),
            refresh_token: Some(refresh.to_string()),
            expires_at: 0,
            scopes: Vec::new(),
            client,
        }
    }

    #[test]
    fn test_google_auth_url_contains_scopes() {
        let provider = GoogleOAuth2Provider::new("credentials.json");
        let (url, _state) =
            provider.authorization_url(&secrets("unused"), "http://127.0.0.1:8080/callback");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/auth?"));
        assert!(url.contains("gmail.send"));
        assert!(url.contains("gmail.readonly"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8080%2Fcallback"));
    }

    #[test]
    fn test_google_auth_url_contains_offline_access() {
        let provider = GoogleOAuth2Provider::new("credentials.json");
        let (url, _state) = provider.authorization_url(&secrets("unused"), "http://x/callback");
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
    }

    #[test]
    fn test_google_state_is_unique() {
        let provider = GoogleOAuth2Provider::new("credentials.json");
        let s = secrets("unused");
        let (url, state1) = provider.authorization_url(&s, "http://x/callback");
        let (_, state2) = provider.authorization_url(&s, "http://x/callback");
        assert_ne!(state1, state2);
        assert!(url.contains(&format!("state={}", state1)));
    }

    #[test]
    fn test_token_response_into_token_set() {
        let response: GoogleTokenResponse = serde_json::from_str(
            r#"{"access_token": "a", "expires_in": 3599, "scope": "s1 s2", "token_type": "Bearer"}"#,
        )
        .unwrap();
        let t = response.into_token_set(secrets("u").client(), 1_000);
        assert_eq!(t.expires_at, 4_599);
        assert_eq!(t.scopes, vec!["s1", "s2"]);
        assert_eq!(t.refresh_token, None);
        assert_eq!(t.client.unwrap().client_id, "test_client_id");
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=the-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh",
                "refresh_token": "long-lived",
                "expires_in": 3600,
                "token_type": "Bearer",
                "scope": GMAIL_SEND_SCOPE
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = GoogleOAuth2Provider::new("credentials.json");
        let s = secrets(&format!("{}/token", mock_server.uri()));
        let t = provider
            .exchange_code(&s, "the-code", "http://127.0.0.1:1/callback")
            .await
            .unwrap();

        assert_eq!(t.access_token, "fresh");
        assert_eq!(t.refresh_token.as_deref(), Some("long-lived"));
        assert!(!t.is_expired());
    }

    #[tokio::test]
    async fn test_refresh_uses_cached_client() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "renewed",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        // The secrets file does not exist; the cached client must be enough
        let provider = GoogleOAuth2Provider::new("/nonexistent/credentials.json");
        let client = secrets(&format!("{}/token", mock_server.uri())).client();
        let t = provider.refresh(&expired("r1", Some(client))).await.unwrap();

        assert_eq!(t.access_token, "renewed");
        assert!(provider.is_valid(&t));
    }

    #[tokio::test]
    async fn test_refresh_falls_back_to_secrets_file() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("client_id=file-client"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "renewed",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = TempDir::new().unwrap();
        let secrets_path = dir.path().join("credentials.json");
        let descriptor = serde_json::json!({
            "installed": {
                "client_id": "file-client",
                "client_secret": "s",
                "token_uri": format!("{}/token", mock_server.uri())
            }
        });
        std::fs::write(&secrets_path, descriptor.to_string()).unwrap();

        let provider = GoogleOAuth2Provider::new(&secrets_path);
        let t = provider.refresh(&expired("r1", None)).await.unwrap();
        assert_eq!(t.access_token, "renewed");
    }

    #[tokio::test]
    async fn test_refresh_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            })))
            .mount(&mock_server)
            .await;

        let provider = GoogleOAuth2Provider::new("credentials.json");
        let client = secrets(&format!("{}/token", mock_server.uri())).client();
        let err = provider.refresh(&expired("r1", Some(client))).await.unwrap_err();

        match err {
            AuthError::RefreshFailed(msg) => assert!(msg.contains("invalid_grant")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_interactive_requires_valid_secrets() {
        let provider = GoogleOAuth2Provider::new("/nonexistent/credentials.json");
        let err = provider.authorize_interactive().await.unwrap_err();
        assert!(matches!(err, AuthError::ClientSecrets(_)));
    }
}
