//! Gmail API client.

use tracing::instrument;

use crate::error::GmailError;
use crate::message::build_raw_message;
use crate::types::{Profile, SendRequest, SentMessage};

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com";

pub struct GmailClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl GmailClient {
    /// `base_url` is the API root, normally [`GMAIL_API_BASE`]
    pub fn with_base_url(access_token: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: access_token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// The authenticated account's profile.
    #[instrument(skip(self), level = "info")]
    pub async fn get_profile(&self) -> Result<Profile, GmailError> {
        let url = format!("{}/gmail/v1/users/me/profile", self.base_url);

        let response =
            self.client.get(&url).header("Authorization", self.auth_header()).send().await?;

        self.handle_response(response).await
    }

    /// Send an HTML email from the authenticated account.
    #[instrument(skip(self, html), level = "info")]
    pub async fn send_html(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<SentMessage, GmailError> {
        let url = format!("{}/gmail/v1/users/me/messages/send", self.base_url);
        let request_body = SendRequest {
            raw: build_raw_message(from, to, subject, html)?,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&request_body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Helper to handle API responses and errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, GmailError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| GmailError::ApiError(format!("JSON parse error: {}", e)))
        } else if status.as_u16() == 401 {
            Err(GmailError::TokenExpired)
        } else if status.as_u16() == 403 {
            let text = response.text().await.unwrap_or_default();
            Err(GmailError::Forbidden(text))
        } else if status.as_u16() == 404 {
            let text = response.text().await.unwrap_or_default();
            Err(GmailError::NotFound(text))
        } else if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            Err(GmailError::RateLimited(retry_after))
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(GmailError::ApiError(format!("{}: {}", status, text)))
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use base64::Engine;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_profile() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/profile"))
            .and(header("Authorization", "Bearer test_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "emailAddress": "gardener@example.com",
                "messagesTotal": 120,
                "threadsTotal": 80,
                "historyId": "4242"
            })))
            .mount(&mock_server)
            .await;

        let client = GmailClient::with_base_url("test_token", &mock_server.uri());
        let profile = client.get_profile().await.unwrap();

        assert_eq!(profile.email_address, "gardener@example.com");
    }

    #[tokio::test]
    async fn test_send_html() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/send"))
            .and(header("Authorization", "Bearer test_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg123",
                "threadId": "thread123",
                "labelIds": ["SENT"]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = GmailClient::with_base_url("test_token", &mock_server.uri());
        let sent = client
            .send_html("gardener@example.com", "gardener@example.com", "Report", "<pre>ok</pre>")
            .await
            .unwrap();

        assert_eq!(sent.id, "msg123");
        assert_eq!(sent.thread_id, "thread123");

        let requests = mock_server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let raw = body["raw"].as_str().unwrap();
        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(raw).unwrap();
        let message = String::from_utf8(decoded).unwrap();
        assert!(message.contains("To: gardener@example.com\r\n"));
        assert!(message.contains("<pre>ok</pre>"));
    }

    #[tokio::test]
    async fn test_token_expired_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/profile"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let client = GmailClient::with_base_url("expired_token", &mock_server.uri());
        let result = client.get_profile().await;

        assert!(matches!(result, Err(GmailError::TokenExpired)));
    }

    #[tokio::test]
    async fn test_forbidden_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/send"))
            .respond_with(ResponseTemplate::new(403).set_body_string("insufficientPermissions"))
            .mount(&mock_server)
            .await;

        let client = GmailClient::with_base_url("token", &mock_server.uri());
        let result = client.send_html("a@example.com", "a@example.com", "s", "b").await;

        match result {
            Err(GmailError::Forbidden(text)) => assert!(text.contains("insufficientPermissions")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/send"))
            .respond_with(ResponseTemplate::new(429).append_header("Retry-After", "30"))
            .mount(&mock_server)
            .await;

        let client = GmailClient::with_base_url("token", &mock_server.uri());
        let result = client.send_html("a@example.com", "a@example.com", "s", "b").await;

        assert!(matches!(result, Err(GmailError::RateLimited(30))));
    }

    #[tokio::test]
    async fn test_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/profile"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend"))
            .mount(&mock_server)
            .await;

        let client = GmailClient::with_base_url("token", &mock_server.uri());
        let err = client.get_profile().await.unwrap_err();

        match err {
            GmailError::ApiError(msg) => assert!(msg.contains("500")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_recipient_sends_nothing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = GmailClient::with_base_url("token", &mock_server.uri());
        let err = client
            .send_html("a@example.com", "a@example.com\r\nBcc: b@example.com", "s", "b")
            .await;

        assert!(matches!(err, Err(GmailError::InvalidMessage(_))));
    }
}
