//! Loopback HTTP listener that receives the OAuth redirect.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use crate::error::AuthError;

pub const CALLBACK_PATH: &str = "/callback";

const SUCCESS_PAGE: &str = "<html><body><h1>Authorization complete</h1>\
<p>You can close this window and return to the terminal.</p></body></html>";
const FAILURE_PAGE: &str = "<html><body><h1>Authorization failed</h1>\
<p>Check the terminal for details.</p></body></html>";

/// Bound to 127.0.0.1 on an OS-assigned port
pub struct CallbackListener {
    listener: TcpListener,
    port: u16,
}

impl CallbackListener {
    pub async fn bind() -> Result<Self, AuthError> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        Ok(Self { listener, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}{}", self.port, CALLBACK_PATH)
    }

    /// Wait for the browser to hit the callback path and return the
    /// authorization code. Requests for other paths get a 404 and are
    /// otherwise ignored.
    pub async fn wait_for_code(self, expected_state: &str) -> Result<String, AuthError> {
        tracing::info!("Waiting for OAuth callback on port {}", self.port);

        loop {
            let (mut stream, _) = self.listener.accept().await?;

            let mut request_line = String::new();
            {
                let mut reader = BufReader::new(&mut stream);
                reader.read_line(&mut request_line).await?;
                // Drain headers so closing the socket does not reset the reply
                let mut header = String::new();
                while reader.read_line(&mut header).await? > 2 {
                    header.clear();
                }
            }

            let Some(target) = request_target(&request_line) else {
                write_response(&mut stream, "400 Bad Request", FAILURE_PAGE).await;
                continue;
            };

            if !target.starts_with(CALLBACK_PATH) {
                tracing::debug!("Ignoring request for {}", target);
                write_response(&mut stream, "404 Not Found", "").await;
                continue;
            }

            let result = parse_callback(target, expected_state);
            let page = if result.is_ok() { SUCCESS_PAGE } else { FAILURE_PAGE };
            write_response(&mut stream, "200 OK", page).await;
            return result;
        }
    }
}

/// `GET /callback?code=xxx&state=yyy HTTP/1.1` -> `/callback?code=xxx&state=yyy`
fn request_target(request_line: &str) -> Option<&str> {
    let mut parts = request_line.split_whitespace();
    let _method = parts.next()?;
    parts.next()
}

/// Extract the code from a callback target. `state` is checked before any
/// `error` reported by the authorization server is trusted.
pub fn parse_callback(target: &str, expected_state: &str) -> Result<String, AuthError> {
    let url = url::Url::parse(&format!("http://127.0.0.1{}", target))
        .map_err(|e| AuthError::OAuthFailed(format!("Invalid callback URL: {}", e)))?;

    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    };

    if param("state").as_deref() != Some(expected_state) {
        return Err(AuthError::StateMismatch);
    }

    if let Some(error) = param("error") {
        return Err(AuthError::ConsentDenied(error));
    }

    param("code")
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::OAuthFailed("No code in callback".to_string()))
}

async fn write_response(stream: &mut tokio::net::TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        tracing::warn!("Failed to answer OAuth callback: {}", e);
    }
}
