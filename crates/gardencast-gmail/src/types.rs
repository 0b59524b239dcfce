//! Gmail API types.

use serde::{Deserialize, Serialize};

/// `users.getProfile` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub email_address: String,
}

/// `users.messages.send` request body
#[derive(Debug, Serialize)]
pub struct SendRequest {
    pub raw: String,
}

/// The message resource returned by `users.messages.send`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub label_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_sent_message_from_api() {
        let sent: SentMessage = serde_json::from_str(
            r#"{"id": "18c1", "threadId": "18c1", "labelIds": ["SENT"]}"#,
        )
        .unwrap();
        assert_eq!(sent.id, "18c1");
        assert_eq!(sent.label_ids, vec!["SENT"]);
    }

    #[test]
    fn test_profile_from_api() {
        let profile: Profile =
            serde_json::from_str(r#"{"emailAddress": "gardener@example.com"}"#).unwrap();
        assert_eq!(profile.email_address, "gardener@example.com");
    }
}
