//! MIME message building for the report email.

use base64::Engine;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::Message;

use crate::error::GmailError;

/// Escape the characters that would otherwise be read as markup
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wrap the plain-text report in a monospace HTML body
pub fn html_envelope(report: &str) -> String {
    format!(
        "<html><body><pre style='font: monospace; font-size: 14px;'>{}</pre></body></html>",
        escape_html(report)
    )
}

fn mailbox(field: &str, address: &str) -> Result<Mailbox, GmailError> {
    address
        .parse()
        .map_err(|e| GmailError::InvalidMessage(format!("{} address '{}': {}", field, address, e)))
}

/// Build the HTML message and encode it for the `raw` field of
/// `users.messages.send`.
///
/// # Errors
/// An address does not parse, or `subject` contains a line break.
pub fn build_raw_message(
    from: &str,
    to: &str,
    subject: &str,
    html: &str,
) -> Result<String, GmailError> {
    if subject.contains(['\r', '\n']) {
        return Err(GmailError::InvalidMessage(
            "Subject must be a single line".to_string(),
        ));
    }

    let email = Message::builder()
        .from(mailbox("From", from)?)
        .to(mailbox("To", to)?)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html.to_string())
        .map_err(|e| GmailError::InvalidMessage(format!("Failed to build email: {}", e)))?;

    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(email.formatted()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    const ME: &str = "me@example.com";

    fn decode(raw: &str) -> String {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(raw).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_html_envelope() {
        assert_eq!(
            html_envelope("Rain: 1.0 mm"),
            "<html><body><pre style='font: monospace; font-size: 14px;'>Rain: 1.0 mm</pre></body></html>"
        );
    }

    #[test]
    fn test_envelope_escapes_markup() {
        let html = html_envelope("a < b && c > d");
        assert!(html.contains("a &lt; b &amp;&amp; c &gt; d"));
    }

    #[test]
    fn test_envelope_keeps_report_layout() {
        let report = "## 🌧️ Recent Rainfall Totals\nLast 7 Days:  3.50 mm";
        assert!(html_envelope(report).contains(report));
    }

    #[test]
    fn test_raw_message_headers() {
        let raw = build_raw_message(ME, ME, "Morning Report", "<p>hi</p>").unwrap();
        let message = decode(&raw);

        assert!(message.contains("To: me@example.com\r\n"));
        assert!(message.contains("From: me@example.com\r\n"));
        assert!(message.contains("Subject: Morning Report\r\n"));
        assert!(message.contains("MIME-Version: 1.0\r\n"));
        assert!(message.to_lowercase().contains("content-type: text/html; charset=utf-8"));
        assert!(message.contains("<p>hi</p>"));
        assert!(!raw.contains('+') && !raw.contains('/') && !raw.contains('='));
    }

    #[test]
    fn test_non_ascii_report_declares_transfer_encoding() {
        let html = html_envelope("## 🌧️ Recent Rainfall Totals\n10-Day Average: 75.2°F");
        let message = decode(&build_raw_message(ME, ME, "Report", &html).unwrap());

        assert!(message.is_ascii());
        assert!(message.contains("Content-Transfer-Encoding: "));
        assert!(!message.contains("Content-Transfer-Encoding: 7bit"));
    }

    #[test]
    fn test_non_ascii_subject_is_encoded() {
        let message = decode(&build_raw_message(ME, ME, "Garden 🌱", "x").unwrap());
        assert!(message.is_ascii());
        assert!(message.to_lowercase().contains("subject: =?utf-8?"));
    }

    #[test]
    fn test_header_injection_rejected() {
        let err = build_raw_message(ME, ME, "Hi\r\nBcc: x@example.com", "x").unwrap_err();
        assert!(matches!(err, GmailError::InvalidMessage(_)));

        let err = build_raw_message(ME, "me@example.com\r\nBcc: x@example.com", "Hi", "x")
            .unwrap_err();
        assert!(matches!(err, GmailError::InvalidMessage(_)));
    }

    #[test]
    fn test_invalid_address_rejected() {
        let err = build_raw_message(ME, "not an address", "Hi", "x").unwrap_err();
        assert!(matches!(err, GmailError::InvalidMessage(_)));
    }
}
