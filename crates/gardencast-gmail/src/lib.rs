//! Gmail delivery of the garden report.
//!
//! Provides the Gmail API client, MIME message building, and the
//! authenticate -> resolve sender -> send sequence.

pub mod client;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod types;

pub use client::{GmailClient, GMAIL_API_BASE};
pub use dispatch::{dispatch_report, DispatchError};
pub use error::GmailError;
pub use message::{build_raw_message, html_envelope};
pub use types::{Profile, SentMessage};
