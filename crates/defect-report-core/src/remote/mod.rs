//! Remote service seams for phone verification and report submission.
//!
//! Services return the raw reply (status plus body) and leave classification
//! to the protocol that called them.

mod http;
mod mock;

pub use http::*;
pub use mock::*;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::SubmissionPayload;

/// Transport-level failure: no response arrived.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Could not connect to {0}")]
    Connect(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Request failed: {0}")]
    Other(String),
}

/// Reply body as received.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    /// JSON content type, parsed
    Json(Value),
    /// JSON content type that failed to parse
    Malformed(String),
    /// Any other content type
    Text(String),
}

/// A response that arrived, successful or not.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReply {
    pub status: u16,
    pub body: ReplyBody,
}

impl RawReply {
    pub fn json(status: u16, value: Value) -> Self {
        Self {
            status,
            body: ReplyBody::Json(value),
        }
    }

    pub fn text(status: u16, text: &str) -> Self {
        Self {
            status,
            body: ReplyBody::Text(text.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The JSON body, if there is one.
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            ReplyBody::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Non-empty `error` string from a JSON body.
    pub fn error_text(&self) -> Option<String> {
        self.json_body()?
            .get("error")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    }
}

pub type ReplyResult = Result<RawReply, TransportError>;

/// Body of an OTP send request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SendCodeRequest {
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
}

/// Body of an OTP check request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CheckCodeRequest {
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    #[serde(rename = "otpCode")]
    pub otp_code: String,
}

/// Phone-ownership verification backend.
#[async_trait]
pub trait VerificationService: Send + Sync {
    async fn send_code(&self, request: &SendCodeRequest) -> ReplyResult;

    async fn check_code(&self, request: &CheckCodeRequest) -> ReplyResult;
}

/// Report submission backend.
#[async_trait]
pub trait SubmissionService: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload, idempotency_key: &str) -> ReplyResult;
}
