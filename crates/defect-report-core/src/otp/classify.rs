//! Classification of verification service replies.

use serde_json::Value;

use super::OtpError;
use crate::remote::{RawReply, ReplyBody, ReplyResult};

pub const NETWORK_MESSAGE: &str =
    "Cannot connect to the server. Please check your network and ensure the backend is running.";
pub const SEND_FAILED_MESSAGE: &str = "Failed to send OTP via server.";
pub const INVALID_FORMAT_MESSAGE: &str = "Invalid response format from server.";
pub const INVALID_CODE_MESSAGE: &str = "Invalid or expired OTP code.";

fn status_message(status: u16) -> String {
    format!("Server responded with status: {status}")
}

fn flag(body: &Value, key: &str) -> bool {
    body.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Classify the reply to a send (or resend) request.
///
/// A JSON body must say `success: true` under a 2xx status. A non-JSON body
/// under a 2xx status counts as an implicit success.
pub fn classify_send(reply: &ReplyResult) -> Result<(), OtpError> {
    let reply = match reply {
        Ok(reply) => reply,
        Err(_) => return Err(OtpError::Network(NETWORK_MESSAGE.to_string())),
    };

    match &reply.body {
        ReplyBody::Json(body) => {
            if reply.is_success() && flag(body, "success") {
                Ok(())
            } else {
                Err(OtpError::Server(
                    reply
                        .error_text()
                        .unwrap_or_else(|| SEND_FAILED_MESSAGE.to_string()),
                ))
            }
        }
        ReplyBody::Malformed(_) => Err(OtpError::Server(INVALID_FORMAT_MESSAGE.to_string())),
        ReplyBody::Text(_) if reply.is_success() => Ok(()),
        ReplyBody::Text(_) => Err(OtpError::Server(status_message(reply.status))),
    }
}

/// Classify the reply to a code check.
///
/// Only a JSON body with `success: true` and `status: "approved"` under a
/// 2xx status verifies. Everything else is a verification failure carrying
/// the most specific message available.
pub fn classify_verify(reply: &ReplyResult) -> Result<(), OtpError> {
    let reply: &RawReply = match reply {
        Ok(reply) => reply,
        Err(_) => return Err(OtpError::Verification(NETWORK_MESSAGE.to_string())),
    };

    match &reply.body {
        ReplyBody::Json(body) => {
            let approved = body.get("status").and_then(Value::as_str) == Some("approved");
            if reply.is_success() && flag(body, "success") && approved {
                Ok(())
            } else {
                Err(OtpError::Verification(
                    reply
                        .error_text()
                        .unwrap_or_else(|| INVALID_CODE_MESSAGE.to_string()),
                ))
            }
        }
        ReplyBody::Malformed(_) => Err(OtpError::Verification(INVALID_FORMAT_MESSAGE.to_string())),
        ReplyBody::Text(_) if reply.is_success() => {
            Err(OtpError::Verification(INVALID_FORMAT_MESSAGE.to_string()))
        }
        ReplyBody::Text(_) => Err(OtpError::Verification(status_message(reply.status))),
    }
}
