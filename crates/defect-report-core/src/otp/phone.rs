//! Phone number normalization for the verification challenge.

use super::{OtpError, OtpResult};

pub const PHONE_FORMAT_MESSAGE: &str = "Please use format +1XXXXXXXXXX.";

/// Shortest accepted normalized number, `+` included.
pub const MIN_PHONE_LENGTH: usize = 11;

/// Strip whitespace, parentheses and hyphens, then require a leading `+` and
/// at least [`MIN_PHONE_LENGTH`] characters.
pub fn normalize_phone_number(raw: &str) -> OtpResult<String> {
    let normalized: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '-'))
        .collect();

    if !normalized.starts_with('+') || normalized.chars().count() < MIN_PHONE_LENGTH {
        return Err(OtpError::Validation(PHONE_FORMAT_MESSAGE.to_string()));
    }
    Ok(normalized)
}

/// Log-safe rendering: everything but the last four characters hidden.
pub fn mask_phone_number(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    let keep = chars.len().min(4);
    let hidden = chars.len() - keep;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{}", "*".repeat(hidden), tail)
}

/// A normalized phone number whose ownership has been proven.
///
/// Only an [`OtpSession`](super::OtpSession) in the `Verified` state hands
/// these out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPhone(String);

impl VerifiedPhone {
    pub(crate) fn new(phone: String) -> Self {
        Self(phone)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
