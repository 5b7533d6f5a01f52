//! Final report submission.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::models::{MedicalHistoryForm, ReportForm, SubmissionPayload, SubmissionReceipt};
use crate::otp::{OtpSession, NETWORK_MESSAGE};
use crate::remote::{RawReply, ReplyResult, SubmissionService};

pub const VERIFICATION_REQUIRED_MESSAGE: &str =
    "Please complete phone number verification before submitting.";

/// Submission errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("{}", VERIFICATION_REQUIRED_MESSAGE)]
    VerificationRequired,

    #[error("A submission is already in progress.")]
    SubmissionInProgress,

    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Server(String),

    #[error("Could not encode report: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SubmissionError {
    fn from(e: serde_json::Error) -> Self {
        SubmissionError::Serialization(e.to_string())
    }
}

pub type SubmissionResult<T> = Result<T, SubmissionError>;

/// Clears the in-flight flag when the submission ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Builds the payload from the final snapshots and sends it, at most one at
/// a time.
pub struct SubmissionAssembler {
    service: Arc<dyn SubmissionService>,
    in_flight: AtomicBool,
}

impl SubmissionAssembler {
    pub fn new(service: Arc<dyn SubmissionService>) -> Self {
        Self {
            service,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Submit the report. Nothing is sent unless `otp` is `Verified`.
    pub async fn submit(
        &self,
        report: &ReportForm,
        medical: &MedicalHistoryForm,
        otp: &OtpSession,
    ) -> SubmissionResult<SubmissionReceipt> {
        let Some(phone) = otp.verified_phone() else {
            tracing::warn!(session_id = %otp.id(), "Submission attempted before verification");
            return Err(SubmissionError::VerificationRequired);
        };

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SubmissionError::SubmissionInProgress);
        }
        let _guard = InFlight(&self.in_flight);

        let payload = SubmissionPayload::build(report.clone(), medical.clone(), &phone);
        let fingerprint = payload.fingerprint()?;
        tracing::info!(
            session_id = %otp.id(),
            fingerprint = %fingerprint,
            kind = report.report_kind.as_str(),
            "Submitting report"
        );

        let reply = self.service.submit(&payload, &fingerprint).await;
        let reference = classify_submission(&reply)?;

        tracing::info!(fingerprint = %fingerprint, reference = ?reference, "Report accepted");
        Ok(SubmissionReceipt {
            reference,
            fingerprint,
            submitted_at: payload.submitted_at(),
        })
    }
}

/// Any 2xx is an acceptance. Returns the server reference if one came back.
fn classify_submission(reply: &ReplyResult) -> SubmissionResult<Option<String>> {
    let reply = reply.as_ref().map_err(|e| {
        tracing::warn!(error = %e, "Submission transport failure");
        SubmissionError::Network(NETWORK_MESSAGE.to_string())
    })?;

    if !reply.is_success() {
        let message = reply
            .error_text()
            .unwrap_or_else(|| format!("Server responded with status: {}", reply.status));
        tracing::warn!(status = reply.status, "Submission rejected");
        return Err(SubmissionError::Server(message));
    }
    Ok(reference(reply))
}

fn reference(reply: &RawReply) -> Option<String> {
    let body = reply.json_body()?;
    ["id", "reference"].iter().find_map(|key| match body.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
