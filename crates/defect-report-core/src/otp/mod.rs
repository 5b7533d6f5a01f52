//! Phone ownership verification by one-time code.
//!
//! State machine:
//!
//! ```text
//! Idle -> Sending -> Sent -> Verifying -> Verified
//!            |                   |
//!            v                   v
//!      Failed{Idle}        Failed{Sent}
//! ```
//!
//! `Failed` resumes at the stable state it came from. `Verified` is terminal.

mod classify;
mod phone;

pub use classify::*;
pub use phone::*;

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use uuid::Uuid;

use crate::notify::{Notice, Notifier};
use crate::remote::{CheckCodeRequest, SendCodeRequest, VerificationService};

pub const CODE_REQUIRED_MESSAGE: &str = "Please enter the received OTP code.";

/// Shortest code accepted before a check is attempted.
pub const MIN_CODE_LENGTH: usize = 4;

/// OTP errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    Verification(String),

    #[error("A verification request is already in flight")]
    Busy,

    #[error("No code has been sent yet")]
    CodeNotSent,

    #[error("Phone number is already verified")]
    AlreadyVerified,

    #[error("Verification session is closed")]
    Closed,
}

impl OtpError {
    /// Text suitable for the verification error line.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

pub type OtpResult<T> = Result<T, OtpError>;

/// Stable state a failure falls back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpResume {
    Idle,
    Sent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpState {
    Idle,
    Sending,
    Sent,
    Verifying,
    Verified,
    Failed { resume: OtpResume },
}

impl OtpState {
    pub fn is_in_flight(self) -> bool {
        matches!(self, OtpState::Sending | OtpState::Verifying)
    }

    pub fn is_verified(self) -> bool {
        self == OtpState::Verified
    }

    /// The stable point this state resumes from, if it is not in flight or
    /// terminal.
    pub fn resume_point(self) -> Option<OtpResume> {
        match self {
            OtpState::Idle | OtpState::Failed { resume: OtpResume::Idle } => Some(OtpResume::Idle),
            OtpState::Sent | OtpState::Failed { resume: OtpResume::Sent } => Some(OtpResume::Sent),
            _ => None,
        }
    }

    /// Whether a code is out and may be checked or resent.
    pub fn code_sent(self) -> bool {
        self.resume_point() == Some(OtpResume::Sent)
    }
}

impl From<OtpResume> for OtpState {
    fn from(resume: OtpResume) -> Self {
        match resume {
            OtpResume::Idle => OtpState::Idle,
            OtpResume::Sent => OtpState::Sent,
        }
    }
}

/// Snapshot of a session for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpStatus {
    pub state: OtpState,
    /// Normalized number the outstanding code was sent to
    pub phone_number: Option<String>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct SessionState {
    state: OtpState,
    phone: Option<String>,
    last_error: Option<String>,
    closed: bool,
}

impl SessionState {
    /// Common gate for send and resend.
    fn ready_to_send(&self) -> OtpResult<OtpResume> {
        if self.closed {
            return Err(OtpError::Closed);
        }
        if self.state.is_verified() {
            return Err(OtpError::AlreadyVerified);
        }
        self.state.resume_point().ok_or(OtpError::Busy)
    }

    fn begin(&mut self, state: OtpState) {
        self.state = state;
        self.last_error = None;
    }

    fn fail(&mut self, resume: OtpResume, error: &OtpError) {
        self.state = OtpState::Failed { resume };
        self.last_error = Some(error.user_message());
    }
}

/// Falls back to the resume point if a request future is dropped before the
/// reply is applied.
struct Pending<'a> {
    session: &'a OtpSession,
    resume: OtpResume,
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        let mut state = self.session.lock();
        if state.state.is_in_flight() {
            state.state = self.resume.into();
        }
    }
}

/// One verification challenge, owned by the review stage.
pub struct OtpSession {
    id: Uuid,
    service: Arc<dyn VerificationService>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<SessionState>,
}

impl OtpSession {
    /// Create a new session in `Idle`.
    pub fn new(service: Arc<dyn VerificationService>, notifier: Arc<dyn Notifier>) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session_id = %id, "OTP session created");
        Self {
            id,
            service,
            notifier,
            state: Mutex::new(SessionState {
                state: OtpState::Idle,
                phone: None,
                last_error: None,
                closed: false,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> OtpState {
        self.lock().state
    }

    pub fn status(&self) -> OtpStatus {
        let state = self.lock();
        OtpStatus {
            state: state.state,
            phone_number: state.phone.clone(),
            last_error: state.last_error.clone(),
        }
    }

    /// The proven phone number, once `Verified`.
    pub fn verified_phone(&self) -> Option<VerifiedPhone> {
        let state = self.lock();
        match (&state.phone, state.state, state.closed) {
            (Some(phone), OtpState::Verified, false) => Some(VerifiedPhone::new(phone.clone())),
            _ => None,
        }
    }

    /// Discard the session. Replies still in flight are dropped on arrival.
    pub fn close(&self) {
        self.lock().closed = true;
        tracing::debug!(session_id = %self.id, "OTP session closed");
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Validate `raw_phone` and request a code for it.
    pub async fn send(&self, raw_phone: &str) -> OtpResult<()> {
        let (phone, resume) = {
            let mut state = self.lock();
            let resume = state.ready_to_send()?;
            let phone = match normalize_phone_number(raw_phone) {
                Ok(phone) => phone,
                Err(e) => {
                    state.last_error = Some(e.user_message());
                    return Err(e);
                }
            };
            state.begin(OtpState::Sending);
            (phone, resume)
        };
        self.request_code(phone, resume).await
    }

    /// Request a fresh code for the number the last code went to.
    pub async fn resend(&self) -> OtpResult<()> {
        let (phone, resume) = {
            let mut state = self.lock();
            let resume = state.ready_to_send()?;
            let phone = match (resume, &state.phone) {
                (OtpResume::Sent, Some(phone)) => phone.clone(),
                _ => return Err(OtpError::CodeNotSent),
            };
            state.begin(OtpState::Sending);
            (phone, resume)
        };
        self.request_code(phone, resume).await
    }

    async fn request_code(&self, phone: String, resume: OtpResume) -> OtpResult<()> {
        let _pending = Pending {
            session: self,
            resume,
        };
        tracing::info!(session_id = %self.id, phone = %mask_phone_number(&phone), "Requesting OTP");

        let request = SendCodeRequest {
            phone_number: phone.clone(),
        };
        let reply = self.service.send_code(&request).await;
        let outcome = classify_send(&reply);

        let mut state = self.lock();
        if state.closed {
            tracing::debug!(session_id = %self.id, "OTP send reply arrived after close, discarding");
            return Err(OtpError::Closed);
        }

        match outcome {
            Ok(()) => {
                state.begin(OtpState::Sent);
                state.phone = Some(phone);
                drop(state);
                tracing::info!(session_id = %self.id, "OTP sent");
                self.notifier
                    .notify(Notice::success("Code Sent", "An OTP should arrive shortly."));
                Ok(())
            }
            Err(e) => {
                state.fail(resume, &e);
                drop(state);
                tracing::warn!(session_id = %self.id, error = %e, "OTP send failed");
                self.notifier.notify(failure_notice(&e, reply.is_err()));
                Err(e)
            }
        }
    }

    /// Check `code` against the outstanding challenge.
    pub async fn verify(&self, code: &str) -> OtpResult<VerifiedPhone> {
        let (phone, code) = {
            let mut state = self.lock();
            if state.closed {
                return Err(OtpError::Closed);
            }
            if state.state.is_verified() {
                return Err(OtpError::AlreadyVerified);
            }
            if state.state.is_in_flight() {
                return Err(OtpError::Busy);
            }
            let phone = match (state.state.code_sent(), &state.phone) {
                (true, Some(phone)) => phone.clone(),
                _ => return Err(OtpError::CodeNotSent),
            };
            let code = code.trim();
            if code.chars().count() < MIN_CODE_LENGTH {
                let e = OtpError::Validation(CODE_REQUIRED_MESSAGE.to_string());
                state.last_error = Some(e.user_message());
                return Err(e);
            }
            state.begin(OtpState::Verifying);
            (phone, code.to_string())
        };

        let _pending = Pending {
            session: self,
            resume: OtpResume::Sent,
        };
        tracing::info!(session_id = %self.id, phone = %mask_phone_number(&phone), "Checking OTP");

        let request = CheckCodeRequest {
            phone_number: phone.clone(),
            otp_code: code,
        };
        let reply = self.service.check_code(&request).await;
        let outcome = classify_verify(&reply);

        let mut state = self.lock();
        if state.closed {
            tracing::debug!(session_id = %self.id, "OTP check reply arrived after close, discarding");
            return Err(OtpError::Closed);
        }

        match outcome {
            Ok(()) => {
                state.begin(OtpState::Verified);
                drop(state);
                tracing::info!(session_id = %self.id, "Phone number verified");
                self.notifier.notify(Notice::success(
                    "Success",
                    "Phone number verified successfully!",
                ));
                Ok(VerifiedPhone::new(phone))
            }
            Err(e) => {
                state.fail(OtpResume::Sent, &e);
                drop(state);
                tracing::warn!(session_id = %self.id, error = %e, "OTP check failed");
                self.notifier.notify(failure_notice(&e, reply.is_err()));
                Err(e)
            }
        }
    }
}

fn failure_notice(error: &OtpError, transport_failed: bool) -> Notice {
    if transport_failed {
        Notice::error("Network Error", "Could not connect to the server.")
    } else {
        Notice::error("Error", error.user_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NoticeKind, RecordingNotifier};
    use crate::remote::{CallGate, MockVerificationService, RawReply};
    use serde_json::json;

    const PHONE: &str = "+14155552671";

    fn session(
        service: MockVerificationService,
    ) -> (Arc<OtpSession>, Arc<MockVerificationService>, Arc<RecordingNotifier>) {
        let service = Arc::new(service);
        let notifier = Arc::new(RecordingNotifier::new());
        let session = Arc::new(OtpSession::new(service.clone(), notifier.clone()));
        (session, service, notifier)
    }

    #[tokio::test]
    async fn test_invalid_phone_makes_no_request() {
        let (session, service, notifier) = session(MockVerificationService::new());

        let err = session.send("4155552671").await.unwrap_err();

        assert_eq!(err, OtpError::Validation(PHONE_FORMAT_MESSAGE.into()));
        assert_eq!(service.send_calls(), 0);
        assert_eq!(session.state(), OtpState::Idle);
        assert_eq!(session.status().last_error, Some(PHONE_FORMAT_MESSAGE.into()));
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_send_then_verify() {
        let (session, service, notifier) = session(MockVerificationService::new());

        session.send("+1 (415) 555-2671").await.unwrap();
        assert_eq!(session.state(), OtpState::Sent);
        assert_eq!(service.last_send().unwrap().phone_number, PHONE);

        let verified = session.verify(" 123456 ").await.unwrap();
        assert_eq!(verified.as_str(), PHONE);
        assert_eq!(service.last_check().unwrap().otp_code, "123456");
        assert_eq!(session.state(), OtpState::Verified);
        assert_eq!(session.verified_phone(), Some(verified));
        assert_eq!(notifier.titles(), vec!["Code Sent", "Success"]);
    }

    #[tokio::test]
    async fn test_verify_before_send_makes_no_request() {
        let (session, service, _) = session(MockVerificationService::new());

        assert_eq!(session.verify("123456").await, Err(OtpError::CodeNotSent));
        assert_eq!(session.resend().await, Err(OtpError::CodeNotSent));
        assert_eq!(service.check_calls(), 0);
        assert_eq!(service.send_calls(), 0);
        assert_eq!(session.state(), OtpState::Idle);
    }

    #[tokio::test]
    async fn test_short_code_rejected_locally() {
        let (session, service, _) = session(MockVerificationService::new());
        session.send(PHONE).await.unwrap();

        let err = session.verify("123").await.unwrap_err();

        assert_eq!(err, OtpError::Validation(CODE_REQUIRED_MESSAGE.into()));
        assert_eq!(service.check_calls(), 0);
        assert_eq!(session.state(), OtpState::Sent);
    }

    #[tokio::test]
    async fn test_verified_is_sticky() {
        let (session, service, _) = session(MockVerificationService::new());
        session.send(PHONE).await.unwrap();
        session.verify("123456").await.unwrap();

        assert_eq!(session.send("+14155550000").await, Err(OtpError::AlreadyVerified));
        assert_eq!(session.resend().await, Err(OtpError::AlreadyVerified));
        assert_eq!(session.verify("654321").await, Err(OtpError::AlreadyVerified));

        assert_eq!(session.state(), OtpState::Verified);
        assert_eq!(service.send_calls(), 1);
        assert_eq!(service.check_calls(), 1);
    }

    #[tokio::test]
    async fn test_send_network_failure_returns_to_idle() {
        let (session, service, notifier) = session(
            MockVerificationService::new().with_send_reply(MockVerificationService::unreachable()),
        );

        let err = session.send(PHONE).await.unwrap_err();

        assert_eq!(err, OtpError::Network(NETWORK_MESSAGE.into()));
        assert_eq!(
            session.state(),
            OtpState::Failed {
                resume: OtpResume::Idle
            }
        );
        assert!(!session.state().code_sent());
        let notice = notifier.last().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.title, "Network Error");

        // The user retries; the next reply is the default success.
        session.send(PHONE).await.unwrap();
        assert_eq!(session.state(), OtpState::Sent);
        assert_eq!(session.status().last_error, None);
        assert_eq!(service.send_calls(), 2);
    }

    #[tokio::test]
    async fn test_wrong_code_then_resend() {
        let (session, service, notifier) = session(MockVerificationService::new().with_check_reply(
            Ok(RawReply::json(200, json!({"success": false}))),
        ));
        session.send(PHONE).await.unwrap();

        let err = session.verify("000000").await.unwrap_err();
        assert_eq!(err, OtpError::Verification(INVALID_CODE_MESSAGE.into()));
        assert_eq!(
            session.state(),
            OtpState::Failed {
                resume: OtpResume::Sent
            }
        );
        assert_eq!(session.status().last_error, Some(INVALID_CODE_MESSAGE.into()));
        assert_eq!(notifier.last().unwrap().title, "Error");

        session.resend().await.unwrap();
        assert_eq!(session.state(), OtpState::Sent);
        assert_eq!(session.status().last_error, None);
        assert_eq!(service.send_calls(), 2);

        session.verify("123456").await.unwrap();
        assert!(session.state().is_verified());
    }

    #[tokio::test]
    async fn test_server_error_text_surfaces() {
        let (session, _, notifier) = session(MockVerificationService::new().with_send_reply(Ok(
            RawReply::json(400, json!({"success": false, "error": "Invalid parameter `To`"})),
        )));

        let err = session.send(PHONE).await.unwrap_err();

        assert_eq!(err, OtpError::Server("Invalid parameter `To`".into()));
        assert_eq!(notifier.last().unwrap().message, "Invalid parameter `To`");
    }

    #[tokio::test]
    async fn test_one_request_in_flight() {
        let gate = CallGate::new();
        let (session, service, _) = session(MockVerificationService::new().with_gate(gate.clone()));

        let first = {
            let session = session.clone();
            tokio::spawn(async move { session.send(PHONE).await })
        };
        gate.entered.notified().await;

        assert_eq!(session.state(), OtpState::Sending);
        assert_eq!(session.send(PHONE).await, Err(OtpError::Busy));
        assert_eq!(session.verify("123456").await, Err(OtpError::Busy));

        gate.release.notify_one();
        first.await.unwrap().unwrap();
        assert_eq!(session.state(), OtpState::Sent);
        assert_eq!(service.send_calls(), 1);
    }

    #[tokio::test]
    async fn test_reply_after_close_is_discarded() {
        let gate = CallGate::new();
        let (session, _, notifier) = session(MockVerificationService::new().with_gate(gate.clone()));

        let pending = {
            let session = session.clone();
            tokio::spawn(async move { session.send(PHONE).await })
        };
        gate.entered.notified().await;
        session.close();
        gate.release.notify_one();

        assert_eq!(pending.await.unwrap(), Err(OtpError::Closed));
        assert!(notifier.notices().is_empty());
        assert!(!session.state().code_sent());
        assert_eq!(session.send(PHONE).await, Err(OtpError::Closed));
    }
}
