//! Defect Report Core Library
//!
//! Reporting flow for defective food and drug items, shared by the mobile
//! apps through UniFFI.
//!
//! # Architecture
//!
//! ```text
//!   Barcode scan ──► Debounce / single-flight ──► Normalize ──► Catalog search ──► Detail
//!                                                                                   │
//!                                                                   populate report │
//!                                                                                   ▼
//!   ReportDetails ──Next──► MedicalHistory ──Next──► ReviewSubmit
//!        ▲                        ▲                       │
//!        └────── Edit Section ────┴───────────────────────┤
//!                                                         │
//!                                       OTP send ► OTP verify ► Verified
//!                                                         │
//!                                               Submission (idempotent POST)
//! ```
//!
//! # Core Principle
//!
//! **Nothing is submitted without a verified phone number.** The submission
//! payload can only be built from a phone number the OTP protocol verified.
//!
//! # Modules
//!
//! - [`lookup`]: Identifier normalization and the barcode lookup pipeline
//! - [`otp`]: Phone verification challenge
//! - [`wizard`]: Stage sequencing, snapshots and review rendering
//! - [`submission`]: Final payload assembly and submission
//! - [`session`]: One report from first field to accepted submission
//! - [`models`]: Form data, field configuration and payloads
//! - [`remote`]: Verification and submission service seams
//! - [`notify`]: User notices
//! - [`config`] / [`logging`]: Host-supplied endpoints and log bootstrap

pub mod config;
pub mod logging;
pub mod lookup;
pub mod models;
pub mod notify;
pub mod otp;
pub mod remote;
pub mod session;
pub mod submission;
pub mod wizard;

// Re-export commonly used types
pub use config::{ConfigError, ServiceConfig};
pub use lookup::{LookupError, LookupPipeline, ScanEvent, ScanOutcome};
pub use models::{
    AttachedFile, FieldSpec, MedicalDetails, MedicalField, MedicalHistoryForm, ReportField,
    ReportForm, ReportKind, ScanResult, SubmissionPayload, SubmissionReceipt,
};
pub use notify::{Notice, NoticeKind, Notifier};
pub use otp::{OtpError, OtpSession, OtpState, OtpStatus, VerifiedPhone};
pub use session::{ReportSession, SessionError};
pub use submission::{SubmissionAssembler, SubmissionError};
pub use wizard::{ReportWizard, ReviewSection, WizardError, WizardStage};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

use chrono::{DateTime, Utc};
use defect_report_catalog::MockCatalog;

use models::{AttachmentError, FieldKey, FieldRule};
use lookup::IgnoreReason;
use otp::OtpResume;
use remote::{MockSubmissionService, MockVerificationService};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DefectReportError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    Verification(String),

    #[error("{0}")]
    VerificationRequired(String),

    #[error("{0}")]
    SubmissionInProgress(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<LookupError> for DefectReportError {
    fn from(e: LookupError) -> Self {
        match e {
            LookupError::NotFound(msg) => DefectReportError::NotFound(msg),
            LookupError::Network(msg) => DefectReportError::Network(msg),
            LookupError::Server(msg) => DefectReportError::Server(msg),
        }
    }
}

impl From<OtpError> for DefectReportError {
    fn from(e: OtpError) -> Self {
        match e {
            OtpError::Validation(msg) => DefectReportError::Validation(msg),
            OtpError::Network(msg) => DefectReportError::Network(msg),
            OtpError::Server(msg) => DefectReportError::Server(msg),
            OtpError::Verification(msg) => DefectReportError::Verification(msg),
            other => DefectReportError::InvalidState(other.to_string()),
        }
    }
}

impl From<SubmissionError> for DefectReportError {
    fn from(e: SubmissionError) -> Self {
        let message = e.to_string();
        match e {
            SubmissionError::VerificationRequired => {
                DefectReportError::VerificationRequired(message)
            }
            SubmissionError::SubmissionInProgress => {
                DefectReportError::SubmissionInProgress(message)
            }
            SubmissionError::Network(msg) => DefectReportError::Network(msg),
            SubmissionError::Server(msg) => DefectReportError::Server(msg),
            SubmissionError::Serialization(_) => DefectReportError::InvalidState(message),
        }
    }
}

impl From<WizardError> for DefectReportError {
    fn from(e: WizardError) -> Self {
        DefectReportError::InvalidState(e.to_string())
    }
}

impl From<AttachmentError> for DefectReportError {
    fn from(e: AttachmentError) -> Self {
        DefectReportError::Validation(e.to_string())
    }
}

impl From<ConfigError> for DefectReportError {
    fn from(e: ConfigError) -> Self {
        DefectReportError::Configuration(e.to_string())
    }
}

impl From<SessionError> for DefectReportError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Wizard(e) => e.into(),
            SessionError::Otp(e) => e.into(),
            SessionError::Submission(e) => e.into(),
            SessionError::Attachment(e) => e.into(),
            SessionError::Config(e) => e.into(),
            other => DefectReportError::Configuration(other.to_string()),
        }
    }
}

// =========================================================================
// Host Callbacks
// =========================================================================

/// Implemented by the host to render notices (alerts, toasts).
#[uniffi::export(with_foreign)]
pub trait NoticeSink: Send + Sync {
    fn on_notice(&self, notice: FfiNotice);
}

struct SinkNotifier(Arc<dyn NoticeSink>);

impl Notifier for SinkNotifier {
    fn notify(&self, notice: Notice) {
        self.0.on_notice(notice.into());
    }
}

fn notifier_for(sink: Option<Arc<dyn NoticeSink>>) -> Arc<dyn Notifier> {
    match sink {
        Some(sink) => Arc::new(SinkNotifier(sink)),
        None => Arc::new(notify::TracingNotifier),
    }
}

// =========================================================================
// Free Functions (exported to FFI)
// =========================================================================

/// Install the log subscriber. Returns false if one was already installed.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) -> bool {
    logging::init_logging(filter.as_deref())
}

/// Canonical identifier for a raw scanned barcode.
#[uniffi::export]
pub fn normalize_identifier(raw: String) -> String {
    lookup::normalize_identifier(&raw)
}

/// Normalize a phone number, or explain the expected format.
#[uniffi::export]
pub fn validate_phone_number(raw: String) -> Result<String, DefectReportError> {
    Ok(otp::normalize_phone_number(&raw)?)
}

/// Report-stage inputs for the given kind.
#[uniffi::export]
pub fn report_field_specs(kind: FfiReportKind) -> Vec<FfiFieldSpec> {
    models::report_field_specs(kind.into())
        .into_iter()
        .map(Into::into)
        .collect()
}

/// Medical-stage inputs; hospital and prescription inputs only when
/// attention was sought.
#[uniffi::export]
pub fn medical_field_specs(sought_attention: bool) -> Vec<FfiFieldSpec> {
    models::medical_field_specs(sought_attention)
        .into_iter()
        .map(Into::into)
        .collect()
}

/// Phone number and code inputs for the review stage.
#[uniffi::export]
pub fn verification_field_specs() -> Vec<FfiFieldSpec> {
    models::verification_field_specs()
        .into_iter()
        .map(Into::into)
        .collect()
}

/// Open a report session against the endpoints in `config_json`.
#[uniffi::export]
pub fn open_report_session(
    config_json: String,
    sink: Option<Arc<dyn NoticeSink>>,
) -> Result<Arc<DefectReportCore>, DefectReportError> {
    let config = ServiceConfig::from_json(&config_json)?;
    let session = ReportSession::from_config(&config, notifier_for(sink))?;
    Ok(Arc::new(DefectReportCore {
        session: Arc::new(session),
    }))
}

/// Open a session backed by in-process services (for previews and testing).
/// The catalog knows no products; verification and submission succeed.
#[uniffi::export]
pub fn open_preview_session(sink: Option<Arc<dyn NoticeSink>>) -> Arc<DefectReportCore> {
    let session = ReportSession::new(
        Arc::new(MockCatalog::empty()),
        Arc::new(MockVerificationService::new()),
        Arc::new(MockSubmissionService::new()),
        notifier_for(sink),
        lookup::DEFAULT_DEBOUNCE_WINDOW_MS,
    );
    Arc::new(DefectReportCore {
        session: Arc::new(session),
    })
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe report session wrapper for FFI.
#[derive(uniffi::Object)]
pub struct DefectReportCore {
    session: Arc<ReportSession>,
}

#[uniffi::export(async_runtime = "tokio")]
impl DefectReportCore {
    // =========================================================================
    // Wizard
    // =========================================================================

    /// Current wizard stage.
    pub fn stage(&self) -> FfiWizardStage {
        self.session.stage().into()
    }

    pub fn next(&self) -> Result<FfiWizardStage, DefectReportError> {
        Ok(self.session.next()?.into())
    }

    pub fn back(&self) -> Result<FfiWizardStage, DefectReportError> {
        Ok(self.session.back()?.into())
    }

    /// "Edit Section" on the report details.
    pub fn edit_report(&self) -> Result<FfiWizardStage, DefectReportError> {
        Ok(self.session.edit_report()?.into())
    }

    /// "Edit Section" on the medical history.
    pub fn edit_medical(&self) -> Result<FfiWizardStage, DefectReportError> {
        Ok(self.session.edit_medical()?.into())
    }

    /// Discard all form data and any verification in progress.
    pub fn abandon(&self) {
        self.session.abandon();
    }

    // =========================================================================
    // Report Form
    // =========================================================================

    pub fn report_draft(&self) -> FfiReportForm {
        self.session.report_draft().into()
    }

    pub fn set_report_kind(&self, kind: FfiReportKind) -> Result<(), DefectReportError> {
        self.session.update_report(|r| r.report_kind = kind.into())?;
        Ok(())
    }

    pub fn set_report_field(
        &self,
        field: FfiReportField,
        value: String,
    ) -> Result<(), DefectReportError> {
        self.session.update_report(|r| r.set(field.into(), value))?;
        Ok(())
    }

    // =========================================================================
    // Medical Form
    // =========================================================================

    pub fn medical_draft(&self) -> FfiMedicalHistory {
        (&self.session.medical_draft()).into()
    }

    /// Returns false if the field was ignored because medical attention was
    /// not sought.
    pub fn set_medical_field(
        &self,
        field: FfiMedicalField,
        value: String,
    ) -> Result<bool, DefectReportError> {
        Ok(self.session.update_medical(|m| m.set(field.into(), value))?)
    }

    pub fn set_sought_medical_attention(&self, sought: bool) -> Result<(), DefectReportError> {
        self.session
            .update_medical(|m| m.set_sought_medical_attention(sought))?;
        Ok(())
    }

    /// Set the time of use, epoch milliseconds.
    pub fn set_usage_time(&self, epoch_ms: i64) -> Result<(), DefectReportError> {
        let at = DateTime::<Utc>::from_timestamp_millis(epoch_ms).ok_or_else(|| {
            DefectReportError::Validation(format!("Timestamp out of range: {}", epoch_ms))
        })?;
        self.session.update_medical(|m| m.set_usage_time(at))?;
        Ok(())
    }

    /// Attach a document picked by the host.
    pub fn attach_file(&self, file: FfiAttachedFile) -> Result<(), DefectReportError> {
        self.session.update_medical(|m| m.attach_file(file.into()))??;
        Ok(())
    }

    /// Attach a photo picked from the library; a missing file name is
    /// synthesized.
    pub fn attach_picked_image(
        &self,
        uri: String,
        file_name: Option<String>,
        mime_type: Option<String>,
        size: Option<u64>,
    ) -> Result<(), DefectReportError> {
        let file = AttachedFile::from_image_pick(
            uri,
            file_name,
            mime_type,
            size,
            Utc::now().timestamp_millis(),
        );
        self.session.update_medical(|m| m.attach_file(file))??;
        Ok(())
    }

    pub fn remove_attachment(&self) -> Result<(), DefectReportError> {
        self.session.update_medical(|m| m.remove_attachment())?;
        Ok(())
    }

    // =========================================================================
    // Scanner
    // =========================================================================

    pub fn open_scanner(&self) -> Result<(), DefectReportError> {
        Ok(self.session.open_scanner()?)
    }

    pub fn close_scanner(&self) {
        self.session.close_scanner();
    }

    /// Whether the scanning surface should deliver raw events.
    pub fn accepts_scans(&self) -> bool {
        self.session.accepts_scans()
    }

    /// Look up a raw scanned barcode and populate the report on success.
    pub async fn handle_scan(&self, raw: String, at_ms: i64) -> FfiScanOutcome {
        self.session.handle_scan(&raw, at_ms).await.into()
    }

    // =========================================================================
    // Verification and Submission
    // =========================================================================

    pub async fn send_code(&self, phone_number: String) -> Result<(), DefectReportError> {
        Ok(self.session.send_code(&phone_number).await?)
    }

    pub async fn resend_code(&self) -> Result<(), DefectReportError> {
        Ok(self.session.resend_code().await?)
    }

    /// Check the code; returns the verified phone number.
    pub async fn verify_code(&self, code: String) -> Result<String, DefectReportError> {
        let phone = self.session.verify_code(&code).await?;
        Ok(phone.as_str().to_string())
    }

    /// Verification status, while at the review stage.
    pub fn otp_status(&self) -> Option<FfiOtpStatus> {
        self.session.otp_status().map(Into::into)
    }

    pub fn review_sections(&self) -> Result<Vec<FfiReviewSection>, DefectReportError> {
        let sections = self.session.review_sections()?;
        Ok(sections.into_iter().map(Into::into).collect())
    }

    pub fn is_submitting(&self) -> bool {
        self.session.is_submitting()
    }

    /// Submit the report. Requires a verified phone number.
    pub async fn submit(&self) -> Result<FfiSubmissionReceipt, DefectReportError> {
        Ok(self.session.submit().await?.into())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe notice severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiNoticeKind {
    Success,
    Error,
}

/// FFI-safe notice.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotice {
    pub kind: FfiNoticeKind,
    pub title: String,
    pub message: String,
}

impl From<Notice> for FfiNotice {
    fn from(notice: Notice) -> Self {
        Self {
            kind: match notice.kind {
                NoticeKind::Success => FfiNoticeKind::Success,
                NoticeKind::Error => FfiNoticeKind::Error,
            },
            title: notice.title,
            message: notice.message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiWizardStage {
    ReportDetails,
    MedicalHistory,
    ReviewSubmit,
}

impl From<WizardStage> for FfiWizardStage {
    fn from(stage: WizardStage) -> Self {
        match stage {
            WizardStage::ReportDetails => FfiWizardStage::ReportDetails,
            WizardStage::MedicalHistory => FfiWizardStage::MedicalHistory,
            WizardStage::ReviewSubmit => FfiWizardStage::ReviewSubmit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiReportKind {
    Product,
    Drug,
}

impl From<FfiReportKind> for ReportKind {
    fn from(kind: FfiReportKind) -> Self {
        match kind {
            FfiReportKind::Product => ReportKind::Product,
            FfiReportKind::Drug => ReportKind::Drug,
        }
    }
}

impl From<ReportKind> for FfiReportKind {
    fn from(kind: ReportKind) -> Self {
        match kind {
            ReportKind::Product => FfiReportKind::Product,
            ReportKind::Drug => FfiReportKind::Drug,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiReportField {
    ReporterName,
    ReporterEmail,
    Identifier,
    ItemName,
    Category,
    Specifications,
    IssueDescription,
}

impl From<FfiReportField> for ReportField {
    fn from(field: FfiReportField) -> Self {
        match field {
            FfiReportField::ReporterName => ReportField::ReporterName,
            FfiReportField::ReporterEmail => ReportField::ReporterEmail,
            FfiReportField::Identifier => ReportField::Identifier,
            FfiReportField::ItemName => ReportField::ItemName,
            FfiReportField::Category => ReportField::Category,
            FfiReportField::Specifications => ReportField::Specifications,
            FfiReportField::IssueDescription => ReportField::IssueDescription,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiMedicalField {
    Allergies,
    Symptoms,
    OtherDetails,
    HospitalName,
    Prescriptions,
}

impl From<FfiMedicalField> for MedicalField {
    fn from(field: FfiMedicalField) -> Self {
        match field {
            FfiMedicalField::Allergies => MedicalField::Allergies,
            FfiMedicalField::Symptoms => MedicalField::Symptoms,
            FfiMedicalField::OtherDetails => MedicalField::OtherDetails,
            FfiMedicalField::HospitalName => MedicalField::HospitalName,
            FfiMedicalField::Prescriptions => MedicalField::Prescriptions,
        }
    }
}

/// FFI-safe report form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReportForm {
    pub reporter_name: String,
    pub reporter_email: String,
    pub report_kind: FfiReportKind,
    pub identifier: String,
    pub item_name: String,
    pub category: String,
    pub specifications: String,
    pub issue_description: String,
}

impl From<ReportForm> for FfiReportForm {
    fn from(form: ReportForm) -> Self {
        Self {
            reporter_name: form.reporter_name,
            reporter_email: form.reporter_email,
            report_kind: form.report_kind.into(),
            identifier: form.identifier,
            item_name: form.item_name,
            category: form.category,
            specifications: form.specifications,
            issue_description: form.issue_description,
        }
    }
}

/// FFI-safe attached file.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAttachedFile {
    pub uri: String,
    pub name: String,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
}

impl From<FfiAttachedFile> for AttachedFile {
    fn from(file: FfiAttachedFile) -> Self {
        AttachedFile {
            uri: file.uri,
            name: file.name,
            mime_type: file.mime_type,
            size: file.size,
        }
    }
}

impl From<&AttachedFile> for FfiAttachedFile {
    fn from(file: &AttachedFile) -> Self {
        Self {
            uri: file.uri.clone(),
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size,
        }
    }
}

/// FFI-safe medical history form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicalHistory {
    pub usage_time_ms: Option<i64>,
    pub usage_display: Option<String>,
    pub allergies: String,
    pub symptoms: String,
    pub other_details: String,
    pub sought_medical_attention: bool,
    pub hospital_name: String,
    pub prescriptions: String,
    pub attached_file: Option<FfiAttachedFile>,
}

impl From<&MedicalHistoryForm> for FfiMedicalHistory {
    fn from(form: &MedicalHistoryForm) -> Self {
        Self {
            usage_time_ms: form.usage_time().map(|t| t.timestamp_millis()),
            usage_display: form.usage_display(),
            allergies: form.allergies().to_string(),
            symptoms: form.symptoms().to_string(),
            other_details: form.other_details().to_string(),
            sought_medical_attention: form.sought_medical_attention(),
            hospital_name: form.hospital_name().to_string(),
            prescriptions: form.prescriptions().to_string(),
            attached_file: form.attached_file().map(Into::into),
        }
    }
}

/// FFI-safe field configuration.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFieldSpec {
    pub key: String,
    pub label: String,
    pub placeholder: String,
    pub multiline: bool,
    pub required: bool,
    pub rule: String,
}

fn field_key_name(key: FieldKey) -> &'static str {
    match key {
        FieldKey::Report(ReportField::ReporterName) => "fullName",
        FieldKey::Report(ReportField::ReporterEmail) => "email",
        FieldKey::Report(ReportField::Identifier) => "identifier",
        FieldKey::Report(ReportField::ItemName) => "productName",
        FieldKey::Report(ReportField::Category) => "category",
        FieldKey::Report(ReportField::Specifications) => "specifications",
        FieldKey::Report(ReportField::IssueDescription) => "issueReview",
        FieldKey::Medical(MedicalField::Allergies) => "allergies",
        FieldKey::Medical(MedicalField::Symptoms) => "symptoms",
        FieldKey::Medical(MedicalField::OtherDetails) => "extras",
        FieldKey::Medical(MedicalField::HospitalName) => "hospitalName",
        FieldKey::Medical(MedicalField::Prescriptions) => "prescriptions",
        FieldKey::UsageTime => "usageDate",
        FieldKey::PhoneNumber => "phoneNumber",
        FieldKey::OtpCode => "otpCode",
    }
}

impl From<FieldSpec> for FfiFieldSpec {
    fn from(spec: FieldSpec) -> Self {
        Self {
            key: field_key_name(spec.key).to_string(),
            required: spec.rule != FieldRule::Optional,
            rule: format!("{:?}", spec.rule).to_lowercase(),
            label: spec.label,
            placeholder: spec.placeholder,
            multiline: spec.multiline,
        }
    }
}

/// FFI-safe scan result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiScanResult {
    pub identifier: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub specifications: Option<String>,
}

impl From<ScanResult> for FfiScanResult {
    fn from(scan: ScanResult) -> Self {
        Self {
            identifier: scan.identifier,
            name: scan.name,
            category: scan.category,
            specifications: scan.specifications,
        }
    }
}

/// FFI-safe scan outcome.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum FfiScanOutcome {
    Found { result: FfiScanResult },
    Failed { error: DefectReportErrorKind, message: String },
    Ignored { reason: FfiIgnoreReason },
    Discarded,
}

/// Why a scan event was dropped without a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiIgnoreReason {
    SurfaceClosed,
    InFlight,
    Debounced,
}

impl From<IgnoreReason> for FfiIgnoreReason {
    fn from(reason: IgnoreReason) -> Self {
        match reason {
            IgnoreReason::SurfaceClosed => FfiIgnoreReason::SurfaceClosed,
            IgnoreReason::InFlight => FfiIgnoreReason::InFlight,
            IgnoreReason::Debounced => FfiIgnoreReason::Debounced,
        }
    }
}

/// Failure category of a scan, for hosts that style errors differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum DefectReportErrorKind {
    NotFound,
    Network,
    Server,
}

impl From<ScanOutcome> for FfiScanOutcome {
    fn from(outcome: ScanOutcome) -> Self {
        match outcome {
            ScanOutcome::Found(scan) => FfiScanOutcome::Found {
                result: scan.into(),
            },
            ScanOutcome::Failed(e) => {
                let message = e.to_string();
                let error = match e {
                    LookupError::NotFound(_) => DefectReportErrorKind::NotFound,
                    LookupError::Network(_) => DefectReportErrorKind::Network,
                    LookupError::Server(_) => DefectReportErrorKind::Server,
                };
                FfiScanOutcome::Failed { error, message }
            }
            ScanOutcome::Ignored(reason) => FfiScanOutcome::Ignored {
                reason: reason.into(),
            },
            ScanOutcome::Discarded => FfiScanOutcome::Discarded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiOtpState {
    Idle,
    Sending,
    Sent,
    Verifying,
    Verified,
    FailedBeforeSend,
    FailedAfterSend,
}

/// FFI-safe verification status.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOtpStatus {
    pub state: FfiOtpState,
    pub code_sent: bool,
    pub in_flight: bool,
    pub phone_number: Option<String>,
    pub last_error: Option<String>,
}

impl From<OtpStatus> for FfiOtpStatus {
    fn from(status: OtpStatus) -> Self {
        let state = match status.state {
            OtpState::Idle => FfiOtpState::Idle,
            OtpState::Sending => FfiOtpState::Sending,
            OtpState::Sent => FfiOtpState::Sent,
            OtpState::Verifying => FfiOtpState::Verifying,
            OtpState::Verified => FfiOtpState::Verified,
            OtpState::Failed {
                resume: OtpResume::Idle,
            } => FfiOtpState::FailedBeforeSend,
            OtpState::Failed {
                resume: OtpResume::Sent,
            } => FfiOtpState::FailedAfterSend,
        };
        Self {
            state,
            code_sent: status.state.code_sent(),
            in_flight: status.state.is_in_flight(),
            phone_number: status.phone_number,
            last_error: status.last_error,
        }
    }
}

/// FFI-safe review row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReviewRow {
    pub label: String,
    pub value: String,
}

/// FFI-safe review section.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReviewSection {
    pub title: String,
    pub edit_stage: FfiWizardStage,
    pub rows: Vec<FfiReviewRow>,
}

impl From<ReviewSection> for FfiReviewSection {
    fn from(section: ReviewSection) -> Self {
        Self {
            title: section.title,
            edit_stage: section.edit_stage.into(),
            rows: section
                .rows
                .into_iter()
                .map(|r| FfiReviewRow {
                    label: r.label,
                    value: r.value,
                })
                .collect(),
        }
    }
}

/// FFI-safe submission receipt.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSubmissionReceipt {
    pub reference: Option<String>,
    pub fingerprint: String,
    pub submitted_at: String,
}

impl From<SubmissionReceipt> for FfiSubmissionReceipt {
    fn from(receipt: SubmissionReceipt) -> Self {
        Self {
            reference: receipt.reference,
            fingerprint: receipt.fingerprint,
            submitted_at: receipt.submitted_at.to_rfc3339(),
        }
    }
}
