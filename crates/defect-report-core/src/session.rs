//! One report from first field to accepted submission.
//!
//! Joins the wizard, the lookup pipeline and the review stage. The review
//! stage owns an [`OtpSession`] created when the stage is entered and
//! discarded when it is left, abandoned, or submitted.

use std::sync::{Arc, Mutex, MutexGuard};

use defect_report_catalog::{CatalogError, HttpCatalog, ProductCatalog};
use thiserror::Error;

use crate::config::{ConfigError, ServiceConfig};
use crate::lookup::{LookupError, LookupPipeline, ScanEvent, ScanOutcome};
use crate::models::{
    AttachmentError, MedicalHistoryForm, ReportForm, ScanResult, SubmissionReceipt,
};
use crate::notify::{Notice, Notifier};
use crate::otp::{OtpError, OtpSession, OtpStatus, VerifiedPhone};
use crate::remote::{
    HttpSubmissionService, HttpVerificationService, JsonPoster, SubmissionService,
    TransportError, VerificationService,
};
use crate::submission::{SubmissionAssembler, SubmissionError, VERIFICATION_REQUIRED_MESSAGE};
use crate::wizard::{ReportWizard, ReviewSection, WizardError, WizardStage};

pub const SCAN_FALLBACK_MESSAGE: &str = "Could not process barcode.";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error(transparent)]
    Otp(#[from] OtpError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Catalog client: {0}")]
    Catalog(#[from] CatalogError),

    #[error("HTTP client: {0}")]
    Transport(#[from] TransportError),
}

pub type SessionResult<T> = Result<T, SessionError>;

pub struct ReportSession {
    wizard: Mutex<ReportWizard>,
    lookup: LookupPipeline,
    verification: Arc<dyn VerificationService>,
    assembler: SubmissionAssembler,
    notifier: Arc<dyn Notifier>,
    otp: Mutex<Option<Arc<OtpSession>>>,
}

impl ReportSession {
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        verification: Arc<dyn VerificationService>,
        submission: Arc<dyn SubmissionService>,
        notifier: Arc<dyn Notifier>,
        debounce_window_ms: i64,
    ) -> Self {
        Self {
            wizard: Mutex::new(ReportWizard::new()),
            lookup: LookupPipeline::new(catalog, debounce_window_ms),
            verification,
            assembler: SubmissionAssembler::new(submission),
            notifier,
            otp: Mutex::new(None),
        }
    }

    /// Wire a session to the HTTP services named in `config`.
    pub fn from_config(config: &ServiceConfig, notifier: Arc<dyn Notifier>) -> SessionResult<Self> {
        config.validate()?;
        let timeout = config.request_timeout_secs;
        let catalog = HttpCatalog::new(
            &config.catalog_search_url,
            &config.catalog_detail_url,
            timeout,
        )?;
        let poster = JsonPoster::new(timeout)?;
        let verification = HttpVerificationService::new(
            poster.clone(),
            &config.send_otp_url,
            &config.check_otp_url,
        );
        let submission = HttpSubmissionService::new(poster, &config.submission_url);

        tracing::info!(timeout_secs = timeout, "Report session configured");
        Ok(Self::new(
            Arc::new(catalog),
            Arc::new(verification),
            Arc::new(submission),
            notifier,
            config.debounce_window_ms,
        ))
    }

    fn wizard(&self) -> MutexGuard<'_, ReportWizard> {
        self.wizard.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn otp_slot(&self) -> MutexGuard<'_, Option<Arc<OtpSession>>> {
        self.otp.lock().unwrap_or_else(|e| e.into_inner())
    }

    // =========================================================================
    // Stages
    // =========================================================================

    pub fn stage(&self) -> WizardStage {
        self.wizard().stage()
    }

    pub fn report_draft(&self) -> ReportForm {
        self.wizard().report_draft().clone()
    }

    pub fn medical_draft(&self) -> MedicalHistoryForm {
        self.wizard().medical_draft().clone()
    }

    /// Edit the report draft in place.
    pub fn update_report<R>(&self, edit: impl FnOnce(&mut ReportForm) -> R) -> SessionResult<R> {
        let mut wizard = self.wizard();
        Ok(edit(wizard.report_mut()?))
    }

    /// Edit the medical draft in place.
    pub fn update_medical<R>(
        &self,
        edit: impl FnOnce(&mut MedicalHistoryForm) -> R,
    ) -> SessionResult<R> {
        let mut wizard = self.wizard();
        Ok(edit(wizard.medical_mut()?))
    }

    pub fn next(&self) -> SessionResult<WizardStage> {
        let stage = self.wizard().next()?;
        self.entered(stage);
        Ok(stage)
    }

    pub fn back(&self) -> SessionResult<WizardStage> {
        let stage = self.wizard().back()?;
        self.entered(stage);
        Ok(stage)
    }

    pub fn edit_report(&self) -> SessionResult<WizardStage> {
        let stage = self.wizard().edit_report()?;
        self.entered(stage);
        Ok(stage)
    }

    pub fn edit_medical(&self) -> SessionResult<WizardStage> {
        let stage = self.wizard().edit_medical()?;
        self.entered(stage);
        Ok(stage)
    }

    /// Throw away everything and start over.
    pub fn abandon(&self) {
        self.lookup.close_surface();
        self.discard_otp();
        self.wizard().reset();
        tracing::info!("Report abandoned");
    }

    /// Mount or unmount stage-owned resources after a stage change.
    fn entered(&self, stage: WizardStage) {
        if stage != WizardStage::ReportDetails {
            self.lookup.close_surface();
        }
        self.discard_otp();
        if stage == WizardStage::ReviewSubmit {
            let session = OtpSession::new(self.verification.clone(), self.notifier.clone());
            *self.otp_slot() = Some(Arc::new(session));
        }
    }

    /// Close `otp` if it is still the review stage's live session. False
    /// once the stage has been left or re-entered since.
    fn release_otp(&self, otp: &Arc<OtpSession>) -> bool {
        let mut slot = self.otp_slot();
        let current = slot
            .as_ref()
            .is_some_and(|live| Arc::ptr_eq(live, otp) && !live.is_closed());
        if current {
            if let Some(live) = slot.take() {
                live.close();
            }
        }
        current
    }

    fn discard_otp(&self) {
        if let Some(session) = self.otp_slot().take() {
            session.close();
        }
    }

    // =========================================================================
    // Scanner
    // =========================================================================

    /// Present the scanning surface. Only the report stage scans.
    pub fn open_scanner(&self) -> SessionResult<()> {
        let stage = self.stage();
        if stage != WizardStage::ReportDetails {
            return Err(WizardError::WrongStage {
                expected: WizardStage::ReportDetails,
                actual: stage,
            }
            .into());
        }
        self.lookup.open_surface();
        Ok(())
    }

    pub fn close_scanner(&self) {
        self.lookup.close_surface();
    }

    pub fn scanner_open(&self) -> bool {
        self.lookup.is_surface_open()
    }

    /// Whether the scanning surface should deliver raw events.
    pub fn accepts_scans(&self) -> bool {
        self.lookup.accepts_scans()
    }

    /// Run a scan through the pipeline and populate the report draft with
    /// the result. The scanner closes after any success or failure.
    pub async fn handle_scan(&self, raw: &str, at_ms: i64) -> ScanOutcome {
        let outcome = self.lookup.handle_scan(ScanEvent::new(raw, at_ms)).await;
        match &outcome {
            ScanOutcome::Found(scan) => {
                self.lookup.close_surface();
                self.populate(scan);
            }
            ScanOutcome::Failed(error) => {
                self.lookup.close_surface();
                self.notifier.notify(scan_error_notice(error));
            }
            ScanOutcome::Ignored(_) | ScanOutcome::Discarded => {}
        }
        outcome
    }

    fn populate(&self, scan: &ScanResult) {
        let applied = self.wizard().report_mut().map(|form| form.apply_scan(scan));
        if applied.is_err() {
            tracing::debug!(identifier = %scan.identifier, "Report stage left before scan applied");
            return;
        }
        let name = scan.name.as_deref().unwrap_or("item");
        self.notifier.notify(Notice::success(
            "Scan Success",
            format!("Populated details for {name}."),
        ));
    }

    // =========================================================================
    // Review and verification
    // =========================================================================

    fn current_otp(&self) -> SessionResult<Arc<OtpSession>> {
        let current = self.otp_slot().clone();
        current.ok_or_else(|| {
            WizardError::WrongStage {
                expected: WizardStage::ReviewSubmit,
                actual: self.stage(),
            }
            .into()
        })
    }

    pub async fn send_code(&self, phone: &str) -> SessionResult<()> {
        let otp = self.current_otp()?;
        Ok(otp.send(phone).await?)
    }

    pub async fn resend_code(&self) -> SessionResult<()> {
        let otp = self.current_otp()?;
        Ok(otp.resend().await?)
    }

    pub async fn verify_code(&self, code: &str) -> SessionResult<VerifiedPhone> {
        let otp = self.current_otp()?;
        Ok(otp.verify(code).await?)
    }

    /// Verification status, while at the review stage.
    pub fn otp_status(&self) -> Option<OtpStatus> {
        self.otp_slot().as_ref().map(|otp| otp.status())
    }

    pub fn review_sections(&self) -> SessionResult<Vec<ReviewSection>> {
        let wizard = self.wizard();
        let context = wizard.review_context().ok_or(WizardError::WrongStage {
            expected: WizardStage::ReviewSubmit,
            actual: wizard.stage(),
        })?;
        Ok(context.sections())
    }

    pub fn is_submitting(&self) -> bool {
        self.assembler.is_submitting()
    }

    /// Submit the captured snapshots. On acceptance the OTP session is
    /// discarded and the wizard restarts empty, unless the review stage was
    /// left while the request was out.
    pub async fn submit(&self) -> SessionResult<SubmissionReceipt> {
        let context = {
            let wizard = self.wizard();
            wizard.review_context().ok_or(WizardError::WrongStage {
                expected: WizardStage::ReviewSubmit,
                actual: wizard.stage(),
            })?
        };
        let otp = self.current_otp()?;

        let result = self
            .assembler
            .submit(&context.report, &context.medical, &otp)
            .await;

        match result {
            Ok(receipt) => {
                if self.release_otp(&otp) {
                    self.wizard().reset();
                } else {
                    tracing::info!(
                        fingerprint = %receipt.fingerprint,
                        "Review stage left during submission, keeping drafts"
                    );
                }
                self.notifier.notify(Notice::success(
                    "Submission Sent",
                    "Your report has been submitted.",
                ));
                Ok(receipt)
            }
            Err(e) => {
                if let Some(notice) = submission_notice(&e) {
                    self.notifier.notify(notice);
                }
                Err(e.into())
            }
        }
    }
}

fn scan_error_notice(error: &LookupError) -> Notice {
    let message = error.to_string();
    if message.trim().is_empty() {
        Notice::error("Scan Error", SCAN_FALLBACK_MESSAGE)
    } else {
        Notice::error("Scan Error", message)
    }
}

fn submission_notice(error: &SubmissionError) -> Option<Notice> {
    match error {
        SubmissionError::VerificationRequired => Some(Notice::error(
            "Verification Required",
            VERIFICATION_REQUIRED_MESSAGE,
        )),
        SubmissionError::SubmissionInProgress => None,
        SubmissionError::Network(_) => Some(Notice::error(
            "Network Error",
            "Could not connect to the server.",
        )),
        other => Some(Notice::error("Error", other.to_string())),
    }
}
