//! Final submission payload.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::medical::MedicalHistoryForm;
use super::report::ReportForm;
use crate::otp::VerifiedPhone;

/// Medical details with the verified phone number merged in.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MedicalDetails {
    #[serde(flatten)]
    history: MedicalHistoryForm,
    #[serde(rename = "phoneNumberVerified")]
    verified_phone_number: String,
}

impl MedicalDetails {
    pub fn history(&self) -> &MedicalHistoryForm {
        &self.history
    }

    pub fn verified_phone_number(&self) -> &str {
        &self.verified_phone_number
    }
}

/// The document sent to the submission endpoint.
///
/// Only constructible with a [`VerifiedPhone`], which the OTP protocol hands
/// out once a session reaches `Verified`. Fields are private so a payload
/// cannot be assembled around an unverified number:
///
/// ```compile_fail
/// use chrono::Utc;
/// use defect_report_core::{MedicalDetails, MedicalHistoryForm, ReportForm, SubmissionPayload};
///
/// let _payload = SubmissionPayload {
///     report_details: ReportForm::default(),
///     medical_details: MedicalDetails {
///         history: MedicalHistoryForm::new(),
///         verified_phone_number: "+10000000000".into(),
///     },
///     submitted_at: Utc::now(),
/// };
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SubmissionPayload {
    #[serde(rename = "reportDetails")]
    report_details: ReportForm,
    #[serde(rename = "medicalDetails")]
    medical_details: MedicalDetails,
    #[serde(rename = "submittedAt", serialize_with = "rfc3339_millis")]
    submitted_at: DateTime<Utc>,
}

fn rfc3339_millis<S: serde::Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl SubmissionPayload {
    /// Build a payload, stamping it with the current time.
    pub fn build(report: ReportForm, medical: MedicalHistoryForm, phone: &VerifiedPhone) -> Self {
        Self::build_at(report, medical, phone, Utc::now())
    }

    /// Build a payload with an explicit submission time.
    pub fn build_at(
        report: ReportForm,
        medical: MedicalHistoryForm,
        phone: &VerifiedPhone,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            report_details: report,
            medical_details: MedicalDetails {
                history: medical,
                verified_phone_number: phone.as_str().to_string(),
            },
            submitted_at,
        }
    }

    pub fn report_details(&self) -> &ReportForm {
        &self.report_details
    }

    pub fn medical_details(&self) -> &MedicalDetails {
        &self.medical_details
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Hex SHA-256 over the report and medical details, excluding the
    /// timestamp. Identical reports produce identical fingerprints.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let canonical = serde_json::to_string(&(&self.report_details, &self.medical_details))?;
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Acknowledgment of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Server-side reference, if the endpoint returned one
    pub reference: Option<String>,
    /// Payload fingerprint sent as the idempotency key
    pub fingerprint: String,
    pub submitted_at: DateTime<Utc>,
}
