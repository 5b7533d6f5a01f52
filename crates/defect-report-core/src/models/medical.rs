//! Medical-history stage form.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// A report document picked from files or the photo library.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AttachedFile {
    pub uri: String,
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
    pub size: Option<u64>,
}

impl AttachedFile {
    /// Build from a photo-library pick. Photos often come without a file
    /// name, so one is synthesized from the pick time and the URI extension.
    pub fn from_image_pick(
        uri: String,
        file_name: Option<String>,
        mime_type: Option<String>,
        size: Option<u64>,
        picked_at_ms: i64,
    ) -> Self {
        let name = file_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("photo_{}.{}", picked_at_ms, uri_extension(&uri)));

        Self {
            uri,
            name,
            mime_type: Some(mime_type.unwrap_or_else(|| "image/jpeg".to_string())),
            size,
        }
    }

    /// PDFs and images are accepted. A file with no known MIME type is
    /// accepted too.
    pub fn is_supported_type(&self) -> bool {
        match self.mime_type.as_deref() {
            None => true,
            Some(mime) => {
                let mime = mime.to_ascii_lowercase();
                mime == "application/pdf" || mime.starts_with("image/")
            }
        }
    }
}

fn uri_extension(uri: &str) -> &str {
    match uri.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && !ext.contains('/') => ext,
        _ => "jpg",
    }
}

/// Attachment errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("Attachments are only accepted when medical attention was sought")]
    AttentionNotSought,

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
}

/// Editable free-text medical fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MedicalField {
    Allergies,
    Symptoms,
    OtherDetails,
    /// Only editable while medical attention was sought
    HospitalName,
    /// Only editable while medical attention was sought
    Prescriptions,
}

impl MedicalField {
    pub fn requires_attention(&self) -> bool {
        matches!(self, MedicalField::HospitalName | MedicalField::Prescriptions)
    }
}

/// The second wizard stage.
///
/// Hospital, prescriptions and the attachment only exist while
/// `sought_medical_attention` is true; the fields are private so that
/// invariant holds for every observer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct MedicalHistoryForm {
    #[serde(rename = "usageDate")]
    usage_time: Option<DateTime<Utc>>,
    allergies: String,
    symptoms: String,
    #[serde(rename = "extras")]
    other_details: String,
    #[serde(rename = "medicalAttention")]
    sought_medical_attention: bool,
    #[serde(rename = "hospitalName")]
    hospital_name: String,
    prescriptions: String,
    #[serde(rename = "selectedReportInfo")]
    attached_file: Option<AttachedFile>,
}

impl MedicalHistoryForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn usage_time(&self) -> Option<DateTime<Utc>> {
        self.usage_time
    }

    pub fn set_usage_time(&mut self, at: DateTime<Utc>) {
        self.usage_time = Some(at);
    }

    /// Usage time as shown on the review screen, e.g. "Mar 5, 2025 3:04 PM".
    pub fn usage_display(&self) -> Option<String> {
        self.usage_time
            .map(|t| t.format("%b %-d, %Y %-I:%M %p").to_string())
    }

    pub fn allergies(&self) -> &str {
        &self.allergies
    }

    pub fn symptoms(&self) -> &str {
        &self.symptoms
    }

    pub fn other_details(&self) -> &str {
        &self.other_details
    }

    pub fn sought_medical_attention(&self) -> bool {
        self.sought_medical_attention
    }

    pub fn hospital_name(&self) -> &str {
        &self.hospital_name
    }

    pub fn prescriptions(&self) -> &str {
        &self.prescriptions
    }

    pub fn attached_file(&self) -> Option<&AttachedFile> {
        self.attached_file.as_ref()
    }

    /// Set a free-text field. Returns false when the field is attention-only
    /// and attention was not sought; the value is then dropped.
    pub fn set(&mut self, field: MedicalField, value: impl Into<String>) -> bool {
        if field.requires_attention() && !self.sought_medical_attention {
            tracing::debug!(?field, "Ignoring attention-only field while attention not sought");
            return false;
        }

        let value = value.into();
        match field {
            MedicalField::Allergies => self.allergies = value,
            MedicalField::Symptoms => self.symptoms = value,
            MedicalField::OtherDetails => self.other_details = value,
            MedicalField::HospitalName => self.hospital_name = value,
            MedicalField::Prescriptions => self.prescriptions = value,
        }
        true
    }

    /// Toggle whether medical attention was sought. Turning it off clears
    /// hospital, prescriptions and the attachment in the same update.
    pub fn set_sought_medical_attention(&mut self, sought: bool) {
        self.sought_medical_attention = sought;
        if !sought {
            self.hospital_name.clear();
            self.prescriptions.clear();
            self.attached_file = None;
        }
    }

    /// Attach (or replace) the medical report document.
    pub fn attach_file(&mut self, file: AttachedFile) -> Result<(), AttachmentError> {
        if !self.sought_medical_attention {
            return Err(AttachmentError::AttentionNotSought);
        }
        if !file.is_supported_type() {
            return Err(AttachmentError::UnsupportedType(
                file.mime_type.clone().unwrap_or_default(),
            ));
        }
        tracing::debug!(name = %file.name, size = ?file.size, "Report file attached");
        self.attached_file = Some(file);
        Ok(())
    }

    pub fn remove_attachment(&mut self) {
        self.attached_file = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pdf(name: &str) -> AttachedFile {
        AttachedFile {
            uri: format!("file:///cache/{}", name),
            name: name.into(),
            mime_type: Some("application/pdf".into()),
            size: Some(2048),
        }
    }

    #[test]
    fn test_turning_attention_off_clears_dependent_fields() {
        let mut form = MedicalHistoryForm::new();
        form.set_sought_medical_attention(true);
        assert!(form.set(MedicalField::HospitalName, "St. Mary's"));
        assert!(form.set(MedicalField::Prescriptions, "Amoxicillin"));
        form.attach_file(pdf("er-visit.pdf")).unwrap();

        form.set_sought_medical_attention(false);

        assert!(!form.sought_medical_attention());
        assert_eq!(form.hospital_name(), "");
        assert_eq!(form.prescriptions(), "");
        assert!(form.attached_file().is_none());
    }

    #[test]
    fn test_attention_only_fields_ignored_when_not_sought() {
        let mut form = MedicalHistoryForm::new();
        assert!(!form.set(MedicalField::HospitalName, "St. Mary's"));
        assert_eq!(form.hospital_name(), "");
        assert_eq!(
            form.attach_file(pdf("x.pdf")),
            Err(AttachmentError::AttentionNotSought)
        );
    }

    #[test]
    fn test_common_fields_always_editable() {
        let mut form = MedicalHistoryForm::new();
        assert!(form.set(MedicalField::Symptoms, "Nausea"));
        assert!(form.set(MedicalField::Allergies, "Peanuts"));
        assert!(form.set(MedicalField::OtherDetails, "Ate half the box"));
        assert_eq!(form.symptoms(), "Nausea");
        assert_eq!(form.allergies(), "Peanuts");
        assert_eq!(form.other_details(), "Ate half the box");
    }

    #[test]
    fn test_unsupported_attachment_type() {
        let mut form = MedicalHistoryForm::new();
        form.set_sought_medical_attention(true);
        let file = AttachedFile {
            uri: "file:///cache/notes.docx".into(),
            name: "notes.docx".into(),
            mime_type: Some("application/msword".into()),
            size: None,
        };
        assert!(matches!(
            form.attach_file(file),
            Err(AttachmentError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_image_pick_name_synthesis() {
        let file = AttachedFile::from_image_pick(
            "file:///photos/IMG_0042.HEIC".into(),
            None,
            None,
            Some(10),
            1_700_000_000_000,
        );
        assert_eq!(file.name, "photo_1700000000000.HEIC");
        assert_eq!(file.mime_type.as_deref(), Some("image/jpeg"));

        let file = AttachedFile::from_image_pick(
            "content://media/external/images/42".into(),
            None,
            Some("image/png".into()),
            None,
            7,
        );
        assert_eq!(file.name, "photo_7.jpg");
        assert_eq!(file.mime_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_usage_display() {
        let mut form = MedicalHistoryForm::new();
        assert_eq!(form.usage_display(), None);
        form.set_usage_time(Utc.with_ymd_and_hms(2025, 3, 5, 15, 4, 0).unwrap());
        assert_eq!(form.usage_display().as_deref(), Some("Mar 5, 2025 3:04 PM"));
    }

    #[test]
    fn test_wire_field_names() {
        let mut form = MedicalHistoryForm::new();
        form.set(MedicalField::OtherDetails, "extra");
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["extras"], "extra");
        assert_eq!(json["medicalAttention"], false);
        assert!(json["selectedReportInfo"].is_null());
    }
}
