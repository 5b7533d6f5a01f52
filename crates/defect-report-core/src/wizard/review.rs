//! Labelled rows for the review stage.

use super::WizardStage;
use crate::models::{MedicalHistoryForm, ReportForm};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRow {
    pub label: String,
    pub value: String,
}

/// A titled group of rows with the stage its "Edit Section" action returns to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSection {
    pub title: String,
    pub edit_stage: WizardStage,
    pub rows: Vec<ReviewRow>,
}

impl ReviewSection {
    fn new(title: impl Into<String>, edit_stage: WizardStage) -> Self {
        Self {
            title: title.into(),
            edit_stage,
            rows: Vec::new(),
        }
    }

    /// Add a row unless the value is empty.
    fn row(&mut self, label: impl Into<String>, value: &str) -> &mut Self {
        if !value.is_empty() {
            self.rows.push(ReviewRow {
                label: label.into(),
                value: value.to_string(),
            });
        }
        self
    }

    pub fn value(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.value.as_str())
    }
}

pub fn report_section(report: &ReportForm) -> ReviewSection {
    let kind = report.report_kind.as_str();
    let mut section = ReviewSection::new(format!("About {kind}"), WizardStage::ReportDetails);
    section
        .row("Identifier (UPC/NDC)", &report.identifier)
        .row(format!("{kind} Name"), &report.item_name)
        .row("Category", &report.category)
        .row("Specifications", &report.specifications)
        .row("Issue Review", &report.issue_description)
        .row("Reporter Name", &report.reporter_name)
        .row("Reporter Email", &report.reporter_email);
    section
}

pub fn medical_section(medical: &MedicalHistoryForm) -> ReviewSection {
    let mut section = ReviewSection::new(
        "About Problem & Medical History",
        WizardStage::MedicalHistory,
    );
    let usage = medical.usage_display().unwrap_or_default();
    let sought = medical.sought_medical_attention();

    section
        .row("Date/Time of Use/Consumption", &usage)
        .row("Known Allergies", medical.allergies())
        .row("Symptoms Experienced", medical.symptoms())
        .row("Sought Medical Attention", if sought { "Yes" } else { "No" });
    if sought {
        let file = medical.attached_file().map(|f| f.name.as_str()).unwrap_or("");
        section
            .row("Hospital/Clinic Visited", medical.hospital_name())
            .row("Prescriptions Received", medical.prescriptions())
            .row("Uploaded Report File", file);
    }
    section.row("Other Information", medical.other_details());
    section
}

/// Both review sections, report first.
pub fn review_sections(report: &ReportForm, medical: &MedicalHistoryForm) -> Vec<ReviewSection> {
    vec![report_section(report), medical_section(medical)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttachedFile, MedicalField, ReportKind};

    #[test]
    fn test_report_section_omits_empty_values() {
        let report = ReportForm {
            report_kind: ReportKind::Drug,
            identifier: "0002-1433-80".into(),
            item_name: "Ibuprofen".into(),
            ..Default::default()
        };

        let section = report_section(&report);

        assert_eq!(section.title, "About Drug");
        assert_eq!(section.value("Drug Name"), Some("Ibuprofen"));
        assert_eq!(section.value("Category"), None);
        assert_eq!(section.rows.len(), 2);
    }

    #[test]
    fn test_attention_rows_only_when_sought() {
        let mut medical = MedicalHistoryForm::new();
        medical.set(MedicalField::Symptoms, "Nausea");
        let section = medical_section(&medical);
        assert_eq!(section.value("Sought Medical Attention"), Some("No"));
        assert_eq!(section.value("Hospital/Clinic Visited"), None);

        medical.set_sought_medical_attention(true);
        medical.set(MedicalField::HospitalName, "General Hospital");
        medical
            .attach_file(AttachedFile {
                uri: "file:///tmp/report.pdf".into(),
                name: "report.pdf".into(),
                mime_type: Some("application/pdf".into()),
                size: Some(1024),
            })
            .unwrap();
        let section = medical_section(&medical);
        assert_eq!(section.value("Sought Medical Attention"), Some("Yes"));
        assert_eq!(section.value("Hospital/Clinic Visited"), Some("General Hospital"));
        assert_eq!(section.value("Uploaded Report File"), Some("report.pdf"));
        assert_eq!(section.value("Prescriptions Received"), None);
        assert_eq!(section.edit_stage, WizardStage::MedicalHistory);
    }
}
