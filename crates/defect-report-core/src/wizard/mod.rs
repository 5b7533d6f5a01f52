//! Three-stage report wizard.
//!
//! Each stage edits a live draft. Advancing captures a snapshot by value and
//! hands it forward; later edits to a draft never reach a snapshot already
//! captured. "Edit Section" reopens a stage from its snapshot and leaves the
//! other stage's snapshot alone.

mod review;

pub use review::*;

use thiserror::Error;

use crate::models::{MedicalHistoryForm, ReportForm};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum WizardStage {
    #[default]
    ReportDetails,
    MedicalHistory,
    ReviewSubmit,
}

impl WizardStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStage::ReportDetails => "report_details",
            WizardStage::MedicalHistory => "medical_history",
            WizardStage::ReviewSubmit => "review_submit",
        }
    }
}

/// Wizard errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("Operation requires stage {expected:?}, wizard is at {actual:?}")]
    WrongStage {
        expected: WizardStage,
        actual: WizardStage,
    },

    #[error("No stage after {0:?}")]
    NoNextStage(WizardStage),

    #[error("No stage before {0:?}")]
    NoPreviousStage(WizardStage),
}

pub type WizardResult<T> = Result<T, WizardError>;

/// Snapshots handed to the review stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewContext {
    pub report: ReportForm,
    pub medical: MedicalHistoryForm,
}

impl ReviewContext {
    pub fn sections(&self) -> Vec<ReviewSection> {
        review_sections(&self.report, &self.medical)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportWizard {
    stage: WizardStage,
    report_draft: ReportForm,
    medical_draft: MedicalHistoryForm,
    report_snapshot: Option<ReportForm>,
    medical_snapshot: Option<MedicalHistoryForm>,
}

impl ReportWizard {
    /// Create a new wizard at the first stage with empty forms.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> WizardStage {
        self.stage
    }

    fn expect_stage(&self, expected: WizardStage) -> WizardResult<()> {
        let actual = self.stage();
        if actual == expected {
            Ok(())
        } else {
            Err(WizardError::WrongStage { expected, actual })
        }
    }

    fn enter(&mut self, stage: WizardStage) {
        tracing::debug!(from = self.stage().as_str(), to = stage.as_str(), "Wizard stage change");
        self.stage = stage;
    }

    pub fn report_draft(&self) -> &ReportForm {
        &self.report_draft
    }

    pub fn medical_draft(&self) -> &MedicalHistoryForm {
        &self.medical_draft
    }

    /// Mutable report draft. Only while at `ReportDetails`.
    pub fn report_mut(&mut self) -> WizardResult<&mut ReportForm> {
        self.expect_stage(WizardStage::ReportDetails)?;
        Ok(&mut self.report_draft)
    }

    /// Mutable medical draft. Only while at `MedicalHistory`.
    pub fn medical_mut(&mut self) -> WizardResult<&mut MedicalHistoryForm> {
        self.expect_stage(WizardStage::MedicalHistory)?;
        Ok(&mut self.medical_draft)
    }

    pub fn report_snapshot(&self) -> Option<&ReportForm> {
        self.report_snapshot.as_ref()
    }

    pub fn medical_snapshot(&self) -> Option<&MedicalHistoryForm> {
        self.medical_snapshot.as_ref()
    }

    /// Capture the current stage's draft and move forward.
    pub fn next(&mut self) -> WizardResult<WizardStage> {
        match self.stage() {
            WizardStage::ReportDetails => {
                self.report_snapshot = Some(self.report_draft.clone());
                if let Some(medical) = &self.medical_snapshot {
                    self.medical_draft = medical.clone();
                }
                self.enter(WizardStage::MedicalHistory);
            }
            WizardStage::MedicalHistory => {
                self.medical_snapshot = Some(self.medical_draft.clone());
                self.enter(WizardStage::ReviewSubmit);
            }
            stage @ WizardStage::ReviewSubmit => return Err(WizardError::NoNextStage(stage)),
        }
        Ok(self.stage())
    }

    /// Step back one stage, restoring that stage's snapshot.
    pub fn back(&mut self) -> WizardResult<WizardStage> {
        match self.stage() {
            stage @ WizardStage::ReportDetails => Err(WizardError::NoPreviousStage(stage)),
            WizardStage::MedicalHistory => self.edit_report(),
            WizardStage::ReviewSubmit => self.edit_medical(),
        }
    }

    /// Reopen the report stage from its snapshot.
    pub fn edit_report(&mut self) -> WizardResult<WizardStage> {
        if let Some(report) = &self.report_snapshot {
            self.report_draft = report.clone();
        }
        self.enter(WizardStage::ReportDetails);
        Ok(self.stage())
    }

    /// Reopen the medical stage from its snapshot.
    pub fn edit_medical(&mut self) -> WizardResult<WizardStage> {
        if self.report_snapshot.is_none() {
            return Err(WizardError::WrongStage {
                expected: WizardStage::MedicalHistory,
                actual: self.stage(),
            });
        }
        if let Some(medical) = &self.medical_snapshot {
            self.medical_draft = medical.clone();
        }
        self.enter(WizardStage::MedicalHistory);
        Ok(self.stage())
    }

    /// Snapshots for the review stage, once it is reached.
    pub fn review_context(&self) -> Option<ReviewContext> {
        if self.stage() != WizardStage::ReviewSubmit {
            return None;
        }
        Some(ReviewContext {
            report: self.report_snapshot.clone()?,
            medical: self.medical_snapshot.clone()?,
        })
    }

    /// Drop all data and start over at the first stage.
    pub fn reset(&mut self) {
        tracing::debug!(stage = self.stage().as_str(), "Wizard reset");
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MedicalField, ReportField};

    fn at_review() -> ReportWizard {
        let mut wizard = ReportWizard::new();
        wizard
            .report_mut()
            .unwrap()
            .set(ReportField::ItemName, "Test Milk");
        wizard.next().unwrap();
        wizard
            .medical_mut()
            .unwrap()
            .set(MedicalField::Symptoms, "Nausea");
        wizard.next().unwrap();
        wizard
    }

    #[test]
    fn test_stage_order() {
        let mut wizard = ReportWizard::new();
        assert_eq!(wizard.stage(), WizardStage::ReportDetails);
        assert_eq!(wizard.next(), Ok(WizardStage::MedicalHistory));
        assert_eq!(wizard.next(), Ok(WizardStage::ReviewSubmit));
        assert_eq!(
            wizard.next(),
            Err(WizardError::NoNextStage(WizardStage::ReviewSubmit))
        );
        assert_eq!(wizard.back(), Ok(WizardStage::MedicalHistory));
        assert_eq!(wizard.back(), Ok(WizardStage::ReportDetails));
        assert_eq!(
            wizard.back(),
            Err(WizardError::NoPreviousStage(WizardStage::ReportDetails))
        );
    }

    #[test]
    fn test_edits_gated_by_stage() {
        let mut wizard = ReportWizard::new();
        assert!(wizard.medical_mut().is_err());
        wizard.next().unwrap();
        assert_eq!(
            wizard.report_mut().unwrap_err(),
            WizardError::WrongStage {
                expected: WizardStage::ReportDetails,
                actual: WizardStage::MedicalHistory,
            }
        );
    }

    #[test]
    fn test_review_context_carries_snapshots() {
        let wizard = at_review();
        let context = wizard.review_context().unwrap();
        assert_eq!(context.report.item_name, "Test Milk");
        assert_eq!(context.medical.symptoms(), "Nausea");
        assert!(ReportWizard::new().review_context().is_none());
    }

    #[test]
    fn test_editing_medical_leaves_report_snapshot_untouched() {
        let mut wizard = at_review();
        let before = serde_json::to_vec(wizard.report_snapshot().unwrap()).unwrap();

        wizard.edit_medical().unwrap();
        assert_eq!(wizard.medical_draft().symptoms(), "Nausea");
        wizard
            .medical_mut()
            .unwrap()
            .set(MedicalField::Symptoms, "Rash");
        wizard.next().unwrap();

        let after = serde_json::to_vec(wizard.report_snapshot().unwrap()).unwrap();
        assert_eq!(before, after);
        assert_eq!(wizard.review_context().unwrap().medical.symptoms(), "Rash");
    }

    #[test]
    fn test_unadvanced_draft_edits_do_not_reach_snapshot() {
        let mut wizard = at_review();
        wizard.edit_medical().unwrap();
        wizard
            .medical_mut()
            .unwrap()
            .set(MedicalField::Allergies, "Peanuts");

        // Back out without advancing: the captured snapshot is unchanged
        assert_eq!(wizard.medical_snapshot().unwrap().allergies(), "");
    }

    #[test]
    fn test_editing_report_keeps_medical_snapshot() {
        let mut wizard = at_review();

        wizard.edit_report().unwrap();
        wizard
            .report_mut()
            .unwrap()
            .set(ReportField::ItemName, "Test Yogurt");
        assert_eq!(wizard.next(), Ok(WizardStage::MedicalHistory));
        assert_eq!(wizard.medical_draft().symptoms(), "Nausea");
        wizard.next().unwrap();

        let context = wizard.review_context().unwrap();
        assert_eq!(context.report.item_name, "Test Yogurt");
        assert_eq!(context.medical.symptoms(), "Nausea");
    }

    #[test]
    fn test_reset() {
        let mut wizard = at_review();
        wizard.reset();
        assert_eq!(wizard.stage(), WizardStage::ReportDetails);
        assert!(wizard.report_snapshot().is_none());
        assert_eq!(wizard.report_draft(), &ReportForm::default());
    }
}
