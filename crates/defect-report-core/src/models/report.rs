//! Report-stage form: who is reporting and which item is defective.

use serde::{Deserialize, Serialize};

/// Kind of item being reported.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ReportKind {
    #[default]
    Product,
    Drug,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Product => "Product",
            ReportKind::Drug => "Drug",
        }
    }
}

/// Result of a successful barcode lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanResult {
    /// Normalized identifier that was looked up
    pub identifier: String,
    pub name: Option<String>,
    pub category: Option<String>,
    /// Brand, size or similar
    pub specifications: Option<String>,
}

/// The first wizard stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ReportForm {
    #[serde(rename = "fullName")]
    pub reporter_name: String,
    #[serde(rename = "email")]
    pub reporter_email: String,
    #[serde(rename = "reportType")]
    pub report_kind: ReportKind,
    /// UPC for products, NDC for drugs
    pub identifier: String,
    #[serde(rename = "productName")]
    pub item_name: String,
    pub category: String,
    pub specifications: String,
    #[serde(rename = "issueReview")]
    pub issue_description: String,
}

/// Editable report fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportField {
    ReporterName,
    ReporterEmail,
    Identifier,
    ItemName,
    Category,
    Specifications,
    IssueDescription,
}

impl ReportForm {
    /// Set a single text field.
    pub fn set(&mut self, field: ReportField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ReportField::ReporterName => self.reporter_name = value,
            ReportField::ReporterEmail => self.reporter_email = value,
            ReportField::Identifier => self.identifier = value,
            ReportField::ItemName => self.item_name = value,
            ReportField::Category => self.category = value,
            ReportField::Specifications => self.specifications = value,
            ReportField::IssueDescription => self.issue_description = value,
        }
    }

    /// Populate item fields from a scan.
    ///
    /// The identifier is kept when the scan has none; the descriptive fields
    /// are overwritten, and cleared when the scan lacks them.
    pub fn apply_scan(&mut self, scan: &ScanResult) {
        if !scan.identifier.is_empty() {
            self.identifier = scan.identifier.clone();
        }
        self.item_name = scan.name.clone().unwrap_or_default();
        self.category = scan.category.clone().unwrap_or_default();
        self.specifications = scan.specifications.clone().unwrap_or_default();
    }
}
