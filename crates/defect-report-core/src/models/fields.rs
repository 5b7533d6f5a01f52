//! Typed field configuration for the form stages.
//!
//! Labels and placeholders depend on the report kind; the UI renders one
//! input per [`FieldSpec`] and may call [`FieldSpec::check`] before advancing.

use super::medical::MedicalField;
use super::report::{ReportField, ReportKind};

/// Which form value a field configuration describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Report(ReportField),
    Medical(MedicalField),
    UsageTime,
    PhoneNumber,
    OtpCode,
}

/// Input rule attached to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    Optional,
    Required,
    Email,
    Phone,
}

/// Configuration for a single input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: FieldKey,
    pub label: String,
    pub placeholder: String,
    pub multiline: bool,
    pub rule: FieldRule,
}

impl FieldSpec {
    fn new(key: FieldKey, label: &str, placeholder: &str, rule: FieldRule) -> Self {
        Self {
            key,
            label: label.to_string(),
            placeholder: placeholder.to_string(),
            multiline: false,
            rule,
        }
    }

    fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    /// Check a value against the rule, returning a user-facing message.
    pub fn check(&self, value: &str) -> Result<(), String> {
        let value = value.trim();
        match self.rule {
            FieldRule::Optional => Ok(()),
            FieldRule::Required if value.is_empty() => {
                Err(format!("{} is required.", self.label))
            }
            FieldRule::Required => Ok(()),
            FieldRule::Email => {
                let valid = value
                    .split_once('@')
                    .map(|(user, domain)| !user.is_empty() && domain.contains('.'))
                    .unwrap_or(false);
                if valid {
                    Ok(())
                } else {
                    Err("Please enter a valid email address.".to_string())
                }
            }
            FieldRule::Phone => crate::otp::normalize_phone_number(value)
                .map(|_| ())
                .map_err(|e| e.user_message()),
        }
    }
}

/// Report-stage inputs, in display order.
pub fn report_field_specs(kind: ReportKind) -> Vec<FieldSpec> {
    use FieldRule::{Email, Optional, Required};
    use ReportField as F;

    let product = kind == ReportKind::Product;
    let pick = |p: &'static str, d: &'static str| if product { p } else { d };

    vec![
        FieldSpec::new(FieldKey::Report(F::ReporterName), "Full Name", "Enter your full name", Required),
        FieldSpec::new(FieldKey::Report(F::ReporterEmail), "Email Address", "Enter your email", Email),
        FieldSpec::new(
            FieldKey::Report(F::Identifier),
            pick("Product Identifier (UPC / Barcode)", "Drug Identifier (NDC / Barcode)"),
            pick("Scan or enter product identifier", "Scan or enter drug identifier"),
            Required,
        ),
        FieldSpec::new(
            FieldKey::Report(F::ItemName),
            pick("Product Name", "Drug / Medication Name"),
            pick(
                "e.g., Organic Whole Milk, Crunchy Oats Cereal",
                "e.g., Allergy Relief Tablets, Ibuprofen Caplets",
            ),
            Required,
        ),
        FieldSpec::new(
            FieldKey::Report(F::Category),
            pick("Product Category", "Drug Category"),
            pick("e.g., Dairy, Beverage, Snack Food", "e.g., Antihistamine, Pain Relief, OTC"),
            Optional,
        ),
        FieldSpec::new(
            FieldKey::Report(F::Specifications),
            pick("Specifications / Details", "Dosage / Strength / Form"),
            pick(
                "e.g., 1 Gallon, 12 oz Box, Expires 2025-12-31",
                "e.g., 24 Tablets, 200mg, 10ml Liquid",
            ),
            Optional,
        ),
        FieldSpec::new(
            FieldKey::Report(F::IssueDescription),
            "Detailed Review about Issue",
            "Please describe the problem or reaction...",
            Required,
        )
        .multiline(),
    ]
}

/// Medical-history inputs. Hospital and prescriptions only appear when
/// medical attention was sought.
pub fn medical_field_specs(sought_attention: bool) -> Vec<FieldSpec> {
    use FieldRule::Optional;
    use MedicalField as F;

    let mut specs = vec![
        FieldSpec::new(
            FieldKey::UsageTime,
            "Date and Time of Consumption/Usage",
            "Select Date and Time",
            Optional,
        ),
        FieldSpec::new(
            FieldKey::Medical(F::Allergies),
            "Known Allergies (if any)",
            "e.g., Peanuts, Penicillin, None",
            Optional,
        )
        .multiline(),
        FieldSpec::new(
            FieldKey::Medical(F::Symptoms),
            "Symptoms Experienced",
            "Describe the symptoms...",
            Optional,
        )
        .multiline(),
        FieldSpec::new(
            FieldKey::Medical(F::OtherDetails),
            "Other Relevant Information",
            "Any other details...",
            Optional,
        )
        .multiline(),
    ];

    if sought_attention {
        specs.push(FieldSpec::new(
            FieldKey::Medical(F::HospitalName),
            "Name of Hospital/Clinic Visited",
            "Enter facility name",
            Optional,
        ));
        specs.push(
            FieldSpec::new(
                FieldKey::Medical(F::Prescriptions),
                "Prescriptions Received (if any)",
                "List prescriptions...",
                Optional,
            )
            .multiline(),
        );
    }

    specs
}

/// Review-stage verification inputs.
pub fn verification_field_specs() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(
            FieldKey::PhoneNumber,
            "Phone Number (e.g., +14155552671)",
            "+1XXXXXXXXXX",
            FieldRule::Phone,
        ),
        FieldSpec::new(FieldKey::OtpCode, "Enter OTP Code", "Enter code", FieldRule::Required),
    ]
}
