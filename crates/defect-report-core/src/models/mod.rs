//! Domain models for defect reports.

mod fields;
mod medical;
mod report;
mod submission;

pub use fields::*;
pub use medical::*;
pub use report::*;
pub use submission::*;
