//! Product and drug catalog client.
//!
//! This crate resolves a scanned identifier into catalog data in two steps:
//! an identifier search that yields candidates, then a detail-enrichment call
//! on the chosen candidate.

pub mod client;
pub mod mock;
pub mod response;

pub use client::*;
pub use mock::*;
pub use response::*;
