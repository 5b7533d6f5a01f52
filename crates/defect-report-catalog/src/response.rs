//! Catalog wire types and response parsing.
//!
//! Both catalog endpoints wrap their payload in a `Pinfo` member: the search
//! endpoint returns a list of candidates, the detail endpoint a single
//! product object.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Lookup kind sent with every identifier search.
pub const UPC_LOOKUP_KIND: &str = "upc";

/// Catalog errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog unreachable: {0}")]
    Transport(String),

    #[error("Catalog responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid catalog response: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Parse(e.to_string())
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Identifier search request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchQuery {
    /// Normalized product/drug identifier
    pub identifier: String,
    /// Lookup kind (always "upc" for barcode scans)
    pub kind: String,
    /// Maximum number of candidates to return
    pub max_results: u32,
}

impl SearchQuery {
    /// Barcode search for a single best candidate.
    pub fn upc(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            kind: UPC_LOOKUP_KIND.to_string(),
            max_results: 1,
        }
    }
}

/// A search candidate, opaque apart from the fields the detail endpoint needs.
///
/// The detail endpoint takes the candidate back verbatim, so the raw JSON is
/// kept intact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Candidate(pub Value);

impl Candidate {
    /// Candidate's own UPC, when the search result carries one.
    pub fn upc(&self) -> Option<&str> {
        self.0.get("upc").and_then(Value::as_str)
    }

    /// Candidate title, when present.
    pub fn title(&self) -> Option<&str> {
        self.0
            .get("title")
            .or_else(|| self.0.get("name"))
            .and_then(Value::as_str)
    }
}

/// Detail record returned by enrichment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductDetail {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub brand_name: Option<String>,
    pub package_size: Option<String>,
}

impl ProductDetail {
    /// Display name: `name`, falling back to `description`.
    pub fn display_name(&self) -> Option<String> {
        first_present(&[&self.name, &self.description])
    }

    /// Category, when present and non-empty.
    pub fn category(&self) -> Option<String> {
        first_present(&[&self.category])
    }

    /// Specifications: `brand_name`, falling back to `package_size`.
    pub fn specifications(&self) -> Option<String> {
        first_present(&[&self.brand_name, &self.package_size])
    }

    /// True when no field carries a usable value.
    pub fn is_empty(&self) -> bool {
        self.display_name().is_none()
            && self.category().is_none()
            && self.specifications().is_none()
    }
}

// Empty strings count as absent.
fn first_present(fields: &[&Option<String>]) -> Option<String> {
    fields
        .iter()
        .filter_map(|f| f.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Deserialize)]
struct SearchEnvelope {
    #[serde(rename = "Pinfo", default)]
    pinfo: Option<Vec<Value>>,
}

#[derive(Deserialize)]
struct DetailEnvelope {
    #[serde(rename = "Pinfo", default)]
    pinfo: Option<Value>,
}

/// Parse a search response body into candidates.
///
/// A missing or null `Pinfo` is an empty result, not an error.
pub fn parse_search_response(json: &str) -> CatalogResult<Vec<Candidate>> {
    let envelope: SearchEnvelope = serde_json::from_str(json)?;
    Ok(envelope
        .pinfo
        .unwrap_or_default()
        .into_iter()
        .filter(|v| !v.is_null())
        .map(Candidate)
        .collect())
}

/// Parse a detail response body.
///
/// Returns `None` when the body has no usable `Pinfo` object.
pub fn parse_detail_response(json: &str) -> CatalogResult<Option<ProductDetail>> {
    let envelope: DetailEnvelope = serde_json::from_str(json)?;
    let Some(value) = envelope.pinfo.filter(Value::is_object) else {
        return Ok(None);
    };

    let detail = ProductDetail {
        name: string_field(&value, "name"),
        description: string_field(&value, "description"),
        category: string_field(&value, "category"),
        brand_name: string_field(&value, "brand_name"),
        package_size: string_field(&value, "package_size"),
    };

    Ok(Some(detail))
}

// Catalog fields are mostly strings, but sizes sometimes arrive as numbers.
fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
