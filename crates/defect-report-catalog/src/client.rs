//! Catalog client: identifier search and detail enrichment.

use std::time::Duration;

use async_trait::async_trait;

use crate::response::{
    parse_detail_response, parse_search_response, Candidate, CatalogError, CatalogResult,
    ProductDetail, SearchQuery,
};

/// Remote product/drug catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Search for candidates matching an identifier.
    async fn search(&self, query: &SearchQuery) -> CatalogResult<Vec<Candidate>>;

    /// Fetch the detail record for a candidate. `None` means the catalog had
    /// nothing usable for it.
    async fn detail(&self, candidate: &Candidate) -> CatalogResult<Option<ProductDetail>>;
}

/// reqwest-backed catalog client.
pub struct HttpCatalog {
    search_url: String,
    detail_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpCatalog {
    /// Create a client for the given search and detail endpoints.
    pub fn new(search_url: &str, detail_url: &str, timeout_secs: u64) -> CatalogResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        Ok(Self {
            search_url: search_url.trim_end_matches('/').to_string(),
            detail_url: detail_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> CatalogError {
        if e.is_timeout() {
            CatalogError::Transport(format!("Request timed out after {}s", self.timeout_secs))
        } else {
            CatalogError::Transport(e.to_string())
        }
    }

    async fn read_body(&self, response: reqwest::Response) -> CatalogResult<String> {
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl ProductCatalog for HttpCatalog {
    async fn search(&self, query: &SearchQuery) -> CatalogResult<Vec<Candidate>> {
        let max_results = query.max_results.to_string();
        let response = self
            .client
            .get(&self.search_url)
            .query(&[
                ("query", query.identifier.as_str()),
                ("type", query.kind.as_str()),
                ("limit", max_results.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let body = self.read_body(response).await?;
        let candidates = parse_search_response(&body)?;
        tracing::debug!(
            identifier = %query.identifier,
            count = candidates.len(),
            "Catalog search returned"
        );
        Ok(candidates)
    }

    async fn detail(&self, candidate: &Candidate) -> CatalogResult<Option<ProductDetail>> {
        let response = self
            .client
            .post(&self.detail_url)
            .json(&serde_json::json!({ "Pinfo": candidate }))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let body = self.read_body(response).await?;
        parse_detail_response(&body)
    }
}
