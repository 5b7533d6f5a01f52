//! In-memory catalog for tests and offline previews.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::client::ProductCatalog;
use crate::response::{Candidate, CatalogError, CatalogResult, ProductDetail, SearchQuery};

/// Mock catalog returning configured candidates and detail.
pub struct MockCatalog {
    candidates: Vec<Candidate>,
    detail: Option<ProductDetail>,
    search_failure: Option<String>,
    gate: Option<Gate>,
    search_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    last_query: Mutex<Option<SearchQuery>>,
}

/// Holds searches open until released.
struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::empty()
    }
}

impl MockCatalog {
    /// A catalog that knows nothing.
    pub fn empty() -> Self {
        Self {
            candidates: Vec::new(),
            detail: None,
            search_failure: None,
            gate: None,
            search_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    /// A catalog with one candidate for `upc` whose detail is `detail`.
    pub fn with_product(upc: &str, detail: ProductDetail) -> Self {
        Self::empty()
            .with_candidates(vec![Candidate(serde_json::json!({ "upc": upc }))])
            .with_detail(Some(detail))
    }

    pub fn with_candidates(mut self, candidates: Vec<Candidate>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_detail(mut self, detail: Option<ProductDetail>) -> Self {
        self.detail = detail;
        self
    }

    /// Make every search fail as if the network were down.
    pub fn with_search_failure(mut self, message: &str) -> Self {
        self.search_failure = Some(message.to_string());
        self
    }

    /// Hold each search until `release` is notified. `entered` is notified
    /// once the search has started.
    pub fn with_gate(mut self, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.gate = Some(Gate { entered, release });
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<SearchQuery> {
        self.last_query
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ProductCatalog for MockCatalog {
    async fn search(&self, query: &SearchQuery) -> CatalogResult<Vec<Candidate>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap_or_else(|e| e.into_inner()) = Some(query.clone());

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if let Some(message) = &self.search_failure {
            return Err(CatalogError::Transport(message.clone()));
        }

        Ok(self
            .candidates
            .iter()
            .take(query.max_results as usize)
            .cloned()
            .collect())
    }

    async fn detail(&self, _candidate: &Candidate) -> CatalogResult<Option<ProductDetail>> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.detail.clone())
    }
}
