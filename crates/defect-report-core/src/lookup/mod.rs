//! Barcode lookup pipeline.
//!
//! Pipeline: Scan event → Debounce / single-flight gate → Normalization →
//! Identifier search → Detail enrichment → ScanResult

mod normalizer;

pub use normalizer::*;

use std::sync::{Arc, Mutex, MutexGuard};

use defect_report_catalog::{CatalogError, ProductCatalog, ProductDetail, SearchQuery};
use thiserror::Error;

use crate::models::ScanResult;

/// Minimum gap between two accepted scans.
pub const DEFAULT_DEBOUNCE_WINDOW_MS: i64 = 1500;

pub const NOT_FOUND_MESSAGE: &str = "Product/Drug information not found for this barcode.";
pub const DETAIL_MISSING_MESSAGE: &str = "Detailed information could not be retrieved.";

/// Lookup errors. The message is user-facing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Server(String),
}

impl From<CatalogError> for LookupError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Transport(msg) => LookupError::Network(msg),
            other => LookupError::Server(other.to_string()),
        }
    }
}

pub type LookupResult<T> = Result<T, LookupError>;

/// A raw decoded barcode delivered by the scanning surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    pub raw: String,
    /// Event time, epoch milliseconds
    pub at_ms: i64,
}

impl ScanEvent {
    pub fn new(raw: impl Into<String>, at_ms: i64) -> Self {
        Self {
            raw: raw.into(),
            at_ms,
        }
    }
}

/// Whether a lookup is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupPhase {
    Idle,
    LookingUp,
}

/// Why a scan event was dropped without a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    SurfaceClosed,
    InFlight,
    Debounced,
}

/// What happened to a scan event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Found(ScanResult),
    Failed(LookupError),
    Ignored(IgnoreReason),
    /// The lookup finished after its scanning surface was closed
    Discarded,
}

#[derive(Debug)]
struct PipelineState {
    phase: LookupPhase,
    surface_open: bool,
    surface_generation: u64,
    last_accepted_at: Option<i64>,
}

/// Single-flight, debounced barcode lookup.
pub struct LookupPipeline {
    catalog: Arc<dyn ProductCatalog>,
    debounce_window_ms: i64,
    state: Mutex<PipelineState>,
}

/// Returns the pipeline to `Idle` when the lookup ends, including when the
/// future is dropped mid-flight.
struct InFlight<'a> {
    pipeline: &'a LookupPipeline,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.pipeline.state().phase = LookupPhase::Idle;
    }
}

impl LookupPipeline {
    /// Create a new pipeline over a catalog.
    pub fn new(catalog: Arc<dyn ProductCatalog>, debounce_window_ms: i64) -> Self {
        Self {
            catalog,
            debounce_window_ms,
            state: Mutex::new(PipelineState {
                phase: LookupPhase::Idle,
                surface_open: false,
                surface_generation: 0,
                last_accepted_at: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The scanning surface was presented.
    pub fn open_surface(&self) {
        self.state().surface_open = true;
    }

    /// The scanning surface was dismissed. A lookup still in flight will be
    /// discarded when it completes.
    pub fn close_surface(&self) {
        let mut state = self.state();
        state.surface_open = false;
        state.surface_generation += 1;
    }

    pub fn is_surface_open(&self) -> bool {
        self.state().surface_open
    }

    pub fn phase(&self) -> LookupPhase {
        self.state().phase
    }

    /// Whether the scanning surface should deliver raw events at all.
    pub fn accepts_scans(&self) -> bool {
        let state = self.state();
        state.surface_open && state.phase == LookupPhase::Idle
    }

    /// Gate a scan event. On acceptance the pipeline moves to `LookingUp` and
    /// the debounce clock advances; rejections leave all state untouched.
    fn admit(&self, event: &ScanEvent) -> Result<u64, IgnoreReason> {
        let mut state = self.state();

        if !state.surface_open {
            return Err(IgnoreReason::SurfaceClosed);
        }
        if state.phase == LookupPhase::LookingUp {
            return Err(IgnoreReason::InFlight);
        }
        if let Some(last) = state.last_accepted_at {
            if event.at_ms.saturating_sub(last) <= self.debounce_window_ms {
                return Err(IgnoreReason::Debounced);
            }
        }

        state.last_accepted_at = Some(event.at_ms);
        state.phase = LookupPhase::LookingUp;
        Ok(state.surface_generation)
    }

    /// Handle a raw scan event end to end.
    pub async fn handle_scan(&self, event: ScanEvent) -> ScanOutcome {
        let generation = match self.admit(&event) {
            Ok(generation) => generation,
            Err(reason) => {
                tracing::trace!(?reason, "Scan ignored");
                return ScanOutcome::Ignored(reason);
            }
        };
        let guard = InFlight { pipeline: self };

        tracing::debug!(raw = %event.raw, "Raw scanned data");
        let identifier = normalize_identifier(&event.raw);
        let result = self.resolve(&identifier).await;

        drop(guard);
        if self.state().surface_generation != generation {
            tracing::debug!(identifier = %identifier, "Lookup finished after surface closed, discarding");
            return ScanOutcome::Discarded;
        }

        match result {
            Ok(scan) => {
                tracing::info!(identifier = %scan.identifier, name = ?scan.name, "Scan resolved");
                ScanOutcome::Found(scan)
            }
            Err(e) => {
                tracing::warn!(identifier = %identifier, error = %e, "Scan lookup failed");
                ScanOutcome::Failed(e)
            }
        }
    }

    /// Two-stage remote resolution of a normalized identifier.
    pub async fn resolve(&self, identifier: &str) -> LookupResult<ScanResult> {
        let query = SearchQuery::upc(identifier);
        let candidates = self.catalog.search(&query).await?;

        let Some(candidate) = candidates.into_iter().next() else {
            return Err(LookupError::NotFound(NOT_FOUND_MESSAGE.to_string()));
        };
        tracing::debug!(
            upc = ?candidate.upc(),
            title = ?candidate.title(),
            "Search candidate"
        );

        // A detail record with nothing usable would blank the report's item fields
        let detail = self
            .catalog
            .detail(&candidate)
            .await?
            .filter(|detail| !detail.is_empty())
            .ok_or_else(|| LookupError::NotFound(DETAIL_MISSING_MESSAGE.to_string()))?;

        Ok(to_scan_result(identifier, &detail))
    }
}

fn to_scan_result(identifier: &str, detail: &ProductDetail) -> ScanResult {
    ScanResult {
        identifier: identifier.to_string(),
        name: detail.display_name(),
        category: detail.category(),
        specifications: detail.specifications(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use defect_report_catalog::MockCatalog;
    use tokio::sync::Notify;

    fn milk() -> ProductDetail {
        ProductDetail {
            name: Some("Test Milk".into()),
            category: Some("Dairy".into()),
            brand_name: Some("Acme".into()),
            ..Default::default()
        }
    }

    fn open_pipeline(catalog: Arc<MockCatalog>) -> LookupPipeline {
        let pipeline = LookupPipeline::new(catalog, DEFAULT_DEBOUNCE_WINDOW_MS);
        pipeline.open_surface();
        pipeline
    }

    #[tokio::test]
    async fn test_scan_resolves_to_result() {
        let catalog = Arc::new(MockCatalog::with_product("012345678905", milk()));
        let pipeline = open_pipeline(catalog.clone());

        let outcome = pipeline.handle_scan(ScanEvent::new("0012345678905", 10_000)).await;

        assert_eq!(
            outcome,
            ScanOutcome::Found(ScanResult {
                identifier: "012345678905".into(),
                name: Some("Test Milk".into()),
                category: Some("Dairy".into()),
                specifications: Some("Acme".into()),
            })
        );
        let query = catalog.last_query().unwrap();
        assert_eq!(query.identifier, "012345678905");
        assert_eq!(query.kind, "upc");
        assert_eq!(query.max_results, 1);
        assert_eq!(pipeline.phase(), LookupPhase::Idle);
        assert!(pipeline.accepts_scans());
    }

    #[tokio::test]
    async fn test_no_candidates_is_not_found() {
        let catalog = Arc::new(MockCatalog::empty());
        let pipeline = open_pipeline(catalog.clone());

        let outcome = pipeline.handle_scan(ScanEvent::new("012345678905", 0)).await;

        assert_eq!(
            outcome,
            ScanOutcome::Failed(LookupError::NotFound(NOT_FOUND_MESSAGE.into()))
        );
        assert_eq!(catalog.detail_calls(), 0);
        assert_eq!(pipeline.phase(), LookupPhase::Idle);
    }

    #[tokio::test]
    async fn test_missing_detail_is_not_found() {
        let catalog = Arc::new(
            MockCatalog::with_product("012345678905", milk()).with_detail(None),
        );
        let pipeline = open_pipeline(catalog);

        let outcome = pipeline.handle_scan(ScanEvent::new("012345678905", 0)).await;

        assert_eq!(
            outcome,
            ScanOutcome::Failed(LookupError::NotFound(DETAIL_MISSING_MESSAGE.into()))
        );
    }

    #[tokio::test]
    async fn test_empty_detail_is_not_found() {
        let catalog = Arc::new(
            MockCatalog::with_product("012345678905", milk())
                .with_detail(Some(ProductDetail {
                    name: Some("  ".into()),
                    ..Default::default()
                })),
        );
        let pipeline = open_pipeline(catalog.clone());

        let outcome = pipeline.handle_scan(ScanEvent::new("012345678905", 0)).await;

        assert_eq!(
            outcome,
            ScanOutcome::Failed(LookupError::NotFound(DETAIL_MISSING_MESSAGE.into()))
        );
        assert_eq!(catalog.detail_calls(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let catalog = Arc::new(MockCatalog::empty().with_search_failure("connection refused"));
        let pipeline = open_pipeline(catalog);

        let outcome = pipeline.handle_scan(ScanEvent::new("012345678905", 0)).await;

        assert_eq!(
            outcome,
            ScanOutcome::Failed(LookupError::Network("connection refused".into()))
        );
        assert!(pipeline.accepts_scans());
    }

    #[tokio::test]
    async fn test_debounce_window() {
        let catalog = Arc::new(MockCatalog::with_product("012345678905", milk()));
        let pipeline = open_pipeline(catalog.clone());

        assert!(matches!(
            pipeline.handle_scan(ScanEvent::new("012345678905", 10_000)).await,
            ScanOutcome::Found(_)
        ));
        // Different code, still inside the window
        assert_eq!(
            pipeline.handle_scan(ScanEvent::new("999999999999", 11_000)).await,
            ScanOutcome::Ignored(IgnoreReason::Debounced)
        );
        // Exactly on the window edge
        assert_eq!(
            pipeline.handle_scan(ScanEvent::new("012345678905", 11_500)).await,
            ScanOutcome::Ignored(IgnoreReason::Debounced)
        );
        // Rejections did not move the clock
        assert!(matches!(
            pipeline.handle_scan(ScanEvent::new("012345678905", 11_501)).await,
            ScanOutcome::Found(_)
        ));
        assert_eq!(catalog.search_calls(), 2);
    }

    #[tokio::test]
    async fn test_debounce_with_extreme_timestamps() {
        let catalog = Arc::new(MockCatalog::with_product("012345678905", milk()));
        let pipeline = open_pipeline(catalog.clone());

        assert!(matches!(
            pipeline.handle_scan(ScanEvent::new("012345678905", 10_000)).await,
            ScanOutcome::Found(_)
        ));
        // A clock that jumped backwards never reopens the window
        assert_eq!(
            pipeline.handle_scan(ScanEvent::new("012345678905", i64::MIN)).await,
            ScanOutcome::Ignored(IgnoreReason::Debounced)
        );
        assert!(matches!(
            pipeline.handle_scan(ScanEvent::new("012345678905", i64::MAX)).await,
            ScanOutcome::Found(_)
        ));
        assert_eq!(catalog.search_calls(), 2);
    }

    #[tokio::test]
    async fn test_single_flight() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let catalog = Arc::new(
            MockCatalog::with_product("012345678905", milk())
                .with_gate(entered.clone(), release.clone()),
        );
        let pipeline = Arc::new(open_pipeline(catalog.clone()));

        let first = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                pipeline.handle_scan(ScanEvent::new("012345678905", 0)).await
            })
        };
        entered.notified().await;

        assert_eq!(pipeline.phase(), LookupPhase::LookingUp);
        assert!(!pipeline.accepts_scans());
        // Far outside the debounce window, still rejected
        assert_eq!(
            pipeline.handle_scan(ScanEvent::new("012345678905", 60_000)).await,
            ScanOutcome::Ignored(IgnoreReason::InFlight)
        );

        release.notify_one();
        assert!(matches!(first.await.unwrap(), ScanOutcome::Found(_)));
        assert_eq!(catalog.search_calls(), 1);
        assert!(pipeline.accepts_scans());
    }

    #[tokio::test]
    async fn test_closed_surface_ignores_scans() {
        let catalog = Arc::new(MockCatalog::with_product("012345678905", milk()));
        let pipeline = LookupPipeline::new(catalog.clone(), DEFAULT_DEBOUNCE_WINDOW_MS);

        assert_eq!(
            pipeline.handle_scan(ScanEvent::new("012345678905", 0)).await,
            ScanOutcome::Ignored(IgnoreReason::SurfaceClosed)
        );
        assert_eq!(catalog.search_calls(), 0);
        assert!(!pipeline.accepts_scans());
    }

    #[tokio::test]
    async fn test_result_discarded_after_surface_closed() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let catalog = Arc::new(
            MockCatalog::with_product("012345678905", milk())
                .with_gate(entered.clone(), release.clone()),
        );
        let pipeline = Arc::new(open_pipeline(catalog));

        let pending = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                pipeline.handle_scan(ScanEvent::new("012345678905", 0)).await
            })
        };
        entered.notified().await;
        pipeline.close_surface();
        release.notify_one();

        assert_eq!(pending.await.unwrap(), ScanOutcome::Discarded);
        assert_eq!(pipeline.phase(), LookupPhase::Idle);
    }
}
