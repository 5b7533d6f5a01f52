//! Golden tests for identifier normalization and barcode lookup.

use std::sync::Arc;

use defect_report_catalog::{Candidate, MockCatalog, ProductDetail};
use defect_report_core::lookup::{
    normalize_identifier, IgnoreReason, LookupError, LookupPipeline, ScanEvent, ScanOutcome,
    DETAIL_MISSING_MESSAGE, NOT_FOUND_MESSAGE,
};
use defect_report_core::ScanResult;
use serde_json::json;

/// Normalization case.
struct GoldenCase {
    id: &'static str,
    raw: &'static str,
    expected: &'static str,
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "ean13-leading-zero",
            raw: "0012345678905",
            expected: "012345678905",
        },
        GoldenCase {
            id: "upca-unchanged",
            raw: "012345678905",
            expected: "012345678905",
        },
        GoldenCase {
            id: "ean13-nonzero-prefix",
            raw: "5012345678900",
            expected: "5012345678900",
        },
        GoldenCase {
            id: "ean8-unchanged",
            raw: "96385074",
            expected: "96385074",
        },
        GoldenCase {
            id: "ndc-hyphenated",
            raw: "0002-1433-80",
            expected: "0002-1433-80",
        },
        GoldenCase {
            id: "fourteen-digit-gtin",
            raw: "00012345678905",
            expected: "00012345678905",
        },
        GoldenCase {
            id: "thirteen-alnum-leading-zero",
            raw: "0ABCDEFGHIJKL",
            expected: "ABCDEFGHIJKL",
        },
        GoldenCase {
            id: "empty",
            raw: "",
            expected: "",
        },
    ]
}

#[test]
fn test_golden_cases() {
    for case in get_golden_cases() {
        assert_eq!(
            normalize_identifier(case.raw),
            case.expected,
            "Case {}: normalized identifier mismatch",
            case.id
        );
    }
}

fn test_milk() -> ProductDetail {
    serde_json::from_value(json!({
        "name": "Test Milk",
        "category": "Dairy",
        "brand_name": "Acme"
    }))
    .unwrap()
}

fn open_pipeline(catalog: Arc<MockCatalog>) -> LookupPipeline {
    let pipeline = LookupPipeline::new(catalog, 1500);
    pipeline.open_surface();
    pipeline
}

#[tokio::test]
async fn test_end_to_end_scan_scenario() {
    let catalog = Arc::new(MockCatalog::with_product("012345678905", test_milk()));
    let pipeline = open_pipeline(catalog.clone());

    let outcome = pipeline
        .handle_scan(ScanEvent::new("0012345678905", 1_700_000_000_000))
        .await;

    assert_eq!(
        outcome,
        ScanOutcome::Found(ScanResult {
            identifier: "012345678905".into(),
            name: Some("Test Milk".into()),
            category: Some("Dairy".into()),
            specifications: Some("Acme".into()),
        })
    );
    assert_eq!(catalog.search_calls(), 1);
    assert_eq!(catalog.detail_calls(), 1);
}

#[tokio::test]
async fn test_secondary_fields_fill_gaps() {
    let detail: ProductDetail = serde_json::from_value(json!({
        "description": "Whole Milk 1 Gallon",
        "package_size": "128 fl oz"
    }))
    .unwrap();
    let pipeline = open_pipeline(Arc::new(MockCatalog::with_product("012345678905", detail)));

    let outcome = pipeline.handle_scan(ScanEvent::new("012345678905", 0)).await;

    let ScanOutcome::Found(scan) = outcome else {
        panic!("expected a result, got {:?}", outcome);
    };
    assert_eq!(scan.name.as_deref(), Some("Whole Milk 1 Gallon"));
    assert_eq!(scan.category, None);
    assert_eq!(scan.specifications.as_deref(), Some("128 fl oz"));
}

#[tokio::test]
async fn test_failure_paths() {
    let empty = open_pipeline(Arc::new(MockCatalog::empty()));
    assert_eq!(
        empty.handle_scan(ScanEvent::new("012345678905", 0)).await,
        ScanOutcome::Failed(LookupError::NotFound(NOT_FOUND_MESSAGE.into()))
    );

    let no_detail = open_pipeline(Arc::new(
        MockCatalog::empty()
            .with_candidates(vec![Candidate(json!({"upc": "012345678905"}))])
            .with_detail(None),
    ));
    assert_eq!(
        no_detail.handle_scan(ScanEvent::new("012345678905", 0)).await,
        ScanOutcome::Failed(LookupError::NotFound(DETAIL_MISSING_MESSAGE.into()))
    );
}

#[tokio::test]
async fn test_rapid_scans_yield_one_lookup() {
    let catalog = Arc::new(MockCatalog::with_product("012345678905", test_milk()));
    let pipeline = open_pipeline(catalog.clone());

    let mut found = 0;
    for (i, at) in [0_i64, 200, 700, 1_499].iter().enumerate() {
        let raw = if i % 2 == 0 { "0012345678905" } else { "4006381333931" };
        match pipeline.handle_scan(ScanEvent::new(raw, *at)).await {
            ScanOutcome::Found(_) => found += 1,
            ScanOutcome::Ignored(reason) => assert_eq!(reason, IgnoreReason::Debounced),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    assert_eq!(found, 1);
    assert_eq!(catalog.search_calls(), 1);
}
