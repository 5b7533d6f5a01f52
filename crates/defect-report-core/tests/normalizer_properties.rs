//! Property tests for identifier normalization.

use defect_report_core::lookup::normalize_identifier;
use proptest::prelude::*;

proptest! {
    #[test]
    fn thirteen_with_leading_zero_drops_it(rest in "[0-9]{12}") {
        let raw = format!("0{}", rest);
        prop_assert_eq!(normalize_identifier(&raw), rest);
    }

    #[test]
    fn twelve_characters_pass_through(raw in "[0-9A-Z]{12}") {
        prop_assert_eq!(normalize_identifier(&raw), raw);
    }

    #[test]
    fn other_lengths_pass_through(raw in "[0-9]{0,11}|[0-9]{14,20}") {
        prop_assert_eq!(normalize_identifier(&raw), raw);
    }

    #[test]
    fn thirteen_without_leading_zero_passes_through(first in "[1-9]", rest in "[0-9]{12}") {
        let raw = format!("{}{}", first, rest);
        prop_assert_eq!(normalize_identifier(&raw), raw);
    }

    #[test]
    fn normalization_is_idempotent(raw in "[0-9]{8,14}") {
        let once = normalize_identifier(&raw);
        prop_assert_eq!(normalize_identifier(&once), once);
    }
}
