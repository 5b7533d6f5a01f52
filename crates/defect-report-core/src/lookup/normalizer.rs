//! Barcode identifier normalization.

/// Normalize a raw decoded barcode into a catalog identifier.
///
/// A 13-character EAN-13 starting with `0` is a UPC-A with a leading zero and
/// loses that zero. Everything else, 12-character UPC-A included, passes
/// through unchanged.
pub fn normalize_identifier(raw: &str) -> String {
    if raw.chars().count() == 13 && raw.starts_with('0') {
        raw[1..].to_string()
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ean13_leading_zero_dropped() {
        assert_eq!(normalize_identifier("0012345678905"), "012345678905");
        assert_eq!(normalize_identifier("0000000000000"), "000000000000");
    }

    #[test]
    fn test_upc_a_unchanged() {
        assert_eq!(normalize_identifier("012345678905"), "012345678905");
    }

    #[test]
    fn test_ean13_without_leading_zero_unchanged() {
        assert_eq!(normalize_identifier("4006381333931"), "4006381333931");
    }

    #[test]
    fn test_other_lengths_unchanged() {
        assert_eq!(normalize_identifier(""), "");
        assert_eq!(normalize_identifier("01234567"), "01234567");
        assert_eq!(normalize_identifier("00123456789012"), "00123456789012");
        // NDC with hyphens is not a barcode string and is left alone
        assert_eq!(normalize_identifier("0573-0150-20"), "0573-0150-20");
    }
}
