//! Property-based tests for imsg
//!
//! These tests verify invariants that must hold for all inputs:
//! - Timestamp conversion round-trips
//! - Pagination metadata follows its formulas
//! - Normalization is idempotent
//! - Extractors never panic
//!
//! Run with: cargo test --test property_tests

use proptest::prelude::*;

// ============================================================================
// TIMESTAMP CONVERSION TESTS
// ============================================================================

mod time_tests {
    use super::*;
    use imsg::time::{
        archive_to_datetime, datetime_to_archive, to_archive_nanos, to_calendar_seconds,
    };

    proptest! {
        /// Invariant: every non-zero archive value survives a trip through calendar time
        #[test]
        fn archive_roundtrip(raw in -2_000_000_000_000_000_000i64..2_000_000_000_000_000_000i64) {
            prop_assume!(raw != 0);
            let instant = archive_to_datetime(raw).expect("in range");
            prop_assert_eq!(datetime_to_archive(instant), raw);
        }

        /// Invariant: the float conversions are inverses up to float precision
        #[test]
        fn float_roundtrip(raw in -1_000_000_000_000_000_000i64..1_000_000_000_000_000_000i64) {
            let back = to_archive_nanos(to_calendar_seconds(raw));
            let tolerance = (raw as f64).abs() * 1e-12 + 1_000.0;
            prop_assert!((back - raw as f64).abs() <= tolerance, "{} -> {}", raw, back);
        }

        /// Invariant: ordering is preserved
        #[test]
        fn monotonic(a in 1i64..1_000_000_000_000_000_000, b in 1i64..1_000_000_000_000_000_000) {
            let (da, db) = (archive_to_datetime(a).unwrap(), archive_to_datetime(b).unwrap());
            prop_assert_eq!(a.cmp(&b), da.cmp(&db));
        }
    }

    #[test]
    fn zero_is_absent() {
        assert!(archive_to_datetime(0).is_none());
    }
}

// ============================================================================
// PAGINATION TESTS
// ============================================================================

mod pagination_tests {
    use super::*;
    use imsg::pagination::{PageRequest, PaginatedResult, PaginationMetadata};

    proptest! {
        /// Invariant: metadata follows the offset/limit formulas
        #[test]
        fn metadata_formulas(total in 0usize..10_000, limit in 1usize..500, offset in 0usize..20_000) {
            let meta = PaginationMetadata::new(total, limit, offset);
            prop_assert_eq!(meta.has_more, offset + limit < total);
            prop_assert_eq!(meta.page, offset / limit + 1);
            prop_assert_eq!(meta.total_pages, total.div_ceil(limit));
            prop_assert!(meta.total_pages * limit >= total);
        }

        /// Invariant: slicing a full list yields at most `limit` items from `offset`
        #[test]
        fn full_list_slice(total in 0usize..500, limit in 1usize..100, offset in 0usize..600) {
            let all: Vec<usize> = (0..total).collect();
            let page = PaginatedResult::from_full_list(all, PageRequest::new(limit, offset));
            prop_assert_eq!(page.data.len(), limit.min(total.saturating_sub(offset)));
            prop_assert_eq!(page.pagination.total, total);
            if let Some(first) = page.data.first() {
                prop_assert_eq!(*first, offset);
            }
        }

        /// Invariant: caller limits are always clamped into 1..=max
        #[test]
        fn limit_clamped(limit in proptest::option::of(any::<i64>()), max in 1usize..500, default in 0usize..1000) {
            let page = PageRequest::from_args(limit, None, default, max).unwrap();
            prop_assert!(page.limit >= 1 && page.limit <= max);
            prop_assert_eq!(page.offset, 0);
        }

        /// Invariant: negative offsets are rejected, others pass through
        #[test]
        fn offset_sign(offset in any::<i64>()) {
            let page = PageRequest::from_args(None, Some(offset), 100, 200);
            if offset < 0 {
                prop_assert!(page.is_err());
            } else {
                prop_assert_eq!(page.unwrap().offset as i64, offset);
            }
        }
    }
}

// ============================================================================
// PHONE NORMALIZATION TESTS
// ============================================================================

mod phone_tests {
    use super::*;
    use imsg::contacts::normalize_phone;

    proptest! {
        /// Invariant: normalize_phone never panics on any string input
        #[test]
        fn never_panics(s in ".*") {
            let _ = normalize_phone(&s);
        }

        /// Invariant: normalizing twice yields the same result
        #[test]
        fn idempotent(s in "\\PC{0,40}") {
            let once = normalize_phone(&s);
            prop_assert_eq!(normalize_phone(&once), once.clone());
        }

        /// Invariant: any input with a digit becomes `+`? followed by digits only
        #[test]
        fn output_charset(s in "[0-9()+. -]{0,30}") {
            prop_assume!(s.chars().any(|c| c.is_ascii_digit()));
            let normalized = normalize_phone(&s);
            let digits = normalized.strip_prefix('+').unwrap_or(&normalized);
            prop_assert!(!digits.is_empty());
            prop_assert!(digits.chars().all(|c| c.is_ascii_digit()));
        }

        /// Invariant: formatting of a ten-digit number does not matter
        #[test]
        fn ten_digit_formats_agree(area in "[2-9][0-9]{2}", exchange in "[0-9]{3}", line in "[0-9]{4}") {
            let plain = normalize_phone(&format!("{}{}{}", area, exchange, line));
            prop_assert_eq!(&normalize_phone(&format!("({}) {}-{}", area, exchange, line)), &plain);
            prop_assert_eq!(&normalize_phone(&format!("+1 {}.{}.{}", area, exchange, line)), &plain);
            prop_assert_eq!(plain, format!("+1{}{}{}", area, exchange, line));
        }
    }
}

// ============================================================================
// RICH-TEXT EXTRACTION TESTS
// ============================================================================

mod richtext_tests {
    use super::*;
    use imsg::richtext::{extract_text, STRING_MARKER};

    proptest! {
        /// Invariant: extraction never panics on arbitrary bytes
        #[test]
        fn never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let _ = extract_text(Some(&bytes));
        }

        /// Invariant: output is trimmed, has no control characters and no doubled spaces
        #[test]
        fn output_is_clean(body in "\\PC{0,200}", noise in proptest::collection::vec(any::<u8>(), 0..32)) {
            let mut bytes = noise;
            bytes.extend_from_slice(STRING_MARKER.as_bytes());
            bytes.extend_from_slice(body.as_bytes());
            let text = extract_text(Some(&bytes));
            prop_assert_eq!(text.trim(), text.as_str());
            prop_assert!(!text.chars().any(char::is_control));
            prop_assert!(!text.contains("  "));
        }
    }
}

// ============================================================================
// LIKE ESCAPING TESTS
// ============================================================================

mod like_tests {
    use super::*;
    use imsg::storage::filter::escape_like;
    use rusqlite::Connection;

    fn matches(conn: &Connection, haystack: &str, needle: &str) -> bool {
        let pattern = format!("%{}%", escape_like(needle));
        conn.query_row(
            "SELECT ?1 LIKE ?2 ESCAPE '\\'",
            rusqlite::params![haystack, pattern],
            |row| row.get(0),
        )
        .unwrap()
    }

    proptest! {
        /// Invariant: an escaped needle matches any text containing it verbatim
        #[test]
        fn contained_needle_matches(prefix in "\\PC{0,10}", needle in "[a-z%_\\\\]{1,8}", suffix in "\\PC{0,10}") {
            let conn = Connection::open_in_memory().unwrap();
            let haystack = format!("{}{}{}", prefix, needle, suffix);
            prop_assert!(matches(&conn, &haystack, &needle));
        }

        /// Invariant: wildcard characters only match themselves
        #[test]
        fn wildcards_are_literal(haystack in "[a-z ]{0,20}", wildcard in prop_oneof![Just("%"), Just("_")]) {
            let conn = Connection::open_in_memory().unwrap();
            prop_assert!(!matches(&conn, &haystack, wildcard));
        }
    }
}
