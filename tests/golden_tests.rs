//! Golden tests - fixture-based tests that lock expected behavior
//!
//! These tests use JSON fixtures to verify that the text-recovery and
//! phone canonicalization heuristics produce stable outputs. Any change in
//! behavior will cause these tests to fail, signaling that existing
//! archives would render differently.
//!
//! Run with: cargo test --test golden_tests

use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
struct TestCase {
    name: String,
    input: String,
    expected: String,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    #[allow(dead_code)]
    description: String,
    test_cases: Vec<TestCase>,
}

fn load_fixture(file: &str) -> Fixture {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), file);
    let content =
        fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e));
    serde_json::from_str(&content).expect("Failed to parse fixture JSON")
}

// ============================================================================
// RICH-TEXT EXTRACTION GOLDEN TESTS
// ============================================================================

mod richtext_golden {
    use super::*;
    use imsg::richtext::extract_text;

    #[test]
    fn test_richtext_extraction_golden() {
        let fixture = load_fixture("richtext_extraction.json");
        assert!(!fixture.test_cases.is_empty());

        for case in fixture.test_cases {
            let result = extract_text(Some(case.input.as_bytes()));
            assert_eq!(
                result, case.expected,
                "Case '{}': extracted text mismatch",
                case.name
            );
        }
    }

    #[test]
    fn test_absent_body_is_empty() {
        assert_eq!(extract_text(None), "");
        assert_eq!(extract_text(Some(&[])), "");
    }
}

// ============================================================================
// PHONE NORMALIZATION GOLDEN TESTS
// ============================================================================

mod phone_golden {
    use super::*;
    use imsg::contacts::normalize_phone;

    #[test]
    fn test_phone_normalization_golden() {
        let fixture = load_fixture("phone_normalization.json");
        assert!(!fixture.test_cases.is_empty());

        for case in fixture.test_cases {
            let result = normalize_phone(&case.input);
            assert_eq!(
                result, case.expected,
                "Case '{}': normalized number mismatch for {:?}",
                case.name, case.input
            );
        }
    }
}
