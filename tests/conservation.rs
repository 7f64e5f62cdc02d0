use assert_matches::assert_matches;

use starterator_verify::conservation::{
    DEFAULT_TOLERANCE, Mismatch, MismatchKind, compare, recompute,
};
use starterator_verify::domain::{Dataset, Gene};
use starterator_verify::error::VerifyError;

fn dataset(member_count: i64, genes: Vec<Gene>, stored: &[(&str, f64)]) -> Dataset {
    Dataset {
        name: Some("Pham 1".to_string()),
        member_count: Some(member_count),
        genes: Some(genes),
        conservation: Some(
            stored
                .iter()
                .map(|(key, value)| (key.to_string(), *value))
                .collect(),
        ),
    }
}

fn scenario_genes() -> Vec<Gene> {
    vec![Gene::with_starts(&[5]), Gene::with_starts(&[5, 7])]
}

#[test]
fn matching_tables_report_no_mismatches() {
    let data = dataset(2, scenario_genes(), &[("5", 1.0), ("7", 0.5)]);
    let report = compare(&data, "fallback", DEFAULT_TOLERANCE).unwrap();
    assert_eq!(report.name, "Pham 1");
    assert!(report.mismatches.is_empty());
}

#[test]
fn stored_value_disagreement_is_value_mismatch() {
    let data = dataset(2, scenario_genes(), &[("5", 0.5), ("7", 0.5)]);
    let report = compare(&data, "fallback", DEFAULT_TOLERANCE).unwrap();
    assert_eq!(
        report.mismatches,
        vec![Mismatch {
            start: "5".to_string(),
            issue: MismatchKind::ValueMismatch,
            stored: Some(0.5),
            recomputed: Some(1.0),
        }]
    );
}

#[test]
fn extra_stored_key_is_missing_in_one_side() {
    let data = dataset(2, scenario_genes(), &[("5", 1.0), ("7", 0.5), ("9", 0.5)]);
    let report = compare(&data, "fallback", DEFAULT_TOLERANCE).unwrap();
    assert_eq!(
        report.mismatches,
        vec![Mismatch {
            start: "9".to_string(),
            issue: MismatchKind::MissingInOneSide,
            stored: Some(0.5),
            recomputed: None,
        }]
    );
}

#[test]
fn missing_stored_key_reports_recomputed_value() {
    let data = dataset(2, scenario_genes(), &[("5", 1.0)]);
    let report = compare(&data, "fallback", DEFAULT_TOLERANCE).unwrap();
    assert_eq!(report.mismatches.len(), 1);
    assert_eq!(report.mismatches[0].start, "7");
    assert_eq!(report.mismatches[0].stored, None);
    assert_eq!(report.mismatches[0].recomputed, Some(0.5));
}

#[test]
fn self_generated_table_always_agrees() {
    let genes = vec![
        Gene::with_starts(&[1, 2, 3]),
        Gene::with_starts(&[2, 3]),
        Gene::with_starts(&[3, 3, 40]),
        Gene::with_starts(&[]),
    ];
    let mut data = dataset(7, genes, &[]);
    data.conservation = Some(recompute(&data).unwrap());
    let report = compare(&data, "fallback", DEFAULT_TOLERANCE).unwrap();
    assert!(report.is_agreement());
}

#[test]
fn unoffered_positions_are_absent() {
    let data = dataset(3, vec![Gene::with_starts(&[2]), Gene::with_starts(&[8])], &[]);
    let table = recompute(&data).unwrap();
    assert_eq!(table.len(), 2);
    assert!(!table.contains_key("5"));
}

#[test]
fn mismatches_follow_numeric_key_order() {
    let data = dataset(1, Vec::new(), &[("9", 0.1), ("10", 0.1), ("2", 0.1)]);
    let report = compare(&data, "fallback", DEFAULT_TOLERANCE).unwrap();
    let starts = report
        .mismatches
        .iter()
        .map(|m| m.start.as_str())
        .collect::<Vec<_>>();
    assert_eq!(starts, vec!["2", "9", "10"]);
}

#[test]
fn difference_equal_to_tolerance_is_agreement() {
    // recomputed 0.75 against stored 0.5: both exactly representable
    let genes = vec![
        Gene::with_starts(&[1]),
        Gene::with_starts(&[1]),
        Gene::with_starts(&[1]),
    ];
    let data = dataset(4, genes, &[("1", 0.5)]);
    let report = compare(&data, "fallback", 0.25).unwrap();
    assert!(report.is_agreement());

    let report = compare(&data, "fallback", 0.25 - 1e-9).unwrap();
    assert_eq!(report.mismatches.len(), 1);
    assert_eq!(report.mismatches[0].issue, MismatchKind::ValueMismatch);
}

#[test]
fn zero_member_count_is_integrity_fault() {
    let data = dataset(0, scenario_genes(), &[("5", 1.0)]);
    assert_matches!(recompute(&data), Err(VerifyError::DataIntegrity(_)));
    assert_matches!(
        compare(&data, "fallback", DEFAULT_TOLERANCE),
        Err(VerifyError::DataIntegrity(_))
    );
}

#[test]
fn missing_fields_are_integrity_faults() {
    let mut data = dataset(2, scenario_genes(), &[]);
    data.genes = None;
    assert_matches!(recompute(&data), Err(VerifyError::DataIntegrity(_)));

    let mut data = dataset(2, scenario_genes(), &[]);
    data.member_count = None;
    assert_matches!(recompute(&data), Err(VerifyError::DataIntegrity(_)));

    let mut data = dataset(2, scenario_genes(), &[]);
    data.conservation = None;
    assert_matches!(
        compare(&data, "fallback", DEFAULT_TOLERANCE),
        Err(VerifyError::DataIntegrity(_))
    );
}

#[test]
fn compare_leaves_dataset_untouched() {
    let data = dataset(2, scenario_genes(), &[("5", 0.5)]);
    let before = data.clone();
    let _ = compare(&data, "fallback", DEFAULT_TOLERANCE).unwrap();
    assert_eq!(data, before);
}

#[test]
fn mismatch_serializes_issue_in_snake_case() {
    let mismatch = Mismatch {
        start: "12".to_string(),
        issue: MismatchKind::ValueMismatch,
        stored: Some(0.8),
        recomputed: Some(1.0),
    };
    let value = serde_json::to_value(&mismatch).unwrap();
    assert_eq!(value["issue"], "value_mismatch");
    assert_eq!(value["start"], "12");
    assert_eq!(value["stored_value"], 0.8);
    assert_eq!(value["recomputed_value"], 1.0);
}

#[test]
fn absent_side_serializes_as_null() {
    let data = dataset(2, scenario_genes(), &[("5", 1.0), ("7", 0.5), ("9", 0.5)]);
    let report = compare(&data, "fallback", DEFAULT_TOLERANCE).unwrap();
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["mismatches"][0]["stored_value"], 0.5);
    assert!(value["mismatches"][0]["recomputed_value"].is_null());
}
