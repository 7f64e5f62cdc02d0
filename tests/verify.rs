use std::collections::HashMap;
use std::sync::Mutex;

use starterator_verify::config::VerifyConfig;
use starterator_verify::domain::{Dataset, Gene, PhamId};
use starterator_verify::error::VerifyError;
use starterator_verify::provider::DatasetProvider;
use starterator_verify::verify::{Outcome, ProgressEvent, ProgressSink, Verifier};

#[derive(Default)]
struct MapProvider {
    datasets: HashMap<u64, Dataset>,
}

impl DatasetProvider for MapProvider {
    fn get_dataset(&self, id: PhamId) -> Result<Dataset, VerifyError> {
        self.datasets
            .get(&id.value())
            .cloned()
            .ok_or_else(|| VerifyError::ServerHttp(format!("connection refused for {id}")))
    }
}

#[derive(Default)]
struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl ProgressSink for RecordingSink {
    fn event(&self, event: ProgressEvent) {
        self.messages.lock().unwrap().push(event.message);
    }
}

fn dataset(name: Option<&str>, member_count: i64, stored: &[(&str, f64)]) -> Dataset {
    Dataset {
        name: name.map(str::to_string),
        member_count: Some(member_count),
        genes: Some(vec![Gene::with_starts(&[5]), Gene::with_starts(&[5, 7])]),
        conservation: Some(
            stored
                .iter()
                .map(|(key, value)| (key.to_string(), *value))
                .collect(),
        ),
    }
}

fn provider() -> MapProvider {
    let mut datasets = HashMap::new();
    datasets.insert(1, dataset(Some("good"), 2, &[("5", 1.0), ("7", 0.5)]));
    datasets.insert(2, dataset(None, 2, &[("5", 0.5), ("7", 0.5)]));
    datasets.insert(3, dataset(Some("broken"), 0, &[("5", 1.0)]));
    MapProvider { datasets }
}

fn all_ids() -> Vec<PhamId> {
    [4, 3, 2, 1].into_iter().map(PhamId::new).collect()
}

fn config_all() -> VerifyConfig {
    VerifyConfig {
        sample_size: None,
        chunk_size: 2,
        ..VerifyConfig::default()
    }
}

#[test]
fn batch_aggregates_each_outcome() {
    let verifier = Verifier::new(provider());
    let sink = RecordingSink::default();
    let report = verifier.run(&all_ids(), &config_all(), &sink);

    assert_eq!(report.selected, 4);
    assert_eq!(report.checked, 2);
    assert_eq!(report.mismatched, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.invalid, 1);
    assert!(report.has_mismatches());

    let ids = report.results.iter().map(|r| r.id.value()).collect::<Vec<_>>();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(report.results[0].outcome, Outcome::Agreed);
    assert_eq!(report.results[0].name, "good");

    // unnamed dataset falls back to its id
    assert_eq!(report.results[1].name, "2");
    match &report.results[1].outcome {
        Outcome::Mismatched { mismatches } => {
            assert_eq!(mismatches.len(), 1);
            assert_eq!(mismatches[0].start, "5");
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
    assert!(matches!(report.results[2].outcome, Outcome::Invalid { .. }));
    assert!(matches!(report.results[3].outcome, Outcome::Skipped { .. }));
}

#[test]
fn progress_is_reported_per_chunk() {
    let verifier = Verifier::new(provider());
    let sink = RecordingSink::default();
    verifier.run(&all_ids(), &config_all(), &sink);

    let messages = sink.messages.lock().unwrap();
    // selection + two chunks of two
    assert_eq!(messages.len(), 3);
    assert!(messages[1].contains("2/4"));
    assert!(messages[2].contains("4/4"));
}

#[test]
fn sampled_run_checks_requested_amount() {
    let verifier = Verifier::new(provider());
    let config = VerifyConfig {
        sample_size: Some(2),
        seed: Some(11),
        ..VerifyConfig::default()
    };
    let report = verifier.run(&all_ids(), &config, &RecordingSink::default());
    assert_eq!(report.selected, 2);
    assert!(report.results[0].id < report.results[1].id);
}

#[test]
fn report_serializes_outcome_inline() {
    let verifier = Verifier::new(provider());
    let report = verifier.run(&[PhamId::new(1)], &config_all(), &RecordingSink::default());
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["results"][0]["status"], "agreed");
    assert_eq!(value["results"][0]["name"], "good");
    assert_eq!(value["checked"], 1);
}
