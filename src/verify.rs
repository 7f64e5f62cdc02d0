use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::VerifyConfig;
use crate::conservation::{self, Mismatch};
use crate::domain::PhamId;
use crate::provider::DatasetProvider;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Agreed,
    Mismatched { mismatches: Vec<Mismatch> },
    /// Could not be fetched or parsed.
    Skipped { reason: String },
    /// Fetched, but the dataset contradicts itself.
    Invalid { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PhamResult {
    pub id: PhamId,
    pub name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub started_at: String,
    pub selected: usize,
    pub checked: usize,
    pub mismatched: usize,
    pub skipped: usize,
    pub invalid: usize,
    pub results: Vec<PhamResult>,
}

impl BatchReport {
    pub fn has_mismatches(&self) -> bool {
        self.mismatched > 0
    }

    fn record(&mut self, result: PhamResult) {
        self.selected += 1;
        match &result.outcome {
            Outcome::Agreed => self.checked += 1,
            Outcome::Mismatched { .. } => {
                self.checked += 1;
                self.mismatched += 1;
            }
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::Invalid { .. } => self.invalid += 1,
        }
        self.results.push(result);
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Checked {} phams; {} with mismatches; {} skipped; {} invalid.",
            self.checked, self.mismatched, self.skipped, self.invalid
        )
    }
}

pub struct Verifier<P: DatasetProvider> {
    provider: P,
}

impl<P: DatasetProvider> Verifier<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn run(
        &self,
        ids: &[PhamId],
        config: &VerifyConfig,
        sink: &dyn ProgressSink,
    ) -> BatchReport {
        let selected = select_ids(ids, config.sample_size, config.seed);
        let total = selected.len();
        let chunk_size = config.chunk_size.max(1);
        let started = Instant::now();
        sink.event(ProgressEvent {
            message: format!("phase=Select; {total} of {} phams", ids.len()),
            elapsed: None,
        });

        let mut report = BatchReport {
            started_at: iso_timestamp(),
            ..BatchReport::default()
        };
        for (index, &id) in selected.iter().enumerate() {
            report.record(self.verify_one(id, config.tolerance));

            let done = index + 1;
            if done % chunk_size == 0 || done == total {
                sink.event(ProgressEvent {
                    message: format!(
                        "phase=Verify; {done}/{total} processed, {} mismatched, {} skipped",
                        report.mismatched,
                        report.skipped + report.invalid
                    ),
                    elapsed: Some(started.elapsed()),
                });
            }
        }

        info!(
            checked = report.checked,
            mismatched = report.mismatched,
            skipped = report.skipped,
            invalid = report.invalid,
            "verification finished"
        );
        report
    }

    pub fn verify_one(&self, id: PhamId, tolerance: f64) -> PhamResult {
        let fallback = id.to_string();
        let dataset = match self.provider.get_dataset(id) {
            Ok(dataset) => dataset,
            Err(err) => {
                warn!(pham = %id, error = %err, "skipping pham");
                let outcome = if err.is_integrity() {
                    Outcome::Invalid {
                        reason: err.to_string(),
                    }
                } else {
                    Outcome::Skipped {
                        reason: err.to_string(),
                    }
                };
                return PhamResult {
                    id,
                    name: fallback,
                    outcome,
                };
            }
        };

        match conservation::compare(&dataset, &fallback, tolerance) {
            Ok(report) => PhamResult {
                id,
                outcome: if report.is_agreement() {
                    Outcome::Agreed
                } else {
                    Outcome::Mismatched {
                        mismatches: report.mismatches,
                    }
                },
                name: report.name,
            },
            Err(err) => {
                warn!(pham = %id, error = %err, "dataset failed integrity checks");
                PhamResult {
                    id,
                    name: dataset.name.unwrap_or(fallback),
                    outcome: Outcome::Invalid {
                        reason: err.to_string(),
                    },
                }
            }
        }
    }
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Pick the working set: everything, or a uniform random sample of
/// `sample_size` ids returned in ascending order.
pub fn select_ids(
    ids: &[PhamId],
    sample_size: Option<usize>,
    seed: Option<u64>,
) -> Vec<PhamId> {
    let mut pool = ids.to_vec();
    let amount = match sample_size {
        Some(amount) if amount > 0 && amount < pool.len() => amount,
        Some(amount) if amount > 0 => {
            info!(
                requested = amount,
                available = pool.len(),
                "sample covers every pham; using all"
            );
            pool.sort();
            return pool;
        }
        _ => {
            pool.sort();
            return pool;
        }
    };

    let mut rng = match seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    // Partial Fisher-Yates: the first `amount` slots end up a uniform sample.
    for i in 0..amount {
        let j = rng.usize(i..pool.len());
        pool.swap(i, j);
    }
    pool.truncate(amount);
    pool.sort();
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[u64]) -> Vec<PhamId> {
        values.iter().copied().map(PhamId::new).collect()
    }

    #[test]
    fn sample_is_sorted_subset() {
        let all = ids(&[9, 3, 7, 1, 5, 11, 2]);
        let picked = select_ids(&all, Some(3), Some(7));
        assert_eq!(picked.len(), 3);
        assert!(picked.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(picked.iter().all(|id| all.contains(id)));
    }

    #[test]
    fn seeded_sample_is_reproducible() {
        let all = ids(&(1..=100).collect::<Vec<_>>());
        assert_eq!(
            select_ids(&all, Some(10), Some(42)),
            select_ids(&all, Some(10), Some(42))
        );
    }

    #[test]
    fn oversized_or_zero_sample_uses_all() {
        let all = ids(&[4, 2, 3]);
        assert_eq!(select_ids(&all, Some(10), None), ids(&[2, 3, 4]));
        assert_eq!(select_ids(&all, Some(0), None), ids(&[2, 3, 4]));
        assert_eq!(select_ids(&all, None, None), ids(&[2, 3, 4]));
    }
}
