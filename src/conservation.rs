//! Start-site conservation: recompute the table from the gene list and diff it
//! against the table a dataset ships with.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::domain::Dataset;
use crate::error::VerifyError;

pub const DEFAULT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    MissingInOneSide,
    ValueMismatch,
}

impl MismatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MismatchKind::MissingInOneSide => "missing_in_one_side",
            MismatchKind::ValueMismatch => "value_mismatch",
        }
    }
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    pub start: String,
    pub issue: MismatchKind,
    #[serde(rename = "stored_value")]
    pub stored: Option<f64>,
    #[serde(rename = "recomputed_value")]
    pub recomputed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub name: String,
    pub mismatches: Vec<Mismatch>,
}

impl ComparisonReport {
    pub fn is_agreement(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Fraction of members offering each start position.
///
/// Every occurrence counts, so a position listed twice by one gene is counted
/// twice. Positions nobody offers are left out of the table.
pub fn recompute(dataset: &Dataset) -> Result<BTreeMap<String, f64>, VerifyError> {
    let member_count = match dataset.member_count {
        Some(count) if count > 0 => count,
        Some(count) => {
            return Err(VerifyError::DataIntegrity(format!(
                "MemberCount must be positive, got {count}"
            )));
        }
        None => return Err(VerifyError::DataIntegrity("missing MemberCount".to_string())),
    };
    let genes = dataset
        .genes
        .as_ref()
        .ok_or_else(|| VerifyError::DataIntegrity("missing Genes".to_string()))?;

    let mut counts = BTreeMap::<u64, u64>::new();
    for gene in genes {
        for &start in &gene.available_starts {
            *counts.entry(start).or_insert(0) += 1;
        }
    }

    let members = member_count as f64;
    Ok(counts
        .into_iter()
        .map(|(start, count)| (start.to_string(), count as f64 / members))
        .collect())
}

/// Diff the stored conservation table against [`recompute`].
///
/// Keys are visited in ascending numeric order. A difference of exactly
/// `tolerance` still counts as agreement.
pub fn compare(
    dataset: &Dataset,
    fallback_name: &str,
    tolerance: f64,
) -> Result<ComparisonReport, VerifyError> {
    let stored = dataset
        .conservation
        .as_ref()
        .ok_or_else(|| VerifyError::DataIntegrity("missing Conservation".to_string()))?;
    let recomputed = recompute(dataset)?;

    // (numeric key, spelling) -> (stored, recomputed)
    let mut union = BTreeMap::<(u64, &str), (Option<f64>, Option<f64>)>::new();
    for (key, value) in stored {
        union.entry((start_key(key)?, key.as_str())).or_default().0 = Some(*value);
    }
    for (key, value) in &recomputed {
        union.entry((start_key(key)?, key.as_str())).or_default().1 = Some(*value);
    }

    let mismatches = union
        .into_iter()
        .filter_map(|((_, key), sides)| {
            let issue = match sides {
                (Some(stored), Some(recomputed)) if (stored - recomputed).abs() > tolerance => {
                    MismatchKind::ValueMismatch
                }
                (Some(_), Some(_)) => return None,
                _ => MismatchKind::MissingInOneSide,
            };
            Some(Mismatch {
                start: key.to_string(),
                issue,
                stored: sides.0,
                recomputed: sides.1,
            })
        })
        .collect();

    Ok(ComparisonReport {
        name: dataset
            .name
            .clone()
            .unwrap_or_else(|| fallback_name.to_string()),
        mismatches,
    })
}

fn start_key(key: &str) -> Result<u64, VerifyError> {
    key.trim().parse::<u64>().map_err(|_| {
        VerifyError::DataIntegrity(format!("conservation key {key:?} is not a start position"))
    })
}
