use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VerifyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhamId(u64);

impl PhamId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn json_file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for PhamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PhamId {
    type Err = VerifyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(VerifyError::InvalidPhamId(value.to_string()));
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|_| VerifyError::InvalidPhamId(value.to_string()))
    }
}

/// One pham as served by Starterator.
///
/// Required fields are optional here so that a document missing them still
/// parses and the gap is reported as an integrity fault by the comparator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dataset {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub member_count: Option<i64>,
    #[serde(default)]
    pub genes: Option<Vec<Gene>>,
    #[serde(default)]
    pub conservation: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Gene {
    #[serde(default)]
    pub available_starts: Vec<u64>,
}

impl Gene {
    pub fn with_starts(starts: &[u64]) -> Self {
        Self {
            available_starts: starts.to_vec(),
        }
    }
}

impl Dataset {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, VerifyError> {
        serde_json::from_slice(bytes).map_err(|err| VerifyError::FormatFailure(err.to_string()))
    }
}
