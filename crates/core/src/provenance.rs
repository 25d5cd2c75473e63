//! Provenance records for completed downloads

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Description of one processing step, its inputs and its outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub activity_name: String,
    pub activity_description: String,
    pub start_time: jiff::Timestamp,
    pub processing_time_ms: u64,
    pub software_version: String,
    #[serde(default)]
    pub input_data: BTreeMap<String, String>,
    #[serde(default)]
    pub output_data: BTreeMap<String, String>,
}

impl Provenance {
    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
