//! JSON parser for region snapshot files.
//!
//! A snapshot looks like:
//!
//! ```json
//! { "data": { "hoverDataList": [
//!     { "name": "pune district", "metric": [ { "type": "TOTAL", "count": 12, "amount": 3400.5 } ] }
//! ] } }
//! ```
//!
//! Only the first element of each `metric` list is used.

use crate::analyzers::types::{HoverRecord, Period};
use crate::catalog::PathCatalog;
use crate::error::{PulseError, Result};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize)]
struct Snapshot {
    data: SnapshotData,
}

#[derive(Deserialize)]
struct SnapshotData {
    #[serde(rename = "hoverDataList")]
    hover_data_list: Vec<HoverEntry>,
}

#[derive(Deserialize)]
struct HoverEntry {
    name: String,
    #[serde(default)]
    metric: Vec<serde_json::Value>,
}

/// Decodes and validates the records of one snapshot file.
///
/// `path` is only used to label errors.
///
/// # Errors
///
/// [`PulseError::MalformedSnapshot`] if the document does not have the
/// `data.hoverDataList` shape or a count or amount is not a non-negative
/// number, and [`PulseError::MissingMetric`] if an entry's first metric is
/// absent or lacks `count`/`amount`.
pub fn parse_snapshot(path: &Path, bytes: &[u8]) -> Result<Vec<HoverRecord>> {
    let snapshot: Snapshot =
        serde_json::from_slice(bytes).map_err(|e| PulseError::MalformedSnapshot {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    snapshot
        .data
        .hover_data_list
        .into_iter()
        .map(|entry| validate_entry(path, entry))
        .collect()
}

fn validate_entry(path: &Path, entry: HoverEntry) -> Result<HoverRecord> {
    let missing = |reason: &str| PulseError::MissingMetric {
        path: path.to_path_buf(),
        entry: entry.name.clone(),
        reason: reason.to_string(),
    };
    let malformed = |reason: String| PulseError::MalformedSnapshot {
        path: path.to_path_buf(),
        reason,
    };

    let first = entry
        .metric
        .first()
        .ok_or_else(|| missing("metric list is empty"))?;
    let field = |key: &str| first.get(key).filter(|v| !v.is_null());

    let count = field("count").ok_or_else(|| missing("first metric has no count"))?;
    let amount = field("amount").ok_or_else(|| missing("first metric has no amount"))?;

    let count = count.as_u64().ok_or_else(|| {
        malformed(format!(
            "count {count} for '{}' is not a non-negative integer",
            entry.name
        ))
    })?;
    let amount = amount
        .as_f64()
        .filter(|a| a.is_finite() && *a >= 0.0)
        .ok_or_else(|| {
            malformed(format!(
                "amount {amount} for '{}' is not a non-negative number",
                entry.name
            ))
        })?;

    Ok(HoverRecord {
        name: entry.name,
        count,
        amount,
    })
}

/// Loads the snapshot for `region` and `period`.
///
/// A missing file is not an error: it yields no records.
#[tracing::instrument(skip(catalog, period), fields(period = %period))]
pub fn load_snapshot(catalog: &PathCatalog, region: &str, period: &Period) -> Result<Vec<HoverRecord>> {
    let path = catalog.snapshot_path(region, period);

    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No snapshot for period");
            return Ok(Vec::new());
        }
        Err(e) => return Err(PulseError::io(path, e)),
    };

    let records = parse_snapshot(&path, &bytes)?;
    debug!(records = records.len(), "Snapshot parsed");
    Ok(records)
}
