//! Data types used by the aggregation pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Label of the virtual selection that unions every concrete region.
pub const ALL_REGIONS_LABEL: &str = "All Regions";

/// Label and region placeholder used for the synthetic totals row.
pub const TOTAL_LABEL: &str = "Total";
pub const TOTAL_REGION: &str = "-";

/// A concrete region, i.e. one directory under the data root.
pub type Region = String;

/// What the caller asked to aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    AllRegions,
    Region(Region),
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::AllRegions => f.write_str(ALL_REGIONS_LABEL),
            Selection::Region(r) => f.write_str(r),
        }
    }
}

impl FromStr for Selection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") || trimmed.eq_ignore_ascii_case(ALL_REGIONS_LABEL)
        {
            Ok(Selection::AllRegions)
        } else {
            Ok(Selection::Region(trimmed.to_string()))
        }
    }
}

impl Serialize for Selection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A (year, quarter) pair. Quarter is the snapshot file stem, e.g. `"3"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Period {
    pub year: u16,
    pub quarter: String,
}

impl Period {
    pub fn new(year: u16, quarter: impl Into<String>) -> Self {
        Self {
            year,
            quarter: quarter.into(),
        }
    }

    fn quarter_key(&self) -> (u32, &str) {
        (
            self.quarter.parse::<u32>().unwrap_or(u32::MAX),
            self.quarter.as_str(),
        )
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.year
            .cmp(&other.year)
            .then_with(|| self.quarter_key().cmp(&other.quarter_key()))
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Q{}", self.year, self.quarter)
    }
}

/// One validated entry of a snapshot's hover data list, before region tagging.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverRecord {
    pub name: String,
    pub count: u64,
    pub amount: f64,
}

impl HoverRecord {
    pub fn tag(self, region: &str) -> SubRegionRecord {
        SubRegionRecord {
            name: self.name,
            region: region.to_string(),
            count: self.count,
            amount: self.amount,
        }
    }
}

/// A sub-region record tagged with the region it was loaded from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubRegionRecord {
    pub name: String,
    pub region: Region,
    pub count: u64,
    pub amount: f64,
}

/// A record with its derived average transaction value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRow {
    pub name: String,
    pub region: Region,
    pub count: u64,
    pub amount: f64,
    pub average: f64,
}

/// Sums over every displayed row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TotalsRow {
    pub count: u64,
    pub amount: f64,
    pub average: f64,
}

impl TotalsRow {
    /// The totals in row shape, labelled `Total` / `-`.
    pub fn as_row(&self) -> AggregatedRow {
        AggregatedRow {
            name: TOTAL_LABEL.to_string(),
            region: TOTAL_REGION.to_string(),
            count: self.count,
            amount: self.amount,
            average: self.average,
        }
    }
}

/// Rows sorted by count descending, plus the totals computed over them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsTable {
    pub rows: Vec<AggregatedRow>,
    pub totals: TotalsRow,
}

/// A region whose snapshot could not be used during an all-regions fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotWarning {
    pub region: Region,
    pub path: PathBuf,
    pub reason: String,
}

/// Tagged records gathered for one selection and period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub records: Vec<SubRegionRecord>,
    pub warnings: Vec<SnapshotWarning>,
}

/// Finished table handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub selection: Selection,
    pub period: Period,
    pub rows: Vec<AggregatedRow>,
    pub totals: TotalsRow,
    pub warnings: Vec<SnapshotWarning>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
