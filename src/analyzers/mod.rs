//! Region aggregation and derived metrics.
//!
//! This module gathers per-region snapshot records for a period, merges them
//! for the all-regions view, and computes per-row averages, ordering, and the
//! totals row handed to the presentation layer.

pub mod aggregate;
pub mod analyzer;
pub mod types;
pub mod utility;
