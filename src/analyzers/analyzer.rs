use crate::analyzers::aggregate::compute_metrics;
use crate::analyzers::types::{Aggregation, HoverRecord, Period, Report, Selection, SnapshotWarning};
use crate::catalog::PathCatalog;
use crate::config::Config;
use crate::error::{PulseError, Result};
use crate::parser::load_snapshot;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Gathers region-tagged records for a selection and period.
#[derive(Debug, Clone)]
pub struct Aggregator {
    catalog: PathCatalog,
    strict_regions: bool,
}

impl Aggregator {
    pub fn new(catalog: PathCatalog, strict_regions: bool) -> Self {
        Self {
            catalog,
            strict_regions,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            PathCatalog::new(config.data_root.clone()),
            config.strict_regions,
        )
    }

    pub fn catalog(&self) -> &PathCatalog {
        &self.catalog
    }

    /// Loads records for `selection` and `period` one region at a time.
    ///
    /// For a single region every error is returned. For all regions only a
    /// missing data root is fatal; a region whose snapshot is unusable
    /// contributes nothing and is reported in [`Aggregation::warnings`].
    #[tracing::instrument(skip(self, selection, period), fields(selection = %selection, period = %period))]
    pub fn aggregate(&self, selection: &Selection, period: &Period) -> Result<Aggregation> {
        let Selection::Region(region) = selection else {
            let mut aggregation = Aggregation::default();
            for region in self.catalog.list_regions()? {
                let loaded = load_snapshot(&self.catalog, &region, period);
                self.collect(&mut aggregation, &region, period, loaded)?;
            }
            log_outcome(&aggregation);
            return Ok(aggregation);
        };

        if !self.catalog.root().is_dir() {
            return Err(PulseError::DataRootMissing(self.catalog.root().to_path_buf()));
        }
        if !self.catalog.region_exists(region) {
            if self.strict_regions {
                return Err(PulseError::RegionNotFound(region.clone()));
            }
            debug!(region = %region, "Region directory absent, treating as empty");
            return Ok(Aggregation::default());
        }

        let records = load_snapshot(&self.catalog, region, period)?
            .into_iter()
            .map(|r| r.tag(region))
            .collect();

        Ok(Aggregation {
            records,
            warnings: Vec::new(),
        })
    }

    /// Same result as [`Aggregator::aggregate`], but all-regions loads run on
    /// the blocking pool with at most `concurrency` in flight.
    ///
    /// Results are merged in catalog order, not completion order.
    #[tracing::instrument(skip(self, selection, period), fields(selection = %selection, period = %period))]
    pub async fn aggregate_concurrent(
        &self,
        selection: &Selection,
        period: &Period,
        concurrency: usize,
    ) -> Result<Aggregation> {
        if let Selection::Region(_) = selection {
            let aggregator = self.clone();
            let selection = selection.clone();
            let period = period.clone();
            return tokio::task::spawn_blocking(move || aggregator.aggregate(&selection, &period))
                .await?;
        }

        let regions = self.catalog.list_regions()?;
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut tasks = Vec::with_capacity(regions.len());

        for region in regions {
            let sem = semaphore.clone();
            let catalog = self.catalog.clone();
            let period = period.clone();
            let task_region = region.clone();

            let task = tokio::spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                tokio::task::spawn_blocking(move || load_snapshot(&catalog, &task_region, &period))
                    .await
            });
            tasks.push((region, task));
        }

        let mut aggregation = Aggregation::default();
        for (region, task) in tasks {
            match task.await {
                Ok(Ok(loaded)) => self.collect(&mut aggregation, &region, period, loaded)?,
                Ok(Err(e)) | Err(e) => {
                    warn!(region = %region, error = %e, "Snapshot load task failed");
                    aggregation.warnings.push(SnapshotWarning {
                        path: self.catalog.snapshot_path(&region, period),
                        region,
                        reason: format!("snapshot load task failed: {e}"),
                    });
                }
            }
        }

        log_outcome(&aggregation);
        Ok(aggregation)
    }

    /// Folds one region's load result into `aggregation`, demoting per-file
    /// errors to warnings.
    fn collect(
        &self,
        aggregation: &mut Aggregation,
        region: &str,
        period: &Period,
        loaded: Result<Vec<HoverRecord>>,
    ) -> Result<()> {
        match loaded {
            Ok(records) => {
                aggregation
                    .records
                    .extend(records.into_iter().map(|r| r.tag(region)));
                Ok(())
            }
            Err(e) if e.is_per_file() => {
                warn!(region, error = %e, "Skipping unusable snapshot");
                aggregation.warnings.push(SnapshotWarning {
                    region: region.to_string(),
                    path: self.catalog.snapshot_path(region, period),
                    reason: e.to_string(),
                });
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn log_outcome(aggregation: &Aggregation) {
    info!(
        records = aggregation.records.len(),
        warnings = aggregation.warnings.len(),
        "Aggregation complete"
    );
}

/// Aggregates, computes metrics, and assembles the finished [`Report`].
///
/// With `concurrency > 1` the all-regions fan-out runs in parallel.
pub async fn build_report(
    aggregator: &Aggregator,
    selection: Selection,
    period: Period,
    concurrency: usize,
) -> Result<Report> {
    let aggregation = if concurrency > 1 {
        aggregator
            .aggregate_concurrent(&selection, &period, concurrency)
            .await?
    } else {
        aggregator.aggregate(&selection, &period)?
    };

    Ok(report_from(selection, period, aggregation))
}

pub fn report_from(selection: Selection, period: Period, aggregation: Aggregation) -> Report {
    let table = compute_metrics(aggregation.records);

    Report {
        generated_at: chrono::Utc::now(),
        selection,
        period,
        rows: table.rows,
        totals: table.totals,
        warnings: aggregation.warnings,
    }
}
