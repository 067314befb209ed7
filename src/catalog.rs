//! Discovery of regions and periods from the on-disk layout.
//!
//! Snapshots are laid out as `<data-root>/<region>/<year>/<quarter>.json`.
//! The catalog only enumerates directories and file names; it never opens a
//! snapshot.

use crate::analyzers::types::{Period, Region};
use crate::error::{PulseError, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

const SNAPSHOT_EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct PathCatalog {
    root: PathBuf,
}

impl PathCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn region_dir(&self, region: &str) -> PathBuf {
        self.root.join(region)
    }

    /// A region must be a single plain directory name that is not hidden.
    pub fn is_region_name(region: &str) -> bool {
        let mut components = Path::new(region).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) && !region.starts_with('.')
    }

    pub fn region_exists(&self, region: &str) -> bool {
        Self::is_region_name(region) && self.region_dir(region).is_dir()
    }

    /// Path of the snapshot for `region` and `period`, whether or not it exists.
    pub fn snapshot_path(&self, region: &str, period: &Period) -> PathBuf {
        self.region_dir(region)
            .join(period.year.to_string())
            .join(format!("{}.{}", period.quarter, SNAPSHOT_EXTENSION))
    }

    /// Every concrete region, sorted by name.
    ///
    /// # Errors
    ///
    /// [`PulseError::DataRootMissing`] if the data root is not a directory.
    pub fn list_regions(&self) -> Result<Vec<Region>> {
        if !self.root.is_dir() {
            return Err(PulseError::DataRootMissing(self.root.clone()));
        }

        let mut regions: Vec<Region> = subdirectory_names(&self.root)?
            .into_iter()
            .filter(|name| !name.starts_with('.'))
            .collect();
        regions.sort();

        debug!(count = regions.len(), root = %self.root.display(), "Regions discovered");
        Ok(regions)
    }

    /// Every (year, quarter) with a snapshot file for `region`, in period order.
    ///
    /// # Errors
    ///
    /// [`PulseError::DataRootMissing`] if the data root is absent, or
    /// [`PulseError::RegionNotFound`] if the region has no directory.
    pub fn list_periods(&self, region: &str) -> Result<Vec<Period>> {
        if !self.root.is_dir() {
            return Err(PulseError::DataRootMissing(self.root.clone()));
        }
        if !self.region_exists(region) {
            return Err(PulseError::RegionNotFound(region.to_string()));
        }
        let region_dir = self.region_dir(region);

        let mut periods = Vec::new();
        for year_name in subdirectory_names(&region_dir)? {
            let Ok(year) = year_name.parse::<u16>() else {
                debug!(region, entry = %year_name, "Skipping non-year directory");
                continue;
            };
            for quarter in quarter_labels(&region_dir.join(&year_name))? {
                periods.push(Period::new(year, quarter));
            }
        }
        periods.sort();

        Ok(periods)
    }

    /// Union of the periods of every region, in period order.
    pub fn list_all_periods(&self) -> Result<Vec<Period>> {
        let mut all = BTreeSet::new();
        for region in self.list_regions()? {
            all.extend(self.list_periods(&region)?);
        }
        Ok(all.into_iter().collect())
    }
}

fn subdirectory_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in fs::read_dir(dir).map_err(|e| PulseError::io(dir, e))? {
        let entry = entry.map_err(|e| PulseError::io(dir, e))?;
        if !entry.path().is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }

    Ok(names)
}

fn quarter_labels(year_dir: &Path) -> Result<Vec<String>> {
    let mut labels = Vec::new();

    for entry in fs::read_dir(year_dir).map_err(|e| PulseError::io(year_dir, e))? {
        let entry = entry.map_err(|e| PulseError::io(year_dir, e))?;
        let path = entry.path();

        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXTENSION)
        {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            labels.push(stem.to_string());
        }
    }

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn test_missing_root() {
        let dir = tempdir().unwrap();
        let catalog = PathCatalog::new(dir.path().join("absent"));

        assert!(matches!(
            catalog.list_regions(),
            Err(PulseError::DataRootMissing(_))
        ));
        assert!(matches!(
            catalog.list_periods("goa"),
            Err(PulseError::DataRootMissing(_))
        ));
    }

    #[test]
    fn test_lists_regions_sorted_and_skips_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("kerala")).unwrap();
        fs::create_dir_all(dir.path().join("bihar")).unwrap();
        fs::create_dir_all(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join("README.txt"), "x").unwrap();

        let catalog = PathCatalog::new(dir.path());
        assert_eq!(catalog.list_regions().unwrap(), vec!["bihar", "kerala"]);
    }

    #[test]
    fn test_lists_periods_in_order() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "goa/2019/1.json");
        touch(dir.path(), "goa/2018/4.json");
        touch(dir.path(), "goa/2018/2.json");
        touch(dir.path(), "goa/2018/notes.txt");
        fs::create_dir_all(dir.path().join("goa/misc")).unwrap();

        let catalog = PathCatalog::new(dir.path());
        assert_eq!(
            catalog.list_periods("goa").unwrap(),
            vec![
                Period::new(2018, "2"),
                Period::new(2018, "4"),
                Period::new(2019, "1"),
            ]
        );
    }

    #[test]
    fn test_unknown_region() {
        let dir = tempdir().unwrap();
        let catalog = PathCatalog::new(dir.path());
        assert!(matches!(
            catalog.list_periods("atlantis"),
            Err(PulseError::RegionNotFound(r)) if r == "atlantis"
        ));
    }

    #[test]
    fn test_rejects_non_region_names() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("data");
        touch(&root, "goa/2021/1.json");
        touch(&root, ".cache/2021/1.json");
        touch(dir.path(), "2021/1.json");

        let catalog = PathCatalog::new(&root);
        assert!(catalog.region_exists("goa"));
        for name in ["..", ".", "", ".cache", "goa/2021", "/tmp"] {
            assert!(!PathCatalog::is_region_name(name), "accepted {name:?}");
            assert!(!catalog.region_exists(name), "exists {name:?}");
            assert!(
                matches!(catalog.list_periods(name), Err(PulseError::RegionNotFound(_))),
                "listed periods for {name:?}"
            );
        }
    }

    #[test]
    fn test_all_periods_is_union() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "goa/2018/1.json");
        touch(dir.path(), "bihar/2018/1.json");
        touch(dir.path(), "bihar/2020/3.json");

        let catalog = PathCatalog::new(dir.path());
        assert_eq!(
            catalog.list_all_periods().unwrap(),
            vec![Period::new(2018, "1"), Period::new(2020, "3")]
        );
    }

    #[test]
    fn test_snapshot_path_layout() {
        let catalog = PathCatalog::new("/data");
        assert_eq!(
            catalog.snapshot_path("goa", &Period::new(2021, "3")),
            PathBuf::from("/data/goa/2021/3.json")
        );
    }
}
