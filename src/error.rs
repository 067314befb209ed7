//! Error taxonomy for catalog discovery and snapshot loading.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PulseError {
    /// The configured data root does not exist.
    #[error("data root not found: {}", .0.display())]
    DataRootMissing(PathBuf),

    /// A concrete region was requested but has no directory under the data root.
    #[error("region '{0}' not found")]
    RegionNotFound(String),

    /// The snapshot file exists but its top-level shape is wrong.
    #[error("malformed snapshot {}: {reason}", .path.display())]
    MalformedSnapshot { path: PathBuf, reason: String },

    /// An entry's metric list is empty or its first element lacks `count`/`amount`.
    #[error("missing metric for '{entry}' in {}: {reason}", .path.display())]
    MissingMetric {
        path: PathBuf,
        entry: String,
        reason: String,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A snapshot load running on the blocking pool panicked or was cancelled.
    #[error("snapshot load task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PulseError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PulseError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for errors scoped to a single snapshot file.
    ///
    /// These are recoverable during an all-regions fan-out; everything else
    /// aborts the request.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            PulseError::MalformedSnapshot { .. }
                | PulseError::MissingMetric { .. }
                | PulseError::Io { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PulseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_file_classification() {
        assert!(!PulseError::DataRootMissing(PathBuf::from("/nope")).is_per_file());
        assert!(!PulseError::RegionNotFound("goa".into()).is_per_file());
        assert!(
            PulseError::MalformedSnapshot {
                path: PathBuf::from("a.json"),
                reason: "x".into(),
            }
            .is_per_file()
        );
        assert!(
            PulseError::MissingMetric {
                path: PathBuf::from("a.json"),
                entry: "pune".into(),
                reason: "empty".into(),
            }
            .is_per_file()
        );
        assert!(
            PulseError::io(
                "a.json",
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            )
            .is_per_file()
        );
    }

    #[test]
    fn test_display_includes_path() {
        let err = PulseError::DataRootMissing(PathBuf::from("/data/pulse"));
        assert_eq!(err.to_string(), "data root not found: /data/pulse");
    }
}
