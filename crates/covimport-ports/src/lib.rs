//! Collaborator port traits and boundary DTOs for covimport.
//!
//! The import core consumes four host-side collaborators: a report
//! aggregator that fills the coverage model, a wildcard path resolver the
//! aggregator uses to locate report files, a file-identity provider that maps
//! report paths to project files, and a measure sink that persists results.
//! Host-specific implementations live outside this workspace.

use std::path::{Path, PathBuf};

use covimport_domain::CoverageModel;
use covimport_types::Measure;

/// One configured coverage report source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSource {
    /// Report format label, opaque to the core (e.g. "opencover").
    pub format: String,
    /// Wildcard pattern locating the report files.
    pub pattern: String,
}

impl ReportSource {
    /// Create a report source.
    pub fn new(format: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            pattern: pattern.into(),
        }
    }
}

/// Canonical identity of a file known to the host project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    /// Host-assigned unique key for the file.
    pub key: String,
    /// Project-relative path.
    pub path: String,
    /// Language key of the file (e.g. "cs").
    pub language: String,
}

/// Port for filling the coverage model from configured report sources.
///
/// The aggregator owns report-format parsing and wildcard expansion; it calls
/// the model's accumulation methods per discovered line and condition.
pub trait ReportAggregator {
    /// Whether any coverage report source is configured.
    ///
    /// Callers gate on this before starting an import run; the driver itself
    /// never calls it.
    fn has_coverage_data(&self) -> bool;

    /// Parse the reports matching `source` and record their data into
    /// `model`. A parsing failure is fatal to the run and is returned as-is.
    fn aggregate(
        &self,
        resolver: &dyn PathResolver,
        source: &ReportSource,
        model: &mut CoverageModel,
    ) -> Result<(), String>;
}

/// Port for resolving wildcard file patterns against a base directory.
///
/// Used only by the aggregator, never by the driver directly.
pub trait PathResolver {
    /// Concrete paths matching `pattern` under `base_dir`.
    fn resolve(&self, base_dir: &Path, pattern: &str) -> Vec<PathBuf>;
}

/// Port for mapping a raw report path to the host's canonical file identity.
pub trait FileIdentityProvider {
    /// The project file for `path`, or `None` when the project does not
    /// recognize it.
    fn from_path(&self, path: &str) -> Option<FileHandle>;
}

/// Port for persisting one measure for one file.
///
/// Persistence failures are the sink's responsibility; the driver does not
/// retry.
pub trait MeasureSink {
    /// Persist `measure` for `file`.
    fn save(&mut self, file: &FileHandle, measure: Measure);
}

/// Port for obtaining the current UTC time.
pub trait Clock {
    /// Returns the current time in UTC.
    fn now(&self) -> chrono::DateTime<chrono::Utc>;
}
