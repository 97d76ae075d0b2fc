//! Import orchestration for covimport.
//!
//! This crate provides the high-level `import_coverage` function that
//! orchestrates one coverage-import run:
//!
//! 1. Fill the coverage model by invoking the aggregator once per configured
//!    report source
//! 2. Resolve each reported file path against the file-identity provider
//! 3. Build per-line and per-condition measures for files of the configured
//!    language
//! 4. In integration mode, redirect each measure through the translation
//!    table, dropping measures with no integration-test variant
//! 5. Record surviving measures through the measure sink and return a summary
//!
//! # Example
//!
//! ```rust,ignore
//! use covimport_core::{import_coverage, ImportRequest};
//! use covimport_ports::ReportSource;
//!
//! let request = ImportRequest {
//!     language_key: "cs".to_string(),
//!     sources: vec![ReportSource::new("opencover", "coverage/**/*.xml")],
//!     ..Default::default()
//! };
//!
//! let summary = import_coverage(&request, &aggregator, &resolver, &files, &mut sink)?;
//! println!("saved {} measures", summary.measures_saved);
//! ```

use chrono::{DateTime, Utc};
use covimport_config::{EffectiveConfig, Mode};
use covimport_domain::{
    build_measures, normalize_path_with_strip, translate_for_integration, CoverageModel,
    ItTranslation,
};
use covimport_ports::{
    Clock, FileIdentityProvider, MeasureSink, PathResolver, ReportAggregator, ReportSource,
};
use covimport_types::{Diagnostic, ImportSummary};
use thiserror::Error;
use tracing::{debug, warn};

// ============================================================================
// Clock
// ============================================================================

/// System clock implementation that returns the actual current time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ============================================================================
// Request
// ============================================================================

/// Request for one coverage-import run.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    /// Language key of the files to measure; files of any other language are
    /// skipped silently.
    pub language_key: String,
    /// Record measures under the integration-test metric variants.
    pub integration: bool,
    /// Configured report sources, aggregated in order.
    pub sources: Vec<ReportSource>,
    /// Prefixes stripped from report paths before project lookup.
    pub path_strip: Vec<String>,
}

impl Default for ImportRequest {
    fn default() -> Self {
        Self {
            language_key: "cs".to_string(),
            integration: false,
            sources: Vec::new(),
            path_strip: Vec::new(),
        }
    }
}

impl ImportRequest {
    /// Build a request from resolved configuration.
    pub fn from_config(config: &EffectiveConfig) -> Self {
        Self {
            language_key: config.language_key.clone(),
            integration: config.mode == Mode::Integration,
            sources: config
                .reports
                .iter()
                .map(|entry| ReportSource::new(&entry.format, &entry.pattern))
                .collect(),
            path_strip: config.path_strip.clone(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur during an import run.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The aggregation step failed; the run was aborted before any measure
    /// was recorded.
    #[error("Failed to aggregate coverage reports: {0}")]
    Aggregation(String),
}

// ============================================================================
// Import Driver
// ============================================================================

/// Run a coverage import with the system clock and the standard translation
/// table.
///
/// # Errors
///
/// Returns [`ImportError::Aggregation`] when the aggregation collaborator
/// fails; per-file anomalies are recovered locally and reported through the
/// summary's diagnostics instead.
pub fn import_coverage<A, P, F, S>(
    request: &ImportRequest,
    aggregator: &A,
    resolver: &P,
    files: &F,
    sink: &mut S,
) -> Result<ImportSummary, ImportError>
where
    A: ReportAggregator,
    P: PathResolver,
    F: FileIdentityProvider,
    S: MeasureSink,
{
    import_coverage_with_clock(request, aggregator, resolver, files, sink, &SystemClock)
}

/// Run a coverage import with a custom clock.
///
/// This allows for deterministic testing with fixed timestamps.
pub fn import_coverage_with_clock<A, P, F, S, C>(
    request: &ImportRequest,
    aggregator: &A,
    resolver: &P,
    files: &F,
    sink: &mut S,
    clock: &C,
) -> Result<ImportSummary, ImportError>
where
    A: ReportAggregator,
    P: PathResolver,
    F: FileIdentityProvider,
    S: MeasureSink,
    C: Clock,
{
    import_coverage_with(
        request,
        aggregator,
        resolver,
        files,
        sink,
        clock,
        &ItTranslation::new(),
    )
}

/// Run a coverage import with a custom clock and translation table.
///
/// The translation table is an immutable lookup value constructed once and
/// injected here; the driver holds no global state.
#[allow(clippy::too_many_arguments)]
pub fn import_coverage_with<A, P, F, S, C>(
    request: &ImportRequest,
    aggregator: &A,
    resolver: &P,
    files: &F,
    sink: &mut S,
    clock: &C,
    translation: &ItTranslation,
) -> Result<ImportSummary, ImportError>
where
    A: ReportAggregator,
    P: PathResolver,
    F: FileIdentityProvider,
    S: MeasureSink,
    C: Clock,
{
    let started_at = clock.now();

    // Fill the model, one aggregation per configured source. Any failure here
    // is fatal: nothing has been saved yet and nothing will be.
    let mut model = CoverageModel::new();
    for source in &request.sources {
        aggregator
            .aggregate(resolver, source, &mut model)
            .map_err(ImportError::Aggregation)?;
    }

    let mut summary = ImportSummary {
        started_at: format_timestamp(started_at),
        files_in_report: model.len() as u32,
        ..Default::default()
    };

    for path in model.file_paths() {
        let lookup = normalize_path_with_strip(path, &request.path_strip);
        let handle = match files.from_path(&lookup) {
            Some(handle) => handle,
            None => {
                // Expected for generated or third-party code in the report.
                debug!(
                    path,
                    "coverage will not be imported for file outside the project"
                );
                summary.diagnostics.push(Diagnostic::unresolved_file(path));
                summary.files_unresolved += 1;
                continue;
            }
        };

        if handle.language != request.language_key {
            summary.files_language_skipped += 1;
            continue;
        }

        for measure in build_measures(&model, path) {
            if request.integration {
                match translate_for_integration(&measure, translation) {
                    Some(it_measure) => {
                        sink.save(&handle, it_measure);
                        summary.measures_saved += 1;
                    }
                    None => {
                        warn!(
                            metric = measure.kind.key(),
                            path, "metric has no integration-test variant; measure dropped"
                        );
                        summary
                            .diagnostics
                            .push(Diagnostic::no_integration_variant(measure.kind, path));
                        summary.measures_dropped += 1;
                    }
                }
            } else {
                sink.save(&handle, measure);
                summary.measures_saved += 1;
            }
        }
        summary.files_measured += 1;
    }

    let ended_at = clock.now();
    summary.ended_at = Some(format_timestamp(ended_at));
    summary.duration_ms = Some((ended_at - started_at).num_milliseconds().max(0) as u64);

    Ok(summary)
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

// ============================================================================
// Tests
// ============================================================================
