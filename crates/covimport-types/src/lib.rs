//! Core types and DTOs for covimport.
//!
//! This crate defines the data transfer objects used throughout covimport,
//! including metric kinds, measures, diagnostics, diagnostic codes, and the
//! import summary.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Diagnostic Code Constants
// ============================================================================

/// Diagnostic code for report paths the project does not recognize.
pub const CODE_UNRESOLVED_FILE: &str = "covimport.file.unresolved";

/// Diagnostic code for measures whose kind has no integration-test variant.
pub const CODE_NO_IT_VARIANT: &str = "covimport.metric.no_integration_variant";

/// Diagnostic code for a failed aggregation step.
pub const CODE_AGGREGATION_FAILED: &str = "covimport.report.aggregation_failed";

// ============================================================================
// Code Registry
// ============================================================================

/// Metadata for a covimport diagnostic code.
#[derive(Debug, Clone, Copy)]
pub struct CodeInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub short_description: &'static str,
    pub full_description: &'static str,
    pub remediation: &'static str,
    pub help_anchor: &'static str,
    pub help_uri: &'static str,
}

/// Registry of all covimport diagnostic codes.
pub const CODE_REGISTRY: &[CodeInfo] = &[
    CodeInfo {
        code: CODE_UNRESOLVED_FILE,
        name: "UnresolvedFile",
        short_description: "Report path unknown to the project",
        full_description: "A coverage report referenced a file the project does not recognize.",
        remediation: "Expected for generated or third-party code. Otherwise check path \
                      normalization and the configured path_strip prefixes.",
        help_anchor: "unresolved_file",
        help_uri: "https://github.com/covimport/covimport/blob/main/docs/codes.md#unresolved_file",
    },
    CodeInfo {
        code: CODE_NO_IT_VARIANT,
        name: "NoIntegrationVariant",
        short_description: "Metric has no integration-test variant",
        full_description: "A measure could not be redirected to an integration-test metric \
                           because its kind has no entry in the translation table.",
        remediation: "The measure is dropped. Report a bug if the kind is one of the seven \
                      base coverage kinds.",
        help_anchor: "no_integration_variant",
        help_uri: "https://github.com/covimport/covimport/blob/main/docs/codes.md#no_integration_variant",
    },
    CodeInfo {
        code: CODE_AGGREGATION_FAILED,
        name: "AggregationFailed",
        short_description: "Coverage report aggregation failed",
        full_description: "The aggregation collaborator failed while filling the coverage \
                           model; the run was aborted and no measures were recorded.",
        remediation: "Regenerate the coverage report and ensure it is not truncated or \
                      corrupted.",
        help_anchor: "aggregation_failed",
        help_uri: "https://github.com/covimport/covimport/blob/main/docs/codes.md#aggregation_failed",
    },
];

/// Lookup code metadata by code string.
pub fn explain(code: &str) -> Option<&'static CodeInfo> {
    CODE_REGISTRY.iter().find(|info| info.code == code)
}

// ============================================================================
// Severity
// ============================================================================

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

// ============================================================================
// Metric Kinds
// ============================================================================

/// The closed set of coverage metric kinds.
///
/// Seven base kinds cover line and condition coverage; each has a parallel
/// integration-test variant used to keep integration-test coverage separate
/// from unit-test coverage in the same project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    LinesToCover,
    UncoveredLines,
    LineHitsData,
    ConditionsToCover,
    UncoveredConditions,
    CoveredConditionsByLine,
    ConditionsByLine,
    ItLinesToCover,
    ItUncoveredLines,
    ItLineHitsData,
    ItConditionsToCover,
    ItUncoveredConditions,
    ItCoveredConditionsByLine,
    ItConditionsByLine,
}

impl MetricKind {
    /// The seven base (unit-test) metric kinds.
    pub const BASE: [MetricKind; 7] = [
        MetricKind::LinesToCover,
        MetricKind::UncoveredLines,
        MetricKind::LineHitsData,
        MetricKind::ConditionsToCover,
        MetricKind::UncoveredConditions,
        MetricKind::CoveredConditionsByLine,
        MetricKind::ConditionsByLine,
    ];

    /// The seven integration-test metric kinds.
    pub const INTEGRATION: [MetricKind; 7] = [
        MetricKind::ItLinesToCover,
        MetricKind::ItUncoveredLines,
        MetricKind::ItLineHitsData,
        MetricKind::ItConditionsToCover,
        MetricKind::ItUncoveredConditions,
        MetricKind::ItCoveredConditionsByLine,
        MetricKind::ItConditionsByLine,
    ];

    /// Canonical string key for this kind (matches the serde representation).
    pub fn key(&self) -> &'static str {
        match self {
            MetricKind::LinesToCover => "lines_to_cover",
            MetricKind::UncoveredLines => "uncovered_lines",
            MetricKind::LineHitsData => "line_hits_data",
            MetricKind::ConditionsToCover => "conditions_to_cover",
            MetricKind::UncoveredConditions => "uncovered_conditions",
            MetricKind::CoveredConditionsByLine => "covered_conditions_by_line",
            MetricKind::ConditionsByLine => "conditions_by_line",
            MetricKind::ItLinesToCover => "it_lines_to_cover",
            MetricKind::ItUncoveredLines => "it_uncovered_lines",
            MetricKind::ItLineHitsData => "it_line_hits_data",
            MetricKind::ItConditionsToCover => "it_conditions_to_cover",
            MetricKind::ItUncoveredConditions => "it_uncovered_conditions",
            MetricKind::ItCoveredConditionsByLine => "it_covered_conditions_by_line",
            MetricKind::ItConditionsByLine => "it_conditions_by_line",
        }
    }

    /// Whether this kind is an integration-test variant.
    pub fn is_integration(&self) -> bool {
        MetricKind::INTEGRATION.contains(self)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ============================================================================
// Measures
// ============================================================================

/// The value carried by a measure: either a plain count or a structured
/// per-line data string (`line=value` pairs joined with `;`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeasureValue {
    Count(u64),
    Data(String),
}

impl MeasureValue {
    /// The numeric value, if this is a count measure.
    pub fn as_count(&self) -> Option<u64> {
        match self {
            MeasureValue::Count(n) => Some(*n),
            MeasureValue::Data(_) => None,
        }
    }

    /// The data string, if this is a data measure.
    pub fn as_data(&self) -> Option<&str> {
        match self {
            MeasureValue::Count(_) => None,
            MeasureValue::Data(s) => Some(s),
        }
    }
}

/// One computed coverage fact for a file.
///
/// The file identity is not part of the measure itself; it travels alongside
/// as the file handle passed to the measure sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    /// The metric this measure records a value for.
    pub kind: MetricKind,
    /// The recorded value.
    pub value: MeasureValue,
}

impl Measure {
    /// Create a count measure.
    pub fn count(kind: MetricKind, value: u64) -> Self {
        Self {
            kind,
            value: MeasureValue::Count(value),
        }
    }

    /// Create a data measure.
    pub fn data(kind: MetricKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: MeasureValue::Data(value.into()),
        }
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// A single diagnostic emitted during an import run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity of the diagnostic.
    pub severity: Severity,
    /// Diagnostic code (e.g. "covimport.file.unresolved").
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Report path the diagnostic refers to, when file-scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic for a report path the project does not recognize.
    pub fn unresolved_file(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            severity: Severity::Info,
            code: CODE_UNRESOLVED_FILE.to_string(),
            message: format!("Coverage will not be imported for file outside the project: {path}"),
            path: Some(path),
        }
    }

    /// Create a diagnostic for a measure dropped because its kind has no
    /// integration-test variant.
    pub fn no_integration_variant(kind: MetricKind, path: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warn,
            code: CODE_NO_IT_VARIANT.to_string(),
            message: format!(
                "Metric cannot be converted to an integration-test measure: {}",
                kind.key()
            ),
            path: Some(path.into()),
        }
    }
}

// ============================================================================
// Import Summary
// ============================================================================

/// Outcome of one import run: timing, per-category counters, and the ordered
/// diagnostics list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    /// ISO 8601 timestamp when the run started.
    pub started_at: String,
    /// ISO 8601 timestamp when the run ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
    /// Duration of the run in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Number of file paths present in the coverage model.
    pub files_in_report: u32,
    /// Number of files that produced measures.
    pub files_measured: u32,
    /// Number of files skipped because the project did not recognize them.
    pub files_unresolved: u32,
    /// Number of files skipped because their language did not match.
    pub files_language_skipped: u32,
    /// Number of measures saved to the sink.
    pub measures_saved: u32,
    /// Number of measures dropped (no integration-test variant).
    pub measures_dropped: u32,
    /// Diagnostics emitted during the run, in emission order.
    pub diagnostics: Vec<Diagnostic>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explain_returns_code_info() {
        let info = explain(CODE_UNRESOLVED_FILE).expect("code should exist");
        assert_eq!(info.code, CODE_UNRESOLVED_FILE);
        assert_eq!(info.name, "UnresolvedFile");
        assert!(explain("covimport.missing.code").is_none());
    }

    #[test]
    fn test_code_registry_contains_known_codes() {
        let codes: Vec<&str> = CODE_REGISTRY.iter().map(|c| c.code).collect();
        assert!(codes.contains(&CODE_UNRESOLVED_FILE));
        assert!(codes.contains(&CODE_NO_IT_VARIANT));
        assert!(codes.contains(&CODE_AGGREGATION_FAILED));
    }

    #[test]
    fn test_code_constants_match_pattern() {
        let code_re = regex_lite::Regex::new(r"^[a-z0-9_.]+$").unwrap();
        for entry in CODE_REGISTRY {
            assert!(code_re.is_match(entry.code));
        }
    }

    #[test]
    fn test_severity_serialization() {
        assert_eq!(serde_json::to_string(&Severity::Info).unwrap(), "\"info\"");
        assert_eq!(serde_json::to_string(&Severity::Warn).unwrap(), "\"warn\"");
        assert_eq!(
            serde_json::to_string(&Severity::Error).unwrap(),
            "\"error\""
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
    }

    #[test]
    fn test_metric_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&MetricKind::LinesToCover).unwrap(),
            "\"lines_to_cover\""
        );
        assert_eq!(
            serde_json::to_string(&MetricKind::ItCoveredConditionsByLine).unwrap(),
            "\"it_covered_conditions_by_line\""
        );
    }

    #[test]
    fn test_metric_kind_deserialization() {
        assert_eq!(
            serde_json::from_str::<MetricKind>("\"uncovered_conditions\"").unwrap(),
            MetricKind::UncoveredConditions
        );
        assert!(serde_json::from_str::<MetricKind>("\"not_a_metric\"").is_err());
    }

    #[test]
    fn test_metric_kind_key_matches_serde() {
        for kind in MetricKind::BASE.iter().chain(MetricKind::INTEGRATION.iter()) {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.key()));
        }
    }

    #[test]
    fn test_metric_kind_keys_are_distinct() {
        let mut keys: Vec<&str> = MetricKind::BASE
            .iter()
            .chain(MetricKind::INTEGRATION.iter())
            .map(MetricKind::key)
            .collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 14);
    }

    #[test]
    fn test_metric_kind_is_integration() {
        for kind in MetricKind::BASE {
            assert!(!kind.is_integration());
        }
        for kind in MetricKind::INTEGRATION {
            assert!(kind.is_integration());
        }
    }

    #[test]
    fn test_metric_kind_display() {
        assert_eq!(MetricKind::LineHitsData.to_string(), "line_hits_data");
    }

    #[test]
    fn test_measure_value_untagged_serialization() {
        let count = Measure::count(MetricKind::LinesToCover, 12);
        let json = serde_json::to_value(&count).unwrap();
        assert_eq!(json["kind"], "lines_to_cover");
        assert_eq!(json["value"], 12);

        let data = Measure::data(MetricKind::LineHitsData, "1=3;2=0");
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["value"], "1=3;2=0");
    }

    #[test]
    fn test_measure_value_accessors() {
        let count = MeasureValue::Count(7);
        assert_eq!(count.as_count(), Some(7));
        assert_eq!(count.as_data(), None);

        let data = MeasureValue::Data("1=1".to_string());
        assert_eq!(data.as_count(), None);
        assert_eq!(data.as_data(), Some("1=1"));
    }

    #[test]
    fn test_measure_roundtrip() {
        let measure = Measure::data(MetricKind::ConditionsByLine, "3=2");
        let json = serde_json::to_string(&measure).unwrap();
        let parsed: Measure = serde_json::from_str(&json).unwrap();
        assert_eq!(measure, parsed);
    }

    #[test]
    fn test_diagnostic_unresolved_file() {
        let diag = Diagnostic::unresolved_file("gen/Bundle.cs");
        assert_eq!(diag.severity, Severity::Info);
        assert_eq!(diag.code, CODE_UNRESOLVED_FILE);
        assert!(diag.message.contains("gen/Bundle.cs"));
        assert_eq!(diag.path.as_deref(), Some("gen/Bundle.cs"));
    }

    #[test]
    fn test_diagnostic_no_integration_variant() {
        let diag = Diagnostic::no_integration_variant(MetricKind::ItLinesToCover, "src/A.cs");
        assert_eq!(diag.severity, Severity::Warn);
        assert_eq!(diag.code, CODE_NO_IT_VARIANT);
        assert!(diag.message.contains("it_lines_to_cover"));
    }

    #[test]
    fn test_diagnostic_path_not_serialized_when_none() {
        let diag = Diagnostic {
            severity: Severity::Error,
            code: CODE_AGGREGATION_FAILED.to_string(),
            message: "aggregation failed".to_string(),
            path: None,
        };
        let json = serde_json::to_string(&diag).unwrap();
        assert!(!json.contains("path"));
    }

    #[test]
    fn test_import_summary_default() {
        let summary = ImportSummary::default();
        assert_eq!(summary.files_in_report, 0);
        assert_eq!(summary.measures_saved, 0);
        assert!(summary.diagnostics.is_empty());
        assert!(summary.ended_at.is_none());
    }

    #[test]
    fn test_import_summary_roundtrip() {
        let summary = ImportSummary {
            started_at: "2026-02-02T00:00:00Z".to_string(),
            ended_at: Some("2026-02-02T00:00:01Z".to_string()),
            duration_ms: Some(1000),
            files_in_report: 3,
            files_measured: 1,
            files_unresolved: 1,
            files_language_skipped: 1,
            measures_saved: 3,
            measures_dropped: 0,
            diagnostics: vec![Diagnostic::unresolved_file("b.vb")],
        };
        let json = serde_json::to_string(&summary).unwrap();
        let parsed: ImportSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.files_in_report, 3);
        assert_eq!(parsed.duration_ms, Some(1000));
        assert_eq!(parsed.diagnostics.len(), 1);
    }

    #[test]
    fn test_import_summary_optional_fields_not_serialized() {
        let summary = ImportSummary {
            started_at: "2026-02-02T00:00:00Z".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("ended_at"));
        assert!(!json.contains("duration_ms"));
    }
}
