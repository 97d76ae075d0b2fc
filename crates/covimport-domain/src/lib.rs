//! Pure domain logic for covimport.
//!
//! This crate implements the coverage-import core with no side effects:
//! the in-memory coverage model filled during aggregation, the derivation
//! of measures from that model, the fixed unit-to-integration-test metric
//! translation table, and report-path normalization.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use covimport_types::{Measure, MetricKind};

// ============================================================================
// Coverage Model
// ============================================================================

/// Per-line hit counts for one file, keyed by 1-based line number.
pub type LineHits = BTreeMap<u32, u32>;

/// Condition coverage for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineConditions {
    /// Number of conditions on the line.
    pub to_cover: u32,
    /// Number of those conditions covered by tests. Never exceeds `to_cover`.
    pub covered: u32,
}

#[derive(Debug, Clone, Default)]
struct FileCoverage {
    hits: LineHits,
    conditions: BTreeMap<u32, LineConditions>,
}

static EMPTY_HITS: LineHits = LineHits::new();
static EMPTY_CONDITIONS: BTreeMap<u32, LineConditions> = BTreeMap::new();

/// In-memory mapping from report file path to per-line coverage data.
///
/// The model is created empty at the start of an import run, mutated only by
/// the aggregation step, and read-only afterwards. A path appears at most
/// once; [`CoverageModel::file_paths`] yields paths in insertion order so a
/// run's output is deterministic.
#[derive(Debug, Clone, Default)]
pub struct CoverageModel {
    order: Vec<String>,
    files: HashMap<String, FileCoverage>,
}

impl CoverageModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate hits for a file and line.
    ///
    /// Repeated calls for the same file+line **sum** their hit counts; hit
    /// counts are cumulative across report fragments. Line numbers are
    /// 1-based; line 0 is not a line and is ignored.
    pub fn add_hit(&mut self, path: &str, line: u32, hits: u32) {
        if line == 0 {
            return;
        }
        let file = self.file_entry(path);
        let slot = file.hits.entry(line).or_insert(0);
        *slot = slot.saturating_add(hits);
    }

    /// Record condition coverage for a file and line.
    ///
    /// Repeated records for the same line merge by field-wise maximum, with
    /// `covered` clamped to `to_cover`, so reporting the same branch set
    /// twice does not double count. Line 0 is ignored.
    pub fn add_conditions(&mut self, path: &str, line: u32, to_cover: u32, covered: u32) {
        if line == 0 {
            return;
        }
        let file = self.file_entry(path);
        let entry = file.conditions.entry(line).or_default();
        entry.to_cover = entry.to_cover.max(to_cover);
        entry.covered = entry.covered.max(covered).min(entry.to_cover);
    }

    /// All file paths known to the model, in insertion order.
    ///
    /// The returned iterator is finite and restartable: calling this again
    /// yields the same sequence in the same order.
    pub fn file_paths(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Line hits for a path, or an empty mapping if the path is unknown.
    pub fn hits(&self, path: &str) -> &LineHits {
        self.files.get(path).map_or(&EMPTY_HITS, |f| &f.hits)
    }

    /// Condition coverage for a path, or an empty mapping if the path is
    /// unknown.
    pub fn conditions(&self, path: &str) -> &BTreeMap<u32, LineConditions> {
        self.files
            .get(path)
            .map_or(&EMPTY_CONDITIONS, |f| &f.conditions)
    }

    /// Number of file paths known to the model.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the model holds no files.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn file_entry(&mut self, path: &str) -> &mut FileCoverage {
        match self.files.entry(path.to_string()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                self.order.push(path.to_string());
                e.insert(FileCoverage::default())
            }
        }
    }
}

// ============================================================================
// Integration-Test Translation
// ============================================================================

const IT_TABLE: &[(MetricKind, MetricKind)] = &[
    (MetricKind::LinesToCover, MetricKind::ItLinesToCover),
    (MetricKind::UncoveredLines, MetricKind::ItUncoveredLines),
    (MetricKind::LineHitsData, MetricKind::ItLineHitsData),
    (MetricKind::ConditionsToCover, MetricKind::ItConditionsToCover),
    (
        MetricKind::UncoveredConditions,
        MetricKind::ItUncoveredConditions,
    ),
    (
        MetricKind::CoveredConditionsByLine,
        MetricKind::ItCoveredConditionsByLine,
    ),
    (MetricKind::ConditionsByLine, MetricKind::ItConditionsByLine),
];

/// Immutable lookup from base metric kinds to their integration-test
/// variants.
///
/// Covers exactly the seven base kinds. Any other kind (including the IT
/// kinds themselves) has no variant and yields `None`, an explicit
/// untranslatable signal the caller must handle; it is never a silent value
/// substitution.
#[derive(Debug, Clone)]
pub struct ItTranslation {
    table: &'static [(MetricKind, MetricKind)],
}

impl Default for ItTranslation {
    fn default() -> Self {
        Self { table: IT_TABLE }
    }
}

impl ItTranslation {
    /// Create the standard translation table covering the seven base kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a translation from a caller-supplied table.
    ///
    /// The standard table is almost always what you want; this exists so the
    /// lookup value stays an injected, replaceable collaborator.
    pub fn from_table(table: &'static [(MetricKind, MetricKind)]) -> Self {
        Self { table }
    }

    /// The integration-test variant of `kind`, or `None` when `kind` has no
    /// variant.
    pub fn integration_variant(&self, kind: MetricKind) -> Option<MetricKind> {
        self.table
            .iter()
            .find(|(base, _)| *base == kind)
            .map(|(_, it)| *it)
    }
}

/// Redirect a measure to its integration-test metric, preserving the value.
///
/// Returns `None` when the measure's kind has no integration-test variant;
/// callers decide whether to drop the measure or abort, based on that
/// explicit signal.
pub fn translate_for_integration(
    measure: &Measure,
    translation: &ItTranslation,
) -> Option<Measure> {
    translation
        .integration_variant(measure.kind)
        .map(|kind| Measure {
            kind,
            value: measure.value.clone(),
        })
}

// ============================================================================
// Measure Building
// ============================================================================

/// Build the derived measures for one file path in the model.
///
/// From line hits: `lines_to_cover`, `uncovered_lines`, and the
/// `line_hits_data` string. From condition coverage, when present:
/// `conditions_to_cover`, `uncovered_conditions`, and the per-line
/// `conditions_by_line` / `covered_conditions_by_line` strings. A path with
/// no data produces no measures.
pub fn build_measures(model: &CoverageModel, path: &str) -> Vec<Measure> {
    let hits = model.hits(path);
    let conditions = model.conditions(path);
    let mut measures = Vec::new();

    if !hits.is_empty() {
        let lines_to_cover = hits.len() as u64;
        let uncovered_lines = hits.values().filter(|h| **h == 0).count() as u64;
        measures.push(Measure::count(MetricKind::LinesToCover, lines_to_cover));
        measures.push(Measure::count(MetricKind::UncoveredLines, uncovered_lines));
        measures.push(Measure::data(
            MetricKind::LineHitsData,
            format_line_data(hits.iter().map(|(line, h)| (*line, *h))),
        ));
    }

    if !conditions.is_empty() {
        let to_cover: u64 = conditions.values().map(|c| u64::from(c.to_cover)).sum();
        let covered: u64 = conditions.values().map(|c| u64::from(c.covered)).sum();
        measures.push(Measure::count(MetricKind::ConditionsToCover, to_cover));
        measures.push(Measure::count(
            MetricKind::UncoveredConditions,
            to_cover - covered,
        ));
        measures.push(Measure::data(
            MetricKind::CoveredConditionsByLine,
            format_line_data(conditions.iter().map(|(line, c)| (*line, c.covered))),
        ));
        measures.push(Measure::data(
            MetricKind::ConditionsByLine,
            format_line_data(conditions.iter().map(|(line, c)| (*line, c.to_cover))),
        ));
    }

    measures
}

/// Format `line=value` pairs joined with `;`, in the iteration order of the
/// input (ascending line order for the model's maps).
///
/// # Examples
///
/// ```
/// use covimport_domain::format_line_data;
///
/// let data = format_line_data([(1, 3), (2, 0)].into_iter());
/// assert_eq!(data, "1=3;2=0");
/// ```
pub fn format_line_data(pairs: impl Iterator<Item = (u32, u32)>) -> String {
    let mut out = String::new();
    for (line, value) in pairs {
        if !out.is_empty() {
            out.push(';');
        }
        out.push_str(&line.to_string());
        out.push('=');
        out.push_str(&value.to_string());
    }
    out
}

// ============================================================================
// Path Normalization
// ============================================================================

/// Normalize a report file path for lookup against the project.
///
/// - Converts backslashes to forward slashes
/// - Removes leading `./`
/// - Strips common absolute path prefixes when a source directory marker is
///   found
///
/// # Examples
///
/// ```
/// use covimport_domain::normalize_path;
///
/// assert_eq!(normalize_path("src/Calculator.cs"), "src/Calculator.cs");
/// assert_eq!(normalize_path("./src/Calculator.cs"), "src/Calculator.cs");
/// assert_eq!(normalize_path("src\\Calculator.cs"), "src/Calculator.cs");
/// ```
pub fn normalize_path(path: &str) -> String {
    normalize_path_with_strip(path, &[])
}

/// Normalize a report file path with optional prefix stripping.
pub fn normalize_path_with_strip(path: &str, strip_prefixes: &[String]) -> String {
    let mut normalized = path.replace('\\', "/");

    // Apply configured prefix strips (normalized to forward slashes)
    for prefix in strip_prefixes {
        let prefix_norm = prefix.replace('\\', "/");
        if normalized.starts_with(&prefix_norm) {
            normalized = normalized[prefix_norm.len()..].to_string();
            break;
        }
    }

    // Remove leading ./
    while normalized.starts_with("./") {
        normalized = normalized[2..].to_string();
    }

    // Strip /home/user/project/ style prefixes by finding the last occurrence
    // of common source directory markers
    if normalized.starts_with('/') {
        for marker in &["/src/", "/lib/", "/test/", "/tests/"] {
            if let Some(pos) = normalized.find(marker) {
                normalized = normalized[pos + 1..].to_string();
                break;
            }
        }
    }

    // Windows-style absolute paths (C:/...)
    if normalized.len() > 2 && normalized.chars().nth(1) == Some(':') {
        for marker in &["/src/", "/lib/", "/test/", "/tests/"] {
            if let Some(pos) = normalized.find(marker) {
                normalized = normalized[pos + 1..].to_string();
                break;
            }
        }
    }

    normalized
}

// ============================================================================
// Tests
// ============================================================================


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use covimport_types::MeasureValue;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn add_hit_sums_repeated_records(line in 1u32..1000, counts in proptest::collection::vec(0u32..100, 1..10)) {
            let mut model = CoverageModel::new();
            for count in &counts {
                model.add_hit("a.cs", line, *count);
            }
            let expected: u32 = counts.iter().sum();
            prop_assert_eq!(model.hits("a.cs").get(&line), Some(&expected));
        }

        #[test]
        fn uncovered_never_exceeds_lines_to_cover(hits in proptest::collection::btree_map(1u32..500, 0u32..5, 0..50)) {
            let mut model = CoverageModel::new();
            for (line, count) in &hits {
                model.add_hit("a.cs", *line, *count);
            }
            let measures = build_measures(&model, "a.cs");
            let lines = measures.iter().find(|m| m.kind == MetricKind::LinesToCover);
            let uncovered = measures.iter().find(|m| m.kind == MetricKind::UncoveredLines);
            if let (Some(lines), Some(uncovered)) = (lines, uncovered) {
                prop_assert!(uncovered.value.as_count() <= lines.value.as_count());
            } else {
                prop_assert!(hits.is_empty());
            }
        }

        #[test]
        fn covered_conditions_never_exceed_conditions(
            line in 1u32..500,
            to_cover in 0u32..10,
            covered in 0u32..20,
        ) {
            let mut model = CoverageModel::new();
            model.add_conditions("a.cs", line, to_cover, covered);
            if let Some(merged) = model.conditions("a.cs").get(&line) {
                prop_assert!(merged.covered <= merged.to_cover);
            }
        }

        #[test]
        fn translation_preserves_count_values(value in 0u64..10_000) {
            let translation = ItTranslation::new();
            for kind in MetricKind::BASE {
                let measure = Measure::count(kind, value);
                let translated = translate_for_integration(&measure, &translation)
                    .expect("base kinds always translate");
                prop_assert_eq!(translated.value, MeasureValue::Count(value));
                prop_assert!(translated.kind.is_integration());
            }
        }
    }
}
