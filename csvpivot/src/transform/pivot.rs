//! Row-to-column pivot, buffered mode.
//!
//! ```text
//! state,year,population            state,2000_population,2010_population
//! WA,2000,100                 →    WA,100,120
//! WA,2010,120                      OR,80,
//! OR,2000,80
//! ```
//!
//! The output header depends on every name value in the stream, so no
//! output row can be written before the input is exhausted. Memory grows
//! with distinct group keys × distinct name values × expansion columns.
//! See [`super::stream`] for the ordered, bounded-memory alternative.
//!
//! Output rows follow the first occurrence of each group key in the input.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::columns::{cell_at, parse_column_list, ColumnIndex, ColumnRoles};
use super::grouper::{GroupKey, GroupKeyExtractor};
use super::pipeline::{capped, CappedSink, RunSummary};
use super::vocabulary::{name_value, NameCollector, Vocabulary};
use crate::error::{ConfigError, ConfigResult, CsvResult, TransformResult};
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::parser::{Row, RowSink};

/// Default template for expanded column names: `{0}` = name value, `{1}` = expansion column.
pub const DEFAULT_COLUMN_FORMAT: &str = "{0}_{1}";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([01])\}").expect("placeholder pattern is valid"));

// =============================================================================
// Options
// =============================================================================

/// Options shared by both pivot modes.
///
/// Deserializable from JSON with the same kebab-case names as the
/// command-line flags, e.g. `{"name-column": "year", "group-columns": ["state"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PivotOptions {
    /// Column whose distinct values become new columns
    pub name_column: String,

    /// Columns identifying an output row; inferred when `None`
    pub group_columns: Option<Vec<String>>,

    /// Columns whose values are spread across the new columns; inferred when `None`
    pub expand_columns: Option<Vec<String>>,

    /// Template for new column names
    pub column_format: String,

    /// Compare group values case-insensitively (output keys are uppercased)
    pub ignore_case: bool,

    /// Name the first expansion column exactly as the name value
    pub first_column_unsuffixed: bool,

    /// Maximum number of data rows read
    pub input_row_cap: Option<usize>,

    /// Maximum number of data rows written; the header is always written
    pub output_row_cap: Option<usize>,

    /// Ordered mode only: rows scanned to discover name values (`None` = all)
    pub vocabulary_rows: Option<usize>,
}

impl Default for PivotOptions {
    fn default() -> Self {
        Self {
            name_column: String::new(),
            group_columns: None,
            expand_columns: None,
            column_format: DEFAULT_COLUMN_FORMAT.to_string(),
            ignore_case: false,
            first_column_unsuffixed: false,
            input_row_cap: None,
            output_row_cap: None,
            vocabulary_rows: None,
        }
    }
}

fn owned(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

impl PivotOptions {
    pub fn new(name_column: impl Into<String>) -> Self {
        Self {
            name_column: name_column.into(),
            ..Self::default()
        }
    }

    pub fn with_group_columns(mut self, columns: &[&str]) -> Self {
        self.group_columns = Some(owned(columns));
        self
    }

    pub fn with_expand_columns(mut self, columns: &[&str]) -> Self {
        self.expand_columns = Some(owned(columns));
        self
    }

    pub fn with_column_format(mut self, template: impl Into<String>) -> Self {
        self.column_format = template.into();
        self
    }

    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    pub fn first_column_unsuffixed(mut self) -> Self {
        self.first_column_unsuffixed = true;
        self
    }

    pub fn with_input_row_cap(mut self, cap: usize) -> Self {
        self.input_row_cap = Some(cap);
        self
    }

    pub fn with_output_row_cap(mut self, cap: usize) -> Self {
        self.output_row_cap = Some(cap);
        self
    }

    pub fn with_vocabulary_rows(mut self, rows: usize) -> Self {
        self.vocabulary_rows = Some(rows);
        self
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations that cannot run, before any input is read.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name_column.trim().is_empty() {
            return Err(ConfigError::MissingNameColumn);
        }
        if self.group_columns.is_none() && self.expand_columns.is_none() {
            return Err(ConfigError::MissingColumnRoles);
        }
        Ok(())
    }
}

// =============================================================================
// Column naming
// =============================================================================

/// Synthesizes expanded column names from the template.
#[derive(Debug, Clone)]
pub struct ColumnNamer {
    template: String,
    first_unsuffixed: bool,
}

impl ColumnNamer {
    pub fn new(template: impl Into<String>, first_unsuffixed: bool) -> Self {
        Self {
            template: template.into(),
            first_unsuffixed,
        }
    }

    pub fn from_options(options: &PivotOptions) -> Self {
        Self::new(options.column_format.clone(), options.first_column_unsuffixed)
    }

    /// Name of the column holding expansion column `expand_index` for `name_value`.
    ///
    /// Placeholders are substituted in one pass, so braces inside the
    /// substituted values are left alone.
    pub fn name(&self, name_value: &str, expand_index: usize, expand_name: &str) -> String {
        if expand_index == 0 && self.first_unsuffixed {
            return name_value.to_string();
        }
        PLACEHOLDER
            .replace_all(&self.template, |caps: &Captures| match &caps[1] {
                "0" => name_value.to_string(),
                _ => expand_name.to_string(),
            })
            .into_owned()
    }
}

// =============================================================================
// Layout
// =============================================================================

/// List entries may themselves be comma-separated (`["state,county"]`).
fn split_entries(list: Option<&[String]>) -> Option<Vec<String>> {
    list.map(|entries| entries.iter().flat_map(|e| parse_column_list(e)).collect())
}

/// Expansion values captured for each name value within one group.
/// A later row with the same name value replaces the earlier one.
pub type GroupAttributes = HashMap<String, Vec<Option<String>>>;

/// Column roles and positions resolved once from the header.
#[derive(Debug, Clone)]
pub struct PivotLayout {
    roles: ColumnRoles,
    name_position: Option<usize>,
    keys: GroupKeyExtractor,
    expand_positions: Vec<Option<usize>>,
}

impl PivotLayout {
    pub fn resolve(header: &[Option<String>], options: &PivotOptions) -> Self {
        let index = ColumnIndex::from_header(header);
        let group = split_entries(options.group_columns.as_deref());
        let expand = split_entries(options.expand_columns.as_deref());
        let roles = ColumnRoles::infer(&index, &options.name_column, group.as_deref(), expand.as_deref());

        let name_position = index.position(&options.name_column);
        if name_position.is_none() {
            log_warning(format!(
                "name column '{}' not found; no columns will be expanded",
                options.name_column
            ));
        }
        let group_positions = index.positions(&roles.group);
        let expand_positions = index.positions(&roles.expand);

        log_info(format!("Name column: {}", options.name_column));
        log_info_indent(format!("group by: {}", roles.group.join(", ")), 1);
        log_info_indent(format!("expand: {}", roles.expand.join(", ")), 1);

        Self {
            roles,
            name_position,
            keys: GroupKeyExtractor::new(group_positions, options.ignore_case),
            expand_positions,
        }
    }

    pub fn roles(&self) -> &ColumnRoles {
        &self.roles
    }

    pub fn name_position(&self) -> Option<usize> {
        self.name_position
    }

    pub fn group_key(&self, row: &[Option<String>]) -> GroupKey {
        self.keys.key(row)
    }

    pub fn name_value(&self, row: &[Option<String>]) -> String {
        name_value(row, self.name_position)
    }

    pub fn expansion_values(&self, row: &[Option<String>]) -> Vec<Option<String>> {
        self.expand_positions
            .iter()
            .map(|&pos| cell_at(row, pos).map(str::to_string))
            .collect()
    }

    /// Cells per output row: group columns + name values × expansion columns.
    pub fn output_width(&self, vocabulary: &Vocabulary) -> usize {
        self.roles.group.len() + vocabulary.len() * self.roles.expand.len()
    }

    /// Group column names, then one synthesized name per (name value, expansion column).
    pub fn output_header(&self, vocabulary: &Vocabulary, namer: &ColumnNamer) -> Row {
        let mut header: Row = Vec::with_capacity(self.output_width(vocabulary));
        header.extend(self.roles.group.iter().cloned().map(Some));
        for value in vocabulary {
            for (i, expand_name) in self.roles.expand.iter().enumerate() {
                header.push(Some(namer.name(value, i, expand_name)));
            }
        }
        header
    }

    /// One output row: key values, then recorded values (or null) per name value.
    pub fn assemble(&self, key: GroupKey, attributes: &GroupAttributes, vocabulary: &Vocabulary) -> Row {
        let width = self.output_width(vocabulary);
        let mut row = key.into_row();
        row.reserve(width.saturating_sub(row.len()));
        for value in vocabulary {
            let recorded = attributes.get(value.as_str());
            for i in 0..self.expand_positions.len() {
                row.push(recorded.and_then(|cells| cells.get(i).cloned().flatten()));
            }
        }
        row
    }
}

// =============================================================================
// Buffered assembly
// =============================================================================

/// Pivot a whole stream. The first row is the header.
///
/// Every data row is folded into two accumulators in a single read: the
/// name-value counts and the per-group attribute maps. Rows are then
/// emitted per distinct group key, in first-seen order, up to the output cap.
pub fn pivot_buffered<I, S>(rows: I, options: &PivotOptions, sink: &mut S) -> TransformResult<RunSummary>
where
    I: IntoIterator<Item = CsvResult<Row>>,
    S: RowSink + ?Sized,
{
    options.validate()?;
    let mut rows = rows.into_iter();
    let mut summary = RunSummary::default();

    let header = match rows.next() {
        Some(header) => header?,
        None => {
            log_warning("input is empty; nothing to pivot");
            sink.finish()?;
            return Ok(summary);
        }
    };
    let layout = PivotLayout::resolve(&header, options);

    let mut names = NameCollector::new(layout.name_position());
    let mut groups: IndexMap<GroupKey, GroupAttributes> = IndexMap::new();
    for row in capped(rows, options.input_row_cap) {
        let row = row?;
        summary.rows_read += 1;
        names.observe(&row);
        groups
            .entry(layout.group_key(&row))
            .or_default()
            .insert(layout.name_value(&row), layout.expansion_values(&row));
    }

    let vocabulary = names.into_vocabulary();
    summary.vocabulary = vocabulary.len();
    summary.groups = groups.len();
    log_info(format!(
        "Read {} rows: {} groups, {} name values",
        summary.rows_read, summary.groups, summary.vocabulary
    ));

    let namer = ColumnNamer::from_options(options);
    let mut out = CappedSink::new(sink, options.output_row_cap);
    out.write_header(&layout.output_header(&vocabulary, &namer))?;
    for (key, attributes) in groups {
        if !out.write_row(&layout.assemble(key, &attributes, &vocabulary))? {
            break;
        }
    }
    summary.rows_written = out.finish()?;
    log_success(format!("Wrote {} rows", summary.rows_written));

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{row_of, VecSink};

    fn input(lines: &[&[&str]]) -> Vec<CsvResult<Row>> {
        lines.iter().map(|l| Ok(row_of(*l))).collect()
    }

    fn cells(values: &[Option<&str>]) -> Row {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    fn population() -> Vec<CsvResult<Row>> {
        input(&[
            &["state", "year", "population"],
            &["WA", "2000", "100"],
            &["WA", "2010", "120"],
            &["OR", "2000", "80"],
        ])
    }

    #[test]
    fn test_pivot_by_group_column() {
        let options = PivotOptions::new("year").with_group_columns(&["state"]);
        let mut sink = VecSink::new();
        let summary = pivot_buffered(population(), &options, &mut sink).unwrap();

        assert_eq!(sink.header(), Some(&row_of(&["state", "2000_population", "2010_population"])));
        assert_eq!(
            sink.data(),
            &[
                cells(&[Some("WA"), Some("100"), Some("120")]),
                cells(&[Some("OR"), Some("80"), None]),
            ]
        );
        assert_eq!(summary.groups, 2);
        assert_eq!(summary.vocabulary, 2);
        assert_eq!(summary.rows_read, 3);
    }

    #[test]
    fn test_pivot_by_expand_column_infers_groups() {
        let options = PivotOptions::new("YEAR").with_expand_columns(&["population"]);
        let mut sink = VecSink::new();
        pivot_buffered(population(), &options, &mut sink).unwrap();
        assert_eq!(sink.header(), Some(&row_of(&["state", "2000_population", "2010_population"])));
        assert_eq!(sink.data().len(), 2);
    }

    #[test]
    fn test_last_write_wins() {
        let rows = input(&[
            &["state", "year", "population"],
            &["WA", "2000", "100"],
            &["WA", "2000", "999"],
        ]);
        let options = PivotOptions::new("year").with_group_columns(&["state"]);
        let mut sink = VecSink::new();
        pivot_buffered(rows, &options, &mut sink).unwrap();
        assert_eq!(sink.data(), &[row_of(&["WA", "999"])]);
    }

    #[test]
    fn test_missing_name_column_keeps_group_columns() {
        let options = PivotOptions::new("decade").with_group_columns(&["state"]);
        let mut sink = VecSink::new();
        pivot_buffered(population(), &options, &mut sink).unwrap();
        assert_eq!(sink.header(), Some(&row_of(&["state"])));
        assert_eq!(sink.data(), &[row_of(&["WA"]), row_of(&["OR"])]);
    }

    #[test]
    fn test_first_column_unsuffixed() {
        let options = PivotOptions::new("year")
            .with_group_columns(&["state"])
            .first_column_unsuffixed();
        let mut sink = VecSink::new();
        pivot_buffered(population(), &options, &mut sink).unwrap();
        assert_eq!(sink.header(), Some(&row_of(&["state", "2000", "2010"])));
    }

    #[test]
    fn test_custom_column_format() {
        let options = PivotOptions::new("year")
            .with_group_columns(&["state"])
            .with_column_format("{1} in {0}");
        let mut sink = VecSink::new();
        pivot_buffered(population(), &options, &mut sink).unwrap();
        assert_eq!(
            sink.header(),
            Some(&row_of(&["state", "population in 2000", "population in 2010"]))
        );
    }

    #[test]
    fn test_output_cap_keeps_full_header() {
        let rows = input(&[
            &["k", "n", "v"],
            &["a", "x", "1"],
            &["b", "x", "2"],
            &["c", "y", "3"],
        ]);
        let options = PivotOptions::new("n").with_group_columns(&["k"]).with_output_row_cap(1);
        let mut sink = VecSink::new();
        let summary = pivot_buffered(rows, &options, &mut sink).unwrap();
        assert_eq!(sink.header(), Some(&row_of(&["k", "x_v", "y_v"])));
        assert_eq!(sink.data().len(), 1);
        assert_eq!(summary.groups, 3);
        assert_eq!(summary.rows_written, 2);
    }

    #[test]
    fn test_input_cap_limits_rows_read() {
        let options = PivotOptions::new("year")
            .with_group_columns(&["state"])
            .with_input_row_cap(1);
        let mut sink = VecSink::new();
        pivot_buffered(population(), &options, &mut sink).unwrap();
        assert_eq!(sink.header(), Some(&row_of(&["state", "2000_population"])));
        assert_eq!(sink.data(), &[row_of(&["WA", "100"])]);
    }

    #[test]
    fn test_ignore_case_merges_groups() {
        let rows = input(&[
            &["state", "year", "population"],
            &["wa", "2000", "100"],
            &["WA", "2010", "120"],
        ]);
        let options = PivotOptions::new("year").with_group_columns(&["state"]).ignore_case();
        let mut sink = VecSink::new();
        pivot_buffered(rows, &options, &mut sink).unwrap();
        assert_eq!(sink.data(), &[row_of(&["WA", "100", "120"])]);
    }

    #[test]
    fn test_every_row_has_full_width() {
        let rows = input(&[
            &["id", "attr", "value", "unit"],
            &["1", "h", "10", "cm"],
            &["1", "w"],
            &["2", "d", "3", "m"],
        ]);
        let options = PivotOptions::new("attr").with_group_columns(&["id"]);
        let mut sink = VecSink::new();
        pivot_buffered(rows, &options, &mut sink).unwrap();
        let width = 1 + 3 * 2;
        assert!(sink.rows.iter().all(|r| r.len() == width));
    }

    #[test]
    fn test_comma_separated_entries_are_split() {
        let options = PivotOptions::new("year").with_group_columns(&["state,county"]);
        let mut sink = VecSink::new();
        pivot_buffered(population(), &options, &mut sink).unwrap();
        assert_eq!(sink.header().map(|h| h[1].clone()), Some(Some("county".to_string())));
    }

    #[test]
    fn test_unresolved_group_column_is_null() {
        let options = PivotOptions::new("year").with_group_columns(&["state", "county"]);
        let mut sink = VecSink::new();
        pivot_buffered(population(), &options, &mut sink).unwrap();
        assert_eq!(sink.header().map(|h| h.len()), Some(2 + 2));
        assert_eq!(sink.data()[0][1], None);
    }

    #[test]
    fn test_empty_input_writes_nothing() {
        let options = PivotOptions::new("year").with_group_columns(&["state"]);
        let mut sink = VecSink::new();
        let summary = pivot_buffered(Vec::new(), &options, &mut sink).unwrap();
        assert!(sink.rows.is_empty());
        assert_eq!(summary, RunSummary::default());
    }

    #[test]
    fn test_invalid_options_rejected_before_reading() {
        let options = PivotOptions::new("year");
        let mut sink = VecSink::new();
        let err = pivot_buffered(population(), &options, &mut sink).unwrap_err();
        assert!(matches!(
            err,
            crate::error::TransformError::Config(ConfigError::MissingColumnRoles)
        ));
        assert!(sink.rows.is_empty());
    }

    #[test]
    fn test_namer_single_pass_substitution() {
        let namer = ColumnNamer::new("{0}:{1}", false);
        assert_eq!(namer.name("{1}", 0, "pop"), "{1}:pop");
        let namer = ColumnNamer::new("{0}_{1}", true);
        assert_eq!(namer.name("2000", 0, "pop"), "2000");
        assert_eq!(namer.name("2000", 1, "area"), "2000_area");
    }

    #[test]
    fn test_options_from_json() {
        let options = PivotOptions::from_json(
            r#"{"name-column": "year", "group-columns": ["state"], "ignore-case": true}"#,
        )
        .unwrap();
        assert_eq!(options.name_column, "year");
        assert_eq!(options.group_columns, Some(vec!["state".to_string()]));
        assert!(options.ignore_case);
        assert_eq!(options.column_format, DEFAULT_COLUMN_FORMAT);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_unknown_option_key_rejected() {
        let result = PivotOptions::from_json(r#"{"name-column": "year", "ignore_case": true}"#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_options_validation() {
        assert!(matches!(
            PivotOptions::default().validate(),
            Err(ConfigError::MissingNameColumn)
        ));
        assert!(PivotOptions::new("n").with_expand_columns(&["v"]).validate().is_ok());
    }
}
