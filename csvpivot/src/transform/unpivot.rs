//! Column-to-row reshape, the inverse of the pivot.
//!
//! ```text
//! state,pop2000,pop2010             state,year,population
//! WA,100,120                  →     WA,pop2000,100
//!                                   WA,pop2010,120
//! ```
//!
//! Stateless per row: each input row fans out into one output row per
//! selected column, so memory stays constant.

use serde::{Deserialize, Serialize};

use super::columns::{cell_at, ColumnIndex};
use super::pipeline::{capped, skip_rows, CappedSink, RunSummary};
use crate::error::{ConfigError, ConfigResult, CsvResult, TransformResult};
use crate::logs::{log_info, log_success, log_warning};
use crate::parser::{Row, RowSink};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct UnpivotOptions {
    /// Output column receiving the selected column's header text
    pub name_column: String,

    /// Output column receiving the selected column's cell
    pub value_column: String,

    /// Input columns turned into rows; `*` allowed
    pub columns: Vec<String>,

    /// Rows skipped after the header
    pub row_offset: usize,

    /// Maximum number of data rows read after the offset
    pub input_row_cap: Option<usize>,

    /// Maximum number of data rows written
    pub output_row_cap: Option<usize>,
}

impl UnpivotOptions {
    pub fn new(name_column: impl Into<String>, value_column: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name_column: name_column.into(),
            value_column: value_column.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_row_offset(mut self, offset: usize) -> Self {
        self.row_offset = offset;
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

    pub fn validate(&self) -> ConfigResult<()> {
        if self.name_column.trim().is_empty() {
            return Err(ConfigError::MissingOption("name column"));
        }
        if self.value_column.trim().is_empty() {
            return Err(ConfigError::MissingOption("value column"));
        }
        if self.columns.iter().all(|c| c.trim().is_empty()) {
            return Err(ConfigError::MissingOption("column list"));
        }
        Ok(())
    }
}

/// Which input positions are copied and which become rows.
#[derive(Debug, Clone)]
pub struct UnpivotLayout {
    copied: Vec<usize>,
    selected: Vec<(usize, String)>,
}

impl UnpivotLayout {
    pub fn resolve(header: &[Option<String>], options: &UnpivotOptions) -> Self {
        let index = ColumnIndex::from_header(header);
        let selection = index.expand_wildcard(&options.columns, &[] as &[&str]);

        let mut is_selected = vec![false; index.len()];
        for name in &selection {
            match index.position(name) {
                Some(pos) => is_selected[pos] = true,
                None => log_warning(format!("column '{}' not found; skipped", name)),
            }
        }

        let mut copied = Vec::new();
        let mut selected = Vec::new();
        for (pos, name) in index.names().iter().enumerate() {
            if is_selected[pos] {
                selected.push((pos, name.clone()));
            } else {
                copied.push(pos);
            }
        }

        log_info(format!(
            "Unpivot: {} columns copied, {} columns to rows",
            copied.len(),
            selected.len()
        ));
        Self { copied, selected }
    }

    pub fn output_header(&self, header: &[Option<String>], options: &UnpivotOptions) -> Row {
        let mut out: Row = self.copied.iter().map(|&p| header[p].clone()).collect();
        out.push(Some(options.name_column.clone()));
        out.push(Some(options.value_column.clone()));
        out
    }

    /// One output row per selected column, in header order.
    pub fn expand<'a>(&'a self, row: &'a [Option<String>]) -> impl Iterator<Item = Row> + 'a {
        let copied: Vec<Option<String>> = self
            .copied
            .iter()
            .map(|&p| cell_at(row, Some(p)).map(str::to_string))
            .collect();
        self.selected.iter().map(move |(pos, name)| {
            let mut out = copied.clone();
            out.push(Some(name.clone()));
            out.push(cell_at(row, Some(*pos)).map(str::to_string));
            out
        })
    }
}

/// Turn the selected columns of every row into (name, value) rows.
pub fn unpivot<I, S>(rows: I, options: &UnpivotOptions, sink: &mut S) -> TransformResult<RunSummary>
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
            sink.finish()?;
            return Ok(summary);
        }
    };
    let layout = UnpivotLayout::resolve(&header, options);

    let mut out = CappedSink::new(sink, options.output_row_cap);
    out.write_header(&layout.output_header(&header, options))?;

    skip_rows(&mut rows, options.row_offset)?;
    'rows: for row in capped(rows, options.input_row_cap) {
        let row = row?;
        summary.rows_read += 1;
        for out_row in layout.expand(&row) {
            if !out.write_row(&out_row)? {
                break 'rows;
            }
        }
    }

    summary.rows_written = out.finish()?;
    log_success(format!("Wrote {} rows", summary.rows_written));
    Ok(summary)
}
