//! Merge several header rows into one.
//!
//! ```text
//! Population,,Area                  Population 2000,Population 2010,Area km2
//! 2000,2010,km2               →     ...
//! ```
//!
//! A blank cell under a spanning title inherits the title from its left,
//! but only while its own column has no name yet.

use serde::{Deserialize, Serialize};

use super::pipeline::{capped, skip_rows, CappedSink, RunSummary};
use crate::error::{ConfigError, ConfigResult, CsvResult, TransformResult};
use crate::logs::{log_info, log_success};
use crate::parser::{Row, RowSink};

pub const DEFAULT_HEAD_ROWS: usize = 2;
pub const DEFAULT_JOIN: &str = " ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HeadMergeOptions {
    /// Number of header rows merged into one
    pub head_rows: usize,

    /// Inserted between the parts of a merged name
    pub join: String,

    /// Rows skipped before the header rows
    pub row_offset: usize,

    /// Maximum number of rows read after the offset, header rows included
    pub input_row_cap: Option<usize>,

    /// Maximum number of rows written, merged header included
    pub output_row_cap: Option<usize>,
}

impl Default for HeadMergeOptions {
    fn default() -> Self {
        Self {
            head_rows: DEFAULT_HEAD_ROWS,
            join: DEFAULT_JOIN.to_string(),
            row_offset: 0,
            input_row_cap: None,
            output_row_cap: None,
        }
    }
}

impl HeadMergeOptions {
    pub fn with_head_rows(mut self, rows: usize) -> Self {
        self.head_rows = rows;
        self
    }

    pub fn with_join(mut self, join: impl Into<String>) -> Self {
        self.join = join.into();
        self
    }

    pub fn with_row_offset(mut self, offset: usize) -> Self {
        self.row_offset = offset;
        self
    }

    pub fn with_output_row_cap(mut self, cap: usize) -> Self {
        self.output_row_cap = Some(cap);
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.head_rows == 0 {
            return Err(ConfigError::InvalidRowCount("head rows must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn is_blank(cell: &Option<String>) -> bool {
    cell.as_deref().map_or(true, str::is_empty)
}

/// Fold one header row into the accumulated names.
pub fn merge_header_row(merged: &mut Row, row: &[Option<String>], join: &str) {
    let mut previous: Option<String> = None;
    for (pos, cell) in row.iter().enumerate() {
        let mut cell = cell.as_deref().map(|c| c.trim().to_string());
        let existing_blank = merged.get(pos).map_or(true, is_blank);

        if !is_blank(&cell) {
            previous = cell.clone();
        } else if existing_blank {
            cell = previous.clone();
        }

        if pos >= merged.len() {
            merged.push(cell);
        } else if existing_blank {
            merged[pos] = cell;
        } else if let (Some(name), Some(part)) = (merged[pos].as_mut(), cell.filter(|c| !c.is_empty())) {
            name.push_str(join);
            name.push_str(&part);
        }
    }
}

/// Merge `rows` top to bottom into a single header.
pub fn merge_header_rows(rows: &[Row], join: &str) -> Row {
    let mut merged = Row::new();
    for row in rows {
        merge_header_row(&mut merged, row, join);
    }
    merged
}

/// Replace the first `head_rows` rows (after the offset) with their merge;
/// copy the rest unchanged.
pub fn headmerge<I, S>(rows: I, options: &HeadMergeOptions, sink: &mut S) -> TransformResult<RunSummary>
where
    I: IntoIterator<Item = CsvResult<Row>>,
    S: RowSink + ?Sized,
{
    options.validate()?;
    let mut summary = RunSummary::default();
    let mut rows = rows.into_iter();
    skip_rows(&mut rows, options.row_offset)?;
    let mut rows = capped(rows, options.input_row_cap);

    let mut merged = Row::new();
    let mut head_count = 0;
    while head_count < options.head_rows {
        match rows.next() {
            Some(row) => {
                merge_header_row(&mut merged, &row?, &options.join);
                head_count += 1;
            }
            None => break,
        }
    }
    summary.rows_read = head_count;
    log_info(format!("Merged {} header rows into {} columns", head_count, merged.len()));

    // The merged header is always written and takes one slot of the cap.
    let data_cap = options.output_row_cap.map(|cap| cap.saturating_sub(1));
    let mut out = CappedSink::new(sink, data_cap);
    if head_count > 0 {
        out.write_header(&merged)?;
        for row in rows {
            let row = row?;
            summary.rows_read += 1;
            if !out.write_row(&row)? {
                break;
            }
        }
    }

    summary.rows_written = out.finish()?;
    log_success(format!("Wrote {} rows", summary.rows_written));
    Ok(summary)
}
