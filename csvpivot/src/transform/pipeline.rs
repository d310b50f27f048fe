//! High-level entry points: options in, rows through, summary out.
//!
//! ```rust,ignore
//! use csvpivot::{IoOptions, Job, PivotOptions};
//!
//! let options = PivotOptions::new("year").with_group_columns(&["state"]);
//! let summary = Job::Row2Col(options).run(&IoOptions::default())?;
//! eprintln!("{} groups", summary.groups);
//! ```
//!
//! Each `run_*` function takes any iterator of rows (a [`RowReader`] or an
//! in-memory vector) and any [`RowSink`]. [`Job::run`] adds the file and
//! stdio plumbing used by the command line.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use super::headmerge::{headmerge, HeadMergeOptions};
use super::pivot::{pivot_buffered, PivotOptions};
use super::stream::pivot_sorted;
use super::unpivot::{unpivot, UnpivotOptions};
use crate::error::{ConfigError, ConfigResult, CsvResult, TransformResult};
use crate::logs::log_info;
use crate::parser::{open_input, CsvSink, Dialect, Row, RowReader, RowSink};

// =============================================================================
// Summary and caps
// =============================================================================

/// Counters reported after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Data rows consumed (header and skipped rows excluded)
    pub rows_read: usize,

    /// Rows written, header included
    pub rows_written: usize,

    /// Distinct group keys (pivot only)
    pub groups: usize,

    /// Distinct name values (pivot only)
    pub vocabulary: usize,
}

/// Row count argument: a number, or `ALL` for no limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCap(pub Option<usize>);

impl RowCap {
    pub const ALL: RowCap = RowCap(None);
}

impl FromStr for RowCap {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(RowCap::ALL);
        }
        s.parse::<usize>()
            .map(|n| RowCap(Some(n)))
            .map_err(|_| ConfigError::InvalidRowCount(s.to_string()))
    }
}

/// At most `cap` items of `rows` (`None` = all).
pub(crate) fn capped<I: Iterator>(rows: I, cap: Option<usize>) -> std::iter::Take<I> {
    rows.take(cap.unwrap_or(usize::MAX))
}

/// Consume up to `count` rows, surfacing any read error among them.
/// Returns how many rows were skipped.
pub(crate) fn skip_rows<I>(rows: &mut I, count: usize) -> CsvResult<usize>
where
    I: Iterator<Item = CsvResult<Row>>,
{
    let mut skipped = 0;
    while skipped < count {
        match rows.next() {
            Some(row) => {
                row?;
                skipped += 1;
            }
            None => break,
        }
    }
    Ok(skipped)
}

/// Sink wrapper enforcing an output row cap on data rows.
pub(crate) struct CappedSink<'a, S: RowSink + ?Sized> {
    sink: &'a mut S,
    cap: Option<usize>,
    accepted: usize,
    written: usize,
}

impl<'a, S: RowSink + ?Sized> CappedSink<'a, S> {
    pub(crate) fn new(sink: &'a mut S, cap: Option<usize>) -> Self {
        Self {
            sink,
            cap,
            accepted: 0,
            written: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.cap.map_or(false, |max| self.accepted >= max)
    }

    /// Written regardless of the cap.
    pub(crate) fn write_header(&mut self, row: &[Option<String>]) -> CsvResult<()> {
        self.sink.write_row(row)?;
        self.written += 1;
        Ok(())
    }

    /// Write `row` if the cap allows it. Returns false once no further row
    /// will be accepted, so callers can stop producing.
    pub(crate) fn write_row(&mut self, row: &[Option<String>]) -> CsvResult<bool> {
        if self.is_full() {
            return Ok(false);
        }
        self.sink.write_row(row)?;
        self.accepted += 1;
        self.written += 1;
        Ok(!self.is_full())
    }

    /// Finish the underlying sink; returns the number of rows written.
    pub(crate) fn finish(self) -> CsvResult<usize> {
        self.sink.finish()?;
        Ok(self.written)
    }
}

// =============================================================================
// Entry points over rows
// =============================================================================

/// Buffered row-to-column pivot.
pub fn run_row2col<I, S>(rows: I, options: &PivotOptions, sink: &mut S) -> TransformResult<RunSummary>
where
    I: IntoIterator<Item = CsvResult<Row>>,
    S: RowSink + ?Sized,
{
    log_info("Pivoting rows to columns (buffered)");
    pivot_buffered(rows, options, sink)
}

/// Row-to-column pivot over input ordered by group key.
pub fn run_row2col_sorted<I, S>(rows: I, options: &PivotOptions, sink: &mut S) -> TransformResult<RunSummary>
where
    I: IntoIterator<Item = CsvResult<Row>>,
    S: RowSink + ?Sized,
{
    log_info("Pivoting rows to columns (ordered input)");
    pivot_sorted(rows, options, sink)
}

/// Column-to-row unpivot.
pub fn run_col2row<I, S>(rows: I, options: &UnpivotOptions, sink: &mut S) -> TransformResult<RunSummary>
where
    I: IntoIterator<Item = CsvResult<Row>>,
    S: RowSink + ?Sized,
{
    log_info("Turning columns into rows");
    unpivot(rows, options, sink)
}

/// Header-row merge.
pub fn run_headmerge<I, S>(rows: I, options: &HeadMergeOptions, sink: &mut S) -> TransformResult<RunSummary>
where
    I: IntoIterator<Item = CsvResult<Row>>,
    S: RowSink + ?Sized,
{
    log_info(format!("Merging {} header rows", options.head_rows));
    headmerge(rows, options, sink)
}

// =============================================================================
// Jobs
// =============================================================================

/// Where rows come from and go to.
#[derive(Debug, Clone)]
pub struct IoOptions {
    /// Input file; stdin when `None`
    pub input: Option<PathBuf>,

    /// Output file; stdout when `None`
    pub output: Option<PathBuf>,

    /// Input encoding label, or `auto` to detect
    pub encoding: String,

    pub input_dialect: Dialect,
    pub output_dialect: Dialect,
}

impl Default for IoOptions {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            encoding: "utf-8".to_string(),
            input_dialect: Dialect::default(),
            output_dialect: Dialect::default(),
        }
    }
}

/// One filter invocation.
#[derive(Debug, Clone)]
pub enum Job {
    Row2Col(PivotOptions),
    Row2ColSorted(PivotOptions),
    Col2Row(UnpivotOptions),
    HeadMerge(HeadMergeOptions),
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::Row2Col(_) => "row2col",
            Job::Row2ColSorted(_) => "row2col-sorted",
            Job::Col2Row(_) => "col2row",
            Job::HeadMerge(_) => "headmerge",
        }
    }

    /// Options are checked before any input is opened.
    pub fn validate(&self) -> ConfigResult<()> {
        match self {
            Job::Row2Col(o) | Job::Row2ColSorted(o) => o.validate(),
            Job::Col2Row(o) => o.validate(),
            Job::HeadMerge(o) => o.validate(),
        }
    }

    pub fn run_rows<I, S>(&self, rows: I, sink: &mut S) -> TransformResult<RunSummary>
    where
        I: IntoIterator<Item = CsvResult<Row>>,
        S: RowSink + ?Sized,
    {
        match self {
            Job::Row2Col(o) => run_row2col(rows, o, sink),
            Job::Row2ColSorted(o) => run_row2col_sorted(rows, o, sink),
            Job::Col2Row(o) => run_col2row(rows, o, sink),
            Job::HeadMerge(o) => run_headmerge(rows, o, sink),
        }
    }

    /// Open input and output, run, and flush.
    pub fn run(&self, io: &IoOptions) -> TransformResult<RunSummary> {
        self.validate()?;

        let input = open_input(io.input.as_deref(), &io.encoding)?;
        let rows = RowReader::new(input, &io.input_dialect);
        let mut sink = CsvSink::new(open_output(io.output.as_deref())?, &io.output_dialect);

        let summary = self.run_rows(rows, &mut sink)?;
        sink.into_inner()?.flush()?;
        Ok(summary)
    }
}

fn open_output(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::new(File::create(p)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}
