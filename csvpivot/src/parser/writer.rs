//! Row sinks: where transformed rows go.

use std::io::Write;

use super::{Dialect, Row};
use crate::error::CsvResult;

/// Destination for output rows, one row at a time.
pub trait RowSink {
    fn write_row(&mut self, row: &[Option<String>]) -> CsvResult<()>;

    /// Flush anything buffered. Called once after the last row.
    fn finish(&mut self) -> CsvResult<()> {
        Ok(())
    }
}

impl<S: RowSink + ?Sized> RowSink for &mut S {
    fn write_row(&mut self, row: &[Option<String>]) -> CsvResult<()> {
        (**self).write_row(row)
    }

    fn finish(&mut self) -> CsvResult<()> {
        (**self).finish()
    }
}

/// Writes rows as delimited text. Null cells become empty fields.
pub struct CsvSink<W: Write> {
    inner: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W, dialect: &Dialect) -> Self {
        let inner = csv::WriterBuilder::new()
            .flexible(true)
            .delimiter(dialect.delimiter)
            .quote(dialect.quote)
            .terminator(dialect.terminator.for_writer())
            .from_writer(writer);
        Self { inner }
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> CsvResult<W> {
        self.inner
            .into_inner()
            .map_err(|e| e.into_error().into())
    }
}

impl<W: Write> RowSink for CsvSink<W> {
    fn write_row(&mut self, row: &[Option<String>]) -> CsvResult<()> {
        self.inner
            .write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        Ok(())
    }

    fn finish(&mut self) -> CsvResult<()> {
        self.inner.flush()?;
        Ok(())
    }
}

/// Collects rows in memory.
#[derive(Debug, Default, Clone)]
pub struct VecSink {
    pub rows: Vec<Row>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header row, if anything was written.
    pub fn header(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Rows after the header.
    pub fn data(&self) -> &[Row] {
        self.rows.get(1..).unwrap_or(&[])
    }
}

impl RowSink for VecSink {
    fn write_row(&mut self, row: &[Option<String>]) -> CsvResult<()> {
        self.rows.push(row.to_vec());
        Ok(())
    }
}
