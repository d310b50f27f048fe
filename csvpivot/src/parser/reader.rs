//! Pull-based row reader over `csv::Reader`.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::Path;

use super::{decode_content, detect_encoding, lookup_encoding, Dialect, Row, AUTO_ENCODING};
use crate::error::CsvResult;
use crate::logs::log_info;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Yields every record of a delimited stream as a [`Row`], header included.
///
/// Records may have different widths; nothing is padded here, consumers
/// treat cells past the end of a row as null.
pub struct RowReader<R: Read> {
    inner: csv::Reader<R>,
    record: csv::StringRecord,
}

impl<R: Read> RowReader<R> {
    pub fn new(reader: R, dialect: &Dialect) -> Self {
        let inner = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(dialect.delimiter)
            .quote(dialect.quote)
            .terminator(dialect.terminator.for_reader())
            .from_reader(reader);
        Self {
            inner,
            record: csv::StringRecord::new(),
        }
    }
}

impl RowReader<Cursor<Vec<u8>>> {
    /// Reader over in-memory text.
    pub fn from_text(text: &str, dialect: &Dialect) -> Self {
        Self::new(Cursor::new(text.as_bytes().to_vec()), dialect)
    }
}

impl<R: Read> Iterator for RowReader<R> {
    type Item = CsvResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.read_record(&mut self.record) {
            Ok(true) => Some(Ok(self.record.iter().map(|f| Some(f.to_string())).collect())),
            Ok(false) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}

/// Open a file (or stdin when `path` is `None`) as UTF-8 bytes.
///
/// UTF-8 input is streamed; any other encoding, including `auto`
/// detection, is read into memory and transcoded first.
pub fn open_input(path: Option<&Path>, encoding: &str) -> CsvResult<Box<dyn Read>> {
    let raw: Box<dyn Read> = match path {
        Some(p) => Box::new(File::open(p)?),
        None => Box::new(io::stdin()),
    };

    if encoding.eq_ignore_ascii_case(AUTO_ENCODING) {
        let bytes = read_all(raw)?;
        let detected = detect_encoding(&bytes);
        log_info(format!("Detected encoding: {}", detected));
        let text = decode_content(&bytes, &detected, true)?;
        return Ok(Box::new(Cursor::new(text.into_bytes())));
    }

    let resolved = lookup_encoding(encoding)?;
    if resolved == encoding_rs::UTF_8 {
        let mut buffered = BufReader::new(raw);
        skip_bom(&mut buffered)?;
        return Ok(Box::new(buffered));
    }

    let bytes = read_all(raw)?;
    let text = decode_content(&bytes, encoding, false)?;
    Ok(Box::new(Cursor::new(text.into_bytes())))
}

fn read_all(mut reader: Box<dyn Read>) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn skip_bom<R: BufRead>(reader: &mut R) -> io::Result<()> {
    let starts_with_bom = reader.fill_buf()?.starts_with(UTF8_BOM);
    if starts_with_bom {
        reader.consume(UTF8_BOM.len());
    }
    Ok(())
}
