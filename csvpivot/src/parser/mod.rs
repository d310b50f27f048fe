//! Delimited-text input and output.
//!
//! Everything the filters need around the row stream: dialect alias
//! decoding, input encoding detection, the [`RowReader`] that yields rows
//! and the [`RowSink`] implementations that consume them.

mod reader;
mod writer;

pub use reader::{open_input, RowReader};
pub use writer::{CsvSink, RowSink, VecSink};

use crate::error::{ConfigError, ConfigResult, CsvError, CsvResult};

/// One row of cells. `None` is a null cell (absent column, short row).
pub type Row = Vec<Option<String>>;

/// Build a row from string slices, every cell non-null.
pub fn row_of<S: AsRef<str>>(cells: &[S]) -> Row {
    cells.iter().map(|c| Some(c.as_ref().to_string())).collect()
}

// =============================================================================
// Dialect
// =============================================================================

/// Row terminator for reading and writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTerminator {
    Lf,
    CrLf,
    Cr,
    Byte(u8),
}

impl RowTerminator {
    /// Readers accept any standard line ending; only a custom byte is strict.
    pub(crate) fn for_reader(self) -> csv::Terminator {
        match self {
            RowTerminator::Lf | RowTerminator::CrLf | RowTerminator::Cr => csv::Terminator::CRLF,
            RowTerminator::Byte(b) => csv::Terminator::Any(b),
        }
    }

    pub(crate) fn for_writer(self) -> csv::Terminator {
        match self {
            RowTerminator::Lf => csv::Terminator::Any(b'\n'),
            RowTerminator::CrLf => csv::Terminator::CRLF,
            RowTerminator::Cr => csv::Terminator::Any(b'\r'),
            RowTerminator::Byte(b) => csv::Terminator::Any(b),
        }
    }
}

/// Formatting knobs shared by the reader and the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: u8,
    pub quote: u8,
    pub terminator: RowTerminator,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            terminator: RowTerminator::Lf,
        }
    }
}

impl Dialect {
    /// Build a dialect from command-line style names.
    ///
    /// `None` keeps the default for that knob.
    pub fn from_names(
        delimiter: Option<&str>,
        quote: Option<&str>,
        terminator: Option<&str>,
    ) -> ConfigResult<Self> {
        let mut dialect = Dialect::default();
        if let Some(name) = delimiter {
            dialect.delimiter = decode_delimiter_name(name)?;
        }
        if let Some(name) = quote {
            dialect.quote = decode_quote_name(name)?;
        }
        if let Some(name) = terminator {
            dialect.terminator = decode_newline(name)?;
        }
        Ok(dialect)
    }
}

fn single_byte(what: &'static str, value: &str) -> ConfigResult<u8> {
    match value.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(ConfigError::InvalidDialect {
            what,
            value: value.to_string(),
            reason: "must be a single ASCII character",
        }),
    }
}

/// Map a delimiter name (`tab`, `pipe`, ...) to its byte.
///
/// Anything that is not an alias must itself be one ASCII character.
pub fn decode_delimiter_name(name: &str) -> ConfigResult<u8> {
    match name.to_lowercase().as_str() {
        "tab" | "\\t" => Ok(b'\t'),
        "space" | "sp" => Ok(b' '),
        "comma" => Ok(b','),
        "pipe" | "vbar" | "verticalbar" => Ok(b'|'),
        "semicolon" => Ok(b';'),
        _ => single_byte("delimiter", name),
    }
}

/// Map a quote symbol name (`dquote`, `apos`, ...) to its byte.
pub fn decode_quote_name(name: &str) -> ConfigResult<u8> {
    match name.to_lowercase().as_str() {
        "quot" | "dquote" | "double_quote" | "double-quote" => Ok(b'"'),
        "apos" | "squote" | "single_quote" | "single-quote" => Ok(b'\''),
        _ => single_byte("quote", name),
    }
}

/// Map a line-ending name (`lf`, `crlf`, `dos`, `std`, ...) to a terminator.
pub fn decode_newline(name: &str) -> ConfigResult<RowTerminator> {
    let lowered = name.to_lowercase();
    match lowered.as_str() {
        "std" | "lf" | "unix" | "\\n" | "\n" => Ok(RowTerminator::Lf),
        "crlf" | "windows" | "win" | "dos" | "\\r\\n" | "\r\n" => Ok(RowTerminator::CrLf),
        "cr" | "mac" | "macintosh" | "\\r" | "\r" => Ok(RowTerminator::Cr),
        "sys" => {
            if cfg!(windows) {
                Ok(RowTerminator::CrLf)
            } else {
                Ok(RowTerminator::Lf)
            }
        }
        _ => single_byte("terminator", name).map(RowTerminator::Byte),
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Label meaning "guess the encoding from the bytes".
pub const AUTO_ENCODING: &str = "auto";

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Resolve an encoding label, rejecting unknown ones up front.
pub fn lookup_encoding(label: &str) -> CsvResult<&'static encoding_rs::Encoding> {
    encoding_rs::Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| CsvError::UnknownEncoding(label.to_string()))
}

/// Decode bytes to UTF-8 text. A leading byte-order mark is dropped.
///
/// With `lossy` set, undecodable sequences become U+FFFD instead of failing.
pub fn decode_content(bytes: &[u8], label: &str, lossy: bool) -> CsvResult<String> {
    let encoding = lookup_encoding(label)?;
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors && !lossy {
        return Err(CsvError::Decode(used.name().to_string()));
    }
    Ok(text.into_owned())
}
