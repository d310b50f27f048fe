//! # csvpivot - reshape CSV streams
//!
//! Pivots long-format rows into wide columns, unpivots wide columns back
//! into rows, and merges multi-row headers into a single header.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV input  │────▶│  RowReader  │────▶│  Transform  │────▶│   RowSink   │
//! │ (any enc.)  │     │ (dialect)   │     │ (pivot ...) │     │ (CSV / Vec) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use csvpivot::{pivot_buffered, PivotOptions, RowReader, Dialect, VecSink};
//!
//! let rows = RowReader::from_text("state,year,pop\nWA,2000,100\n", &Dialect::default());
//! let options = PivotOptions::new("year").with_group_columns(&["state"]);
//! let mut sink = VecSink::new();
//! pivot_buffered(rows, &options, &mut sink)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`logs`] - stderr logging with a global verbosity
//! - [`parser`] - Dialects, encodings, row reader and sinks
//! - [`transform`] - Pivot, unpivot, header merge and pipeline

// Core modules
pub mod error;
pub mod logs;

// Input / output
pub mod parser;

// Reshaping
pub mod transform;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    ConfigResult,
    CsvError,
    CsvResult,
    TransformError,
    TransformResult,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    open_input,
    detect_encoding,
    decode_content,
    row_of,
    Dialect,
    RowTerminator,
    Row,
    RowReader,
    RowSink,
    CsvSink,
    VecSink,
};

// =============================================================================
// Re-exports - Pivot
// =============================================================================

pub use transform::{
    pivot_buffered,
    pivot_sorted,
    ColumnNamer,
    PivotLayout,
    PivotOptions,
    GroupKey,
    Vocabulary,
};

// =============================================================================
// Re-exports - Unpivot and header merge
// =============================================================================

pub use transform::{
    unpivot,
    UnpivotOptions,
    headmerge,
    merge_header_rows,
    HeadMergeOptions,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    run_row2col,
    run_row2col_sorted,
    run_col2row,
    run_headmerge,
    IoOptions,
    Job,
    RowCap,
    RunSummary,
};
