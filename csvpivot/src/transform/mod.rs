//! Reshaping filters over row streams.
//!
//! - [`columns`] - column lookup, wildcard selection and role inference
//! - [`grouper`] - group keys
//! - [`vocabulary`] - distinct name values
//! - [`pivot`] - buffered row-to-column pivot
//! - [`stream`] - row-to-column pivot over ordered input
//! - [`unpivot`] - column-to-row reshape
//! - [`headmerge`] - header-row merge
//! - [`pipeline`] - entry points and jobs

pub mod columns;
pub mod grouper;
pub mod headmerge;
pub mod pipeline;
pub mod pivot;
pub mod stream;
pub mod unpivot;
pub mod vocabulary;

pub use columns::{normalize_column_name, parse_column_list, ColumnIndex, ColumnRoles, WILDCARD};
pub use grouper::{GroupKey, GroupKeyExtractor};
pub use headmerge::{headmerge, merge_header_rows, HeadMergeOptions};
pub use pipeline::{
    run_col2row, run_headmerge, run_row2col, run_row2col_sorted, IoOptions, Job, RowCap, RunSummary,
};
pub use pivot::{pivot_buffered, ColumnNamer, PivotLayout, PivotOptions, DEFAULT_COLUMN_FORMAT};
pub use stream::pivot_sorted;
pub use unpivot::{unpivot, UnpivotOptions};
pub use vocabulary::{collect_vocabulary, Vocabulary};
