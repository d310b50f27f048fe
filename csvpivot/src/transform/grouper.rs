//! Group keys: which output row an input row belongs to.
//!
//! ```text
//! group columns = [state]            GroupKey
//! ┌───────┬──────┬─────┐            ┌──────┐
//! │ state │ year │ pop │            │ (WA) │ ← rows 1, 2
//! │ WA    │ 2000 │ 100 │    →       ├──────┤
//! │ WA    │ 2010 │ 120 │            │ (OR) │ ← row 3
//! │ OR    │ 2000 │ 80  │            └──────┘
//! └───────┴──────┴─────┘
//! ```
//!
//! Two rows are in the same group iff their keys are equal slot by slot.

use super::columns::cell_at;
use crate::parser::Row;

/// Fixed-length tuple of group-column values. Null slots are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(Vec<Option<String>>);

impl GroupKey {
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The key's values, used as the leading cells of an output row.
    pub fn into_row(self) -> Row {
        self.0
    }
}

/// Builds [`GroupKey`]s from rows for a fixed list of group positions.
#[derive(Debug, Clone)]
pub struct GroupKeyExtractor {
    positions: Vec<Option<usize>>,
    ignore_case: bool,
}

impl GroupKeyExtractor {
    /// With `ignore_case`, values are uppercased so `wa` and `WA` group together.
    pub fn new(positions: Vec<Option<usize>>, ignore_case: bool) -> Self {
        Self { positions, ignore_case }
    }

    pub fn width(&self) -> usize {
        self.positions.len()
    }

    pub fn key(&self, row: &[Option<String>]) -> GroupKey {
        GroupKey(
            self.positions
                .iter()
                .map(|&pos| {
                    cell_at(row, pos).map(|v| {
                        if self.ignore_case {
                            v.to_uppercase()
                        } else {
                            v.to_string()
                        }
                    })
                })
                .collect(),
        )
    }
}
