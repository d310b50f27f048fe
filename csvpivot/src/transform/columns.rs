//! Column lookup by name.
//!
//! Column names are compared after normalization (surrounding whitespace
//! trimmed, lowercased). Lookups scan the header left to right and the first
//! match wins; duplicate header names are never an error.
//!
//! A name that matches nothing resolves to `None`. Every cell read through
//! such a position is null, so a typo in a column list yields empty output
//! cells rather than a failure.

use std::collections::HashSet;

use crate::logs::log_warning;

/// Selection token meaning "every column not otherwise named".
pub const WILDCARD: &str = "*";

/// Normalized form used for every column-name comparison.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Position of the first header column matching `name`.
pub fn resolve<S: AsRef<str>>(header: &[S], name: &str) -> Option<usize> {
    let wanted = normalize_column_name(name);
    header
        .iter()
        .position(|h| normalize_column_name(h.as_ref()) == wanted)
}

/// Split a comma-separated column list. Blank entries are dropped.
pub fn parse_column_list(list: &str) -> Vec<String> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Cell at `position`, or null when the column is unresolved or the row is short.
pub fn cell_at(row: &[Option<String>], position: Option<usize>) -> Option<&str> {
    position
        .and_then(|p| row.get(p))
        .and_then(|c| c.as_deref())
}

/// Normalized view of a header row, built once per run.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    names: Vec<String>,
    normalized: Vec<String>,
}

impl ColumnIndex {
    /// Null header cells are treated as empty names.
    pub fn from_header(header: &[Option<String>]) -> Self {
        let names: Vec<String> = header
            .iter()
            .map(|c| c.clone().unwrap_or_default())
            .collect();
        let normalized = names.iter().map(|n| normalize_column_name(n)).collect();
        Self { names, normalized }
    }

    /// Header names as they appear in the input.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        let wanted = normalize_column_name(name);
        self.normalized.iter().position(|n| *n == wanted)
    }

    /// Parallel list of positions, warning once for each unresolved name.
    pub fn positions<S: AsRef<str>>(&self, names: &[S]) -> Vec<Option<usize>> {
        names
            .iter()
            .map(|name| {
                let found = self.position(name.as_ref());
                if found.is_none() {
                    log_warning(format!("column '{}' not found; its cells will be empty", name.as_ref()));
                }
                found
            })
            .collect()
    }

    /// Replace each [`WILDCARD`] entry with the header columns not named
    /// anywhere else, in header order.
    ///
    /// `reserved` lists names claimed outside this selection (for example the
    /// pivot name column). A second wildcard in the same list expands to
    /// whatever the first one left over, which is nothing.
    pub fn expand_wildcard<S: AsRef<str>>(&self, selection: &[String], reserved: &[S]) -> Vec<String> {
        if !selection.iter().any(|s| s.trim() == WILDCARD) {
            return selection.to_vec();
        }

        let mut claimed: HashSet<String> = selection
            .iter()
            .filter(|s| s.trim() != WILDCARD)
            .map(|s| normalize_column_name(s))
            .chain(reserved.iter().map(|s| normalize_column_name(s.as_ref())))
            .collect();

        let mut expanded = Vec::with_capacity(self.names.len());
        for entry in selection {
            if entry.trim() != WILDCARD {
                expanded.push(entry.clone());
                continue;
            }
            for (name, norm) in self.names.iter().zip(&self.normalized) {
                if claimed.insert(norm.clone()) {
                    expanded.push(name.clone());
                }
            }
        }
        expanded
    }

    /// Header columns, in order, whose names are neither `excluded` nor
    /// equal to `name_column`.
    pub fn remaining<S: AsRef<str>>(&self, name_column: &str, excluded: &[S]) -> Vec<String> {
        let name_norm = normalize_column_name(name_column);
        let excluded: HashSet<String> = excluded
            .iter()
            .map(|s| normalize_column_name(s.as_ref()))
            .collect();

        self.names
            .iter()
            .zip(&self.normalized)
            .filter(|(_, norm)| **norm != name_norm && !excluded.contains(*norm))
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Group and expansion column lists after inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRoles {
    pub group: Vec<String>,
    pub expand: Vec<String>,
}

impl ColumnRoles {
    /// Fill in whichever role list was not given.
    ///
    /// - only group columns given: expansion = every other column except the name column
    /// - only expansion columns given: group = every other column except the name column
    /// - neither given: no group columns, expansion absorbs the rest
    /// - both given: used as-is
    ///
    /// Wildcards in the given lists are expanded first.
    pub fn infer(
        index: &ColumnIndex,
        name_column: &str,
        group: Option<&[String]>,
        expand: Option<&[String]>,
    ) -> Self {
        let empty: &[String] = &[];
        let group = group.map(|g| {
            let mut reserved = vec![name_column.to_string()];
            reserved.extend(expand.unwrap_or(empty).iter().cloned());
            index.expand_wildcard(g, reserved.as_slice())
        });
        let expand = expand.map(|e| {
            let mut reserved = vec![name_column.to_string()];
            reserved.extend(group.as_deref().unwrap_or(empty).iter().cloned());
            index.expand_wildcard(e, reserved.as_slice())
        });

        match (group, expand) {
            (Some(group), Some(expand)) => Self { group, expand },
            (Some(group), None) => {
                let expand = index.remaining(name_column, group.as_slice());
                Self { group, expand }
            }
            (None, Some(expand)) => {
                let group = index.remaining(name_column, expand.as_slice());
                Self { group, expand }
            }
            (None, None) => Self {
                group: Vec::new(),
                expand: index.remaining(name_column, empty),
            },
        }
    }
}
