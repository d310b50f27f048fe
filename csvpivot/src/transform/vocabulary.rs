//! Name-value vocabulary: the distinct values of the pivot's name column.
//!
//! The sorted vocabulary fixes which expanded columns exist and their
//! left-to-right order. Null name cells count as the empty string.

use std::collections::HashMap;

use super::columns::cell_at;

/// Name value of a row. Null (unresolved column, short row) becomes `""`.
pub fn name_value(row: &[Option<String>], position: Option<usize>) -> String {
    cell_at(row, position).unwrap_or("").to_string()
}

/// Sorted, deduplicated name values (ordinal order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    values: Vec<String>,
}

impl Vocabulary {
    /// Build from arbitrary values; sorts and deduplicates.
    pub fn from_values<I: IntoIterator<Item = String>>(values: I) -> Self {
        let mut values: Vec<String> = values.into_iter().collect();
        values.sort();
        values.dedup();
        Self { values }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values
            .binary_search_by(|v| v.as_str().cmp(value))
            .is_ok()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.values.iter()
    }
}

impl<'a> IntoIterator for &'a Vocabulary {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Scans rows and counts name values; the counts only serve to build a set.
#[derive(Debug, Clone)]
pub struct NameCollector {
    position: Option<usize>,
    limit: Option<usize>,
    scanned: usize,
    counts: HashMap<String, usize>,
}

impl NameCollector {
    /// With `position == None` nothing is ever collected.
    pub fn new(position: Option<usize>) -> Self {
        Self {
            position,
            limit: None,
            scanned: 0,
            counts: HashMap::new(),
        }
    }

    /// Stop counting after `limit` rows (`None` = every row).
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// False once the limit has been reached.
    pub fn wants_more(&self) -> bool {
        self.limit.map_or(true, |max| self.scanned < max)
    }

    /// Count one row. Rows past the limit are ignored; returns whether the row was counted.
    pub fn observe(&mut self, row: &[Option<String>]) -> bool {
        if !self.wants_more() {
            return false;
        }
        self.scanned += 1;
        if self.position.is_some() {
            *self.counts.entry(name_value(row, self.position)).or_insert(0) += 1;
        }
        true
    }

    /// Rows counted so far.
    pub fn scanned(&self) -> usize {
        self.scanned
    }

    pub fn into_vocabulary(self) -> Vocabulary {
        Vocabulary::from_values(self.counts.into_keys())
    }
}

/// Vocabulary of the name column over `rows`, scanning at most `limit` rows.
pub fn collect_vocabulary<'a, I>(rows: I, position: Option<usize>, limit: Option<usize>) -> Vocabulary
where
    I: IntoIterator<Item = &'a Vec<Option<String>>>,
{
    let mut collector = NameCollector::new(position).with_limit(limit);
    for row in rows {
        if !collector.observe(row) {
            break;
        }
    }
    collector.into_vocabulary()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{row_of, Row};

    fn rows(values: &[&[&str]]) -> Vec<Row> {
        values.iter().map(|r| row_of(*r)).collect()
    }

    #[test]
    fn test_sorted_distinct_values() {
        let data = rows(&[&["WA", "2010"], &["WA", "2000"], &["OR", "2010"]]);
        let vocab = collect_vocabulary(&data, Some(1), None);
        assert_eq!(vocab.values(), &["2000".to_string(), "2010".to_string()]);
    }

    #[test]
    fn test_ordinal_order() {
        let data = rows(&[&["b"], &["B"], &["a"], &["é"]]);
        let vocab = collect_vocabulary(&data, Some(0), None);
        assert_eq!(vocab.values(), &["B", "a", "b", "é"]);
    }

    #[test]
    fn test_null_name_is_empty_string() {
        let data = rows(&[&["x"], &["x", "k"]]);
        let vocab = collect_vocabulary(&data, Some(1), None);
        assert_eq!(vocab.values(), &["", "k"]);
    }

    #[test]
    fn test_missing_name_column_gives_empty_vocabulary() {
        let data = rows(&[&["a"], &["b"]]);
        let vocab = collect_vocabulary(&data, None, None);
        assert!(vocab.is_empty());
    }

    #[test]
    fn test_limit_stops_scan() {
        let data = rows(&[&["1"], &["2"], &["3"]]);
        let vocab = collect_vocabulary(&data, Some(0), Some(2));
        assert_eq!(vocab.values(), &["1", "2"]);

        let mut collector = NameCollector::new(Some(0)).with_limit(Some(1));
        assert!(collector.observe(&data[0]));
        assert!(!collector.observe(&data[1]));
        assert_eq!(collector.scanned(), 1);
    }

    #[test]
    fn test_vocabulary_is_deterministic() {
        let data = rows(&[&["z"], &["m"], &["a"], &["m"]]);
        let first = collect_vocabulary(&data, Some(0), None);
        let second = collect_vocabulary(&data, Some(0), None);
        assert_eq!(first, second);
        assert!(first.contains("m"));
        assert!(!first.contains("q"));
    }
}
