//! Row-to-column pivot over input already ordered by group key.
//!
//! ```text
//!  rows ──┬── first N rows ──▶ vocabulary ──▶ header
//!         │        │
//!         │        ▼
//!         └──────▶ chain ──▶ current group ──(key changes)──▶ emit
//! ```
//!
//! Only one group is held at a time, so memory is bounded by the
//! discovery prefix plus one group. The vocabulary comes from the first
//! `vocabulary_rows` rows; name values first seen after that are ignored
//! (listed at info level). Unordered input is not detected: a key seen
//! again after another key starts a second output row.
//!
//! The output row cap stops emission only. The rest of the input is still
//! read, so read errors surface and `rows_read` covers every row.

use std::collections::BTreeSet;

use super::grouper::GroupKey;
use super::pipeline::{capped, CappedSink, RunSummary};
use super::pivot::{ColumnNamer, GroupAttributes, PivotLayout, PivotOptions};
use super::vocabulary::{NameCollector, Vocabulary};
use crate::error::{CsvResult, TransformResult};
use crate::logs::{log_info, log_success, log_warning};
use crate::parser::{Row, RowSink};

/// How many dropped name values are listed in the log.
const DROPPED_SHOWN: usize = 5;

/// The group being filled.
struct OpenGroup {
    key: GroupKey,
    attributes: GroupAttributes,
}

impl OpenGroup {
    fn new(key: GroupKey) -> Self {
        Self {
            key,
            attributes: GroupAttributes::new(),
        }
    }
}

/// Pivot `rows` emitting each group as soon as its key changes.
///
/// Produces the same rows as [`super::pivot_buffered`] when the input is
/// ordered by group key and the discovery prefix covers every name value.
pub fn pivot_sorted<I, S>(rows: I, options: &PivotOptions, sink: &mut S) -> TransformResult<RunSummary>
where
    I: IntoIterator<Item = CsvResult<Row>>,
    S: RowSink + ?Sized,
{
    options.validate()?;
    let mut rows = rows.into_iter();
    let mut summary = RunSummary::default();

    let header = match rows.next() {
        Some(header) => header?,
        None => {
            log_warning("input is empty; nothing to pivot");
            sink.finish()?;
            return Ok(summary);
        }
    };
    let layout = PivotLayout::resolve(&header, options);
    let mut data = capped(rows, options.input_row_cap);

    let mut names = NameCollector::new(layout.name_position()).with_limit(options.vocabulary_rows);
    let mut prefix: Vec<Row> = Vec::new();
    while names.wants_more() {
        match data.next() {
            Some(row) => {
                let row = row?;
                names.observe(&row);
                prefix.push(row);
            }
            None => break,
        }
    }
    let vocabulary = names.into_vocabulary();
    summary.vocabulary = vocabulary.len();
    log_info(format!(
        "Vocabulary from first {} rows: {} name values",
        prefix.len(),
        vocabulary.len()
    ));

    let namer = ColumnNamer::from_options(options);
    let mut out = CappedSink::new(sink, options.output_row_cap);
    out.write_header(&layout.output_header(&vocabulary, &namer))?;

    let mut dropped: BTreeSet<String> = BTreeSet::new();
    let mut current: Option<OpenGroup> = None;
    let mut full = false;

    for row in prefix.into_iter().map(Ok).chain(data) {
        let row = row?;
        summary.rows_read += 1;

        let key = layout.group_key(&row);
        let same_group = current.as_ref().map_or(false, |g| g.key == key);
        if !same_group {
            summary.groups += 1;
            if let Some(done) = current.replace(OpenGroup::new(key)) {
                if !full && !emit(&mut out, &layout, done, &vocabulary)? {
                    full = true;
                }
            }
        }

        let name = layout.name_value(&row);
        if !vocabulary.contains(&name) {
            if layout.name_position().is_some() {
                dropped.insert(name);
            }
            continue;
        }
        if full {
            continue;
        }
        if let Some(group) = current.as_mut() {
            group.attributes.insert(name, layout.expansion_values(&row));
        }
    }

    if !full {
        if let Some(done) = current.take() {
            emit(&mut out, &layout, done, &vocabulary)?;
        }
    }

    if !dropped.is_empty() {
        let shown: Vec<&str> = dropped.iter().take(DROPPED_SHOWN).map(String::as_str).collect();
        log_info(format!(
            "{} name value(s) not in the vocabulary were ignored: {}{}",
            dropped.len(),
            shown.join(", "),
            if dropped.len() > DROPPED_SHOWN { ", ..." } else { "" }
        ));
    }

    summary.rows_written = out.finish()?;
    log_success(format!("Wrote {} rows", summary.rows_written));
    Ok(summary)
}

/// Returns false once the output cap refused the row.
fn emit<S: RowSink + ?Sized>(
    out: &mut CappedSink<'_, S>,
    layout: &PivotLayout,
    group: OpenGroup,
    vocabulary: &Vocabulary,
) -> CsvResult<bool> {
    out.write_row(&layout.assemble(group.key, &group.attributes, vocabulary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CsvError, TransformError};
    use crate::parser::{row_of, VecSink};
    use crate::transform::pivot::pivot_buffered;

    fn input(lines: &[&[&str]]) -> Vec<CsvResult<Row>> {
        lines.iter().map(|l| Ok(row_of(*l))).collect()
    }

    fn sorted_population() -> Vec<CsvResult<Row>> {
        input(&[
            &["state", "year", "population"],
            &["OR", "2000", "80"],
            &["WA", "2000", "100"],
            &["WA", "2010", "120"],
        ])
    }

    #[test]
    fn test_matches_buffered_on_sorted_input() {
        let options = PivotOptions::new("year").with_group_columns(&["state"]);
        let mut streamed = VecSink::new();
        let mut buffered = VecSink::new();
        pivot_sorted(sorted_population(), &options, &mut streamed).unwrap();
        pivot_buffered(sorted_population(), &options, &mut buffered).unwrap();
        assert_eq!(streamed.rows, buffered.rows);
    }

    #[test]
    fn test_late_name_value_is_dropped() {
        let rows = input(&[
            &["id", "k", "v"],
            &["1", "a", "x"],
            &["1", "b", "y"],
            &["2", "c", "z"],
        ]);
        let options = PivotOptions::new("k")
            .with_group_columns(&["id"])
            .with_vocabulary_rows(2);
        let mut sink = VecSink::new();
        let summary = pivot_sorted(rows, &options, &mut sink).unwrap();

        assert_eq!(sink.header(), Some(&row_of(&["id", "a_v", "b_v"])));
        assert_eq!(
            sink.data(),
            &[
                row_of(&["1", "x", "y"]),
                vec![Some("2".to_string()), None, None],
            ]
        );
        assert_eq!(summary.groups, 2);
        assert_eq!(summary.rows_read, 3);
    }

    #[test]
    fn test_unsorted_input_repeats_groups() {
        let rows = input(&[
            &["state", "year", "population"],
            &["WA", "2000", "100"],
            &["OR", "2000", "80"],
            &["WA", "2010", "120"],
        ]);
        let options = PivotOptions::new("year").with_group_columns(&["state"]);
        let mut sink = VecSink::new();
        pivot_sorted(rows, &options, &mut sink).unwrap();
        assert_eq!(sink.data().len(), 3);
        assert_eq!(sink.data()[0][0], Some("WA".to_string()));
        assert_eq!(sink.data()[2][0], Some("WA".to_string()));
    }

    #[test]
    fn test_output_cap_stops_emission() {
        let options = PivotOptions::new("year")
            .with_group_columns(&["state"])
            .with_output_row_cap(1);
        let mut sink = VecSink::new();
        let summary = pivot_sorted(sorted_population(), &options, &mut sink).unwrap();
        assert_eq!(sink.data(), &[vec![Some("OR".to_string()), Some("80".to_string()), None]]);
        assert_eq!(summary.rows_written, 2);
        assert_eq!(summary.rows_read, 3);
    }

    fn four_groups() -> Vec<CsvResult<Row>> {
        input(&[
            &["g", "n", "v"],
            &["1", "a", "x"],
            &["2", "a", "y"],
            &["3", "a", "z"],
            &["4", "a", "w"],
        ])
    }

    #[test]
    fn test_output_cap_keeps_reading_input() {
        let options = PivotOptions::new("n")
            .with_group_columns(&["g"])
            .with_output_row_cap(1)
            .with_vocabulary_rows(1);
        let mut sink = VecSink::new();
        let summary = pivot_sorted(four_groups(), &options, &mut sink).unwrap();
        assert_eq!(sink.data(), &[row_of(&["1", "x"])]);
        assert_eq!(summary.rows_read, 4);
        assert_eq!(summary.groups, 4);
    }

    #[test]
    fn test_read_error_after_cap_is_reported() {
        let mut rows = four_groups();
        rows.push(Err(CsvError::Decode("utf-8".to_string())));
        let options = PivotOptions::new("n")
            .with_group_columns(&["g"])
            .with_output_row_cap(1)
            .with_vocabulary_rows(1);
        let mut sink = VecSink::new();
        let err = pivot_sorted(rows, &options, &mut sink).unwrap_err();
        assert!(matches!(err, TransformError::Csv(CsvError::Decode(_))));
    }

    #[test]
    fn test_ignore_case_merges_adjacent_groups() {
        let rows = input(&[
            &["state", "year", "population"],
            &["wa", "2000", "100"],
            &["WA", "2010", "120"],
        ]);
        let options = PivotOptions::new("year").with_group_columns(&["state"]).ignore_case();
        let mut sink = VecSink::new();
        let summary = pivot_sorted(rows, &options, &mut sink).unwrap();
        assert_eq!(sink.data(), &[row_of(&["WA", "100", "120"])]);
        assert_eq!(summary.groups, 1);
    }

    #[test]
    fn test_missing_name_column_keeps_group_columns() {
        let options = PivotOptions::new("decade").with_group_columns(&["state"]);
        let mut sink = VecSink::new();
        let summary = pivot_sorted(sorted_population(), &options, &mut sink).unwrap();
        assert_eq!(sink.header(), Some(&row_of(&["state"])));
        assert_eq!(sink.data(), &[row_of(&["OR"]), row_of(&["WA"])]);
        assert_eq!(summary.vocabulary, 0);
    }

    #[test]
    fn test_every_row_has_full_width() {
        let rows = input(&[
            &["id", "attr", "value", "unit"],
            &["1", "h", "10", "cm"],
            &["1", "w"],
            &["2", "d", "3", "m"],
        ]);
        let options = PivotOptions::new("attr").with_group_columns(&["id"]);
        let mut sink = VecSink::new();
        pivot_sorted(rows, &options, &mut sink).unwrap();
        let width = 1 + 3 * 2;
        assert_eq!(sink.rows.len(), 3);
        assert!(sink.rows.iter().all(|r| r.len() == width));
    }

    #[test]
    fn test_last_group_flushed() {
        let rows = input(&[&["g", "n", "v"], &["1", "a", "x"]]);
        let options = PivotOptions::new("n").with_group_columns(&["g"]);
        let mut sink = VecSink::new();
        pivot_sorted(rows, &options, &mut sink).unwrap();
        assert_eq!(sink.data(), &[row_of(&["1", "x"])]);
    }

    #[test]
    fn test_header_only_input() {
        let rows = input(&[&["g", "n", "v"]]);
        let options = PivotOptions::new("n").with_group_columns(&["g"]);
        let mut sink = VecSink::new();
        pivot_sorted(rows, &options, &mut sink).unwrap();
        assert_eq!(sink.rows, vec![row_of(&["g"])]);
    }
}
