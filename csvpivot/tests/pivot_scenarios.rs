use csvpivot::{
    pivot_buffered, pivot_sorted, row_of, unpivot, CsvResult, Dialect, PivotOptions, Row, RowReader,
    UnpivotOptions, VecSink,
};

fn rows(text: &str) -> Vec<CsvResult<Row>> {
    RowReader::from_text(text, &Dialect::default()).collect()
}

fn cells(values: &[Option<&str>]) -> Row {
    values.iter().map(|v| v.map(str::to_string)).collect()
}

const POPULATION: &str = "state,year,population\nWA,2000,100\nWA,2010,120\nOR,2000,80\n";

#[test]
fn pivot_state_population_by_year() {
    let options = PivotOptions::new("year").with_group_columns(&["state"]);
    let mut sink = VecSink::new();
    pivot_buffered(rows(POPULATION), &options, &mut sink).unwrap();

    assert_eq!(
        sink.header(),
        Some(&row_of(&["state", "2000_population", "2010_population"]))
    );
    assert_eq!(
        sink.data(),
        &[
            cells(&[Some("WA"), Some("100"), Some("120")]),
            cells(&[Some("OR"), Some("80"), None]),
        ]
    );
}

#[test]
fn duplicate_key_and_name_keeps_last_value() {
    let input = "state,year,population\nWA,2000,100\nOR,2000,80\nWA,2000,105\n";
    let options = PivotOptions::new("year").with_group_columns(&["state"]);
    let mut sink = VecSink::new();
    pivot_buffered(rows(input), &options, &mut sink).unwrap();

    assert_eq!(sink.data()[0], row_of(&["WA", "105"]));
}

#[test]
fn absent_name_column_outputs_group_columns_only() {
    let options = PivotOptions::new("month").with_group_columns(&["state"]);
    let mut sink = VecSink::new();
    let summary = pivot_buffered(rows(POPULATION), &options, &mut sink).unwrap();

    assert_eq!(sink.header(), Some(&row_of(&["state"])));
    assert_eq!(sink.data(), &[row_of(&["WA"]), row_of(&["OR"])]);
    assert_eq!(summary.vocabulary, 0);
}

#[test]
fn unsuffixed_first_column_uses_bare_name_values() {
    let options = PivotOptions::new("year")
        .with_group_columns(&["state"])
        .with_expand_columns(&["population"])
        .first_column_unsuffixed();
    let mut sink = VecSink::new();
    pivot_buffered(rows(POPULATION), &options, &mut sink).unwrap();

    assert_eq!(sink.header(), Some(&row_of(&["state", "2000", "2010"])));
}

#[test]
fn streaming_drops_name_values_outside_discovery_prefix() {
    let input = "state,year,population\nOR,2000,80\nOR,2010,90\nWA,2000,100\n";
    let options = PivotOptions::new("year")
        .with_group_columns(&["state"])
        .with_vocabulary_rows(1);
    let mut sink = VecSink::new();
    pivot_sorted(rows(input), &options, &mut sink).unwrap();

    assert_eq!(sink.header(), Some(&row_of(&["state", "2000_population"])));
    assert_eq!(sink.data(), &[row_of(&["OR", "80"]), row_of(&["WA", "100"])]);
}

#[test]
fn output_cap_writes_one_row_and_full_header() {
    let input = "k,n,v\na,x,1\nb,y,2\nc,z,3\n";
    let options = PivotOptions::new("n")
        .with_group_columns(&["k"])
        .with_output_row_cap(1);
    let mut sink = VecSink::new();
    pivot_buffered(rows(input), &options, &mut sink).unwrap();

    assert_eq!(sink.header(), Some(&row_of(&["k", "x_v", "y_v", "z_v"])));
    assert_eq!(sink.data().len(), 1);
}

#[test]
fn buffered_and_streaming_agree_on_sorted_input() {
    let input = "region,store,month,sales,returns\n\
                 east,1,feb,10,1\n\
                 east,1,jan,12,0\n\
                 east,2,jan,7,2\n\
                 west,1,mar,3,0\n\
                 west,1,feb,4,1\n";
    let options = PivotOptions::new("month").with_group_columns(&["region", "store"]);

    let mut buffered = VecSink::new();
    let mut streamed = VecSink::new();
    let a = pivot_buffered(rows(input), &options, &mut buffered).unwrap();
    let b = pivot_sorted(rows(input), &options, &mut streamed).unwrap();

    assert_eq!(buffered.header(), streamed.header());
    let mut left = buffered.data().to_vec();
    let mut right = streamed.data().to_vec();
    left.sort();
    right.sort();
    assert_eq!(left, right);
    assert_eq!(a.groups, b.groups);
}

#[test]
fn every_output_row_has_expected_width() {
    let input = "id,attr,value,unit\n1,h,10,cm\n1,w\n2,d,3,m\n3\n";
    let options = PivotOptions::new("attr").with_group_columns(&["id"]);
    let mut sink = VecSink::new();
    let summary = pivot_buffered(rows(input), &options, &mut sink).unwrap();

    let width = 1 + summary.vocabulary * 2;
    assert!(sink.rows.iter().all(|r| r.len() == width));
}

#[test]
fn unpivot_reverses_pivot() {
    let options = PivotOptions::new("year")
        .with_group_columns(&["state"])
        .first_column_unsuffixed();
    let mut wide = VecSink::new();
    pivot_buffered(rows(POPULATION), &options, &mut wide).unwrap();

    let back = UnpivotOptions::new("year", "population", &["2000", "2010"]);
    let mut long = VecSink::new();
    unpivot(wide.rows.into_iter().map(Ok), &back, &mut long).unwrap();

    assert_eq!(long.header(), Some(&row_of(&["state", "year", "population"])));
    assert_eq!(
        long.data(),
        &[
            row_of(&["WA", "2000", "100"]),
            row_of(&["WA", "2010", "120"]),
            row_of(&["OR", "2000", "80"]),
            cells(&[Some("OR"), Some("2010"), None]),
        ]
    );
}
