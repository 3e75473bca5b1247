use std::fs;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::Workbook;
use sheetsplit_split::{
    EnumGroupOrderRule, SpecSplitOptions, SpecSplitRequest, SplitError, split_workbook,
};

enum FixtureCell<'a> {
    Text(&'a str),
    Number(f64),
    Blank,
}

use FixtureCell::{Blank, Number, Text};

fn write_fixture(path: &Path, headers: &[&str], rows: &[Vec<FixtureCell<'_>>]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (n_col, c_header) in headers.iter().enumerate() {
        worksheet
            .write_string(0, n_col as u16, *c_header)
            .expect("write header");
    }
    for (n_row, row) in rows.iter().enumerate() {
        for (n_col, cell) in row.iter().enumerate() {
            let (n_row, n_col) = (n_row as u32 + 1, n_col as u16);
            match cell {
                Text(value) => {
                    worksheet.write_string(n_row, n_col, *value).expect("write");
                }
                Number(value) => {
                    worksheet.write_number(n_row, n_col, *value).expect("write");
                }
                Blank => {}
            }
        }
    }
    workbook.save(path).expect("save fixture");
}

fn write_region_fixture(path: &Path) {
    write_fixture(
        path,
        &["Region", "Sales"],
        &[
            vec![Text("North"), Number(10.0)],
            vec![Text("South"), Number(20.0)],
            vec![Text("North"), Number(30.0)],
        ],
    );
}

fn read_output(path: &Path) -> Vec<(String, Vec<Vec<Data>>)> {
    let mut workbook = open_workbook_auto(path).expect("open output");
    let l_names = workbook.sheet_names().to_vec();
    l_names
        .into_iter()
        .map(|c_name| {
            let range = workbook.worksheet_range(&c_name).expect("sheet");
            let l_rows = range.rows().map(<[Data]>::to_vec).collect();
            (c_name, l_rows)
        })
        .collect()
}

fn list_file_names(path_dir: &Path) -> Vec<String> {
    let mut l_names: Vec<String> = fs::read_dir(path_dir)
        .expect("read dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    l_names.sort();
    l_names
}

fn s(value: &str) -> Data {
    Data::String(value.to_string())
}

fn setup_region_source() -> (tempfile::TempDir, PathBuf) {
    let tmp = tempfile::tempdir().expect("temp dir");
    let path_src = tmp.path().join("report.xlsx");
    write_region_fixture(&path_src);
    (tmp, path_src)
}

#[test]
fn splits_regions_into_one_sheet_each() {
    let (tmp, path_src) = setup_region_source();
    let request = SpecSplitRequest::new("Region", ["Region", "Sales"]);

    let report = split_workbook(&path_src, &request, &SpecSplitOptions::default()).expect("split");

    let path_out = tmp.path().join("report_分頁.xlsx");
    assert_eq!(report.path_file_out.as_deref(), Some(path_out.as_path()));
    assert_eq!(report.n_rows_total, 3);

    let l_sheets = read_output(&path_out);
    assert_eq!(
        l_sheets,
        vec![
            (
                "North".to_string(),
                vec![
                    vec![s("Region"), s("Sales")],
                    vec![s("North"), Data::Float(10.0)],
                    vec![s("North"), Data::Float(30.0)],
                ]
            ),
            (
                "South".to_string(),
                vec![
                    vec![s("Region"), s("Sales")],
                    vec![s("South"), Data::Float(20.0)],
                ]
            ),
        ]
    );
}

#[test]
fn missing_group_column_fails_without_output() {
    let (tmp, path_src) = setup_region_source();
    let request = SpecSplitRequest::new("Country", ["Sales"]);

    let err = split_workbook(&path_src, &request, &SpecSplitOptions::default()).unwrap_err();
    assert!(matches!(err, SplitError::InvalidColumn { ref column, .. } if column == "Country"));
    assert!(err.is_user_input());
    assert_eq!(list_file_names(tmp.path()), vec!["report.xlsx"]);
}

#[test]
fn empty_selection_fails_without_output() {
    let (tmp, path_src) = setup_region_source();
    let request = SpecSplitRequest::new("Region", Vec::<String>::new());

    let err = split_workbook(&path_src, &request, &SpecSplitOptions::default()).unwrap_err();
    assert!(matches!(err, SplitError::EmptySelection), "{err}");
    assert_eq!(list_file_names(tmp.path()), vec!["report.xlsx"]);
}

#[test]
fn keys_equal_after_truncation_fail_without_output() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let path_src = tmp.path().join("report.xlsx");
    write_fixture(
        &path_src,
        &["Code", "Value"],
        &[
            vec![Text("ABCDEFGHIJKLMNOPQRSTUVWXYZABCDE1"), Number(1.0)],
            vec![Text("ABCDEFGHIJKLMNOPQRSTUVWXYZABCDE2"), Number(2.0)],
        ],
    );

    let request = SpecSplitRequest::new("Code", ["Code", "Value"]);
    let err = split_workbook(&path_src, &request, &SpecSplitOptions::default()).unwrap_err();
    assert!(matches!(err, SplitError::DuplicateSheetName { .. }), "{err}");
    assert_eq!(list_file_names(tmp.path()), vec!["report.xlsx"]);
}

#[test]
fn existing_output_gets_numbered_suffix() {
    let (tmp, path_src) = setup_region_source();
    let path_taken = tmp.path().join("report_分頁.xlsx");
    fs::write(&path_taken, b"existing").expect("write");

    let request = SpecSplitRequest::new("Region", ["Sales"]);
    let report = split_workbook(&path_src, &request, &SpecSplitOptions::default()).expect("split");

    assert_eq!(
        report.path_file_out,
        Some(tmp.path().join("report_分頁_1.xlsx"))
    );
    assert_eq!(fs::read(&path_taken).expect("read"), b"existing");
}

#[test]
fn repeated_runs_write_identical_sheets_to_distinct_files() {
    let (_tmp, path_src) = setup_region_source();
    let request = SpecSplitRequest::new("Region", ["Sales"]).with_group_column_locked();
    let options = SpecSplitOptions::default();

    let report_first = split_workbook(&path_src, &request, &options).expect("first");
    let report_second = split_workbook(&path_src, &request, &options).expect("second");

    let path_first = report_first.path_file_out.expect("first path");
    let path_second = report_second.path_file_out.expect("second path");
    assert_ne!(path_first, path_second);
    assert_eq!(read_output(&path_first), read_output(&path_second));
}

#[test]
fn header_only_source_publishes_without_group_sheets() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let path_src = tmp.path().join("empty.xlsx");
    write_fixture(&path_src, &["Region", "Sales"], &[]);

    let request = SpecSplitRequest::new("Region", ["Sales"]);
    let report = split_workbook(&path_src, &request, &SpecSplitOptions::default()).expect("split");

    assert_eq!(report.sheet_count(), 0);
    let path_out = report.path_file_out.expect("path");
    assert_eq!(path_out, tmp.path().join("empty_分頁.xlsx"));
    assert_eq!(read_output(&path_out).len(), 1);
}

#[test]
fn sheets_partition_rows_and_match_their_keys() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let path_src = tmp.path().join("mixed.xlsx");
    write_fixture(
        &path_src,
        &["Key", "Id"],
        &[
            vec![Text("beta"), Number(1.0)],
            vec![Number(7.0), Number(2.0)],
            vec![Blank, Number(3.0)],
            vec![Text("alpha"), Number(4.0)],
            vec![Text("beta"), Number(5.0)],
            vec![Number(7.0), Number(6.0)],
            vec![Blank, Number(7.0)],
        ],
    );

    let request = SpecSplitRequest::new("Key", ["Key", "Id"]);
    let report = split_workbook(&path_src, &request, &SpecSplitOptions::default()).expect("split");
    let l_sheets = read_output(report.path_file_out.as_deref().expect("path"));

    let l_names: Vec<&str> = l_sheets.iter().map(|(c_name, _)| c_name.as_str()).collect();
    assert_eq!(l_names, vec!["7", "alpha", "beta", "(empty)"]);

    let mut l_ids = Vec::new();
    for (c_name, l_rows) in &l_sheets {
        for row in &l_rows[1..] {
            let c_key = match &row[0] {
                Data::String(value) => value.clone(),
                Data::Float(value) => format!("{value}"),
                Data::Empty => "(empty)".to_string(),
                other => panic!("unexpected key cell {other:?}"),
            };
            assert_eq!(&c_key, c_name);
            if let Data::Float(n_id) = row[1] {
                l_ids.push(n_id as i64);
            }
        }
    }
    l_ids.sort_unstable();
    assert_eq!(l_ids, vec![1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(report.rows_written(), 7);
}

#[test]
fn first_seen_order_and_sanitized_names() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let path_src = tmp.path().join("paths.xlsx");
    write_fixture(
        &path_src,
        &["Dept", "Budget"],
        &[
            vec![Text("R&D/Labs"), Number(5.0)],
            vec![Text("Ops"), Number(3.0)],
        ],
    );

    let options = SpecSplitOptions {
        rule_group_order: EnumGroupOrderRule::FirstSeen,
        ..Default::default()
    };
    let request = SpecSplitRequest::new("Dept", ["Budget"]);
    let report = split_workbook(&path_src, &request, &options).expect("split");

    let l_names: Vec<&str> = report.sheets.iter().map(|sheet| sheet.sheet_name.as_str()).collect();
    assert_eq!(l_names, vec!["R&D_Labs", "Ops"]);
    assert_eq!(report.sheets[0].key_label, "R&D/Labs");
    assert!(report.sheets.iter().all(|sheet| sheet.sheet_name.chars().count() <= 31));
}

#[test]
fn blank_separator_rows_do_not_form_an_empty_group() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let path_src = tmp.path().join("spaced.xlsx");
    write_fixture(
        &path_src,
        &["Region", "Sales"],
        &[
            vec![Text("North"), Number(10.0)],
            vec![Blank, Blank],
            vec![Text("South"), Number(20.0)],
        ],
    );

    let request = SpecSplitRequest::new("Region", ["Region", "Sales"]);
    let report = split_workbook(&path_src, &request, &SpecSplitOptions::default()).expect("split");

    assert_eq!(report.n_rows_total, 2);
    let l_sheets = read_output(report.path_file_out.as_deref().expect("path"));
    let l_names: Vec<&str> = l_sheets.iter().map(|(c_name, _)| c_name.as_str()).collect();
    assert_eq!(l_names, vec!["North", "South"]);
}

#[test]
fn unreadable_source_is_a_read_failure() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let path_src = tmp.path().join("broken.xlsx");
    fs::write(&path_src, b"not a workbook").expect("write");

    let request = SpecSplitRequest::new("Region", ["Sales"]);
    let err = split_workbook(&path_src, &request, &SpecSplitOptions::default()).unwrap_err();
    assert!(matches!(err, SplitError::ReadFailure { .. }), "{err}");
    assert!(!err.is_user_input());
    assert_eq!(list_file_names(tmp.path()), vec!["broken.xlsx"]);
}
