//! Split orchestration: validate, group, render, publish.

use std::path::Path;

use sheetsplit_io_fs::{DestinationPathBuilder, SplitSuffixPathBuilder, publish_bytes};
use sheetsplit_io_xlsx::conf::derive_default_xlsx_write_options;
use sheetsplit_io_xlsx::{SpecTable, SpecXlsxSheetWriteOptions, XlsxWriter, read_table};
use tracing::info;

use crate::group::{plan_groups, plan_sheet_names};
use crate::report::{ReportSplit, SpecSheetSplit};
use crate::spec::{SpecSplitOptions, SpecSplitRequest, SplitError};

/// Build the complete output workbook in memory.
///
/// Nothing touches the filesystem here, so every validation and naming
/// error surfaces before an output file could exist.
pub fn render_workbook(
    table: &SpecTable,
    request: &SpecSplitRequest,
    options: &SpecSplitOptions,
) -> Result<(Vec<u8>, ReportSplit), SplitError> {
    let resolved = request.validate(table)?;
    let l_groups = plan_groups(table, resolved.idx_col_group, options.rule_group_order);
    let l_plans = plan_sheet_names(&l_groups, options.rule_sheet_name, &options.empty_key_label)?;

    let mut report = ReportSplit {
        n_rows_total: table.height(),
        warnings: resolved.warnings,
        ..Default::default()
    };

    let mut writer = XlsxWriter::with_default_formats(derive_default_xlsx_write_options());
    let sheet_options = SpecXlsxSheetWriteOptions {
        col_freeze: 0,
        policy_autofit: options.policy_autofit.clone(),
    };
    for plan in &l_plans {
        writer
            .write_sheet(
                &plan.sheet_name,
                table,
                &plan.rows_idx,
                &resolved.cols_idx,
                &sheet_options,
            )
            .map_err(SplitError::WriteFailure)?;
        report.sheets.push(SpecSheetSplit {
            sheet_name: plan.sheet_name.clone(),
            key_label: plan.key_label.clone(),
            n_rows: plan.rows_idx.len(),
        });
    }

    if l_plans.is_empty() {
        report.warn("Table has no data rows; the workbook holds one blank sheet.");
    }
    for report_xlsx in writer.report() {
        report.warnings.extend(report_xlsx.warnings);
    }

    let v_bytes = writer.finish().map_err(SplitError::WriteFailure)?;
    Ok((v_bytes, report))
}

/// Split an already loaded table and publish the workbook next to
/// `path_file_source` under the first free name `builder` offers.
pub fn split_table<B>(
    table: &SpecTable,
    request: &SpecSplitRequest,
    options: &SpecSplitOptions,
    path_file_source: &Path,
    builder: &B,
) -> Result<ReportSplit, SplitError>
where
    B: DestinationPathBuilder + ?Sized,
{
    info!(
        source = %path_file_source.display(),
        col_group = %request.col_group,
        n_cols_output = request.cols_output.len(),
        n_rows = table.height(),
        "splitting table"
    );

    let (v_bytes, mut report) = render_workbook(table, request, options)?;
    let path_file_out = publish_bytes(builder, path_file_source, &v_bytes)?;

    info!(
        path = %path_file_out.display(),
        n_sheets = report.sheet_count(),
        n_warnings = report.warning_count(),
        "split finished"
    );
    report.path_file_out = Some(path_file_out);
    Ok(report)
}

/// Read `path_file_source`, split it and publish the result using the
/// `name_分頁.ext` naming rule.
pub fn split_workbook<P: AsRef<Path>>(
    path_file_source: P,
    request: &SpecSplitRequest,
    options: &SpecSplitOptions,
) -> Result<ReportSplit, SplitError> {
    let path_file_source = path_file_source.as_ref();
    let table = read_table(path_file_source, &options.read).map_err(|message| {
        SplitError::ReadFailure {
            path: path_file_source.to_path_buf(),
            message,
        }
    })?;

    let builder = SplitSuffixPathBuilder::new(options.destination.clone());
    split_table(&table, request, options, path_file_source, &builder)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use calamine::{Data, Reader, Xlsx};
    use sheetsplit_io_xlsx::EnumCellValue;

    use super::*;

    fn text(value: &str) -> EnumCellValue {
        EnumCellValue::String(value.to_string())
    }

    fn make_region_table() -> SpecTable {
        SpecTable::new(
            vec!["Region".to_string(), "Sales".to_string(), "Rep".to_string()],
            vec![
                vec![text("North"), EnumCellValue::Number(10.0), text("Ann")],
                vec![text("South"), EnumCellValue::Number(20.0), text("Bo")],
                vec![text("North"), EnumCellValue::Number(30.0), EnumCellValue::None],
            ],
        )
        .expect("table")
    }

    #[test]
    fn render_projects_columns_per_group() {
        let request = SpecSplitRequest::new("Region", ["Sales", "Rep"]);
        let (v_bytes, report) =
            render_workbook(&make_region_table(), &request, &SpecSplitOptions::default())
                .expect("render");

        assert_eq!(report.sheet_count(), 2);
        assert_eq!(report.rows_written(), 3);
        assert!(report.path_file_out.is_none());

        let mut workbook = Xlsx::new(Cursor::new(v_bytes)).expect("open");
        assert_eq!(workbook.sheet_names(), vec!["North".to_string(), "South".to_string()]);
        let range = workbook.worksheet_range("North").expect("north");
        let l_rows: Vec<Vec<Data>> = range.rows().map(<[Data]>::to_vec).collect();
        assert_eq!(
            l_rows,
            vec![
                vec![Data::String("Sales".to_string()), Data::String("Rep".to_string())],
                vec![Data::Float(10.0), Data::String("Ann".to_string())],
                vec![Data::Float(30.0), Data::Empty],
            ]
        );
    }

    #[test]
    fn render_fails_before_writing_on_duplicate_names() {
        let table = SpecTable::new(
            vec!["Key".to_string()],
            vec![vec![text("a")], vec![text("A")]],
        )
        .expect("table");
        let err = render_workbook(
            &table,
            &SpecSplitRequest::new("Key", ["Key"]),
            &SpecSplitOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SplitError::DuplicateSheetName { .. }), "{err}");
    }

    #[test]
    fn render_zero_rows_emits_blank_workbook() {
        let table = SpecTable::new(vec!["Region".to_string()], vec![]).expect("table");
        let (v_bytes, report) = render_workbook(
            &table,
            &SpecSplitRequest::new("Region", ["Region"]),
            &SpecSplitOptions::default(),
        )
        .expect("render");
        assert_eq!(report.sheet_count(), 0);
        assert_eq!(report.warning_count(), 1);

        let workbook = Xlsx::new(Cursor::new(v_bytes)).expect("open");
        assert_eq!(workbook.sheet_names().len(), 1);
    }
}
