//! XLSX writer kernel that projects table rows into workbook sheets.

use std::collections::BTreeSet;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use tracing::debug;

use crate::conf::{
    EnumFmtKey, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, derive_default_xlsx_formats,
};
use crate::spec::{
    EnumAutofitColumnsRule, EnumCellValue, SpecAutofitCellsPolicy, SpecCellFormat,
    SpecSheetWritten, SpecXlsxReport, SpecXlsxWriteOptions,
};
use crate::table::SpecTable;
use crate::util::{derive_sheet_name_key, validate_sheet_name};

/// Per-sheet call options.
#[derive(Default, Debug, Clone)]
pub struct SpecXlsxSheetWriteOptions {
    /// Number of frozen columns.
    pub col_freeze: usize,
    /// Column autofit policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
}

/// Stateful in-memory workbook writer.
pub struct XlsxWriter {
    workbook: Workbook,
    fmt_text: SpecCellFormat,
    fmt_integer: SpecCellFormat,
    fmt_decimal: SpecCellFormat,
    fmt_header: SpecCellFormat,
    write_options: SpecXlsxWriteOptions,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxReport>,
    if_finished: bool,
}

impl XlsxWriter {
    /// Create writer with format/options presets.
    ///
    /// The workbook is buffered in memory until [`Self::finish`] is called.
    pub fn new(
        fmt_text: SpecCellFormat,
        fmt_integer: SpecCellFormat,
        fmt_decimal: SpecCellFormat,
        fmt_header: SpecCellFormat,
        write_options: SpecXlsxWriteOptions,
    ) -> Self {
        Self {
            workbook: Workbook::new(),
            fmt_text,
            fmt_integer,
            fmt_decimal,
            fmt_header,
            write_options,
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
            if_finished: false,
        }
    }

    /// Create writer with [`derive_default_xlsx_formats`] presets.
    pub fn with_default_formats(write_options: SpecXlsxWriteOptions) -> Self {
        let dict_fmt = derive_default_xlsx_formats();
        let get_fmt = |key: EnumFmtKey| dict_fmt.get(key.as_str()).cloned().unwrap_or_default();
        Self::new(
            get_fmt(EnumFmtKey::Text),
            get_fmt(EnumFmtKey::Integer),
            get_fmt(EnumFmtKey::Decimal),
            get_fmt(EnumFmtKey::Header),
            write_options,
        )
    }

    /// Return immutable snapshot of per-sheet write reports.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    /// Number of sheets written so far.
    pub fn sheet_count(&self) -> usize {
        self.set_sheet_names_existing.len()
    }

    /// Serialize the workbook to XLSX bytes. No further sheets may be written.
    pub fn finish(&mut self) -> Result<Vec<u8>, String> {
        if self.if_finished {
            return Err("Cannot finish a workbook twice.".to_string());
        }
        if self.set_sheet_names_existing.is_empty() {
            self.workbook.add_worksheet();
        }
        let v_bytes = self
            .workbook
            .save_to_buffer()
            .map_err(derive_xlsx_error_text)?;
        self.if_finished = true;
        Ok(v_bytes)
    }

    /// Write one sheet: a header row of the selected column names, then the
    /// selected rows projected onto the selected columns.
    ///
    /// `rows_idx` and `cols_idx` are positions in `table`, written in the
    /// order given.
    pub fn write_sheet(
        &mut self,
        sheet_name: &str,
        table: &SpecTable,
        rows_idx: &[usize],
        cols_idx: &[usize],
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<(), String> {
        if self.if_finished {
            return Err("Cannot write after finish().".to_string());
        }
        options.policy_autofit.validate()?;
        validate_sheet_name(sheet_name)?;

        let c_sheet_name_key = derive_sheet_name_key(sheet_name);
        if self.set_sheet_names_existing.contains(&c_sheet_name_key) {
            return Err(format!("Duplicate sheet name: {sheet_name:?}"));
        }

        if rows_idx.len() + 1 > N_NROWS_EXCEL_MAX {
            return Err(format!(
                "Sheet {sheet_name:?} needs {} rows; Excel allows {N_NROWS_EXCEL_MAX}.",
                rows_idx.len() + 1
            ));
        }
        if cols_idx.len() > N_NCOLS_EXCEL_MAX {
            return Err(format!(
                "Sheet {sheet_name:?} needs {} columns; Excel allows {N_NCOLS_EXCEL_MAX}.",
                cols_idx.len()
            ));
        }
        if let Some(n_idx) = cols_idx.iter().find(|n_idx| **n_idx >= table.width()) {
            return Err(format!("Column index out of range: {n_idx}"));
        }
        if let Some(n_idx) = rows_idx.iter().find(|n_idx| **n_idx >= table.height()) {
            return Err(format!("Row index out of range: {n_idx}"));
        }

        let mut report = SpecXlsxReport::default();

        let l_cols_integer = if self.write_options.infer_integer_cols {
            derive_integer_column_flags(table, rows_idx, cols_idx)
        } else {
            vec![false; cols_idx.len()]
        };
        let l_fmt_data_by_col: Vec<Format> = cols_idx
            .iter()
            .enumerate()
            .map(|(n_idx_local, n_idx_col)| {
                let fmt_base = if l_cols_integer[n_idx_local] {
                    &self.fmt_integer
                } else if derive_column_is_numeric(table, rows_idx, *n_idx_col) {
                    &self.fmt_decimal
                } else {
                    &self.fmt_text
                };
                derive_rust_xlsx_format(fmt_base)
            })
            .collect();
        let fmt_header = derive_rust_xlsx_format(&self.fmt_header);

        let worksheet = self.workbook.add_worksheet();
        worksheet
            .set_name(sheet_name)
            .map_err(derive_xlsx_error_text)?;

        let policy_autofit = &options.policy_autofit;
        let mut l_width_by_col_header = vec![0usize; cols_idx.len()];
        let mut l_width_by_col_body = vec![0usize; cols_idx.len()];

        for (n_idx_local, n_idx_col) in cols_idx.iter().enumerate() {
            let c_header = &table.columns()[*n_idx_col];
            l_width_by_col_header[n_idx_local] = estimate_unicode_string_width(c_header);
            worksheet
                .write_string_with_format(0, cast_col_num(n_idx_local)?, c_header, &fmt_header)
                .map_err(derive_xlsx_error_text)?;
        }

        if self.write_options.if_freeze_header {
            worksheet
                .set_freeze_panes(1, cast_col_num(options.col_freeze)?)
                .map_err(derive_xlsx_error_text)?;
        }

        let n_rows_body_inferred_max =
            policy_autofit.height_body_inferred_max.unwrap_or(usize::MAX);
        for (n_row_local, n_idx_row) in rows_idx.iter().enumerate() {
            let row = &table.rows()[*n_idx_row];
            for (n_idx_local, n_idx_col) in cols_idx.iter().enumerate() {
                let value = &row[*n_idx_col];
                if n_row_local < n_rows_body_inferred_max {
                    l_width_by_col_body[n_idx_local] = usize::max(
                        l_width_by_col_body[n_idx_local],
                        estimate_width_len(value, l_cols_integer[n_idx_local]),
                    );
                }
                write_cell_with_format(
                    worksheet,
                    n_row_local + 1,
                    n_idx_local,
                    value,
                    &l_fmt_data_by_col[n_idx_local],
                )?;
            }
        }

        if policy_autofit.rule_columns != EnumAutofitColumnsRule::None {
            let n_min = usize::max(1, policy_autofit.width_cell_min);
            let n_max = usize::min(255, usize::max(n_min, policy_autofit.width_cell_max));
            let n_pad = policy_autofit.width_cell_padding;

            for n_idx_local in 0..cols_idx.len() {
                let n_width_recorded = match policy_autofit.rule_columns {
                    EnumAutofitColumnsRule::Header => l_width_by_col_header[n_idx_local],
                    EnumAutofitColumnsRule::Body => l_width_by_col_body[n_idx_local],
                    EnumAutofitColumnsRule::All | EnumAutofitColumnsRule::None => usize::max(
                        l_width_by_col_header[n_idx_local],
                        l_width_by_col_body[n_idx_local],
                    ),
                };
                let n_width_final = usize::min(n_max, usize::max(n_min, n_width_recorded + n_pad));
                worksheet
                    .set_column_width(cast_col_num(n_idx_local)?, n_width_final as f64)
                    .map_err(derive_xlsx_error_text)?;
            }
        }

        if rows_idx.is_empty() {
            report.warn(format!("Sheet {sheet_name:?} has a header row only."));
        }
        report.sheets.push(SpecSheetWritten {
            sheet_name: sheet_name.to_string(),
            n_rows: rows_idx.len(),
            n_cols: cols_idx.len(),
        });
        debug!(
            sheet = sheet_name,
            n_rows = rows_idx.len(),
            n_cols = cols_idx.len(),
            "wrote sheet"
        );

        self.set_sheet_names_existing.insert(c_sheet_name_key);
        self.l_reports.push(report);
        Ok(())
    }
}

/// Estimate displayed width units for one cell value.
///
/// Used by autofit inference logic.
pub fn estimate_width_len(value: &EnumCellValue, if_is_integer_col: bool) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::String(s) => estimate_unicode_string_width(s),
        EnumCellValue::Number(n) => {
            if if_is_integer_col {
                return (*n as i64).to_string().len();
            }
            n.to_string().len()
        }
    }
}

fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

fn derive_column_is_numeric(table: &SpecTable, rows_idx: &[usize], n_idx_col: usize) -> bool {
    let mut if_has_number = false;
    for n_idx_row in rows_idx {
        match &table.rows()[*n_idx_row][n_idx_col] {
            EnumCellValue::None => {}
            EnumCellValue::Number(_) => if_has_number = true,
            EnumCellValue::String(_) => return false,
        }
    }
    if_has_number
}

fn derive_integer_column_flags(
    table: &SpecTable,
    rows_idx: &[usize],
    cols_idx: &[usize],
) -> Vec<bool> {
    cols_idx
        .iter()
        .map(|n_idx_col| {
            derive_column_is_numeric(table, rows_idx, *n_idx_col)
                && rows_idx.iter().all(|n_idx_row| {
                    match &table.rows()[*n_idx_row][*n_idx_col] {
                        EnumCellValue::Number(n) => n.fract() == 0.0 && n.abs() < 1e15,
                        _ => true,
                    }
                })
        })
        .collect()
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), String> {
    match value {
        EnumCellValue::None => {
            worksheet
                .write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::String(val) => {
            worksheet
                .write_string_with_format(
                    cast_row_num(row_idx)?,
                    cast_col_num(col_idx)?,
                    val,
                    format,
                )
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::Number(val) => {
            worksheet
                .write_number_with_format(
                    cast_row_num(row_idx)?,
                    cast_col_num(col_idx)?,
                    *val,
                    format,
                )
                .map_err(derive_xlsx_error_text)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if spec.border.unwrap_or(false) {
        format = format.set_border(FormatBorder::Thin);
    }

    format
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}
