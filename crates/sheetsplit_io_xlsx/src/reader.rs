//! Spreadsheet reader kernel that loads one worksheet into a [`SpecTable`].
//!
//! Any format calamine understands (`xlsx`, `xlsm`, `xlsb`, `xls`, `ods`) is
//! accepted. Row 1 of the used range is always the header.

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};
use polars::prelude::{IpcReader, SerReader};
use tracing::debug;

use crate::spec::{EnumCellValue, SpecXlsxReadOptions};
use crate::table::SpecTable;
use crate::util::{derive_unique_column_names, validate_spreadsheet_extension};

/// Sheet names of the workbook at `path`, in workbook order.
pub fn read_sheet_names<P: AsRef<Path>>(path: P) -> Result<Vec<String>, String> {
    let path = path.as_ref();
    validate_spreadsheet_extension(path)?;
    let workbook = open_workbook_auto(path)
        .map_err(|err| format!("Failed to open {}: {err}", path.display()))?;
    Ok(workbook.sheet_names().to_vec())
}

/// Load one worksheet of the workbook at `path` into a table.
pub fn read_table<P: AsRef<Path>>(
    path: P,
    options: &SpecXlsxReadOptions,
) -> Result<SpecTable, String> {
    let path = path.as_ref();
    validate_spreadsheet_extension(path)?;

    let mut workbook = open_workbook_auto(path)
        .map_err(|err| format!("Failed to open {}: {err}", path.display()))?;
    let l_sheet_names = workbook.sheet_names().to_vec();

    let c_sheet_name = match &options.sheet_name {
        Some(c_name) => {
            if !l_sheet_names.iter().any(|c_existing| c_existing == c_name) {
                return Err(format!(
                    "Sheet not found: {c_name:?} in {}. Available: {l_sheet_names:?}",
                    path.display()
                ));
            }
            c_name.clone()
        }
        None => l_sheet_names
            .first()
            .cloned()
            .ok_or_else(|| format!("Workbook contains no sheets: {}", path.display()))?,
    };

    let range = workbook
        .worksheet_range(&c_sheet_name)
        .map_err(|err| format!("Failed to read sheet {c_sheet_name:?}: {err}"))?;

    let table = derive_table_from_range(&range)?;
    debug!(
        path = %path.display(),
        sheet = %c_sheet_name,
        n_rows = table.height(),
        n_cols = table.width(),
        "loaded worksheet"
    );
    Ok(table)
}

/// Decode a Polars IPC payload into a table.
pub fn read_table_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<SpecTable, String> {
    let df = IpcReader::new(Cursor::new(v_ipc_df))
        .finish()
        .map_err(|err| format!("Failed to read IPC DataFrame bytes: {err}"))?;
    SpecTable::from_dataframe(&df)
}

/// Convert a used range into a table: first row is the header, the rest is data.
pub fn derive_table_from_range(range: &Range<Data>) -> Result<SpecTable, String> {
    let mut iter_rows = range.rows();
    let Some(row_header) = iter_rows.next() else {
        return Ok(SpecTable::default());
    };

    let l_headers_raw: Vec<String> = row_header.iter().map(derive_header_text).collect();
    let l_columns = derive_unique_column_names(&l_headers_raw);

    // fully blank rows inside the used range are not data
    let l_rows = iter_rows
        .map(|row| {
            row.iter()
                .map(derive_cell_value_from_data)
                .collect::<Vec<EnumCellValue>>()
        })
        .filter(|row| !row.iter().all(EnumCellValue::is_missing))
        .collect();

    SpecTable::new(l_columns, l_rows)
}

fn derive_header_text(value: &Data) -> String {
    match derive_cell_value_from_data(value) {
        EnumCellValue::None => String::new(),
        other => other.to_string(),
    }
}

fn derive_cell_value_from_data(value: &Data) -> EnumCellValue {
    match value {
        Data::Empty => EnumCellValue::None,
        Data::String(val) => EnumCellValue::from_text(val.clone()),
        Data::Float(val) => EnumCellValue::from_number(*val),
        Data::Int(val) => EnumCellValue::Number(*val as f64),
        Data::Bool(val) => EnumCellValue::String(if *val { "True" } else { "False" }.to_string()),
        Data::DateTime(val) => match val.as_datetime() {
            Some(dt) => EnumCellValue::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => EnumCellValue::from_number(val.as_f64()),
        },
        Data::DateTimeIso(val) => EnumCellValue::from_text(val.clone()),
        Data::DurationIso(val) => EnumCellValue::from_text(val.clone()),
        Data::Error(err) => EnumCellValue::String(err.to_string()),
    }
}
