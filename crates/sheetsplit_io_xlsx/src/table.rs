//! In-memory table model: named columns over rows of [`EnumCellValue`].

use polars::prelude::{AnyValue, DataFrame};

use crate::spec::EnumCellValue;
use crate::util::validate_unique_columns;

/// Rectangular table loaded from one worksheet.
///
/// Every row has exactly `columns.len()` cells, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecTable {
    columns: Vec<String>,
    rows: Vec<Vec<EnumCellValue>>,
}

impl SpecTable {
    /// Build a table, rejecting duplicated column names and ragged rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<EnumCellValue>>) -> Result<Self, String> {
        validate_unique_columns(&columns)?;
        let n_width = columns.len();
        if let Some((n_idx_row, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_width)
        {
            return Err(format!(
                "Row {n_idx_row} has {} cells; expected {n_width}.",
                row.len()
            ));
        }
        Ok(Self { columns, rows })
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in original order.
    pub fn rows(&self) -> &[Vec<EnumCellValue>] {
        &self.rows
    }

    /// Number of data rows (header excluded).
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Zero-based index of column `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c_name| c_name == name)
    }

    /// Convert a Polars frame into a table.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self, String> {
        let l_columns: Vec<String> = df
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();

        let l_cols = df.get_columns();
        let mut l_rows = Vec::with_capacity(df.height());
        for n_idx_row in 0..df.height() {
            let mut row = Vec::with_capacity(l_cols.len());
            for col in l_cols {
                let value = col
                    .get(n_idx_row)
                    .map_err(|err| format!("Failed to access cell value: {err}"))?;
                row.push(derive_cell_value_from_any_value(value));
            }
            l_rows.push(row);
        }

        Self::new(l_columns, l_rows)
    }
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::from_text(val),
        AnyValue::StringOwned(val) => EnumCellValue::from_text(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int128(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::from_number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::from_number(val),
        _ => EnumCellValue::from_text(value.to_string()),
    }
}
