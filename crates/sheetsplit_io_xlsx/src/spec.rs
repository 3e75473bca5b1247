//! Shared XLSX specification models.

use std::fmt;

////////////////////////////////////////////////////////////////////////////////
// #region CellValueSpecification

/// Normalized cell value shared by reader, table and writer.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

impl EnumCellValue {
    /// Build a text cell, mapping the empty string to [`EnumCellValue::None`].
    pub fn from_text(value: impl Into<String>) -> Self {
        let c_value = value.into();
        if c_value.is_empty() {
            Self::None
        } else {
            Self::String(c_value)
        }
    }

    /// Build a numeric cell, mapping `NaN` to [`EnumCellValue::None`].
    pub fn from_number(value: f64) -> Self {
        if value.is_nan() {
            Self::None
        } else {
            Self::Number(value)
        }
    }

    /// `true` for [`EnumCellValue::None`] and the empty string.
    pub fn is_missing(&self) -> bool {
        match self {
            Self::None => true,
            Self::String(s) => s.is_empty(),
            Self::Number(n) => n.is_nan(),
        }
    }
}

impl fmt::Display for EnumCellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::String(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{}", format_number_text(*n)),
        }
    }
}

/// Render a number the way a spreadsheet user reads it: integral values
/// without a decimal point, other values in shortest round-trip form.
pub fn format_number_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        let n_value = if value == 0.0 { 0.0 } else { value };
        return format!("{}", n_value as i64);
    }
    format!("{value}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Bold style.
    pub bold: Option<bool>,
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Thin border on all sides.
    pub border: Option<bool>,
    /// Number format code.
    pub num_format: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReadOptions

/// Options for loading one worksheet into a [`crate::table::SpecTable`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReadOptions {
    /// Worksheet to load; the first worksheet when `None`.
    pub sheet_name: Option<String>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Autofit rule for column width inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumAutofitColumnsRule {
    /// Disable autofit.
    None,
    /// Infer width from header cells only.
    Header,
    /// Infer width from body cells only.
    Body,
    /// Infer width from both header and body cells (default).
    #[default]
    All,
}

/// Autofit policy for per-sheet write call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    /// Autofit width inference rule.
    pub rule_columns: EnumAutofitColumnsRule,
    /// Max body rows inspected when body-based inference is active.
    pub height_body_inferred_max: Option<usize>,
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            rule_columns: EnumAutofitColumnsRule::All,
            height_body_inferred_max: Some(20_000),
            width_cell_min: 8,
            width_cell_max: 60,
            width_cell_padding: 2,
        }
    }
}

impl SpecAutofitCellsPolicy {
    /// Check width bounds before any cell is written.
    pub fn validate(&self) -> Result<(), String> {
        if self.width_cell_min == 0 {
            return Err("policy_autofit.width_cell_min must be >= 1.".to_string());
        }
        if self.width_cell_max < self.width_cell_min {
            return Err(
                "policy_autofit.width_cell_max must be >= policy_autofit.width_cell_min."
                    .to_string(),
            );
        }
        Ok(())
    }
}

/// Writer-wide options controlling formatting defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxWriteOptions {
    /// Apply the integer format to columns whose numbers are all integral.
    pub infer_integer_cols: bool,
    /// Freeze the header row in every sheet.
    pub if_freeze_header: bool,
}

impl Default for SpecXlsxWriteOptions {
    fn default() -> Self {
        Self {
            infer_integer_cols: true,
            if_freeze_header: true,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// One worksheet emitted to the workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetWritten {
    /// Final sheet name in the workbook.
    pub sheet_name: String,
    /// Data rows written below the header.
    pub n_rows: usize,
    /// Columns written.
    pub n_cols: usize,
}

/// Per-write call report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheets produced by the write call.
    pub sheets: Vec<SpecSheetWritten>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_text_drops_trailing_zero_fraction() {
        assert_eq!(format_number_text(10.0), "10");
        assert_eq!(format_number_text(-3.0), "-3");
        assert_eq!(format_number_text(-0.0), "0");
        assert_eq!(format_number_text(10.5), "10.5");
        assert_eq!(format_number_text(1e20), "100000000000000000000");
    }

    #[test]
    fn cell_constructors_normalize_missing_values() {
        assert_eq!(EnumCellValue::from_text(""), EnumCellValue::None);
        assert_eq!(EnumCellValue::from_number(f64::NAN), EnumCellValue::None);
        assert!(EnumCellValue::String(String::new()).is_missing());
        assert!(!EnumCellValue::String(" ".to_string()).is_missing());
        assert_eq!(EnumCellValue::Number(2.5).to_string(), "2.5");
    }

    #[test]
    fn format_merge_prefers_right_side() {
        let base = SpecCellFormat {
            bold: Some(false),
            align: Some("left".to_string()),
            ..Default::default()
        };
        let merged = base.with_(SpecCellFormat {
            bold: Some(true),
            ..Default::default()
        });
        assert_eq!(merged.bold, Some(true));
        assert_eq!(merged.align.as_deref(), Some("left"));
    }

    #[test]
    fn autofit_policy_rejects_inverted_bounds() {
        let policy = SpecAutofitCellsPolicy {
            width_cell_min: 10,
            width_cell_max: 5,
            ..Default::default()
        };
        assert!(policy.validate().is_err());
        assert!(SpecAutofitCellsPolicy::default().validate().is_ok());
    }
}
