//! XLSX constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::{SpecCellFormat, SpecXlsxWriteOptions};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];
/// Sheet name Excel reserves for change tracking (compared case-insensitively).
pub const C_SHEET_NAME_RESERVED: &str = "History";
/// Fallback sheet name when sanitizing leaves nothing.
pub const C_SHEET_NAME_FALLBACK: &str = "Sheet";
/// Input extensions the reader accepts (lower-case, no dot).
pub const TUP_SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];
/// Header text used for blank header cells; `{}` is the zero-based column index.
pub const C_HEADER_UNNAMED_PREFIX: &str = "Unnamed: ";

/// Canonical format preset keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFmtKey {
    /// Generic text cell format.
    Text,
    /// Integer number format.
    Integer,
    /// Decimal number format.
    Decimal,
    /// Header cell format.
    Header,
}

impl EnumFmtKey {
    /// Preset key as stored in [`derive_default_xlsx_formats`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Header => "header",
        }
    }
}

/// Build default named format presets used by [`crate::writer::XlsxWriter`].
///
/// Decimals keep the `General` number format so split output shows the same
/// digits as the source workbook.
pub fn derive_default_xlsx_formats() -> BTreeMap<String, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert(EnumFmtKey::Text.as_str().to_string(), cfg_base_fmt_spec.clone());
    dict_fmt.insert(
        EnumFmtKey::Header.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            align: Some("center".to_string()),
            border: Some(true),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Integer.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("0".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Decimal.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("General".to_string()),
            ..Default::default()
        }),
    );

    dict_fmt
}

/// Build default write options.
pub fn derive_default_xlsx_write_options() -> SpecXlsxWriteOptions {
    SpecXlsxWriteOptions::default()
}
