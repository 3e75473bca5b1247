//! `sheetsplit_io_xlsx` v1:
//! Spreadsheet read/write kernel for the sheet splitter.
//!
//! Modules:
//! - `conf`   : constants and default presets
//! - `spec`   : cell values, formats, options and reports
//! - `table`  : in-memory table model
//! - `reader` : calamine-backed worksheet loader
//! - `util`   : pure helper functions (column names, sheet names, paths)
//! - `writer` : in-memory workbook writer
pub mod conf;
pub mod reader;
pub mod spec;
pub mod table;
pub mod util;
pub mod writer;

pub use conf::{
    C_SHEET_NAME_FALLBACK, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    TUP_EXCEL_ILLEGAL, TUP_SPREADSHEET_EXTENSIONS,
};
pub use reader::{read_sheet_names, read_table, read_table_from_ipc_bytes};
pub use spec::{
    EnumAutofitColumnsRule, EnumCellValue, SpecAutofitCellsPolicy, SpecCellFormat,
    SpecSheetWritten, SpecXlsxReadOptions, SpecXlsxReport, SpecXlsxWriteOptions,
    format_number_text,
};
pub use table::SpecTable;
pub use util::{
    derive_extension_lower, derive_sheet_name_key, sanitize_sheet_name, truncate_sheet_name,
    validate_sheet_name, validate_spreadsheet_extension,
};
pub use writer::{SpecXlsxSheetWriteOptions, XlsxWriter};
