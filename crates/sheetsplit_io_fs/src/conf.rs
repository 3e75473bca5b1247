//! Destination naming constants.

/// Suffix appended to the source stem (`report.xlsx` -> `report_分頁.xlsx`).
pub const C_SUFFIX_SPLIT_DEFAULT: &str = "_分頁";
/// Extension written when the source extension cannot hold the output.
pub const C_EXTENSION_OUTPUT_DEFAULT: &str = "xlsx";
/// Prefix of the hidden temp file staged next to the destination.
pub const C_PREFIX_TEMP_FILE: &str = ".sheetsplit-";
/// Suffix of the staged temp file.
pub const C_SUFFIX_TEMP_FILE: &str = ".tmp";
/// Upper bound on candidate names tried before giving up.
pub const N_ATTEMPTS_DESTINATION_MAX: usize = 10_000;
