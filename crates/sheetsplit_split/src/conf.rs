//! Splitter defaults.

/// Label of the group collecting blank key cells.
pub const C_EMPTY_KEY_LABEL_DEFAULT: &str = "(empty)";
/// Replacement for characters Excel rejects in sheet names.
pub const C_SHEET_NAME_REPLACEMENT: &str = "_";
/// Prefix of the one-line report summary.
pub const C_REPORT_PREFIX: &str = "[SPLIT]";
