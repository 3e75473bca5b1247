//! Stateless helper utilities shared by the reader and writer kernels.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::conf::{
    C_HEADER_UNNAMED_PREFIX, C_SHEET_NAME_FALLBACK, C_SHEET_NAME_RESERVED,
    N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL, TUP_SPREADSHEET_EXTENSIONS,
};

////////////////////////////////////////////////////////////////////////////////
// #region ColumnNameUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), String> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter_map(|(c_name, l_pos)| {
            if l_pos.len() > 1 {
                Some(format!(
                    "{c_name:?} x{} at indices {:?}",
                    l_pos.len(),
                    l_pos
                ))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(format!("Duplicate column names detected: {c_msg}"))
}

/// Turn raw header texts into unique column names.
///
/// Blank headers become `Unnamed: {idx}`; repeats get `.1`, `.2`, ... appended
/// while the first occurrence keeps the bare name.
pub fn derive_unique_column_names(headers_raw: &[String]) -> Vec<String> {
    let mut set_names_taken: BTreeSet<String> = BTreeSet::new();
    let mut l_names = Vec::with_capacity(headers_raw.len());

    for (n_idx, c_header) in headers_raw.iter().enumerate() {
        let c_base = if c_header.trim().is_empty() {
            format!("{C_HEADER_UNNAMED_PREFIX}{n_idx}")
        } else {
            c_header.clone()
        };

        let mut c_name = c_base.clone();
        let mut n_dup = 1usize;
        while set_names_taken.contains(&c_name) {
            c_name = format!("{c_base}.{n_dup}");
            n_dup += 1;
        }
        set_names_taken.insert(c_name.clone());
        l_names.push(c_name);
    }

    l_names
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = String::with_capacity(name.len());
    for chr in name.chars() {
        if TUP_EXCEL_ILLEGAL.contains(&chr) {
            c_name.push_str(replace_to);
        } else {
            c_name.push(chr);
        }
    }

    let mut c_name = trim_sheet_name(&c_name).to_string();
    if c_name.is_empty() {
        c_name = C_SHEET_NAME_FALLBACK.to_string();
    }

    let c_truncated = truncate_sheet_name(&c_name);
    let c_trimmed = trim_sheet_name(&c_truncated);
    if c_trimmed.is_empty() {
        C_SHEET_NAME_FALLBACK.to_string()
    } else {
        c_trimmed.to_string()
    }
}

/// Cut `name` to the Excel sheet-name length limit without rewriting characters.
pub fn truncate_sheet_name(name: &str) -> String {
    name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

fn trim_sheet_name(name: &str) -> &str {
    name.trim().trim_matches('\'').trim()
}

/// Return the first Excel naming rule `name` violates, if any.
pub fn validate_sheet_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Sheet name must not be empty.".to_string());
    }
    let n_len = name.chars().count();
    if n_len > N_LEN_EXCEL_SHEET_NAME_MAX {
        return Err(format!(
            "Sheet name {name:?} has {n_len} characters; the limit is {N_LEN_EXCEL_SHEET_NAME_MAX}."
        ));
    }
    if let Some(chr) = name.chars().find(|chr| TUP_EXCEL_ILLEGAL.contains(chr)) {
        return Err(format!(
            "Sheet name {name:?} contains illegal character {chr:?}."
        ));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(format!(
            "Sheet name {name:?} must not start or end with an apostrophe."
        ));
    }
    if name.eq_ignore_ascii_case(C_SHEET_NAME_RESERVED) {
        return Err(format!("Sheet name {name:?} is reserved by Excel."));
    }
    Ok(())
}

/// Key under which Excel considers two sheet names equal.
pub fn derive_sheet_name_key(name: &str) -> String {
    name.to_lowercase()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtils

/// Lower-cased extension of `path`, without the dot.
pub fn derive_extension_lower(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

/// Fail unless `path` carries one of [`TUP_SPREADSHEET_EXTENSIONS`].
pub fn validate_spreadsheet_extension(path: &Path) -> Result<(), String> {
    match derive_extension_lower(path) {
        Some(ext) if TUP_SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        Some(ext) => Err(format!(
            "Unsupported spreadsheet extension `.{ext}` for {}. Expected one of: {:?}",
            path.display(),
            TUP_SPREADSHEET_EXTENSIONS
        )),
        None => Err(format!(
            "Missing spreadsheet extension for {}. Expected one of: {:?}",
            path.display(),
            TUP_SPREADSHEET_EXTENSIONS
        )),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
