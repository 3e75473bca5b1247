//! Row grouping by key value and sheet-name planning.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use sheetsplit_io_xlsx::{
    EnumCellValue, SpecTable, derive_sheet_name_key, format_number_text, sanitize_sheet_name,
    truncate_sheet_name, validate_sheet_name,
};

use crate::conf::C_SHEET_NAME_REPLACEMENT;
use crate::spec::{EnumGroupOrderRule, EnumSheetNameRule, SplitError};

////////////////////////////////////////////////////////////////////////////////
// #region GroupKey

/// Grouping key of one row.
///
/// Blank cells (`None`, `""`, `NaN`) all map to [`EnumGroupKey::Empty`].
/// Ordering: numbers ascending, then texts by bytes, then `Empty`.
#[derive(Debug, Clone)]
pub enum EnumGroupKey {
    Number(f64),
    Text(String),
    Empty,
}

impl EnumGroupKey {
    pub fn from_cell(value: &EnumCellValue) -> Self {
        if value.is_missing() {
            return Self::Empty;
        }
        match value {
            EnumCellValue::None => Self::Empty,
            EnumCellValue::String(s) => Self::Text(s.clone()),
            // -0.0 and 0.0 are one group
            EnumCellValue::Number(n) => Self::Number(if *n == 0.0 { 0.0 } else { *n }),
        }
    }

    /// Text shown to the user for this key.
    pub fn label(&self, empty_key_label: &str) -> String {
        match self {
            Self::Number(n) => format_number_text(*n),
            Self::Text(s) => s.clone(),
            Self::Empty => empty_key_label.to_string(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::Text(_) => 1,
            Self::Empty => 2,
        }
    }
}

impl Ord for EnumGroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for EnumGroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for EnumGroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EnumGroupKey {}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Planning

/// Rows sharing one key, in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecGroup {
    pub key: EnumGroupKey,
    pub rows_idx: Vec<usize>,
}

/// One sheet to write: final name, the key label it came from and its rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetPlan {
    pub sheet_name: String,
    pub key_label: String,
    pub rows_idx: Vec<usize>,
}

/// Partition the rows of `table` by the value in column `idx_col_group`.
///
/// Every row lands in exactly one group; groups are never empty.
pub fn plan_groups(
    table: &SpecTable,
    idx_col_group: usize,
    rule_group_order: EnumGroupOrderRule,
) -> Vec<SpecGroup> {
    let mut dict_pos_by_key: BTreeMap<EnumGroupKey, usize> = BTreeMap::new();
    let mut l_groups: Vec<SpecGroup> = Vec::new();

    for (n_idx_row, row) in table.rows().iter().enumerate() {
        let key = EnumGroupKey::from_cell(&row[idx_col_group]);
        match dict_pos_by_key.get(&key) {
            Some(n_pos) => l_groups[*n_pos].rows_idx.push(n_idx_row),
            None => {
                dict_pos_by_key.insert(key.clone(), l_groups.len());
                l_groups.push(SpecGroup {
                    key,
                    rows_idx: vec![n_idx_row],
                });
            }
        }
    }

    if rule_group_order == EnumGroupOrderRule::Ascending {
        l_groups.sort_by(|a, b| a.key.cmp(&b.key));
    }
    l_groups
}

/// Derive one sheet name per group and reject collisions.
///
/// Names are compared the way Excel does (case-insensitively), so `north`
/// and `North` collide, as do two labels sharing their first 31 characters.
pub fn plan_sheet_names(
    groups: &[SpecGroup],
    rule_sheet_name: EnumSheetNameRule,
    empty_key_label: &str,
) -> Result<Vec<SpecSheetPlan>, SplitError> {
    let mut dict_label_by_name: HashMap<String, String> = HashMap::new();
    let mut l_plans = Vec::with_capacity(groups.len());

    for group in groups {
        let key_label = group.key.label(empty_key_label);
        let sheet_name = match rule_sheet_name {
            EnumSheetNameRule::Sanitize => {
                sanitize_sheet_name(&key_label, C_SHEET_NAME_REPLACEMENT)
            }
            EnumSheetNameRule::Strict => truncate_sheet_name(&key_label),
        };
        validate_sheet_name(&sheet_name).map_err(|message| SplitError::InvalidSheetName {
            key: key_label.clone(),
            message,
        })?;

        let c_name_key = derive_sheet_name_key(&sheet_name);
        if let Some(key_first) = dict_label_by_name.get(&c_name_key) {
            return Err(SplitError::DuplicateSheetName {
                sheet_name,
                key_first: key_first.clone(),
                key_second: key_label,
            });
        }
        dict_label_by_name.insert(c_name_key, key_label.clone());

        l_plans.push(SpecSheetPlan {
            sheet_name,
            key_label,
            rows_idx: group.rows_idx.clone(),
        });
    }

    Ok(l_plans)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
