//! Split request/options models and the top-level error taxonomy.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use sheetsplit_io_fs::{PublishError, SpecDestinationOptions};
use sheetsplit_io_xlsx::{SpecAutofitCellsPolicy, SpecTable, SpecXlsxReadOptions};
use thiserror::Error;
use tracing::warn;

use crate::conf::C_EMPTY_KEY_LABEL_DEFAULT;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Order in which groups become sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumGroupOrderRule {
    /// Numbers ascending, then texts ascending, then the empty group.
    #[default]
    Ascending,
    /// Order of first appearance in the table.
    FirstSeen,
}

impl EnumGroupOrderRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::FirstSeen => "first_seen",
        }
    }
}

impl FromStr for EnumGroupOrderRule {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ascending" => Ok(Self::Ascending),
            "first_seen" | "first-seen" => Ok(Self::FirstSeen),
            _ => Err(format!(
                "Invalid group order: `{value}`. Expected one of: ['ascending', 'first_seen']"
            )),
        }
    }
}

/// How key labels that break Excel naming rules are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumSheetNameRule {
    /// Replace illegal characters with `_` and trim.
    #[default]
    Sanitize,
    /// Fail with [`SplitError::InvalidSheetName`].
    Strict,
}

impl EnumSheetNameRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sanitize => "sanitize",
            Self::Strict => "strict",
        }
    }
}

impl FromStr for EnumSheetNameRule {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "sanitize" => Ok(Self::Sanitize),
            "strict" => Ok(Self::Strict),
            _ => Err(format!(
                "Invalid sheet name rule: `{value}`. Expected one of: ['sanitize', 'strict']"
            )),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RequestAndOptions

/// What to split: the grouping column and the columns kept in every sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSplitRequest {
    /// Column whose distinct values become sheets.
    pub col_group: String,
    /// Columns written to each sheet, in this order.
    pub cols_output: Vec<String>,
}

/// Column positions resolved by [`SpecSplitRequest::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecResolvedColumns {
    /// Position of the grouping column.
    pub idx_col_group: usize,
    /// Positions of the output columns, duplicates removed.
    pub cols_idx: Vec<usize>,
    /// Non-fatal notes raised during resolution.
    pub warnings: Vec<String>,
}

impl SpecSplitRequest {
    pub fn new<I, S>(col_group: impl Into<String>, cols_output: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            col_group: col_group.into(),
            cols_output: cols_output.into_iter().map(Into::into).collect(),
        }
    }

    /// Put the grouping column first in `cols_output` unless already selected.
    pub fn with_group_column_locked(mut self) -> Self {
        if !self.cols_output.contains(&self.col_group) {
            self.cols_output.insert(0, self.col_group.clone());
        }
        self
    }

    /// Resolve column names against `table`.
    ///
    /// Checks run in order: grouping column exists, selection is non-empty,
    /// every output column exists.
    pub fn validate(&self, table: &SpecTable) -> Result<SpecResolvedColumns, SplitError> {
        let derive_missing = |column: &str| SplitError::InvalidColumn {
            column: column.to_string(),
            columns_available: table.columns().to_vec(),
        };

        let idx_col_group = table
            .column_index(&self.col_group)
            .ok_or_else(|| derive_missing(&self.col_group))?;

        if self.cols_output.is_empty() {
            return Err(SplitError::EmptySelection);
        }

        let mut cols_idx = Vec::with_capacity(self.cols_output.len());
        let mut warnings = Vec::new();
        for c_col in &self.cols_output {
            let n_idx = table
                .column_index(c_col)
                .ok_or_else(|| derive_missing(c_col))?;
            if cols_idx.contains(&n_idx) {
                let c_msg =
                    format!("Output column {c_col:?} selected more than once; kept the first.");
                warn!("{c_msg}");
                warnings.push(c_msg);
                continue;
            }
            cols_idx.push(n_idx);
        }

        Ok(SpecResolvedColumns {
            idx_col_group,
            cols_idx,
            warnings,
        })
    }
}

/// Behaviour knobs for one split.
#[derive(Debug, Clone)]
pub struct SpecSplitOptions {
    /// Sheet ordering.
    pub rule_group_order: EnumGroupOrderRule,
    /// Handling of illegal sheet-name characters.
    pub rule_sheet_name: EnumSheetNameRule,
    /// Sheet label for blank key cells.
    pub empty_key_label: String,
    /// Output file naming.
    pub destination: SpecDestinationOptions,
    /// Source worksheet selection.
    pub read: SpecXlsxReadOptions,
    /// Column width inference for written sheets.
    pub policy_autofit: SpecAutofitCellsPolicy,
}

impl Default for SpecSplitOptions {
    fn default() -> Self {
        Self {
            rule_group_order: EnumGroupOrderRule::default(),
            rule_sheet_name: EnumSheetNameRule::default(),
            empty_key_label: C_EMPTY_KEY_LABEL_DEFAULT.to_string(),
            destination: SpecDestinationOptions::default(),
            read: SpecXlsxReadOptions::default(),
            policy_autofit: SpecAutofitCellsPolicy::default(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Every way a split can fail. All are terminal for the call.
#[derive(Error, Debug)]
pub enum SplitError {
    /// Source could not be opened or parsed.
    #[error("Failed to read {}: {message}", .path.display())]
    ReadFailure { path: PathBuf, message: String },

    /// A requested column is not in the table.
    #[error("Column not found: {column:?}. Available: {columns_available:?}")]
    InvalidColumn {
        column: String,
        columns_available: Vec<String>,
    },

    /// No output column selected.
    #[error("No output columns selected.")]
    EmptySelection,

    /// Two groups map to the same sheet name.
    #[error("Groups {key_first:?} and {key_second:?} both map to sheet name {sheet_name:?}.")]
    DuplicateSheetName {
        sheet_name: String,
        key_first: String,
        key_second: String,
    },

    /// A key label is not a legal sheet name under the strict rule.
    #[error("Group {key:?} is not a valid sheet name: {message}")]
    InvalidSheetName { key: String, message: String },

    /// Workbook could not be rendered or published.
    #[error("Failed to write workbook: {0}")]
    WriteFailure(String),
}

impl SplitError {
    /// `true` for errors caused by the request rather than the filesystem.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidColumn { .. }
                | Self::EmptySelection
                | Self::DuplicateSheetName { .. }
                | Self::InvalidSheetName { .. }
        )
    }

    /// Stable variant name, as exposed to front-ends.
    pub fn kind(&self) -> EnumSplitErrorKind {
        match self {
            Self::ReadFailure { .. } => EnumSplitErrorKind::ReadFailure,
            Self::InvalidColumn { .. } => EnumSplitErrorKind::InvalidColumn,
            Self::EmptySelection => EnumSplitErrorKind::EmptySelection,
            Self::DuplicateSheetName { .. } => EnumSplitErrorKind::DuplicateSheetName,
            Self::InvalidSheetName { .. } => EnumSplitErrorKind::InvalidSheetName,
            Self::WriteFailure(_) => EnumSplitErrorKind::WriteFailure,
        }
    }
}

impl From<PublishError> for SplitError {
    fn from(err: PublishError) -> Self {
        Self::WriteFailure(err.to_string())
    }
}

/// Fieldless mirror of [`SplitError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumSplitErrorKind {
    ReadFailure,
    InvalidColumn,
    EmptySelection,
    DuplicateSheetName,
    InvalidSheetName,
    WriteFailure,
}

impl fmt::Display for EnumSplitErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c_name = match self {
            Self::ReadFailure => "ReadFailure",
            Self::InvalidColumn => "InvalidColumn",
            Self::EmptySelection => "EmptySelection",
            Self::DuplicateSheetName => "DuplicateSheetName",
            Self::InvalidSheetName => "InvalidSheetName",
            Self::WriteFailure => "WriteFailure",
        };
        write!(f, "{c_name}")
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
