//! `sheetsplit_split` v1:
//! Group rows of one worksheet by a key column and write one sheet per group.
//!
//! Modules:
//! - `conf`   : defaults
//! - `spec`   : request/options/errors
//! - `group`  : grouping and sheet-name planning
//! - `report` : run-time report model
//! - `split`  : orchestration (render + publish)

pub mod conf;
pub mod group;
pub mod report;
pub mod spec;
pub mod split;

pub use conf::{C_EMPTY_KEY_LABEL_DEFAULT, C_REPORT_PREFIX};
pub use group::{EnumGroupKey, SpecGroup, SpecSheetPlan, plan_groups, plan_sheet_names};
pub use report::{ReportSplit, SpecSheetSplit};
pub use spec::{
    EnumGroupOrderRule, EnumSheetNameRule, EnumSplitErrorKind, SpecResolvedColumns,
    SpecSplitOptions, SpecSplitRequest, SplitError,
};
pub use split::{render_workbook, split_table, split_workbook};
