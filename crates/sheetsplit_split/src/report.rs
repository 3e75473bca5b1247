//! Split report model.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::conf::C_REPORT_PREFIX;

/// One sheet written by a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetSplit {
    /// Final sheet name in the output workbook.
    pub sheet_name: String,
    /// Key value the sheet was built from, before sanitizing/truncation.
    pub key_label: String,
    /// Data rows in the sheet (header excluded).
    pub n_rows: usize,
}

/// Outcome of one split run.
#[derive(Debug, Default, Clone)]
pub struct ReportSplit {
    /// Published workbook; `None` until the workbook is on disk.
    pub path_file_out: Option<PathBuf>,
    /// Sheets in workbook order.
    pub sheets: Vec<SpecSheetSplit>,
    /// Data rows in the source table.
    pub n_rows_total: usize,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl ReportSplit {
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Rows written across all sheets.
    pub fn rows_written(&self) -> usize {
        self.sheets.iter().map(|sheet| sheet.n_rows).sum()
    }

    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_sheets".to_string(), self.sheet_count() as u64);
        dict_counts.insert("cnt_rows_total".to_string(), self.n_rows_total as u64);
        dict_counts.insert("cnt_rows_written".to_string(), self.rows_written() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let c_path = self
            .path_file_out
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{prefix} sheets={} rows={} warnings={} file={c_path}",
            self.sheet_count(),
            self.n_rows_total,
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(C_REPORT_PREFIX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_line_lists_counts_and_path() {
        let mut report = ReportSplit {
            path_file_out: Some(PathBuf::from("/d/report_分頁.xlsx")),
            sheets: vec![
                SpecSheetSplit {
                    sheet_name: "North".to_string(),
                    key_label: "North".to_string(),
                    n_rows: 2,
                },
                SpecSheetSplit {
                    sheet_name: "South".to_string(),
                    key_label: "South".to_string(),
                    n_rows: 1,
                },
            ],
            n_rows_total: 3,
            warnings: Vec::new(),
        };
        report.warn("note");

        assert_eq!(
            report.to_string(),
            "[SPLIT] sheets=2 rows=3 warnings=1 file=/d/report_分頁.xlsx"
        );
        assert_eq!(report.to_dict()["cnt_rows_written"], 3);
    }

    #[test]
    fn unpublished_report_has_placeholder_path() {
        assert_eq!(
            ReportSplit::default().format("[DRY]"),
            "[DRY] sheets=0 rows=0 warnings=0 file=-"
        );
    }
}
