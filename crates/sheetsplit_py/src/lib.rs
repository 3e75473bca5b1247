use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pyo3::create_exception;
use pyo3::exceptions::{PyOSError, PyValueError};
use pyo3::prelude::*;
use sheetsplit_io_fs::{SpecDestinationOptions, SplitSuffixPathBuilder};
use sheetsplit_io_xlsx::{
    SpecXlsxReadOptions, read_sheet_names, read_table, read_table_from_ipc_bytes,
};
use sheetsplit_split::{
    C_EMPTY_KEY_LABEL_DEFAULT, C_REPORT_PREFIX, EnumGroupOrderRule, EnumSheetNameRule,
    EnumSplitErrorKind, ReportSplit, SpecSplitOptions, SpecSplitRequest, SplitError, split_table,
    split_workbook,
};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "sheetsplit.split.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

create_exception!(_sheetsplit_rs, ReadFailure, PyOSError);
create_exception!(_sheetsplit_rs, WriteFailure, PyOSError);
create_exception!(_sheetsplit_rs, InvalidColumn, PyValueError);
create_exception!(_sheetsplit_rs, EmptySelection, PyValueError);
create_exception!(_sheetsplit_rs, DuplicateSheetName, PyValueError);
create_exception!(_sheetsplit_rs, InvalidSheetName, PyValueError);

#[pyclass(name = "ReportSplit")]
#[derive(Debug, Clone)]
struct PyReportSplit {
    inner: ReportSplit,
}

impl From<ReportSplit> for PyReportSplit {
    fn from(report_split: ReportSplit) -> Self {
        Self {
            inner: report_split,
        }
    }
}

#[pymethods]
impl PyReportSplit {
    #[getter]
    fn file_out(&self) -> Option<String> {
        self.inner
            .path_file_out
            .as_ref()
            .map(|path| path.to_string_lossy().to_string())
    }

    /// `(sheet_name, key_label, n_rows)` per sheet, in workbook order.
    #[getter]
    fn sheets(&self) -> Vec<(String, String, usize)> {
        self.inner
            .sheets
            .iter()
            .map(|sheet| (sheet.sheet_name.clone(), sheet.key_label.clone(), sheet.n_rows))
            .collect()
    }

    #[getter]
    fn n_rows_total(&self) -> usize {
        self.inner.n_rows_total
    }

    #[getter]
    fn warnings(&self) -> Vec<String> {
        self.inner.warnings.clone()
    }

    #[getter]
    fn sheet_count(&self) -> usize {
        self.inner.sheet_count()
    }

    #[getter]
    fn warning_count(&self) -> usize {
        self.inner.warning_count()
    }

    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.inner.to_dict()
    }

    #[pyo3(signature = (prefix = None))]
    fn format(&self, prefix: Option<&str>) -> String {
        self.inner.format(prefix.unwrap_or(C_REPORT_PREFIX))
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }
}

fn parse_rule_group_order(value: &str) -> PyResult<EnumGroupOrderRule> {
    value.parse().map_err(PyValueError::new_err)
}

fn parse_rule_sheet_name(value: &str) -> PyResult<EnumSheetNameRule> {
    value.parse().map_err(PyValueError::new_err)
}

fn map_split_error(exception: SplitError) -> PyErr {
    let c_msg = exception.to_string();
    match exception.kind() {
        EnumSplitErrorKind::ReadFailure => ReadFailure::new_err(c_msg),
        EnumSplitErrorKind::WriteFailure => WriteFailure::new_err(c_msg),
        EnumSplitErrorKind::InvalidColumn => InvalidColumn::new_err(c_msg),
        EnumSplitErrorKind::EmptySelection => EmptySelection::new_err(c_msg),
        EnumSplitErrorKind::DuplicateSheetName => DuplicateSheetName::new_err(c_msg),
        EnumSplitErrorKind::InvalidSheetName => InvalidSheetName::new_err(c_msg),
    }
}

fn derive_split_request(
    col_group: String,
    cols_output: Vec<String>,
    if_lock_group_column: bool,
) -> SpecSplitRequest {
    let request = SpecSplitRequest::new(col_group, cols_output);
    if if_lock_group_column {
        request.with_group_column_locked()
    } else {
        request
    }
}

fn derive_split_options(
    sheet_name: Option<String>,
    rule_group_order: &str,
    rule_sheet_name: &str,
    empty_key_label: String,
    dir_out: Option<String>,
) -> PyResult<SpecSplitOptions> {
    Ok(SpecSplitOptions {
        rule_group_order: parse_rule_group_order(rule_group_order)?,
        rule_sheet_name: parse_rule_sheet_name(rule_sheet_name)?,
        empty_key_label,
        destination: SpecDestinationOptions {
            dir_out: dir_out.map(PathBuf::from),
            ..Default::default()
        },
        read: SpecXlsxReadOptions { sheet_name },
        ..Default::default()
    })
}

#[pyfunction(name = "read_columns")]
#[pyo3(signature = (file_in, sheet_name = None))]
fn read_columns_py(
    py: Python<'_>,
    file_in: String,
    sheet_name: Option<String>,
) -> PyResult<Vec<String>> {
    let read_options = SpecXlsxReadOptions { sheet_name };
    let table = py
        .allow_threads(|| read_table(&file_in, &read_options))
        .map_err(ReadFailure::new_err)?;
    Ok(table.columns().to_vec())
}

#[pyfunction(name = "read_sheet_names")]
fn read_sheet_names_py(py: Python<'_>, file_in: String) -> PyResult<Vec<String>> {
    py.allow_threads(|| read_sheet_names(&file_in))
        .map_err(ReadFailure::new_err)
}

#[pyfunction(name = "split_workbook")]
#[pyo3(signature = (
    file_in,
    col_group,
    cols_output,
    *,
    sheet_name = None,
    rule_group_order = "ascending",
    rule_sheet_name = "sanitize",
    empty_key_label = C_EMPTY_KEY_LABEL_DEFAULT.to_string(),
    dir_out = None,
    if_lock_group_column = true
))]
#[allow(clippy::too_many_arguments)]
fn split_workbook_py(
    py: Python<'_>,
    file_in: String,
    col_group: String,
    cols_output: Vec<String>,
    sheet_name: Option<String>,
    rule_group_order: &str,
    rule_sheet_name: &str,
    empty_key_label: String,
    dir_out: Option<String>,
    if_lock_group_column: bool,
) -> PyResult<PyReportSplit> {
    let request = derive_split_request(col_group, cols_output, if_lock_group_column);
    let options = derive_split_options(
        sheet_name,
        rule_group_order,
        rule_sheet_name,
        empty_key_label,
        dir_out,
    )?;

    let report_split = py.allow_threads(|| split_workbook(&file_in, &request, &options));
    let report_split = report_split.map_err(map_split_error)?;
    Ok(PyReportSplit::from(report_split))
}

#[pyfunction(name = "split_ipc_bytes")]
#[pyo3(signature = (
    v_ipc_df,
    file_source,
    col_group,
    cols_output,
    *,
    rule_group_order = "ascending",
    rule_sheet_name = "sanitize",
    empty_key_label = C_EMPTY_KEY_LABEL_DEFAULT.to_string(),
    dir_out = None,
    if_lock_group_column = true
))]
#[allow(clippy::too_many_arguments)]
fn split_ipc_bytes_py(
    py: Python<'_>,
    v_ipc_df: &[u8],
    file_source: String,
    col_group: String,
    cols_output: Vec<String>,
    rule_group_order: &str,
    rule_sheet_name: &str,
    empty_key_label: String,
    dir_out: Option<String>,
    if_lock_group_column: bool,
) -> PyResult<PyReportSplit> {
    let request = derive_split_request(col_group, cols_output, if_lock_group_column);
    let options = derive_split_options(
        None,
        rule_group_order,
        rule_sheet_name,
        empty_key_label,
        dir_out,
    )?;

    let report_split = py.allow_threads(|| {
        let table =
            read_table_from_ipc_bytes(v_ipc_df).map_err(|message| SplitError::ReadFailure {
                path: PathBuf::from(&file_source),
                message,
            })?;
        let builder = SplitSuffixPathBuilder::new(options.destination.clone());
        split_table(&table, &request, &options, Path::new(&file_source), &builder)
    });
    let report_split = report_split.map_err(map_split_error)?;
    Ok(PyReportSplit::from(report_split))
}

#[pymodule]
fn _sheetsplit_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = module.py();
    module.add_class::<PyReportSplit>()?;
    module.add_function(wrap_pyfunction!(read_columns_py, module)?)?;
    module.add_function(wrap_pyfunction!(read_sheet_names_py, module)?)?;
    module.add_function(wrap_pyfunction!(split_workbook_py, module)?)?;
    module.add_function(wrap_pyfunction!(split_ipc_bytes_py, module)?)?;
    module.add("ReadFailure", py.get_type::<ReadFailure>())?;
    module.add("WriteFailure", py.get_type::<WriteFailure>())?;
    module.add("InvalidColumn", py.get_type::<InvalidColumn>())?;
    module.add("EmptySelection", py.get_type::<EmptySelection>())?;
    module.add("DuplicateSheetName", py.get_type::<DuplicateSheetName>())?;
    module.add("InvalidSheetName", py.get_type::<InvalidSheetName>())?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}

