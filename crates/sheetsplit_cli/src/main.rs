//! `sheetsplit`: split one worksheet into a workbook with one sheet per key value.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sheetsplit_io_fs::{SpecDestinationOptions, SplitSuffixPathBuilder};
use sheetsplit_io_xlsx::{SpecTable, SpecXlsxReadOptions, read_sheet_names, read_table};
use sheetsplit_split::{
    C_EMPTY_KEY_LABEL_DEFAULT, EnumGroupOrderRule, EnumSheetNameRule, SpecSplitOptions,
    SpecSplitRequest, SplitError, split_table,
};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

const N_EXIT_IO_FAILURE: u8 = 1;
const N_EXIT_USER_INPUT: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "sheetsplit", version, about = "Split a worksheet into one sheet per key value")]
struct Cli {
    /// Log debug details to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the column names of a worksheet.
    Columns {
        file: PathBuf,
        /// Worksheet to inspect (default: first).
        #[arg(long)]
        sheet: Option<String>,
    },
    /// List the worksheet names of a workbook.
    Sheets { file: PathBuf },
    /// Write `<name>_分頁.xlsx` with one sheet per distinct key value.
    Split(SplitArgs),
}

#[derive(Debug, Args)]
struct SplitArgs {
    file: PathBuf,

    /// Column whose values become sheets.
    #[arg(long = "by")]
    col_group: String,

    /// Comma-separated output columns, in output order.
    #[arg(
        long,
        value_delimiter = ',',
        required_unless_present = "all",
        conflicts_with = "all"
    )]
    columns: Vec<String>,

    /// Keep every column.
    #[arg(long)]
    all: bool,

    /// Worksheet to split (default: first).
    #[arg(long)]
    sheet: Option<String>,

    #[arg(long, value_enum, default_value_t = ArgGroupOrder::Ascending)]
    order: ArgGroupOrder,

    #[arg(long = "sheet-names", value_enum, default_value_t = ArgSheetNameRule::Sanitize)]
    sheet_names: ArgSheetNameRule,

    /// Sheet name for rows with a blank key.
    #[arg(long = "empty-label", default_value = C_EMPTY_KEY_LABEL_DEFAULT)]
    empty_label: String,

    /// Output directory (default: next to the source file).
    #[arg(long = "out-dir")]
    out_dir: Option<PathBuf>,

    /// Do not force the key column into the output.
    #[arg(long = "no-lock-key")]
    no_lock_key: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ArgGroupOrder {
    Ascending,
    FirstSeen,
}

impl From<ArgGroupOrder> for EnumGroupOrderRule {
    fn from(value: ArgGroupOrder) -> Self {
        match value {
            ArgGroupOrder::Ascending => Self::Ascending,
            ArgGroupOrder::FirstSeen => Self::FirstSeen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ArgSheetNameRule {
    Sanitize,
    Strict,
}

impl From<ArgSheetNameRule> for EnumSheetNameRule {
    fn from(value: ArgSheetNameRule) -> Self {
        match value {
            ArgSheetNameRule::Sanitize => Self::Sanitize,
            ArgSheetNameRule::Strict => Self::Strict,
        }
    }
}

fn init_logging(cli: &Cli) {
    let c_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(c_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_table(path: &Path, sheet: Option<String>) -> Result<SpecTable, SplitError> {
    read_table(path, &SpecXlsxReadOptions { sheet_name: sheet }).map_err(|message| {
        SplitError::ReadFailure {
            path: path.to_path_buf(),
            message,
        }
    })
}

fn run_split(args: SplitArgs) -> Result<()> {
    let table = load_table(&args.file, args.sheet.clone())?;

    let cols_output = if args.all {
        table.columns().to_vec()
    } else {
        args.columns
    };
    let mut request = SpecSplitRequest::new(args.col_group, cols_output);
    if !args.no_lock_key {
        request = request.with_group_column_locked();
    }

    let options = SpecSplitOptions {
        rule_group_order: args.order.into(),
        rule_sheet_name: args.sheet_names.into(),
        empty_key_label: args.empty_label,
        destination: SpecDestinationOptions {
            dir_out: args.out_dir,
            ..Default::default()
        },
        read: SpecXlsxReadOptions {
            sheet_name: args.sheet,
        },
        ..Default::default()
    };
    debug!(?request, "split request");

    println!(
        "Splitting {} by {:?} ({} rows)...",
        args.file.display(),
        request.col_group,
        table.height()
    );
    let builder = SplitSuffixPathBuilder::new(options.destination.clone());
    let report = split_table(&table, &request, &options, &args.file, &builder)?;

    for sheet in &report.sheets {
        println!("  {:<31}  {:>7} rows", sheet.sheet_name, sheet.n_rows);
    }
    for c_warning in &report.warnings {
        println!("  warning: {c_warning}");
    }
    println!("{report}");
    if let Some(path_file_out) = &report.path_file_out {
        println!("Wrote {}", path_file_out.display());
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Columns { file, sheet } => {
            let table = load_table(&file, sheet)?;
            for c_col in table.columns() {
                println!("{c_col}");
            }
        }
        Command::Sheets { file } => {
            let l_names = read_sheet_names(&file)
                .map_err(|message| SplitError::ReadFailure {
                    path: file.clone(),
                    message,
                })
                .with_context(|| format!("listing sheets of {}", file.display()))?;
            for c_name in l_names {
                println!("{c_name}");
            }
        }
        Command::Split(args) => run_split(args)?,
    }
    Ok(())
}

/// Exit status for a failed run: user-input errors vs. everything else.
fn derive_exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<SplitError>() {
        Some(split_error) if split_error.is_user_input() => N_EXIT_USER_INPUT,
        _ => N_EXIT_IO_FAILURE,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(derive_exit_code(&err))
        }
    }
}
