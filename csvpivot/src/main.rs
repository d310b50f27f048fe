//! csvpivot CLI - reshape CSV streams
//!
//! # Commands
//!
//! ```bash
//! csvpivot row2col --each year -g state data.csv          # pivot, any input order
//! csvpivot row2col-sorted --each year -g state data.csv   # pivot, input sorted by group
//! csvpivot col2row year population pop2000,pop2010 data.csv
//! csvpivot headmerge --head-rows 2 report.csv
//! ```
//!
//! Input is read from stdin when no file is given; output goes to stdout
//! unless `-o` is set. Diagnostics go to stderr.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use csvpivot::logs::{log_success, set_verbosity, Verbosity};
use csvpivot::transform::parse_column_list;
use csvpivot::{
    ConfigResult, Dialect, HeadMergeOptions, IoOptions, Job, PivotOptions, RowCap, TransformResult,
    UnpivotOptions,
};

#[derive(Parser)]
#[command(name = "csvpivot", version)]
#[command(about = "Pivot, unpivot and header-merge filters for CSV streams", long_about = None)]
struct Cli {
    /// Report progress on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print nothing on stderr except fatal errors
    #[arg(long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn the values of one column into new columns (input in any order)
    Row2col {
        #[command(flatten)]
        pivot: PivotArgs,

        #[command(flatten)]
        io: IoArgs,
    },

    /// Same as row2col, for input already sorted by the group columns
    #[command(name = "row2col-sorted")]
    Row2colSorted {
        #[command(flatten)]
        pivot: PivotArgs,

        /// Rows scanned for name values before output starts
        #[arg(long, value_name = "N|ALL")]
        vocabulary_rows: Option<RowCap>,

        #[command(flatten)]
        io: IoArgs,
    },

    /// Turn a list of columns into (name, value) rows
    Col2row {
        /// Output column holding the source column name
        name_column: String,

        /// Output column holding the source cell
        value_column: String,

        /// Comma-separated input columns (`*` = every other column)
        columns: String,

        /// Rows to skip after the header
        #[arg(short = 'K', long = "row-offset", default_value = "0")]
        row_offset: usize,

        #[command(flatten)]
        caps: CapArgs,

        #[command(flatten)]
        io: IoArgs,
    },

    /// Merge several header rows into one
    Headmerge {
        /// Number of header rows to merge
        #[arg(long, default_value = "2")]
        head_rows: usize,

        /// Text placed between merged parts
        #[arg(short, long, default_value = " ")]
        join: String,

        /// Rows to skip before the header rows
        #[arg(short = 'K', long = "row-offset", default_value = "0")]
        row_offset: usize,

        #[command(flatten)]
        caps: CapArgs,

        #[command(flatten)]
        io: IoArgs,
    },
}

#[derive(Args)]
struct IoArgs {
    /// Input file (default: stdin)
    input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Input delimiter (character or name: tab, comma, pipe, ...)
    #[arg(short = 'S', long)]
    delimiter_in: Option<String>,

    /// Output delimiter
    #[arg(short = 's', long)]
    delimiter_out: Option<String>,

    /// Input quote character
    #[arg(short = 'q', long)]
    quote_in: Option<String>,

    /// Output quote character
    #[arg(long)]
    quote_out: Option<String>,

    /// Input row terminator (lf, crlf, cr, ...)
    #[arg(short = 'W', long)]
    terminator_in: Option<String>,

    /// Output row terminator
    #[arg(short = 'w', long)]
    terminator_out: Option<String>,

    /// Input encoding label, or "auto" to detect
    #[arg(short = 'E', long, default_value = "utf-8")]
    encoding_in: String,
}

impl IoArgs {
    fn into_options(self) -> ConfigResult<IoOptions> {
        Ok(IoOptions {
            input_dialect: Dialect::from_names(
                self.delimiter_in.as_deref(),
                self.quote_in.as_deref(),
                self.terminator_in.as_deref(),
            )?,
            output_dialect: Dialect::from_names(
                self.delimiter_out.as_deref(),
                self.quote_out.as_deref(),
                self.terminator_out.as_deref(),
            )?,
            input: self.input,
            output: self.output,
            encoding: self.encoding_in,
        })
    }
}

#[derive(Args)]
struct CapArgs {
    /// Maximum data rows read
    #[arg(short = 'N', long, value_name = "N|ALL", default_value = "ALL")]
    input_row_cap: RowCap,

    /// Maximum data rows written
    #[arg(short = 'n', long, value_name = "N|ALL", default_value = "ALL")]
    output_row_cap: RowCap,
}

#[derive(Args)]
struct PivotArgs {
    /// Column whose values become new columns
    #[arg(long = "each", visible_alias = "name-column", value_name = "COLUMN")]
    each: Option<String>,

    /// Comma-separated columns identifying an output row
    #[arg(short = 'g', long = "group-by", value_name = "COLUMNS")]
    group_by: Option<String>,

    /// Comma-separated columns spread across the new columns
    #[arg(short = 'x', long = "expand", value_name = "COLUMNS")]
    expand: Option<String>,

    /// New column name template: {0} = name value, {1} = expanded column
    #[arg(long, value_name = "TEMPLATE")]
    column_format: Option<String>,

    /// Compare group values case-insensitively
    #[arg(long)]
    ignore_case: bool,

    /// Name the first expanded column after the name value alone
    #[arg(short = 'u', long)]
    first_column_unsuffixed: bool,

    /// Maximum data rows read
    #[arg(short = 'N', long, value_name = "N|ALL")]
    input_row_cap: Option<RowCap>,

    /// Maximum data rows written
    #[arg(short = 'n', long, value_name = "N|ALL")]
    output_row_cap: Option<RowCap>,

    /// JSON file with pivot options; flags given here take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl PivotArgs {
    fn into_options(self) -> ConfigResult<PivotOptions> {
        let mut options = match &self.config {
            Some(path) => PivotOptions::from_file(path)?,
            None => PivotOptions::default(),
        };
        if let Some(each) = self.each {
            options.name_column = each;
        }
        if let Some(group) = self.group_by {
            options.group_columns = Some(parse_column_list(&group));
        }
        if let Some(expand) = self.expand {
            options.expand_columns = Some(parse_column_list(&expand));
        }
        if let Some(template) = self.column_format {
            options.column_format = template;
        }
        options.ignore_case |= self.ignore_case;
        options.first_column_unsuffixed |= self.first_column_unsuffixed;
        if let Some(RowCap(cap)) = self.input_row_cap {
            options.input_row_cap = cap;
        }
        if let Some(RowCap(cap)) = self.output_row_cap {
            options.output_row_cap = cap;
        }
        Ok(options)
    }
}

fn main() {
    let cli = Cli::parse();

    set_verbosity(if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    });

    if let Err(e) = run(cli.command) {
        // The reader of our output went away (`| head`); that is a normal end.
        if e.is_broken_pipe() {
            return;
        }
        eprintln!("csvpivot: error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> TransformResult<()> {
    let (job, io) = build_job(command)?;
    let summary = job.run(&io)?;
    log_success(format!(
        "{}: {} rows read, {} rows written",
        job.name(),
        summary.rows_read,
        summary.rows_written
    ));
    Ok(())
}

fn build_job(command: Commands) -> ConfigResult<(Job, IoOptions)> {
    Ok(match command {
        Commands::Row2col { pivot, io } => (Job::Row2Col(pivot.into_options()?), io.into_options()?),

        Commands::Row2colSorted {
            pivot,
            vocabulary_rows,
            io,
        } => {
            let mut options = pivot.into_options()?;
            if let Some(RowCap(rows)) = vocabulary_rows {
                options.vocabulary_rows = rows;
            }
            (Job::Row2ColSorted(options), io.into_options()?)
        }

        Commands::Col2row {
            name_column,
            value_column,
            columns,
            row_offset,
            caps,
            io,
        } => {
            let options = UnpivotOptions {
                name_column,
                value_column,
                columns: parse_column_list(&columns),
                row_offset,
                input_row_cap: caps.input_row_cap.0,
                output_row_cap: caps.output_row_cap.0,
            };
            (Job::Col2Row(options), io.into_options()?)
        }

        Commands::Headmerge {
            head_rows,
            join,
            row_offset,
            caps,
            io,
        } => {
            let options = HeadMergeOptions {
                head_rows,
                join,
                row_offset,
                input_row_cap: caps.input_row_cap.0,
                output_row_cap: caps.output_row_cap.0,
            };
            (Job::HeadMerge(options), io.into_options()?)
        }
    })
}
