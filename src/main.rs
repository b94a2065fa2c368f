use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use claim_mapper::cli::{self, SessionArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "claim-mapper")]
#[command(about = "Map loss-run columns, enter mods and payrolls, export a claim summary workbook.")]
#[command(long_about = "Claim Mapper - loss-run column mapping and claim summary export

Upload a loss-run workbook (.xlsx), map its columns onto six claim fields,
fill in the mod/payroll form for five policy years, and export a workbook
with three sheets: Data, OpenClosedIncurred and Mod History.

FIELDS:
  Policy Year            (required)
  Status                 (required)  open / closed, synonyms normalized
  Body Part Category     (required)
  Injury Cause Category  (required)
  Incurred               (required)
  Litigation Status      (optional)  filled with N/A when not mapped

COMMANDS:
  sheets   - List worksheets in a workbook
  preview  - Show the first rows of a worksheet
  init     - Write a session file with suggested mappings
  check    - Show mapping and mod form state, report missing fields
  export   - Build the claim summary workbook
  watch    - Re-export when the workbook or session file changes

EXAMPLES:
  claim-mapper init losses.xlsx -o session.yaml
  claim-mapper export losses.xlsx -s session.yaml
  claim-mapper export losses.xlsx --map \"Policy Year=PolYr\" --map Status=ClaimStat ...")]
#[command(version)]
struct Cli {
    /// Log progress and print the full session state
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SessionOpts {
    /// Loss-run workbook (.xlsx)
    file: PathBuf,

    /// Session file with mapping and mod form (YAML)
    #[arg(short, long)]
    session: Option<PathBuf>,

    /// Worksheet to use (default: first sheet, or the session file's)
    #[arg(long)]
    sheet: Option<String>,

    /// Map a field to a column: FIELD=COLUMN (empty COLUMN for none)
    #[arg(short, long = "map", value_name = "FIELD=COLUMN")]
    maps: Vec<String>,

    /// Clear all column selections before applying --map
    #[arg(long)]
    restart_mapping: bool,
}

impl From<SessionOpts> for SessionArgs {
    fn from(opts: SessionOpts) -> Self {
        SessionArgs {
            file: opts.file,
            session: opts.session,
            sheet: opts.sheet,
            maps: opts.maps,
            restart_mapping: opts.restart_mapping,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List worksheets in a workbook
    Sheets {
        /// Loss-run workbook (.xlsx)
        file: PathBuf,
    },

    /// Show the first rows of a worksheet
    Preview {
        /// Loss-run workbook (.xlsx)
        file: PathBuf,

        /// Worksheet to preview (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Number of rows to show
        #[arg(short = 'n', long, default_value = "5")]
        rows: usize,
    },

    #[command(long_about = "Write a starter session file for a workbook.

Column mappings are suggested from header names; review them before
exporting. The mod form is left empty: fill in the projection year and
mod, then a mod and payroll for each historical row (current year first).")]
    /// Write a session file with suggested mappings
    Init {
        /// Loss-run workbook (.xlsx)
        file: PathBuf,

        /// Worksheet to use (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Session file to write
        #[arg(short, long, default_value = "session.yaml")]
        output: PathBuf,

        /// Overwrite an existing session file
        #[arg(long)]
        force: bool,
    },

    /// Show mapping and mod form state, report missing fields
    Check {
        #[command(flatten)]
        session: SessionOpts,
    },

    #[command(long_about = "Build the claim summary workbook.

Sheets written:
  Data                - remapped claims for the historical policy years
  OpenClosedIncurred  - closed/open counts, total incurred and payroll per year
  Mod History         - Projected, Current and prior-year mods

The export is blocked until all five required fields are mapped and at
least one mod row has a year and a mod.")]
    /// Build the claim summary workbook
    Export {
        #[command(flatten)]
        session: SessionOpts,

        /// Output file name (.xlsx appended when missing)
        #[arg(short, long)]
        output: Option<String>,

        /// Directory to write the workbook into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Re-export when the workbook or session file changes
    Watch {
        #[command(flatten)]
        session: SessionOpts,

        /// Output file name (.xlsx appended when missing)
        #[arg(short, long)]
        output: Option<String>,

        /// Directory to write the workbook into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "claim_mapper=info"
    } else {
        "claim_mapper=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Sheets { file } => {
            cli::sheets(file.clone()).with_context(|| format!("reading {}", file.display()))
        }

        Commands::Preview { file, sheet, rows } => cli::preview(file.clone(), sheet, rows)
            .with_context(|| format!("previewing {}", file.display())),

        Commands::Init {
            file,
            sheet,
            output,
            force,
        } => cli::init(file, sheet, output, force).context("writing session file"),

        Commands::Check { session } => cli::check(session.into()).context("check failed"),

        Commands::Export {
            session,
            output,
            out_dir,
        } => cli::export(session.into(), output, out_dir, cli.verbose).context("export failed"),

        Commands::Watch {
            session,
            output,
            out_dir,
        } => cli::watch(session.into(), output, out_dir, cli.verbose).context("watch failed"),
    }
}
