//! casemd CLI.
//!
//! Converts Markdown inspection sheets into CSV files, XLSX workbooks and
//! Google Spreadsheets.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use casemd::{
    CasemdError, ConverterBuilder, ExtractMode, OutputFormat, SheetsService, Source,
};
use clap::{ArgAction, Parser};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the Google Sheets OAuth access token.
const ACCESS_TOKEN_ENV: &str = "GOOGLE_SHEETS_ACCESS_TOKEN";

#[derive(Debug, Parser)]
#[command(
    name = "casemd",
    version,
    about = "casemd converts Markdown inspection sheets into CSV files, Excel workbooks, and Google Spreadsheets."
)]
struct Cli {
    /// Path to the Markdown source file (repeat flag for multiple files).
    #[arg(long = "input", value_name = "PATH", required = true)]
    inputs: Vec<PathBuf>,

    /// Path to the CSV destination file.
    #[arg(long = "csv-output", value_name = "PATH")]
    csv_output: Option<PathBuf>,

    /// Path to the spreadsheet (XLSX) destination file.
    #[arg(long = "spreadsheet-output", value_name = "PATH")]
    spreadsheet_output: Option<PathBuf>,

    /// Title for the Google Spreadsheet to create.
    #[arg(long = "google-spreadsheet-title", value_name = "TITLE")]
    google_spreadsheet_title: Option<String>,

    /// Export level-1 headings instead of test cases.
    #[arg(long)]
    headings: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn has_output(&self) -> bool {
        self.csv_output.is_some()
            || self.spreadsheet_output.is_some()
            || self.google_title().is_some()
    }

    /// An empty title counts as not requested.
    fn google_title(&self) -> Option<&str> {
        self.google_spreadsheet_title
            .as_deref()
            .filter(|title| !title.is_empty())
    }

    fn extract_mode(&self) -> ExtractMode {
        if self.headings {
            ExtractMode::Headings
        } else {
            ExtractMode::Cases
        }
    }
}

/// Markdown file read fully into memory before any output is produced.
struct InputFile {
    name: String,
    data: Vec<u8>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let code = if error.use_stderr() { 1 } else { 0 };
            // nowhere left to report a failed write to stderr
            error.print().ok();
            std::process::exit(code);
        }
    };

    init_logging(cli.verbose);

    let mut stdout = io::stdout().lock();
    if let Err(error) = run(&cli, &mut stdout) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

/// Install the global subscriber. `RUST_LOG` wins when no `-v` flag is given.
fn init_logging(verbosity: u8) {
    let filter = if verbosity == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    } else {
        let level = level_from_verbosity(verbosity).as_str().to_lowercase();
        EnvFilter::new(format!("warn,casemd={level}"))
    };

    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .init();
}

fn level_from_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write) -> Result<(), CasemdError> {
    if !cli.has_output() {
        return Err(CasemdError::Input(
            "missing required flag: --csv-output, --spreadsheet-output, or --google-spreadsheet-title"
                .to_string(),
        ));
    }

    let service = match cli.google_title() {
        Some(_) => Some(SheetsService::new(
            std::env::var(ACCESS_TOKEN_ENV).unwrap_or_default(),
        )?),
        None => None,
    };

    let inputs = read_inputs(&cli.inputs)?;

    if let Some(path) = &cli.csv_output {
        write_output(cli, OutputFormat::Csv, &inputs, path)?;
        writeln!(stdout, "CSV written to {}", path.display())?;
    }

    if let Some(path) = &cli.spreadsheet_output {
        write_output(cli, OutputFormat::Xlsx, &inputs, path)?;
        writeln!(stdout, "Spreadsheet written to {}", path.display())?;
    }

    if let (Some(title), Some(service)) = (cli.google_title(), &service) {
        let converter = ConverterBuilder::new()
            .with_extract_mode(cli.extract_mode())
            .build()?;
        let id = converter.create_spreadsheet(service, title, sources(&inputs))?;
        writeln!(stdout, "Google Spreadsheet created with ID {}", id)?;
    }

    Ok(())
}

fn read_inputs(paths: &[PathBuf]) -> Result<Vec<InputFile>, CasemdError> {
    paths
        .iter()
        .map(|path| -> Result<InputFile, CasemdError> {
            let data = fs::read(path).map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!("read input file {}: {}", path.display(), e),
                )
            })?;
            tracing::debug!(path = %path.display(), bytes = data.len(), "input read");
            Ok(InputFile {
                name: path.to_string_lossy().into_owned(),
                data,
            })
        })
        .collect()
}

fn sources(inputs: &[InputFile]) -> Vec<Source<&[u8]>> {
    inputs
        .iter()
        .map(|input| Source::new(input.name.clone(), input.data.as_slice()))
        .collect()
}

fn write_output(
    cli: &Cli,
    format: OutputFormat,
    inputs: &[InputFile],
    path: &Path,
) -> Result<(), CasemdError> {
    ensure_parent_directory(path)?;

    let converter = ConverterBuilder::new()
        .with_output_format(format)
        .with_extract_mode(cli.extract_mode())
        .build()?;

    let file = File::create(path)?;
    converter.convert(sources(inputs), file)
}

fn ensure_parent_directory(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}
