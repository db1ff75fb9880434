//! casemd - Convert Markdown inspection sheets into spreadsheets
//!
//! This crate reads Markdown inspection sheets, where level-2/3/4 headings name the
//! major, medium and minor items of a test case, numbered lists hold validation
//! steps and task lists hold checkpoints, and turns them into a fixed 9-column
//! table. The table can be written as CSV, as an XLSX workbook with one sheet per
//! source, or sent to the Google Sheets API.
//!
//! # Quick Start
//!
//! ```rust
//! use casemd::{ConverterBuilder, Source};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let markdown = "# T\n\n## Setup\n### Env\n#### Dep\n1. Install\n* [ ] Done\n";
//!     let converter = ConverterBuilder::new().build()?;
//!
//!     let csv = converter.convert_to_vec(vec![Source::from_bytes(
//!         "checks.md",
//!         markdown.as_bytes().to_vec(),
//!     )])?;
//!     assert!(String::from_utf8(csv)?.ends_with("Setup,Env,Dep,Install,* [ ] Done,,,,\n"));
//!
//!     Ok(())
//! }
//! ```
//!
//! # Workbook Output
//!
//! ```rust,no_run
//! use std::fs::File;
//! use casemd::{ConverterBuilder, OutputFormat, Source};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = ConverterBuilder::new()
//!         .with_output_format(OutputFormat::Xlsx)
//!         .build()?;
//!
//!     // alpha.md, alpha.md, beta.md -> sheets "alpha", "alpha_2", "beta"
//!     let sources = vec![
//!         Source::new("docs/alpha.md", File::open("docs/alpha.md")?),
//!         Source::new("legacy/alpha.md", File::open("legacy/alpha.md")?),
//!         Source::new("beta.md", File::open("beta.md")?),
//!     ];
//!     converter.convert(sources, File::create("cases.xlsx")?)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Lower-level Building Blocks
//!
//! ```rust
//! use casemd::{extract_cases, project_row};
//!
//! let cases = extract_cases("## Setup\n#### Dep\n1. Install\n".as_bytes()).unwrap();
//! let row = project_row(&cases[0]);
//! assert_eq!(row[0], "Setup");
//! assert_eq!(row[3], "Install");
//! ```

mod api;
mod builder;
mod error;
mod naming;
mod output;
mod parser;
mod projector;
mod remote;
mod security;
mod types;

// 公開API
pub use api::{ExtractMode, OutputFormat};
pub use builder::{Converter, ConverterBuilder};
pub use error::CasemdError;
pub use naming::{derive_sheet_name, sanitize_sheet_name, SheetNamer, MAX_SHEET_NAME_CHARS};
pub use output::{column_letter, write_workbook, CsvSink};
pub use parser::{extract_cases, extract_headings};
pub use projector::{project_row, COLUMN_COUNT, HEADERS, HEADING_HEADERS};
pub use remote::{
    build_payload, RemoteSpreadsheet, SheetsService, SpreadsheetCreator, SpreadsheetPayload,
    DEFAULT_SHEETS_ENDPOINT,
};
pub use types::{Case, Sheet, Source};
