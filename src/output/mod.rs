//! Output Format Module
//!
//! 抽出したシートをCSVまたはXLSXとして書き出すモジュール。

mod csv;
mod parts;
mod xlsx;

pub use self::csv::CsvSink;
pub use xlsx::{column_letter, write_workbook};
