//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// casemdクレート全体で使用するエラー型
///
/// Markdownの読み込み、テストケースの抽出、CSV/XLSXの書き出し、
/// リモートスプレッドシートの作成中に発生するすべてのエラーを統一的に扱います。
///
/// # エラーの種類
///
/// - `Input`: 入力の検証に失敗したエラー（ソースが空、タイトルが空など）
/// - `Parse`: ソースの読み込み中に発生したエラー（ソース名付き）
/// - `Io` / `Zip` / `Csv` / `Json`: 出力の書き出し中に発生したエラー
/// - `Remote`: リモートスプレッドシートAPIの呼び出しに失敗したエラー
/// - `Config`: 設定の検証に失敗したエラー
/// - `SecurityViolation`: リソース制限に違反したエラー
///
/// # 使用例
///
/// ```rust,no_run
/// use casemd::CasemdError;
/// use std::fs::File;
///
/// fn open_sheet(path: &str) -> Result<File, CasemdError> {
///     let file = File::open(path)?;  // Ioエラーが自動的に変換される
///     Ok(file)
/// }
/// ```
#[derive(Error, Debug)]
pub enum CasemdError {
    /// I/O操作中に発生したエラー
    ///
    /// 出力先への書き込み失敗など、`std::io::Error`が発生した場合に使用されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 入力の検証に失敗したエラー
    ///
    /// 変換処理を開始する前に検出されます。ソースが1つも指定されていない場合や、
    /// リモートスプレッドシートのタイトルが空の場合などです。
    #[error("Invalid input: {0}")]
    Input(String),

    /// ソースの読み込み中に発生したエラー
    ///
    /// 読み込みの失敗や不正なUTF-8など、抽出処理中のI/Oエラーをソース名付きで保持します。
    #[error("Failed to parse {name}: {source}")]
    Parse {
        /// エラーが発生したソース名
        name: String,
        /// 元になったI/Oエラー
        #[source]
        source: std::io::Error,
    },

    /// ZIPアーカイブの書き出しエラー
    #[error("ZIP archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// CSVの書き出しエラー
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSONのシリアライズエラー
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// リモートスプレッドシートAPIのエラー
    ///
    /// HTTPステータスが取得できた場合は`status`に格納されます。
    #[error("Remote spreadsheet error{}: {message}", status_suffix(.status))]
    Remote {
        /// HTTPステータスコード（通信自体に失敗した場合は`None`）
        status: Option<u16>,
        /// エラーの詳細メッセージ
        message: String,
    },

    /// 設定の検証に失敗したエラー
    ///
    /// `ConverterBuilder::build()`や`SheetsService::new()`で無効な設定が
    /// 検出された場合に発生します。
    ///
    /// # 例
    ///
    /// ```rust,no_run
    /// use casemd::{ConverterBuilder, CasemdError};
    ///
    /// let result = ConverterBuilder::new()
    ///     .with_max_source_size(0)  // 無効なサイズ
    ///     .build();
    ///
    /// match result {
    ///     Err(CasemdError::Config(msg)) => {
    ///         println!("設定エラー: {}", msg);
    ///     }
    ///     _ => {}
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// リソース制限に違反したエラー
    ///
    /// ソースのサイズ上限や、シートの最大行数を超えた場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}

impl CasemdError {
    /// ソース名付きの`Parse`エラーを生成する
    pub(crate) fn parse(name: impl Into<String>, source: std::io::Error) -> Self {
        CasemdError::Parse {
            name: name.into(),
            source,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" ({})", code),
        None => String::new(),
    }
}
