//! Builder Module
//!
//! Fluent Builder APIを提供し、`Converter`インスタンスを段階的に構築する。

use std::io::{Read, Write};

use crate::api::{ExtractMode, OutputFormat};
use crate::error::CasemdError;
use crate::naming::SheetNamer;
use crate::output::{write_workbook, CsvSink};
use crate::parser::{extract_cases, extract_headings};
use crate::projector::{header_row, project_row, HEADERS, HEADING_HEADERS};
use crate::remote::{RemoteSpreadsheet, SpreadsheetCreator};
use crate::security::{check_sheet_bounds, read_bounded, SecurityConfig};
use crate::types::{Sheet, Source};

/// 変換処理の設定を保持する内部構造体
#[derive(Debug, Clone, Default)]
pub(crate) struct ConversionConfig {
    /// 出力フォーマット
    pub output_format: OutputFormat,

    /// 抽出モード
    pub extract_mode: ExtractMode,

    /// リソース制限
    pub security: SecurityConfig,
}

/// Fluent Builder APIを提供する構造体
///
/// `Converter`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust
/// use casemd::{ConverterBuilder, ExtractMode, OutputFormat};
///
/// # fn main() -> Result<(), casemd::CasemdError> {
/// let converter = ConverterBuilder::new()
///     .with_output_format(OutputFormat::Xlsx)
///     .with_extract_mode(ExtractMode::Cases)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConverterBuilder {
    /// 内部設定（構築中）
    config: ConversionConfig,
}

impl Default for ConverterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 出力フォーマット: CSV
    /// - 抽出モード: テストケース
    /// - ソースの最大サイズ: 100MB
    pub fn new() -> Self {
        Self {
            config: ConversionConfig::default(),
        }
    }

    /// 出力フォーマットを指定する
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use casemd::{ConverterBuilder, OutputFormat};
    ///
    /// let builder = ConverterBuilder::new()
    ///     .with_output_format(OutputFormat::Xlsx);
    /// ```
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    /// 抽出モードを指定する
    pub fn with_extract_mode(mut self, mode: ExtractMode) -> Self {
        self.config.extract_mode = mode;
        self
    }

    /// 1ソースあたりの最大サイズ（バイト）を指定する
    ///
    /// 上限を超えるソースは`CasemdError::SecurityViolation`になります。
    /// 0を指定した場合、`build()`時に`CasemdError::Config`を返します。
    pub fn with_max_source_size(mut self, bytes: u64) -> Self {
        self.config.security.max_source_size = bytes;
        self
    }

    /// 設定を検証し、`Converter`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Converter)`: 設定が有効な場合、Converterインスタンス
    /// * `Err(CasemdError::Config)`: 設定が無効な場合（例: 最大サイズが0）
    pub fn build(self) -> Result<Converter, CasemdError> {
        if self.config.security.max_source_size == 0 {
            return Err(CasemdError::Config(
                "Maximum source size must be greater than 0".to_string(),
            ));
        }

        Ok(Converter::new(self.config))
    }
}

/// 変換処理のファサード
///
/// Markdownの点検シートをCSV・XLSX・リモートスプレッドシートに変換するための
/// メインエントリーポイントです。1回の変換ごとにシート名レジストリと出力バッファを
/// 持つため、同じ`Converter`を繰り返し使用できます。
///
/// # 使用例
///
/// ```rust
/// use casemd::{ConverterBuilder, Source};
///
/// # fn main() -> Result<(), casemd::CasemdError> {
/// let converter = ConverterBuilder::new().build()?;
/// let markdown = "# T\n\n## Setup\n### Env\n#### Dep\n1. Install\n* [ ] Done\n";
/// let sources = vec![Source::from_bytes("checks.md", markdown.as_bytes().to_vec())];
///
/// let csv = converter.convert_to_vec(sources)?;
/// assert!(String::from_utf8_lossy(&csv).contains("Setup,Env,Dep,Install,* [ ] Done,,,,"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Converter {
    /// 変換設定
    config: ConversionConfig,
}

impl Converter {
    pub(crate) fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    /// ソースを設定された出力フォーマットに変換する
    ///
    /// # 引数
    ///
    /// * `sources` - 入力順のMarkdownソース（1つ以上）
    /// * `output` - 出力先のライター（Writeトレイトを実装）
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 変換に成功した場合
    /// * `Err(CasemdError::Input)` - ソースが1つも無い場合
    /// * `Err(CasemdError::Parse)` - いずれかのソースの読み込みに失敗した場合
    ///
    /// # 処理フロー
    ///
    /// - CSV: ヘッダー行を書き込み、ソースごとに抽出した行を追記する。
    ///   途中で失敗した場合、それまでに書き込んだ行は出力先に残る。
    /// - XLSX: すべてのソースをシートに変換してから、ワークブックを一括で書き込む。
    ///   途中で失敗した場合、出力先には何も書き込まれない。
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use casemd::{ConverterBuilder, OutputFormat, Source};
    /// use std::fs::File;
    ///
    /// # fn main() -> Result<(), casemd::CasemdError> {
    /// let converter = ConverterBuilder::new()
    ///     .with_output_format(OutputFormat::Xlsx)
    ///     .build()?;
    /// let sources = vec![
    ///     Source::new("alpha.md", File::open("alpha.md")?),
    ///     Source::new("beta.md", File::open("beta.md")?),
    /// ];
    /// converter.convert(sources, File::create("cases.xlsx")?)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn convert<R: Read, W: Write>(
        &self,
        sources: Vec<Source<R>>,
        output: W,
    ) -> Result<(), CasemdError> {
        require_sources(&sources)?;

        match self.config.output_format {
            OutputFormat::Csv => self.convert_csv(sources, output),
            OutputFormat::Xlsx => {
                let sheets = self.build_sheets(sources)?;
                write_workbook(output, &sheets)?;
                tracing::info!(sheets = sheets.len(), "workbook conversion finished");
                Ok(())
            }
        }
    }

    /// ソースを変換し、出力をバイト列として返す
    pub fn convert_to_vec<R: Read>(&self, sources: Vec<Source<R>>) -> Result<Vec<u8>, CasemdError> {
        let mut buffer = Vec::new();
        self.convert(sources, &mut buffer)?;
        Ok(buffer)
    }

    /// ソースごとにヘッダー付きのシートを構築する
    ///
    /// シート名はソース名から導出され、この呼び出しの中で一意になります。
    pub fn build_sheets<R: Read>(&self, sources: Vec<Source<R>>) -> Result<Vec<Sheet>, CasemdError> {
        require_sources(&sources)?;

        let headers = self.headers();
        let mut namer = SheetNamer::new();
        let mut sheets = Vec::with_capacity(sources.len());

        for (index, source) in sources.into_iter().enumerate() {
            let Source { name, reader } = source;
            let sheet_name = namer.assign(&name, index);

            let data_rows = self.extract_rows(&name, reader).inspect_err(|e| {
                tracing::warn!(source = %name, error = %e, "conversion aborted");
            })?;

            let mut rows = Vec::with_capacity(data_rows.len() + 1);
            rows.push(header_row(headers));
            rows.extend(data_rows);

            tracing::debug!(source = %name, sheet = %sheet_name, rows = rows.len(), "sheet built");
            sheets.push(Sheet::new(sheet_name, rows));
        }

        Ok(sheets)
    }

    /// ソースをリモートスプレッドシートとして作成し、そのIDを返す
    ///
    /// すべてのソースの変換に成功した場合のみ`creator`を呼び出します。
    ///
    /// # 戻り値
    ///
    /// * `Ok(String)` - 作成されたスプレッドシートのID
    /// * `Err(CasemdError::Input)` - タイトルが空、またはソースが1つも無い場合
    /// * `Err(CasemdError::Remote)` - 作成に失敗した場合
    pub fn create_spreadsheet<C, R>(
        &self,
        creator: &C,
        title: &str,
        sources: Vec<Source<R>>,
    ) -> Result<String, CasemdError>
    where
        C: SpreadsheetCreator + ?Sized,
        R: Read,
    {
        if title.is_empty() {
            return Err(CasemdError::Input(
                "spreadsheet title cannot be empty".to_string(),
            ));
        }

        let sheets = self.build_sheets(sources)?;
        for sheet in &sheets {
            check_sheet_bounds(sheet)?;
        }

        let spreadsheet = RemoteSpreadsheet {
            title: title.to_string(),
            sheets,
        };
        let id = creator.create_spreadsheet(&spreadsheet)?;

        tracing::info!(id = %id, sheets = spreadsheet.sheets.len(), "remote spreadsheet created");
        Ok(id)
    }

    fn convert_csv<R: Read, W: Write>(
        &self,
        sources: Vec<Source<R>>,
        output: W,
    ) -> Result<(), CasemdError> {
        let mut sink = CsvSink::new(output, self.headers())?;

        for source in sources {
            let Source { name, reader } = source;
            let rows = match self.extract_rows(&name, reader) {
                Ok(rows) => rows,
                Err(e) => {
                    if let Err(flush_err) = sink.flush() {
                        tracing::warn!(error = %flush_err, "failed to flush partial CSV output");
                    }
                    tracing::warn!(source = %name, error = %e, "conversion aborted");
                    return Err(e);
                }
            };

            tracing::debug!(source = %name, rows = rows.len(), "source converted");
            for row in &rows {
                sink.write_row(row)?;
            }
        }

        let rows = sink.finish()?;
        tracing::info!(rows, "CSV conversion finished");
        Ok(())
    }

    /// 1ソースを読み込み、データ行（ヘッダーを除く）に変換する
    fn extract_rows<R: Read>(&self, name: &str, reader: R) -> Result<Vec<Vec<String>>, CasemdError> {
        let buffer = read_bounded(reader, name, &self.config.security)?;

        let rows = match self.config.extract_mode {
            ExtractMode::Cases => extract_cases(&buffer[..])
                .map_err(|e| CasemdError::parse(name, e))?
                .iter()
                .map(|case| Vec::from(project_row(case)))
                .collect(),
            ExtractMode::Headings => extract_headings(&buffer[..])
                .map_err(|e| CasemdError::parse(name, e))?
                .into_iter()
                .map(|heading| vec![heading])
                .collect(),
        };

        Ok(rows)
    }

    fn headers(&self) -> &'static [&'static str] {
        match self.config.extract_mode {
            ExtractMode::Cases => &HEADERS,
            ExtractMode::Headings => &HEADING_HEADERS,
        }
    }
}

fn require_sources<T>(sources: &[T]) -> Result<(), CasemdError> {
    if sources.is_empty() {
        return Err(CasemdError::Input("no sources provided".to_string()));
    }
    Ok(())
}
