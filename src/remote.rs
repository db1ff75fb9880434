//! Remote Spreadsheet Module
//!
//! シートをGoogle Sheets APIの`spreadsheets.create`リクエストに変換し、送信する。
//!
//! 変換処理（`Converter::create_spreadsheet`）は`SpreadsheetCreator`トレイトにのみ依存し、
//! HTTPの詳細は`SheetsService`に閉じ込める。

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::time::Duration;

use crate::error::CasemdError;
use crate::types::Sheet;

/// Google Sheets APIのデフォルトエンドポイント
pub const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// エラーレスポンス本文の最大読み込みサイズ（バイト）
const MAX_ERROR_BODY: u64 = 4096;

/// 作成するスプレッドシート
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSpreadsheet {
    /// スプレッドシートのタイトル
    pub title: String,

    /// シート（入力順、各シートの先頭行はヘッダー）
    pub sheets: Vec<Sheet>,
}

/// スプレッドシートを作成する外部サービス
///
/// 作成されたスプレッドシートのIDを返します。
pub trait SpreadsheetCreator {
    fn create_spreadsheet(&self, spreadsheet: &RemoteSpreadsheet) -> Result<String, CasemdError>;
}

/// `spreadsheets.create`のリクエスト本文
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpreadsheetPayload {
    properties: TitleProperties,
    sheets: Vec<SheetPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct TitleProperties {
    title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct SheetPayload {
    properties: TitleProperties,
    data: Vec<GridData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct GridData {
    row_data: Vec<RowData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct RowData {
    values: Vec<CellData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct CellData {
    #[serde(skip_serializing_if = "Option::is_none")]
    user_entered_value: Option<ExtendedValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtendedValue {
    string_value: String,
}

/// スプレッドシートをリクエスト本文に変換する
///
/// 空のセルは`userEnteredValue`自体を省略します（空文字列は送信しません）。
///
/// # 戻り値
///
/// * `Ok(SpreadsheetPayload)` - リクエスト本文
/// * `Err(CasemdError::Input)` - タイトルが空の場合
pub fn build_payload(spreadsheet: &RemoteSpreadsheet) -> Result<SpreadsheetPayload, CasemdError> {
    if spreadsheet.title.is_empty() {
        return Err(CasemdError::Input(
            "spreadsheet title cannot be empty".to_string(),
        ));
    }

    let sheets = spreadsheet
        .sheets
        .iter()
        .map(|sheet| SheetPayload {
            properties: TitleProperties {
                title: sheet.name.clone(),
            },
            data: vec![GridData {
                row_data: sheet.rows.iter().map(|row| row_data(row)).collect(),
            }],
        })
        .collect();

    Ok(SpreadsheetPayload {
        properties: TitleProperties {
            title: spreadsheet.title.clone(),
        },
        sheets,
    })
}

fn row_data(row: &[String]) -> RowData {
    let values = row
        .iter()
        .map(|value| CellData {
            user_entered_value: (!value.is_empty()).then(|| ExtendedValue {
                string_value: value.clone(),
            }),
        })
        .collect();
    RowData { values }
}

/// Google Sheets APIクライアント
///
/// アクセストークンには`https://www.googleapis.com/auth/spreadsheets`スコープが必要です。
///
/// # 使用例
///
/// ```rust,no_run
/// use casemd::{ConverterBuilder, SheetsService, Source};
///
/// # fn main() -> Result<(), casemd::CasemdError> {
/// let service = SheetsService::new(std::env::var("GOOGLE_SHEETS_ACCESS_TOKEN").unwrap_or_default())?;
/// let converter = ConverterBuilder::new().build()?;
/// let sources = vec![Source::from_bytes("checks.md", b"#### Case\n".to_vec())];
/// let id = converter.create_spreadsheet(&service, "Inspection", sources)?;
/// println!("{}", id);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SheetsService {
    agent: ureq::Agent,
    endpoint: String,
    access_token: String,
}

impl SheetsService {
    /// アクセストークンを指定してクライアントを生成する
    ///
    /// # 戻り値
    ///
    /// * `Err(CasemdError::Config)` - アクセストークンが空の場合
    pub fn new(access_token: impl Into<String>) -> Result<Self, CasemdError> {
        let access_token = access_token.into();
        if access_token.is_empty() {
            return Err(CasemdError::Config(
                "missing Google Sheets access token".to_string(),
            ));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();

        Ok(Self {
            agent,
            endpoint: DEFAULT_SHEETS_ENDPOINT.to_string(),
            access_token,
        })
    }

    /// エンドポイントを差し替える（テストやプロキシ用）
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl SpreadsheetCreator for SheetsService {
    fn create_spreadsheet(&self, spreadsheet: &RemoteSpreadsheet) -> Result<String, CasemdError> {
        let payload = build_payload(spreadsheet)?;
        let body = serde_json::to_string(&payload)?;

        tracing::debug!(
            endpoint = %self.endpoint,
            sheets = spreadsheet.sheets.len(),
            "creating remote spreadsheet"
        );

        let response = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("Bearer {}", self.access_token))
            .set("Content-Type", "application/json")
            .send_string(&body);

        let response = match response {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                return Err(CasemdError::Remote {
                    status: Some(status),
                    message: read_error_message(response),
                });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(CasemdError::Remote {
                    status: None,
                    message: transport.to_string(),
                });
            }
        };

        let text = response.into_string()?;
        parse_create_response(&text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    #[serde(default)]
    spreadsheet_id: String,
}

fn parse_create_response(body: &str) -> Result<String, CasemdError> {
    let response: CreateResponse = serde_json::from_str(body)?;
    if response.spreadsheet_id.is_empty() {
        return Err(CasemdError::Remote {
            status: None,
            message: "response missing spreadsheetId".to_string(),
        });
    }
    Ok(response.spreadsheet_id)
}

fn read_error_message(response: ureq::Response) -> String {
    let mut body = Vec::new();
    if response
        .into_reader()
        .take(MAX_ERROR_BODY)
        .read_to_end(&mut body)
        .is_err()
    {
        return "unreadable error body".to_string();
    }

    let message = String::from_utf8_lossy(&body).trim().to_string();
    if message.is_empty() {
        "empty error body".to_string()
    } else {
        message
    }
}
