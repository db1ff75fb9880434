//! Security Module
//!
//! リソース制限を実装するモジュール。
//! 巨大な入力の読み込みや、XLSXの上限を超えるシートの生成を防ぎます。

use std::io::Read;

use crate::error::CasemdError;
use crate::types::Sheet;

/// XLSXの1シートあたりの最大行数
pub(crate) const MAX_SHEET_ROWS: usize = 1_048_576;

/// XLSXの1シートあたりの最大列数（XFD）
pub(crate) const MAX_SHEET_COLUMNS: usize = 16_384;

/// セキュリティ設定
///
/// ソース読み込み時の制限を定義します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SecurityConfig {
    /// 1ソースあたりの最大サイズ（バイト）
    /// デフォルト: 100MB (104_857_600 bytes)
    pub max_source_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_source_size: 104_857_600, // 100MB
        }
    }
}

/// サイズ上限付きでソースを読み込む
///
/// # 戻り値
///
/// * `Ok(Vec<u8>)` - 読み込んだバイト列
/// * `Err(CasemdError::Parse)` - 読み込みに失敗した場合
/// * `Err(CasemdError::SecurityViolation)` - 上限を超えた場合
pub(crate) fn read_bounded<R: Read>(
    reader: R,
    name: &str,
    config: &SecurityConfig,
) -> Result<Vec<u8>, CasemdError> {
    let mut buffer = Vec::new();
    let bytes_read = reader
        .take(config.max_source_size.saturating_add(1))
        .read_to_end(&mut buffer)
        .map_err(|e| CasemdError::parse(name, e))?;

    if bytes_read as u64 > config.max_source_size {
        return Err(CasemdError::SecurityViolation(format!(
            "Source '{}' exceeds maximum size: {} bytes",
            name, config.max_source_size
        )));
    }

    Ok(buffer)
}

/// シートの行数・列数がXLSXの上限内かを検証する
pub(crate) fn check_sheet_bounds(sheet: &Sheet) -> Result<(), CasemdError> {
    if sheet.rows.len() > MAX_SHEET_ROWS {
        return Err(CasemdError::SecurityViolation(format!(
            "Sheet '{}' has {} rows (max: {})",
            sheet.name,
            sheet.rows.len(),
            MAX_SHEET_ROWS
        )));
    }

    if let Some(width) = sheet.rows.iter().map(Vec::len).max() {
        if width > MAX_SHEET_COLUMNS {
            return Err(CasemdError::SecurityViolation(format!(
                "Sheet '{}' has {} columns (max: {})",
                sheet.name, width, MAX_SHEET_COLUMNS
            )));
        }
    }

    Ok(())
}
