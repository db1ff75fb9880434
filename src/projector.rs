//! Row Projector
//!
//! テストケースを固定幅9列の行に射影する。CSV・XLSX・リモートの各出力で共通の表形式。

use crate::types::Case;

/// 1行あたりの列数
pub const COLUMN_COUNT: usize = 9;

/// ヘッダー行
///
/// 後半4列（Result, Test Date, Tester, Notes）は、エクスポート後に
/// 担当者が記入するための空欄です。
pub const HEADERS: [&str; COLUMN_COUNT] = [
    "Major Item",
    "Medium Item",
    "Minor Item",
    "Validation Steps",
    "Checkpoints",
    "Result",
    "Test Date",
    "Tester",
    "Notes",
];

/// 見出しモードのヘッダー行
pub const HEADING_HEADERS: [&str; 1] = ["Heading"];

/// テストケースを1行に射影する
///
/// 確認手順とチェックポイントは改行で連結されます。
pub fn project_row(case: &Case) -> [String; COLUMN_COUNT] {
    [
        case.major_item.clone(),
        case.medium_item.clone(),
        case.minor_item.clone(),
        case.validation_steps.join("\n"),
        case.checkpoints.join("\n"),
        String::new(), // Result
        String::new(), // Test Date
        String::new(), // Tester
        String::new(), // Notes
    ]
}

/// ヘッダー行を所有権付きの行として返す
pub(crate) fn header_row(headers: &[&str]) -> Vec<String> {
    headers.iter().map(|h| h.to_string()).collect()
}
