//! レベル1見出しの抽出

use std::io::{self, BufRead};

use super::for_each_line;

/// レベル1見出し（`# `）のテキストを出現順に抽出する
///
/// 階層の状態は持たず、前後の空白を除いた行が`# `で始まるものをすべて収集します。
/// 見出しのテキストも前後の空白を除いて返します。
///
/// # 戻り値
///
/// * `Ok(Vec<String>)` - 見出しのリスト（見出しが無い場合は空）
/// * `Err(io::Error)` - 読み込みに失敗した場合
pub fn extract_headings<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let mut headings = Vec::new();

    for_each_line(reader, |line| {
        if let Some(rest) = line.trim().strip_prefix("# ") {
            headings.push(rest.trim().to_string());
        }
    })?;

    Ok(headings)
}
