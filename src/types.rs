//! Internal Data Types
//!
//! 抽出・射影・シリアライズの各段階で受け渡すデータ型を定義するモジュール。

use std::io::Read;

/// Markdownから抽出された1件のテストケース
///
/// レベル4見出し（`#### `）で生成され、次のレベル4見出しまたは入力の終端まで
/// 続くリスト行によって手順とチェックポイントが追加されます。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Case {
    /// 大項目（直前のレベル2見出し）
    pub major_item: String,

    /// 中項目（直前のレベル3見出し、大項目が変わるとリセット）
    pub medium_item: String,

    /// 小項目（このケースを開いたレベル4見出し）
    pub minor_item: String,

    /// 確認手順（番号付きリストの本文、番号は含まない）
    pub validation_steps: Vec<String>,

    /// チェックポイント（`* [ ] `／`* [x] `のマーカーを含むタスクリスト行）
    pub checkpoints: Vec<String>,
}

impl Case {
    /// 大項目・中項目・小項目を指定してケースを生成する
    pub fn new(
        major_item: impl Into<String>,
        medium_item: impl Into<String>,
        minor_item: impl Into<String>,
    ) -> Self {
        Self {
            major_item: major_item.into(),
            medium_item: medium_item.into(),
            minor_item: minor_item.into(),
            validation_steps: Vec::new(),
            checkpoints: Vec::new(),
        }
    }
}

/// 入力単位となるMarkdownソース
///
/// `name`はシート名の導出に使用されます（ファイルパスを想定）。
#[derive(Debug)]
pub struct Source<R: Read> {
    /// ソース名（ファイルパスまたは識別子）
    pub name: String,

    /// Markdown本文を読み込むリーダー
    pub reader: R,
}

impl<R: Read> Source<R> {
    /// ソース名とリーダーからソースを生成する
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }
}

impl Source<std::io::Cursor<Vec<u8>>> {
    /// メモリ上のバイト列からソースを生成する
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use casemd::Source;
    ///
    /// let source = Source::from_bytes("checks.md", "#### Case\n".as_bytes().to_vec());
    /// assert_eq!(source.name, "checks.md");
    /// ```
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self::new(name, std::io::Cursor::new(data))
    }
}

/// 名前付きの行集合（ワークシート1枚分）
///
/// `rows[0]`は常にヘッダー行です。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    /// シート名（31文字以内、ワークブック内で一意）
    pub name: String,

    /// 行データ（先頭はヘッダー行）
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// 先頭行の列数（行が無い場合は0）
    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }
}
