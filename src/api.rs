//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

/// 出力フォーマット
///
/// `Converter::convert`が書き出す形式を指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum OutputFormat {
    /// CSV形式（デフォルト）
    ///
    /// すべてのソースのケースを1つの表に連結して出力します。
    ///
    /// # 出力例
    ///
    /// ```csv
    /// Major Item,Medium Item,Minor Item,Validation Steps,Checkpoints,Result,Test Date,Tester,Notes
    /// Setup,Env,Dep,Install,* [ ] Done,,,,
    /// ```
    #[default]
    Csv,

    /// XLSX形式
    ///
    /// ソースごとに1枚のワークシートを持つワークブックを出力します。
    /// シート名はソース名から導出され、ワークブック内で一意になります。
    Xlsx,
}

/// 抽出モード
///
/// Markdownから何を表として取り出すかを指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum ExtractMode {
    /// テストケースを抽出（デフォルト）
    ///
    /// レベル2〜4見出しを大・中・小項目として扱い、9列の行を出力します。
    #[default]
    Cases,

    /// レベル1見出しのみを抽出
    ///
    /// `Heading`列1つだけの軽量な一覧を出力します。
    Headings,
}
