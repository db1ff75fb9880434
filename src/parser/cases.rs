//! テストケース抽出（見出し駆動の状態機械）
//!
//! 見出しの深さを階層として扱い、リスト行を手順・チェックポイントとして収集する。
//!
//! | 行                         | 動作                                             |
//! | -------------------------- | ------------------------------------------------ |
//! | `## 大項目`                | 大項目を更新し、中項目をリセット                 |
//! | `### 中項目`               | 中項目を更新                                     |
//! | `#### 小項目`              | 開いているケースを確定し、新しいケースを開く     |
//! | `1. 手順`                  | 開いているケースの確認手順に本文を追加           |
//! | `* [ ] 確認` / `* [x] 確認` | 開いているケースのチェックポイントに行全体を追加 |

use regex::Regex;
use std::io::{self, BufRead};
use std::sync::LazyLock;

use super::for_each_line;
use crate::types::Case;

// 区切りの空白はASCIIのみ（全角スペースやNBSPはリストとみなさない）
static ORDERED_LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+\.[\t\n\x0C\r ]+(.*)").expect("ordered list regex should be valid")
});

static TASK_LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*[\t\n\x0C\r ]+\[[ x]\][\t\n\x0C\r ]+(.*)").expect("task list regex should be valid")
});

/// 走査中の状態
///
/// 1行ずつ`feed`し、最後に`finish`で結果を取り出す。
#[derive(Debug, Default)]
struct ScanState {
    major_item: String,
    medium_item: String,
    current: Option<Case>,
    cases: Vec<Case>,
}

impl ScanState {
    fn feed(&mut self, line: &str) {
        // 見出しは行頭（トリム前）で判定する
        if let Some(rest) = line.strip_prefix("## ") {
            self.major_item = rest.to_string();
            self.medium_item.clear();
            return;
        }

        if let Some(rest) = line.strip_prefix("### ") {
            self.medium_item = rest.to_string();
            return;
        }

        if let Some(rest) = line.strip_prefix("#### ") {
            self.close_case();
            self.current = Some(Case::new(
                self.major_item.as_str(),
                self.medium_item.as_str(),
                rest,
            ));
            return;
        }

        let Some(case) = self.current.as_mut() else {
            return;
        };

        let trimmed = line.trim();
        if let Some(captures) = ORDERED_LIST_RE.captures(trimmed) {
            case.validation_steps.push(captures[1].to_string());
        } else if TASK_LIST_RE.is_match(trimmed) {
            // マーカー（完了状態）をレビュー担当者向けに残す
            case.checkpoints.push(trimmed.to_string());
        }
    }

    fn close_case(&mut self) {
        if let Some(case) = self.current.take() {
            tracing::trace!(minor_item = %case.minor_item, "case closed");
            self.cases.push(case);
        }
    }

    fn finish(mut self) -> Vec<Case> {
        self.close_case();
        self.cases
    }
}

/// Markdownからテストケースを抽出する
///
/// 入力を1回だけ前方に走査します。階層が不正な入力でもエラーにはならず、
/// 可能な範囲で結果を返します。
///
/// # 引数
///
/// * `reader` - Markdownを読み込むリーダー（BufReadトレイトを実装）
///
/// # 戻り値
///
/// * `Ok(Vec<Case>)` - 出現順のテストケース（レベル4見出しと同数）
/// * `Err(io::Error)` - 読み込みに失敗した場合（不正なUTF-8はU+FFFDに置換し、エラーにしない）
///
/// # 使用例
///
/// ```rust
/// use casemd::extract_cases;
///
/// let markdown = "# T\n\n## Setup\n### Env\n#### Dep\n1. Install\n* [ ] Done\n";
/// let cases = extract_cases(markdown.as_bytes()).unwrap();
///
/// assert_eq!(cases.len(), 1);
/// assert_eq!(cases[0].validation_steps, vec!["Install"]);
/// assert_eq!(cases[0].checkpoints, vec!["* [ ] Done"]);
/// ```
pub fn extract_cases<R: BufRead>(reader: R) -> io::Result<Vec<Case>> {
    let mut state = ScanState::default();
    for_each_line(reader, |line| state.feed(line))?;
    Ok(state.finish())
}
