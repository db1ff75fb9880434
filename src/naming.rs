//! Sheet Namer
//!
//! ソース名からワークシート名を導出し、ワークブック内で一意にする。
//!
//! XLSXはシート名に`* : ? [ ] / \`を含めることができず、長さは31文字まで、
//! 重複も許されない。同じ入力列からは常に同じ名前列が得られる。

use std::collections::{HashMap, HashSet};
use std::path::Path;

/// シート名の最大文字数（Unicodeコードポイント単位）
pub const MAX_SHEET_NAME_CHARS: usize = 31;

const INVALID_SHEET_NAME_CHARS: [char; 7] = ['*', ':', '?', '[', ']', '/', '\\'];

/// 1回のワークブック生成で使用するシート名レジストリ
///
/// ベース名ごとの使用回数（連番の生成用）と、確定済みの名前集合（衝突検出用）を
/// 別々に保持します。
///
/// # 使用例
///
/// ```rust
/// use casemd::SheetNamer;
///
/// let mut namer = SheetNamer::new();
/// assert_eq!(namer.assign("docs/alpha.md", 0), "alpha");
/// assert_eq!(namer.assign("other/alpha.md", 1), "alpha_2");
/// assert_eq!(namer.assign("", 2), "Sheet3");
/// ```
#[derive(Debug, Default)]
pub struct SheetNamer {
    usage: HashMap<String, usize>,
    finalized: HashSet<String>,
}

impl SheetNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// ソース名と位置（0始まり）から一意なシート名を割り当てる
    pub fn assign(&mut self, source_name: &str, index: usize) -> String {
        let base = derive_sheet_name(source_name, index);
        self.ensure_unique(base)
    }

    fn ensure_unique(&mut self, base: String) -> String {
        let mut count = self.usage.get(&base).copied().unwrap_or(0);

        if !self.finalized.contains(&base) {
            self.usage.insert(base.clone(), count.max(1));
            self.finalized.insert(base.clone());
            return base;
        }

        loop {
            count += 1;
            let candidate = with_suffix(&base, count);
            if self.finalized.contains(&candidate) {
                continue;
            }
            self.usage.insert(base, count);
            self.finalized.insert(candidate.clone());
            return candidate;
        }
    }
}

/// ソース名からベースとなるシート名を導出する
///
/// パスの最後の要素から拡張子を1つ取り除き、使用できない文字を`_`に置換し、
/// 前後の空白を除いて31文字に切り詰めます。結果が空になる場合は
/// `Sheet{index+1}`を返します。
pub fn derive_sheet_name(source_name: &str, index: usize) -> String {
    let fallback = || format!("Sheet{}", index + 1);

    if source_name.is_empty() {
        return fallback();
    }

    let file_name = match Path::new(source_name).file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => return fallback(),
    };

    let stem = match file_name.rfind('.') {
        Some(dot) => &file_name[..dot],
        None => file_name.as_str(),
    };

    let sanitized = sanitize_sheet_name(stem);
    if sanitized.is_empty() {
        return fallback();
    }

    sanitized
}

/// 使用できない文字を置換し、空白を除いて31文字に切り詰める
pub fn sanitize_sheet_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if INVALID_SHEET_NAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    truncate_chars(replaced.trim_matches(' '), MAX_SHEET_NAME_CHARS).to_string()
}

fn with_suffix(base: &str, count: usize) -> String {
    let suffix = format!("_{}", count);
    let max_base_chars = MAX_SHEET_NAME_CHARS
        .saturating_sub(suffix.chars().count())
        .max(1);
    format!("{}{}", truncate_chars(base, max_base_chars), suffix)
}

fn truncate_chars(value: &str, limit: usize) -> &str {
    match value.char_indices().nth(limit) {
        Some((byte_idx, _)) => &value[..byte_idx],
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_duplicate_sources_get_numbered() {
        let mut namer = SheetNamer::new();
        let names: Vec<String> = ["alpha.md", "alpha.md", "beta.md"]
            .iter()
            .enumerate()
            .map(|(i, name)| namer.assign(name, i))
            .collect();
        assert_eq!(names, vec!["alpha", "alpha_2", "beta"]);
    }

    #[test]
    fn test_third_duplicate_continues_counter() {
        let mut namer = SheetNamer::new();
        assert_eq!(namer.assign("a.md", 0), "a");
        assert_eq!(namer.assign("a.md", 1), "a_2");
        assert_eq!(namer.assign("a.md", 2), "a_3");
    }

    #[test]
    fn test_suffix_skips_names_taken_by_other_sources() {
        let mut namer = SheetNamer::new();
        assert_eq!(namer.assign("a_2.md", 0), "a_2");
        assert_eq!(namer.assign("a.md", 1), "a");
        assert_eq!(namer.assign("a.md", 2), "a_3");
    }

    #[test]
    fn test_empty_name_falls_back_to_position() {
        assert_eq!(derive_sheet_name("", 0), "Sheet1");
        assert_eq!(derive_sheet_name("", 4), "Sheet5");
    }

    #[test]
    fn test_derive_strips_directory_and_single_extension() {
        assert_eq!(derive_sheet_name("docs/checks/login.md", 0), "login");
        assert_eq!(derive_sheet_name("archive.tar.md", 0), "archive.tar");
        assert_eq!(derive_sheet_name("README", 0), "README");
    }

    #[test]
    fn test_derive_falls_back_when_nothing_remains() {
        assert_eq!(derive_sheet_name(".md", 1), "Sheet2");
        assert_eq!(derive_sheet_name("   .md", 2), "Sheet3");
        assert_eq!(derive_sheet_name("/", 0), "Sheet1");
    }

    #[test]
    fn test_sanitize_replaces_invalid_characters() {
        assert_eq!(sanitize_sheet_name("a*b:c?d[e]f\\g"), "a_b_c_d_e_f_g");
        assert_eq!(derive_sheet_name("Q1: Review?.md", 0), "Q1_ Review_");
    }

    #[test]
    fn test_sanitize_truncates_to_31_code_points() {
        let long = "あ".repeat(40);
        let name = sanitize_sheet_name(&long);
        assert_eq!(name.chars().count(), MAX_SHEET_NAME_CHARS);
    }

    #[test]
    fn test_suffix_keeps_candidate_within_limit() {
        let base = "x".repeat(31);
        let mut namer = SheetNamer::new();
        assert_eq!(namer.assign(&format!("{}.md", base), 0), base);
        let second = namer.assign(&format!("{}.md", base), 1);
        assert_eq!(second, format!("{}_2", "x".repeat(29)));
        assert_eq!(second.chars().count(), MAX_SHEET_NAME_CHARS);
    }

    proptest! {
        #[test]
        fn prop_names_are_legal_and_distinct(sources in proptest::collection::vec(".{0,40}", 1..12)) {
            let mut namer = SheetNamer::new();
            let names: Vec<String> = sources
                .iter()
                .enumerate()
                .map(|(i, s)| namer.assign(s, i))
                .collect();

            let mut seen = HashSet::new();
            for name in &names {
                prop_assert!(!name.is_empty());
                prop_assert!(name.chars().count() <= MAX_SHEET_NAME_CHARS);
                prop_assert!(!name.contains(&INVALID_SHEET_NAME_CHARS[..]));
                prop_assert!(seen.insert(name.clone()), "duplicate sheet name {}", name);
            }
        }

        #[test]
        fn prop_naming_is_deterministic(sources in proptest::collection::vec("[a-c]{0,3}(\\.md)?", 1..8)) {
            let run = || {
                let mut namer = SheetNamer::new();
                sources
                    .iter()
                    .enumerate()
                    .map(|(i, s)| namer.assign(s, i))
                    .collect::<Vec<_>>()
            };
            prop_assert_eq!(run(), run());
        }
    }
}
