//! Parser Module
//!
//! Markdownの点検シートからテストケースと見出しを抽出する。
//! どちらも行単位の単一パスで、入力全体をメモリに保持しない。

mod cases;
mod headings;

use std::io::{self, BufRead};

pub use cases::extract_cases;
pub use headings::extract_headings;

/// 1行ずつ`visit`に渡す
///
/// 行は`\n`で区切り、末尾の`\r`を取り除く。不正なUTF-8はU+FFFDに置換するため、
/// エラーになるのはリーダー自体の読み込み失敗のみ。
fn for_each_line<R, F>(mut reader: R, mut visit: F) -> io::Result<()>
where
    R: BufRead,
    F: FnMut(&str),
{
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            return Ok(());
        }

        let mut line = buffer.as_slice();
        if let Some(rest) = line.strip_suffix(b"\n") {
            line = rest;
        }
        if let Some(rest) = line.strip_suffix(b"\r") {
            line = rest;
        }

        visit(&String::from_utf8_lossy(line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for_each_line(input, |line| lines.push(line.to_string())).unwrap();
        lines
    }

    #[test]
    fn test_line_endings() {
        assert_eq!(collect(b"a\nb\r\nc"), vec!["a", "b", "c"]);
        assert_eq!(collect(b"a\n\n"), vec!["a", ""]);
        assert!(collect(b"").is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        assert_eq!(
            collect(b"ok\nmemo: \xff\xfe\nnext\n"),
            vec!["ok", "memo: \u{FFFD}\u{FFFD}", "next"]
        );
    }
}
