//! Workbook Serializer
//!
//! 名前付きの行集合を最小構成のXLSX（ZIPパッケージ化されたSpreadsheetML）に書き出す。
//!
//! # パッケージ構成
//!
//! ```text
//! [Content_Types].xml
//! _rels/.rels
//! docProps/app.xml
//! docProps/core.xml
//! xl/workbook.xml
//! xl/_rels/workbook.xml.rels
//! xl/worksheets/sheet{n}.xml   (n = 1..=シート数)
//! ```
//!
//! 汎用のXMLツリーは組み立てず、検証済みの入力（シート名・セル文字列）を
//! テンプレートに埋め込む。

use quick_xml::escape::escape;
use std::collections::HashSet;
use std::io::{Cursor, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::parts::{
    APP_PROPERTIES, CONTENT_TYPE_RELATIONSHIPS, CONTENT_TYPE_WORKBOOK, CONTENT_TYPE_WORKSHEET,
    CORE_PROPERTIES, NS_DOCUMENT_RELATIONSHIPS, NS_PACKAGE_RELATIONSHIPS, NS_SPREADSHEETML,
    RELATIONSHIP_WORKSHEET, ROOT_RELATIONSHIPS, XML_HEADER,
};
use crate::error::CasemdError;
use crate::naming::MAX_SHEET_NAME_CHARS;
use crate::security::check_sheet_bounds;
use crate::types::Sheet;

/// シートをXLSXワークブックとして書き出す
///
/// アーカイブはメモリ上で完成させてから`output`に書き込むため、途中で失敗した場合に
/// 不完全なワークブックが出力されることはありません。
///
/// # 引数
///
/// * `output` - 出力先のライター（Writeトレイトを実装）
/// * `sheets` - 入力順のシート（1枚以上）
///
/// # 戻り値
///
/// * `Ok(())` - 書き出しに成功した場合
/// * `Err(CasemdError::Input)` - シートが空、またはシート名が不正・重複している場合
/// * `Err(CasemdError::SecurityViolation)` - 行数・列数がXLSXの上限を超える場合
/// * `Err(CasemdError::Zip)` / `Err(CasemdError::Io)` - 書き出しに失敗した場合
///
/// # 使用例
///
/// ```rust
/// use casemd::{write_workbook, Sheet};
///
/// # fn main() -> Result<(), casemd::CasemdError> {
/// let sheet = Sheet::new("checks", vec![vec!["Major Item".to_string()]]);
/// let mut bytes = Vec::new();
/// write_workbook(&mut bytes, &[sheet])?;
/// assert!(bytes.starts_with(b"PK"));
/// # Ok(())
/// # }
/// ```
pub fn write_workbook<W: Write>(mut output: W, sheets: &[Sheet]) -> Result<(), CasemdError> {
    validate_sheets(sheets)?;

    let archive = build_archive(sheets)?;
    output.write_all(&archive)?;
    output.flush()?;

    tracing::debug!(
        sheets = sheets.len(),
        bytes = archive.len(),
        "workbook written"
    );
    Ok(())
}

fn validate_sheets(sheets: &[Sheet]) -> Result<(), CasemdError> {
    if sheets.is_empty() {
        return Err(CasemdError::Input(
            "workbook requires at least one sheet".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for sheet in sheets {
        let name = &sheet.name;
        if name.is_empty() || name.chars().count() > MAX_SHEET_NAME_CHARS {
            return Err(CasemdError::Input(format!(
                "Invalid sheet name length: '{}'",
                name
            )));
        }
        if name.contains(['*', ':', '?', '[', ']', '/', '\\']) {
            return Err(CasemdError::Input(format!(
                "Invalid character in sheet name: '{}'",
                name
            )));
        }
        if !seen.insert(name.as_str()) {
            return Err(CasemdError::Input(format!(
                "Duplicate sheet name: '{}'",
                name
            )));
        }
        check_sheet_bounds(sheet)?;
    }

    Ok(())
}

fn build_archive(sheets: &[Sheet]) -> Result<Vec<u8>, CasemdError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    add_part(&mut zip, options, "[Content_Types].xml", &content_types_xml(sheets.len()))?;
    add_part(&mut zip, options, "_rels/.rels", ROOT_RELATIONSHIPS)?;
    add_part(&mut zip, options, "docProps/app.xml", APP_PROPERTIES)?;
    add_part(&mut zip, options, "docProps/core.xml", CORE_PROPERTIES)?;
    add_part(&mut zip, options, "xl/workbook.xml", &workbook_xml(sheets))?;
    add_part(
        &mut zip,
        options,
        "xl/_rels/workbook.xml.rels",
        &workbook_relationships_xml(sheets.len()),
    )?;

    for (i, sheet) in sheets.iter().enumerate() {
        let path = format!("xl/worksheets/sheet{}.xml", i + 1);
        add_part(&mut zip, options, &path, &worksheet_xml(&sheet.rows))?;
    }

    Ok(zip.finish()?.into_inner())
}

fn add_part<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    options: FileOptions,
    path: &str,
    content: &str,
) -> Result<(), CasemdError> {
    zip.start_file(path, options)?;
    zip.write_all(content.as_bytes())?;
    Ok(())
}

fn content_types_xml(sheet_count: usize) -> String {
    let mut xml = String::from(XML_HEADER);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push_str(&format!(
        r#"<Default Extension="rels" ContentType="{}"/>"#,
        CONTENT_TYPE_RELATIONSHIPS
    ));
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(&format!(
        r#"<Override PartName="/xl/workbook.xml" ContentType="{}"/>"#,
        CONTENT_TYPE_WORKBOOK
    ));
    for n in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="{}"/>"#,
            n, CONTENT_TYPE_WORKSHEET
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn workbook_xml(sheets: &[Sheet]) -> String {
    let mut xml = String::from(XML_HEADER);
    xml.push_str(&format!(
        r#"<workbook xmlns="{}" xmlns:r="{}">"#,
        NS_SPREADSHEETML, NS_DOCUMENT_RELATIONSHIPS
    ));
    xml.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape_xml(&sheet.name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn workbook_relationships_xml(sheet_count: usize) -> String {
    let mut xml = String::from(XML_HEADER);
    xml.push_str(&format!(
        r#"<Relationships xmlns="{}">"#,
        NS_PACKAGE_RELATIONSHIPS
    ));
    for n in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}" Target="worksheets/sheet{}.xml"/>"#,
            n, RELATIONSHIP_WORKSHEET, n
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn worksheet_xml(rows: &[Vec<String>]) -> String {
    let mut xml = String::from(XML_HEADER);
    xml.push_str(&format!(r#"<worksheet xmlns="{}">"#, NS_SPREADSHEETML));

    let columns = rows.first().map_or(0, Vec::len);
    if columns > 0 {
        xml.push_str(&format!(
            r#"<dimension ref="A1:{}{}"/>"#,
            column_letter(columns),
            rows.len()
        ));
    }

    xml.push_str("<sheetData>");
    for (i, row) in rows.iter().enumerate() {
        let row_number = i + 1;
        xml.push_str(&format!(r#"<row r="{}">"#, row_number));
        for (j, value) in row.iter().enumerate() {
            let cell_ref = format!("{}{}", column_letter(j + 1), row_number);
            if value.is_empty() {
                xml.push_str(&format!(r#"<c r="{}"/>"#, cell_ref));
                continue;
            }
            xml.push_str(&format!(
                r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                cell_ref,
                escape_cell_text(value)
            ));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// 1始まりの列番号をExcelの列名（A, B, ..., Z, AA, ...）に変換する
///
/// 0を表す文字が無い全単射的26進法のため、各桁で1を引いてから剰余を取ります。
/// 0以下（`0`）は`"A"`として扱います。
///
/// # 使用例
///
/// ```rust
/// use casemd::column_letter;
///
/// assert_eq!(column_letter(1), "A");
/// assert_eq!(column_letter(27), "AA");
/// assert_eq!(column_letter(53), "BA");
/// ```
pub fn column_letter(index: usize) -> String {
    if index == 0 {
        return "A".to_string();
    }

    let mut n = index;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.iter().rev().map(|&b| b as char).collect()
}

/// XMLで使用できない制御文字をU+FFFDに置換してからエスケープする
fn escape_xml(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| if is_xml_char(c) { c } else { '\u{FFFD}' })
        .collect();
    escape(cleaned.as_str()).into_owned()
}

/// セル文字列をエスケープし、改行を数値文字参照にする
fn escape_cell_text(value: &str) -> String {
    escape_xml(value)
        .replace('\r', "&#13;")
        .replace('\n', "&#10;")
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Read};
    use zip::ZipArchive;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(2), "B");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(28), "AB");
        assert_eq!(column_letter(52), "AZ");
        assert_eq!(column_letter(53), "BA");
        assert_eq!(column_letter(702), "ZZ");
        assert_eq!(column_letter(703), "AAA");
        assert_eq!(column_letter(16_384), "XFD");
    }

    #[test]
    fn test_column_letter_zero_degrades_to_a() {
        assert_eq!(column_letter(0), "A");
    }

    #[test]
    fn test_escape_cell_text() {
        assert_eq!(escape_cell_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_cell_text("line1\nline2"), "line1&#10;line2");
        assert_eq!(escape_cell_text("bell\u{7}"), "bell\u{FFFD}");
    }

    #[test]
    fn test_worksheet_xml_cells() {
        let xml = worksheet_xml(&[row(&["H1", "H2", "H3"]), row(&["x", "", "a\nb"])]);
        assert!(xml.contains(r#"<dimension ref="A1:C2"/>"#));
        assert!(xml.contains(r#"<row r="1"><c r="A1" t="inlineStr"><is><t>H1</t></is></c>"#));
        assert!(xml.contains(r#"<c r="B2"/>"#));
        assert!(xml.contains(r#"<c r="C2" t="inlineStr"><is><t>a&#10;b</t></is></c>"#));
    }

    #[test]
    fn test_worksheet_xml_without_rows_has_no_dimension() {
        let xml = worksheet_xml(&[]);
        assert!(!xml.contains("<dimension"));
        assert!(xml.contains("<sheetData></sheetData>"));

        let xml = worksheet_xml(&[Vec::new()]);
        assert!(!xml.contains("<dimension"));
    }

    #[test]
    fn test_workbook_contains_all_parts() {
        let sheets = vec![
            Sheet::new("alpha", vec![row(&["A"]), row(&["1"])]),
            Sheet::new("R&D", vec![row(&["B"])]),
        ];
        let mut bytes = Vec::new();
        write_workbook(&mut bytes, &sheets).unwrap();

        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "docProps/app.xml",
                "docProps/core.xml",
                "xl/_rels/workbook.xml.rels",
                "xl/workbook.xml",
                "xl/worksheets/sheet1.xml",
                "xl/worksheets/sheet2.xml",
            ]
        );

        let workbook = read_part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"<sheet name="alpha" sheetId="1" r:id="rId1"/>"#));
        assert!(workbook.contains(r#"<sheet name="R&amp;D" sheetId="2" r:id="rId2"/>"#));

        let rels = read_part(&bytes, "xl/_rels/workbook.xml.rels");
        assert!(rels.contains(r#"Id="rId2""#));
        assert!(rels.contains(r#"Target="worksheets/sheet2.xml""#));

        let content_types = read_part(&bytes, "[Content_Types].xml");
        assert_eq!(content_types.matches("<Override ").count(), 3);
    }

    #[test]
    fn test_empty_sheet_list_is_rejected() {
        let mut bytes = Vec::new();
        let result = write_workbook(&mut bytes, &[]);
        assert!(matches!(result, Err(CasemdError::Input(_))));
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_invalid_sheet_names_are_rejected() {
        let cases = [
            vec![Sheet::new("", Vec::new())],
            vec![Sheet::new("a/b", Vec::new())],
            vec![Sheet::new("x".repeat(32), Vec::new())],
            vec![Sheet::new("dup", Vec::new()), Sheet::new("dup", Vec::new())],
        ];
        for sheets in &cases {
            let result = write_workbook(Vec::new(), sheets);
            assert!(matches!(result, Err(CasemdError::Input(_))), "{:?}", sheets);
        }
    }

    #[test]
    fn test_write_failure_surfaces_io_error() {
        struct FailingWriter;
        impl Write for FailingWriter {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::WriteZero, "disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let sheets = vec![Sheet::new("alpha", vec![row(&["A"])])];
        match write_workbook(FailingWriter, &sheets) {
            Err(CasemdError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::WriteZero),
            other => panic!("Expected Io error, got {:?}", other),
        }
    }
}
