//! CSV Writer
//!
//! ヘッダー行と射影済みの行をCSVとしてストリーミング出力する。
//! カンマ・ダブルクォート・改行を含むフィールドはダブルクォートで囲み、
//! 内部のダブルクォートは2つにエスケープする。

use std::io::Write;

use crate::error::CasemdError;

/// CSVの出力先
///
/// 生成時にヘッダー行を書き込み、以降は1行ずつ追記します。
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl<W: Write> CsvSink<W> {
    /// ヘッダー行を書き込んでシンクを生成する
    pub fn new(output: W, headers: &[&str]) -> Result<Self, CasemdError> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(output);
        writer.write_record(headers)?;
        Ok(Self { writer, rows: 0 })
    }

    /// データ行を1行追記する
    pub fn write_row<I, T>(&mut self, row: I) -> Result<(), CasemdError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer.write_record(row)?;
        self.rows += 1;
        Ok(())
    }

    /// バッファを出力先へフラッシュする
    pub fn flush(&mut self) -> Result<(), CasemdError> {
        self.writer.flush()?;
        Ok(())
    }

    /// フラッシュして、書き込んだデータ行数（ヘッダーを除く）を返す
    pub fn finish(mut self) -> Result<usize, CasemdError> {
        self.flush()?;
        Ok(self.rows)
    }
}
