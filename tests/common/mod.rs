// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use anyhow::Result;
use omzet::application::{LEDGER_SHEET, MAPPING_SHEET};
use omzet::domain::CellValue;
use rust_xlsxwriter::Workbook;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub fn text(s: &str) -> CellValue {
    CellValue::from(s)
}

pub fn num(n: f64) -> CellValue {
    CellValue::Number(n)
}

/// Builder for input workbooks, written to real xlsx bytes so tests go through
/// the same decoding path as uploads.
#[derive(Default)]
pub struct WorkbookFixture {
    sheets: Vec<(String, Vec<Vec<CellValue>>)>,
}

impl WorkbookFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(mut self, name: &str, rows: Vec<Vec<CellValue>>) -> Self {
        self.sheets.push((name.to_string(), rows));
        self
    }

    /// Mapping sheet with an `Email`/`Name` header row.
    pub fn mapping(self, entries: &[(&str, &str)]) -> Self {
        let mut rows = vec![vec![text("Email"), text("Name")]];
        rows.extend(entries.iter().map(|(email, name)| vec![text(email), text(name)]));
        self.sheet(MAPPING_SHEET, rows)
    }

    /// Ledger sheet with a `portefeuille`/`saldo` header row.
    pub fn ledger(self, rows: Vec<(CellValue, CellValue)>) -> Self {
        let mut cells = vec![vec![text("portefeuille"), text("saldo")]];
        cells.extend(rows.into_iter().map(|(portfolio, saldo)| vec![portfolio, saldo]));
        self.sheet(LEDGER_SHEET, cells)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        for (name, rows) in &self.sheets {
            let sheet = workbook.add_worksheet();
            sheet.set_name(name)?;
            for (row_num, row) in (0u32..).zip(rows) {
                for (col_num, cell) in (0u16..).zip(row) {
                    match cell {
                        CellValue::Empty => {}
                        CellValue::Text(s) => {
                            sheet.write_string(row_num, col_num, s)?;
                        }
                        CellValue::Number(n) => {
                            sheet.write_number(row_num, col_num, *n)?;
                        }
                        CellValue::Bool(b) => {
                            sheet.write_boolean(row_num, col_num, *b)?;
                        }
                    }
                }
            }
        }
        Ok(workbook.save_to_buffer()?)
    }
}

/// The worked example: two mapped owners and one unmapped portfolio.
pub fn example_ledger() -> WorkbookFixture {
    WorkbookFixture::new()
        .mapping(&[("a@x.com", "Alice"), ("b@x.com", "Bob")])
        .ledger(vec![
            (text("A@X.com"), text("10,50")),
            (text("b@x.com"), text("5")),
            (text("c@x.com"), text("999")),
        ])
}

/// A tournament workbook with only `Poule B` among the poule sheets.
pub fn single_poule() -> WorkbookFixture {
    WorkbookFixture::new()
        .sheet("Info", vec![vec![text("Toernooi 2024")]])
        .sheet(
            "Poule B",
            vec![
                vec![text("Team"), text("Gespeeld"), text("Punten")],
                vec![text("Ajax"), num(2.0), num(6.0)],
                vec![text("PSV"), num(2.0), CellValue::Empty],
            ],
        )
}

pub const BOUNDARY: &str = "omzet-test-boundary";

/// A `multipart/form-data` body with one file field. Returns the content type
/// header value and the encoded body.
pub fn multipart_upload(field: &str, filename: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: application/vnd.openxmlformats-officedocument.spreadsheetml.sheet\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

/// Read one part of an xlsx package as text.
pub fn read_part(bytes: &[u8], part: &str) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut content = String::new();
    archive.by_name(part)?.read_to_string(&mut content)?;
    Ok(content)
}

/// Repackage an xlsx file with one of its parts rewritten.
pub fn rewrite_part(
    bytes: &[u8],
    part: &str,
    edit: impl Fn(String) -> String,
) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        let name = file.name().to_string();
        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        if name == part {
            content = edit(String::from_utf8(content)?).into_bytes();
        }
        writer.start_file(name, SimpleFileOptions::default())?;
        writer.write_all(&content)?;
    }

    Ok(writer.finish()?.into_inner())
}

/// Break a worksheet part with a shared-string cell whose index is not a number.
pub fn corrupt_sheet(bytes: &[u8], part: &str) -> Result<Vec<u8>> {
    rewrite_part(bytes, part, |xml| {
        xml.replace(
            "</sheetData>",
            r#"<row r="99"><c r="A99" t="s"><v>not-an-index</v></c></row></sheetData>"#,
        )
    })
}
