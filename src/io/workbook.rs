use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, SheetType};
use thiserror::Error;

use crate::domain::{CellValue, Record};

/// Header used for columns whose header cell is blank.
const EMPTY_HEADER: &str = "__EMPTY";

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Could not read workbook: {0}")]
    Open(#[source] calamine::Error),

    #[error("Could not read sheet '{sheet}': {source}")]
    Sheet {
        sheet: String,
        #[source]
        source: calamine::Error,
    },
}

/// A decoded workbook: its worksheets in file order, fully loaded in memory.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

/// One worksheet's used range as a grid of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<CellValue>>,
}

impl Workbook {
    /// Decode an uploaded workbook. The container format (xlsx, xlsm, xlsb, xls,
    /// ods) is detected from the bytes themselves.
    ///
    /// A worksheet that is listed but cannot be parsed fails the whole decode.
    /// Chart sheets and other non-grid sheets are left out.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader =
            open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(DecodeError::Open)?;

        let names: Vec<String> = reader
            .sheets_metadata()
            .iter()
            .filter(|meta| matches!(meta.typ, SheetType::WorkSheet))
            .map(|meta| meta.name.clone())
            .collect();

        let mut sheets = Vec::new();
        for name in names {
            let range = reader
                .worksheet_range(&name)
                .map_err(|source| DecodeError::Sheet {
                    sheet: name.clone(),
                    source,
                })?;
            sheets.push(Sheet::from_range(name, &range));
        }

        tracing::debug!(
            sheets = ?sheets.iter().map(Sheet::name).collect::<Vec<_>>(),
            "decoded workbook"
        );
        Ok(Self { sheets })
    }

    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Sheet::name).collect()
    }
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    fn from_range(name: String, range: &Range<Data>) -> Self {
        let rows = range
            .rows()
            .map(|row| row.iter().map(CellValue::from).collect())
            .collect();
        Self { name, rows }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records mode: the first row names the fields, every following row that has
    /// at least one value becomes a record.
    pub fn records(&self) -> Vec<Record> {
        let Some((header, body)) = self.rows.split_first() else {
            return Vec::new();
        };
        let keys = header_keys(header);

        body.iter()
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .map(|row| {
                keys.iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect::<Record>()
            })
            .collect()
    }

    /// Matrix mode: every row of the used range, header and blank rows included.
    pub fn matrix(&self) -> Vec<Vec<CellValue>> {
        self.rows.clone()
    }
}

/// Field names for a header row. Blank headers become `__EMPTY` and repeated
/// names get a numeric suffix (`Name`, `Name_1`, ...), so no column is lost.
fn header_keys(header: &[CellValue]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .map(|cell| {
            let base = match cell.to_display() {
                text if text.is_empty() => EMPTY_HEADER.to_string(),
                text => text,
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let key = if *count == 0 {
                base
            } else {
                format!("{}_{}", base, count)
            };
            *count += 1;
            key
        })
        .collect()
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) if s.is_empty() => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(err) => CellValue::Text(err.to_string()),
        }
    }
}
