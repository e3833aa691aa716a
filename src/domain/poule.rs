use serde::Serialize;

use super::CellValue;

/// Sheets shown by the poule viewer, in display order.
pub const POULE_SHEETS: [&str; 4] = ["Poule A", "Poule B", "Poule C", "Verliezerseiland"];

/// A sheet passed through as a plain table: header row plus data rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Poule {
    pub name: String,
    pub headers: Vec<String>,
    pub data: Vec<Vec<CellValue>>,
}

impl Poule {
    /// The first row becomes the headers, everything after it the data.
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut rows = rows.into_iter();
        let headers = rows
            .next()
            .map(|header| header.iter().map(CellValue::to_display).collect())
            .unwrap_or_default();
        Self {
            name: name.into(),
            headers,
            data: rows.collect(),
        }
    }
}
