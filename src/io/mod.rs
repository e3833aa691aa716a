// Spreadsheet boundary: uploaded workbooks come in through `workbook`,
// generated totals go out through `export`.

pub mod export;
pub mod workbook;

pub use export::*;
pub use workbook::*;
