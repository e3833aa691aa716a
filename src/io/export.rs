use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::domain::{OutputRow, EURO_FORMAT};

/// Name of the single sheet in a generated totals workbook.
pub const TOTALS_SHEET: &str = "User Totals";
/// Suggested download name for a generated totals workbook.
pub const TOTALS_FILENAME: &str = "user_totals.xlsx";
/// Content type of a generated totals workbook.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const NAME_HEADER: &str = "Naam";
const TOTAL_HEADER: &str = "Omzet";

/// Render output rows into an xlsx workbook and return its bytes.
///
/// The header row is always written, even when there are no rows. Every amount
/// cell below it carries the euro number format.
pub fn render_totals(rows: &[OutputRow]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let currency = Format::new().set_num_format(EURO_FORMAT);

    let sheet = workbook.add_worksheet();
    sheet.set_name(TOTALS_SHEET)?;
    sheet.write_string(0, 0, NAME_HEADER)?;
    sheet.write_string(0, 1, TOTAL_HEADER)?;

    for (row_num, row) in (1u32..).zip(rows) {
        sheet.write_string(row_num, 0, &row.naam)?;
        sheet.write_number_with_format(row_num, 1, row.omzet, &currency)?;
    }

    workbook.save_to_buffer()
}
