use feruca::Collator;
use serde::Serialize;

use super::{Amount, UserTotal};

/// One line of the generated totals sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow {
    #[serde(rename = "Naam")]
    pub naam: String,
    #[serde(rename = "Omzet")]
    pub omzet: Amount,
}

impl From<UserTotal> for OutputRow {
    fn from(total: UserTotal) -> Self {
        Self {
            naam: total.name,
            omzet: total.total,
        }
    }
}

/// Turn accumulated totals into output rows ordered by name.
pub fn build_output_rows(totals: Vec<UserTotal>) -> Vec<OutputRow> {
    let mut rows: Vec<OutputRow> = totals.into_iter().map(OutputRow::from).collect();
    sort_by_name(&mut rows);
    rows
}

/// Alphabetical order under the Unicode Collation Algorithm, so accented letters
/// sort with their base letter. Names that collate equal fall back to code point
/// order, which keeps the output deterministic.
pub fn sort_by_name(rows: &mut [OutputRow]) {
    let mut collator = Collator::default();
    rows.sort_by(|a, b| {
        collator
            .collate(&a.naam, &b.naam)
            .then_with(|| a.naam.cmp(&b.naam))
    });
}
