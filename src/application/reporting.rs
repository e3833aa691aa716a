use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::{
    build_output_rows, EmailDirectory, LedgerRow, MappingEntry, OutputRow, Poule, UserTotals,
    POULE_SHEETS,
};
use crate::io::{Sheet, Workbook};

use super::AppError;

/// Sheet mapping portfolio emails to display names.
pub const MAPPING_SHEET: &str = "Mapping";
/// Sheet holding the ledger rows to total.
pub const LEDGER_SHEET: &str = "45+ facturen Incasso Debtt Mana";

/// Knobs for a totals run.
#[derive(Debug, Clone, Default)]
pub struct AggregateOptions {
    /// Fail the run when a ledger row names a portfolio that has no mapping
    /// entry, instead of leaving the row out of the totals.
    pub strict_mapping: bool,
}

/// What happened to the ledger rows during a totals run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationStats {
    pub mapping_entries: usize,
    pub ledger_rows: usize,
    pub counted_rows: usize,
    pub rows_without_portfolio: usize,
    pub unmapped_rows: usize,
    pub unmapped_portfolios: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalsReport {
    pub rows: Vec<OutputRow>,
    pub stats: AggregationStats,
}

fn require_sheet<'a>(workbook: &'a Workbook, name: &str) -> Result<&'a Sheet, AppError> {
    workbook
        .sheet(name)
        .ok_or_else(|| AppError::MissingSheet(name.to_string()))
}

/// Total the ledger balances per display name.
///
/// Ledger rows are joined to the mapping sheet on the lower-cased portfolio email.
/// Rows without a portfolio are ignored; rows whose portfolio is not in the
/// mapping are left out and reported in the stats, or rejected in strict mode.
pub fn aggregate(
    workbook: &Workbook,
    options: &AggregateOptions,
) -> Result<TotalsReport, AppError> {
    let mapping_sheet = require_sheet(workbook, MAPPING_SHEET)?;
    let ledger_sheet = require_sheet(workbook, LEDGER_SHEET)?;

    let directory: EmailDirectory = mapping_sheet
        .records()
        .iter()
        .filter_map(MappingEntry::from_record)
        .collect();

    let mut stats = AggregationStats {
        mapping_entries: directory.len(),
        ..AggregationStats::default()
    };
    let mut totals = UserTotals::new();

    for record in ledger_sheet.records() {
        stats.ledger_rows += 1;
        let row = LedgerRow::from_record(&record);

        let Some(email) = row.portfolio_email else {
            stats.rows_without_portfolio += 1;
            continue;
        };

        match directory.resolve(&email) {
            Some(name) => {
                totals.add(name, row.balance);
                stats.counted_rows += 1;
            }
            None => {
                stats.unmapped_rows += 1;
                stats.unmapped_portfolios.insert(email.to_lowercase());
            }
        }
    }

    if !stats.unmapped_portfolios.is_empty() {
        tracing::warn!(
            rows = stats.unmapped_rows,
            portfolios = ?stats.unmapped_portfolios,
            "ledger rows reference portfolios missing from the mapping sheet"
        );
        if options.strict_mapping {
            return Err(AppError::UnmappedPortfolios(
                stats.unmapped_portfolios.into_iter().collect(),
            ));
        }
    }

    let rows = build_output_rows(totals.into_totals());
    tracing::info!(
        names = rows.len(),
        ledger_rows = stats.ledger_rows,
        counted = stats.counted_rows,
        unmapped = stats.unmapped_rows,
        "aggregated ledger totals"
    );

    Ok(TotalsReport { rows, stats })
}

/// Pass the poule sheets through as plain tables. Missing poules are skipped;
/// a workbook with none of them is an error.
pub fn extract_poules(workbook: &Workbook) -> Result<Vec<Poule>, AppError> {
    let poules: Vec<Poule> = POULE_SHEETS
        .iter()
        .filter_map(|name| workbook.sheet(name))
        .map(|sheet| Poule::from_rows(sheet.name(), sheet.matrix()))
        .collect();

    if poules.is_empty() {
        return Err(AppError::NoValidSheets);
    }

    tracing::debug!(count = poules.len(), "extracted poule sheets");
    Ok(poules)
}
