use crate::domain::{OutputRow, Poule};
use crate::io::{render_totals, Workbook, TOTALS_FILENAME, XLSX_CONTENT_TYPE};

use super::{aggregate, extract_poules, AggregateOptions, AggregationStats, AppError};

/// Application service turning uploaded workbooks into reports.
/// This is the one entry point for every client (HTTP, CLI).
#[derive(Debug, Clone, Default)]
pub struct ReportService {
    options: AggregateOptions,
}

/// A rendered totals workbook, ready to hand out as a download.
#[derive(Debug, Clone)]
pub struct TotalsDownload {
    pub bytes: Vec<u8>,
    pub filename: &'static str,
    pub content_type: &'static str,
    pub rows: Vec<OutputRow>,
    pub stats: AggregationStats,
}

impl ReportService {
    pub fn new(options: AggregateOptions) -> Self {
        Self { options }
    }

    /// Decode an uploaded workbook and compute its per-name totals without
    /// rendering an output workbook.
    pub fn totals_rows(
        &self,
        upload: &[u8],
    ) -> Result<(Vec<OutputRow>, AggregationStats), AppError> {
        let workbook = Workbook::decode(upload)?;
        let report = aggregate(&workbook, &self.options)?;
        Ok((report.rows, report.stats))
    }

    /// Decode an uploaded workbook, total it and render the totals workbook.
    pub fn totals(&self, upload: &[u8]) -> Result<TotalsDownload, AppError> {
        let (rows, stats) = self.totals_rows(upload)?;
        let bytes = render_totals(&rows)?;

        Ok(TotalsDownload {
            bytes,
            filename: TOTALS_FILENAME,
            content_type: XLSX_CONTENT_TYPE,
            rows,
            stats,
        })
    }

    /// Decode an uploaded workbook and pass its poule sheets through.
    pub fn poules(&self, upload: &[u8]) -> Result<Vec<Poule>, AppError> {
        let workbook = Workbook::decode(upload)?;
        extract_poules(&workbook)
    }
}
