use thiserror::Error;

use crate::io::DecodeError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No file uploaded")]
    NoFileUploaded,

    #[error("Invalid form data: {0}")]
    InvalidForm(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("'{0}' sheet not found")]
    MissingSheet(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("No valid poule sheets found in the uploaded file.")]
    NoValidSheets,

    #[error("{} ledger portfolio(s) have no mapping entry: {}", .0.len(), .0.join(", "))]
    UnmappedPortfolios(Vec<String>),

    #[error("Error processing file: {0}")]
    Render(#[from] rust_xlsxwriter::XlsxError),

    #[error("Error processing file: {0}")]
    Processing(String),
}

impl AppError {
    /// True when the request itself was at fault and resubmitting the same
    /// upload would fail the same way.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::NoFileUploaded
                | AppError::InvalidForm(_)
                | AppError::PayloadTooLarge(_)
                | AppError::MissingSheet(_)
                | AppError::Decode(_)
                | AppError::NoValidSheets
                | AppError::UnmappedPortfolios(_)
        )
    }
}
