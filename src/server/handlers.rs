use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::application::AppError;
use crate::domain::Poule;

use super::AppState;

/// Multipart field carrying the uploaded workbook.
pub const UPLOAD_FIELD: &str = "excelFile";

pub async fn health() -> &'static str {
    "ok"
}

/// `POST /process`: upload a ledger workbook, download the totals workbook.
pub async fn process_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let upload = read_upload(multipart).await?;
    let size = upload.len();
    let service = state.service.clone();
    let download = run_blocking(move || service.totals(&upload)).await?;

    tracing::info!(
        upload_bytes = size,
        names = download.rows.len(),
        unmapped_rows = download.stats.unmapped_rows,
        "generated totals workbook"
    );

    let headers = [
        (header::CONTENT_TYPE, download.content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download.filename),
        ),
    ];
    Ok((headers, download.bytes).into_response())
}

/// `POST /poule-viewer`: upload a tournament workbook, get its poules as JSON.
pub async fn poule_viewer(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Vec<Poule>>, AppError> {
    let upload = read_upload(multipart).await?;
    let service = state.service.clone();
    let poules = run_blocking(move || service.poules(&upload)).await?;
    Ok(Json(poules))
}

/// Pull the workbook bytes out of the form. A missing or empty field means no
/// file was uploaded.
async fn read_upload(mut multipart: Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let data = field.bytes().await.map_err(form_error)?;
        if data.is_empty() {
            return Err(AppError::NoFileUploaded);
        }
        return Ok(data);
    }
    Err(AppError::NoFileUploaded)
}

/// Keep the body limit distinct from other malformed forms.
fn form_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::InvalidForm(err.body_text())
    }
}

/// Workbook decoding and rendering are CPU bound; keep them off the async workers.
async fn run_blocking<T, F>(job: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| AppError::Processing(err.to_string()))?
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            err if err.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!("request failed: {}", message);
        } else {
            tracing::warn!("request rejected: {}", message);
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
