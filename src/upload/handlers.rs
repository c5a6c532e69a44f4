use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::AuthUser,
    ingest::{loader, IngestJob},
    query::{dto::TableList, repo},
    state::AppState,
    upload::{dto::UploadResponse, intake},
};

/// Upload bodies larger than this are rejected outright.
const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", get(list_uploaded).post(upload))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Tables already ingested from previous uploads.
pub async fn list_uploaded(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
) -> Result<Json<TableList>, (StatusCode, String)> {
    match repo::list_data_tables(&state.db).await {
        Ok(tables) => Ok(Json(TableList { tables })),
        Err(e) => {
            error!(error = %e, "list data tables failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error. Please contact developer.".into(),
            ))
        }
    }
}

/// Accept a single CSV on the `file` field, spool it to disk and queue
/// ingestion. The response never waits on the ingestion itself.
#[instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), (StatusCode, String)> {
    while let Ok(Some(mut field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let original = field.file_name().unwrap_or_default().to_string();
        let mime = field.content_type().unwrap_or_default().to_string();

        let Some(stored) =
            intake::sanitized_upload_name(&original, &mime, OffsetDateTime::now_utc())
        else {
            warn!(filename = %original, mime = %mime, "upload rejected");
            return Err((StatusCode::BAD_REQUEST, "Invalid file or filename.".into()));
        };

        let dest = state.config.upload.dir.join(&stored);
        let size = match intake::spool_to_disk(&mut field, &dest).await {
            Ok(size) => size,
            Err(e) => {
                error!(error = %e, file = %stored, "spool to disk failed");
                let _ = tokio::fs::remove_file(&dest).await;
                return Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error uploading file.".into(),
                ));
            }
        };

        if size == 0 {
            warn!(file = %stored, "empty upload removed");
            let _ = tokio::fs::remove_file(&dest).await;
            return Err((
                StatusCode::BAD_REQUEST,
                "File is empty. Please try again.".into(),
            ));
        }

        let table = loader::derive_table_name(&stored);
        if let Err(e) = state.ingest.enqueue(IngestJob { source: dest.clone() }).await {
            error!(error = %e, file = %stored, "enqueue ingestion failed");
            let _ = tokio::fs::remove_file(&dest).await;
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error uploading file.".into(),
            ));
        }

        info!(user_id = %user_id, file = %stored, table = %table, bytes = size, "upload queued for ingestion");
        return Ok((
            StatusCode::ACCEPTED,
            Json(UploadResponse {
                message: "File uploaded. Ingestion queued.".into(),
                file: stored,
                table,
            }),
        ));
    }

    Err((StatusCode::BAD_REQUEST, "file field is required".into()))
}
