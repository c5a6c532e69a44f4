use serde::Serialize;

/// Response returned once an upload is spooled and queued for ingestion.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub file: String,
    pub table: String,
}
