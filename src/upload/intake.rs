//! Upload intake: filename/MIME validation, stored-name sanitization and
//! bounded-memory spooling of the request body to disk.

use axum::extract::multipart::Field;
use std::path::Path;
use time::{macros::format_description, OffsetDateTime};
use tokio::io::{AsyncWriteExt, BufWriter};

const ALLOWED_EXTENSIONS: &[&str] = &["CSV"];

/// Upload bodies are written through a buffer of this size.
pub const CHUNK_SIZE: usize = 1024 * 1024; // 1 MiB

/// Validate an incoming filename/MIME pair and produce the stored name:
/// sanitized basename + upload timestamp + ".csv". `None` means the upload is
/// rejected.
pub fn sanitized_upload_name(filename: &str, mime: &str, now: OffsetDateTime) -> Option<String> {
    if filename.is_empty()
        || mime != "text/csv"
        || !filename.contains('.')
        || filename.len() < 3
    {
        return None;
    }
    let ext = filename.rsplit('.').next()?;
    if !ALLOWED_EXTENSIONS.contains(&ext.to_ascii_uppercase().as_str()) {
        return None;
    }

    let stem = filename.split('.').next().unwrap_or(filename);
    let mut stem = sanitize_stem(stem);
    if stem.is_empty() {
        stem.push_str("upload");
    }

    let ts = now
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
        ))
        .ok()?;
    Some(format!("{} {}.csv", stem, ts))
}

/// Lowercase, spaces and dots to underscores, anything outside `[a-z0-9_-]`
/// dropped, leading non-letters stripped.
fn sanitize_stem(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len());
    for ch in stem.chars() {
        let ch = ch.to_ascii_lowercase();
        match ch {
            'a'..='z' | '0'..='9' | '_' | '-' => out.push(ch),
            ' ' | '.' => out.push('_'),
            _ => {}
        }
    }
    let start = out.find(|c: char| c.is_ascii_lowercase()).unwrap_or(out.len());
    out.split_off(start)
}

/// Stream one multipart field to `dest` through a fixed-size buffer, returning
/// the number of bytes written. The whole body is never held in memory.
pub async fn spool_to_disk(field: &mut Field<'_>, dest: &Path) -> anyhow::Result<u64> {
    let file = tokio::fs::File::create(dest).await?;
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    let mut written: u64 = 0;
    while let Some(chunk) = field.chunk().await? {
        written += chunk.len() as u64;
        writer.write_all(&chunk).await?;
    }
    writer.flush().await?;
    Ok(written)
}
