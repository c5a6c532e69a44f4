//! Table provisioning and bulk load. A table is created at most once per
//! derived name; an upload whose name maps to an existing table is a no-op.

use anyhow::Context;
use sqlx::{Connection, PgPool};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::{debug, info};

use crate::ingest::queue::IngestJob;
use crate::ingest::schema;

/// Derived table names are truncated to this length.
pub const TABLE_NAME_MAX_LEN: usize = 10;

/// Bytes per COPY write.
const COPY_CHUNK: usize = 8 * 1024;

#[derive(Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Table already existed; nothing created or loaded.
    Skipped { table: String },
    Loaded { table: String, rows: u64 },
}

/// Derive a valid SQL identifier from an uploaded file's name. Deterministic:
/// the basename token (stored names carry the upload timestamp after a space)
/// is lowercased, characters outside `[a-z0-9_$]` are removed, leading
/// characters are stripped until a letter or underscore, the rest truncated,
/// with a fixed fallback when nothing survives. Re-uploads of the same logical
/// file map to the same name regardless of their timestamps.
pub fn derive_table_name(file_name: &str) -> String {
    let stem = file_name
        .split(['.', ' '])
        .next()
        .unwrap_or(file_name);
    let mut out: String = stem
        .chars()
        .filter_map(|ch| {
            let ch = ch.to_ascii_lowercase();
            matches!(ch, 'a'..='z' | '0'..='9' | '_' | '$').then_some(ch)
        })
        .collect();
    let start = out
        .find(|c: char| c.is_ascii_lowercase() || c == '_')
        .unwrap_or(out.len());
    out.drain(..start);
    out.truncate(TABLE_NAME_MAX_LEN);
    if out.is_empty() {
        out.push_str("data");
    }
    out
}

/// Run one ingestion job end to end: existence check, `CREATE TABLE` from the
/// inferred schema, streaming COPY of the CSV body, then source file removal.
pub async fn ingest(pool: &PgPool, job: &IngestJob) -> anyhow::Result<IngestOutcome> {
    let file_name = job
        .source
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("bad source path {}", job.source.display()))?;
    let table = derive_table_name(file_name);

    let mut conn = pool.acquire().await.context("acquire connection")?;

    // Benign race: two concurrent uploads deriving the same name can both pass
    // this check; CREATE TABLE IF NOT EXISTS keeps the second one harmless.
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM pg_tables \
         WHERE schemaname = 'public' AND tablename = $1)",
    )
    .bind(&table)
    .fetch_one(&mut *conn)
    .await
    .context("table existence check")?;

    if exists {
        debug!(table = %table, "table already present, skipping load");
        tokio::fs::remove_file(&job.source)
            .await
            .context("remove source file")?;
        return Ok(IngestOutcome::Skipped { table });
    }

    let source = job.source.clone();
    let columns = tokio::task::spawn_blocking(move || schema::infer_schema(&source))
        .await
        .context("schema inference task")??;

    let mut tx = conn.begin().await.context("begin transaction")?;

    let create_sql = format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        table,
        schema::column_ddl(&columns)
    );
    sqlx::query(&create_sql)
        .execute(&mut *tx)
        .await
        .context("create table")?;

    let copy_sql = format!("COPY {} FROM STDIN WITH (FORMAT CSV)", table);
    let mut copy = (&mut *tx)
        .copy_in_raw(&copy_sql)
        .await
        .context("open copy stream")?;

    let file = tokio::fs::File::open(&job.source)
        .await
        .context("open source file")?;
    let mut reader = BufReader::new(file);

    let mut header = Vec::new();
    reader
        .read_until(b'\n', &mut header)
        .await
        .context("skip header row")?;

    let mut buf = [0u8; COPY_CHUNK];
    loop {
        let n = reader.read(&mut buf).await.context("read source file")?;
        if n == 0 {
            break;
        }
        copy.send(&buf[..n]).await.context("copy chunk")?;
    }
    let rows = copy.finish().await.context("finish copy")?;

    tx.commit().await.context("commit")?;

    tokio::fs::remove_file(&job.source)
        .await
        .context("remove source file")?;

    info!(table = %table, rows, "table created and loaded");
    Ok(IngestOutcome::Loaded { table, rows })
}
