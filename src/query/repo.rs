use sqlx::PgPool;

/// Dynamically created data tables, excluding the app's own bookkeeping.
pub async fn list_data_tables(db: &PgPool) -> anyhow::Result<Vec<String>> {
    let tables = sqlx::query_scalar::<_, String>(
        r#"
        SELECT tablename
        FROM pg_tables
        WHERE schemaname = 'public'
          AND tablename NOT IN ('users', '_sqlx_migrations')
        ORDER BY tablename
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(tables)
}
