use sqlx::PgPool;

/// Assemble the SQL by literal interpolation of the three form fields. No
/// sanitization — an accepted weakness of the surface, not a goal.
pub fn build_query(fields: &str, table: &str, condition: Option<&str>) -> String {
    let mut sql = format!("SELECT {} FROM {}", fields.trim(), table.trim());
    if let Some(cond) = condition.map(str::trim).filter(|c| !c.is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(cond);
    }
    sql
}

/// Run the query on a short-lived pooled connection and report the row count.
pub async fn execute(db: &PgPool, sql: &str) -> Result<u64, sqlx::Error> {
    let mut conn = db.acquire().await?;
    let rows = sqlx::query(sql).fetch_all(&mut *conn).await?;
    Ok(rows.len() as u64)
}

pub fn row_count_message(rows: u64) -> String {
    format!("{} record{} found.", rows, if rows == 1 { "" } else { "s" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_select_without_condition() {
        assert_eq!(
            build_query("name, price", "product_da", None),
            "SELECT name, price FROM product_da"
        );
    }

    #[test]
    fn builds_select_with_condition() {
        assert_eq!(
            build_query("*", "product_da", Some("price > 20")),
            "SELECT * FROM product_da WHERE price > 20"
        );
    }

    #[test]
    fn blank_condition_is_ignored() {
        assert_eq!(
            build_query(" * ", " users ", Some("   ")),
            "SELECT * FROM users"
        );
    }

    #[test]
    fn pluralizes_row_count() {
        assert_eq!(row_count_message(0), "0 records found.");
        assert_eq!(row_count_message(1), "1 record found.");
        assert_eq!(row_count_message(2), "2 records found.");
    }
}
