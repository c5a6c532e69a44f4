//! CSV schema inference: header row plus a bounded sample of records is enough
//! to pick a SQL type per column. The mapping is total — anything ambiguous
//! lands on `text`.

use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use time::{macros::format_description, PrimitiveDateTime};

/// Records sampled for type sniffing.
const SAMPLE_ROWS: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("file has no header row")]
    EmptyHeader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Real,
    DoublePrecision,
    Text,
    Timestamp,
    Interval,
}

impl SqlType {
    pub fn as_sql(self) -> &'static str {
        match self {
            SqlType::Boolean => "boolean",
            SqlType::SmallInt => "smallint",
            SqlType::Integer => "integer",
            SqlType::BigInt => "bigint",
            SqlType::Real => "real",
            SqlType::DoublePrecision => "double precision",
            SqlType::Text => "text",
            SqlType::Timestamp => "timestamp",
            SqlType::Interval => "interval",
        }
    }

    /// Classify a single raw CSV field. Empty fields carry no type information.
    fn sniff(raw: &str) -> Option<SqlType> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("false") {
            return Some(SqlType::Boolean);
        }
        if let Ok(n) = raw.parse::<i64>() {
            return Some(if i16::try_from(n).is_ok() {
                SqlType::SmallInt
            } else if i32::try_from(n).is_ok() {
                SqlType::Integer
            } else {
                SqlType::BigInt
            });
        }
        if raw.parse::<f64>().is_ok() {
            return Some(SqlType::DoublePrecision);
        }
        if is_timestamp(raw) {
            return Some(SqlType::Timestamp);
        }
        if is_interval(raw) {
            return Some(SqlType::Interval);
        }
        Some(SqlType::Text)
    }

    fn is_integer(self) -> bool {
        matches!(self, SqlType::SmallInt | SqlType::Integer | SqlType::BigInt)
    }

    fn is_numeric(self) -> bool {
        self.is_integer() || matches!(self, SqlType::Real | SqlType::DoublePrecision)
    }
}

fn is_timestamp(raw: &str) -> bool {
    PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )
    .is_ok()
        || PrimitiveDateTime::parse(
            raw,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
        )
        .is_ok()
}

fn is_interval(raw: &str) -> bool {
    lazy_static! {
        static ref INTERVAL_RE: Regex =
            Regex::new(r"^\d+ days? \d{2}:\d{2}:\d{2}(\.\d+)?$").unwrap();
    }
    INTERVAL_RE.is_match(raw)
}

/// Least common SQL type that holds values of both inputs.
fn widen(a: SqlType, b: SqlType) -> SqlType {
    if a == b {
        a
    } else if a.is_integer() && b.is_integer() {
        if a == SqlType::BigInt || b == SqlType::BigInt {
            SqlType::BigInt
        } else {
            SqlType::Integer
        }
    } else if a.is_numeric() && b.is_numeric() {
        SqlType::DoublePrecision
    } else {
        SqlType::Text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub sql_type: SqlType,
}

/// Strip `:` and map `.` and spaces to `_`. Idempotent.
pub fn sanitize_column(name: &str) -> String {
    name.chars()
        .filter_map(|ch| match ch {
            ':' => None,
            '.' | ' ' => Some('_'),
            other => Some(other),
        })
        .collect()
}

/// Read the header row and up to [`SAMPLE_ROWS`] records, producing an ordered
/// column list with inferred SQL types.
pub fn infer_schema(path: &Path) -> Result<Vec<Column>, SchemaError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = rdr.headers()?.clone();
    if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
        return Err(SchemaError::EmptyHeader);
    }

    let mut kinds: Vec<Option<SqlType>> = vec![None; headers.len()];
    for result in rdr.records().take(SAMPLE_ROWS) {
        let record = result?;
        for (i, field) in record.iter().enumerate().take(kinds.len()) {
            if let Some(kind) = SqlType::sniff(field) {
                kinds[i] = Some(match kinds[i] {
                    Some(prev) => widen(prev, kind),
                    None => kind,
                });
            }
        }
    }

    Ok(headers
        .iter()
        .zip(kinds)
        .map(|(name, kind)| Column {
            name: sanitize_column(name),
            sql_type: kind.unwrap_or(SqlType::Text),
        })
        .collect())
}

/// Column list rendered for `CREATE TABLE`.
pub fn column_ddl(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|c| format!("{} {}", c.name, c.sql_type.as_sql()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write csv");
        file
    }

    #[test]
    fn sanitize_column_strips_and_replaces() {
        assert_eq!(sanitize_column("a:b"), "ab");
        assert_eq!(sanitize_column("unit.price"), "unit_price");
        assert_eq!(sanitize_column("first name"), "first_name");
    }

    #[test]
    fn sanitize_column_is_idempotent() {
        for name in ["a:b.c d", "plain", "weird: mix.of all", "::.."] {
            let once = sanitize_column(name);
            assert_eq!(sanitize_column(&once), once);
        }
    }

    #[test]
    fn sniff_classifies_scalars() {
        assert_eq!(SqlType::sniff("true"), Some(SqlType::Boolean));
        assert_eq!(SqlType::sniff("False"), Some(SqlType::Boolean));
        assert_eq!(SqlType::sniff("42"), Some(SqlType::SmallInt));
        assert_eq!(SqlType::sniff("70000"), Some(SqlType::Integer));
        assert_eq!(SqlType::sniff("9999999999"), Some(SqlType::BigInt));
        assert_eq!(SqlType::sniff("3.14"), Some(SqlType::DoublePrecision));
        assert_eq!(
            SqlType::sniff("2024-07-23 16:43:55"),
            Some(SqlType::Timestamp)
        );
        assert_eq!(
            SqlType::sniff("2024-07-23 16:43:55.708747"),
            Some(SqlType::Timestamp)
        );
        assert_eq!(SqlType::sniff("3 days 04:05:06"), Some(SqlType::Interval));
        assert_eq!(SqlType::sniff("hello"), Some(SqlType::Text));
        assert_eq!(SqlType::sniff(""), None);
        assert_eq!(SqlType::sniff("   "), None);
    }

    #[test]
    fn widen_promotes_numerics_and_falls_back_to_text() {
        assert_eq!(widen(SqlType::SmallInt, SqlType::Integer), SqlType::Integer);
        assert_eq!(widen(SqlType::Integer, SqlType::BigInt), SqlType::BigInt);
        assert_eq!(
            widen(SqlType::BigInt, SqlType::DoublePrecision),
            SqlType::DoublePrecision
        );
        assert_eq!(
            widen(SqlType::Real, SqlType::DoublePrecision),
            SqlType::DoublePrecision
        );
        assert_eq!(widen(SqlType::Boolean, SqlType::SmallInt), SqlType::Text);
        assert_eq!(widen(SqlType::Timestamp, SqlType::Text), SqlType::Text);
    }

    #[test]
    fn infer_schema_over_sampled_rows() {
        let file = write_csv(
            "id,name,price,active,created: at\n\
             1,widget,9.99,true,2024-07-23 16:43:55\n\
             2,gadget,12.50,false,2024-07-24 09:00:00\n\
             40000,doohickey,1.25,true,2024-07-25 10:30:00\n",
        );
        let columns = infer_schema(file.path()).expect("infer");
        assert_eq!(
            columns,
            vec![
                Column {
                    name: "id".into(),
                    sql_type: SqlType::Integer
                },
                Column {
                    name: "name".into(),
                    sql_type: SqlType::Text
                },
                Column {
                    name: "price".into(),
                    sql_type: SqlType::DoublePrecision
                },
                Column {
                    name: "active".into(),
                    sql_type: SqlType::Boolean
                },
                Column {
                    name: "created_at".into(),
                    sql_type: SqlType::Timestamp
                },
            ]
        );
    }

    #[test]
    fn columns_with_no_typed_sample_default_to_text() {
        let file = write_csv("a,b\n,\n,\n");
        let columns = infer_schema(file.path()).expect("infer");
        assert!(columns.iter().all(|c| c.sql_type == SqlType::Text));
    }

    #[test]
    fn header_only_file_still_infers() {
        let file = write_csv("alpha,beta\n");
        let columns = infer_schema(file.path()).expect("infer");
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].sql_type, SqlType::Text);
    }

    #[test]
    fn empty_file_is_an_error() {
        let file = write_csv("");
        assert!(matches!(
            infer_schema(file.path()),
            Err(SchemaError::EmptyHeader)
        ));
    }

    #[test]
    fn column_ddl_renders_pairs() {
        let columns = vec![
            Column {
                name: "id".into(),
                sql_type: SqlType::BigInt,
            },
            Column {
                name: "label".into(),
                sql_type: SqlType::Text,
            },
        ];
        assert_eq!(column_ddl(&columns), "id bigint, label text");
    }

    #[test]
    fn mapping_is_total() {
        for t in [
            SqlType::Boolean,
            SqlType::SmallInt,
            SqlType::Integer,
            SqlType::BigInt,
            SqlType::Real,
            SqlType::DoublePrecision,
            SqlType::Text,
            SqlType::Timestamp,
            SqlType::Interval,
        ] {
            assert!(!t.as_sql().is_empty());
        }
    }
}
