use serde::{Deserialize, Serialize};

/// Free-form query assembled from three form fields.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query_field: String,
    pub query_table: String,
    #[serde(default)]
    pub query_condition: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub rows: u64,
    pub message: String,
}

/// Data tables available for querying.
#[derive(Debug, Serialize)]
pub struct TableList {
    pub tables: Vec<String>,
}
