use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::AuthUser,
    query::{
        dto::{QueryRequest, QueryResponse, TableList},
        repo, services,
    },
    state::AppState,
};

pub fn query_routes() -> Router<AppState> {
    Router::new().route("/query", get(list_tables).post(run_query))
}

/// Tables available to query.
pub async fn list_tables(
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

/// Execute the interpolated query and report the row count. Database errors
/// surface as user-facing messages, never as a crash.
#[instrument(skip(state, payload))]
pub async fn run_query(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, String)> {
    let sql = services::build_query(
        &payload.query_field,
        &payload.query_table,
        payload.query_condition.as_deref(),
    );

    match services::execute(&state.db, &sql).await {
        Ok(rows) => {
            info!(user_id = %user_id, rows, "query executed");
            Ok(Json(QueryResponse {
                rows,
                message: services::row_count_message(rows),
            }))
        }
        Err(sqlx::Error::Database(db_err)) => {
            warn!(user_id = %user_id, error = %db_err, "bad query");
            Err((
                StatusCode::BAD_REQUEST,
                format!("Bad query: {}", db_err.message()),
            ))
        }
        Err(e) => {
            error!(user_id = %user_id, error = %e, "query failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error. Please contact developer.".into(),
            ))
        }
    }
}
