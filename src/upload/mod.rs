use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod intake;

pub fn router() -> Router<AppState> {
    handlers::upload_routes()
}
