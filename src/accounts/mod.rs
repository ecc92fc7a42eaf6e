use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod password;
pub mod service;
pub mod store;

pub fn router() -> Router<AppState> {
    handlers::account_routes()
}
