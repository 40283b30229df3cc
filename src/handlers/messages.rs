// handlers/messages.rs - /messages routes
//
// Same lifecycle as contacts. Messages have no per-account unique fields, so
// create only fails on an invalid payload.

use axum::Router;

use crate::app::AppState;
use crate::database::models::Message;

use super::resource;

pub fn routes() -> Router<AppState> {
    resource::routes::<Message>("/messages")
}
