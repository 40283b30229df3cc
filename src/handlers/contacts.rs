// handlers/contacts.rs - /contacts routes
//
// GET    /contacts/            list (?includeRemoved=true for soft-deleted rows)
// GET    /contacts/:id         one contact
// POST   /contacts/            create; 400 when the email is taken in the account
// PATCH  /contacts/:id         partial update
// DELETE /contacts/:id         soft delete (?force=true destroys the row)

use axum::Router;

use crate::app::AppState;
use crate::database::models::Contact;

use super::resource;

pub fn routes() -> Router<AppState> {
    resource::routes::<Contact>("/contacts")
}
