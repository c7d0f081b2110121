//! API route configuration.
//!
//! Caller identity comes from gateway headers via
//! [`crate::api::middleware::CurrentIdentity`]; authorization is enforced by
//! the services.

use crate::api::handlers::{
    delete_url_handler, edit_url_handler, flag_url_handler, get_url_handler, list_urls_handler,
    release_owner_handler, shorten_handler, summary_handler, unflag_url_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// All API routes.
///
/// # Endpoints
///
/// - `POST   /urls`                    - Create a short URL
/// - `GET    /urls`                    - List the caller's URLs (admins: all)
/// - `GET    /urls/{id}`               - Fetch one URL
/// - `PATCH  /urls/{id}`               - Change its short code
/// - `DELETE /urls/{id}`               - Delete it
/// - `POST   /urls/{id}/flag`          - Flag (admin)
/// - `DELETE /urls/{id}/flag`          - Unflag (admin)
/// - `POST   /users/{user_id}/release` - Orphan a deleted user's URLs (admin)
/// - `GET    /summary`                 - Totals (admin)
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/urls", get(list_urls_handler).post(shorten_handler))
        .route(
            "/urls/{id}",
            get(get_url_handler)
                .patch(edit_url_handler)
                .delete(delete_url_handler),
        )
        .route(
            "/urls/{id}/flag",
            post(flag_url_handler).delete(unflag_url_handler),
        )
        .route("/users/{user_id}/release", post(release_owner_handler))
        .route("/summary", get(summary_handler))
}
