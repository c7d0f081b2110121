//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod moderation;
pub mod redirect;
pub mod shorten;
pub mod urls;

pub use health::health_handler;
pub use moderation::{
    flag_url_handler, release_owner_handler, summary_handler, unflag_url_handler,
};
pub use redirect::redirect_handler;
pub use shorten::shorten_handler;
pub use urls::{delete_url_handler, edit_url_handler, get_url_handler, list_urls_handler};
