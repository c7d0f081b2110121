//! Domain model of the shortener: URL records, the caller identity and the
//! store contract.
//!
//! Nothing in here depends on HTTP, PostgreSQL or Redis. Store backends live
//! in [`crate::infrastructure`], orchestration in [`crate::application`].
//!
//! - [`entities`] - [`entities::UrlRecord`] and [`entities::Identity`]
//! - [`repositories`] - The [`repositories::UrlRepository`] trait and its query types
//! - [`click_event`] - A click waiting to be counted
//! - [`click_worker`] - Background writer for deferred clicks
//!
//! In deferred click mode a successful resolution enqueues a
//! [`click_event::ClickEvent`]; [`click_worker::run_click_worker`] drains the
//! queue and calls [`repositories::UrlRepository::increment_clicks`].

pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod repositories;
