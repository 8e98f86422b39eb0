//! deckgen: client-side orchestration for an AI presentation generator.
//!
//! User actions are methods on [`session::Session`]; each one validates its
//! inputs, makes zero or more sequential calls to the backend through the
//! [`api::Backend`] trait and reconciles the results with
//! [`state::AppState`]. [`render`] turns the state into sanitized view
//! models.

pub mod activity;
pub mod api;
pub mod batch;
pub mod charts;
pub mod cli;
pub mod config;
pub mod feedback;
pub mod generation;
pub mod identity;
pub mod notify;
pub mod render;
pub mod session;
pub mod state;
pub mod upload;

pub use api::http::HttpBackend;
pub use api::{ApiError, Backend};
pub use session::{Outcome, Session};
