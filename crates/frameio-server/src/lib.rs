// ABOUTME: HTTP gateway for Frameio: route gating, admin sessions, and admin proxy routes.
// ABOUTME: Uses Axum with shared state for the session table, identity verifier, and backend client.

pub mod api;
pub mod app_state;
pub mod backend;
pub mod config;
pub mod cookies;
pub mod error;
pub mod gate;
pub mod routes;
pub mod web;

pub use app_state::{AppState, SharedState};
pub use config::FrameioConfig;
pub use routes::create_router;
