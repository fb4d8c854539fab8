//! Export Wins API authentication server
//!
//! Axum application enforcing the caller signature gate on every route and
//! Hawk authentication on the routes serving external consumers.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
