//! Middleware layers
//!
//! ## Available Middleware
//!
//! - `signature_gate`: caller signature check on every non-exempt route
//! - `hawk`: Hawk authentication, IP allow-list and scope check
//! - `hawk_response`: `Server-Authorization` signing for opted-in Hawk routes

pub mod hawk;
pub mod hawk_response;
pub mod signature_gate;

// Re-exports
pub use hawk::{hawk_authenticate, HawkRouteState};
pub use hawk_response::hawk_sign_response;
pub use signature_gate::{signature_gate, SignedCaller};
