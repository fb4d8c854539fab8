//! Hawk HTTP authentication.
//!
//! MACs, payload hashes and the header attribute format come from the
//! [`hawk`](::hawk) crate. This module binds them to the request shape the
//! server sees; the [`HawkClient`] is the caller's half of the exchange.

pub mod client;
pub mod header;
pub mod payload;
pub mod principal;

pub use ::hawk::Header;
pub use client::HawkClient;
pub use header::to_header_value;
pub use payload::payload_hash;
pub use principal::HawkPrincipal;

/// Header the server answers with on signed responses.
pub const SERVER_AUTHORIZATION_HEADER: &str = "server-authorization";

/// Value of `WWW-Authenticate` on Hawk authentication failures.
pub const WWW_AUTHENTICATE_VALUE: &str = "Hawk";

/// What a Hawk MAC binds the request to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTarget<'a> {
    pub method: &'a str,
    /// Path and query string.
    pub resource: &'a str,
    pub host: &'a str,
    pub port: u16,
}

/// A framework-independent view of an inbound request.
#[derive(Debug, Clone, Copy)]
pub struct HawkRequest<'a> {
    pub target: RequestTarget<'a>,
    pub content_type: &'a str,
    pub body: &'a [u8],
    pub authorization: Option<&'a str>,
    pub forwarded_for: Option<&'a str>,
}
