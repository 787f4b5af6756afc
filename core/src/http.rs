//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! `LocationsClient` builds an `HttpRequest` and parses an `HttpResponse`
//! without touching the network. Whoever executes the round-trip (the
//! `Transport` used by `Geocoder`, a test, or a C host through the FFI crate)
//! converts between these plain-data types and its own HTTP library.
//!
//! Every request the locations service accepts is a `GET` with no body, so
//! the request carries only a URL and headers.

/// An outbound `GET` described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// An HTTP response described as plain data.
///
/// Constructed by the transport after executing an `HttpRequest`, then
/// passed to `LocationsClient::parse_response`.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}
