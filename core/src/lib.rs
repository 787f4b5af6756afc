//! UK postal code to coordinate lookup against the Bing Maps Locations API.
//!
//! # Overview
//! `LocationsClient` builds the `HttpRequest` for a postal code and parses
//! the XML `HttpResponse` without touching the network (host-does-IO
//! pattern). `Geocoder` wraps it with input validation, a `Transport` and a
//! worker thread, and hands back a `PendingLookup` future that settles once
//! the response has been parsed.
//!
//! # Design
//! - `Credential` and `PostalCode` are validated on construction; nothing
//!   downstream re-checks them.
//! - Responses go through the generic `xml` module: parse, strip namespaces,
//!   then walk `Response/ResourceSets/ResourceSet/Resources`.
//! - `LookupOutcome` separates a parsed `(0, 0)` from "nothing found".
//! - One lookup in flight per `Geocoder`; a second one fails with `Busy`.

pub mod client;
pub mod config;
pub mod error;
pub mod geocoder;
pub mod http;
pub mod transport;
pub mod types;
pub mod xml;

pub use client::{extract_outcome, LocationsClient};
pub use config::GeocoderConfig;
pub use error::GeocodeError;
pub use geocoder::{Geocoder, PendingLookup};
pub use http::{HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{Coordinate, Credential, LookupOutcome, PostalCode};
pub use xml::{XmlDocument, XmlElement, XmlError};
