//! Error types for the postcode geocoder.
//!
//! # Design
//! Validation failures (`InvalidCredential`, `InvalidInput`,
//! `PreconditionFailed`, `Busy`, `InvalidEndpoint`) are returned
//! synchronously from the call that caused them. Everything that can go
//! wrong once the request is on the wire lands in the remaining variants and
//! reaches the caller through the `PendingLookup` future.

use thiserror::Error;

use crate::xml::XmlError;

/// Errors returned by `Geocoder`, `LocationsClient` and `Transport`.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The API key is not exactly 64 characters long.
    #[error("credential must be 64 characters, got {length}")]
    InvalidCredential { length: usize },

    /// The postal code is empty or too short once whitespace is removed.
    #[error("invalid postal code: {0}")]
    InvalidInput(&'static str),

    #[error("precondition failed: {0}")]
    PreconditionFailed(&'static str),

    /// A lookup is already in flight on this instance.
    #[error("a lookup is already in flight")]
    Busy,

    /// The composed request URI could not be parsed.
    #[error("invalid request URI: {0}")]
    InvalidEndpoint(String),

    #[error("transport failed: {0}")]
    Transport(String),

    /// The service rejected the credential (HTTP 401).
    #[error("credential rejected by the locations service")]
    Unauthorized,

    /// The service returned a non-200 status other than 401.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("malformed response: {0}")]
    Xml(#[from] XmlError),

    /// A `Location` element lacks one of the elements on the coordinate path.
    #[error("response is missing element `{0}`")]
    MissingElement(&'static str),

    #[error("{field} is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// The lookup worker went away without settling a result.
    #[error("lookup was canceled before completing")]
    Canceled,
}

impl GeocodeError {
    /// True for failures that happen after the request was issued: transport,
    /// HTTP status and response parsing errors.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            GeocodeError::Transport(_)
                | GeocodeError::Unauthorized
                | GeocodeError::HttpError { .. }
                | GeocodeError::Xml(_)
                | GeocodeError::MissingElement(_)
                | GeocodeError::InvalidNumber { .. }
                | GeocodeError::Canceled
        )
    }
}
