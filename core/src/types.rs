//! Domain values for the geocoder.
//!
//! # Design
//! `Credential` and `PostalCode` can only be obtained through their
//! validating constructors, so every `LocationsClient` and `Geocoder`
//! operation can rely on them being well formed. `LookupOutcome` keeps a
//! parsed `(0, 0)` apart from "nothing found" instead of folding both into a
//! single boolean.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GeocodeError;

/// Required length of a Bing Maps key, in characters.
pub const CREDENTIAL_LEN: usize = 64;

/// Minimum length of a postal code once whitespace is removed.
pub const MIN_POSTAL_CODE_LEN: usize = 5;

/// API key for the locations service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: &str) -> Result<Self, GeocodeError> {
        let length = key.chars().count();
        if length != CREDENTIAL_LEN {
            return Err(GeocodeError::InvalidCredential { length });
        }
        Ok(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// The key must not leak into logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// A UK postal code with all whitespace removed.
///
/// Only the length is checked; `"ZZZZZ"` is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostalCode(String);

impl PostalCode {
    pub fn new(raw: &str) -> Result<Self, GeocodeError> {
        if raw.is_empty() {
            return Err(GeocodeError::InvalidInput("cannot accept an empty value"));
        }
        let normalized: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if normalized.chars().count() < MIN_POSTAL_CODE_LEN {
            return Err(GeocodeError::InvalidInput("please enter a full UK postcode"));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Latitude and longitude in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both components are exactly zero.
    pub fn is_origin(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

/// Result of a completed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupOutcome {
    /// The service returned a coordinate other than `(0, 0)`.
    Found(Coordinate),
    /// The service returned exactly `(0, 0)`.
    ///
    /// Kept apart from `Found` because the service never places a UK postcode
    /// there; `is_success` treats it as a failed lookup.
    AtOrigin,
    /// The response contained no location.
    NotFound,
}

impl LookupOutcome {
    pub(crate) fn from_coordinate(coordinate: Option<Coordinate>) -> Self {
        match coordinate {
            None => LookupOutcome::NotFound,
            Some(c) if c.is_origin() => LookupOutcome::AtOrigin,
            Some(c) => LookupOutcome::Found(c),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LookupOutcome::Found(_))
    }

    /// The coordinate to report, `(0, 0)` unless `Found`.
    pub fn coordinate(&self) -> Coordinate {
        match self {
            LookupOutcome::Found(c) => *c,
            LookupOutcome::AtOrigin | LookupOutcome::NotFound => Coordinate::default(),
        }
    }
}
