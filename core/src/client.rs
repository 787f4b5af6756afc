//! Stateless request builder and response parser for the Locations API.
//!
//! # Design
//! `LocationsClient` holds the credential and the composed request-URI
//! template and carries no mutable state between calls. `build_request`
//! produces an `HttpRequest` for a postal code, `parse_response` consumes the
//! matching `HttpResponse`. The caller executes the HTTP round-trip, which
//! keeps this half of the crate deterministic and free of I/O.

use tracing::debug;
use url::{form_urlencoded, Url};

use crate::config::GeocoderConfig;
use crate::error::GeocodeError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{Coordinate, Credential, LookupOutcome, PostalCode};
use crate::xml::{XmlDocument, XmlElement};

const LOCATIONS_PATH: &str = "/REST/v1/Locations";

/// Elements leading from the document root to each result set entry.
const RESOURCES_PATH: [&str; 4] = ["Response", "ResourceSets", "ResourceSet", "Resources"];

/// Synchronous, stateless client for the Locations API.
#[derive(Debug, Clone)]
pub struct LocationsClient {
    credential: Credential,
    request_uri_template: String,
}

impl LocationsClient {
    pub fn new(credential: Credential, config: &GeocoderConfig) -> Self {
        let request_uri_template = format!(
            "{}{LOCATIONS_PATH}?CountryRegion=UK&output=xml&key={}&postalCode=",
            config.endpoint.trim_end_matches('/'),
            encode(credential.as_str()),
        );
        Self {
            credential,
            request_uri_template,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// The request URI with everything but the trailing postal code filled in.
    pub fn request_uri_template(&self) -> &str {
        &self.request_uri_template
    }

    pub fn build_request(&self, postal_code: &PostalCode) -> Result<HttpRequest, GeocodeError> {
        let url = format!("{}{}", self.request_uri_template, encode(postal_code.as_str()));
        Url::parse(&url).map_err(|e| GeocodeError::InvalidEndpoint(format!("{e}: {url}")))?;
        Ok(HttpRequest {
            url,
            headers: vec![("accept".to_string(), "application/xml".to_string())],
        })
    }

    pub fn parse_response(&self, response: HttpResponse) -> Result<LookupOutcome, GeocodeError> {
        check_status(&response)?;
        let mut document = XmlDocument::parse(&response.body)?;
        document.strip_namespaces();
        extract_outcome(&document)
    }
}

/// Read the coordinate out of a namespace-stripped Locations response.
///
/// Every `Resources` element on the path is visited in document order and
/// each one overwrites the previous coordinate, so the last one wins. A
/// `Resources` element without a `Location` is an empty result set.
pub fn extract_outcome(document: &XmlDocument) -> Result<LookupOutcome, GeocodeError> {
    let mut coordinate = None;
    for resources in document.select(&RESOURCES_PATH) {
        let Some(location) = resources.child("Location") else {
            continue;
        };
        let point = location
            .child("Point")
            .ok_or(GeocodeError::MissingElement("Point"))?;
        coordinate = Some(Coordinate::new(
            number(point, "Latitude")?,
            number(point, "Longitude")?,
        ));
    }
    let outcome = LookupOutcome::from_coordinate(coordinate);
    debug!(?outcome, "extracted lookup outcome");
    Ok(outcome)
}

fn number(point: &XmlElement, field: &'static str) -> Result<f64, GeocodeError> {
    let value = point
        .child(field)
        .ok_or(GeocodeError::MissingElement(field))?
        .text();
    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(GeocodeError::InvalidNumber { field, value }),
    }
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Map non-success status codes to the appropriate `GeocodeError` variant.
fn check_status(response: &HttpResponse) -> Result<(), GeocodeError> {
    match response.status {
        200 => Ok(()),
        401 => Err(GeocodeError::Unauthorized),
        status => Err(GeocodeError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}
