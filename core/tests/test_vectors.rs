//! Verify validation, request building and response parsing against the JSON
//! test vectors stored in `test-vectors/`.
//!
//! Each locations case describes a postal code, the expected URL suffix, a
//! simulated response and either the expected outcome or the expected error
//! kind. Outcomes are compared as typed values, not strings.

use postcode_core::{
    Credential, GeocodeError, GeocoderConfig, HttpResponse, LocationsClient, LookupOutcome,
    PostalCode,
};

/// Map an error to the kind name used in the vector files.
fn error_kind(err: &GeocodeError) -> &'static str {
    match err {
        GeocodeError::InvalidCredential { .. } => "invalid_credential",
        GeocodeError::InvalidInput(_) => "invalid_input",
        GeocodeError::PreconditionFailed(_) => "precondition_failed",
        GeocodeError::Busy => "busy",
        GeocodeError::InvalidEndpoint(_) => "invalid_endpoint",
        GeocodeError::Transport(_) => "transport",
        GeocodeError::Unauthorized => "unauthorized",
        GeocodeError::HttpError { .. } => "http",
        GeocodeError::Xml(_) => "xml",
        GeocodeError::MissingElement(_) => "missing_element",
        GeocodeError::InvalidNumber { .. } => "invalid_number",
        GeocodeError::Canceled => "canceled",
    }
}

// ---------------------------------------------------------------------------
// Postal codes
// ---------------------------------------------------------------------------

#[test]
fn postal_code_test_vectors() {
    let raw = include_str!("../../test-vectors/postal_codes.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = case["raw"].as_str().unwrap();

        match PostalCode::new(input) {
            Ok(code) => {
                assert!(case.get("error").is_none(), "{name}: expected an error");
                assert_eq!(code.as_str(), case["normalized"].as_str().unwrap(), "{name}");
            }
            Err(err) => {
                assert_eq!(
                    Some(error_kind(&err)),
                    case["error"].as_str(),
                    "{name}: unexpected error {err}"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

#[test]
fn locations_test_vectors() {
    let raw = include_str!("../../test-vectors/locations.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let credential = Credential::new(vectors["credential"].as_str().unwrap()).unwrap();
    let config = GeocoderConfig::with_endpoint(vectors["endpoint"].as_str().unwrap());
    let client = LocationsClient::new(credential, &config);

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();

        // Verify build
        let code = PostalCode::new(case["postal_code"].as_str().unwrap()).unwrap();
        let req = client.build_request(&code).unwrap();
        assert!(
            req.url.starts_with(client.request_uri_template()),
            "{name}: template prefix"
        );
        assert!(
            req.url.ends_with(case["expected_url_suffix"].as_str().unwrap()),
            "{name}: url {}",
            req.url
        );

        // Verify parse
        let sim = &case["response"];
        let response = HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: sim["body"].as_str().unwrap().to_string(),
        };
        let result = client.parse_response(response);

        match case.get("expected") {
            Some(expected) => {
                let expected: LookupOutcome = serde_json::from_value(expected.clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed outcome");
            }
            None => {
                let err = result.unwrap_err();
                assert_eq!(
                    error_kind(&err),
                    case["expected_error"].as_str().unwrap(),
                    "{name}: {err}"
                );
                assert!(err.is_lookup_failure(), "{name}: lookup failure");
            }
        }
    }
}
