//! C-ABI wrapper around `postcode-core`.
//!
//! # Overview
//! Exposes the sans-IO half of the geocoder through `extern "C"` functions:
//! a C host validates its key, builds the Locations request for a postal
//! code, executes it with its own HTTP stack and hands the response back for
//! parsing. No Rust threads or async runtime are involved.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Validation failures (bad key, bad postal code, bad endpoint) return
//!   null; parse failures return an `FfiLookupResult` with an error code.
//! - The C caller owns all returned pointers and must call the matching
//!   `pc_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use postcode_core::{Credential, GeocoderConfig, HttpResponse, LocationsClient, PostalCode};

use types::*;

/// Read a C string argument; null and invalid UTF-8 yield `None`.
fn read_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client for `credential` against `endpoint`.
///
/// `endpoint` may be null to use the public Bing Maps host. Returns null if
/// `credential` is null or not exactly 64 characters, or on panic.
/// The caller must free the returned pointer with `pc_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn pc_client_new(
    credential: *const c_char,
    endpoint: *const c_char,
) -> *mut FfiLocationsClient {
    catch_unwind(|| {
        let Some(key) = read_str(credential) else {
            return std::ptr::null_mut();
        };
        let Ok(credential) = Credential::new(key) else {
            return std::ptr::null_mut();
        };
        let config = match read_str(endpoint) {
            Some(endpoint) => GeocoderConfig::with_endpoint(endpoint),
            None => GeocoderConfig::default(),
        };
        let client = LocationsClient::new(credential, &config);
        Box::into_raw(Box::new(FfiLocationsClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `pc_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pc_client_free(client: *mut FfiLocationsClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

/// The request URI with everything but the postal code filled in.
///
/// Returns null if `client` is null. Free with `pc_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn pc_request_uri_template(client: *const FfiLocationsClient) -> *mut c_char {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        CString::new(client.inner.request_uri_template())
            .map(CString::into_raw)
            .unwrap_or(std::ptr::null_mut())
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Build / parse
// ---------------------------------------------------------------------------

/// Build the Locations request for `postal_code`.
///
/// Returns null if an argument is null, if the postal code is empty or
/// shorter than five characters without whitespace, or if the resulting URI
/// does not parse. Free with `pc_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn pc_build_request(
    client: *const FfiLocationsClient,
    postal_code: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(raw) = read_str(postal_code) else {
            return std::ptr::null_mut();
        };
        let Ok(code) = PostalCode::new(raw) else {
            return std::ptr::null_mut();
        };
        match client.inner.build_request(&code) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is
/// treated as empty.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body: read_str(resp.body).unwrap_or("").to_string(),
    }
}

/// Parse the response to a request built by `pc_build_request`.
///
/// Always returns a result; free it with `pc_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn pc_parse_response(
    client: *const FfiLocationsClient,
    response: *const FfiHttpResponse,
) -> *mut FfiLookupResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiLookupResult::null_arg("client");
        }
        if response.is_null() {
            return FfiLookupResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match client.inner.parse_response(ffi_response_to_core(resp)) {
            Ok(outcome) => FfiLookupResult::ok(outcome),
            Err(e) => FfiLookupResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiLookupResult::panic("panic in pc_parse_response"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by `pc_build_request`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pc_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.url.is_null() {
            drop(unsafe { CString::from_raw(req.url) });
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free an `FfiLookupResult` returned by `pc_parse_response`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pc_free_result(result: *mut FfiLookupResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pc_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    const KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn new_client() -> *mut FfiLocationsClient {
        let key = CString::new(KEY).unwrap();
        let endpoint = CString::new("http://localhost:3000").unwrap();
        pc_client_new(key.as_ptr(), endpoint.as_ptr())
    }

    fn parse(client: *const FfiLocationsClient, status: u16, body: &str) -> *mut FfiLookupResult {
        let body = CString::new(body).unwrap();
        let resp = FfiHttpResponse {
            status,
            body: body.as_ptr(),
        };
        pc_parse_response(client, &resp)
    }

    fn located(lat: &str, lon: &str) -> String {
        format!(
            r#"<Response xmlns="http://schemas.microsoft.com/search/local/ws/rest/v1">
                 <ResourceSets><ResourceSet><Resources><Location><Point>
                   <Latitude>{lat}</Latitude><Longitude>{lon}</Longitude>
                 </Point></Location></Resources></ResourceSet></ResourceSets>
               </Response>"#
        )
    }

    #[test]
    fn client_new_and_free() {
        let client = new_client();
        assert!(!client.is_null());
        pc_client_free(client);
    }

    #[test]
    fn client_new_null_credential_returns_null() {
        let client = pc_client_new(std::ptr::null(), std::ptr::null());
        assert!(client.is_null());
    }

    #[test]
    fn client_new_short_credential_returns_null() {
        let key = CString::new("short").unwrap();
        let client = pc_client_new(key.as_ptr(), std::ptr::null());
        assert!(client.is_null());
    }

    #[test]
    fn client_new_null_endpoint_uses_default() {
        let key = CString::new(KEY).unwrap();
        let client = pc_client_new(key.as_ptr(), std::ptr::null());
        assert!(!client.is_null());

        let template = pc_request_uri_template(client);
        let text = unsafe { CStr::from_ptr(template) }.to_str().unwrap();
        assert!(text.starts_with("https://dev.virtualearth.net/REST/v1/Locations?CountryRegion=UK"));

        pc_free_string(template);
        pc_client_free(client);
    }

    #[test]
    fn client_free_null_is_safe() {
        pc_client_free(std::ptr::null_mut());
    }

    #[test]
    fn build_request_returns_locations_url() {
        let client = new_client();
        let code = CString::new("SW1A 1AA").unwrap();
        let req = pc_build_request(client, code.as_ptr());
        assert!(!req.is_null());

        let req_ref = unsafe { &*req };
        let url = unsafe { CStr::from_ptr(req_ref.url) }.to_str().unwrap();
        assert_eq!(
            url,
            format!(
                "http://localhost:3000/REST/v1/Locations?CountryRegion=UK&output=xml&key={KEY}&postalCode=SW1A1AA"
            )
        );
        assert_eq!(req_ref.headers_len, 1);
        let header = unsafe { &*req_ref.headers };
        assert_eq!(unsafe { CStr::from_ptr(header.key) }.to_str().unwrap(), "accept");
        assert_eq!(
            unsafe { CStr::from_ptr(header.value) }.to_str().unwrap(),
            "application/xml"
        );

        pc_free_request(req);
        pc_client_free(client);
    }

    #[test]
    fn build_request_invalid_postal_code_returns_null() {
        let client = new_client();
        for raw in ["", "AB1", "    "] {
            let code = CString::new(raw).unwrap();
            assert!(pc_build_request(client, code.as_ptr()).is_null(), "{raw:?}");
        }
        pc_client_free(client);
    }

    #[test]
    fn build_request_null_args_return_null() {
        let client = new_client();
        let code = CString::new("SW1A 1AA").unwrap();
        assert!(pc_build_request(std::ptr::null(), code.as_ptr()).is_null());
        assert!(pc_build_request(client, std::ptr::null()).is_null());
        pc_client_free(client);
    }

    #[test]
    fn parse_found() {
        let client = new_client();
        let result = parse(client, 200, &located("51.5010", "-0.1416"));
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert!(r.error_message.is_null());
        assert_eq!(r.status, FfiLookupStatus::Found);
        assert_eq!(r.latitude, 51.501);
        assert_eq!(r.longitude, -0.1416);
        pc_free_result(result);
        pc_client_free(client);
    }

    #[test]
    fn parse_not_found() {
        let client = new_client();
        let result = parse(
            client,
            200,
            "<Response><ResourceSets><ResourceSet><Resources/></ResourceSet></ResourceSets></Response>",
        );
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.status, FfiLookupStatus::NotFound);
        assert_eq!(r.latitude, 0.0);
        pc_free_result(result);
        pc_client_free(client);
    }

    #[test]
    fn parse_at_origin() {
        let client = new_client();
        let result = parse(client, 200, &located("0", "0"));
        let r = unsafe { &*result };
        assert_eq!(r.status, FfiLookupStatus::AtOrigin);
        pc_free_result(result);
        pc_client_free(client);
    }

    #[test]
    fn parse_unauthorized() {
        let client = new_client();
        let result = parse(client, 401, "<Response/>");
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Unauthorized);
        assert_eq!(r.http_status, 401);
        assert_eq!(r.status, FfiLookupStatus::Failed);
        assert!(!r.error_message.is_null());
        pc_free_result(result);
        pc_client_free(client);
    }

    #[test]
    fn parse_http_error_keeps_status() {
        let client = new_client();
        let result = parse(client, 503, "unavailable");
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Http);
        assert_eq!(r.http_status, 503);
        let msg = unsafe { CStr::from_ptr(r.error_message) }.to_str().unwrap();
        assert!(msg.contains("503"));
        pc_free_result(result);
        pc_client_free(client);
    }

    #[test]
    fn parse_malformed_xml() {
        let client = new_client();
        let result = parse(client, 200, "<Response><ResourceSets>");
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Xml);
        pc_free_result(result);
        pc_client_free(client);
    }

    #[test]
    fn parse_invalid_number() {
        let client = new_client();
        let result = parse(client, 200, &located("north", "0"));
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::InvalidNumber);
        pc_free_result(result);
        pc_client_free(client);
    }

    #[test]
    fn parse_null_body_is_empty_document() {
        let client = new_client();
        let resp = FfiHttpResponse {
            status: 200,
            body: std::ptr::null(),
        };
        let result = pc_parse_response(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Xml);
        pc_free_result(result);
        pc_client_free(client);
    }

    #[test]
    fn parse_null_client_returns_null_arg() {
        let resp = FfiHttpResponse {
            status: 200,
            body: std::ptr::null(),
        };
        let result = pc_parse_response(std::ptr::null(), &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);
        pc_free_result(result);
    }

    #[test]
    fn parse_null_response_returns_null_arg() {
        let client = new_client();
        let result = pc_parse_response(client, std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);
        pc_free_result(result);
        pc_client_free(client);
    }

    #[test]
    fn free_request_null_is_safe() {
        pc_free_request(std::ptr::null_mut());
    }

    #[test]
    fn free_result_null_is_safe() {
        pc_free_result(std::ptr::null_mut());
    }

    #[test]
    fn free_string_null_is_safe() {
        pc_free_string(std::ptr::null_mut());
    }
}
