//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! enums with explicit discriminants. Conversion functions live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use postcode_core::{GeocodeError, HttpRequest, LookupOutcome};

/// Opaque handle to a `LocationsClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiLocationsClient {
    pub(crate) inner: postcode_core::LocationsClient,
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A `GET` request described as C-compatible plain data.
///
/// Built by `pc_build_request`. The C caller executes the request and passes
/// the response back through `pc_parse_response`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let url = CString::new(req.url).unwrap().into_raw();

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Vec<FfiHeader> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: CString::new(k).unwrap().into_raw(),
                    value: CString::new(v).unwrap().into_raw(),
                })
                .collect();
            Box::into_raw(ffi_headers.into_boxed_slice()) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            url,
            headers,
            headers_len,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing the request,
/// then passes a pointer to `pc_parse_response`. The FFI layer reads but
/// does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiLookupResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Unauthorized = 1,
    Http = 2,
    Xml = 3,
    MissingElement = 4,
    InvalidNumber = 5,
    Panic = 6,
    NullArg = 7,
    Other = 8,
}

/// Which kind of lookup outcome a successful parse produced.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiLookupStatus {
    /// Parsing failed; see `error_code`.
    Failed = 0,
    Found = 1,
    AtOrigin = 2,
    NotFound = 3,
}

/// Result envelope for `pc_parse_response`.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `status`,
/// `latitude` and `longitude` describe the outcome (coordinates are `0.0`
/// unless `status` is `Found`). On failure `status` is `Failed` and
/// `error_message` is a human-readable C string.
#[repr(C)]
pub struct FfiLookupResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub status: FfiLookupStatus,
    pub latitude: f64,
    pub longitude: f64,
}

impl FfiLookupResult {
    pub(crate) fn ok(outcome: LookupOutcome) -> *mut Self {
        let status = match outcome {
            LookupOutcome::Found(_) => FfiLookupStatus::Found,
            LookupOutcome::AtOrigin => FfiLookupStatus::AtOrigin,
            LookupOutcome::NotFound => FfiLookupStatus::NotFound,
        };
        let coordinate = outcome.coordinate();
        Box::into_raw(Box::new(FfiLookupResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 200,
            status,
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        }))
    }

    /// Build an error result from a `GeocodeError`.
    pub(crate) fn from_error(err: GeocodeError) -> *mut Self {
        let (error_code, http_status) = match &err {
            GeocodeError::Unauthorized => (FfiErrorCode::Unauthorized, 401u16),
            GeocodeError::HttpError { status, .. } => (FfiErrorCode::Http, *status),
            GeocodeError::Xml(_) => (FfiErrorCode::Xml, 200),
            GeocodeError::MissingElement(_) => (FfiErrorCode::MissingElement, 200),
            GeocodeError::InvalidNumber { .. } => (FfiErrorCode::InvalidNumber, 200),
            _ => (FfiErrorCode::Other, 0),
        };
        Self::failed(error_code, http_status, &err.to_string())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failed(FfiErrorCode::NullArg, 0, &format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failed(FfiErrorCode::Panic, 0, msg)
    }

    fn failed(error_code: FfiErrorCode, http_status: u16, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiLookupResult {
            error_code,
            error_message: CString::new(msg).unwrap_or_default().into_raw(),
            http_status,
            status: FfiLookupStatus::Failed,
            latitude: 0.0,
            longitude: 0.0,
        }))
    }
}
