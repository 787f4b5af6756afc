//! Blocking executors for `HttpRequest` values.
//!
//! `Geocoder` runs its transport on a worker thread, so implementations may
//! block. Closures with the right signature implement `Transport`, which is
//! how tests substitute canned responses.

use ureq::Agent;

use crate::config::GeocoderConfig;
use crate::error::GeocodeError;
use crate::http::{HttpRequest, HttpResponse};

pub trait Transport: Send + Sync + 'static {
    /// Execute `request` and return the response, whatever its status.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, GeocodeError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, GeocodeError> + Send + Sync + 'static,
{
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, GeocodeError> {
        self(request)
    }
}

/// `Transport` backed by a `ureq` agent.
///
/// Status-code-as-error is disabled so 4xx/5xx responses come back as data
/// and `LocationsClient` decides what they mean.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(config: &GeocoderConfig) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout())
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&GeocoderConfig::default())
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, GeocodeError> {
        let mut builder = self.agent.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        let mut response = builder
            .call()
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
