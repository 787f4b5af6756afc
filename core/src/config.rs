//! Settings shared by `LocationsClient`, `UreqTransport` and `Geocoder`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Public Bing Maps REST host.
pub const DEFAULT_ENDPOINT: &str = "https://dev.virtualearth.net";

/// Geocoder settings. Every field has a default, so an empty document
/// deserializes to `GeocoderConfig::default()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Scheme and host of the locations service, without a trailing path.
    pub endpoint: String,
    /// Overall request timeout. `None` waits for as long as the socket does.
    pub timeout_secs: Option<u64>,
}

impl GeocoderConfig {
    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: GeocoderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, GeocoderConfig::default());
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.timeout().is_none());
    }

    #[test]
    fn timeout_is_read_in_seconds() {
        let config: GeocoderConfig =
            serde_json::from_str(r#"{"endpoint":"http://127.0.0.1:3000","timeout_secs":15}"#)
                .unwrap();
        assert_eq!(config.endpoint, "http://127.0.0.1:3000");
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
    }
}
