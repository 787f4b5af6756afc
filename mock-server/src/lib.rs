use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use quick_xml::escape::escape;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::debug;

const NAMESPACES: &str = concat!(
    r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
    r#"xmlns:xsd="http://www.w3.org/2001/XMLSchema" "#,
    r#"xmlns="http://schemas.microsoft.com/search/local/ws/rest/v1""#,
);

const KEY_LEN: usize = 64;

/// A postcode the mock knows how to resolve.
#[derive(Clone, Debug, PartialEq)]
pub struct KnownLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl KnownLocation {
    pub fn new(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            latitude,
            longitude,
        }
    }
}

/// Normalized postcode (no whitespace, upper case) to location.
pub type Locations = Arc<HashMap<String, KnownLocation>>;

#[derive(Deserialize)]
pub struct LocationsQuery {
    #[serde(rename = "CountryRegion")]
    pub country_region: Option<String>,
    pub output: Option<String>,
    pub key: Option<String>,
    #[serde(rename = "postalCode")]
    pub postal_code: Option<String>,
}

pub fn normalize(postal_code: &str) -> String {
    postal_code
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

pub fn default_locations() -> HashMap<String, KnownLocation> {
    [
        ("SW1A 1AA", "SW1A 1AA, London, London, United Kingdom", 51.5010, -0.1416),
        ("EC1A 1BB", "EC1A 1BB, London, London, United Kingdom", 51.5203, -0.0982),
        ("M1 1AE", "M1 1AE, Manchester, Greater Manchester, United Kingdom", 53.4808, -2.2426),
        ("EH1 1YZ", "EH1 1YZ, Edinburgh, Edinburgh, United Kingdom", 55.9533, -3.1883),
    ]
    .into_iter()
    .map(|(code, name, lat, lon)| (normalize(code), KnownLocation::new(name, lat, lon)))
    .collect()
}

pub fn app() -> Router {
    app_with(default_locations())
}

pub fn app_with(locations: HashMap<String, KnownLocation>) -> Router {
    let locations: Locations = Arc::new(locations);
    Router::new()
        .route("/REST/v1/Locations", get(find_by_postal_code))
        .layer(TraceLayer::new_for_http())
        .with_state(locations)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn find_by_postal_code(
    State(locations): State<Locations>,
    Query(query): Query<LocationsQuery>,
) -> Response {
    if query.key.as_deref().map(|k| k.chars().count()) != Some(KEY_LEN) {
        return xml(StatusCode::UNAUTHORIZED, unauthorized_body());
    }
    if query.output.as_deref() != Some("xml") {
        return (StatusCode::BAD_REQUEST, "only output=xml is supported").into_response();
    }
    let Some(postal_code) = query.postal_code.as_deref() else {
        return (StatusCode::BAD_REQUEST, "postalCode is required").into_response();
    };
    debug!(
        postal_code,
        country_region = query.country_region.as_deref().unwrap_or(""),
        "locations query"
    );
    let found = locations.get(&normalize(postal_code));
    xml(StatusCode::OK, locations_body(found))
}

fn xml(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/xml; charset=utf-8")], body).into_response()
}

/// A Locations response in the shape the real service returns.
pub fn locations_body(found: Option<&KnownLocation>) -> String {
    let (total, resources) = match found {
        Some(location) => (
            1,
            format!(
                "<Resources><Location>\
                   <Name>{}</Name>\
                   <Point><Latitude>{}</Latitude><Longitude>{}</Longitude></Point>\
                   <EntityType>Postcode1</EntityType>\
                   <Confidence>High</Confidence>\
                 </Location></Resources>",
                escape(location.name.as_str()),
                location.latitude,
                location.longitude
            ),
        ),
        None => (0, "<Resources />".to_string()),
    };
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <Response {NAMESPACES}>\
           <Copyright>Copyright © Mock Maps</Copyright>\
           <StatusCode>200</StatusCode>\
           <StatusDescription>OK</StatusDescription>\
           <AuthenticationResultCode>ValidCredentials</AuthenticationResultCode>\
           <ResourceSets><ResourceSet>\
             <EstimatedTotal>{total}</EstimatedTotal>\
             {resources}\
           </ResourceSet></ResourceSets>\
         </Response>"
    )
}

fn unauthorized_body() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <Response {NAMESPACES}>\
           <StatusCode>401</StatusCode>\
           <StatusDescription>Unauthorized</StatusDescription>\
           <AuthenticationResultCode>InvalidCredentials</AuthenticationResultCode>\
           <ErrorDetails><string>Access was denied.</string></ErrorDetails>\
           <ResourceSets />\
         </Response>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_removes_whitespace_and_uppercases() {
        assert_eq!(normalize(" sw1a 1aa "), "SW1A1AA");
        assert_eq!(normalize("M1\t1AE"), "M11AE");
    }

    #[test]
    fn default_locations_are_keyed_by_normalized_code() {
        let locations = default_locations();
        let palace = locations.get("SW1A1AA").unwrap();
        assert_eq!(palace.latitude, 51.5010);
        assert_eq!(palace.longitude, -0.1416);
        assert!(locations.contains_key("EH11YZ"));
    }

    #[test]
    fn found_body_contains_point() {
        let location = KnownLocation::new("Somewhere", 1.25, -2.5);
        let body = locations_body(Some(&location));
        assert!(body.contains("<Latitude>1.25</Latitude>"));
        assert!(body.contains("<Longitude>-2.5</Longitude>"));
        assert!(body.contains("<EstimatedTotal>1</EstimatedTotal>"));
    }

    #[test]
    fn found_body_escapes_location_name() {
        let location = KnownLocation::new("Fish & Chips <Ltd>", 1.0, 2.0);
        let body = locations_body(Some(&location));
        assert!(body.contains("<Name>Fish &amp; Chips &lt;Ltd&gt;</Name>"));
    }

    #[test]
    fn missing_body_has_empty_resources() {
        let body = locations_body(None);
        assert!(body.contains("<Resources />"));
        assert!(body.contains("<EstimatedTotal>0</EstimatedTotal>"));
        assert!(!body.contains("<Location>"));
    }

    #[test]
    fn query_deserializes_bing_parameter_names() {
        let query: LocationsQuery = query_from(
            "CountryRegion=UK&output=xml&key=abc&postalCode=SW1A1AA",
        );
        assert_eq!(query.country_region.as_deref(), Some("UK"));
        assert_eq!(query.output.as_deref(), Some("xml"));
        assert_eq!(query.key.as_deref(), Some("abc"));
        assert_eq!(query.postal_code.as_deref(), Some("SW1A1AA"));
    }

    fn query_from(raw: &str) -> LocationsQuery {
        let uri: axum::http::Uri = format!("/REST/v1/Locations?{raw}").parse().unwrap();
        Query::<LocationsQuery>::try_from_uri(&uri).unwrap().0
    }
}
