//! Stateful postcode lookup with a one-shot completion.
//!
//! # Design
//! `Geocoder` validates its inputs synchronously and runs the network
//! round-trip on a dedicated worker thread. The worker records the result in
//! state shared with the `Geocoder`, calls the optional completion hook, and
//! only then settles the `PendingLookup` returned by `fetch_coordinates`.
//! Callers that await the future or react to the hook therefore always read
//! the final coordinate and flag.
//!
//! At most one lookup per instance is in flight; a second
//! `fetch_coordinates` before the first settles fails with
//! `GeocodeError::Busy`. Once settled the instance can fetch again.

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::thread;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::client::LocationsClient;
use crate::config::GeocoderConfig;
use crate::error::GeocodeError;
use crate::transport::{Transport, UreqTransport};
use crate::types::{Coordinate, Credential, LookupOutcome, PostalCode};

type CompletionHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Default)]
struct LookupState {
    in_flight: bool,
    coordinate: Coordinate,
    success: bool,
    outcome: Option<LookupOutcome>,
}

/// Converts one UK postal code at a time into a coordinate.
pub struct Geocoder {
    client: LocationsClient,
    transport: Arc<dyn Transport>,
    postal_code: Option<PostalCode>,
    hook: Option<CompletionHook>,
    state: Arc<Mutex<LookupState>>,
}

impl Geocoder {
    /// Geocoder for the public endpoint using `ureq`.
    pub fn new(credential: &str) -> Result<Self, GeocodeError> {
        Self::with_config(credential, GeocoderConfig::default())
    }

    pub fn with_config(credential: &str, config: GeocoderConfig) -> Result<Self, GeocodeError> {
        let transport = UreqTransport::new(&config);
        Self::with_transport(credential, config, transport)
    }

    pub fn with_transport(
        credential: &str,
        config: GeocoderConfig,
        transport: impl Transport,
    ) -> Result<Self, GeocodeError> {
        let credential = Credential::new(credential)?;
        Ok(Self {
            client: LocationsClient::new(credential, &config),
            transport: Arc::new(transport),
            postal_code: None,
            hook: None,
            state: Arc::default(),
        })
    }

    /// Validate and store the postal code for the next fetch.
    pub fn set_postal_code(&mut self, code: &str) -> Result<(), GeocodeError> {
        self.postal_code = Some(PostalCode::new(code)?);
        Ok(())
    }

    pub fn postal_code(&self) -> Option<&PostalCode> {
        self.postal_code.as_ref()
    }

    pub fn client(&self) -> &LocationsClient {
        &self.client
    }

    /// Register a notification that runs once after every fetch settles,
    /// whether it succeeded or not. Runs on the worker thread.
    pub fn on_complete(&mut self, hook: impl Fn() + Send + Sync + 'static) {
        self.hook = Some(Arc::new(hook));
    }

    /// Start the lookup for the stored postal code.
    ///
    /// Errors in this call are about the request itself; everything that
    /// happens on the wire is reported through the returned `PendingLookup`.
    pub fn fetch_coordinates(&self) -> Result<PendingLookup, GeocodeError> {
        let postal_code = self.postal_code.as_ref().ok_or(GeocodeError::PreconditionFailed(
            "set a postal code before fetching coordinates",
        ))?;
        let request = self.client.build_request(postal_code)?;

        {
            let mut state = lock(&self.state);
            if state.in_flight {
                return Err(GeocodeError::Busy);
            }
            state.in_flight = true;
        }

        let (sender, receiver) = oneshot::channel();
        let client = self.client.clone();
        let transport = Arc::clone(&self.transport);
        let hook = self.hook.clone();
        let state = Arc::clone(&self.state);
        let code = postal_code.clone();

        debug!(postal_code = %code, "issuing locations request");
        let spawned = thread::Builder::new()
            .name("postcode-lookup".to_string())
            .spawn(move || {
                let result = catch_unwind(AssertUnwindSafe(|| {
                    transport
                        .execute(&request)
                        .and_then(|response| client.parse_response(response))
                }))
                .unwrap_or(Err(GeocodeError::Canceled));

                settle(&state, &code, &result);
                if let Some(hook) = hook {
                    hook();
                }
                let _ = sender.send(result);
            });

        if let Err(e) = spawned {
            lock(&self.state).in_flight = false;
            return Err(GeocodeError::Transport(format!(
                "failed to start lookup worker: {e}"
            )));
        }
        Ok(PendingLookup { receiver })
    }

    /// Coordinate from the last settled lookup, `(0, 0)` before any.
    pub fn coordinate(&self) -> Coordinate {
        lock(&self.state).coordinate
    }

    /// True when the last settled lookup found a coordinate other than `(0, 0)`.
    pub fn succeeded(&self) -> bool {
        lock(&self.state).success
    }

    /// Outcome of the last settled lookup; `None` before the first one or
    /// when it failed with an error.
    pub fn outcome(&self) -> Option<LookupOutcome> {
        lock(&self.state).outcome
    }

    pub fn is_in_flight(&self) -> bool {
        lock(&self.state).in_flight
    }
}

impl std::fmt::Debug for Geocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Geocoder")
            .field("client", &self.client)
            .field("postal_code", &self.postal_code)
            .field("state", &*lock(&self.state))
            .finish_non_exhaustive()
    }
}

fn lock(state: &Mutex<LookupState>) -> MutexGuard<'_, LookupState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn settle(
    state: &Mutex<LookupState>,
    postal_code: &PostalCode,
    result: &Result<LookupOutcome, GeocodeError>,
) {
    let mut state = lock(state);
    state.in_flight = false;
    match result {
        Ok(outcome) => {
            info!(%postal_code, ?outcome, "lookup completed");
            state.coordinate = outcome.coordinate();
            state.success = outcome.is_success();
            state.outcome = Some(*outcome);
        }
        Err(e) => {
            warn!(%postal_code, error = %e, "lookup failed");
            state.success = false;
            state.outcome = None;
        }
    }
}

/// Completion of a lookup started by `Geocoder::fetch_coordinates`.
///
/// Await it from async code or call `wait` from a plain thread.
#[derive(Debug)]
#[must_use = "the lookup result is only delivered through this value"]
pub struct PendingLookup {
    receiver: oneshot::Receiver<Result<LookupOutcome, GeocodeError>>,
}

impl PendingLookup {
    /// Block the current thread until the lookup settles.
    ///
    /// # Panics
    /// When called from within an asynchronous runtime; `.await` instead.
    pub fn wait(self) -> Result<LookupOutcome, GeocodeError> {
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(GeocodeError::Canceled))
    }
}

impl Future for PendingLookup {
    type Output = Result<LookupOutcome, GeocodeError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(GeocodeError::Canceled)))
    }
}
