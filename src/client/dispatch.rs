//! One-shot request dispatch.
//!
//! A [`Dispatcher`] wraps a finished [`RequestDescriptor`]. Registering a
//! `done` or `fail` callback starts the request; the GET is issued at most
//! once per dispatcher and at most one callback is ever invoked.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use reqwest::Client;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;

use super::request::{Origin, RequestDescriptor};
use crate::error::TransportError;

type Callback = Box<dyn FnOnce(String) + Send + 'static>;

/// How a dispatched request settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Raw response body, untouched.
    Success(String),
    Failure(TransportError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

#[derive(Default)]
struct Slots {
    done: Option<Callback>,
    fail: Option<Callback>,
    delivered: bool,
}

struct Shared {
    client: Client,
    origin: Origin,
    descriptor: RequestDescriptor,
    performing: AtomicBool,
    result: OnceLock<Outcome>,
    slots: Mutex<Slots>,
    outcome: watch::Sender<Option<Outcome>>,
}

/// Dispatch stage of a request builder.
///
/// Clones share the same request.
#[derive(Clone)]
pub struct Dispatcher {
    shared: Arc<Shared>,
}

impl Dispatcher {
    pub(crate) fn new(client: Client, origin: Origin, descriptor: RequestDescriptor) -> Self {
        let (outcome, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                client,
                origin,
                descriptor,
                performing: AtomicBool::new(false),
                result: OnceLock::new(),
                slots: Mutex::new(Slots::default()),
                outcome,
            }),
        }
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.shared.descriptor
    }

    /// Absolute URL this dispatcher requests.
    pub fn url(&self) -> Result<Url, url::ParseError> {
        self.shared.descriptor.url(&self.shared.origin)
    }

    /// Register the success callback and start the request if it is not running yet.
    ///
    /// The callback receives the raw response body. Registering again replaces
    /// the previous callback until one of them has fired.
    pub fn done<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(String) + Send + 'static,
    {
        lock(&self.shared.slots).done = Some(Box::new(callback));
        self.perform();
        self.shared.deliver();
        self
    }

    /// Register the failure callback and start the request if it is not running yet.
    ///
    /// The callback receives `<error>[<status>]`.
    pub fn fail<F>(&self, callback: F) -> &Self
    where
        F: FnOnce(String) + Send + 'static,
    {
        lock(&self.shared.slots).fail = Some(Box::new(callback));
        self.perform();
        self.shared.deliver();
        self
    }

    pub fn is_dispatched(&self) -> bool {
        self.shared.performing.load(Ordering::Acquire)
    }

    pub fn is_settled(&self) -> bool {
        self.shared.result.get().is_some()
    }

    /// Wait for the request to settle without triggering it.
    ///
    /// Returns `None` if neither callback was ever registered.
    pub async fn outcome(&self) -> Option<Outcome> {
        if !self.is_dispatched() {
            return None;
        }
        let mut rx = self.shared.outcome.subscribe();
        rx.wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|outcome| outcome.clone())
    }

    fn perform(&self) {
        if self.shared.performing.swap(true, Ordering::AcqRel) {
            return;
        }

        let shared = Arc::clone(&self.shared);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let outcome = shared.fetch().await;
                    shared.settle(outcome);
                });
            }
            Err(_) => {
                warn!("Request dispatched outside of a Tokio runtime");
                shared.settle(Outcome::Failure(TransportError::new(
                    "no async runtime available",
                    0,
                )));
            }
        }
    }
}

impl Shared {
    async fn fetch(&self) -> Outcome {
        let url = match self.descriptor.url(&self.origin) {
            Ok(url) => url,
            Err(e) => {
                return Outcome::Failure(TransportError::new(
                    format!("invalid request URL: {}", e),
                    0,
                ))
            }
        };

        info!("Performing request: {}", url);
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                let status = e.status().map(|s| s.as_u16()).unwrap_or(0);
                return Outcome::Failure(TransportError::new(e.to_string(), status));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("error");
            return Outcome::Failure(TransportError::new(reason, status.as_u16()));
        }

        match response.text().await {
            Ok(body) => Outcome::Success(body),
            Err(e) => Outcome::Failure(TransportError::new(e.to_string(), status.as_u16())),
        }
    }

    fn settle(&self, outcome: Outcome) {
        match &outcome {
            Outcome::Success(body) => {
                debug!("{} request succeeded ({} bytes)", self.descriptor.mode(), body.len())
            }
            Outcome::Failure(err) => debug!("{} request failed: {}", self.descriptor.mode(), err),
        }

        if self.result.set(outcome.clone()).is_err() {
            debug!("Ignoring repeated settlement of {} request", self.descriptor.mode());
            return;
        }
        // Observers must not depend on callbacks returning.
        self.outcome.send_replace(Some(outcome));
        self.deliver();
    }

    /// Hand the settled outcome to its callback, if registered and nothing has fired yet.
    fn deliver(&self) {
        let Some(outcome) = self.result.get() else {
            return;
        };

        let (callback, argument) = {
            let mut slots = lock(&self.slots);
            if slots.delivered {
                return;
            }
            let (slot, argument) = match outcome {
                Outcome::Success(body) => (&mut slots.done, body.clone()),
                Outcome::Failure(err) => (&mut slots.fail, err.to_string()),
            };
            let Some(callback) = slot.take() else {
                return;
            };
            slots.delivered = true;
            (callback, argument)
        };

        callback(argument);
    }
}

fn lock(slots: &Mutex<Slots>) -> MutexGuard<'_, Slots> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}
