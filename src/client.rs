//! HTTP client and single-flight request lifecycle.
//!
//! Report queries can be expensive on the backend, so each view holds exactly
//! one outstanding request: starting a new one aborts the previous in-flight
//! request, and the user can abort manually (Ctrl+C in the CLI). The abort
//! primitive is re-armed on every start so a cancelled lifecycle does not
//! poison the next request.

use futures::future::{AbortHandle, AbortRegistration, Abortable};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::error::{Error, Result};
use crate::report::{Report, ReportState};

const USER_AGENT: &str = concat!("sippy-readiness/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper over reqwest with the crate's user agent.
#[derive(Debug, Clone)]
pub struct Client {
    inner: reqwest::Client,
}

impl Client {
    #[must_use]
    pub fn new() -> Self {
        let inner = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .expect("build reqwest client");
        Self { inner }
    }

    /// GET a report URL and decode the JSON body.
    ///
    /// Non-200 statuses map to [`Error::Api`]; transport and decode failures
    /// map to [`Error::Http`] carrying the attempted URL.
    pub async fn get_report(&self, url: &str) -> Result<Report> {
        debug!("fetching report: {url}");
        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| Error::http(url, e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(Error::Api { status });
        }

        response
            .json::<Report>()
            .await
            .map_err(|e| Error::http(url, e.to_string()))
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the abort handle for a view's single outstanding request.
///
/// Clones share the same handle slot, so a clone given to a signal handler
/// cancels the request started by the original.
#[derive(Debug, Clone, Default)]
pub struct RequestLifecycle {
    current: Arc<Mutex<Option<AbortHandle>>>,
}

impl RequestLifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a fresh abort registration, aborting any request still in flight.
    #[must_use]
    pub fn start(&self) -> AbortRegistration {
        let (handle, registration) = AbortHandle::new_pair();
        if let Some(previous) = self.lock().replace(handle) {
            debug!("aborting previous in-flight report request");
            previous.abort();
        }
        registration
    }

    /// Abort the current request, if any. The slot is cleared so the next
    /// `start` is not pre-cancelled.
    pub fn cancel(&self) {
        if let Some(handle) = self.lock().take() {
            debug!("request cancelled");
            handle.abort();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<AbortHandle>> {
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Fetches reports with single-flight semantics and classifies the outcome.
#[derive(Debug, Clone, Default)]
pub struct ReportFetcher {
    client: Client,
    lifecycle: RequestLifecycle,
}

impl ReportFetcher {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            lifecycle: RequestLifecycle::new(),
        }
    }

    /// Handle for wiring external cancellation (e.g. a Ctrl+C handler).
    #[must_use]
    pub fn lifecycle(&self) -> RequestLifecycle {
        self.lifecycle.clone()
    }

    /// Fetch a report URL, cancelling any prior in-flight request first.
    pub async fn fetch(&self, url: &str) -> ReportState {
        let registration = self.lifecycle.start();
        let outcome = Abortable::new(self.client.get_report(url), registration).await;
        match outcome {
            Ok(result) => state_from_result(url, result),
            Err(_aborted) => ReportState::Cancelled,
        }
    }
}

/// Map a completed request to its report state. A 200 with no rows is the
/// empty outcome, not an error; cancellation is never an error.
fn state_from_result(url: &str, result: Result<Report>) -> ReportState {
    match result {
        Ok(report) if report.is_empty() => ReportState::Empty,
        Ok(report) => ReportState::Ready(report),
        Err(err) if err.is_cancelled() => ReportState::Cancelled,
        Err(err @ Error::Http { .. }) => ReportState::Failed(err.to_string()),
        Err(err) => ReportState::Failed(format!("API call failed: {url}\n{err}")),
    }
}
