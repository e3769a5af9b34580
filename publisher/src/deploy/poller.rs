//! Deployment request status poller

use std::future::Future;
use std::time::{Duration, Instant};

use futures::future::{self, BoxFuture, FutureExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::deploy::fsm::{RequestEvent, RequestFsm, RequestState};
use crate::errors::PublisherError;
use crate::http::api::DeployApi;

/// Shutdown future that stops a poll loop while it waits
pub type CancelSignal = BoxFuture<'static, ()>;

/// Poller options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    /// Delay between status checks
    pub interval: Duration,

    /// Give up once this much time has passed since the first check
    pub max_wait: Option<Duration>,

    /// Give up after this many status checks
    pub max_attempts: Option<u32>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_wait: None,
            max_attempts: None,
        }
    }
}

/// Terminal state reached by a poll loop
#[derive(Debug, Clone)]
pub struct PollReport {
    pub state: RequestState,
    /// Result string as reported by the server
    pub result: String,
    pub polls: u32,
    pub elapsed: Duration,
}

/// A signal that never fires
pub fn no_cancel() -> CancelSignal {
    future::pending().boxed()
}

/// Poll a request until it reaches a terminal state.
///
/// Checks first, then sleeps `interval` between checks. A configured bound
/// yields `PollTimeout`; the cancel signal firing during a sleep yields
/// `Cancelled`. Transport errors abort immediately.
pub async fn poll_until_terminal<S, F>(
    api: &dyn DeployApi,
    request_id: &Uuid,
    options: &PollOptions,
    sleep_fn: S,
    mut cancel: CancelSignal,
) -> Result<PollReport, PublisherError>
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    let started = Instant::now();
    let mut fsm = RequestFsm::new();

    loop {
        let status = api.request_status(request_id).await?;
        let event = RequestEvent::from_status(&status);
        debug!(
            "Request {} status={:?} result={:?}",
            request_id, status.status, status.result
        );

        fsm.process(event).map_err(PublisherError::Internal)?;

        if fsm.state().is_terminal() {
            let elapsed = started.elapsed();
            let result = fsm.result().unwrap_or_default().to_string();
            info!(
                "Request {} finished with {} after {} checks",
                request_id,
                result,
                fsm.polls()
            );
            return Ok(PollReport {
                state: fsm.state().clone(),
                result,
                polls: fsm.polls(),
                elapsed,
            });
        }

        let attempts_exhausted = options
            .max_attempts
            .is_some_and(|max| fsm.polls() >= max);
        let wait_exhausted = options
            .max_wait
            .is_some_and(|max| started.elapsed() >= max);
        if attempts_exhausted || wait_exhausted {
            warn!(
                "Giving up on request {} after {} checks",
                request_id,
                fsm.polls()
            );
            return Err(PublisherError::PollTimeout {
                request_id: request_id.to_string(),
                waited: started.elapsed(),
            });
        }

        tokio::select! {
            _ = &mut cancel => {
                info!("Stopped waiting for request {}", request_id);
                return Err(PublisherError::Cancelled {
                    request_id: request_id.to_string(),
                });
            }
            _ = sleep_fn(options.interval) => {}
        }
    }
}
