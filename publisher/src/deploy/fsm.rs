//! Finite State Machine for a submitted deployment request

use serde::{Deserialize, Serialize};
use ucd_models::RequestStatus;

const FAULTED: &str = "FAULTED";

/// Deployment request state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    /// Submitted, no status observed yet
    Requested,

    /// Server reports the process as still executing
    Running,

    /// Finished with a success result
    Succeeded,

    /// Finished with a fault
    Faulted,

    /// The process never started
    FailedToStart,

    /// Finished with some other result (e.g. canceled, approval rejected)
    Completed(String),
}

impl RequestState {
    /// No further polling needed
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestState::Requested | RequestState::Running)
    }

    /// Terminal state reported back as a process failure
    pub fn is_failure(&self) -> bool {
        matches!(self, RequestState::Faulted | RequestState::FailedToStart)
    }

    fn from_result(result: &str) -> Self {
        let normalized = result.trim();
        if normalized.eq_ignore_ascii_case("succeeded") {
            RequestState::Succeeded
        } else if normalized.eq_ignore_ascii_case("faulted") {
            RequestState::Faulted
        } else if normalized.eq_ignore_ascii_case("failed to start") {
            RequestState::FailedToStart
        } else {
            RequestState::Completed(normalized.to_string())
        }
    }
}

/// Request event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestEvent {
    /// Status poll found the process still executing
    Running,

    /// Status poll found a terminal result
    Finished(String),
}

impl RequestEvent {
    /// Interpret a status response.
    ///
    /// A `NONE` result never finishes a request. A response without a status
    /// carries no information yet and keeps the request running unless it
    /// names a result. A `closed` status, or a `faulted` status or result,
    /// finishes with the reported result, falling back to `FAULTED` when the
    /// server sent none.
    pub fn from_status(status: &RequestStatus) -> Self {
        let state = status.status.as_deref().map(str::trim).unwrap_or_default();
        let result = status.result.as_deref().map(str::trim).unwrap_or_default();

        if result.eq_ignore_ascii_case("none") {
            return RequestEvent::Running;
        }

        let finished = state.eq_ignore_ascii_case("closed")
            || state.eq_ignore_ascii_case("faulted")
            || result.eq_ignore_ascii_case("faulted")
            || (state.is_empty() && !result.is_empty());

        if !finished {
            return RequestEvent::Running;
        }

        if result.is_empty() {
            RequestEvent::Finished(FAULTED.to_string())
        } else {
            RequestEvent::Finished(result.to_string())
        }
    }
}

/// Deployment request FSM
#[derive(Debug, Clone)]
pub struct RequestFsm {
    state: RequestState,
    result: Option<String>,
    polls: u32,
}

impl RequestFsm {
    /// Create a new FSM in requested state
    pub fn new() -> Self {
        Self {
            state: RequestState::Requested,
            result: None,
            polls: 0,
        }
    }

    /// Get current state
    pub fn state(&self) -> &RequestState {
        &self.state
    }

    /// Terminal result exactly as the server reported it
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Number of status events processed
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: RequestEvent) -> Result<(), String> {
        let new_state = match (&self.state, &event) {
            (RequestState::Requested | RequestState::Running, RequestEvent::Running) => {
                RequestState::Running
            }
            (RequestState::Requested | RequestState::Running, RequestEvent::Finished(result)) => {
                self.result = Some(result.clone());
                RequestState::from_result(result)
            }

            // Invalid transitions
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.polls += 1;
        self.state = new_state;
        Ok(())
    }
}

impl Default for RequestFsm {
    fn default() -> Self {
        Self::new()
    }
}
