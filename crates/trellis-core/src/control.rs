//! Run/pause/step/cancel control over an instrumented search.
//!
//! The controller owns the driver outright. Between deliveries the search
//! is suspended inside the driver's frame stack, so control operations are
//! always invoked at a yield point by construction: resume releases the
//! same in-progress state, never a restart, and there is nothing to lock.

use crate::driver::SearchDriver;
use crate::event::{Outcome, TraceEvent};

/// Controller lifecycle. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Idle,
    Running,
    Paused,
    Stopped,
}

/// What a delivery attempt produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// The next trace event.
    Event(TraceEvent),
    /// Not running; nothing was released and the search did not advance.
    Suspended,
    /// The search ran to its terminal event earlier; its outcome.
    Finished(Outcome),
    /// The session was cancelled; no further events will ever arrive.
    Cancelled,
}

/// Wraps one search session with externally steppable delivery.
///
/// Exactly one controller exists per driver (the driver moves in), so at
/// most one controller/search pair can ever be active against a model.
pub struct StepController {
    driver: Option<SearchDriver>,
    state: ControlState,
    outcome: Option<Outcome>,
}

impl StepController {
    /// Wrap a search session. The controller starts `Idle`; no events flow
    /// until [`run`](Self::run) or [`step`](Self::step).
    pub fn new(driver: SearchDriver) -> Self {
        Self {
            driver: Some(driver),
            state: ControlState::Idle,
            outcome: None,
        }
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    /// Outcome of the session once it has finished or been cancelled.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Idle/Paused -> Running. No effect once stopped.
    pub fn run(&mut self) {
        if matches!(self.state, ControlState::Idle | ControlState::Paused) {
            self.state = ControlState::Running;
        }
    }

    /// Running -> Paused; delivery suspends after the current event.
    pub fn pause(&mut self) {
        if self.state == ControlState::Running {
            self.state = ControlState::Paused;
        }
    }

    /// While paused (or still idle), release exactly one pending event and
    /// re-suspend. Running or stopped controllers release nothing beyond
    /// what [`poll`](Self::poll) already delivers.
    pub fn step(&mut self) -> Delivery {
        match self.state {
            ControlState::Idle | ControlState::Paused => {
                self.state = ControlState::Paused;
                self.advance()
            }
            ControlState::Running => Delivery::Suspended,
            ControlState::Stopped => self.stopped_delivery(),
        }
    }

    /// Abandon the search: any state -> Stopped, session state discarded.
    /// A consumer waiting on [`poll`](Self::poll) sees [`Delivery::Cancelled`]
    /// instead of an event.
    pub fn cancel(&mut self) {
        if self.driver.take().is_some() {
            // the search had not finished on its own
            self.outcome = Some(Outcome::Cancelled);
        }
        self.state = ControlState::Stopped;
    }

    /// Start a new session in place of the current one. An active search is
    /// cancelled (and its state discarded) before the new driver moves in;
    /// the controller comes back `Idle`.
    pub fn replace(&mut self, driver: SearchDriver) {
        self.cancel();
        self.driver = Some(driver);
        self.state = ControlState::Idle;
        self.outcome = None;
    }

    /// Deliver the next event while running. Paused and idle controllers
    /// report [`Delivery::Suspended`] without advancing the search.
    pub fn poll(&mut self) -> Delivery {
        match self.state {
            ControlState::Running => self.advance(),
            ControlState::Idle | ControlState::Paused => Delivery::Suspended,
            ControlState::Stopped => self.stopped_delivery(),
        }
    }

    /// Pull one event from the driver, retiring the session on its terminal
    /// event.
    fn advance(&mut self) -> Delivery {
        let driver = match self.driver.as_mut() {
            Some(d) => d,
            None => return self.stopped_delivery(),
        };
        match driver.next() {
            Some(event) => {
                if event.is_terminal() {
                    self.outcome = driver.outcome();
                    self.driver = None;
                    self.state = ControlState::Stopped;
                }
                Delivery::Event(event)
            }
            None => {
                // a driver only runs dry after its terminal event, which
                // already retired the session above
                self.driver = None;
                self.state = ControlState::Stopped;
                self.stopped_delivery()
            }
        }
    }

    fn stopped_delivery(&self) -> Delivery {
        match self.outcome {
            Some(Outcome::Cancelled) | None => Delivery::Cancelled,
            Some(outcome) => Delivery::Finished(outcome),
        }
    }
}
