//! Keeping only the newest result when validations overlap
//!
//! A host that validates on every edit may have several calls in flight. Each
//! call takes a [`Ticket`] before it starts; when it finishes, its result is
//! offered to a [`ResultGate`], which refuses anything older than what it
//! already holds.

use crate::diagnostics::CombinedResult;
use crate::engine::Validator;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Position of a call in issue order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// What happened to an offered result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Accepted,
    /// A result from a later ticket is already held
    Stale { held: Ticket },
}

/// Holds the result of the most recently issued call that has completed
#[derive(Debug)]
pub struct ResultGate<T> {
    issued: AtomicU64,
    latest: Mutex<Option<(Ticket, T)>>,
}

impl<T> Default for ResultGate<T> {
    fn default() -> Self {
        Self {
            issued: AtomicU64::new(0),
            latest: Mutex::new(None),
        }
    }
}

impl<T: Clone> ResultGate<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next ticket; tickets strictly increase
    pub fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Offer a finished result, keeping it only if nothing newer is held
    pub fn offer(&self, ticket: Ticket, value: T) -> Offer {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        match latest.as_ref() {
            Some((held, _)) if *held >= ticket => {
                debug!(
                    "Discarding result #{} (holding #{})",
                    ticket.sequence(),
                    held.sequence()
                );
                Offer::Stale { held: *held }
            }
            _ => {
                *latest = Some((ticket, value));
                Offer::Accepted
            }
        }
    }

    /// The newest accepted result
    pub fn latest(&self) -> Option<T> {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest.as_ref().map(|(_, value)| value.clone())
    }

    /// Ticket of the newest accepted result
    pub fn latest_ticket(&self) -> Option<Ticket> {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest.as_ref().map(|(ticket, _)| *ticket)
    }
}

/// A shared validator plus a gate for its results
pub struct ValidationSession {
    validator: Arc<Validator>,
    gate: ResultGate<CombinedResult>,
}

impl ValidationSession {
    pub fn new(validator: Arc<Validator>) -> Self {
        Self {
            validator,
            gate: ResultGate::new(),
        }
    }

    pub fn validator(&self) -> &Arc<Validator> {
        &self.validator
    }

    /// Reserve a ticket for an edit about to be validated
    pub fn begin(&self) -> Ticket {
        self.gate.issue()
    }

    /// Validate `text` for a previously reserved ticket
    pub fn run(&self, ticket: Ticket, text: &str) -> Offer {
        let result = self.validator.validate(text);
        self.gate.offer(ticket, result)
    }

    /// Reserve a ticket and validate immediately
    pub fn submit(&self, text: &str) -> Offer {
        let ticket = self.begin();
        self.run(ticket, text)
    }

    /// Result for the newest completed edit
    pub fn latest(&self) -> Option<CombinedResult> {
        self.gate.latest()
    }
}
