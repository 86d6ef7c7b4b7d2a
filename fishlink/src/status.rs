//! Request fulfillment lifecycle.
//!
//! A request moves along a strict forward-only chain:
//!
//! `Requested → Accepted → Preparing → Ready → Completed`
//!
//! Every state has exactly one successor except [`RequestStatus::Completed`],
//! which is terminal. There is no skipping, branching, reverse move or
//! self-transition. The chain is encoded once, in [`RequestStatus::successor`];
//! everything else (legality checks, UI "next action" hints) derives from it.
//!
//! The five literal names are also the durable storage format and are the
//! only values accepted by [`FromStr`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Status of a request within the fulfillment chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Placed by the restaurant, not yet seen by the farm.
    Requested,
    /// Farm agreed to fulfil.
    Accepted,
    /// Farm is preparing the fish.
    Preparing,
    /// Ready for delivery or pickup.
    Ready,
    /// Handed over. Terminal.
    Completed,
}

impl RequestStatus {
    /// All states in chain order.
    pub const ALL: [RequestStatus; 5] = [
        RequestStatus::Requested,
        RequestStatus::Accepted,
        RequestStatus::Preparing,
        RequestStatus::Ready,
        RequestStatus::Completed,
    ];

    /// Successor table: the single legal next state, `None` for terminal.
    pub const fn successor(self) -> Option<RequestStatus> {
        match self {
            RequestStatus::Requested => Some(RequestStatus::Accepted),
            RequestStatus::Accepted => Some(RequestStatus::Preparing),
            RequestStatus::Preparing => Some(RequestStatus::Ready),
            RequestStatus::Ready => Some(RequestStatus::Completed),
            RequestStatus::Completed => None,
        }
    }

    /// `Completed`: no further moves.
    pub const fn is_terminal(self) -> bool {
        self.successor().is_none()
    }

    /// Storage/display literal.
    pub const fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Requested => "Requested",
            RequestStatus::Accepted => "Accepted",
            RequestStatus::Preparing => "Preparing",
            RequestStatus::Ready => "Ready",
            RequestStatus::Completed => "Completed",
        }
    }

    /// Validate a move to `target`, returning `target` on success.
    pub fn transition(self, target: RequestStatus) -> Result<RequestStatus, InvalidTransition> {
        match self.successor() {
            Some(next) if next == target => Ok(target),
            _ => Err(InvalidTransition {
                from: self,
                to: target,
            }),
        }
    }
}

/// Free-function form of [`RequestStatus::transition`].
pub fn transition(
    current: RequestStatus,
    target: RequestStatus,
) -> Result<RequestStatus, InvalidTransition> {
    current.transition(target)
}

/// A status change outside the single legal successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid status transition: {from} -> {to}")]
pub struct InvalidTransition {
    /// Status the request was in.
    pub from: RequestStatus,
    /// Status that was asked for.
    pub to: RequestStatus,
}

/// Text that is not one of the five status literals.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown request status: {0:?}")]
pub struct UnknownStatus(pub String);

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
