//! Booking status transitions.
//!
//! | From     | To        | Allowed actor    |
//! |----------|-----------|------------------|
//! | pending  | accepted  | owner            |
//! | pending  | rejected  | owner            |
//! | accepted | cancelled | owner or renter  |
//! | accepted | completed | owner            |
//!
//! Every other pair is rejected. [`transition`] only decides; timestamps
//! and persistence belong to the booking service.

use std::fmt;

use serde::Serialize;

use super::booking::{ActorRole, BookingStatus};
use crate::error::GatewayError;

/// Why a transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionRejection {
    /// The booking is already rejected, cancelled or completed.
    TerminalState,
    /// The edge does not exist in the transition table.
    NoSuchTransition,
    /// The edge exists but this actor role may not trigger it.
    RoleNotPermitted,
}

impl TransitionRejection {
    /// Returns the stable snake_case reason code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TerminalState => "terminal_state",
            Self::NoSuchTransition => "no_such_transition",
            Self::RoleNotPermitted => "role_not_permitted",
        }
    }

    /// Returns a message suitable for end users.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::TerminalState => "This booking can no longer be modified",
            Self::NoSuchTransition => "This booking cannot be changed that way right now",
            Self::RoleNotPermitted => "You are not allowed to make this change",
        }
    }
}

impl fmt::Display for TransitionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles allowed to move a booking from `from` to `to`, or `None` if the
/// edge is not in the table.
const fn allowed_roles(from: BookingStatus, to: BookingStatus) -> Option<&'static [ActorRole]> {
    use BookingStatus::{Accepted, Cancelled, Completed, Pending, Rejected};
    match (from, to) {
        (Pending, Accepted | Rejected) | (Accepted, Completed) => Some(&[ActorRole::Owner]),
        (Accepted, Cancelled) => Some(&[ActorRole::Owner, ActorRole::Renter]),
        _ => None,
    }
}

/// Decides whether `role` may move a booking from `current` to `requested`.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidTransition`] with reason
/// [`TransitionRejection::TerminalState`] if `current` is terminal,
/// [`TransitionRejection::NoSuchTransition`] if the edge does not exist,
/// or [`TransitionRejection::RoleNotPermitted`] if `role` may not take it.
pub fn transition(
    current: BookingStatus,
    requested: BookingStatus,
    role: ActorRole,
) -> Result<BookingStatus, GatewayError> {
    let reject = |reason| GatewayError::InvalidTransition {
        from: current,
        to: requested,
        reason,
    };

    if current.is_terminal() {
        return Err(reject(TransitionRejection::TerminalState));
    }
    let roles = allowed_roles(current, requested)
        .ok_or_else(|| reject(TransitionRejection::NoSuchTransition))?;
    if !roles.contains(&role) {
        return Err(reject(TransitionRejection::RoleNotPermitted));
    }
    Ok(requested)
}
