//! Service layer: business logic orchestration.
//!
//! [`BookingService`] owns the write path (quotes, creation, status
//! changes) and delegates arithmetic to the pricing engine and decisions
//! to the state machine. [`BookingQueries`] serves the read path.

pub mod booking_queries;
pub mod booking_service;

pub use booking_queries::BookingQueries;
pub use booking_service::{BookingService, MAX_MESSAGE_CHARS};
