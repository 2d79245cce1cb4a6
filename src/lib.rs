//! # rental-gateway
//!
//! Booking lifecycle and price computation for a peer-to-peer vehicle
//! rental marketplace, exposed as a REST API.
//!
//! Renters request a vehicle for a date range; the service computes an
//! itemised price (daily rate, weekly/monthly discount, cleaning and
//! delivery fees, service fee, taxes) once at creation and stores it with
//! the booking. Owners accept or reject requests, and either party moves
//! accepted bookings on through a small status state machine.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, X-User-Id)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── BookingService / BookingQueries (service/)
//!     │
//!     ├── Pricing engine + state machine (domain/)
//!     │
//!     └── BookingStore / VehicleProvider (persistence/)
//!             ├── in-memory
//!             └── PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
