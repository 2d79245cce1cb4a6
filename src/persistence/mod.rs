//! Persistence boundary: booking storage and vehicle rate lookup.
//!
//! The services only see the [`BookingStore`] and [`VehicleProvider`]
//! traits. Two backends implement them:
//!
//! - [`memory`]: process-local maps, used in tests and when
//!   `PERSISTENCE_ENABLED=false`.
//! - [`postgres`]: PostgreSQL through `sqlx`.

pub mod memory;
pub mod postgres;

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Booking, BookingFilter, BookingId, BookingStatus, NewBooking, VehicleId, VehicleRateInfo,
};
use crate::error::GatewayError;

pub use memory::{MemoryBookingStore, MemoryVehicleCatalog};
pub use postgres::{PgBookingStore, PgVehicleProvider};

/// Append-only booking storage with optimistic concurrency on status.
#[async_trait]
pub trait BookingStore: Send + Sync + Debug {
    /// Stores a new booking in the `pending` state and assigns its id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the write fails.
    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking, GatewayError>;

    /// Fetches a booking by id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BookingNotFound`] if it does not exist.
    async fn get_booking(&self, id: BookingId) -> Result<Booking, GatewayError>;

    /// Sets the status of a booking, but only if it is still `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Conflict`] if the stored status differs
    /// from `expected`, or [`GatewayError::BookingNotFound`] if the
    /// booking does not exist.
    async fn update_booking_status(
        &self,
        id: BookingId,
        expected: BookingStatus,
        new_status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Booking, GatewayError>;

    /// Returns bookings matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the read fails.
    async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<Booking>, GatewayError>;
}

/// Source of vehicle rate and delivery configuration.
#[async_trait]
pub trait VehicleProvider: Send + Sync + Debug {
    /// Looks up the current rate configuration of a vehicle.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::VehicleNotFound`] if the vehicle does not
    /// exist.
    async fn get_vehicle_rate_info(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<VehicleRateInfo, GatewayError>;
}
