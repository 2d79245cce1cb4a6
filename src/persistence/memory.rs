//! In-process booking store and vehicle catalog.
//!
//! Both are `RwLock<HashMap<..>>` maps. The booking store performs its
//! status compare-and-swap under a single write guard, which gives it the
//! same conflict semantics as the PostgreSQL backend.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{BookingStore, VehicleProvider};
use crate::domain::{
    Booking, BookingFilter, BookingId, BookingPatch, BookingStatus, NewBooking, VehicleId,
    VehicleRateInfo,
};
use crate::error::GatewayError;

/// Booking store backed by a process-local map.
#[derive(Debug, Default)]
pub struct MemoryBookingStore {
    bookings: RwLock<HashMap<BookingId, Booking>>,
}

impl MemoryBookingStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored bookings.
    pub async fn len(&self) -> usize {
        self.bookings.read().await.len()
    }

    /// Returns `true` if no booking has been stored.
    pub async fn is_empty(&self) -> bool {
        self.bookings.read().await.is_empty()
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking, GatewayError> {
        let mut map = self.bookings.write().await;
        let mut id = BookingId::new();
        while map.contains_key(&id) {
            id = BookingId::new();
        }
        let booking = booking.into_booking(id);
        map.insert(id, booking.clone());
        Ok(booking)
    }

    async fn get_booking(&self, id: BookingId) -> Result<Booking, GatewayError> {
        self.bookings
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(GatewayError::BookingNotFound(*id.as_uuid()))
    }

    async fn update_booking_status(
        &self,
        id: BookingId,
        expected: BookingStatus,
        new_status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Booking, GatewayError> {
        let mut map = self.bookings.write().await;
        let booking = map
            .get_mut(&id)
            .ok_or(GatewayError::BookingNotFound(*id.as_uuid()))?;
        if booking.status != expected {
            return Err(GatewayError::Conflict(*id.as_uuid()));
        }
        booking.apply(BookingPatch {
            status: Some(new_status),
            updated_at: Some(updated_at),
        });
        Ok(booking.clone())
    }

    async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<Booking>, GatewayError> {
        let map = self.bookings.read().await;
        let mut bookings: Vec<Booking> = map
            .values()
            .filter(|booking| filter.matches(booking))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(bookings)
    }
}

/// Vehicle rate catalog backed by a process-local map.
#[derive(Debug, Default)]
pub struct MemoryVehicleCatalog {
    vehicles: RwLock<HashMap<VehicleId, VehicleRateInfo>>,
}

impl MemoryVehicleCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a catalog from a JSON array of vehicle rate records.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if the file cannot be read or
    /// does not contain valid vehicle records.
    pub async fn from_seed_file(path: &Path) -> Result<Self, GatewayError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            GatewayError::Internal(format!("cannot read vehicle seed {}: {e}", path.display()))
        })?;
        let vehicles: Vec<VehicleRateInfo> = serde_json::from_str(&raw).map_err(|e| {
            GatewayError::Internal(format!("invalid vehicle seed {}: {e}", path.display()))
        })?;
        let catalog = Self::new();
        for vehicle in vehicles {
            catalog.upsert(vehicle).await;
        }
        tracing::info!(path = %path.display(), count = catalog.len().await, "vehicle catalog seeded");
        Ok(catalog)
    }

    /// Inserts or replaces a vehicle's rate configuration.
    pub async fn upsert(&self, vehicle: VehicleRateInfo) {
        self.vehicles
            .write()
            .await
            .insert(vehicle.vehicle_id, vehicle);
    }

    /// Returns the number of vehicles in the catalog.
    pub async fn len(&self) -> usize {
        self.vehicles.read().await.len()
    }

    /// Returns `true` if the catalog is empty.
    pub async fn is_empty(&self) -> bool {
        self.vehicles.read().await.is_empty()
    }
}

#[async_trait]
impl VehicleProvider for MemoryVehicleCatalog {
    async fn get_vehicle_rate_info(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<VehicleRateInfo, GatewayError> {
        self.vehicles
            .read()
            .await
            .get(&vehicle_id)
            .cloned()
            .ok_or(GatewayError::VehicleNotFound(*vehicle_id.as_uuid()))
    }
}
