//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::PricingPolicy;
use crate::persistence::{BookingStore, VehicleProvider};
use crate::service::{BookingQueries, BookingService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Write path: quotes, creation, status changes.
    pub booking_service: Arc<BookingService>,
    /// Read path: single bookings and listings.
    pub booking_queries: Arc<BookingQueries>,
}

impl AppState {
    /// Wires both services onto the same storage backends.
    #[must_use]
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        vehicles: Arc<dyn VehicleProvider>,
        pricing: PricingPolicy,
    ) -> Self {
        Self {
            booking_service: Arc::new(BookingService::new(
                Arc::clone(&bookings),
                vehicles,
                pricing,
            )),
            booking_queries: Arc::new(BookingQueries::new(bookings)),
        }
    }
}
