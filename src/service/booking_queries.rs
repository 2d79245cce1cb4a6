//! Read-only booking queries for renters and owners.

use std::sync::Arc;

use crate::domain::{Booking, BookingFilter, BookingId, BookingStatus, UserId};
use crate::error::GatewayError;
use crate::persistence::BookingStore;

/// Read side of the booking lifecycle. Results are newest first.
#[derive(Debug, Clone)]
pub struct BookingQueries {
    bookings: Arc<dyn BookingStore>,
}

impl BookingQueries {
    /// Creates a new `BookingQueries` over `bookings`.
    #[must_use]
    pub fn new(bookings: Arc<dyn BookingStore>) -> Self {
        Self { bookings }
    }

    /// Bookings requested by `renter_id`, in every status.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the read fails.
    pub async fn list_for_renter(&self, renter_id: UserId) -> Result<Vec<Booking>, GatewayError> {
        self.bookings
            .list_bookings(BookingFilter {
                renter_id: Some(renter_id),
                ..BookingFilter::default()
            })
            .await
    }

    /// Pending requests on vehicles owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the read fails.
    pub async fn list_pending_for_owner(
        &self,
        owner_id: UserId,
    ) -> Result<Vec<Booking>, GatewayError> {
        self.bookings
            .list_bookings(BookingFilter {
                owner_id: Some(owner_id),
                status: Some(BookingStatus::Pending),
                ..BookingFilter::default()
            })
            .await
    }

    /// Fetches a single booking.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BookingNotFound`] if it does not exist.
    pub async fn get_by_id(&self, id: BookingId) -> Result<Booking, GatewayError> {
        self.bookings.get_booking(id).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::booking::tests::sample_booking;
    use crate::domain::{DeliveryRequest, NewBooking, RentalPeriod};
    use crate::persistence::MemoryBookingStore;

    async fn insert(store: &MemoryBookingStore, owner: UserId, renter: UserId, age_mins: i64) -> Booking {
        let template = sample_booking(owner, renter);
        let new = NewBooking {
            vehicle_id: template.vehicle_id,
            renter_id: renter,
            owner_id: owner,
            period: RentalPeriod::new(template.start_date, template.end_date),
            pickup_location: None,
            return_location: None,
            delivery: DeliveryRequest::default(),
            pricing: template.pricing,
            message: None,
            created_at: Utc::now() - chrono::Duration::minutes(age_mins),
        };
        let Ok(booking) = store.insert_booking(new).await else {
            panic!("insert failed");
        };
        booking
    }

    #[tokio::test]
    async fn renter_sees_own_bookings_newest_first() {
        let store = Arc::new(MemoryBookingStore::new());
        let queries = BookingQueries::new(Arc::clone(&store) as Arc<dyn BookingStore>);
        let (owner, renter) = (UserId::new(), UserId::new());

        let old = insert(&store, owner, renter, 60).await;
        let new = insert(&store, owner, renter, 1).await;
        insert(&store, owner, UserId::new(), 0).await;

        let Ok(listed) = queries.list_for_renter(renter).await else {
            panic!("list failed");
        };
        let ids: Vec<BookingId> = listed.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![new.id, old.id]);
    }

    #[tokio::test]
    async fn owner_sees_only_pending_requests() {
        let store = Arc::new(MemoryBookingStore::new());
        let queries = BookingQueries::new(Arc::clone(&store) as Arc<dyn BookingStore>);
        let owner = UserId::new();

        let waiting = insert(&store, owner, UserId::new(), 5).await;
        let decided = insert(&store, owner, UserId::new(), 3).await;
        insert(&store, UserId::new(), UserId::new(), 1).await;
        let Ok(_) = store
            .update_booking_status(
                decided.id,
                BookingStatus::Pending,
                BookingStatus::Accepted,
                Utc::now(),
            )
            .await
        else {
            panic!("update failed");
        };

        let Ok(listed) = queries.list_pending_for_owner(owner).await else {
            panic!("list failed");
        };
        assert_eq!(listed.len(), 1);
        assert_eq!(listed.first().map(|b| b.id), Some(waiting.id));
    }

    #[tokio::test]
    async fn get_by_id_reports_missing_booking() {
        let queries = BookingQueries::new(Arc::new(MemoryBookingStore::new()));
        let result = queries.get_by_id(BookingId::new()).await;
        assert!(matches!(result, Err(GatewayError::BookingNotFound(_))));
    }
}
