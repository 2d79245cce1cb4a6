//! Booking lifecycle service: creation, quotes, and status changes.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    Booking, BookingId, BookingRequest, BookingStatus, DeliveryRequest, NewBooking,
    PriceBreakdown, PricingPolicy, RentalPeriod, UserId, VehicleId, compute_breakdown,
    transition,
};
use crate::error::{GatewayError, ValidationCode};
use crate::persistence::{BookingStore, VehicleProvider};

/// Longest renter message accepted, in characters.
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Orchestration layer for the booking lifecycle.
///
/// Stateless coordinator: owns the [`BookingStore`] and
/// [`VehicleProvider`] it talks to and the [`PricingPolicy`] it prices
/// with. Every mutation follows the pattern: read → decide (pricing
/// engine or state machine) → conditional write → return result.
#[derive(Debug, Clone)]
pub struct BookingService {
    bookings: Arc<dyn BookingStore>,
    vehicles: Arc<dyn VehicleProvider>,
    pricing: PricingPolicy,
}

impl BookingService {
    /// Creates a new `BookingService`.
    #[must_use]
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        vehicles: Arc<dyn VehicleProvider>,
        pricing: PricingPolicy,
    ) -> Self {
        Self {
            bookings,
            vehicles,
            pricing,
        }
    }

    /// Returns the pricing policy applied to new bookings.
    #[must_use]
    pub const fn pricing_policy(&self) -> &PricingPolicy {
        &self.pricing
    }

    /// Prices a prospective booking without storing anything.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::VehicleNotFound`] if the vehicle does not
    /// exist, or the pricing engine's validation errors unchanged.
    pub async fn quote(
        &self,
        vehicle_id: VehicleId,
        period: &RentalPeriod,
        delivery: &DeliveryRequest,
    ) -> Result<PriceBreakdown, GatewayError> {
        let vehicle = self.vehicles.get_vehicle_rate_info(vehicle_id).await?;
        let delivery = normalize_delivery(delivery.clone());
        compute_breakdown(&vehicle, period, &delivery, &self.pricing)
    }

    /// Creates a `pending` booking for `renter_id`.
    ///
    /// The vehicle's owner and the full price breakdown are captured on
    /// the booking and never recomputed.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::VehicleNotFound`] if the vehicle does not exist.
    /// - [`GatewayError::Validation`] with `self_booking` if the renter
    ///   owns the vehicle, or any pricing validation error.
    /// - [`GatewayError::InvalidRequest`] if the message is too long.
    /// - [`GatewayError::PersistenceError`] if the write fails.
    pub async fn create_booking(
        &self,
        renter_id: UserId,
        request: BookingRequest,
    ) -> Result<Booking, GatewayError> {
        let message = normalize_text(request.message);
        if let Some(msg) = &message
            && msg.chars().count() > MAX_MESSAGE_CHARS
        {
            return Err(GatewayError::InvalidRequest(format!(
                "message must be at most {MAX_MESSAGE_CHARS} characters"
            )));
        }

        let vehicle = self
            .vehicles
            .get_vehicle_rate_info(request.vehicle_id)
            .await?;
        if vehicle.owner_id == renter_id {
            return Err(ValidationCode::SelfBooking.into());
        }

        let delivery = normalize_delivery(request.delivery);
        let pricing = compute_breakdown(&vehicle, &request.period, &delivery, &self.pricing)?;

        let booking = self
            .bookings
            .insert_booking(NewBooking {
                vehicle_id: vehicle.vehicle_id,
                renter_id,
                owner_id: vehicle.owner_id,
                period: request.period,
                pickup_location: normalize_text(request.pickup_location),
                return_location: normalize_text(request.return_location),
                delivery,
                pricing,
                message,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(
            booking_id = %booking.id,
            vehicle_id = %booking.vehicle_id,
            renter_id = %booking.renter_id,
            total_days = booking.pricing.total_days,
            total_price = %booking.pricing.total_price,
            "booking created"
        );
        Ok(booking)
    }

    /// Moves a booking to `requested` on behalf of `actor_id`.
    ///
    /// Only `status` and `updated_at` change. If another writer changes
    /// the status between read and write, the booking is re-read and the
    /// transition re-decided once before the conflict is surfaced.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::BookingNotFound`] if the booking does not exist.
    /// - [`GatewayError::Forbidden`] if the actor is neither owner nor
    ///   renter.
    /// - [`GatewayError::InvalidTransition`] if the state machine rejects
    ///   the change.
    /// - [`GatewayError::Conflict`] if the write conflicted twice.
    pub async fn update_status(
        &self,
        actor_id: UserId,
        booking_id: BookingId,
        requested: BookingStatus,
    ) -> Result<Booking, GatewayError> {
        let mut retried = false;
        loop {
            let current = self.bookings.get_booking(booking_id).await?;
            let role = current.role_of(actor_id)?;
            let next = transition(current.status, requested, role)?;

            match self
                .bookings
                .update_booking_status(booking_id, current.status, next, Utc::now())
                .await
            {
                Ok(updated) => {
                    tracing::info!(
                        %booking_id,
                        from = %current.status,
                        to = %updated.status,
                        ?role,
                        "booking status changed"
                    );
                    return Ok(updated);
                }
                Err(GatewayError::Conflict(_)) if !retried => {
                    tracing::warn!(%booking_id, expected = %current.status, "status write conflicted, retrying");
                    retried = true;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Trims free text and drops it when blank.
fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Address and distance are only meaningful when delivery was requested.
fn normalize_delivery(delivery: DeliveryRequest) -> DeliveryRequest {
    if delivery.requested {
        DeliveryRequest {
            requested: true,
            address: normalize_text(delivery.address),
            distance_km: delivery.distance_km,
        }
    } else {
        DeliveryRequest::default()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate};
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::{BookingFilter, TransitionRejection, VehicleRateInfo};
    use crate::persistence::{MemoryBookingStore, MemoryVehicleCatalog};

    /// Store that reports a conflict on the first `conflicts` status writes.
    /// When `interfere_with` is set, a competing writer first moves the
    /// booking to that status, as a real concurrent request would.
    #[derive(Debug)]
    struct RacingStore {
        inner: MemoryBookingStore,
        conflicts: AtomicU32,
        interfere_with: Option<BookingStatus>,
        update_calls: AtomicU32,
    }

    impl RacingStore {
        fn new(conflicts: u32, interfere_with: Option<BookingStatus>) -> Self {
            Self {
                inner: MemoryBookingStore::new(),
                conflicts: AtomicU32::new(conflicts),
                interfere_with,
                update_calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl BookingStore for RacingStore {
        async fn insert_booking(&self, booking: NewBooking) -> Result<Booking, GatewayError> {
            self.inner.insert_booking(booking).await
        }

        async fn get_booking(&self, id: BookingId) -> Result<Booking, GatewayError> {
            self.inner.get_booking(id).await
        }

        async fn update_booking_status(
            &self,
            id: BookingId,
            expected: BookingStatus,
            new_status: BookingStatus,
            updated_at: DateTime<Utc>,
        ) -> Result<Booking, GatewayError> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            let should_conflict = self
                .conflicts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if should_conflict {
                if let Some(competing) = self.interfere_with {
                    self.inner
                        .update_booking_status(id, expected, competing, updated_at)
                        .await?;
                }
                return Err(GatewayError::Conflict(*id.as_uuid()));
            }
            self.inner
                .update_booking_status(id, expected, new_status, updated_at)
                .await
        }

        async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<Booking>, GatewayError> {
            self.inner.list_bookings(filter).await
        }
    }

    struct Fixture {
        service: BookingService,
        catalog: Arc<MemoryVehicleCatalog>,
        vehicle: VehicleRateInfo,
        owner: UserId,
        renter: UserId,
    }

    fn date(day: u32) -> NaiveDate {
        let Some(date) = NaiveDate::from_ymd_opt(2025, 7, day) else {
            panic!("valid date");
        };
        date
    }

    async fn fixture_with_store(store: Arc<dyn BookingStore>, policy: PricingPolicy) -> Fixture {
        let catalog = Arc::new(MemoryVehicleCatalog::new());
        let owner = UserId::new();
        let vehicle = VehicleRateInfo::new(VehicleId::new(), owner, Decimal::from(100));
        catalog.upsert(vehicle.clone()).await;
        let service = BookingService::new(
            store,
            Arc::clone(&catalog) as Arc<dyn VehicleProvider>,
            policy,
        );
        Fixture {
            service,
            catalog,
            vehicle,
            owner,
            renter: UserId::new(),
        }
    }

    async fn fixture() -> Fixture {
        let Ok(policy) = PricingPolicy::new(Decimal::ZERO, Decimal::new(10, 2)) else {
            panic!("valid policy");
        };
        fixture_with_store(Arc::new(MemoryBookingStore::new()), policy).await
    }

    fn request(vehicle_id: VehicleId, start: u32, end: u32) -> BookingRequest {
        BookingRequest {
            vehicle_id,
            period: RentalPeriod::new(date(start), date(end)),
            delivery: DeliveryRequest::default(),
            pickup_location: Some("  Central Station  ".to_string()),
            return_location: Some("   ".to_string()),
            message: Some("Picking up after work".to_string()),
        }
    }

    async fn create(fx: &Fixture) -> Booking {
        match fx
            .service
            .create_booking(fx.renter, request(fx.vehicle.vehicle_id, 1, 4))
            .await
        {
            Ok(booking) => booking,
            Err(e) => panic!("create failed: {e}"),
        }
    }

    fn rejection(result: Result<Booking, GatewayError>) -> TransitionRejection {
        match result {
            Err(GatewayError::InvalidTransition { reason, .. }) => reason,
            other => panic!("expected invalid transition, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn exposes_the_policy_it_prices_with() {
        let fx = fixture().await;
        let policy = fx.service.pricing_policy();
        assert_eq!(policy.service_fee_rate(), Decimal::ZERO);
        assert_eq!(policy.tax_rate(), Decimal::new(10, 2));

        let period = RentalPeriod::new(date(1), date(4));
        let quoted = fx
            .service
            .quote(fx.vehicle.vehicle_id, &period, &DeliveryRequest::default())
            .await;
        let Ok(breakdown) = quoted else {
            panic!("quote failed");
        };
        assert_eq!(breakdown.taxes, breakdown.subtotal * policy.tax_rate());
    }

    #[tokio::test]
    async fn create_snapshots_owner_and_breakdown() {
        let fx = fixture().await;
        let booking = create(&fx).await;

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.owner_id, fx.owner);
        assert_eq!(booking.renter_id, fx.renter);
        assert_eq!(booking.pricing.total_days, 3);
        assert_eq!(booking.pricing.base_price, Decimal::from(300));
        assert_eq!(booking.pricing.taxes, Decimal::from(30));
        assert_eq!(booking.pricing.total_price, Decimal::from(330));
        assert_eq!(booking.pickup_location.as_deref(), Some("Central Station"));
        assert_eq!(booking.return_location, None);
    }

    #[tokio::test]
    async fn owner_cannot_book_own_vehicle() {
        let fx = fixture().await;
        let result = fx
            .service
            .create_booking(fx.owner, request(fx.vehicle.vehicle_id, 1, 4))
            .await;
        assert!(matches!(
            result,
            Err(GatewayError::Validation(ValidationCode::SelfBooking))
        ));
    }

    #[tokio::test]
    async fn unknown_vehicle_is_not_found() {
        let fx = fixture().await;
        let result = fx
            .service
            .create_booking(fx.renter, request(VehicleId::new(), 1, 4))
            .await;
        assert!(matches!(result, Err(GatewayError::VehicleNotFound(_))));
    }

    #[tokio::test]
    async fn pricing_errors_propagate_unchanged() {
        let fx = fixture().await;
        let result = fx
            .service
            .create_booking(fx.renter, request(fx.vehicle.vehicle_id, 5, 5))
            .await;
        assert!(matches!(
            result,
            Err(GatewayError::Validation(ValidationCode::InvalidDateRange))
        ));
    }

    #[tokio::test]
    async fn overlong_message_is_rejected() {
        let fx = fixture().await;
        let mut req = request(fx.vehicle.vehicle_id, 1, 4);
        req.message = Some("x".repeat(MAX_MESSAGE_CHARS + 1));
        let result = fx.service.create_booking(fx.renter, req).await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn delivery_details_dropped_when_not_requested() {
        let mut fx = fixture().await;
        fx.vehicle.delivery_available = true;
        fx.vehicle.delivery_fee_per_km = Some(Decimal::from(2));
        fx.catalog.upsert(fx.vehicle.clone()).await;

        let mut req = request(fx.vehicle.vehicle_id, 1, 2);
        req.delivery = DeliveryRequest {
            requested: false,
            address: Some("5 Mill Lane".to_string()),
            distance_km: Some(Decimal::from(12)),
        };
        let Ok(booking) = fx.service.create_booking(fx.renter, req).await else {
            panic!("create failed");
        };
        assert!(!booking.delivery_requested);
        assert_eq!(booking.delivery_address, None);
        assert_eq!(booking.pricing.delivery_fee, Decimal::ZERO);
    }

    #[tokio::test]
    async fn owner_accepts_then_renter_cannot_reject() {
        let fx = fixture().await;
        let booking = create(&fx).await;

        let Ok(accepted) = fx
            .service
            .update_status(fx.owner, booking.id, BookingStatus::Accepted)
            .await
        else {
            panic!("accept failed");
        };
        assert_eq!(accepted.status, BookingStatus::Accepted);
        assert!(accepted.updated_at >= booking.updated_at);

        let result = fx
            .service
            .update_status(fx.renter, booking.id, BookingStatus::Rejected)
            .await;
        assert_eq!(rejection(result), TransitionRejection::NoSuchTransition);
    }

    #[tokio::test]
    async fn strangers_are_forbidden() {
        let fx = fixture().await;
        let booking = create(&fx).await;
        let result = fx
            .service
            .update_status(UserId::new(), booking.id, BookingStatus::Accepted)
            .await;
        assert!(matches!(result, Err(GatewayError::Forbidden)));
    }

    #[tokio::test]
    async fn missing_booking_is_not_found() {
        let fx = fixture().await;
        let result = fx
            .service
            .update_status(fx.owner, BookingId::new(), BookingStatus::Accepted)
            .await;
        assert!(matches!(result, Err(GatewayError::BookingNotFound(_))));
    }

    #[tokio::test]
    async fn terminal_bookings_reject_every_actor() {
        let fx = fixture().await;
        let booking = create(&fx).await;
        let Ok(_) = fx
            .service
            .update_status(fx.owner, booking.id, BookingStatus::Rejected)
            .await
        else {
            panic!("reject failed");
        };

        for actor in [fx.owner, fx.renter] {
            for target in BookingStatus::ALL {
                let result = fx.service.update_status(actor, booking.id, target).await;
                assert_eq!(rejection(result), TransitionRejection::TerminalState);
            }
        }
    }

    #[tokio::test]
    async fn breakdown_survives_vehicle_repricing() {
        let mut fx = fixture().await;
        let booking = create(&fx).await;

        fx.vehicle.price_per_day = Decimal::from(250);
        fx.catalog.upsert(fx.vehicle.clone()).await;

        let Ok(accepted) = fx
            .service
            .update_status(fx.owner, booking.id, BookingStatus::Accepted)
            .await
        else {
            panic!("accept failed");
        };
        let Ok(completed) = fx
            .service
            .update_status(fx.owner, accepted.id, BookingStatus::Completed)
            .await
        else {
            panic!("complete failed");
        };
        assert_eq!(completed.pricing, booking.pricing);
        assert_eq!(completed.pricing.price_per_day, Decimal::from(100));
    }

    #[tokio::test]
    async fn single_conflict_is_retried() {
        let store = Arc::new(RacingStore::new(1, None));
        let fx = fixture_with_store(
            Arc::clone(&store) as Arc<dyn BookingStore>,
            PricingPolicy::free(),
        )
        .await;
        let booking = create(&fx).await;

        let result = fx
            .service
            .update_status(fx.owner, booking.id, BookingStatus::Accepted)
            .await;
        assert_eq!(result.ok().map(|b| b.status), Some(BookingStatus::Accepted));
        assert_eq!(store.update_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn repeated_conflict_surfaces_conflict() {
        let store = Arc::new(RacingStore::new(2, None));
        let fx = fixture_with_store(
            Arc::clone(&store) as Arc<dyn BookingStore>,
            PricingPolicy::free(),
        )
        .await;
        let booking = create(&fx).await;

        let result = fx
            .service
            .update_status(fx.owner, booking.id, BookingStatus::Accepted)
            .await;
        assert!(matches!(result, Err(GatewayError::Conflict(_))));
        assert_eq!(store.update_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn retry_re_decides_against_the_new_status() {
        // The renter cancels while the owner completes the rental first.
        let store = Arc::new(RacingStore::new(1, Some(BookingStatus::Completed)));
        let fx = fixture_with_store(
            Arc::clone(&store) as Arc<dyn BookingStore>,
            PricingPolicy::free(),
        )
        .await;
        let booking = create(&fx).await;
        let Ok(_) = store
            .inner
            .update_booking_status(
                booking.id,
                BookingStatus::Pending,
                BookingStatus::Accepted,
                Utc::now(),
            )
            .await
        else {
            panic!("setup accept failed");
        };

        let result = fx
            .service
            .update_status(fx.renter, booking.id, BookingStatus::Cancelled)
            .await;
        assert_eq!(rejection(result), TransitionRejection::TerminalState);
        assert_eq!(store.update_calls.load(Ordering::SeqCst), 1);

        let Ok(stored) = store.get_booking(booking.id).await else {
            panic!("booking missing");
        };
        assert_eq!(stored.status, BookingStatus::Completed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_decisions_have_one_winner() {
        let fx = fixture().await;
        let booking = create(&fx).await;

        let accept = {
            let service = fx.service.clone();
            let (owner, id) = (fx.owner, booking.id);
            tokio::spawn(async move {
                service
                    .update_status(owner, id, BookingStatus::Accepted)
                    .await
            })
        };
        let reject = {
            let service = fx.service.clone();
            let (owner, id) = (fx.owner, booking.id);
            tokio::spawn(async move {
                service
                    .update_status(owner, id, BookingStatus::Rejected)
                    .await
            })
        };
        let (Ok(accepted), Ok(rejected)) = (accept.await, reject.await) else {
            panic!("task panicked");
        };

        let outcomes = [accepted, rejected];
        let winners = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        for outcome in &outcomes {
            if let Err(e) = outcome {
                assert!(
                    matches!(
                        e,
                        GatewayError::Conflict(_) | GatewayError::InvalidTransition { .. }
                    ),
                    "unexpected loser error: {e:?}"
                );
            }
        }
    }

    #[tokio::test]
    async fn quote_matches_created_breakdown_without_storing() {
        let store = Arc::new(MemoryBookingStore::new());
        let fx = fixture_with_store(
            Arc::clone(&store) as Arc<dyn BookingStore>,
            PricingPolicy::default(),
        )
        .await;
        let req = request(fx.vehicle.vehicle_id, 1, 8);

        let Ok(quoted) = fx
            .service
            .quote(req.vehicle_id, &req.period, &req.delivery)
            .await
        else {
            panic!("quote failed");
        };
        assert!(store.is_empty().await);

        let Ok(booking) = fx.service.create_booking(fx.renter, req).await else {
            panic!("create failed");
        };
        assert_eq!(booking.pricing, quoted);
    }
}
