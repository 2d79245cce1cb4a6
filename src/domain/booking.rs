//! Booking aggregate, status, and the shapes used to create, patch and
//! query bookings.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::pricing::PriceBreakdown;
use super::{BookingId, UserId, VehicleId};
use crate::error::GatewayError;

/// Lifecycle status of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Requested by the renter, awaiting the owner's decision.
    Pending,
    /// Accepted by the owner.
    Accepted,
    /// Declined by the owner. Terminal.
    Rejected,
    /// Called off after acceptance. Terminal.
    Cancelled,
    /// Rental finished. Terminal.
    Completed,
}

impl BookingStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Accepted,
        Self::Rejected,
        Self::Cancelled,
        Self::Completed,
    ];

    /// Returns `true` if no further transition is permitted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled | Self::Completed)
    }

    /// Returns the snake_case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| GatewayError::InvalidRequest(format!("unknown booking status: {s}")))
    }
}

/// Which party to a booking is acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// The vehicle owner captured on the booking.
    Owner,
    /// The user who requested the booking.
    Renter,
}

/// Requested rental window.
///
/// `pickup_time` applies to `start_date` and `return_time` to `end_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentalPeriod {
    /// First day of the rental.
    pub start_date: NaiveDate,
    /// Day the vehicle is returned.
    pub end_date: NaiveDate,
    /// Optional time of day for pickup.
    pub pickup_time: Option<NaiveTime>,
    /// Optional time of day for return.
    pub return_time: Option<NaiveTime>,
}

impl RentalPeriod {
    /// Creates a date-only period.
    #[must_use]
    pub const fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            pickup_time: None,
            return_time: None,
        }
    }

    /// Sets pickup and return times of day.
    #[must_use]
    pub const fn with_times(mut self, pickup: NaiveTime, ret: NaiveTime) -> Self {
        self.pickup_time = Some(pickup);
        self.return_time = Some(ret);
        self
    }
}

/// Delivery options supplied by the renter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryRequest {
    /// Whether the renter wants the vehicle delivered.
    pub requested: bool,
    /// Delivery address.
    pub address: Option<String>,
    /// Distance from the vehicle to the address, in kilometres.
    pub distance_km: Option<Decimal>,
}

/// Everything a renter submits to create a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    /// Vehicle to rent.
    pub vehicle_id: VehicleId,
    /// Rental window.
    pub period: RentalPeriod,
    /// Delivery options.
    pub delivery: DeliveryRequest,
    /// Where the renter picks the vehicle up.
    pub pickup_location: Option<String>,
    /// Where the renter returns the vehicle.
    pub return_location: Option<String>,
    /// Free text from renter to owner.
    pub message: Option<String>,
}

/// A rental request/agreement.
///
/// Pricing lives in [`PriceBreakdown`] and is fixed at creation. The only
/// mutable fields are `status` and `updated_at`, changed through
/// [`BookingPatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    /// Identifier assigned by the store.
    pub id: BookingId,
    /// Rented vehicle.
    pub vehicle_id: VehicleId,
    /// Requesting user.
    pub renter_id: UserId,
    /// Vehicle owner at booking time.
    pub owner_id: UserId,
    /// First day of the rental.
    pub start_date: NaiveDate,
    /// Return day.
    pub end_date: NaiveDate,
    /// Pickup time of day.
    pub pickup_time: Option<NaiveTime>,
    /// Return time of day.
    pub return_time: Option<NaiveTime>,
    /// Pickup location.
    pub pickup_location: Option<String>,
    /// Return location.
    pub return_location: Option<String>,
    /// Whether delivery was requested.
    pub delivery_requested: bool,
    /// Delivery address.
    pub delivery_address: Option<String>,
    /// Delivery distance in kilometres.
    pub delivery_distance_km: Option<Decimal>,
    /// Price breakdown computed at creation.
    pub pricing: PriceBreakdown,
    /// Current status.
    pub status: BookingStatus,
    /// Renter's message to the owner.
    pub message: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Resolves the role `actor` plays on this booking.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Forbidden`] if the actor is neither the
    /// owner nor the renter.
    pub fn role_of(&self, actor: UserId) -> Result<ActorRole, GatewayError> {
        if actor == self.owner_id {
            Ok(ActorRole::Owner)
        } else if actor == self.renter_id {
            Ok(ActorRole::Renter)
        } else {
            Err(GatewayError::Forbidden)
        }
    }

    /// Returns `true` if `user` is the owner or the renter.
    #[must_use]
    pub fn is_party(&self, user: UserId) -> bool {
        self.role_of(user).is_ok()
    }

    /// Applies a patch, overwriting only the fields it provides.
    pub fn apply(&mut self, patch: BookingPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
    }
}

/// A new booking as handed to the store, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    /// Rented vehicle.
    pub vehicle_id: VehicleId,
    /// Requesting user.
    pub renter_id: UserId,
    /// Owner snapshot.
    pub owner_id: UserId,
    /// Rental window.
    pub period: RentalPeriod,
    /// Pickup location.
    pub pickup_location: Option<String>,
    /// Return location.
    pub return_location: Option<String>,
    /// Delivery options.
    pub delivery: DeliveryRequest,
    /// Computed breakdown.
    pub pricing: PriceBreakdown,
    /// Renter's message.
    pub message: Option<String>,
    /// Creation timestamp, also used as the initial `updated_at`.
    pub created_at: DateTime<Utc>,
}

impl NewBooking {
    /// Materialises the booking under `id` in the `pending` state.
    #[must_use]
    pub fn into_booking(self, id: BookingId) -> Booking {
        Booking {
            id,
            vehicle_id: self.vehicle_id,
            renter_id: self.renter_id,
            owner_id: self.owner_id,
            start_date: self.period.start_date,
            end_date: self.period.end_date,
            pickup_time: self.period.pickup_time,
            return_time: self.period.return_time,
            pickup_location: self.pickup_location,
            return_location: self.return_location,
            delivery_requested: self.delivery.requested,
            delivery_address: self.delivery.address,
            delivery_distance_km: self.delivery.distance_km,
            pricing: self.pricing,
            status: BookingStatus::Pending,
            message: self.message,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Partial update of a booking. `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingPatch {
    /// New status.
    pub status: Option<BookingStatus>,
    /// New modification timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Filter for [`crate::persistence::BookingStore::list_bookings`].
///
/// All criteria are combined with AND; `None` matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingFilter {
    /// Only bookings requested by this user.
    pub renter_id: Option<UserId>,
    /// Only bookings on vehicles owned by this user.
    pub owner_id: Option<UserId>,
    /// Only bookings in this status.
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    /// Returns `true` if `booking` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, booking: &Booking) -> bool {
        self.renter_id.is_none_or(|id| id == booking.renter_id)
            && self.owner_id.is_none_or(|id| id == booking.owner_id)
            && self.status.is_none_or(|s| s == booking.status)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_booking(owner: UserId, renter: UserId) -> Booking {
        let Some(start) = NaiveDate::from_ymd_opt(2025, 6, 1) else {
            panic!("valid date");
        };
        let Some(end) = NaiveDate::from_ymd_opt(2025, 6, 4) else {
            panic!("valid date");
        };
        NewBooking {
            vehicle_id: VehicleId::new(),
            renter_id: renter,
            owner_id: owner,
            period: RentalPeriod::new(start, end),
            pickup_location: None,
            return_location: None,
            delivery: DeliveryRequest::default(),
            pricing: PriceBreakdown::default(),
            message: None,
            created_at: Utc::now(),
        }
        .into_booking(BookingId::new())
    }

    #[test]
    fn new_booking_starts_pending() {
        let booking = sample_booking(UserId::new(), UserId::new());
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.created_at, booking.updated_at);
    }

    #[test]
    fn role_of_distinguishes_parties() {
        let owner = UserId::new();
        let renter = UserId::new();
        let booking = sample_booking(owner, renter);

        assert_eq!(booking.role_of(owner).ok(), Some(ActorRole::Owner));
        assert_eq!(booking.role_of(renter).ok(), Some(ActorRole::Renter));
        assert!(matches!(
            booking.role_of(UserId::new()),
            Err(GatewayError::Forbidden)
        ));
    }

    #[test]
    fn patch_only_overwrites_provided_fields() {
        let mut booking = sample_booking(UserId::new(), UserId::new());
        let created = booking.updated_at;

        booking.apply(BookingPatch {
            status: Some(BookingStatus::Accepted),
            updated_at: None,
        });
        assert_eq!(booking.status, BookingStatus::Accepted);
        assert_eq!(booking.updated_at, created);

        let later = created + chrono::Duration::minutes(5);
        booking.apply(BookingPatch {
            status: None,
            updated_at: Some(later),
        });
        assert_eq!(booking.status, BookingStatus::Accepted);
        assert_eq!(booking.updated_at, later);
    }

    #[test]
    fn filter_combines_criteria() {
        let owner = UserId::new();
        let renter = UserId::new();
        let booking = sample_booking(owner, renter);

        assert!(BookingFilter::default().matches(&booking));
        let pending_for_owner = BookingFilter {
            owner_id: Some(owner),
            status: Some(BookingStatus::Pending),
            ..BookingFilter::default()
        };
        assert!(pending_for_owner.matches(&booking));

        let accepted_for_owner = BookingFilter {
            status: Some(BookingStatus::Accepted),
            ..pending_for_owner
        };
        assert!(!accepted_for_owner.matches(&booking));

        let other_renter = BookingFilter {
            renter_id: Some(UserId::new()),
            ..BookingFilter::default()
        };
        assert!(!other_renter.matches(&booking));
    }

    #[test]
    fn status_parses_from_wire_name() {
        for status in BookingStatus::ALL {
            assert_eq!(status.as_str().parse::<BookingStatus>().ok(), Some(status));
        }
        assert!("archived".parse::<BookingStatus>().is_err());
    }
}
