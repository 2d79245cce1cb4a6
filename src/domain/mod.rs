//! Domain layer: bookings, vehicle rates, pricing, and status transitions.
//!
//! Everything here is pure. I/O lives in [`crate::persistence`] and is
//! orchestrated by [`crate::service`].

pub mod booking;
pub mod ids;
pub mod pricing;
pub mod state_machine;
pub mod vehicle;

pub use booking::{
    ActorRole, Booking, BookingFilter, BookingPatch, BookingRequest, BookingStatus,
    DeliveryRequest, NewBooking, RentalPeriod,
};
pub use ids::{BookingId, UserId, VehicleId};
pub use pricing::{PriceBreakdown, PricingPolicy, compute_breakdown};
pub use state_machine::{TransitionRejection, transition};
pub use vehicle::VehicleRateInfo;
