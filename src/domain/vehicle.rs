//! Vehicle rate configuration as returned by the vehicle provider.

use rust_decimal::Decimal;
use serde::Deserialize;

use super::{UserId, VehicleId};

/// Pricing and delivery configuration of a vehicle listing.
///
/// Percentages are expressed on a 0–100 scale; fees and distances are
/// currency-agnostic decimals.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VehicleRateInfo {
    /// Vehicle identifier.
    pub vehicle_id: VehicleId,
    /// Current owner of the listing.
    pub owner_id: UserId,
    /// Daily rate.
    pub price_per_day: Decimal,
    /// Discount for rentals of 7 days or more.
    #[serde(default)]
    pub weekly_discount_percent: Option<Decimal>,
    /// Discount for rentals of 30 days or more.
    #[serde(default)]
    pub monthly_discount_percent: Option<Decimal>,
    /// Flat cleaning fee charged once per booking.
    #[serde(default)]
    pub cleaning_fee: Option<Decimal>,
    /// Whether the owner delivers the vehicle.
    #[serde(default)]
    pub delivery_available: bool,
    /// Delivery charge per kilometre.
    #[serde(default)]
    pub delivery_fee_per_km: Option<Decimal>,
    /// Maximum delivery distance in kilometres.
    #[serde(default)]
    pub delivery_radius_km: Option<Decimal>,
}

impl VehicleRateInfo {
    /// Creates a listing with only a daily rate configured.
    #[must_use]
    pub const fn new(vehicle_id: VehicleId, owner_id: UserId, price_per_day: Decimal) -> Self {
        Self {
            vehicle_id,
            owner_id,
            price_per_day,
            weekly_discount_percent: None,
            monthly_discount_percent: None,
            cleaning_fee: None,
            delivery_available: false,
            delivery_fee_per_km: None,
            delivery_radius_km: None,
        }
    }
}
