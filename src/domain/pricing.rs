//! Pricing engine: deterministic price breakdown for a prospective booking.
//!
//! [`compute_breakdown`] is pure. It reads only its arguments, so the same
//! inputs always produce the same breakdown.
//!
//! # Rounding
//!
//! Every monetary field is rounded exactly once, to 2 decimal places,
//! half-up, when it is produced. Fields derived from other fields consume
//! the already-rounded values, so a stored breakdown always satisfies
//! `subtotal = base + delivery + cleaning + service - discount` and
//! `total = subtotal + taxes` to the cent.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::booking::{DeliveryRequest, RentalPeriod};
use super::vehicle::VehicleRateInfo;
use crate::error::{GatewayError, ValidationCode};

const SECONDS_PER_DAY: i64 = 86_400;
const WEEKLY_TIER_DAYS: u32 = 7;
const MONTHLY_TIER_DAYS: u32 = 30;
const MONEY_SCALE: u32 = 2;
/// Largest amount a `NUMERIC(14, 2)` column holds.
// 99_999_999_999_999 (0x5AF3_107A_3FFF) at scale 2; `Decimal::new` is not `const`.
const MAX_AMOUNT: Decimal = Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, MONEY_SCALE);

/// Platform-wide fee and tax rates, expressed as fractions (`0.10` = 10%).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    service_fee_rate: Decimal,
    tax_rate: Decimal,
}

impl PricingPolicy {
    /// Creates a policy from fractional rates.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if either rate is outside
    /// `0..=1`.
    pub fn new(service_fee_rate: Decimal, tax_rate: Decimal) -> Result<Self, GatewayError> {
        for (name, rate) in [("service fee", service_fee_rate), ("tax", tax_rate)] {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(GatewayError::InvalidRequest(format!(
                    "{name} rate must be between 0 and 1, got {rate}"
                )));
            }
        }
        Ok(Self {
            service_fee_rate,
            tax_rate,
        })
    }

    /// A policy charging neither service fee nor tax.
    #[must_use]
    pub const fn free() -> Self {
        Self {
            service_fee_rate: Decimal::ZERO,
            tax_rate: Decimal::ZERO,
        }
    }

    /// Service fee as a fraction of the base price.
    #[must_use]
    pub const fn service_fee_rate(&self) -> Decimal {
        self.service_fee_rate
    }

    /// Tax as a fraction of the subtotal.
    #[must_use]
    pub const fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }
}

impl Default for PricingPolicy {
    /// 10% service fee and 10% tax.
    fn default() -> Self {
        Self {
            service_fee_rate: Decimal::new(10, 2),
            tax_rate: Decimal::new(10, 2),
        }
    }
}

/// Immutable price breakdown stored on a booking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriceBreakdown {
    /// Snapshot of the vehicle's daily rate.
    pub price_per_day: Decimal,
    /// Charged days, at least 1.
    pub total_days: u32,
    /// `price_per_day × total_days`.
    pub base_price: Decimal,
    /// Weekly or monthly discount, subtracted from the subtotal.
    pub discount_amount: Decimal,
    /// Flat cleaning fee.
    pub cleaning_fee: Decimal,
    /// Delivery surcharge.
    pub delivery_fee: Decimal,
    /// Platform service fee.
    pub service_fee: Decimal,
    /// Amount before tax, never negative.
    pub subtotal: Decimal,
    /// Tax on the subtotal.
    pub taxes: Decimal,
    /// `subtotal + taxes`.
    pub total_price: Decimal,
}

/// Computes the price breakdown for renting `vehicle` over `period`.
///
/// Discount tiers are not cumulative: the monthly discount applies from 30
/// days on, otherwise the weekly discount from 7 days on.
///
/// # Errors
///
/// Returns [`GatewayError::Validation`] with:
/// - `negative_rate` if the daily rate is not positive,
/// - `invalid_date_range` if `end_date <= start_date`,
/// - `invalid_discount` / `negative_fee` for a malformed vehicle config,
/// - `invalid_delivery_distance` for a negative distance,
/// - `delivery_out_of_range` if the distance exceeds the delivery radius.
pub fn compute_breakdown(
    vehicle: &VehicleRateInfo,
    period: &RentalPeriod,
    delivery: &DeliveryRequest,
    policy: &PricingPolicy,
) -> Result<PriceBreakdown, GatewayError> {
    if vehicle.price_per_day <= Decimal::ZERO {
        return Err(ValidationCode::NegativeRate.into());
    }
    let total_days = total_days(period)?;
    validate_vehicle_config(vehicle)?;

    let price_per_day = money(vehicle.price_per_day);
    let base_price = money(checked_mul(price_per_day, Decimal::from(total_days))?);

    let discount_percent = if total_days >= MONTHLY_TIER_DAYS
        && let Some(percent) = vehicle.monthly_discount_percent
    {
        percent
    } else if total_days >= WEEKLY_TIER_DAYS
        && let Some(percent) = vehicle.weekly_discount_percent
    {
        percent
    } else {
        Decimal::ZERO
    };
    let discount_amount = money(checked_mul(base_price, discount_percent)? / Decimal::ONE_HUNDRED);

    let delivery_fee = delivery_fee(vehicle, delivery)?;
    let cleaning_fee = money(vehicle.cleaning_fee.unwrap_or(Decimal::ZERO));
    let service_fee = money(checked_mul(base_price, policy.service_fee_rate)?);

    let subtotal = [delivery_fee, cleaning_fee, service_fee]
        .into_iter()
        .try_fold(checked_sub(base_price, discount_amount)?, checked_add)?;
    let taxes = money(checked_mul(subtotal, policy.tax_rate)?);
    let total_price = checked_add(subtotal, taxes)?;

    let breakdown = PriceBreakdown {
        price_per_day,
        total_days,
        base_price,
        discount_amount,
        cleaning_fee,
        delivery_fee,
        service_fee,
        subtotal,
        taxes,
        total_price,
    };
    ensure_storable(&breakdown)?;
    Ok(breakdown)
}

/// Every amount must fit a `NUMERIC(14, 2)` column.
fn ensure_storable(b: &PriceBreakdown) -> Result<(), GatewayError> {
    let amounts = [
        b.price_per_day,
        b.base_price,
        b.discount_amount,
        b.cleaning_fee,
        b.delivery_fee,
        b.service_fee,
        b.subtotal,
        b.taxes,
        b.total_price,
    ];
    if amounts.iter().any(|amount| *amount > MAX_AMOUNT) {
        return Err(amount_too_large());
    }
    Ok(())
}

/// Number of charged days for `period`.
///
/// Date-only periods count calendar days between the two dates. When both
/// a pickup and a return time are known, the exact span is rounded up to
/// whole 24-hour days, so a partial day is charged as a full one.
///
/// # Errors
///
/// Returns `invalid_date_range` if `end_date <= start_date`.
pub fn total_days(period: &RentalPeriod) -> Result<u32, GatewayError> {
    if period.end_date <= period.start_date {
        return Err(ValidationCode::InvalidDateRange.into());
    }
    let days = match (period.pickup_time, period.return_time) {
        (Some(pickup), Some(ret)) => {
            let span = period.end_date.and_time(ret) - period.start_date.and_time(pickup);
            (span.num_seconds() + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
        }
        _ => (period.end_date - period.start_date).num_days(),
    };
    u32::try_from(days.max(1)).map_err(|_| ValidationCode::InvalidDateRange.into())
}

fn validate_vehicle_config(vehicle: &VehicleRateInfo) -> Result<(), GatewayError> {
    let percents = [
        vehicle.weekly_discount_percent,
        vehicle.monthly_discount_percent,
    ];
    if percents
        .into_iter()
        .flatten()
        .any(|p| p < Decimal::ZERO || p > Decimal::ONE_HUNDRED)
    {
        return Err(ValidationCode::InvalidDiscount.into());
    }
    let fees = [vehicle.cleaning_fee, vehicle.delivery_fee_per_km];
    if fees.into_iter().flatten().any(|fee| fee < Decimal::ZERO) {
        return Err(ValidationCode::NegativeFee.into());
    }
    Ok(())
}

fn delivery_fee(
    vehicle: &VehicleRateInfo,
    delivery: &DeliveryRequest,
) -> Result<Decimal, GatewayError> {
    let Some(distance) = delivery.distance_km else {
        return Ok(Decimal::ZERO);
    };
    if distance < Decimal::ZERO {
        return Err(ValidationCode::InvalidDeliveryDistance.into());
    }
    if !delivery.requested || !vehicle.delivery_available {
        return Ok(Decimal::ZERO);
    }
    if let Some(radius) = vehicle.delivery_radius_km
        && distance > radius
    {
        return Err(ValidationCode::DeliveryOutOfRange.into());
    }
    let per_km = vehicle.delivery_fee_per_km.unwrap_or(Decimal::ZERO);
    Ok(money(checked_mul(distance, per_km)?))
}

/// Rounds half-up to cents and pins the scale so `300` renders as `300.00`.
fn money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

fn amount_too_large() -> GatewayError {
    GatewayError::InvalidRequest("amount too large".to_string())
}

fn checked_mul(a: Decimal, b: Decimal) -> Result<Decimal, GatewayError> {
    a.checked_mul(b).ok_or_else(amount_too_large)
}

fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal, GatewayError> {
    a.checked_add(b).ok_or_else(amount_too_large)
}

fn checked_sub(a: Decimal, b: Decimal) -> Result<Decimal, GatewayError> {
    a.checked_sub(b).ok_or_else(amount_too_large)
}
