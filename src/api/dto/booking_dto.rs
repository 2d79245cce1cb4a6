//! Booking, quote and status-change DTOs.
//!
//! Monetary amounts are serialized as decimal strings with two places
//! (e.g. `"143.90"`) so no client ever sees a binary float.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::PaginationMeta;
use crate::domain::{
    Booking, BookingRequest, BookingStatus, DeliveryRequest, PriceBreakdown, RentalPeriod,
    VehicleId,
};

/// Rental window and delivery options shared by create and quote requests.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RentalWindowDto {
    /// First day of the rental (`YYYY-MM-DD`).
    pub start_date: NaiveDate,
    /// Return day (`YYYY-MM-DD`), strictly after `start_date`.
    pub end_date: NaiveDate,
    /// Pickup time of day (`HH:MM:SS`).
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "10:00:00")]
    pub pickup_time: Option<NaiveTime>,
    /// Return time of day (`HH:MM:SS`).
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "18:00:00")]
    pub return_time: Option<NaiveTime>,
    /// Whether the vehicle should be delivered.
    #[serde(default)]
    pub delivery_requested: bool,
    /// Delivery address.
    #[serde(default)]
    pub delivery_address: Option<String>,
    /// Delivery distance in kilometres (string or number).
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "12.5")]
    pub delivery_distance_km: Option<Decimal>,
}

impl RentalWindowDto {
    /// Splits the window into its domain period and delivery request.
    #[must_use]
    pub fn into_parts(self) -> (RentalPeriod, DeliveryRequest) {
        let period = RentalPeriod {
            start_date: self.start_date,
            end_date: self.end_date,
            pickup_time: self.pickup_time,
            return_time: self.return_time,
        };
        let delivery = DeliveryRequest {
            requested: self.delivery_requested,
            address: self.delivery_address,
            distance_km: self.delivery_distance_km,
        };
        (period, delivery)
    }
}

/// Request body for `POST /bookings`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    /// Vehicle to rent.
    pub vehicle_id: Uuid,
    /// Rental window and delivery options.
    #[serde(flatten)]
    pub window: RentalWindowDto,
    /// Pickup location.
    #[serde(default)]
    pub pickup_location: Option<String>,
    /// Return location.
    #[serde(default)]
    pub return_location: Option<String>,
    /// Message to the owner (at most 1000 characters).
    #[serde(default)]
    pub message: Option<String>,
}

impl From<CreateBookingRequest> for BookingRequest {
    fn from(req: CreateBookingRequest) -> Self {
        let (period, delivery) = req.window.into_parts();
        Self {
            vehicle_id: VehicleId::from_uuid(req.vehicle_id),
            period,
            delivery,
            pickup_location: req.pickup_location,
            return_location: req.return_location,
            message: req.message,
        }
    }
}

/// Request body for `POST /bookings/quote`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QuoteRequest {
    /// Vehicle to price.
    pub vehicle_id: Uuid,
    /// Rental window and delivery options.
    #[serde(flatten)]
    pub window: RentalWindowDto,
}

/// Request body for `PATCH /bookings/{id}/status`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// Target status: `accepted`, `rejected`, `cancelled` or `completed`.
    #[schema(example = "accepted")]
    pub status: String,
}

/// Itemised price of a booking.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PriceBreakdownDto {
    /// Daily rate (string-encoded).
    pub price_per_day: String,
    /// Billable days.
    pub total_days: u32,
    /// `price_per_day × total_days` (string-encoded).
    pub base_price: String,
    /// Weekly or monthly discount (string-encoded).
    pub discount_amount: String,
    /// Flat cleaning fee (string-encoded).
    pub cleaning_fee: String,
    /// Distance-based delivery fee (string-encoded).
    pub delivery_fee: String,
    /// Platform service fee (string-encoded).
    pub service_fee: String,
    /// Pre-tax total (string-encoded).
    pub subtotal: String,
    /// Tax on the subtotal (string-encoded).
    pub taxes: String,
    /// Amount charged (string-encoded).
    pub total_price: String,
}

impl From<&PriceBreakdown> for PriceBreakdownDto {
    fn from(p: &PriceBreakdown) -> Self {
        Self {
            price_per_day: p.price_per_day.to_string(),
            total_days: p.total_days,
            base_price: p.base_price.to_string(),
            discount_amount: p.discount_amount.to_string(),
            cleaning_fee: p.cleaning_fee.to_string(),
            delivery_fee: p.delivery_fee.to_string(),
            service_fee: p.service_fee.to_string(),
            subtotal: p.subtotal.to_string(),
            taxes: p.taxes.to_string(),
            total_price: p.total_price.to_string(),
        }
    }
}

/// A booking as returned by every booking endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingDto {
    /// Booking identifier.
    pub id: Uuid,
    /// Rented vehicle.
    pub vehicle_id: Uuid,
    /// Requesting user.
    pub renter_id: Uuid,
    /// Vehicle owner at booking time.
    pub owner_id: Uuid,
    /// First day of the rental.
    pub start_date: NaiveDate,
    /// Return day.
    pub end_date: NaiveDate,
    /// Pickup time of day.
    #[schema(value_type = Option<String>)]
    pub pickup_time: Option<NaiveTime>,
    /// Return time of day.
    #[schema(value_type = Option<String>)]
    pub return_time: Option<NaiveTime>,
    /// Pickup location.
    pub pickup_location: Option<String>,
    /// Return location.
    pub return_location: Option<String>,
    /// Whether delivery was requested.
    pub delivery_requested: bool,
    /// Delivery address.
    pub delivery_address: Option<String>,
    /// Delivery distance in kilometres (string-encoded).
    pub delivery_distance_km: Option<String>,
    /// Price breakdown fixed at creation.
    pub pricing: PriceBreakdownDto,
    /// Current status.
    pub status: BookingStatus,
    /// Renter's message to the owner.
    pub message: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingDto {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id.into(),
            vehicle_id: b.vehicle_id.into(),
            renter_id: b.renter_id.into(),
            owner_id: b.owner_id.into(),
            start_date: b.start_date,
            end_date: b.end_date,
            pickup_time: b.pickup_time,
            return_time: b.return_time,
            pickup_location: b.pickup_location,
            return_location: b.return_location,
            delivery_requested: b.delivery_requested,
            delivery_address: b.delivery_address,
            delivery_distance_km: b.delivery_distance_km.map(|d| d.to_string()),
            pricing: PriceBreakdownDto::from(&b.pricing),
            status: b.status,
            message: b.message,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

/// Paginated list of bookings.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingListResponse {
    /// Bookings on this page, newest first.
    pub data: Vec<BookingDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn create_request_accepts_flat_window_fields() {
        let raw = serde_json::json!({
            "vehicle_id": Uuid::nil(),
            "start_date": "2025-07-01",
            "end_date": "2025-07-04",
            "pickup_time": "10:00:00",
            "delivery_requested": true,
            "delivery_distance_km": "12.5",
            "message": "hello"
        });
        let Ok(req) = serde_json::from_value::<CreateBookingRequest>(raw) else {
            panic!("request should deserialize");
        };
        let booking_req = BookingRequest::from(req);
        assert_eq!(booking_req.period.return_time, None);
        assert!(booking_req.period.pickup_time.is_some());
        assert!(booking_req.delivery.requested);
        assert_eq!(booking_req.delivery.distance_km, Some(Decimal::new(125, 1)));
        assert_eq!(booking_req.message.as_deref(), Some("hello"));
    }

    #[test]
    fn breakdown_amounts_are_two_place_strings() {
        let breakdown = PriceBreakdown {
            price_per_day: Decimal::new(1999, 2),
            total_days: 7,
            total_price: Decimal::new(14390, 2),
            ..PriceBreakdown::default()
        };
        let dto = PriceBreakdownDto::from(&breakdown);
        assert_eq!(dto.price_per_day, "19.99");
        assert_eq!(dto.total_price, "143.90");
    }
}
