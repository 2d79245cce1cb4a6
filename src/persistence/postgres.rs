//! PostgreSQL implementations of the persistence boundary.
//!
//! Schema lives in `migrations/`. Booking ids are generated by the
//! database (`gen_random_uuid()`); status changes use a conditional
//! `UPDATE .. WHERE status = $expected` so concurrent writers cannot both
//! succeed.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{BookingStore, VehicleProvider};
use crate::config::ServiceConfig;
use crate::domain::{
    Booking, BookingFilter, BookingId, BookingStatus, NewBooking, PriceBreakdown, UserId,
    VehicleId, VehicleRateInfo,
};
use crate::error::GatewayError;

/// Opens the connection pool and applies pending migrations.
///
/// # Errors
///
/// Returns [`GatewayError::PersistenceError`] if the database is
/// unreachable or a migration fails.
pub async fn connect(config: &ServiceConfig) -> Result<PgPool, GatewayError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await
        .map_err(db_error)?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(format!("migration failed: {e}")))?;

    tracing::info!(
        max_connections = config.database_max_connections,
        "database pool ready"
    );
    Ok(pool)
}

fn db_error(e: sqlx::Error) -> GatewayError {
    GatewayError::PersistenceError(e.to_string())
}

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: uuid::Uuid,
    vehicle_id: uuid::Uuid,
    renter_id: uuid::Uuid,
    owner_id: uuid::Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    total_days: i32,
    pickup_time: Option<NaiveTime>,
    return_time: Option<NaiveTime>,
    pickup_location: Option<String>,
    return_location: Option<String>,
    delivery_requested: bool,
    delivery_address: Option<String>,
    delivery_distance_km: Option<Decimal>,
    price_per_day: Decimal,
    base_price: Decimal,
    discount_amount: Decimal,
    cleaning_fee: Decimal,
    delivery_fee: Decimal,
    service_fee: Decimal,
    subtotal: Decimal,
    taxes: Decimal,
    total_price: Decimal,
    status: String,
    message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = GatewayError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let total_days = u32::try_from(row.total_days).map_err(|_| {
            GatewayError::PersistenceError(format!(
                "booking {} has invalid total_days {}",
                row.id, row.total_days
            ))
        })?;
        let status = row.status.parse::<BookingStatus>().map_err(|_| {
            GatewayError::PersistenceError(format!(
                "booking {} has unknown status {}",
                row.id, row.status
            ))
        })?;
        Ok(Self {
            id: BookingId::from_uuid(row.id),
            vehicle_id: VehicleId::from_uuid(row.vehicle_id),
            renter_id: UserId::from_uuid(row.renter_id),
            owner_id: UserId::from_uuid(row.owner_id),
            start_date: row.start_date,
            end_date: row.end_date,
            pickup_time: row.pickup_time,
            return_time: row.return_time,
            pickup_location: row.pickup_location,
            return_location: row.return_location,
            delivery_requested: row.delivery_requested,
            delivery_address: row.delivery_address,
            delivery_distance_km: row.delivery_distance_km,
            pricing: PriceBreakdown {
                price_per_day: row.price_per_day,
                total_days,
                base_price: row.base_price,
                discount_amount: row.discount_amount,
                cleaning_fee: row.cleaning_fee,
                delivery_fee: row.delivery_fee,
                service_fee: row.service_fee,
                subtotal: row.subtotal,
                taxes: row.taxes,
                total_price: row.total_price,
            },
            status,
            message: row.message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Booking store backed by the `bookings` table.
#[derive(Debug, Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    /// Creates a store on an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking, GatewayError> {
        let total_days = i32::try_from(booking.pricing.total_days)
            .map_err(|_| GatewayError::InvalidRequest("rental period too long".to_string()))?;
        let row = sqlx::query_as::<_, BookingRow>(
            r"
            INSERT INTO bookings (
                vehicle_id, renter_id, owner_id, start_date, end_date, total_days,
                pickup_time, return_time, pickup_location, return_location,
                delivery_requested, delivery_address, delivery_distance_km,
                price_per_day, base_price, discount_amount, cleaning_fee, delivery_fee,
                service_fee, subtotal, taxes, total_price,
                status, message, created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $25
            )
            RETURNING *
            ",
        )
        .bind(*booking.vehicle_id.as_uuid())
        .bind(*booking.renter_id.as_uuid())
        .bind(*booking.owner_id.as_uuid())
        .bind(booking.period.start_date)
        .bind(booking.period.end_date)
        .bind(total_days)
        .bind(booking.period.pickup_time)
        .bind(booking.period.return_time)
        .bind(booking.pickup_location)
        .bind(booking.return_location)
        .bind(booking.delivery.requested)
        .bind(booking.delivery.address)
        .bind(booking.delivery.distance_km)
        .bind(booking.pricing.price_per_day)
        .bind(booking.pricing.base_price)
        .bind(booking.pricing.discount_amount)
        .bind(booking.pricing.cleaning_fee)
        .bind(booking.pricing.delivery_fee)
        .bind(booking.pricing.service_fee)
        .bind(booking.pricing.subtotal)
        .bind(booking.pricing.taxes)
        .bind(booking.pricing.total_price)
        .bind(BookingStatus::Pending.as_str())
        .bind(booking.message)
        .bind(booking.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Booking::try_from(row)
    }

    async fn get_booking(&self, id: BookingId) -> Result<Booking, GatewayError> {
        let row = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(GatewayError::BookingNotFound(*id.as_uuid()))?;
        Booking::try_from(row)
    }

    async fn update_booking_status(
        &self,
        id: BookingId,
        expected: BookingStatus,
        new_status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Booking, GatewayError> {
        let updated = sqlx::query_as::<_, BookingRow>(
            r"
            UPDATE bookings
            SET status = $3, updated_at = $4
            WHERE id = $1 AND status = $2
            RETURNING *
            ",
        )
        .bind(*id.as_uuid())
        .bind(expected.as_str())
        .bind(new_status.as_str())
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        if let Some(row) = updated {
            return Booking::try_from(row);
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM bookings WHERE id = $1)")
                .bind(*id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;
        if exists {
            Err(GatewayError::Conflict(*id.as_uuid()))
        } else {
            Err(GatewayError::BookingNotFound(*id.as_uuid()))
        }
    }

    async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<Booking>, GatewayError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r"
            SELECT * FROM bookings
            WHERE ($1::uuid IS NULL OR renter_id = $1)
              AND ($2::uuid IS NULL OR owner_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY created_at DESC, id
            ",
        )
        .bind(filter.renter_id.map(uuid::Uuid::from))
        .bind(filter.owner_id.map(uuid::Uuid::from))
        .bind(filter.status.map(BookingStatus::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(Booking::try_from).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    id: uuid::Uuid,
    owner_id: uuid::Uuid,
    price_per_day: Decimal,
    weekly_discount_percent: Option<Decimal>,
    monthly_discount_percent: Option<Decimal>,
    cleaning_fee: Option<Decimal>,
    delivery_available: bool,
    delivery_fee_per_km: Option<Decimal>,
    delivery_radius_km: Option<Decimal>,
}

impl From<VehicleRow> for VehicleRateInfo {
    fn from(row: VehicleRow) -> Self {
        Self {
            vehicle_id: VehicleId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            price_per_day: row.price_per_day,
            weekly_discount_percent: row.weekly_discount_percent,
            monthly_discount_percent: row.monthly_discount_percent,
            cleaning_fee: row.cleaning_fee,
            delivery_available: row.delivery_available,
            delivery_fee_per_km: row.delivery_fee_per_km,
            delivery_radius_km: row.delivery_radius_km,
        }
    }
}

/// Vehicle provider reading the `vehicles` table.
#[derive(Debug, Clone)]
pub struct PgVehicleProvider {
    pool: PgPool,
}

impl PgVehicleProvider {
    /// Creates a provider on an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleProvider for PgVehicleProvider {
    async fn get_vehicle_rate_info(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<VehicleRateInfo, GatewayError> {
        sqlx::query_as::<_, VehicleRow>(
            r"
            SELECT id, owner_id, price_per_day, weekly_discount_percent,
                   monthly_discount_percent, cleaning_fee, delivery_available,
                   delivery_fee_per_km, delivery_radius_km
            FROM vehicles
            WHERE id = $1
            ",
        )
        .bind(*vehicle_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(VehicleRateInfo::from)
        .ok_or(GatewayError::VehicleNotFound(*vehicle_id.as_uuid()))
    }
}
