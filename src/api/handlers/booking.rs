//! Booking handlers: create, quote, get, status change, and listings.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::{
    BookingDto, BookingListResponse, CreateBookingRequest, PaginationParams, PriceBreakdownDto,
    QuoteRequest, UpdateStatusRequest,
};
use crate::api::extract::Actor;
use crate::app_state::AppState;
use crate::domain::{Booking, BookingId, BookingStatus, VehicleId};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /bookings` — Request a vehicle.
///
/// # Errors
///
/// Returns [`GatewayError`] on validation failure or unknown vehicle.
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    summary = "Create a booking",
    description = "Creates a pending booking for the calling user. The full price breakdown is computed once and stored with the booking.",
    request_body = CreateBookingRequest,
    params(("X-User-Id" = Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 201, description = "Booking created", body = BookingDto),
        (status = 400, description = "Invalid request or validation failure", body = ErrorResponse),
        (status = 401, description = "Missing user id", body = ErrorResponse),
        (status = 404, description = "Vehicle not found", body = ErrorResponse),
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Actor(renter_id): Actor,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let booking = state
        .booking_service
        .create_booking(renter_id, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(BookingDto::from(booking))))
}

/// `POST /bookings/quote` — Price a rental without booking it.
///
/// # Errors
///
/// Returns [`GatewayError`] on validation failure or unknown vehicle.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/quote",
    tag = "Bookings",
    summary = "Quote a rental",
    description = "Computes the price breakdown a booking with these parameters would receive. Nothing is stored.",
    request_body = QuoteRequest,
    params(("X-User-Id" = Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 200, description = "Price breakdown", body = PriceBreakdownDto),
        (status = 400, description = "Validation failure", body = ErrorResponse),
        (status = 401, description = "Missing user id", body = ErrorResponse),
        (status = 404, description = "Vehicle not found", body = ErrorResponse),
    )
)]
pub async fn quote_booking(
    State(state): State<AppState>,
    Actor(_caller): Actor,
    Json(req): Json<QuoteRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let vehicle_id = VehicleId::from_uuid(req.vehicle_id);
    let (period, delivery) = req.window.into_parts();
    let breakdown = state
        .booking_service
        .quote(vehicle_id, &period, &delivery)
        .await?;
    Ok(Json(PriceBreakdownDto::from(&breakdown)))
}

/// `GET /bookings/:id` — Get a booking the caller is party to.
///
/// # Errors
///
/// Returns [`GatewayError::BookingNotFound`] or [`GatewayError::Forbidden`].
#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    summary = "Get booking",
    description = "Returns a booking. Only its owner and renter may read it.",
    params(
        ("id" = Uuid, Path, description = "Booking UUID"),
        ("X-User-Id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Booking", body = BookingDto),
        (status = 401, description = "Missing user id", body = ErrorResponse),
        (status = 403, description = "Caller is not a party", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let booking = state
        .booking_queries
        .get_by_id(BookingId::from_uuid(id))
        .await?;
    if !booking.is_party(user_id) {
        return Err(GatewayError::Forbidden);
    }
    Ok(Json(BookingDto::from(booking)))
}

/// `PATCH /bookings/:id/status` — Accept, reject, cancel or complete.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidTransition`] when the state machine
/// refuses, [`GatewayError::Conflict`] on a lost race.
#[utoipa::path(
    patch,
    path = "/api/v1/bookings/{id}/status",
    tag = "Bookings",
    summary = "Change booking status",
    description = "Owners accept or reject pending bookings and complete accepted ones. Either party may cancel an accepted booking.",
    request_body = UpdateStatusRequest,
    params(
        ("id" = Uuid, Path, description = "Booking UUID"),
        ("X-User-Id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Updated booking", body = BookingDto),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 401, description = "Missing user id", body = ErrorResponse),
        (status = 403, description = "Caller is not a party", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
        (status = 409, description = "Concurrent modification", body = ErrorResponse),
        (status = 422, description = "Transition not allowed", body = ErrorResponse),
    )
)]
pub async fn update_booking_status(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let requested: BookingStatus = req.status.trim().parse()?;
    let booking = state
        .booking_service
        .update_status(actor_id, BookingId::from_uuid(id), requested)
        .await?;
    Ok(Json(BookingDto::from(booking)))
}

/// `GET /me/bookings` — Bookings the caller requested.
///
/// # Errors
///
/// Returns [`GatewayError`] on storage failures.
#[utoipa::path(
    get,
    path = "/api/v1/me/bookings",
    tag = "Bookings",
    summary = "List my bookings",
    description = "Returns the caller's bookings as renter, newest first.",
    params(
        PaginationParams,
        ("X-User-Id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Paginated bookings", body = BookingListResponse),
        (status = 401, description = "Missing user id", body = ErrorResponse),
    )
)]
pub async fn list_my_bookings(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let bookings = state.booking_queries.list_for_renter(user_id).await?;
    Ok(Json(to_page(bookings, params)))
}

/// `GET /me/booking-requests` — Pending requests on the caller's vehicles.
///
/// # Errors
///
/// Returns [`GatewayError`] on storage failures.
#[utoipa::path(
    get,
    path = "/api/v1/me/booking-requests",
    tag = "Bookings",
    summary = "List incoming booking requests",
    description = "Returns pending bookings on vehicles the caller owns, newest first.",
    params(
        PaginationParams,
        ("X-User-Id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Paginated bookings", body = BookingListResponse),
        (status = 401, description = "Missing user id", body = ErrorResponse),
    )
)]
pub async fn list_booking_requests(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let bookings = state.booking_queries.list_pending_for_owner(user_id).await?;
    Ok(Json(to_page(bookings, params)))
}

fn to_page(bookings: Vec<Booking>, params: PaginationParams) -> BookingListResponse {
    let (page, pagination) = params.paginate(bookings);
    BookingListResponse {
        data: page.into_iter().map(BookingDto::from).collect(),
        pagination,
    }
}

/// Booking routes, relative to `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/quote", post(quote_booking))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/status", patch(update_booking_status))
        .route("/me/bookings", get(list_my_bookings))
        .route("/me/booking-requests", get(list_booking_requests))
}
