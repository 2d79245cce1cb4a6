//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::handlers::{booking, system};

/// Generated OpenAPI description of every endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "rental-gateway",
        description = "Booking lifecycle and pricing for a peer-to-peer vehicle rental marketplace."
    ),
    paths(
        booking::create_booking,
        booking::quote_booking,
        booking::get_booking,
        booking::update_booking_status,
        booking::list_my_bookings,
        booking::list_booking_requests,
        system::health_handler,
    ),
    tags(
        (name = "Bookings", description = "Booking lifecycle"),
        (name = "System", description = "Operational endpoints"),
    )
)]
pub struct ApiDoc;
