use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use zurusasa_core::{Booking, SessionContext};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", get(list_bookings))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
        .route("/v1/bookings/{id}/approve", post(approve_booking))
        .route("/v1/bookings/{id}/decline", post(decline_booking))
        .route("/v1/bookings/{id}/complete", post(complete_booking))
}

/// GET /v1/bookings
/// The signed-in guest's bookings, newest first
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state.booking_manager().list_for_guest(&session).await?;
    Ok(Json(bookings))
}

/// POST /v1/bookings/{id}/cancel
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.booking_manager().cancel(&session, id).await?))
}

/// POST /v1/bookings/{id}/approve
pub async fn approve_booking(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.booking_manager().approve(&session, id).await?))
}

/// POST /v1/bookings/{id}/decline
pub async fn decline_booking(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.booking_manager().decline(&session, id).await?))
}

/// POST /v1/bookings/{id}/complete
pub async fn complete_booking(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.booking_manager().complete(&session, id).await?))
}
