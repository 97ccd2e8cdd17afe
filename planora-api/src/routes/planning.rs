use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::Date;
use tracing::instrument;

use crate::{
    app_state::AppState,
    domain::models::{date_format, Booking, BookingDraft, BookingId, BookingKind, ConsultantId},
    routes::ApiError,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings).post(create_item))
        .route("/:booking_id", delete(delete_item))
}

fn parse_date(s: &str) -> Result<Date, ApiError> {
    Date::parse(s, date_format::ISO_DATE)
        .map_err(|_| ApiError::bad_request(format!("could not parse date: {}", s)))
}

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    from: String,
    to: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    id: BookingId,
    consultant_id: ConsultantId,
    kind: BookingKind,
    title: String,
    notes: String,
    #[serde(with = "date_format")]
    start_date: Date,
    #[serde(with = "date_format")]
    end_date: Date,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            consultant_id: booking.consultant_id,
            kind: booking.kind,
            title: booking.title,
            notes: booking.notes,
            start_date: booking.start_date,
            end_date: booking.end_date,
        }
    }
}

#[instrument(name = "list_bookings", skip(app_state))]
async fn list_bookings(
    State(app_state): State<AppState>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let from = parse_date(&range.from)?;
    let to = parse_date(&range.to)?;

    let bookings = app_state
        .planning
        .bookings_in_range(app_state.organization, from, to)
        .await?;

    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningItemPayload {
    consultant_id: ConsultantId,
    #[serde(default)]
    kind: BookingKind,
    title: String,
    #[serde(default)]
    notes: String,
    #[serde(with = "date_format")]
    start_date: Date,
    #[serde(with = "date_format")]
    end_date: Date,
}

#[instrument(name = "create_planning_item", skip(app_state))]
async fn create_item(
    State(app_state): State<AppState>,
    Json(payload): Json<PlanningItemPayload>,
) -> Result<StatusCode, ApiError> {
    let draft = BookingDraft {
        consultant_id: payload.consultant_id,
        kind: payload.kind,
        title: payload.title,
        notes: payload.notes,
        start_date: payload.start_date,
        end_date: payload.end_date,
    };

    app_state.planning.create_item(&draft).await?;

    Ok(StatusCode::CREATED)
}

#[instrument(name = "delete_planning_item", skip(app_state))]
async fn delete_item(
    State(app_state): State<AppState>,
    Path(booking_id): Path<BookingId>,
) -> Result<StatusCode, ApiError> {
    app_state.planning.delete_item(booking_id).await?;

    Ok(StatusCode::OK)
}
