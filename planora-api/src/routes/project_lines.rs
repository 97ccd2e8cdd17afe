use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::Date;
use tracing::instrument;

use crate::{
    app_state::AppState,
    domain::{
        models::{
            date_format, ArticleId, BookingId, ConsultantId, LineId, ProjectId, ProjectLineDraft,
            ProjectLineView,
        },
        quantities,
    },
    routes::ApiError,
};

pub fn project_router() -> Router<AppState> {
    Router::new().route("/:project_id/lines", get(list_lines).post(create_line))
}

pub fn line_router() -> Router<AppState> {
    Router::new()
        .route("/:line_id", put(update_line).delete(delete_line))
        .route("/:line_id/report-remainder", post(report_remainder))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLinePayload {
    article_id: ArticleId,
    sold_quantity: f64,
    amount: f64,
    #[serde(default)]
    consultant_id: Option<ConsultantId>,
    #[serde(default, with = "date_format::option")]
    planned_start_date: Option<Date>,
    #[serde(default, with = "date_format::option")]
    planned_end_date: Option<Date>,
    #[serde(default)]
    planned_quantity: f64,
    #[serde(default)]
    realized_quantity: f64,
}

impl From<ProjectLinePayload> for ProjectLineDraft {
    fn from(payload: ProjectLinePayload) -> Self {
        Self {
            article_id: payload.article_id,
            sold_quantity: payload.sold_quantity,
            amount: payload.amount,
            consultant_id: payload.consultant_id,
            planned_start_date: payload.planned_start_date,
            planned_end_date: payload.planned_end_date,
            planned_quantity: payload.planned_quantity,
            realized_quantity: payload.realized_quantity,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLineResponse {
    id: LineId,
    project_id: ProjectId,
    article_id: ArticleId,
    article_name: String,
    article_service: String,
    sold_quantity: f64,
    amount: f64,
    consultant_id: Option<ConsultantId>,
    consultant_name: Option<String>,
    #[serde(with = "date_format::option")]
    planned_start_date: Option<Date>,
    #[serde(with = "date_format::option")]
    planned_end_date: Option<Date>,
    planned_quantity: f64,
    realized_quantity: f64,
    remaining_quantity: f64,
    booking_id: Option<BookingId>,
}

impl From<ProjectLineView> for ProjectLineResponse {
    fn from(view: ProjectLineView) -> Self {
        let remaining_quantity = quantities::remaining(view.sold_quantity, view.planned_quantity);
        Self {
            id: view.id,
            project_id: view.project_id,
            article_id: view.article_id,
            article_name: view.article_name,
            article_service: view.article_service,
            sold_quantity: view.sold_quantity,
            amount: view.amount,
            consultant_id: view.consultant_id,
            consultant_name: view.consultant_name,
            planned_start_date: view.planned_start_date,
            planned_end_date: view.planned_end_date,
            planned_quantity: view.planned_quantity,
            realized_quantity: view.realized_quantity,
            remaining_quantity,
            booking_id: view.booking_id,
        }
    }
}

#[instrument(name = "list_lines", skip(app_state))]
async fn list_lines(
    State(app_state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<Vec<ProjectLineResponse>>, ApiError> {
    let lines = app_state
        .line_planner
        .list_lines(app_state.organization, project_id)
        .await?;

    Ok(Json(lines.into_iter().map(Into::into).collect()))
}

#[instrument(name = "create_line", skip(app_state))]
async fn create_line(
    State(app_state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Json(payload): Json<ProjectLinePayload>,
) -> Result<StatusCode, ApiError> {
    app_state
        .line_planner
        .create_line(app_state.organization, project_id, &payload.into())
        .await?;

    Ok(StatusCode::CREATED)
}

#[instrument(name = "update_line", skip(app_state))]
async fn update_line(
    State(app_state): State<AppState>,
    Path(line_id): Path<LineId>,
    Json(payload): Json<ProjectLinePayload>,
) -> Result<StatusCode, ApiError> {
    app_state
        .line_planner
        .update_line(line_id, &payload.into())
        .await?;

    Ok(StatusCode::OK)
}

#[instrument(name = "delete_line", skip(app_state))]
async fn delete_line(
    State(app_state): State<AppState>,
    Path(line_id): Path<LineId>,
) -> Result<StatusCode, ApiError> {
    app_state.line_planner.delete_line(line_id).await?;

    Ok(StatusCode::OK)
}

#[instrument(name = "report_remainder", skip(app_state))]
async fn report_remainder(
    State(app_state): State<AppState>,
    Path(line_id): Path<LineId>,
) -> Result<StatusCode, ApiError> {
    app_state.line_planner.report_remainder(line_id).await?;

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use uuid::Uuid;

    #[test]
    fn line_response_serializes_iso_dates_and_remaining_quantity() {
        let view = ProjectLineView {
            id: LineId::new(Uuid::new_v4()),
            project_id: ProjectId::new(Uuid::new_v4()),
            article_id: ArticleId::new(Uuid::new_v4()),
            article_name: "Integration workshop".to_string(),
            article_service: "SIRH".to_string(),
            sold_quantity: 10.0,
            amount: 1000.0,
            consultant_id: None,
            consultant_name: None,
            planned_start_date: Some(date!(2025 - 06 - 01)),
            planned_end_date: None,
            planned_quantity: 4.0,
            realized_quantity: 0.0,
            booking_id: None,
        };

        let json = serde_json::to_value(ProjectLineResponse::from(view)).unwrap();

        assert_eq!(json["plannedStartDate"], "2025-06-01");
        assert_eq!(json["plannedEndDate"], serde_json::Value::Null);
        assert_eq!(json["remainingQuantity"], 6.0);
        assert_eq!(json["articleService"], "SIRH");
    }

    #[test]
    fn line_payload_accepts_missing_optional_fields() {
        let payload: ProjectLinePayload = serde_json::from_value(serde_json::json!({
            "articleId": Uuid::new_v4(),
            "soldQuantity": 10.0,
            "amount": 1000.0,
        }))
        .unwrap();

        let draft = ProjectLineDraft::from(payload);
        assert_eq!(draft.consultant_id, None);
        assert_eq!(draft.planned_start_date, None);
        assert_eq!(draft.planned_quantity, 0.0);
        assert_eq!(draft.realized_quantity, 0.0);
    }

    #[test]
    fn line_payload_parses_iso_dates() {
        let payload: ProjectLinePayload = serde_json::from_value(serde_json::json!({
            "articleId": Uuid::new_v4(),
            "soldQuantity": 10.0,
            "amount": 1000.0,
            "plannedStartDate": "2025-06-01",
            "plannedEndDate": "2025-06-05",
            "plannedQuantity": 4.0,
        }))
        .unwrap();

        assert_eq!(payload.planned_start_date, Some(date!(2025 - 06 - 01)));
        assert_eq!(payload.planned_end_date, Some(date!(2025 - 06 - 05)));
    }
}
