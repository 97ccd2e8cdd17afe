use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    config::Settings,
    domain::{
        models::OrganizationId,
        services::{LinePlanningService, PlanningService},
    },
    repositories::{
        BookingRepository, BookingRepositoryImpl, ProjectLineRepository, ProjectLineRepositoryImpl,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub organization: OrganizationId,
    pub line_planner: Arc<LinePlanningService>,
    pub planning: Arc<PlanningService>,
}

impl AppState {
    pub fn new(db_pool: PgPool, settings: &Settings) -> Self {
        let lines: Arc<dyn ProjectLineRepository> =
            Arc::new(ProjectLineRepositoryImpl::new(db_pool.clone()));
        let bookings: Arc<dyn BookingRepository> = Arc::new(BookingRepositoryImpl::new(db_pool));

        Self {
            organization: OrganizationId::new(settings.application.organization_id),
            line_planner: Arc::new(LinePlanningService::new(lines, bookings.clone())),
            planning: Arc::new(PlanningService::new(bookings)),
        }
    }
}
