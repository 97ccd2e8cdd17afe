mod booking_sync;
mod line_planning;
mod planning;

pub use booking_sync::BookingSynchronizer;
pub use line_planning::LinePlanningService;
pub use planning::PlanningService;
