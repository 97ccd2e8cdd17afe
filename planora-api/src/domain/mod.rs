mod error;
pub mod models;
pub mod quantities;
pub mod services;

pub use error::PlanningError;
