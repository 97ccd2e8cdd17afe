mod booking;
pub mod date_format;
mod ids;
mod project_line;

pub use booking::*;
pub use ids::*;
pub use project_line::*;
