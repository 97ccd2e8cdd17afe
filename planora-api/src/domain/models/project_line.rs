use sqlx::FromRow;
use time::Date;

use super::{ArticleId, BookingId, ConsultantId, LineId, ProjectId};

/// One sold unit of an article within a project, with its planning state.
///
/// The three quantities obey `0 <= realized <= planned <= sold`; the store
/// rejects any write that would break the ordering. `booking_id` is owned by
/// the booking synchronizer and is never written by callers.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ProjectLine {
    pub id: LineId,
    pub project_id: ProjectId,
    pub article_id: ArticleId,
    pub sold_quantity: f64,
    pub amount: f64,
    pub consultant_id: Option<ConsultantId>,
    pub planned_start_date: Option<Date>,
    pub planned_end_date: Option<Date>,
    pub planned_quantity: f64,
    pub realized_quantity: f64,
    pub booking_id: Option<BookingId>,
}

/// Caller-supplied fields for creating a line or overwriting its mutable
/// fields on update.
#[derive(Debug, Clone)]
pub struct ProjectLineDraft {
    pub article_id: ArticleId,
    pub sold_quantity: f64,
    pub amount: f64,
    pub consultant_id: Option<ConsultantId>,
    pub planned_start_date: Option<Date>,
    pub planned_end_date: Option<Date>,
    pub planned_quantity: f64,
    pub realized_quantity: f64,
}

/// Quantities and amounts for carving the unplanned remainder of a line into
/// a new sibling line.
#[derive(Debug, Clone, Copy)]
pub struct LineSplit {
    pub planned_sold: f64,
    pub planned_amount: f64,
    pub remainder_sold: f64,
    pub remainder_amount: f64,
}

/// Read-model row: a line decorated with the display fields the project view
/// joins in. Not part of the write-path invariants.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectLineView {
    pub id: LineId,
    pub project_id: ProjectId,
    pub article_id: ArticleId,
    pub article_name: String,
    pub article_service: String,
    pub sold_quantity: f64,
    pub amount: f64,
    pub consultant_id: Option<ConsultantId>,
    pub consultant_name: Option<String>,
    pub planned_start_date: Option<Date>,
    pub planned_end_date: Option<Date>,
    pub planned_quantity: f64,
    pub realized_quantity: f64,
    pub booking_id: Option<BookingId>,
}

/// The slice of a line the booking synchronizer re-reads before deciding
/// whether a calendar booking should exist, plus the joined names it needs
/// to build a readable booking title.
#[derive(Debug, Clone, FromRow)]
pub struct LineSyncView {
    pub id: LineId,
    pub booking_id: Option<BookingId>,
    pub consultant_id: Option<ConsultantId>,
    pub planned_start_date: Option<Date>,
    pub planned_end_date: Option<Date>,
    pub planned_quantity: f64,
    pub article_name: String,
    pub project_name: String,
    pub client_number: String,
    pub client_name: String,
}

impl LineSyncView {
    /// Consultant and date range, present only when the assignment is
    /// complete: consultant, both dates, and a positive planned quantity.
    pub fn complete_assignment(&self) -> Option<(ConsultantId, Date, Date)> {
        match (
            self.consultant_id,
            self.planned_start_date,
            self.planned_end_date,
        ) {
            (Some(consultant), Some(start), Some(end)) if self.planned_quantity > 0.0 => {
                Some((consultant, start, end))
            }
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete_assignment().is_some()
    }

    pub fn booking_title(&self) -> String {
        format!(
            "{} • {} — {} — {}",
            self.client_number, self.client_name, self.project_name, self.article_name
        )
        .trim()
        .to_string()
    }

    /// Human-readable back-reference to the originating line. Never parsed
    /// back into structured data.
    pub fn booking_notes(&self) -> String {
        format!(
            "Project line: {}\nPlanned quantity: {}",
            self.id, self.planned_quantity
        )
    }
}
