use std::sync::Arc;

use crate::{
    domain::{
        models::{BookingDraft, BookingKind, LineId},
        PlanningError,
    },
    repositories::{BookingRepository, ProjectLineRepository},
};

/// Keeps a project line's derived calendar booking consistent with its
/// assignment.
///
/// A booking exists for a line exactly while the line's assignment is
/// complete (consultant, both planned dates, planned quantity > 0). While
/// the line stays complete the same booking is updated in place; the moment
/// it becomes incomplete the booking is deleted and the back-reference
/// cleared.
pub struct BookingSynchronizer {
    lines: Arc<dyn ProjectLineRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl BookingSynchronizer {
    pub fn new(
        lines: Arc<dyn ProjectLineRepository>,
        bookings: Arc<dyn BookingRepository>,
    ) -> Self {
        Self { lines, bookings }
    }

    /// Re-derives the booking for `line_id` from the persisted row. Safe to
    /// call after any line mutation; a no-op when nothing changed.
    pub async fn sync_line(&self, line_id: LineId) -> Result<(), PlanningError> {
        // Always re-read the stored row; caller state may be stale.
        let view = self.lines.sync_view(line_id).await?;

        let Some((consultant_id, start_date, end_date)) = view.complete_assignment() else {
            if let Some(booking_id) = view.booking_id {
                tracing::debug!(%line_id, %booking_id, "assignment incomplete, removing booking");
                self.bookings.delete_linked(line_id, booking_id).await?;
            }
            return Ok(());
        };

        let draft = BookingDraft {
            consultant_id,
            kind: BookingKind::Booking,
            title: view.booking_title(),
            notes: view.booking_notes(),
            start_date,
            end_date,
        };

        match view.booking_id {
            // Updated in place, so a line keeps a single booking id for as
            // long as it stays assigned.
            Some(booking_id) => self.bookings.update_booking(booking_id, &draft).await?,
            None => {
                let booking_id = self.bookings.create_linked(line_id, &draft).await?;
                tracing::debug!(%line_id, %booking_id, "created booking for line");
            }
        }

        Ok(())
    }
}
