use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::Date;

use super::{BookingId, ConsultantId};

/// A calendar reservation for a consultant.
///
/// Bookings derived from a project line always have `kind = Booking` and are
/// owned by the synchronizer; `TimeOff` entries are authored directly from
/// the planning view.
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: BookingId,
    pub consultant_id: ConsultantId,
    pub kind: BookingKind,
    pub title: String,
    pub notes: String,
    pub start_date: Date,
    pub end_date: Date,
}

/// Fields for inserting or overwriting a booking.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub consultant_id: ConsultantId,
    pub kind: BookingKind,
    pub title: String,
    pub notes: String,
    pub start_date: Date,
    pub end_date: Date,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BookingKind {
    #[default]
    Booking,
    TimeOff,
}
