use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::Date;

use super::repo_error::RepositoryError;
use crate::domain::models::{
    Booking, BookingDraft, BookingId, BookingKind, ConsultantId, LineId, OrganizationId,
};

/// Persistence for consultant bookings, including the writes that keep a
/// project line's `booking_id` back-reference in step with the booking row.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Bookings whose inclusive `[start_date, end_date]` intersects the
    /// query range, ordered by start date.
    async fn list_in_range(
        &self,
        organization: OrganizationId,
        from: Date,
        to: Date,
    ) -> Result<Vec<Booking>, RepositoryError>;
    /// Inserts a free-standing booking (manual planning item).
    async fn create_booking(&self, draft: &BookingDraft) -> Result<BookingId, RepositoryError>;
    /// Inserts a booking and writes its id onto the line, atomically.
    async fn create_linked(
        &self,
        line_id: LineId,
        draft: &BookingDraft,
    ) -> Result<BookingId, RepositoryError>;
    /// Overwrites an existing booking in place.
    async fn update_booking(
        &self,
        booking_id: BookingId,
        draft: &BookingDraft,
    ) -> Result<(), RepositoryError>;
    /// Clears the line's back-reference and deletes the booking, atomically.
    async fn delete_linked(
        &self,
        line_id: LineId,
        booking_id: BookingId,
    ) -> Result<(), RepositoryError>;
    /// Deletes a booking, clearing any line that still references it.
    async fn delete_booking(&self, booking_id: BookingId) -> Result<(), RepositoryError>;
    /// The line holding this booking as its derived state, if any.
    async fn linked_line(&self, booking_id: BookingId) -> Result<Option<LineId>, RepositoryError>;
}

pub struct BookingRepositoryImpl {
    pool: PgPool,
}

impl BookingRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct BookingRow {
    id: BookingId,
    consultant_id: ConsultantId,
    kind: String,
    title: String,
    notes: String,
    start_date: Date,
    end_date: Date,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            consultant_id: row.consultant_id,
            // the kind column is CHECK-constrained to valid values
            kind: row.kind.parse().unwrap_or(BookingKind::Booking),
            title: row.title,
            notes: row.notes,
            start_date: row.start_date,
            end_date: row.end_date,
        }
    }
}

#[async_trait]
impl BookingRepository for BookingRepositoryImpl {
    async fn list_in_range(
        &self,
        organization: OrganizationId,
        from: Date,
        to: Date,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT b.id, b.consultant_id, b.kind, b.title, b.notes, b.start_date, b.end_date
            FROM consultant_bookings b
            JOIN consultants c ON c.id = b.consultant_id AND c.organization_id = $1
            WHERE b.start_date <= $3 AND b.end_date >= $2
            ORDER BY b.start_date
            "#,
        )
        .bind(organization)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_booking(&self, draft: &BookingDraft) -> Result<BookingId, RepositoryError> {
        let id = sqlx::query_scalar::<_, BookingId>(
            r#"
            INSERT INTO consultant_bookings (consultant_id, kind, title, notes, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(draft.consultant_id)
        .bind(draft.kind.to_string())
        .bind(&draft.title)
        .bind(&draft.notes)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn create_linked(
        &self,
        line_id: LineId,
        draft: &BookingDraft,
    ) -> Result<BookingId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, BookingId>(
            r#"
            INSERT INTO consultant_bookings (consultant_id, kind, title, notes, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(draft.consultant_id)
        .bind(draft.kind.to_string())
        .bind(&draft.title)
        .bind(&draft.notes)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .fetch_one(&mut *tx)
        .await?;

        let linked = sqlx::query(
            "UPDATE project_lines SET booking_id = $1, updated_at = now() WHERE id = $2",
        )
        .bind(id)
        .bind(line_id)
        .execute(&mut *tx)
        .await?;
        if linked.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("project line {}", line_id)));
        }

        tx.commit().await?;

        Ok(id)
    }

    async fn update_booking(
        &self,
        booking_id: BookingId,
        draft: &BookingDraft,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE consultant_bookings
            SET consultant_id = $2, kind = $3, title = $4, notes = $5,
                start_date = $6, end_date = $7
            WHERE id = $1
            "#,
        )
        .bind(booking_id)
        .bind(draft.consultant_id)
        .bind(draft.kind.to_string())
        .bind(&draft.title)
        .bind(&draft.notes)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("booking {}", booking_id)));
        }

        Ok(())
    }

    async fn delete_linked(
        &self,
        line_id: LineId,
        booking_id: BookingId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let unlinked = sqlx::query(
            "UPDATE project_lines SET booking_id = NULL, updated_at = now() WHERE id = $1 AND booking_id = $2",
        )
        .bind(line_id)
        .bind(booking_id)
        .execute(&mut *tx)
        .await?;
        if unlinked.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("project line {}", line_id)));
        }

        sqlx::query("DELETE FROM consultant_bookings WHERE id = $1")
            .bind(booking_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn delete_booking(&self, booking_id: BookingId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE project_lines SET booking_id = NULL, updated_at = now() WHERE booking_id = $1")
            .bind(booking_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM consultant_bookings WHERE id = $1")
            .bind(booking_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("booking {}", booking_id)));
        }

        tx.commit().await?;

        Ok(())
    }

    async fn linked_line(&self, booking_id: BookingId) -> Result<Option<LineId>, RepositoryError> {
        let line = sqlx::query_scalar::<_, LineId>(
            "SELECT id FROM project_lines WHERE booking_id = $1",
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(line)
    }
}
