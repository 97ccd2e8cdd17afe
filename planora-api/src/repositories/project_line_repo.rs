use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_error::RepositoryError;
use crate::domain::models::{
    BookingId, LineId, LineSplit, LineSyncView, OrganizationId, ProjectId, ProjectLine,
    ProjectLineDraft, ProjectLineView,
};

/// Persistence for project lines. Multi-step writes (split, cascade delete)
/// run inside a single transaction so a failure leaves no half-applied rows.
#[async_trait]
pub trait ProjectLineRepository: Send + Sync {
    /// Lines of a project in creation order, decorated with display fields.
    async fn list(
        &self,
        organization: OrganizationId,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectLineView>, RepositoryError>;
    async fn get(&self, line_id: LineId) -> Result<ProjectLine, RepositoryError>;
    /// Inserts a new line with no linked booking. Verifies the project
    /// belongs to the organization.
    async fn insert(
        &self,
        organization: OrganizationId,
        project_id: ProjectId,
        draft: &ProjectLineDraft,
    ) -> Result<LineId, RepositoryError>;
    /// Overwrites all mutable fields. `booking_id` is left untouched.
    async fn update(&self, line_id: LineId, draft: &ProjectLineDraft)
        -> Result<(), RepositoryError>;
    /// Shrinks the line to its planned slice and inserts an unplanned
    /// sibling carrying the remainder, atomically. Returns the sibling id.
    async fn split(&self, line_id: LineId, split: &LineSplit) -> Result<LineId, RepositoryError>;
    /// Deletes the line, removing its linked booking first.
    async fn delete(&self, line_id: LineId) -> Result<(), RepositoryError>;
    /// Fresh row state for the booking synchronizer.
    async fn sync_view(&self, line_id: LineId) -> Result<LineSyncView, RepositoryError>;
}

pub struct ProjectLineRepositoryImpl {
    pool: PgPool,
}

impl ProjectLineRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectLineRepository for ProjectLineRepositoryImpl {
    async fn list(
        &self,
        organization: OrganizationId,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectLineView>, RepositoryError> {
        let lines = sqlx::query_as::<_, ProjectLineView>(
            r#"
            SELECT l.id, l.project_id, l.article_id,
                   a.name AS article_name, a.service AS article_service,
                   l.sold_quantity, l.amount,
                   l.consultant_id, co.name AS consultant_name,
                   l.planned_start_date, l.planned_end_date,
                   l.planned_quantity, l.realized_quantity, l.booking_id
            FROM project_lines l
            JOIN projects p ON p.id = l.project_id AND p.organization_id = $1
            JOIN articles a ON a.id = l.article_id
            LEFT JOIN consultants co ON co.id = l.consultant_id
            WHERE l.project_id = $2
            ORDER BY l.created_at
            "#,
        )
        .bind(organization)
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    async fn get(&self, line_id: LineId) -> Result<ProjectLine, RepositoryError> {
        let line = sqlx::query_as::<_, ProjectLine>(
            r#"
            SELECT id, project_id, article_id, sold_quantity, amount, consultant_id,
                   planned_start_date, planned_end_date, planned_quantity,
                   realized_quantity, booking_id
            FROM project_lines
            WHERE id = $1
            "#,
        )
        .bind(line_id)
        .fetch_optional(&self.pool)
        .await?;

        line.ok_or_else(|| RepositoryError::NotFound(format!("project line {}", line_id)))
    }

    async fn insert(
        &self,
        organization: OrganizationId,
        project_id: ProjectId,
        draft: &ProjectLineDraft,
    ) -> Result<LineId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let project_in_org = sqlx::query_scalar::<_, i32>(
            "SELECT 1 FROM projects WHERE id = $1 AND organization_id = $2",
        )
        .bind(project_id)
        .bind(organization)
        .fetch_optional(&mut *tx)
        .await?;
        if project_in_org.is_none() {
            return Err(RepositoryError::NotFound(format!("project {}", project_id)));
        }

        let id = sqlx::query_scalar::<_, LineId>(
            r#"
            INSERT INTO project_lines
                (project_id, article_id, sold_quantity, amount, consultant_id,
                 planned_start_date, planned_end_date, planned_quantity, realized_quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(project_id)
        .bind(draft.article_id)
        .bind(draft.sold_quantity)
        .bind(draft.amount)
        .bind(draft.consultant_id)
        .bind(draft.planned_start_date)
        .bind(draft.planned_end_date)
        .bind(draft.planned_quantity)
        .bind(draft.realized_quantity)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(id)
    }

    async fn update(
        &self,
        line_id: LineId,
        draft: &ProjectLineDraft,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE project_lines
            SET article_id = $2, sold_quantity = $3, amount = $4, consultant_id = $5,
                planned_start_date = $6, planned_end_date = $7,
                planned_quantity = $8, realized_quantity = $9, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(line_id)
        .bind(draft.article_id)
        .bind(draft.sold_quantity)
        .bind(draft.amount)
        .bind(draft.consultant_id)
        .bind(draft.planned_start_date)
        .bind(draft.planned_end_date)
        .bind(draft.planned_quantity)
        .bind(draft.realized_quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("project line {}", line_id)));
        }

        Ok(())
    }

    async fn split(&self, line_id: LineId, split: &LineSplit) -> Result<LineId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let shrunk = sqlx::query(
            "UPDATE project_lines SET sold_quantity = $2, amount = $3, updated_at = now() WHERE id = $1",
        )
        .bind(line_id)
        .bind(split.planned_sold)
        .bind(split.planned_amount)
        .execute(&mut *tx)
        .await?;
        if shrunk.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("project line {}", line_id)));
        }

        // The sibling starts unplanned and unassigned, in the same project
        // and on the same article.
        let sibling = sqlx::query_scalar::<_, LineId>(
            r#"
            INSERT INTO project_lines
                (project_id, article_id, sold_quantity, amount, consultant_id,
                 planned_start_date, planned_end_date, planned_quantity, realized_quantity)
            SELECT project_id, article_id, $2, $3, NULL, NULL, NULL, 0, 0
            FROM project_lines
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(line_id)
        .bind(split.remainder_sold)
        .bind(split.remainder_amount)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(sibling)
    }

    async fn delete(&self, line_id: LineId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let booking_id = sqlx::query_scalar::<_, Option<BookingId>>(
            "SELECT booking_id FROM project_lines WHERE id = $1",
        )
        .bind(line_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("project line {}", line_id)))?;

        // Booking first; its foreign key clears the line's back-reference.
        if let Some(booking_id) = booking_id {
            sqlx::query("DELETE FROM consultant_bookings WHERE id = $1")
                .bind(booking_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM project_lines WHERE id = $1")
            .bind(line_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn sync_view(&self, line_id: LineId) -> Result<LineSyncView, RepositoryError> {
        let view = sqlx::query_as::<_, LineSyncView>(
            r#"
            SELECT l.id, l.booking_id, l.consultant_id,
                   l.planned_start_date, l.planned_end_date, l.planned_quantity,
                   a.name AS article_name, p.name AS project_name,
                   c.client_number, c.name AS client_name
            FROM project_lines l
            JOIN articles a ON a.id = l.article_id
            JOIN projects p ON p.id = l.project_id
            JOIN clients c ON c.id = p.client_id
            WHERE l.id = $1
            "#,
        )
        .bind(line_id)
        .fetch_optional(&self.pool)
        .await?;

        view.ok_or_else(|| RepositoryError::NotFound(format!("project line {}", line_id)))
    }
}
