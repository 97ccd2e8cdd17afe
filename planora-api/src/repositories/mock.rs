//! Mock repository implementation for testing.

use async_trait::async_trait;
use itertools::Itertools;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use time::Date;
use uuid::Uuid;

use super::repo_error::RepositoryError;
use super::{BookingRepository, ProjectLineRepository};
use crate::domain::models::{
    ArticleId, Booking, BookingDraft, BookingId, ConsultantId, LineId, LineSplit, LineSyncView,
    OrganizationId, ProjectId, ProjectLine, ProjectLineDraft, ProjectLineView,
};

/// Catalog seed rows for the mock store. The real catalog tables are owned
/// by out-of-scope CRUD; the mock only needs their display fields.
#[derive(Debug, Clone)]
pub struct SeedProject {
    pub id: ProjectId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub client_number: String,
    pub client_name: String,
}

#[derive(Debug, Clone)]
pub struct SeedArticle {
    pub id: ArticleId,
    pub name: String,
    pub service: String,
}

#[derive(Debug, Clone)]
pub struct SeedConsultant {
    pub id: ConsultantId,
    pub organization_id: OrganizationId,
    pub name: String,
}

#[derive(Default)]
struct Inner {
    projects: HashMap<ProjectId, SeedProject>,
    articles: HashMap<ArticleId, SeedArticle>,
    consultants: HashMap<ConsultantId, SeedConsultant>,
    lines: HashMap<LineId, ProjectLine>,
    line_order: Vec<LineId>,
    bookings: HashMap<BookingId, Booking>,
}

/// In-memory implementation of both planning repositories, backed by
/// HashMaps behind a single lock so linked writes stay atomic.
///
/// # Examples
///
/// ```ignore
/// let store = MockPlanningStore::new()
///     .with_project(project)
///     .with_article(article)
///     .with_consultant(consultant);
/// ```
#[derive(Clone, Default)]
pub struct MockPlanningStore {
    inner: Arc<RwLock<Inner>>,
}

#[allow(dead_code)]
impl MockPlanningStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(self, project: SeedProject) -> Self {
        self.inner
            .write()
            .unwrap()
            .projects
            .insert(project.id, project);
        self
    }

    pub fn with_article(self, article: SeedArticle) -> Self {
        self.inner
            .write()
            .unwrap()
            .articles
            .insert(article.id, article);
        self
    }

    pub fn with_consultant(self, consultant: SeedConsultant) -> Self {
        self.inner
            .write()
            .unwrap()
            .consultants
            .insert(consultant.id, consultant);
        self
    }

    /// Current state of a line (for test assertions).
    pub fn line(&self, line_id: LineId) -> Option<ProjectLine> {
        self.inner.read().unwrap().lines.get(&line_id).cloned()
    }

    /// Lines of a project in creation order (for test assertions).
    pub fn lines_for_project(&self, project_id: ProjectId) -> Vec<ProjectLine> {
        let inner = self.inner.read().unwrap();
        inner
            .line_order
            .iter()
            .filter_map(|id| inner.lines.get(id))
            .filter(|line| line.project_id == project_id)
            .cloned()
            .collect()
    }

    pub fn booking(&self, booking_id: BookingId) -> Option<Booking> {
        self.inner.read().unwrap().bookings.get(&booking_id).cloned()
    }

    pub fn booking_count(&self) -> usize {
        self.inner.read().unwrap().bookings.len()
    }

    pub fn line_count(&self) -> usize {
        self.inner.read().unwrap().lines.len()
    }
}

fn build_line(
    id: LineId,
    project_id: ProjectId,
    draft: &ProjectLineDraft,
) -> ProjectLine {
    ProjectLine {
        id,
        project_id,
        article_id: draft.article_id,
        sold_quantity: draft.sold_quantity,
        amount: draft.amount,
        consultant_id: draft.consultant_id,
        planned_start_date: draft.planned_start_date,
        planned_end_date: draft.planned_end_date,
        planned_quantity: draft.planned_quantity,
        realized_quantity: draft.realized_quantity,
        booking_id: None,
    }
}

#[async_trait]
impl ProjectLineRepository for MockPlanningStore {
    async fn list(
        &self,
        organization: OrganizationId,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectLineView>, RepositoryError> {
        let inner = self.inner.read().unwrap();

        let Some(project) = inner.projects.get(&project_id) else {
            return Ok(Vec::new());
        };
        if project.organization_id != organization {
            return Ok(Vec::new());
        }

        let mut views = Vec::new();
        for id in &inner.line_order {
            let Some(line) = inner.lines.get(id) else {
                continue;
            };
            if line.project_id != project_id {
                continue;
            }
            let article = inner
                .articles
                .get(&line.article_id)
                .ok_or_else(|| RepositoryError::NotFound(format!("article {}", line.article_id)))?;
            let consultant_name = line
                .consultant_id
                .and_then(|id| inner.consultants.get(&id))
                .map(|c| c.name.clone());
            views.push(ProjectLineView {
                id: line.id,
                project_id: line.project_id,
                article_id: line.article_id,
                article_name: article.name.clone(),
                article_service: article.service.clone(),
                sold_quantity: line.sold_quantity,
                amount: line.amount,
                consultant_id: line.consultant_id,
                consultant_name,
                planned_start_date: line.planned_start_date,
                planned_end_date: line.planned_end_date,
                planned_quantity: line.planned_quantity,
                realized_quantity: line.realized_quantity,
                booking_id: line.booking_id,
            });
        }

        Ok(views)
    }

    async fn get(&self, line_id: LineId) -> Result<ProjectLine, RepositoryError> {
        self.line(line_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("project line {}", line_id)))
    }

    async fn insert(
        &self,
        organization: OrganizationId,
        project_id: ProjectId,
        draft: &ProjectLineDraft,
    ) -> Result<LineId, RepositoryError> {
        let mut inner = self.inner.write().unwrap();

        let in_org = inner
            .projects
            .get(&project_id)
            .is_some_and(|p| p.organization_id == organization);
        if !in_org {
            return Err(RepositoryError::NotFound(format!("project {}", project_id)));
        }

        let id = LineId::new(Uuid::new_v4());
        inner.lines.insert(id, build_line(id, project_id, draft));
        inner.line_order.push(id);

        Ok(id)
    }

    async fn update(
        &self,
        line_id: LineId,
        draft: &ProjectLineDraft,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().unwrap();
        let line = inner
            .lines
            .get_mut(&line_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("project line {}", line_id)))?;

        line.article_id = draft.article_id;
        line.sold_quantity = draft.sold_quantity;
        line.amount = draft.amount;
        line.consultant_id = draft.consultant_id;
        line.planned_start_date = draft.planned_start_date;
        line.planned_end_date = draft.planned_end_date;
        line.planned_quantity = draft.planned_quantity;
        line.realized_quantity = draft.realized_quantity;

        Ok(())
    }

    async fn split(&self, line_id: LineId, split: &LineSplit) -> Result<LineId, RepositoryError> {
        let mut inner = self.inner.write().unwrap();

        let (project_id, article_id) = {
            let line = inner
                .lines
                .get_mut(&line_id)
                .ok_or_else(|| RepositoryError::NotFound(format!("project line {}", line_id)))?;
            line.sold_quantity = split.planned_sold;
            line.amount = split.planned_amount;
            (line.project_id, line.article_id)
        };

        let sibling_id = LineId::new(Uuid::new_v4());
        inner.lines.insert(
            sibling_id,
            ProjectLine {
                id: sibling_id,
                project_id,
                article_id,
                sold_quantity: split.remainder_sold,
                amount: split.remainder_amount,
                consultant_id: None,
                planned_start_date: None,
                planned_end_date: None,
                planned_quantity: 0.0,
                realized_quantity: 0.0,
                booking_id: None,
            },
        );
        inner.line_order.push(sibling_id);

        Ok(sibling_id)
    }

    async fn delete(&self, line_id: LineId) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().unwrap();

        let line = inner
            .lines
            .remove(&line_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("project line {}", line_id)))?;
        if let Some(booking_id) = line.booking_id {
            inner.bookings.remove(&booking_id);
        }
        inner.line_order.retain(|id| *id != line_id);

        Ok(())
    }

    async fn sync_view(&self, line_id: LineId) -> Result<LineSyncView, RepositoryError> {
        let inner = self.inner.read().unwrap();

        let line = inner
            .lines
            .get(&line_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("project line {}", line_id)))?;
        let article = inner
            .articles
            .get(&line.article_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("article {}", line.article_id)))?;
        let project = inner
            .projects
            .get(&line.project_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("project {}", line.project_id)))?;

        Ok(LineSyncView {
            id: line.id,
            booking_id: line.booking_id,
            consultant_id: line.consultant_id,
            planned_start_date: line.planned_start_date,
            planned_end_date: line.planned_end_date,
            planned_quantity: line.planned_quantity,
            article_name: article.name.clone(),
            project_name: project.name.clone(),
            client_number: project.client_number.clone(),
            client_name: project.client_name.clone(),
        })
    }
}

#[async_trait]
impl BookingRepository for MockPlanningStore {
    async fn list_in_range(
        &self,
        organization: OrganizationId,
        from: Date,
        to: Date,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let inner = self.inner.read().unwrap();

        let bookings = inner
            .bookings
            .values()
            .filter(|b| {
                inner
                    .consultants
                    .get(&b.consultant_id)
                    .is_some_and(|c| c.organization_id == organization)
            })
            .filter(|b| b.start_date <= to && b.end_date >= from)
            .cloned()
            .sorted_by_key(|b| b.start_date)
            .collect();

        Ok(bookings)
    }

    async fn create_booking(&self, draft: &BookingDraft) -> Result<BookingId, RepositoryError> {
        let mut inner = self.inner.write().unwrap();

        let id = BookingId::new(Uuid::new_v4());
        inner.bookings.insert(
            id,
            Booking {
                id,
                consultant_id: draft.consultant_id,
                kind: draft.kind,
                title: draft.title.clone(),
                notes: draft.notes.clone(),
                start_date: draft.start_date,
                end_date: draft.end_date,
            },
        );

        Ok(id)
    }

    async fn create_linked(
        &self,
        line_id: LineId,
        draft: &BookingDraft,
    ) -> Result<BookingId, RepositoryError> {
        let mut inner = self.inner.write().unwrap();

        if !inner.lines.contains_key(&line_id) {
            return Err(RepositoryError::NotFound(format!("project line {}", line_id)));
        }

        let id = BookingId::new(Uuid::new_v4());
        inner.bookings.insert(
            id,
            Booking {
                id,
                consultant_id: draft.consultant_id,
                kind: draft.kind,
                title: draft.title.clone(),
                notes: draft.notes.clone(),
                start_date: draft.start_date,
                end_date: draft.end_date,
            },
        );
        if let Some(line) = inner.lines.get_mut(&line_id) {
            line.booking_id = Some(id);
        }

        Ok(id)
    }

    async fn update_booking(
        &self,
        booking_id: BookingId,
        draft: &BookingDraft,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().unwrap();
        let booking = inner
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("booking {}", booking_id)))?;

        booking.consultant_id = draft.consultant_id;
        booking.kind = draft.kind;
        booking.title = draft.title.clone();
        booking.notes = draft.notes.clone();
        booking.start_date = draft.start_date;
        booking.end_date = draft.end_date;

        Ok(())
    }

    async fn delete_linked(
        &self,
        line_id: LineId,
        booking_id: BookingId,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().unwrap();

        let line = inner
            .lines
            .get_mut(&line_id)
            .filter(|line| line.booking_id == Some(booking_id))
            .ok_or_else(|| RepositoryError::NotFound(format!("project line {}", line_id)))?;
        line.booking_id = None;
        inner.bookings.remove(&booking_id);

        Ok(())
    }

    async fn delete_booking(&self, booking_id: BookingId) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().unwrap();

        if inner.bookings.remove(&booking_id).is_none() {
            return Err(RepositoryError::NotFound(format!("booking {}", booking_id)));
        }
        for line in inner.lines.values_mut() {
            if line.booking_id == Some(booking_id) {
                line.booking_id = None;
            }
        }

        Ok(())
    }

    async fn linked_line(&self, booking_id: BookingId) -> Result<Option<LineId>, RepositoryError> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .lines
            .values()
            .find(|line| line.booking_id == Some(booking_id))
            .map(|line| line.id))
    }
}
