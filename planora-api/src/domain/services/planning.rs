use std::sync::Arc;

use time::Date;

use crate::{
    domain::{
        models::{Booking, BookingDraft, BookingId, OrganizationId},
        PlanningError,
    },
    repositories::BookingRepository,
};

/// Read model for the planning calendar, plus manually authored planning
/// items (ad-hoc bookings and time off). Line-derived bookings are owned by
/// the synchronizer and can only be removed through their line.
pub struct PlanningService {
    bookings: Arc<dyn BookingRepository>,
}

impl PlanningService {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    /// Bookings whose inclusive date range intersects `[from, to]`.
    pub async fn bookings_in_range(
        &self,
        organization: OrganizationId,
        from: Date,
        to: Date,
    ) -> Result<Vec<Booking>, PlanningError> {
        if from > to {
            return Err(PlanningError::validation("invalid date range"));
        }
        Ok(self.bookings.list_in_range(organization, from, to).await?)
    }

    pub async fn create_item(&self, draft: &BookingDraft) -> Result<(), PlanningError> {
        if draft.start_date > draft.end_date {
            return Err(PlanningError::validation("invalid date range"));
        }
        self.bookings.create_booking(draft).await?;
        Ok(())
    }

    pub async fn delete_item(&self, booking_id: BookingId) -> Result<(), PlanningError> {
        if self.bookings.linked_line(booking_id).await?.is_some() {
            return Err(PlanningError::validation(
                "booking is derived from a project line and cannot be deleted directly",
            ));
        }
        Ok(self.bookings.delete_booking(booking_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::macros::date;
    use uuid::Uuid;

    use super::*;
    use crate::domain::models::{
        ArticleId, BookingKind, ConsultantId, ProjectId, ProjectLineDraft,
    };
    use crate::domain::services::LinePlanningService;
    use crate::repositories::{MockPlanningStore, SeedArticle, SeedConsultant, SeedProject};

    fn store_with_consultant() -> (Arc<MockPlanningStore>, OrganizationId, ConsultantId) {
        let organization = OrganizationId::new(Uuid::new_v4());
        let consultant_id = ConsultantId::new(Uuid::new_v4());
        let store = Arc::new(MockPlanningStore::new().with_consultant(SeedConsultant {
            id: consultant_id,
            organization_id: organization,
            name: "Nadia Benali".to_string(),
        }));
        (store, organization, consultant_id)
    }

    fn item(consultant_id: ConsultantId, start: Date, end: Date) -> BookingDraft {
        BookingDraft {
            consultant_id,
            kind: BookingKind::TimeOff,
            title: "Summer leave".to_string(),
            notes: String::new(),
            start_date: start,
            end_date: end,
        }
    }

    #[tokio::test]
    async fn range_query_selects_intersecting_bookings_inclusively() {
        let (store, organization, consultant_id) = store_with_consultant();
        let service = PlanningService::new(store.clone());

        // Overlapping on the left boundary, fully inside, and disjoint.
        for (start, end) in [
            (date!(2025 - 05 - 26), date!(2025 - 06 - 01)),
            (date!(2025 - 06 - 10), date!(2025 - 06 - 12)),
            (date!(2025 - 07 - 01), date!(2025 - 07 - 04)),
        ] {
            service
                .create_item(&item(consultant_id, start, end))
                .await
                .unwrap();
        }

        let bookings = service
            .bookings_in_range(organization, date!(2025 - 06 - 01), date!(2025 - 06 - 30))
            .await
            .unwrap();

        assert_eq!(bookings.len(), 2);
        assert_eq!(bookings[0].start_date, date!(2025 - 05 - 26));
        assert_eq!(bookings[1].start_date, date!(2025 - 06 - 10));
    }

    #[tokio::test]
    async fn range_query_is_scoped_to_the_organization() {
        let (store, _, consultant_id) = store_with_consultant();
        let service = PlanningService::new(store.clone());
        service
            .create_item(&item(
                consultant_id,
                date!(2025 - 06 - 02),
                date!(2025 - 06 - 03),
            ))
            .await
            .unwrap();

        let other_org = OrganizationId::new(Uuid::new_v4());
        let bookings = service
            .bookings_in_range(other_org, date!(2025 - 06 - 01), date!(2025 - 06 - 30))
            .await
            .unwrap();

        assert!(bookings.is_empty());
    }

    #[tokio::test]
    async fn inverted_ranges_are_rejected() {
        let (store, organization, consultant_id) = store_with_consultant();
        let service = PlanningService::new(store.clone());

        let query = service
            .bookings_in_range(organization, date!(2025 - 06 - 30), date!(2025 - 06 - 01))
            .await;
        assert!(matches!(query, Err(PlanningError::Validation(_))));

        let create = service
            .create_item(&item(
                consultant_id,
                date!(2025 - 06 - 30),
                date!(2025 - 06 - 01),
            ))
            .await;
        assert!(matches!(create, Err(PlanningError::Validation(_))));
        assert_eq!(store.booking_count(), 0);
    }

    #[tokio::test]
    async fn manual_items_can_be_deleted() {
        let (store, organization, consultant_id) = store_with_consultant();
        let service = PlanningService::new(store.clone());
        service
            .create_item(&item(
                consultant_id,
                date!(2025 - 06 - 02),
                date!(2025 - 06 - 03),
            ))
            .await
            .unwrap();
        let booking = service
            .bookings_in_range(organization, date!(2025 - 06 - 01), date!(2025 - 06 - 30))
            .await
            .unwrap()
            .remove(0);

        service.delete_item(booking.id).await.unwrap();

        assert_eq!(store.booking_count(), 0);
    }

    #[tokio::test]
    async fn line_derived_bookings_cannot_be_deleted_directly() {
        let organization = OrganizationId::new(Uuid::new_v4());
        let project_id = ProjectId::new(Uuid::new_v4());
        let article_id = ArticleId::new(Uuid::new_v4());
        let consultant_id = ConsultantId::new(Uuid::new_v4());
        let store = Arc::new(
            MockPlanningStore::new()
                .with_project(SeedProject {
                    id: project_id,
                    organization_id: organization,
                    name: "HR platform rollout".to_string(),
                    client_number: "C-1042".to_string(),
                    client_name: "Acme Industries".to_string(),
                })
                .with_article(SeedArticle {
                    id: article_id,
                    name: "Integration workshop".to_string(),
                    service: "SIRH".to_string(),
                })
                .with_consultant(SeedConsultant {
                    id: consultant_id,
                    organization_id: organization,
                    name: "Nadia Benali".to_string(),
                }),
        );
        let lines = LinePlanningService::new(store.clone(), store.clone());
        let planning = PlanningService::new(store.clone());

        lines
            .create_line(
                organization,
                project_id,
                &ProjectLineDraft {
                    article_id,
                    sold_quantity: 10.0,
                    amount: 1000.0,
                    consultant_id: Some(consultant_id),
                    planned_start_date: Some(date!(2025 - 06 - 01)),
                    planned_end_date: Some(date!(2025 - 06 - 05)),
                    planned_quantity: 4.0,
                    realized_quantity: 0.0,
                },
            )
            .await
            .unwrap();
        let line = store.lines_for_project(project_id).remove(0);
        let booking_id = line.booking_id.unwrap();

        let result = planning.delete_item(booking_id).await;

        assert!(matches!(result, Err(PlanningError::Validation(_))));
        assert!(store.booking(booking_id).is_some());
    }
}
