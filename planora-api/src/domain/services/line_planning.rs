use std::sync::Arc;

use crate::{
    domain::{
        models::{LineId, LineSplit, OrganizationId, ProjectId, ProjectLineDraft, ProjectLineView},
        quantities, PlanningError,
    },
    repositories::{BookingRepository, ProjectLineRepository},
};

use super::BookingSynchronizer;

/// Write paths for project lines: validated create/update/delete plus the
/// remainder reporter. Every mutation ends with a booking re-sync so the
/// derived calendar state never lags the line.
pub struct LinePlanningService {
    lines: Arc<dyn ProjectLineRepository>,
    synchronizer: BookingSynchronizer,
}

impl LinePlanningService {
    pub fn new(
        lines: Arc<dyn ProjectLineRepository>,
        bookings: Arc<dyn BookingRepository>,
    ) -> Self {
        let synchronizer = BookingSynchronizer::new(lines.clone(), bookings);
        Self { lines, synchronizer }
    }

    pub async fn list_lines(
        &self,
        organization: OrganizationId,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectLineView>, PlanningError> {
        Ok(self.lines.list(organization, project_id).await?)
    }

    pub async fn create_line(
        &self,
        organization: OrganizationId,
        project_id: ProjectId,
        draft: &ProjectLineDraft,
    ) -> Result<(), PlanningError> {
        validate_draft(draft)?;
        let line_id = self.lines.insert(organization, project_id, draft).await?;
        self.synchronizer.sync_line(line_id).await
    }

    pub async fn update_line(
        &self,
        line_id: LineId,
        draft: &ProjectLineDraft,
    ) -> Result<(), PlanningError> {
        validate_draft(draft)?;
        self.lines.update(line_id, draft).await?;
        self.synchronizer.sync_line(line_id).await
    }

    pub async fn delete_line(&self, line_id: LineId) -> Result<(), PlanningError> {
        // The repository removes the linked booking before the line itself.
        Ok(self.lines.delete(line_id).await?)
    }

    /// Carves the unplanned remainder of a partially planned line into a new
    /// sibling line, leaving the original as exactly its planned slice.
    pub async fn report_remainder(&self, line_id: LineId) -> Result<(), PlanningError> {
        let line = self.lines.get(line_id).await?;
        let sold = line.sold_quantity;
        let planned = line.planned_quantity;

        if sold <= 0.0 {
            return Err(PlanningError::validation(
                "cannot report a remainder: the sold quantity is not positive",
            ));
        }
        if planned <= 0.0 {
            return Err(PlanningError::validation(
                "cannot report a remainder: nothing is planned on this line",
            ));
        }
        if planned >= sold {
            return Err(PlanningError::validation(
                "cannot report a remainder: the line is already fully planned",
            ));
        }

        let remainder = sold - planned;
        let (planned_amount, remainder_amount) = quantities::apportion(line.amount, planned, sold);
        self.lines
            .split(
                line_id,
                &LineSplit {
                    planned_sold: planned,
                    planned_amount,
                    remainder_sold: remainder,
                    remainder_amount,
                },
            )
            .await?;

        // The shrunk line must now be exactly its planned slice.
        let shrunk = self.lines.get(line_id).await?;
        if (shrunk.sold_quantity - shrunk.planned_quantity).abs() > f64::EPSILON {
            return Err(PlanningError::storage(format!(
                "line {} is inconsistent after splitting: sold {} != planned {}",
                line_id, shrunk.sold_quantity, shrunk.planned_quantity
            )));
        }

        // Assignment did not change; this is a consistency re-check.
        self.synchronizer.sync_line(line_id).await
    }
}

/// The ordering invariant gate: `0 <= realized <= planned <= sold`, a
/// positive sold quantity, a non-negative amount, and a coherent date range.
/// Out-of-range values are rejected, never clamped.
fn validate_draft(draft: &ProjectLineDraft) -> Result<(), PlanningError> {
    if draft.sold_quantity <= 0.0 {
        return Err(PlanningError::validation(
            "sold quantity must be greater than zero",
        ));
    }
    if draft.amount < 0.0 {
        return Err(PlanningError::validation("amount must not be negative"));
    }
    if draft.planned_quantity < 0.0 || draft.planned_quantity > draft.sold_quantity {
        return Err(PlanningError::validation(
            "planned quantity must lie between zero and the sold quantity",
        ));
    }
    if draft.realized_quantity < 0.0 || draft.realized_quantity > draft.planned_quantity {
        return Err(PlanningError::validation(
            "realized quantity must lie between zero and the planned quantity",
        ));
    }
    if let (Some(start), Some(end)) = (draft.planned_start_date, draft.planned_end_date) {
        if start > end {
            return Err(PlanningError::validation(
                "planned start date must not be after the planned end date",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::macros::date;
    use uuid::Uuid;

    use super::*;
    use crate::domain::models::{ArticleId, BookingKind, ConsultantId};
    use crate::repositories::{MockPlanningStore, SeedArticle, SeedConsultant, SeedProject};

    struct Fixture {
        store: Arc<MockPlanningStore>,
        service: LinePlanningService,
        organization: OrganizationId,
        project_id: ProjectId,
        article_id: ArticleId,
        consultant_id: ConsultantId,
    }

    fn fixture() -> Fixture {
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
        let service = LinePlanningService::new(store.clone(), store.clone());

        Fixture {
            store,
            service,
            organization,
            project_id,
            article_id,
            consultant_id,
        }
    }

    fn unassigned_draft(f: &Fixture) -> ProjectLineDraft {
        ProjectLineDraft {
            article_id: f.article_id,
            sold_quantity: 10.0,
            amount: 1000.0,
            consultant_id: None,
            planned_start_date: None,
            planned_end_date: None,
            planned_quantity: 0.0,
            realized_quantity: 0.0,
        }
    }

    fn complete_draft(f: &Fixture) -> ProjectLineDraft {
        ProjectLineDraft {
            consultant_id: Some(f.consultant_id),
            planned_start_date: Some(date!(2025 - 06 - 01)),
            planned_end_date: Some(date!(2025 - 06 - 05)),
            planned_quantity: 4.0,
            ..unassigned_draft(f)
        }
    }

    #[tokio::test]
    async fn create_rejects_quantity_ordering_violations() {
        let f = fixture();

        for (sold, planned, realized) in [
            (10.0, 12.0, 0.0), // planned > sold
            (10.0, 4.0, 5.0),  // realized > planned
            (0.0, 0.0, 0.0),   // nothing sold
            (10.0, -1.0, 0.0), // negative planned
            (10.0, 4.0, -1.0), // negative realized
        ] {
            let draft = ProjectLineDraft {
                sold_quantity: sold,
                planned_quantity: planned,
                realized_quantity: realized,
                ..unassigned_draft(&f)
            };
            let result = f
                .service
                .create_line(f.organization, f.project_id, &draft)
                .await;
            assert!(
                matches!(result, Err(PlanningError::Validation(_))),
                "accepted sold={sold} planned={planned} realized={realized}"
            );
        }

        assert_eq!(f.store.line_count(), 0);
    }

    #[tokio::test]
    async fn create_rejects_negative_amount() {
        let f = fixture();
        let draft = ProjectLineDraft {
            amount: -1.0,
            ..unassigned_draft(&f)
        };

        let result = f
            .service
            .create_line(f.organization, f.project_id, &draft)
            .await;

        assert!(matches!(result, Err(PlanningError::Validation(_))));
        assert_eq!(f.store.line_count(), 0);
    }

    #[tokio::test]
    async fn create_rejects_inverted_date_range() {
        let f = fixture();
        let draft = ProjectLineDraft {
            planned_start_date: Some(date!(2025 - 06 - 05)),
            planned_end_date: Some(date!(2025 - 06 - 01)),
            ..complete_draft(&f)
        };

        let result = f
            .service
            .create_line(f.organization, f.project_id, &draft)
            .await;

        assert!(matches!(result, Err(PlanningError::Validation(_))));
    }

    #[tokio::test]
    async fn create_without_assignment_leaves_line_unlinked() {
        let f = fixture();

        f.service
            .create_line(f.organization, f.project_id, &unassigned_draft(&f))
            .await
            .unwrap();

        let lines = f.store.lines_for_project(f.project_id);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].booking_id, None);
        assert_eq!(f.store.booking_count(), 0);
    }

    #[tokio::test]
    async fn create_with_complete_assignment_links_a_booking() {
        let f = fixture();

        f.service
            .create_line(f.organization, f.project_id, &complete_draft(&f))
            .await
            .unwrap();

        let line = f.store.lines_for_project(f.project_id).remove(0);
        let booking_id = line.booking_id.expect("line should be linked");
        let booking = f.store.booking(booking_id).expect("booking should exist");

        assert_eq!(booking.kind, BookingKind::Booking);
        assert_eq!(booking.consultant_id, f.consultant_id);
        assert_eq!(booking.start_date, date!(2025 - 06 - 01));
        assert_eq!(booking.end_date, date!(2025 - 06 - 05));
        for expected in [
            "C-1042",
            "Acme Industries",
            "HR platform rollout",
            "Integration workshop",
        ] {
            assert!(
                booking.title.contains(expected),
                "title {:?} misses {:?}",
                booking.title,
                expected
            );
        }
        assert!(booking.notes.contains(&line.id.to_string()));
        assert!(booking.notes.contains("Planned quantity: 4"));
    }

    #[tokio::test]
    async fn repeated_updates_keep_the_same_booking() {
        let f = fixture();
        f.service
            .create_line(f.organization, f.project_id, &complete_draft(&f))
            .await
            .unwrap();
        let line = f.store.lines_for_project(f.project_id).remove(0);
        let original_booking = line.booking_id.unwrap();

        // Still complete, new dates and quantity.
        let draft = ProjectLineDraft {
            planned_start_date: Some(date!(2025 - 07 - 01)),
            planned_end_date: Some(date!(2025 - 07 - 10)),
            planned_quantity: 6.0,
            ..complete_draft(&f)
        };
        f.service.update_line(line.id, &draft).await.unwrap();
        f.service.update_line(line.id, &draft).await.unwrap();

        let updated = f.store.line(line.id).unwrap();
        assert_eq!(updated.booking_id, Some(original_booking));
        assert_eq!(f.store.booking_count(), 1);

        let booking = f.store.booking(original_booking).unwrap();
        assert_eq!(booking.start_date, date!(2025 - 07 - 01));
        assert_eq!(booking.end_date, date!(2025 - 07 - 10));
        assert!(booking.notes.contains("Planned quantity: 6"));
    }

    #[tokio::test]
    async fn clearing_the_consultant_removes_the_booking() {
        let f = fixture();
        f.service
            .create_line(f.organization, f.project_id, &complete_draft(&f))
            .await
            .unwrap();
        let line = f.store.lines_for_project(f.project_id).remove(0);
        assert!(line.booking_id.is_some());

        let incomplete = ProjectLineDraft {
            consultant_id: None,
            ..complete_draft(&f)
        };
        f.service.update_line(line.id, &incomplete).await.unwrap();

        let updated = f.store.line(line.id).unwrap();
        assert_eq!(updated.booking_id, None);
        assert_eq!(f.store.booking_count(), 0);

        // A further incomplete update performs no booking operation.
        f.service.update_line(line.id, &incomplete).await.unwrap();
        assert_eq!(f.store.line(line.id).unwrap().booking_id, None);
        assert_eq!(f.store.booking_count(), 0);
    }

    #[tokio::test]
    async fn deleting_a_line_removes_its_booking() {
        let f = fixture();
        f.service
            .create_line(f.organization, f.project_id, &complete_draft(&f))
            .await
            .unwrap();
        let line = f.store.lines_for_project(f.project_id).remove(0);
        assert_eq!(f.store.booking_count(), 1);

        f.service.delete_line(line.id).await.unwrap();

        assert_eq!(f.store.line_count(), 0);
        assert_eq!(f.store.booking_count(), 0);
    }

    #[tokio::test]
    async fn deleting_an_unlinked_line_removes_only_the_line() {
        let f = fixture();
        f.service
            .create_line(f.organization, f.project_id, &unassigned_draft(&f))
            .await
            .unwrap();
        let line = f.store.lines_for_project(f.project_id).remove(0);

        f.service.delete_line(line.id).await.unwrap();

        assert_eq!(f.store.line_count(), 0);
        assert_eq!(f.store.booking_count(), 0);
    }

    #[tokio::test]
    async fn deleting_an_unknown_line_fails() {
        let f = fixture();
        let result = f.service.delete_line(LineId::new(Uuid::new_v4())).await;
        assert!(matches!(result, Err(PlanningError::NotFound(_))));
    }

    #[tokio::test]
    async fn report_remainder_splits_the_line_and_keeps_the_booking() {
        let f = fixture();
        f.service
            .create_line(f.organization, f.project_id, &complete_draft(&f))
            .await
            .unwrap();
        let line = f.store.lines_for_project(f.project_id).remove(0);
        let booking_id = line.booking_id.unwrap();

        f.service.report_remainder(line.id).await.unwrap();

        let lines = f.store.lines_for_project(f.project_id);
        assert_eq!(lines.len(), 2);

        let original = &lines[0];
        assert_eq!(original.id, line.id);
        assert_eq!(original.sold_quantity, 4.0);
        assert_eq!(original.amount, 400.0);
        assert_eq!(original.planned_quantity, 4.0);
        assert_eq!(original.consultant_id, Some(f.consultant_id));
        assert_eq!(original.booking_id, Some(booking_id));

        let sibling = &lines[1];
        assert_eq!(sibling.sold_quantity, 6.0);
        assert_eq!(sibling.amount, 600.0);
        assert_eq!(sibling.planned_quantity, 0.0);
        assert_eq!(sibling.realized_quantity, 0.0);
        assert_eq!(sibling.consultant_id, None);
        assert_eq!(sibling.planned_start_date, None);
        assert_eq!(sibling.planned_end_date, None);
        assert_eq!(sibling.booking_id, None);

        // The original's booking is untouched: same id, same dates.
        let booking = f.store.booking(booking_id).unwrap();
        assert_eq!(booking.start_date, date!(2025 - 06 - 01));
        assert_eq!(booking.end_date, date!(2025 - 06 - 05));
        assert_eq!(f.store.booking_count(), 1);
    }

    #[tokio::test]
    async fn report_remainder_rejects_unplanned_and_fully_planned_lines() {
        let f = fixture();

        f.service
            .create_line(f.organization, f.project_id, &unassigned_draft(&f))
            .await
            .unwrap();
        let fully_planned = ProjectLineDraft {
            planned_quantity: 10.0,
            ..complete_draft(&f)
        };
        f.service
            .create_line(f.organization, f.project_id, &fully_planned)
            .await
            .unwrap();
        let lines = f.store.lines_for_project(f.project_id);

        for line in &lines {
            let result = f.service.report_remainder(line.id).await;
            assert!(matches!(result, Err(PlanningError::Validation(_))));
        }

        // Nothing was mutated, no sibling was created.
        let after = f.store.lines_for_project(f.project_id);
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].sold_quantity, 10.0);
        assert_eq!(after[1].sold_quantity, 10.0);
    }

    #[tokio::test]
    async fn report_remainder_conserves_the_amount_across_rounding() {
        let f = fixture();
        let draft = ProjectLineDraft {
            sold_quantity: 3.0,
            amount: 10.0,
            planned_quantity: 1.0,
            ..complete_draft(&f)
        };
        f.service
            .create_line(f.organization, f.project_id, &draft)
            .await
            .unwrap();
        let line = f.store.lines_for_project(f.project_id).remove(0);

        f.service.report_remainder(line.id).await.unwrap();

        let lines = f.store.lines_for_project(f.project_id);
        assert_eq!(lines[0].amount, 3.33);
        assert_eq!(lines[1].amount, 6.67);
        assert_eq!(lines[0].amount + lines[1].amount, 10.0);
    }

    #[tokio::test]
    async fn lines_are_listed_in_creation_order_with_display_fields() {
        let f = fixture();
        f.service
            .create_line(f.organization, f.project_id, &complete_draft(&f))
            .await
            .unwrap();
        f.service
            .create_line(f.organization, f.project_id, &unassigned_draft(&f))
            .await
            .unwrap();

        let views = f
            .service
            .list_lines(f.organization, f.project_id)
            .await
            .unwrap();

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].article_name, "Integration workshop");
        assert_eq!(views[0].article_service, "SIRH");
        assert_eq!(views[0].consultant_name.as_deref(), Some("Nadia Benali"));
        assert!(views[0].booking_id.is_some());
        assert_eq!(views[1].consultant_name, None);
        assert_eq!(views[1].booking_id, None);
    }
}
