//! End-to-end desk scenarios against the in-memory backend.

use campusdesk::analytics;
use campusdesk::desk::{self, ListOptions};
use campusdesk::domain::{ComplaintFilter, ComplaintId, ComplaintStatus, Priority, Role, Session};
use campusdesk::error::Error;
use campusdesk::storage::DeskStorage;
use campusdesk::storage::in_memory::new_in_memory_storage;
use rstest::rstest;

mod common;

struct Desk {
    store: Box<dyn DeskStorage>,
    admin: Session,
    student: Session,
    tech_a: Session,
    tech_b: Session,
}

async fn desk() -> Desk {
    let mut store = new_in_memory_storage("desk".to_string());
    let admin = common::user(store.as_mut(), "ada", "Ada Admin", Role::Admin).await;
    let student = common::user(store.as_mut(), "sam", "Sam Student", Role::Student).await;
    let tech_a = common::user(store.as_mut(), "tia", "Tia Tech", Role::Technician).await;
    let tech_b = common::user(store.as_mut(), "tom", "Tom Tech", Role::Technician).await;
    Desk {
        store,
        admin,
        student,
        tech_a,
        tech_b,
    }
}

impl Desk {
    async fn file(&mut self, title: &str) -> ComplaintId {
        desk::file_complaint(
            self.store.as_mut(),
            &common::settings(),
            &self.student,
            common::complaint(title, Priority::Medium),
        )
        .await
        .unwrap()
        .complaint
        .id
    }

    async fn assign_to(&mut self, id: &ComplaintId, tech: &Session) {
        let admin = self.admin.clone();
        desk::assign(
            self.store.as_mut(),
            &common::settings(),
            &admin,
            id,
            tech.user_id(),
        )
        .await
        .unwrap();
    }

    async fn load_of(&self, tech: &Session) -> usize {
        desk::workload(self.store.as_ref(), &self.admin)
            .await
            .unwrap()
            .into_iter()
            .find(|l| &l.technician.id == tech.user_id())
            .map_or(0, |l| l.active_count)
    }
}

#[tokio::test]
async fn test_assignment_at_cap_is_rejected_without_side_effects() {
    let mut d = desk().await;
    let tech = d.tech_a.clone();
    for n in 0..10 {
        let id = d.file(&format!("Fault {n}")).await;
        d.assign_to(&id, &tech).await;
    }
    assert_eq!(d.load_of(&tech).await, 10);

    let extra = d.file("One too many").await;
    let activity_before = d.store.all_activity().await.unwrap().len();
    let inbox_before = d.store.notifications_for(tech.user_id(), None).await.unwrap().len();

    let err = desk::assign(
        d.store.as_mut(),
        &common::settings(),
        &d.admin,
        &extra,
        tech.user_id(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        Error::TechnicianAtCapacity {
            active: 10,
            max_load: 10,
            ..
        }
    ));
    assert!(err.is_validation());

    let untouched = d.store.get_complaint(&extra).await.unwrap().unwrap();
    assert_eq!(untouched.status, ComplaintStatus::Open);
    assert!(untouched.assigned_to.is_none());
    assert_eq!(d.store.all_activity().await.unwrap().len(), activity_before);
    assert_eq!(
        d.store.notifications_for(tech.user_id(), None).await.unwrap().len(),
        inbox_before
    );

    // the other technician still has room
    let outcome = desk::auto_assign(d.store.as_mut(), &common::settings(), &d.admin, &extra)
        .await
        .unwrap();
    assert_eq!(&outcome.technician.id, d.tech_b.user_id());
}

#[tokio::test]
async fn test_soft_delete_removes_from_tally_and_restore_brings_it_back() {
    let mut d = desk().await;
    let tech = d.tech_a.clone();
    let id = d.file("Exposed wiring").await;
    d.assign_to(&id, &tech).await;
    assert_eq!(d.load_of(&tech).await, 1);

    desk::soft_delete(d.store.as_mut(), &common::settings(), &d.admin, &id)
        .await
        .unwrap();
    assert_eq!(d.load_of(&tech).await, 0);
    assert!(
        desk::list_complaints(d.store.as_ref(), &d.admin, ListOptions::default())
            .await
            .unwrap()
            .is_empty()
    );

    desk::restore(d.store.as_mut(), &common::settings(), &d.admin, &id)
        .await
        .unwrap();
    assert_eq!(d.load_of(&tech).await, 1);
}

#[tokio::test]
async fn test_resolution_frees_capacity() {
    let mut d = desk().await;
    let tech = d.tech_a.clone();
    let id = d.file("Dead socket").await;
    d.assign_to(&id, &tech).await;

    desk::update_status(
        d.store.as_mut(),
        &common::settings(),
        &tech,
        &id,
        ComplaintStatus::Resolved,
    )
    .await
    .unwrap();

    assert_eq!(d.load_of(&tech).await, 0);
    let stats = analytics::dashboard_stats(
        &desk::visible_complaints(d.store.as_ref(), &d.admin).await.unwrap(),
    );
    assert_eq!(stats.resolved, 1);
    assert_eq!(stats.resolution_rate, 100);
}

#[rstest]
#[case(ComplaintStatus::Open, ComplaintStatus::InProgress, true)]
#[case(ComplaintStatus::Open, ComplaintStatus::Resolved, true)]
#[case(ComplaintStatus::InProgress, ComplaintStatus::Resolved, true)]
#[case(ComplaintStatus::InProgress, ComplaintStatus::Open, false)]
#[case(ComplaintStatus::InProgress, ComplaintStatus::InProgress, false)]
#[case(ComplaintStatus::Resolved, ComplaintStatus::Open, false)]
#[tokio::test]
async fn test_status_transitions(
    #[case] from: ComplaintStatus,
    #[case] to: ComplaintStatus,
    #[case] allowed: bool,
) {
    use campusdesk::domain::ComplaintPatch;

    let mut d = desk().await;
    let tech = d.tech_a.clone();
    let id = d.file("Flickering tube").await;
    d.assign_to(&id, &tech).await;

    // put the complaint in the starting state directly
    d.store
        .update_complaint(
            &id,
            ComplaintPatch {
                status: Some(from),
                ..ComplaintPatch::default()
            },
        )
        .await
        .unwrap();

    let result = desk::update_status(d.store.as_mut(), &common::settings(), &tech, &id, to).await;
    match result {
        Ok(outcome) => {
            assert!(allowed, "{from} -> {to} should be rejected");
            assert_eq!(outcome.complaint.status, to);
        }
        Err(err) => {
            assert!(!allowed, "{from} -> {to} should be allowed: {err}");
            assert!(matches!(err, Error::InvalidTransition { .. }));
            let stored = d.store.get_complaint(&id).await.unwrap().unwrap();
            assert_eq!(stored.status, from);
        }
    }
}

#[tokio::test]
async fn test_supervisor_sees_everything_but_cannot_act() {
    let mut d = desk().await;
    let supervisor = common::user(d.store.as_mut(), "sue", "Sue Supervisor", Role::Supervisor).await;
    let id = d.file("Broken heater").await;

    let visible = desk::list_complaints(d.store.as_ref(), &supervisor, ListOptions::default())
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);

    let err = desk::assign(
        d.store.as_mut(),
        &common::settings(),
        &supervisor,
        &id,
        d.tech_a.user_id(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::PermissionDenied { role: Role::Supervisor, .. }));

    let all = d.store.list_complaints(&ComplaintFilter::default()).await.unwrap();
    assert!(all[0].assigned_to.is_none());
}
