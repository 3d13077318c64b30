#![allow(clippy::unwrap_used)]

mod common;

use common::{at, setup_test_db, FailingRepository, RecordingTransport, Sent, StubImages};
use plan_reminder_bot::database::repository::PlanRepository;
use plan_reminder_bot::services::reminder::{
    reminder_text, DispatchSummary, ReminderDispatcher, ReminderService, MAX_CAPTION_CHARS,
    REMINDER_HEADLINE,
};
use plan_reminder_bot::utils::validation::MAX_PLAN_TEXT_CHARS;
use std::sync::Arc;

fn dispatcher(
    repo: Arc<dyn PlanRepository>,
    transport: Arc<RecordingTransport>,
    images_available: bool,
) -> ReminderDispatcher {
    ReminderDispatcher::new(repo, transport, Arc::new(StubImages { available: images_available }))
}

#[tokio::test]
async fn test_due_plan_is_sent_with_image() {
    let (db, _temp_dir) = setup_test_db().await;
    let db = Arc::new(db);
    let minute = at(2025, 12, 31, 18, 0);
    db.insert(10, "Buy milk", minute).await.unwrap();

    let transport = Arc::new(RecordingTransport::default());
    let summary = dispatcher(db.clone(), transport.clone(), true)
        .dispatch_due(minute)
        .await;

    assert_eq!(summary, DispatchSummary { due: 1, sent: 1, skipped: 0, failed: 0 });

    let plan = db.list_by_owner(10).await.unwrap().remove(0);
    assert_eq!(
        transport.sent(),
        vec![Sent::Photo { owner_id: 10, bytes: 4, caption: reminder_text(&plan) }]
    );
    assert!(plan.notified_at.is_some());
}

#[tokio::test]
async fn test_neighbouring_minutes_are_not_sent() {
    let (db, _temp_dir) = setup_test_db().await;
    let db = Arc::new(db);
    db.insert(10, "Too early", at(2025, 12, 31, 17, 59)).await.unwrap();
    db.insert(10, "Too late", at(2025, 12, 31, 18, 1)).await.unwrap();

    let transport = Arc::new(RecordingTransport::default());
    let summary = dispatcher(db, transport.clone(), true)
        .dispatch_due(at(2025, 12, 31, 18, 0))
        .await;

    assert_eq!(summary, DispatchSummary::default());
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_second_tick_in_same_minute_does_not_repeat() {
    let (db, _temp_dir) = setup_test_db().await;
    let db = Arc::new(db);
    let minute = at(2025, 12, 31, 18, 0);
    db.insert(10, "Buy milk", minute).await.unwrap();

    let transport = Arc::new(RecordingTransport::default());
    let dispatcher = dispatcher(db.clone(), transport.clone(), true);

    dispatcher.dispatch_due(minute).await;
    let again = dispatcher
        .dispatch_due(minute + chrono::Duration::seconds(30))
        .await;

    assert_eq!(again, DispatchSummary { due: 1, sent: 0, skipped: 1, failed: 0 });
    assert_eq!(transport.sent().len(), 1);
    // The plan itself stays until its owner deletes it
    assert_eq!(db.find_due(minute).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_image_failure_falls_back_to_text() {
    let (db, _temp_dir) = setup_test_db().await;
    let db = Arc::new(db);
    let minute = at(2026, 2, 14, 20, 0);
    db.insert(10, "Dinner", minute).await.unwrap();

    let transport = Arc::new(RecordingTransport::default());
    let summary = dispatcher(db, transport.clone(), false)
        .dispatch_due(minute)
        .await;

    assert_eq!(summary.sent, 1);
    match &transport.sent()[..] {
        [Sent::Text { owner_id: 10, text }] => assert!(text.contains("Dinner")),
        other => panic!("unexpected sends {other:?}"),
    }
}

#[tokio::test]
async fn test_send_failure_does_not_stop_other_plans() {
    let (db, _temp_dir) = setup_test_db().await;
    let db = Arc::new(db);
    let minute = at(2026, 2, 14, 20, 0);
    db.insert(1, "Unreachable", minute).await.unwrap();
    db.insert(2, "Reachable", minute).await.unwrap();

    let transport = Arc::new(RecordingTransport::failing_for(&[1]));
    let summary = dispatcher(db.clone(), transport.clone(), true)
        .dispatch_due(minute)
        .await;

    assert_eq!(summary, DispatchSummary { due: 2, sent: 1, skipped: 0, failed: 1 });
    assert!(matches!(&transport.sent()[..], [Sent::Photo { owner_id: 2, .. }]));

    // The failed plan stays unstamped
    let failed = db.list_by_owner(1).await.unwrap().remove(0);
    assert!(failed.notified_at.is_none());
}

#[tokio::test]
async fn test_repository_failure_is_survivable() {
    let transport = Arc::new(RecordingTransport::default());
    let summary = dispatcher(Arc::new(FailingRepository), transport.clone(), true)
        .dispatch_due(at(2025, 1, 1, 0, 0))
        .await;

    assert_eq!(summary, DispatchSummary::default());
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_service_starts_and_stops() {
    let (db, _temp_dir) = setup_test_db().await;
    let transport = Arc::new(RecordingTransport::default());
    let dispatcher = Arc::new(dispatcher(Arc::new(db), transport, true));

    let mut service = ReminderService::new(dispatcher, "0 * * * * *").await.unwrap();
    tokio_test::assert_ok!(service.start().await);

    let summary = service.check_reminders_now().await;
    assert_eq!(summary.sent, 0);

    tokio_test::assert_ok!(service.stop().await);
}

#[tokio::test]
async fn test_service_rejects_bad_schedule() {
    let (db, _temp_dir) = setup_test_db().await;
    let transport = Arc::new(RecordingTransport::default());
    let dispatcher = Arc::new(dispatcher(Arc::new(db), transport, true));

    let mut service = ReminderService::new(dispatcher, "every minute please").await.unwrap();
    assert!(service.start().await.is_err());
}

#[tokio::test]
async fn test_longest_plan_is_delivered_in_full() {
    let (db, _temp_dir) = setup_test_db().await;
    let db = Arc::new(db);
    let minute = at(2025, 12, 31, 18, 0);
    let text = "x".repeat(MAX_PLAN_TEXT_CHARS);
    db.insert(10, &text, minute).await.unwrap();

    let transport = Arc::new(RecordingTransport::default());
    let summary = dispatcher(db.clone(), transport.clone(), true)
        .dispatch_due(minute)
        .await;

    assert_eq!(summary, DispatchSummary { due: 1, sent: 1, skipped: 0, failed: 0 });

    let plan = db.list_by_owner(10).await.unwrap().remove(0);
    let sent = transport.sent();
    assert_eq!(
        sent,
        vec![
            Sent::Photo { owner_id: 10, bytes: 4, caption: REMINDER_HEADLINE.to_string() },
            Sent::Text { owner_id: 10, text: reminder_text(&plan) },
        ]
    );
    for message in &sent {
        if let Sent::Photo { caption, .. } = message {
            assert!(caption.chars().count() <= MAX_CAPTION_CHARS);
        }
    }
    assert!(plan.notified_at.is_some());
}

#[tokio::test]
async fn test_rejected_photo_falls_back_to_text() {
    let (db, _temp_dir) = setup_test_db().await;
    let db = Arc::new(db);
    let minute = at(2025, 12, 31, 18, 0);
    db.insert(10, "Buy milk", minute).await.unwrap();

    let transport = Arc::new(RecordingTransport::rejecting_photos());
    let summary = dispatcher(db.clone(), transport.clone(), true)
        .dispatch_due(minute)
        .await;

    assert_eq!(summary, DispatchSummary { due: 1, sent: 1, skipped: 0, failed: 0 });

    let plan = db.list_by_owner(10).await.unwrap().remove(0);
    assert_eq!(transport.sent(), vec![Sent::Text { owner_id: 10, text: reminder_text(&plan) }]);
    assert!(plan.notified_at.is_some());
}
