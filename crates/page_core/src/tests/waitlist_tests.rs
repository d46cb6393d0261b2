use super::*;
use crate::{test_support::RecordingStore, view::PageView};
use std::time::Duration;

async fn capture_flow(store: Arc<RecordingStore>) -> (ViewController, WaitlistFlow) {
    let view = ViewController::new(Duration::from_millis(600));
    let flow = WaitlistFlow::new(view.clone(), store, Timings::default());
    view.show_capture().await.expect("capture panel");
    (view, flow)
}

#[tokio::test(start_paused = true)]
async fn invalid_email_marks_field_until_clear_fires() {
    let store = Arc::new(RecordingStore::ok());
    let (view, flow) = capture_flow(store.clone()).await;

    flow.on_email_input("user@");
    assert_eq!(flow.submit().await, SubmitOutcome::Invalid);
    assert!(flow.form().errored);
    assert_eq!(flow.form().phase, FlowPhase::Idle);

    tokio::time::sleep(Duration::from_millis(499)).await;
    assert!(flow.form().errored, "marker must survive until the clear fires");
    assert!(view.snapshot().is_settled_on(PanelState::WaitlistCapture));

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert!(!flow.form().errored);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(view.visible(), PanelState::WaitlistCapture);
    assert!(store.appended().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn newer_error_keeps_its_full_window() {
    let store = Arc::new(RecordingStore::ok());
    let (_view, flow) = capture_flow(store).await;

    flow.on_email_input("user example.com");
    assert_eq!(flow.submit().await, SubmitOutcome::Invalid);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(flow.submit().await, SubmitOutcome::Invalid);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(flow.form().errored, "first timer must not clear the second marker");

    tokio::time::sleep(Duration::from_millis(201)).await;
    assert!(!flow.form().errored);
}

#[tokio::test(start_paused = true)]
async fn typing_clears_the_error_marker() {
    let store = Arc::new(RecordingStore::ok());
    let (_view, flow) = capture_flow(store).await;

    flow.on_email_input("");
    assert_eq!(flow.submit().await, SubmitOutcome::Invalid);
    assert!(flow.form().errored);

    flow.on_email_input("a");
    assert!(!flow.form().errored);
    assert_eq!(flow.form().email, "a");
}

async fn submit_valid_and_observe(store: Arc<RecordingStore>) -> (SubmitOutcome, PageView) {
    let (view, flow) = capture_flow(store).await;
    let reveals_before = view.snapshot().reveals;
    flow.on_email_input("a@b.co");

    let task = tokio::spawn({
        let flow = flow.clone();
        async move { flow.submit().await }
    });

    tokio::time::sleep(Duration::from_millis(599)).await;
    let mid = view.snapshot();
    assert_eq!(mid.visible, PanelState::WaitlistCapture);
    assert_eq!(mid.pending, Some(PanelState::WishlistSurvey));
    assert_eq!(flow.form().phase, FlowPhase::Submitting);

    let outcome = task.await.expect("join");
    let settled = view.snapshot();
    assert_eq!(settled.reveals, reveals_before + 1, "exactly one reveal");
    assert_eq!(flow.form().phase, FlowPhase::Idle);
    (outcome, settled)
}

#[tokio::test(start_paused = true)]
async fn valid_email_reaches_survey_whether_or_not_storage_succeeds() {
    let ok_store = Arc::new(RecordingStore::ok());
    let failing_store = Arc::new(RecordingStore::failing("firestore offline"));

    let (ok_outcome, ok_view) = submit_valid_and_observe(ok_store.clone()).await;
    let (failed_outcome, failed_view) = submit_valid_and_observe(failing_store.clone()).await;

    assert_eq!(
        ok_outcome,
        SubmitOutcome::Submitted {
            stored: true,
            revealed: true
        }
    );
    assert_eq!(
        failed_outcome,
        SubmitOutcome::Submitted {
            stored: false,
            revealed: true
        }
    );
    assert_eq!(ok_view, failed_view);
    assert!(ok_view.is_settled_on(PanelState::WishlistSurvey));
    assert_eq!(ok_view.survey_email, "a@b.co");

    assert_eq!(ok_store.appended().await.len(), 1);
    assert_eq!(failing_store.appended().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn sends_email_and_timestamp_to_waitlist_collection() {
    let store = Arc::new(RecordingStore::ok());
    let (_view, flow) = capture_flow(store.clone()).await;
    flow.on_email_input("a@b.co");
    flow.submit().await;

    let appended = store.appended().await;
    assert_eq!(appended.len(), 1);
    let (collection, document) = &appended[0];
    assert_eq!(*collection, Collection::Waitlist);
    assert_eq!(document["email"], "a@b.co");
    assert!(document["timestamp"].is_string());
}

#[tokio::test(start_paused = true)]
async fn second_submit_during_handoff_is_ignored() {
    let store = Arc::new(RecordingStore::ok());
    let (view, flow) = capture_flow(store.clone()).await;
    flow.on_email_input("a@b.co");

    let first = tokio::spawn({
        let flow = flow.clone();
        async move { flow.submit().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(
        flow.submit().await,
        SubmitOutcome::Ignored(IgnoreReason::PanelNotShown)
    );
    first.await.expect("join");

    assert_eq!(
        flow.submit().await,
        SubmitOutcome::Ignored(IgnoreReason::PanelNotShown)
    );
    assert_eq!(store.appended().await.len(), 1);
    assert_eq!(view.snapshot().visible, PanelState::WishlistSurvey);
}

#[tokio::test(start_paused = true)]
async fn second_submit_while_storage_is_pending_is_ignored() {
    let store = Arc::new(RecordingStore::slow(Duration::from_secs(2)));
    let (view, flow) = capture_flow(store.clone()).await;
    flow.on_email_input("a@b.co");

    let first = tokio::spawn({
        let flow = flow.clone();
        async move { flow.submit().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(view.snapshot().is_settled_on(PanelState::WaitlistCapture));
    assert_eq!(flow.form().phase, FlowPhase::Submitting);
    assert_eq!(
        flow.submit().await,
        SubmitOutcome::Ignored(IgnoreReason::AlreadySubmitting)
    );

    assert_eq!(
        first.await.expect("join"),
        SubmitOutcome::Submitted {
            stored: true,
            revealed: true
        }
    );
    assert_eq!(store.appended().await.len(), 1);
    assert!(view.snapshot().is_settled_on(PanelState::WishlistSurvey));
}

#[tokio::test(start_paused = true)]
async fn leaving_capture_drops_the_pending_handoff() {
    let store = Arc::new(RecordingStore::slow(Duration::from_secs(10)));
    let (view, flow) = capture_flow(store.clone()).await;
    flow.on_email_input("old@b.co");

    let stale = tokio::spawn({
        let flow = flow.clone();
        async move { flow.submit().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    view.reset().await.expect("back to content");
    assert_eq!(flow.form().phase, FlowPhase::Idle, "leaving the panel frees the flow");
    view.show_capture().await.expect("capture panel again");

    flow.on_email_input("new@b.co");
    let fresh = tokio::spawn({
        let flow = flow.clone();
        async move { flow.submit().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(flow.form().phase, FlowPhase::Submitting);

    assert_eq!(
        stale.await.expect("join"),
        SubmitOutcome::Submitted {
            stored: true,
            revealed: false
        }
    );
    assert!(view.snapshot().is_settled_on(PanelState::WaitlistCapture));
    assert_eq!(flow.form().phase, FlowPhase::Submitting, "stale submit leaves the new one busy");

    assert_eq!(
        fresh.await.expect("join"),
        SubmitOutcome::Submitted {
            stored: true,
            revealed: true
        }
    );
    let settled = view.snapshot();
    assert!(settled.is_settled_on(PanelState::WishlistSurvey));
    assert_eq!(settled.survey_email, "new@b.co");
    assert_eq!(flow.form().phase, FlowPhase::Idle);

    let emails: Vec<_> = store
        .appended()
        .await
        .into_iter()
        .map(|(_, doc)| doc["email"].clone())
        .collect();
    assert_eq!(emails, vec!["old@b.co", "new@b.co"]);
}

#[tokio::test(start_paused = true)]
async fn submit_while_hero_is_shown_is_ignored() {
    let store = Arc::new(RecordingStore::ok());
    let view = ViewController::new(Duration::from_millis(600));
    let flow = WaitlistFlow::new(view.clone(), store.clone(), Timings::default());
    flow.on_email_input("a@b.co");

    assert_eq!(
        flow.submit().await,
        SubmitOutcome::Ignored(IgnoreReason::PanelNotShown)
    );
    assert_eq!(view.visible(), PanelState::Content);
    assert!(store.appended().await.is_empty());
}
