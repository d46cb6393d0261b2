use super::*;
use crate::test_support::RecordingStore;
use proptest::prelude::*;
use std::time::Duration;

async fn survey_flow(store: Arc<RecordingStore>) -> (ViewController, WishlistFlow) {
    let view = ViewController::new(Duration::from_millis(600));
    let flow = WishlistFlow::new(view.clone(), store);
    view.show_capture().await.expect("capture panel");
    view.show_survey("a@b.co").await.expect("survey panel");
    (view, flow)
}

#[test]
fn submit_starts_disabled() {
    let view = ViewController::new(Duration::from_millis(600));
    let flow = WishlistFlow::new(view, Arc::new(RecordingStore::ok()));
    assert!(!flow.submit_enabled());
    assert!(flow.form().purposes.is_empty());
}

proptest! {
    #[test]
    fn submit_enabled_iff_some_purpose_checked(
        events in proptest::collection::vec((0usize..3, any::<bool>()), 0..24)
    ) {
        let view = ViewController::new(Duration::from_millis(600));
        let flow = WishlistFlow::new(view, Arc::new(RecordingStore::ok()));
        let mut checked = BTreeSet::new();

        for (idx, on) in events {
            let purpose = Purpose::ALL[idx];
            if on {
                checked.insert(purpose);
            } else {
                checked.remove(&purpose);
            }
            flow.set_purpose(purpose, on);

            let form = flow.form();
            prop_assert_eq!(form.submit_enabled, !checked.is_empty());
            prop_assert_eq!(form.purposes, checked.clone());
        }
    }
}

#[tokio::test(start_paused = true)]
async fn sends_derived_purpose_flags_and_tiers() {
    let store = Arc::new(RecordingStore::ok());
    let (view, flow) = survey_flow(store.clone()).await;

    flow.set_purpose(Purpose::VideoServer, true);
    flow.set_purpose(Purpose::WebHosting, true);
    flow.select_storage(Some("2TB".to_string()));
    flow.select_battery(Some("Large".to_string()));

    assert_eq!(
        flow.submit().await,
        SubmitOutcome::Submitted {
            stored: true,
            revealed: true
        }
    );

    let appended = store.appended().await;
    assert_eq!(appended.len(), 1);
    let (collection, record) = &appended[0];
    assert_eq!(*collection, Collection::Wishlist);
    assert_eq!(record["purpose_video_server"], true);
    assert_eq!(record["purpose_web_hosting"], true);
    assert_eq!(record["purpose_normal_storage"], false);
    assert_eq!(record["storage"], "2TB");
    assert_eq!(record["battery"], "Large");
    assert_eq!(record["email"], "a@b.co");

    let settled = view.snapshot();
    assert!(settled.is_settled_on(PanelState::Success));
    assert_eq!(settled.success_email, "a@b.co");
    assert_eq!(flow.form().phase, FlowPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn storage_failure_still_reaches_success() {
    let store = Arc::new(RecordingStore::failing("quota exceeded"));
    let (view, flow) = survey_flow(store.clone()).await;
    flow.set_purpose(Purpose::NormalStorage, true);

    let task = tokio::spawn({
        let flow = flow.clone();
        async move { flow.submit().await }
    });
    tokio::time::sleep(Duration::from_millis(599)).await;
    assert_eq!(view.snapshot().leaving, Some(PanelState::WishlistSurvey));

    assert_eq!(
        task.await.expect("join"),
        SubmitOutcome::Submitted {
            stored: false,
            revealed: true
        }
    );
    assert_eq!(view.visible(), PanelState::Success);
    assert_eq!(store.appended().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn gated_submit_sends_nothing() {
    let store = Arc::new(RecordingStore::ok());
    let (view, flow) = survey_flow(store.clone()).await;

    flow.set_purpose(Purpose::WebHosting, true);
    flow.set_purpose(Purpose::WebHosting, false);
    assert_eq!(
        flow.submit().await,
        SubmitOutcome::Ignored(IgnoreReason::NothingSelected)
    );
    assert!(store.appended().await.is_empty());
    assert!(view.snapshot().is_settled_on(PanelState::WishlistSurvey));
}

#[tokio::test(start_paused = true)]
async fn edited_email_is_carried_to_success() {
    let store = Arc::new(RecordingStore::ok());
    let (view, flow) = survey_flow(store.clone()).await;
    assert_eq!(view.snapshot().survey_email, "a@b.co");

    flow.on_email_input("fixed@b.co");
    flow.set_purpose(Purpose::NormalStorage, true);
    flow.submit().await;

    assert_eq!(store.appended().await[0].1["email"], "fixed@b.co");
    assert_eq!(view.snapshot().success_email, "fixed@b.co");
}

#[tokio::test(start_paused = true)]
async fn second_submit_while_storage_is_pending_is_ignored() {
    let store = Arc::new(RecordingStore::slow(Duration::from_secs(2)));
    let (view, flow) = survey_flow(store.clone()).await;
    flow.set_purpose(Purpose::NormalStorage, true);

    let first = tokio::spawn({
        let flow = flow.clone();
        async move { flow.submit().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(view.snapshot().is_settled_on(PanelState::WishlistSurvey));
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
    assert_eq!(view.visible(), PanelState::Success);
}

#[tokio::test(start_paused = true)]
async fn leaving_survey_drops_the_pending_handoff() {
    let store = Arc::new(RecordingStore::slow(Duration::from_secs(10)));
    let (view, flow) = survey_flow(store.clone()).await;
    flow.set_purpose(Purpose::VideoServer, true);

    let stale = tokio::spawn({
        let flow = flow.clone();
        async move { flow.submit().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    view.reset().await.expect("back to content");
    assert_eq!(flow.form().phase, FlowPhase::Idle);
    view.show_capture().await.expect("capture panel");
    view.show_survey("b@b.co").await.expect("survey panel again");

    let fresh = tokio::spawn({
        let flow = flow.clone();
        async move { flow.submit().await }
    });

    assert_eq!(
        stale.await.expect("join"),
        SubmitOutcome::Submitted {
            stored: true,
            revealed: false
        }
    );
    assert!(view.snapshot().is_settled_on(PanelState::WishlistSurvey));

    assert_eq!(
        fresh.await.expect("join"),
        SubmitOutcome::Submitted {
            stored: true,
            revealed: true
        }
    );
    let settled = view.snapshot();
    assert!(settled.is_settled_on(PanelState::Success));
    assert_eq!(settled.success_email, "b@b.co");

    let emails: Vec<_> = store
        .appended()
        .await
        .into_iter()
        .map(|(_, doc)| doc["email"].clone())
        .collect();
    assert_eq!(emails, vec!["a@b.co", "b@b.co"]);
}

#[tokio::test(start_paused = true)]
async fn submit_outside_survey_is_ignored() {
    let store = Arc::new(RecordingStore::ok());
    let view = ViewController::new(Duration::from_millis(600));
    let flow = WishlistFlow::new(view.clone(), store.clone());
    flow.set_purpose(Purpose::VideoServer, true);

    assert_eq!(
        flow.submit().await,
        SubmitOutcome::Ignored(IgnoreReason::PanelNotShown)
    );
    view.show_capture().await.expect("capture");
    assert_eq!(
        flow.submit().await,
        SubmitOutcome::Ignored(IgnoreReason::PanelNotShown)
    );
    assert!(store.appended().await.is_empty());
}

#[test]
fn form_data_lists_only_checked_purposes() {
    let form = SurveyForm {
        storage: Some("1TB".to_string()),
        battery: None,
        purposes: [Purpose::WebHosting, Purpose::NormalStorage].into_iter().collect(),
        submit_enabled: true,
        ..SurveyForm::default()
    };
    let data = form.form_data("a@b.co");
    assert_eq!(data.get_all(FIELD_PURPOSE), vec!["Normal Storage", "Web Hosting"]);
    assert_eq!(data.get(FIELD_STORAGE), Some("1TB"));
    assert_eq!(data.get(FIELD_BATTERY), None);
    assert_eq!(data.get(FIELD_EMAIL), Some("a@b.co"));
}
