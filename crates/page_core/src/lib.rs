use std::sync::Arc;

use serde::Serialize;
use shared::domain::Collection;
use storage::{append_record, AppendReceipt, PersistenceClient};
use tracing::{error, info};

pub mod config;
pub mod scene;
pub mod view;
pub mod waitlist;
pub mod wishlist;

pub use config::{load_settings, Settings, Timings};
pub use scene::{SceneRenderer, Viewport};
pub use view::{PageView, PanelSession, ScrollAnchor, ScrollLock, TransitionError, ViewController};
pub use waitlist::{CaptureForm, WaitlistFlow};
pub use wishlist::{SurveyForm, WishlistFlow};

/// Idle while the form is interactive; Submitting from submit until the handoff settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowPhase {
    #[default]
    Idle,
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    AlreadySubmitting,
    PanelNotShown,
    NothingSelected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Email failed the shape check; the field carries the error marker.
    Invalid,
    Ignored(IgnoreReason),
    /// `stored` reports persistence; the handoff does not depend on it.
    Submitted { stored: bool, revealed: bool },
}

/// Appends `record`, logging and swallowing any failure.
///
/// Signup completion never depends on storage durability, so the error stops here.
pub(crate) async fn persist<T>(
    store: &dyn PersistenceClient,
    collection: Collection,
    record: &T,
) -> bool
where
    T: Serialize + Sync,
{
    match append_record(store, collection, record).await {
        Ok(AppendReceipt::Stored(doc)) => {
            info!(collection = %doc.collection, id = %doc.id, backend = store.backend_name(), "store: document added");
            true
        }
        Ok(AppendReceipt::Skipped) => false,
        Err(err) => {
            error!(%collection, backend = store.backend_name(), "store: append failed: {err}");
            false
        }
    }
}

/// Runs `release` once `session` is over, so a submit parked on storage does not
/// hold the flow busy after the user has left its panel.
pub(crate) fn on_session_end<F>(view: &ViewController, session: PanelSession, release: F)
where
    F: FnOnce() + Send + 'static,
{
    let mut rx = view.subscribe();
    tokio::spawn(async move {
        let _ = rx.wait_for(|view| !session.is_current(view)).await;
        release();
    });
}

/// Everything the page-ready signal starts, minus the decorative scene which the
/// UI surface owns.
#[derive(Clone)]
pub struct LandingPage {
    pub view: ViewController,
    pub waitlist: WaitlistFlow,
    pub wishlist: WishlistFlow,
}

impl LandingPage {
    pub fn ready(timings: Timings, store: Arc<dyn PersistenceClient>) -> Self {
        let view = ViewController::new(timings.handoff);
        let waitlist = WaitlistFlow::new(view.clone(), Arc::clone(&store), timings);
        let wishlist = WishlistFlow::new(view.clone(), store);
        info!(
            handoff_ms = timings.handoff.as_millis() as u64,
            error_clear_ms = timings.error_clear.as_millis() as u64,
            "page: flows ready"
        );
        Self {
            view,
            waitlist,
            wishlist,
        }
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
