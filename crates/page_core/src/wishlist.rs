//! Survey form: checkbox-gated submit, wishlist append, handoff to success.

use std::{collections::BTreeSet, sync::Arc};

use chrono::Utc;
use shared::{
    domain::{Collection, PanelState, Purpose},
    form::FormData,
    records::{WishlistRecord, FIELD_BATTERY, FIELD_EMAIL, FIELD_PURPOSE, FIELD_STORAGE},
};
use storage::PersistenceClient;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    on_session_end, persist, view::ViewController, FlowPhase, IgnoreReason, SubmitOutcome,
    TransitionError,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurveyForm {
    pub storage: Option<String>,
    pub battery: Option<String>,
    pub purposes: BTreeSet<Purpose>,
    pub submit_enabled: bool,
    pub phase: FlowPhase,
    /// Reveal count of the survey session the running submit belongs to.
    submitting_in: Option<u64>,
}

impl SurveyForm {
    /// Fields as the form would submit them; unchecked boxes and unselected groups are absent.
    pub fn form_data(&self, email: &str) -> FormData {
        let mut data = FormData::new().with(FIELD_EMAIL, email);
        if let Some(storage) = &self.storage {
            data.append(FIELD_STORAGE, storage);
        }
        if let Some(battery) = &self.battery {
            data.append(FIELD_BATTERY, battery);
        }
        for purpose in &self.purposes {
            data.append(FIELD_PURPOSE, purpose.label());
        }
        data
    }

    fn release(&mut self, reveals: u64) -> bool {
        if self.submitting_in != Some(reveals) {
            return false;
        }
        self.submitting_in = None;
        self.phase = FlowPhase::Idle;
        true
    }

    fn recompute_gate(&mut self) -> bool {
        let enabled = !self.purposes.is_empty();
        let changed = self.submit_enabled != enabled;
        self.submit_enabled = enabled;
        changed
    }
}

#[derive(Clone)]
pub struct WishlistFlow {
    view: ViewController,
    store: Arc<dyn PersistenceClient>,
    form: Arc<watch::Sender<SurveyForm>>,
}

impl WishlistFlow {
    pub fn new(view: ViewController, store: Arc<dyn PersistenceClient>) -> Self {
        let mut initial = SurveyForm::default();
        initial.recompute_gate();
        let (form, _) = watch::channel(initial);
        Self {
            view,
            store,
            form: Arc::new(form),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SurveyForm> {
        self.form.subscribe()
    }

    pub fn form(&self) -> SurveyForm {
        self.form.borrow().clone()
    }

    pub fn submit_enabled(&self) -> bool {
        self.form.borrow().submit_enabled
    }

    /// Checkbox change event; re-evaluates the submit gate.
    pub fn set_purpose(&self, purpose: Purpose, checked: bool) {
        self.form.send_if_modified(|form| {
            let toggled = if checked {
                form.purposes.insert(purpose)
            } else {
                form.purposes.remove(&purpose)
            };
            let gate_changed = form.recompute_gate();
            toggled || gate_changed
        });
    }

    pub fn select_storage(&self, tier: Option<String>) {
        self.form.send_if_modified(|form| {
            let changed = form.storage != tier;
            form.storage = tier;
            changed
        });
    }

    pub fn select_battery(&self, tier: Option<String>) {
        self.form.send_if_modified(|form| {
            let changed = form.battery != tier;
            form.battery = tier;
            changed
        });
    }

    /// The email field is pre-filled on entry but stays editable.
    pub fn on_email_input(&self, value: impl Into<String>) {
        self.view.set_survey_email(value);
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let view = self.view.snapshot();
        let Some(session) = view.session_on(PanelState::WishlistSurvey) else {
            debug!("wishlist: submit ignored, panel not shown");
            return SubmitOutcome::Ignored(IgnoreReason::PanelNotShown);
        };

        let mut ignored = None;
        let mut data = None;
        self.form.send_if_modified(|form| {
            if form.phase == FlowPhase::Submitting {
                ignored = Some(IgnoreReason::AlreadySubmitting);
                return false;
            }
            if !form.submit_enabled {
                ignored = Some(IgnoreReason::NothingSelected);
                return false;
            }
            form.phase = FlowPhase::Submitting;
            form.submitting_in = Some(session.reveals);
            data = Some(form.form_data(&view.survey_email));
            true
        });

        if let Some(reason) = ignored {
            debug!(?reason, "wishlist: submit ignored");
            return SubmitOutcome::Ignored(reason);
        }
        let Some(data) = data else {
            return SubmitOutcome::Ignored(IgnoreReason::PanelNotShown);
        };

        let tracked = Arc::clone(&self.form);
        on_session_end(&self.view, session, move || {
            tracked.send_if_modified(|form| form.release(session.reveals));
        });

        let record = WishlistRecord::from_form(&data, Utc::now());
        let stored = persist(self.store.as_ref(), Collection::Wishlist, &record).await;

        let revealed = match self.view.show_success_from(session, record.email).await {
            Ok(_) => true,
            Err(err @ TransitionError::Stale { .. }) => {
                debug!(error = %err, "wishlist: survey panel left before storage answered");
                false
            }
            Err(err) => {
                warn!(error = %err, "wishlist: success handoff refused");
                false
            }
        };

        self.form.send_if_modified(|form| form.release(session.reveals));
        SubmitOutcome::Submitted { stored, revealed }
    }
}

#[cfg(test)]
#[path = "tests/wishlist_tests.rs"]
mod tests;
