//! Capture form: email shape check, waitlist append, handoff to the survey.

use std::sync::Arc;

use chrono::Utc;
use shared::{
    domain::{Collection, PanelState},
    records::WaitlistRecord,
    validate::validate_email,
};
use storage::PersistenceClient;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    config::Timings, on_session_end, persist, view::ViewController, FlowPhase, IgnoreReason,
    SubmitOutcome, TransitionError,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureForm {
    pub email: String,
    /// Visible error marker on the email field.
    pub errored: bool,
    pub phase: FlowPhase,
    error_generation: u64,
    /// Reveal count of the capture session the running submit belongs to.
    submitting_in: Option<u64>,
}

impl CaptureForm {
    fn release(&mut self, reveals: u64) -> bool {
        if self.submitting_in != Some(reveals) {
            return false;
        }
        self.submitting_in = None;
        self.phase = FlowPhase::Idle;
        true
    }
}

#[derive(Clone)]
pub struct WaitlistFlow {
    view: ViewController,
    store: Arc<dyn PersistenceClient>,
    timings: Timings,
    form: Arc<watch::Sender<CaptureForm>>,
}

impl WaitlistFlow {
    pub fn new(view: ViewController, store: Arc<dyn PersistenceClient>, timings: Timings) -> Self {
        let (form, _) = watch::channel(CaptureForm::default());
        Self {
            view,
            store,
            timings,
            form: Arc::new(form),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CaptureForm> {
        self.form.subscribe()
    }

    pub fn form(&self) -> CaptureForm {
        self.form.borrow().clone()
    }

    /// Typing replaces the field value and drops any error marker.
    pub fn on_email_input(&self, value: impl Into<String>) {
        let value = value.into();
        self.form.send_if_modified(|form| {
            if form.email == value && !form.errored {
                return false;
            }
            form.email = value;
            form.errored = false;
            true
        });
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let Some(session) = self.view.snapshot().session_on(PanelState::WaitlistCapture) else {
            debug!("waitlist: submit ignored, panel not shown");
            return SubmitOutcome::Ignored(IgnoreReason::PanelNotShown);
        };

        let mut busy = false;
        let mut accepted = None;
        let mut rejected = None;
        self.form.send_if_modified(|form| {
            if form.phase == FlowPhase::Submitting {
                busy = true;
                return false;
            }
            match validate_email(&form.email) {
                Ok(()) => {
                    form.phase = FlowPhase::Submitting;
                    form.submitting_in = Some(session.reveals);
                    accepted = Some(form.email.clone());
                }
                Err(err) => {
                    form.errored = true;
                    form.error_generation += 1;
                    rejected = Some((err, form.error_generation));
                }
            }
            true
        });

        if busy {
            debug!("waitlist: submit ignored, already submitting");
            return SubmitOutcome::Ignored(IgnoreReason::AlreadySubmitting);
        }
        if let Some((err, generation)) = rejected {
            debug!(code = ?err.code(), "waitlist: rejected email input");
            self.schedule_error_clear(generation);
            return SubmitOutcome::Invalid;
        }
        let Some(email) = accepted else {
            return SubmitOutcome::Ignored(IgnoreReason::PanelNotShown);
        };

        let tracked = Arc::clone(&self.form);
        on_session_end(&self.view, session, move || {
            tracked.send_if_modified(|form| form.release(session.reveals));
        });

        let record = WaitlistRecord::new(email.clone(), Utc::now());
        let stored = persist(self.store.as_ref(), Collection::Waitlist, &record).await;

        let revealed = match self.view.show_survey_from(session, email).await {
            Ok(_) => true,
            Err(err @ TransitionError::Stale { .. }) => {
                debug!(error = %err, "waitlist: capture panel left before storage answered");
                false
            }
            Err(err) => {
                warn!(error = %err, "waitlist: survey handoff refused");
                false
            }
        };

        self.form.send_if_modified(|form| form.release(session.reveals));
        SubmitOutcome::Submitted { stored, revealed }
    }

    fn schedule_error_clear(&self, generation: u64) {
        let form = Arc::clone(&self.form);
        let delay = self.timings.error_clear;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            form.send_if_modified(|form| {
                if !form.errored || form.error_generation != generation {
                    return false;
                }
                form.errored = false;
                true
            });
        });
    }
}

#[cfg(test)]
#[path = "tests/waitlist_tests.rs"]
mod tests;
