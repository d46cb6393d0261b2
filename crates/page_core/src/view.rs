//! Single owner of panel visibility, fade handoffs and the page scroll lock.

use std::{sync::Arc, time::Duration};

use shared::domain::PanelState;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollLock {
    Locked,
    #[default]
    Unlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAnchor {
    PageTop,
    SignupSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

/// A scroll the UI surface should perform once; `seq` grows with every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    pub anchor: ScrollAnchor,
    pub behavior: ScrollBehavior,
    pub seq: u64,
}

/// Snapshot of everything the UI surface needs to lay out the panels.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageView {
    pub visible: PanelState,
    /// Panel fading out during a handoff.
    pub leaving: Option<PanelState>,
    /// Panel to reveal once the handoff delay elapses.
    pub pending: Option<PanelState>,
    pub scroll_lock: ScrollLock,
    pub scroll: Option<ScrollRequest>,
    pub survey_email: String,
    pub success_email: String,
    /// Number of completed reveals.
    pub reveals: u64,
}

/// One stay on a settled panel; the next reveal ends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelSession {
    pub panel: PanelState,
    pub reveals: u64,
}

impl PanelSession {
    pub fn is_current(&self, view: &PageView) -> bool {
        view.visible == self.panel && view.reveals == self.reveals
    }
}

impl PageView {
    /// Session for `panel` when it is on screen and not fading out.
    pub fn session_on(&self, panel: PanelState) -> Option<PanelSession> {
        self.is_settled_on(panel).then_some(PanelSession {
            panel,
            reveals: self.reveals,
        })
    }

    pub fn is_transitioning(&self) -> bool {
        self.pending.is_some()
    }

    /// True when `panel` is on screen and not fading out.
    pub fn is_settled_on(&self, panel: PanelState) -> bool {
        self.visible == panel && self.pending.is_none()
    }

    fn request_scroll(&mut self, anchor: ScrollAnchor, behavior: ScrollBehavior) {
        let seq = self.scroll.map_or(1, |prev| prev.seq + 1);
        self.scroll = Some(ScrollRequest {
            anchor,
            behavior,
            seq,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Revealed,
    /// Reset asked for while already settled on Content.
    AlreadyThere,
    /// Reset asked for while a reset was already pending.
    Coalesced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot move from {from:?} to {to:?}")]
    Invalid { from: PanelState, to: PanelState },
    #[error("transition to {pending:?} still in flight; refused {requested:?}")]
    InFlight {
        pending: PanelState,
        requested: PanelState,
    },
    #[error("{session:?} ended before the handoff; refused {requested:?}")]
    Stale {
        session: PanelSession,
        requested: PanelState,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrollTiming {
    OnBegin,
    OnReveal,
}

#[derive(Debug, Clone, Copy)]
struct RevealPolicy {
    lock: ScrollLock,
    anchor: ScrollAnchor,
    behavior: ScrollBehavior,
    timing: ScrollTiming,
}

impl RevealPolicy {
    fn for_panel(panel: PanelState) -> Self {
        match panel {
            PanelState::Content | PanelState::WaitlistCapture => Self {
                lock: ScrollLock::Unlocked,
                anchor: ScrollAnchor::SignupSection,
                behavior: ScrollBehavior::Smooth,
                timing: ScrollTiming::OnReveal,
            },
            PanelState::WishlistSurvey => Self {
                lock: ScrollLock::Unlocked,
                anchor: ScrollAnchor::PageTop,
                behavior: ScrollBehavior::Instant,
                timing: ScrollTiming::OnReveal,
            },
            PanelState::Success => Self {
                lock: ScrollLock::Locked,
                anchor: ScrollAnchor::PageTop,
                behavior: ScrollBehavior::Smooth,
                timing: ScrollTiming::OnBegin,
            },
        }
    }
}

enum Carry {
    Nothing,
    SurveyEmail(String),
    SuccessEmail(String),
}

#[derive(Clone)]
pub struct ViewController {
    state: Arc<watch::Sender<PageView>>,
    handoff: Duration,
}

impl ViewController {
    pub fn new(handoff: Duration) -> Self {
        let (state, _) = watch::channel(PageView::default());
        Self {
            state: Arc::new(state),
            handoff,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PageView> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> PageView {
        self.state.borrow().clone()
    }

    pub fn visible(&self) -> PanelState {
        self.state.borrow().visible
    }

    pub fn handoff(&self) -> Duration {
        self.handoff
    }

    pub async fn show_capture(&self) -> Result<TransitionOutcome, TransitionError> {
        self.transition(PanelState::WaitlistCapture, Carry::Nothing, None)
            .await
    }

    /// Reveals the survey with its email field pre-filled.
    pub async fn show_survey(
        &self,
        email: impl Into<String>,
    ) -> Result<TransitionOutcome, TransitionError> {
        self.transition(PanelState::WishlistSurvey, Carry::SurveyEmail(email.into()), None)
            .await
    }

    /// Like `show_survey`, but refused with `Stale` once `session` has ended.
    pub async fn show_survey_from(
        &self,
        session: PanelSession,
        email: impl Into<String>,
    ) -> Result<TransitionOutcome, TransitionError> {
        self.transition(
            PanelState::WishlistSurvey,
            Carry::SurveyEmail(email.into()),
            Some(session),
        )
        .await
    }

    pub async fn show_success(
        &self,
        email: impl Into<String>,
    ) -> Result<TransitionOutcome, TransitionError> {
        self.transition(PanelState::Success, Carry::SuccessEmail(email.into()), None)
            .await
    }

    /// Like `show_success`, but refused with `Stale` once `session` has ended.
    pub async fn show_success_from(
        &self,
        session: PanelSession,
        email: impl Into<String>,
    ) -> Result<TransitionOutcome, TransitionError> {
        self.transition(
            PanelState::Success,
            Carry::SuccessEmail(email.into()),
            Some(session),
        )
        .await
    }

    /// Back to the hero content. Safe to call repeatedly and from any overlay.
    pub async fn reset(&self) -> Result<TransitionOutcome, TransitionError> {
        self.transition(PanelState::Content, Carry::Nothing, None)
            .await
    }

    /// User edit of the survey's pre-filled email field.
    pub fn set_survey_email(&self, email: impl Into<String>) {
        let email = email.into();
        self.state.send_if_modified(|view| {
            if view.survey_email == email {
                return false;
            }
            view.survey_email = email;
            true
        });
    }

    async fn transition(
        &self,
        target: PanelState,
        carry: Carry,
        session: Option<PanelSession>,
    ) -> Result<TransitionOutcome, TransitionError> {
        let policy = RevealPolicy::for_panel(target);
        let mut early: Result<Option<TransitionOutcome>, TransitionError> = Ok(None);

        self.state.send_if_modified(|view| {
            if let Some(session) = session.filter(|s| !s.is_current(view)) {
                early = Err(TransitionError::Stale {
                    session,
                    requested: target,
                });
                return false;
            }

            if let Some(pending) = view.pending {
                early = if pending == target && target == PanelState::Content {
                    Ok(Some(TransitionOutcome::Coalesced))
                } else {
                    Err(TransitionError::InFlight {
                        pending,
                        requested: target,
                    })
                };
                return false;
            }

            if target == PanelState::Content && view.visible == PanelState::Content {
                early = Ok(Some(TransitionOutcome::AlreadyThere));
                let changed = view.scroll_lock != policy.lock;
                view.scroll_lock = policy.lock;
                return changed;
            }

            if !view.visible.can_transition_to(target) {
                early = Err(TransitionError::Invalid {
                    from: view.visible,
                    to: target,
                });
                return false;
            }

            view.leaving = Some(view.visible);
            view.pending = Some(target);
            if policy.timing == ScrollTiming::OnBegin {
                view.request_scroll(policy.anchor, policy.behavior);
            }
            true
        });

        if let Some(outcome) = early? {
            debug!(panel = ?target, ?outcome, "view: transition short-circuited");
            return Ok(outcome);
        }

        debug!(panel = ?target, delay_ms = self.handoff.as_millis() as u64, "view: handoff started");
        tokio::time::sleep(self.handoff).await;

        self.state.send_modify(|view| {
            view.leaving = None;
            view.pending = None;
            view.visible = target;
            view.scroll_lock = policy.lock;
            match carry {
                Carry::Nothing => {}
                Carry::SurveyEmail(email) => view.survey_email = email,
                Carry::SuccessEmail(email) => view.success_email = email,
            }
            if policy.timing == ScrollTiming::OnReveal {
                view.request_scroll(policy.anchor, policy.behavior);
            }
            view.reveals += 1;
        });
        info!(panel = ?target, "view: panel revealed");

        Ok(TransitionOutcome::Revealed)
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
