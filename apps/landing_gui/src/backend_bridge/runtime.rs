//! Runtime bridge between the UI command queue and the page flows.
//!
//! The worker thread owns a current-thread tokio runtime, so every flow
//! callback and timer runs interleaved on a single thread.

use std::{sync::Arc, thread};

use crossbeam_channel::Sender;
use page_core::{config::build_persistence, view::TransitionOutcome, LandingPage, Settings};
use storage::{DisabledStore, PersistenceClient};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::backend_bridge::commands::PageCommand;
use crate::controller::events::{PageHandles, UiError, UiErrorContext, UiEvent};

pub fn launch(
    settings: Settings,
    cmd_rx: mpsc::Receiver<PageCommand>,
    ui_tx: Sender<UiEvent>,
    repaint: egui::Context,
) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(run(settings, cmd_rx, ui_tx, repaint));
    });
}

async fn run(
    settings: Settings,
    mut cmd_rx: mpsc::Receiver<PageCommand>,
    ui_tx: Sender<UiEvent>,
    repaint: egui::Context,
) {
    let store: Arc<dyn PersistenceClient> = match build_persistence(&settings).await {
        Ok(store) => store,
        Err(err) => {
            warn!("store: falling back to disabled backend: {err:#}");
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                UiErrorContext::BackendStartup,
                format!("{err:#}; signups will not be saved"),
            )));
            Arc::new(DisabledStore)
        }
    };
    let backend = store.backend_name();

    let page = LandingPage::ready(settings.timings(), store);
    let handles = PageHandles {
        view: page.view.subscribe(),
        capture: page.waitlist.subscribe(),
        survey: page.wishlist.subscribe(),
    };
    forward_repaints(page.view.subscribe(), repaint.clone());
    forward_repaints(page.waitlist.subscribe(), repaint.clone());
    forward_repaints(page.wishlist.subscribe(), repaint.clone());

    let _ = ui_tx.try_send(UiEvent::Ready { handles, backend });
    repaint.request_repaint();

    while let Some(cmd) = cmd_rx.recv().await {
        apply_command(&page, cmd, &ui_tx);
    }
    info!("page: command queue closed, backend worker stopping");
}

fn forward_repaints<T>(mut rx: watch::Receiver<T>, ctx: egui::Context)
where
    T: Send + Sync + 'static,
{
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            ctx.request_repaint();
        }
    });
}

fn apply_command(page: &LandingPage, cmd: PageCommand, ui_tx: &Sender<UiEvent>) {
    match cmd {
        PageCommand::OpenSignup => {
            let view = page.view.clone();
            let ui_tx = ui_tx.clone();
            tokio::spawn(async move {
                report_transition(view.show_capture().await, &ui_tx);
            });
        }
        PageCommand::BackToContent => {
            let view = page.view.clone();
            let ui_tx = ui_tx.clone();
            tokio::spawn(async move {
                report_transition(view.reset().await, &ui_tx);
            });
        }
        PageCommand::CaptureEmailInput(value) => page.waitlist.on_email_input(value),
        PageCommand::SubmitWaitlist => {
            let flow = page.waitlist.clone();
            tokio::spawn(async move {
                let outcome = flow.submit().await;
                debug!(?outcome, "waitlist: submit finished");
            });
        }
        PageCommand::SurveyEmailInput(value) => page.wishlist.on_email_input(value),
        PageCommand::SetPurpose { purpose, checked } => page.wishlist.set_purpose(purpose, checked),
        PageCommand::SelectStorage(tier) => page.wishlist.select_storage(tier),
        PageCommand::SelectBattery(tier) => page.wishlist.select_battery(tier),
        PageCommand::SubmitWishlist => {
            let flow = page.wishlist.clone();
            tokio::spawn(async move {
                let outcome = flow.submit().await;
                debug!(?outcome, "wishlist: submit finished");
            });
        }
    }
}

fn report_transition(
    result: Result<TransitionOutcome, page_core::TransitionError>,
    ui_tx: &Sender<UiEvent>,
) {
    match result {
        Ok(outcome) => debug!(?outcome, "view: navigation finished"),
        Err(err) => {
            debug!(error = %err, "view: navigation refused");
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_transition(
                UiErrorContext::Navigation,
                &err,
            )));
        }
    }
}
