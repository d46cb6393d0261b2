//! Command orchestration helpers from UI actions to the backend command queue.

use tokio::sync::mpsc::{error::TrySendError, Sender};

use crate::backend_bridge::commands::PageCommand;

pub fn command_name(cmd: &PageCommand) -> &'static str {
    match cmd {
        PageCommand::OpenSignup => "open_signup",
        PageCommand::CaptureEmailInput(_) => "capture_email_input",
        PageCommand::SubmitWaitlist => "submit_waitlist",
        PageCommand::SurveyEmailInput(_) => "survey_email_input",
        PageCommand::SetPurpose { .. } => "set_purpose",
        PageCommand::SelectStorage(_) => "select_storage",
        PageCommand::SelectBattery(_) => "select_battery",
        PageCommand::SubmitWishlist => "submit_wishlist",
        PageCommand::BackToContent => "back_to_content",
    }
}

pub fn dispatch_page_command(cmd_tx: &Sender<PageCommand>, cmd: PageCommand, status: &mut String) {
    let cmd_name = command_name(&cmd);

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
        }
        Err(TrySendError::Closed(_)) => {
            *status =
                "Backend command processor disconnected (possible startup/runtime failure)"
                    .to_string();
        }
    }
}
