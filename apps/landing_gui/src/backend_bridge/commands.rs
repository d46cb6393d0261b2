//! Page commands queued from the UI surface to the backend worker.

use shared::domain::Purpose;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCommand {
    /// Hero call-to-action.
    OpenSignup,
    CaptureEmailInput(String),
    SubmitWaitlist,
    SurveyEmailInput(String),
    SetPurpose {
        purpose: Purpose,
        checked: bool,
    },
    SelectStorage(Option<String>),
    SelectBattery(Option<String>),
    SubmitWishlist,
    BackToContent,
}
