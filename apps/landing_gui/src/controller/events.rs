//! UI/backend events and error modeling for the landing window controller.

use page_core::{CaptureForm, PageView, SurveyForm, TransitionError};
use tokio::sync::watch;

/// Read side of the page state; the backend worker is the only writer.
pub struct PageHandles {
    pub view: watch::Receiver<PageView>,
    pub capture: watch::Receiver<CaptureForm>,
    pub survey: watch::Receiver<SurveyForm>,
}

pub enum UiEvent {
    Ready {
        handles: PageHandles,
        backend: &'static str,
    },
    Info(String),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Storage,
    Transition,
    Config,
    Transport,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Navigation,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("project id")
            || message_lower.contains("config")
            || message_lower.contains("invalid url")
        {
            UiErrorCategory::Config
        } else if message_lower.contains("sqlite")
            || message_lower.contains("database")
            || message_lower.contains("document store")
            || message_lower.contains("firestore")
        {
            UiErrorCategory::Storage
        } else if message_lower.contains("timeout")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("disconnected")
            || message_lower.contains("unavailable")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_transition(context: UiErrorContext, err: &TransitionError) -> Self {
        Self {
            category: UiErrorCategory::Transition,
            context,
            message: err.to_string(),
        }
    }

    /// Startup problems get a banner; everything else only reaches the status line.
    pub fn wants_banner(&self) -> bool {
        self.context == UiErrorContext::BackendStartup
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Storage => "Storage",
        UiErrorCategory::Transition => "Navigation",
        UiErrorCategory::Config => "Configuration",
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Unknown => "Unexpected",
    }
}
