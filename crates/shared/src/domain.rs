use serde::{Deserialize, Serialize};

/// Mutually-exclusive full-section views of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelState {
    #[default]
    Content,
    WaitlistCapture,
    WishlistSurvey,
    Success,
}

impl PanelState {
    /// Forward moves go one step along Content → WaitlistCapture → WishlistSurvey → Success;
    /// every overlay may fall back to Content.
    pub fn can_transition_to(self, target: PanelState) -> bool {
        matches!(
            (self, target),
            (PanelState::Content, PanelState::WaitlistCapture)
                | (PanelState::WaitlistCapture, PanelState::WishlistSurvey)
                | (PanelState::WishlistSurvey, PanelState::Success)
                | (PanelState::WaitlistCapture, PanelState::Content)
                | (PanelState::WishlistSurvey, PanelState::Content)
                | (PanelState::Success, PanelState::Content)
        )
    }

    pub fn is_overlay(self) -> bool {
        self != PanelState::Content
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    NormalStorage,
    VideoServer,
    WebHosting,
}

impl Purpose {
    pub const ALL: [Purpose; 3] = [
        Purpose::NormalStorage,
        Purpose::VideoServer,
        Purpose::WebHosting,
    ];

    /// Value carried by the survey's `purpose` checkbox.
    pub fn label(self) -> &'static str {
        match self {
            Purpose::NormalStorage => "Normal Storage",
            Purpose::VideoServer => "Video Server",
            Purpose::WebHosting => "Web Hosting",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|purpose| purpose.label() == label)
    }
}

/// Named append-only buckets in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Waitlist,
    Wishlist,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Waitlist, Collection::Wishlist];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Waitlist => "waitlist",
            Collection::Wishlist => "wishlist",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|collection| collection.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
