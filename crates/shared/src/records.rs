//! Write-only documents handed to the document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{domain::Purpose, form::FormData};

pub const FIELD_EMAIL: &str = "email";
pub const FIELD_STORAGE: &str = "storage";
pub const FIELD_BATTERY: &str = "battery";
pub const FIELD_PURPOSE: &str = "purpose";
/// Submission time, serialized as RFC 3339.
pub const FIELD_TIMESTAMP: &str = "timestamp";

/// Stored when the survey form has no email field to read from.
pub const UNKNOWN_EMAIL: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistRecord {
    pub email: String,
    #[serde(rename = "timestamp")]
    pub submitted_at: DateTime<Utc>,
}

impl WaitlistRecord {
    pub fn new(email: impl Into<String>, submitted_at: DateTime<Utc>) -> Self {
        Self {
            email: email.into(),
            submitted_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurposeFlags {
    #[serde(rename = "purpose_normal_storage")]
    pub normal_storage: bool,
    #[serde(rename = "purpose_video_server")]
    pub video_server: bool,
    #[serde(rename = "purpose_web_hosting")]
    pub web_hosting: bool,
}

impl PurposeFlags {
    /// Derives each flag independently from membership of the multi-valued `purpose` field.
    pub fn from_form(form: &FormData) -> Self {
        let checked = form.get_all(FIELD_PURPOSE);
        let has = |purpose: Purpose| checked.contains(&purpose.label());
        Self {
            normal_storage: has(Purpose::NormalStorage),
            video_server: has(Purpose::VideoServer),
            web_hosting: has(Purpose::WebHosting),
        }
    }

    pub fn is_set(&self, purpose: Purpose) -> bool {
        match purpose {
            Purpose::NormalStorage => self.normal_storage,
            Purpose::VideoServer => self.video_server,
            Purpose::WebHosting => self.web_hosting,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.normal_storage || self.video_server || self.web_hosting)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistRecord {
    pub email: String,
    #[serde(rename = "storage")]
    pub storage_tier: Option<String>,
    #[serde(rename = "battery")]
    pub battery_tier: Option<String>,
    #[serde(flatten)]
    pub purposes: PurposeFlags,
    #[serde(rename = "timestamp")]
    pub submitted_at: DateTime<Utc>,
}

impl WishlistRecord {
    pub fn from_form(form: &FormData, submitted_at: DateTime<Utc>) -> Self {
        Self {
            email: form.get(FIELD_EMAIL).unwrap_or(UNKNOWN_EMAIL).to_string(),
            storage_tier: form.get(FIELD_STORAGE).map(str::to_string),
            battery_tier: form.get(FIELD_BATTERY).map(str::to_string),
            purposes: PurposeFlags::from_form(form),
            submitted_at,
        }
    }
}
