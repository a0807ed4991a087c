//! Core data models and the JSON wire shapes of the generation endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single recorded farming suggestion.
///
/// Serialized with camelCase keys; the tip cache stores a JSON array of
/// these. Tips are never modified after they are appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tip {
    pub id: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    pub crop: String,
    pub stage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub text: String,
}

impl Tip {
    /// Build a new tip with a fresh UUID, stamped at `at`.
    pub fn new(profile: &FarmProfile, text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: at.to_rfc3339(),
            crop: profile.crop.clone(),
            stage: profile.stage.clone(),
            location: profile.location.clone(),
            text: text.into(),
        }
    }
}

/// What the farmer is growing, how far along it is, and where.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmProfile {
    pub crop: String,
    pub stage: String,
    #[serde(default)]
    pub location: Option<String>,
}

impl FarmProfile {
    pub fn new(crop: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            crop: crop.into(),
            stage: stage.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Body of `POST /plan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub crop: String,
    pub stage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub recent_tips: Vec<String>,
}

impl PlanRequest {
    pub fn new(profile: &FarmProfile, recent_tips: Vec<String>) -> Self {
        Self {
            crop: profile.crop.clone(),
            stage: profile.stage.clone(),
            location: profile.location.clone(),
            recent_tips,
        }
    }
}

/// Success body of `POST /plan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub plan_text: String,
}

/// Body of `POST /tip`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl From<&FarmProfile> for TipRequest {
    fn from(profile: &FarmProfile) -> Self {
        let non_empty = |s: &str| (!s.trim().is_empty()).then(|| s.to_string());
        Self {
            crop: non_empty(&profile.crop),
            stage: non_empty(&profile.stage),
            location: profile.location.clone(),
        }
    }
}

/// Success body of `POST /tip`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TipResponse {
    pub text_tip: String,
}

/// Error body returned by both endpoints on any non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
