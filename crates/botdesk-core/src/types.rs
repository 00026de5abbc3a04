use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The only moderation action type that is persisted. Unbans flip
/// `is_active` on existing ban rows.
pub const BAN_ACTION: &str = "ban";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub email: String,
}

/// A single-use credential letting an admin obtain a session as another user.
#[derive(Debug, Clone)]
pub struct ImpersonationToken {
    pub token: String,
    pub target_user_id: String,
    pub admin_id: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ImpersonationToken {
    /// Why the link can no longer be redeemed, or `None` if it still can.
    pub fn rejection_reason(&self, now: DateTime<Utc>) -> Option<&'static str> {
        if self.used_at.is_some() {
            Some("already used")
        } else if self.expires_at <= now {
            Some("expired")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModerationAction {
    pub id: i64,
    pub user_id: String,
    pub action_type: String,
    pub reason: Option<String>,
    pub admin_id: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ModerationAction {
    /// An active ban with no expiry, or one that has not lapsed yet.
    pub fn is_in_effect(&self, now: DateTime<Utc>) -> bool {
        self.action_type == BAN_ACTION
            && self.is_active
            && self.expires_at.is_none_or(|expires| expires > now)
    }
}

#[derive(Debug, Clone)]
pub struct NewModerationAction {
    pub user_id: String,
    pub action_type: String,
    pub reason: Option<String>,
    pub admin_id: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Subscriber {
    pub email: String,
    pub user_id: Option<String>,
    pub subscribed: bool,
    pub is_trial: bool,
    pub trial_end: Option<DateTime<Utc>>,
    pub subscription_tier: Option<String>,
    pub subscription_end: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Subscriber {
    /// A user may only ever receive one trial grant.
    pub fn has_trial_or_subscription(&self) -> bool {
        self.subscribed || self.is_trial
    }

    pub fn trial_active(&self, now: DateTime<Utc>) -> bool {
        self.is_trial && self.trial_end.is_some_and(|end| end > now)
    }
}

#[derive(Debug, Clone)]
pub struct TrialGrant {
    pub email: String,
    pub user_id: String,
    pub trial_end: DateTime<Utc>,
}

/// Payload recorded alongside an onboarding step.
///
/// Known step shapes are tagged by `kind`; anything else is preserved as-is.
/// Fields a known shape does not name are carried in `extra`, so a stored
/// payload always re-serializes to what the client sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepData {
    Known(KnownStepData),
    Opaque(serde_json::Value),
}

impl Default for StepData {
    fn default() -> Self {
        StepData::Opaque(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KnownStepData {
    BusinessProfile {
        company_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        website: Option<String>,
        #[serde(flatten)]
        extra: serde_json::Map<String, serde_json::Value>,
    },
    BotPersona {
        bot_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tone: Option<String>,
        #[serde(flatten)]
        extra: serde_json::Map<String, serde_json::Value>,
    },
    KnowledgeBase {
        #[serde(default)]
        sources: Vec<String>,
        #[serde(flatten)]
        extra: serde_json::Map<String, serde_json::Value>,
    },
    Widget {
        widget_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        primary_color: Option<String>,
        #[serde(flatten)]
        extra: serde_json::Map<String, serde_json::Value>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct OnboardingProgressEntry {
    pub user_id: String,
    pub step_id: String,
    pub completed_at: DateTime<Utc>,
    pub step_data: StepData,
}

/// Stored form of a one-time sign-in code. Only the hash is persisted.
#[derive(Debug, Clone)]
pub struct SignInCodeRecord {
    pub code_hash: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// The caller behind a resolved bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}
