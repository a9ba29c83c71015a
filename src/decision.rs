//! The allow/deny result returned by every quota check.

use serde::{Deserialize, Serialize};

/// Result of a quota check.
///
/// Denials carry enough context (reason, upgrade suggestion, current usage,
/// limit) to render a user-facing explanation without a second lookup.
/// Feature-disabled denials carry no usage numbers: there is no meaningful
/// counter to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct UsageDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_usage: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl UsageDecision {
    /// The action is allowed.
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            upgrade_message: None,
            current_usage: None,
            limit: None,
        }
    }

    /// The action is denied because a counter would exceed its cap.
    pub fn deny(
        reason: impl Into<String>,
        upgrade_message: impl Into<String>,
        current_usage: u64,
        limit: i64,
    ) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            upgrade_message: Some(upgrade_message.into()),
            current_usage: Some(current_usage),
            limit: Some(limit),
        }
    }

    /// The action is denied because the feature itself is disabled on the
    /// subscriber's plan.
    pub fn deny_feature(reason: impl Into<String>, upgrade_message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            upgrade_message: Some(upgrade_message.into()),
            current_usage: None,
            limit: None,
        }
    }

    /// Whether the action is allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }
}
