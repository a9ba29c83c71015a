//! User-facing denial messages and upgrade prompts.
//!
//! Every denial reason is templated from the limit that was hit so the host
//! application can render it without a second lookup.

use crate::plans::PlanTier;

/// Upgrade suggestion keyed by the subscriber's current tier.
#[must_use]
pub fn upgrade_message(tier: PlanTier, feature: &str) -> String {
    match tier {
        PlanTier::Free => format!(
            "{feature} is available starting from the Pro plan. Upgrade to Pro to unlock it."
        ),
        PlanTier::Pro => format!(
            "You have reached your {feature} limit. Upgrade to Enterprise for higher limits."
        ),
        PlanTier::Enterprise => format!(
            "You have reached your contracted {feature} limit. Contact the team to raise it."
        ),
    }
}

pub(crate) fn workspace_limit(limit: i64) -> String {
    format!("Your plan allows {limit} workspaces. Upgrade to create more.")
}

pub(crate) fn owner_limit(limit: i64) -> String {
    format!("You have reached the limit of {limit} owners for this workspace.")
}

pub(crate) fn collaborator_limit(limit: i64) -> String {
    format!("You have reached the limit of {limit} collaborators for this workspace.")
}

pub(crate) fn invites_disabled() -> String {
    "Inviting collaborators is available starting from the Pro plan.".to_string()
}

pub(crate) fn active_chat_limit(limit: i64) -> String {
    format!("You have reached the maximum of {limit} active chats. Archive an existing chat or upgrade.")
}

pub(crate) fn web_search_limit(limit: i64) -> String {
    format!("You have used all {limit} daily web searches. Try again tomorrow or upgrade your plan.")
}

pub(crate) fn web_agent_disabled() -> String {
    "The web agent is available starting from the Pro plan.".to_string()
}

pub(crate) fn web_agent_limit(limit: i64) -> String {
    format!("You have reached the limit of {limit} web agent runs this month.")
}

pub(crate) fn workflow_limit(limit: i64) -> String {
    format!("You have reached the limit of {limit} active workflows for this workspace.")
}

pub(crate) fn workflow_execution_limit(limit: i64) -> String {
    format!("You have reached the daily limit of {limit} executions for this workflow.")
}

pub(crate) fn file_limit(limit: i64) -> String {
    format!("You have reached the limit of {limit} files this month.")
}

pub(crate) fn knowledge_base_disabled() -> String {
    "The knowledge base is available starting from the Pro plan.".to_string()
}

pub(crate) fn knowledge_base_full(limit_gb: i64) -> String {
    format!("You have used all {limit_gb} GB of knowledge base storage. Delete some files or upgrade.")
}

pub(crate) fn chat_token_limit(limit: i64) -> String {
    format!("The message exceeds the {limit} token limit for your plan.")
}

pub(crate) fn email_limit(limit: i64) -> String {
    format!("You have reached the limit of {limit} emails this month.")
}

pub(crate) fn sms_limit(limit: i64) -> String {
    format!("You have reached the limit of {limit} SMS messages this month.")
}

pub(crate) fn sms_disabled() -> String {
    "SMS sending is not included in your plan. It is available on Enterprise contracts.".to_string()
}
