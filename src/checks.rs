//! Pure quota decision functions.
//!
//! Each function takes a snapshot of the relevant counters plus the plan
//! limits and returns a [`UsageDecision`]; nothing here touches storage or
//! the clock. Callers feeding daily or monthly counters must apply the
//! matching reset before reading the snapshot, so yesterday's count is never
//! compared against today's limit — the service's loaders guarantee this.

use crate::decision::UsageDecision;
use crate::messages;
use crate::plans::{PlanLimits, PlanTier};

/// One gibibyte; knowledge-base caps are configured in GB but enforced in
/// bytes.
pub const GIB: u64 = 1024 * 1024 * 1024;

/// Convert a byte count to GB for display.
#[must_use]
pub fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / GIB as f64
}

/// The core comparison: allowed iff the limit is the unlimited sentinel or
/// `current + increment` stays within it.
#[must_use]
pub fn within_limit(current: u64, increment: u64, limit: i64) -> bool {
    match u64::try_from(limit) {
        Ok(max) => current.saturating_add(increment) <= max,
        // Negative limits are the unlimited sentinel.
        Err(_) => true,
    }
}

fn check_counter(
    current: u64,
    increment: u64,
    limit: i64,
    tier: PlanTier,
    feature: &str,
    reason: impl FnOnce(i64) -> String,
) -> UsageDecision {
    if within_limit(current, increment, limit) {
        UsageDecision::allow()
    } else {
        UsageDecision::deny(
            reason(limit),
            messages::upgrade_message(tier, feature),
            current,
            limit,
        )
    }
}

/// Can the subscriber create another workspace?
#[must_use]
pub fn check_workspace_cap(
    total_workspaces: u64,
    limits: &PlanLimits,
    tier: PlanTier,
) -> UsageDecision {
    check_counter(
        total_workspaces,
        1,
        limits.max_workspaces,
        tier,
        "workspaces",
        messages::workspace_limit,
    )
}

/// Can another owner join this workspace?
#[must_use]
pub fn check_owner_seats(owners_count: u64, limits: &PlanLimits, tier: PlanTier) -> UsageDecision {
    check_counter(
        owners_count,
        1,
        limits.max_owners_per_workspace,
        tier,
        "owners",
        messages::owner_limit,
    )
}

/// Can another collaborator be invited to this workspace?
///
/// Plans without the invite feature get a distinct "invites disabled"
/// denial rather than an over-limit one.
#[must_use]
pub fn check_collaborator_seats(
    collaborators_count: u64,
    limits: &PlanLimits,
    tier: PlanTier,
) -> UsageDecision {
    if !limits.can_invite_users {
        return UsageDecision::deny_feature(
            messages::invites_disabled(),
            messages::upgrade_message(tier, "invites"),
        );
    }
    check_counter(
        collaborators_count,
        1,
        limits.max_collaborators_per_workspace,
        tier,
        "collaborators",
        messages::collaborator_limit,
    )
}

/// Can another chat be opened in this workspace?
#[must_use]
pub fn check_active_chats(
    active_chats_count: u64,
    limits: &PlanLimits,
    tier: PlanTier,
) -> UsageDecision {
    check_counter(
        active_chats_count,
        1,
        limits.max_active_chats_per_workspace,
        tier,
        "active chats",
        messages::active_chat_limit,
    )
}

/// Does the subscriber have web searches left today?
#[must_use]
pub fn check_web_search(
    searches_today: u64,
    limits: &PlanLimits,
    tier: PlanTier,
) -> UsageDecision {
    check_counter(
        searches_today,
        1,
        limits.max_web_searches_per_day,
        tier,
        "web searches",
        messages::web_search_limit,
    )
}

/// Can a web-agent run start in this workspace this month?
#[must_use]
pub fn check_web_agent_run(
    runs_this_month: u64,
    limits: &PlanLimits,
    tier: PlanTier,
) -> UsageDecision {
    if !limits.web_agent_enabled {
        return UsageDecision::deny_feature(
            messages::web_agent_disabled(),
            messages::upgrade_message(tier, "the web agent"),
        );
    }
    check_counter(
        runs_this_month,
        1,
        limits.max_web_agent_runs_per_month,
        tier,
        "web agent runs",
        messages::web_agent_limit,
    )
}

/// Can another workflow be activated in this workspace?
#[must_use]
pub fn check_active_workflows(
    active_workflows_count: u64,
    limits: &PlanLimits,
    tier: PlanTier,
) -> UsageDecision {
    check_counter(
        active_workflows_count,
        1,
        limits.max_active_workflows_per_workspace,
        tier,
        "workflows",
        messages::workflow_limit,
    )
}

/// Can this workflow execute again today?
#[must_use]
pub fn check_workflow_executions(
    executions_today: u64,
    limits: &PlanLimits,
    tier: PlanTier,
) -> UsageDecision {
    check_counter(
        executions_today,
        1,
        limits.max_workflow_executions_per_day_per_workflow,
        tier,
        "workflow executions",
        messages::workflow_execution_limit,
    )
}

/// Can another file be analyzed in this workspace this month?
#[must_use]
pub fn check_file_upload(
    files_this_month: u64,
    limits: &PlanLimits,
    tier: PlanTier,
) -> UsageDecision {
    check_counter(
        files_this_month,
        1,
        limits.max_files_per_month,
        tier,
        "files",
        messages::file_limit,
    )
}

/// Can `add_bytes` be added to this workspace's knowledge base?
///
/// The cap is configured in GB but enforced byte-for-byte: one byte over
/// denies. A cap of zero (or a disabled flag) means the feature is absent
/// from the plan, not a zero-sized quota.
#[must_use]
pub fn check_knowledge_base(
    current_bytes: u64,
    add_bytes: u64,
    limits: &PlanLimits,
    tier: PlanTier,
) -> UsageDecision {
    let upgrade = || messages::upgrade_message(tier, "the knowledge base");
    if !limits.knowledge_base_enabled || limits.max_knowledge_base_size_gb == 0 {
        return UsageDecision::deny_feature(messages::knowledge_base_disabled(), upgrade());
    }
    match u64::try_from(limits.max_knowledge_base_size_gb) {
        Ok(max_gb) => {
            let max_bytes = max_gb * GIB;
            if current_bytes.saturating_add(add_bytes) <= max_bytes {
                UsageDecision::allow()
            } else {
                UsageDecision::deny(
                    messages::knowledge_base_full(limits.max_knowledge_base_size_gb),
                    upgrade(),
                    current_bytes,
                    limits.max_knowledge_base_size_gb,
                )
            }
        }
        Err(_) => UsageDecision::allow(),
    }
}

/// Does a single chat message fit the plan's per-message token cap?
///
/// This is not a running total; each message is judged on its own.
#[must_use]
pub fn check_chat_input(token_count: u64, limits: &PlanLimits, tier: PlanTier) -> UsageDecision {
    let limit = limits.max_chat_input_tokens;
    match u64::try_from(limit) {
        Ok(max) if token_count > max => UsageDecision::deny(
            messages::chat_token_limit(limit),
            messages::upgrade_message(tier, "chat input tokens"),
            token_count,
            limit,
        ),
        _ => UsageDecision::allow(),
    }
}

/// Can `count` more emails be sent from this workspace this month?
#[must_use]
pub fn check_email_send(
    emails_this_month: u64,
    count: u64,
    limits: &PlanLimits,
    tier: PlanTier,
) -> UsageDecision {
    check_counter(
        emails_this_month,
        count,
        limits.max_emails_per_month,
        tier,
        "emails",
        messages::email_limit,
    )
}

/// Can `count` more SMS messages be sent from this workspace this month?
///
/// A cap of zero means SMS is absent from the plan entirely.
#[must_use]
pub fn check_sms_send(
    sms_this_month: u64,
    count: u64,
    limits: &PlanLimits,
    tier: PlanTier,
) -> UsageDecision {
    if limits.max_sms_per_month == 0 {
        return UsageDecision::deny_feature(
            messages::sms_disabled(),
            messages::upgrade_message(tier, "SMS"),
        );
    }
    check_counter(
        sms_this_month,
        count,
        limits.max_sms_per_month,
        tier,
        "SMS messages",
        messages::sms_limit,
    )
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::plans::{PlanCatalog, UNLIMITED};

    fn free() -> &'static PlanLimits {
        PlanCatalog::new().limits_for(PlanTier::Free, false)
    }

    fn pro() -> &'static PlanLimits {
        PlanCatalog::new().limits_for(PlanTier::Pro, false)
    }

    fn enterprise() -> &'static PlanLimits {
        PlanCatalog::new().limits_for(PlanTier::Enterprise, false)
    }

    #[test]
    fn test_within_limit_sentinel_and_bounds() {
        assert!(within_limit(0, 1, UNLIMITED));
        assert!(within_limit(u64::MAX, 1, UNLIMITED));

        assert!(within_limit(0, 1, 1));
        assert!(!within_limit(1, 1, 1));
        assert!(within_limit(49, 1, 50));
        assert!(!within_limit(49, 2, 50));
        assert!(!within_limit(0, 1, 0));
    }

    proptest! {
        #[test]
        fn prop_unlimited_always_allows(current in 0u64..=u64::MAX, increment in 0u64..1_000) {
            prop_assert!(within_limit(current, increment, UNLIMITED));
        }

        #[test]
        fn prop_bounded_allows_iff_within(
            current in 0u64..100_000,
            increment in 0u64..1_000,
            limit in 0i64..100_000,
        ) {
            let expected = current + increment <= limit as u64;
            prop_assert_eq!(within_limit(current, increment, limit), expected);
        }
    }

    #[test]
    fn test_workspace_cap() {
        let denied = check_workspace_cap(1, free(), PlanTier::Free);
        assert!(!denied.is_allowed());
        assert_eq!(denied.current_usage, Some(1));
        assert_eq!(denied.limit, Some(1));
        assert!(denied.reason.as_deref().unwrap().contains("1 workspaces"));
        assert!(denied
            .upgrade_message
            .as_deref()
            .unwrap()
            .contains("Upgrade to Pro"));

        // Same usage under Pro limits is fine.
        assert!(check_workspace_cap(1, pro(), PlanTier::Pro).is_allowed());
        assert!(!check_workspace_cap(3, pro(), PlanTier::Pro).is_allowed());
        assert!(check_workspace_cap(500, enterprise(), PlanTier::Enterprise).is_allowed());
    }

    #[test]
    fn test_collaborator_gate_vs_limit() {
        // Free cannot invite at all: feature denial, no counters.
        let denied = check_collaborator_seats(0, free(), PlanTier::Free);
        assert!(!denied.is_allowed());
        assert!(denied.current_usage.is_none());
        assert!(denied.reason.as_deref().unwrap().contains("Pro plan"));

        // Pro can invite up to the seat cap: over-limit denial with counters.
        assert!(check_collaborator_seats(4, pro(), PlanTier::Pro).is_allowed());
        let denied = check_collaborator_seats(5, pro(), PlanTier::Pro);
        assert!(!denied.is_allowed());
        assert_eq!(denied.limit, Some(5));
    }

    #[test]
    fn test_owner_seats() {
        assert!(check_owner_seats(0, free(), PlanTier::Free).is_allowed());
        assert!(!check_owner_seats(1, free(), PlanTier::Free).is_allowed());
    }

    #[test]
    fn test_active_chats_unlimited_on_pro() {
        assert!(!check_active_chats(10, free(), PlanTier::Free).is_allowed());
        assert!(check_active_chats(10_000, pro(), PlanTier::Pro).is_allowed());
    }

    #[test]
    fn test_web_search_daily_cap() {
        assert!(check_web_search(24, free(), PlanTier::Free).is_allowed());
        let denied = check_web_search(25, free(), PlanTier::Free);
        assert!(!denied.is_allowed());
        assert_eq!(denied.current_usage, Some(25));
        assert_eq!(denied.limit, Some(25));
    }

    #[test]
    fn test_web_agent_gate_vs_limit() {
        let denied = check_web_agent_run(0, free(), PlanTier::Free);
        assert!(!denied.is_allowed());
        assert!(denied.current_usage.is_none());

        assert!(check_web_agent_run(4, pro(), PlanTier::Pro).is_allowed());
        let denied = check_web_agent_run(5, pro(), PlanTier::Pro);
        assert!(!denied.is_allowed());
        assert_eq!(denied.limit, Some(5));
    }

    #[test]
    fn test_workflow_caps() {
        assert!(check_active_workflows(4, free(), PlanTier::Free).is_allowed());
        assert!(!check_active_workflows(5, free(), PlanTier::Free).is_allowed());

        // One execution per workflow per day on Free.
        assert!(check_workflow_executions(0, free(), PlanTier::Free).is_allowed());
        assert!(!check_workflow_executions(1, free(), PlanTier::Free).is_allowed());
    }

    #[test]
    fn test_knowledge_base_byte_math() {
        assert_eq!(bytes_to_gb(5 * GIB), 5.00);

        // Disabled on Free regardless of usage.
        let denied = check_knowledge_base(0, 1, free(), PlanTier::Free);
        assert!(!denied.is_allowed());
        assert!(denied.current_usage.is_none());

        // Pro: 5 GB cap, enforced byte-for-byte.
        let cap = 5 * GIB;
        assert!(check_knowledge_base(cap - 1, 1, pro(), PlanTier::Pro).is_allowed());
        assert!(check_knowledge_base(0, cap, pro(), PlanTier::Pro).is_allowed());

        // One byte over denies.
        let denied = check_knowledge_base(cap, 1, pro(), PlanTier::Pro);
        assert!(!denied.is_allowed());
        assert_eq!(denied.current_usage, Some(cap));
        assert_eq!(denied.limit, Some(5));

        assert!(check_knowledge_base(u64::MAX / 2, GIB, enterprise(), PlanTier::Enterprise)
            .is_allowed());
    }

    #[test]
    fn test_chat_input_is_per_message() {
        assert!(check_chat_input(8_000, free(), PlanTier::Free).is_allowed());
        let denied = check_chat_input(8_001, free(), PlanTier::Free);
        assert!(!denied.is_allowed());
        assert_eq!(denied.current_usage, Some(8_001));
        assert_eq!(denied.limit, Some(8_000));

        assert!(check_chat_input(100_000, enterprise(), PlanTier::Enterprise).is_allowed());
        assert!(!check_chat_input(130_000, enterprise(), PlanTier::Enterprise).is_allowed());
    }

    #[test]
    fn test_email_send_with_explicit_count() {
        let mut limits = *pro();
        limits.max_emails_per_month = 50;

        assert!(check_email_send(49, 1, &limits, PlanTier::Pro).is_allowed());
        let denied = check_email_send(49, 2, &limits, PlanTier::Pro);
        assert!(!denied.is_allowed());
        assert_eq!(denied.current_usage, Some(49));
        assert_eq!(denied.limit, Some(50));
    }

    #[test]
    fn test_sms_zero_cap_reads_as_disabled() {
        let denied = check_sms_send(0, 1, pro(), PlanTier::Pro);
        assert!(!denied.is_allowed());
        assert!(denied.current_usage.is_none());
        assert!(denied.reason.as_deref().unwrap().contains("not included"));

        assert!(check_sms_send(1_000_000, 50, enterprise(), PlanTier::Enterprise).is_allowed());
    }
}
