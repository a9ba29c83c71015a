//! Plan tiers and the static limits catalog.
//!
//! The catalog is a compiled table, not persisted state: changing a limit is
//! a deployment event. Every numeric cap uses `-1` to mean "unlimited";
//! `0` on a boolean-gated resource means the feature is disabled entirely.
//!
//! # Example
//!
//! ```rust
//! use quotagate::plans::{PlanCatalog, PlanTier};
//!
//! let catalog = PlanCatalog::new();
//! let limits = catalog.limits_for(PlanTier::Pro, false);
//! assert_eq!(limits.max_workspaces, 3);
//!
//! // The trial variant only alters Pro.
//! let trial = catalog.limits_for(PlanTier::Pro, true);
//! assert_eq!(trial.max_web_searches_per_day, 75);
//! ```

use serde::{Deserialize, Serialize};

/// The unlimited sentinel: a limit of `-1` means "no cap".
pub const UNLIMITED: i64 = -1;

/// Check whether a limit value is the unlimited sentinel.
#[must_use]
pub fn is_unlimited(limit: i64) -> bool {
    limit == UNLIMITED
}

/// Subscription plan tier.
///
/// Immutable once chosen for a billing period; plan changes go through
/// [`PlanService::upgrade_plan`](crate::service::PlanService::upgrade_plan).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Free,
    Pro,
    Enterprise,
}

impl PlanTier {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request scheduling priority granted by a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanPriority {
    Standard,
    High,
    Maximum,
}

/// Per-resource caps for a plan.
///
/// Numeric caps are `i64` solely to carry the [`UNLIMITED`] sentinel; real
/// usage values are always non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    // Workspace & team
    pub max_workspaces: i64,
    pub max_owners_per_workspace: i64,
    pub max_collaborators_per_workspace: i64,

    // Chat
    pub max_active_chats_per_workspace: i64,
    /// Per-message input cap, not a running total.
    pub max_chat_input_tokens: i64,

    // Web search (per subscriber per day)
    pub max_web_searches_per_day: i64,

    // Web agent
    pub web_agent_enabled: bool,
    pub max_web_agent_runs_per_month: i64,
    pub max_web_agent_pages_per_run: i64,
    pub max_web_agent_run_duration_minutes: i64,

    // Workflows
    pub max_active_workflows_per_workspace: i64,
    pub max_workflow_executions_per_day_per_workflow: i64,
    pub max_workflow_concurrency: i64,
    pub max_workflow_run_duration_minutes: i64,

    // File analysis
    pub max_files_per_month: i64,
    pub max_file_size_mb: i64,
    pub max_file_pages_per_file: i64,
    /// Whether analyzed files persist into the knowledge base.
    pub files_persist_in_kb: bool,

    // Knowledge base
    pub knowledge_base_enabled: bool,
    pub max_knowledge_base_size_gb: i64,

    // System
    pub priority: PlanPriority,
    pub data_retention_days: i64,

    // Team features
    pub can_invite_users: bool,
    pub max_emails_per_month: i64,
    pub max_sms_per_month: i64,
}

/// Presentation metadata for a plan tier.
///
/// Kept next to the limits so the catalog stays the single source of truth,
/// but never consulted by the decision path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanConfig {
    pub tier: PlanTier,
    pub display_name: &'static str,
    pub tagline: &'static str,
    /// Price in cents; `-1` means custom pricing.
    pub monthly_price_cents: i64,
    pub yearly_price_cents: i64,
    pub features: &'static [&'static str],
    pub cta: &'static str,
}

const FREE_LIMITS: PlanLimits = PlanLimits {
    max_workspaces: 1,
    max_owners_per_workspace: 1,
    max_collaborators_per_workspace: 0,
    max_active_chats_per_workspace: 10,
    max_chat_input_tokens: 8_000,
    max_web_searches_per_day: 25,
    web_agent_enabled: false,
    max_web_agent_runs_per_month: 0,
    max_web_agent_pages_per_run: 0,
    max_web_agent_run_duration_minutes: 0,
    max_active_workflows_per_workspace: 5,
    max_workflow_executions_per_day_per_workflow: 1,
    max_workflow_concurrency: 1,
    max_workflow_run_duration_minutes: 10,
    max_files_per_month: 5,
    max_file_size_mb: 20,
    max_file_pages_per_file: 500,
    files_persist_in_kb: false,
    knowledge_base_enabled: false,
    max_knowledge_base_size_gb: 0,
    priority: PlanPriority::Standard,
    data_retention_days: 30,
    can_invite_users: false,
    max_emails_per_month: 3_000,
    max_sms_per_month: 0,
};

const PRO_LIMITS: PlanLimits = PlanLimits {
    max_workspaces: 3,
    max_owners_per_workspace: 1,
    max_collaborators_per_workspace: 5,
    max_active_chats_per_workspace: UNLIMITED,
    max_chat_input_tokens: 32_000,
    max_web_searches_per_day: 150,
    web_agent_enabled: true,
    max_web_agent_runs_per_month: 5,
    max_web_agent_pages_per_run: 100,
    max_web_agent_run_duration_minutes: 20,
    max_active_workflows_per_workspace: 20,
    max_workflow_executions_per_day_per_workflow: 1,
    max_workflow_concurrency: 2,
    max_workflow_run_duration_minutes: 20,
    max_files_per_month: 50,
    max_file_size_mb: 20,
    max_file_pages_per_file: 500,
    files_persist_in_kb: true,
    knowledge_base_enabled: true,
    max_knowledge_base_size_gb: 5,
    priority: PlanPriority::High,
    data_retention_days: 90,
    can_invite_users: true,
    max_emails_per_month: 50_000,
    max_sms_per_month: 0,
};

const ENTERPRISE_LIMITS: PlanLimits = PlanLimits {
    max_workspaces: UNLIMITED,
    max_owners_per_workspace: UNLIMITED,
    max_collaborators_per_workspace: UNLIMITED,
    max_active_chats_per_workspace: UNLIMITED,
    max_chat_input_tokens: 128_000,
    max_web_searches_per_day: UNLIMITED,
    web_agent_enabled: true,
    max_web_agent_runs_per_month: UNLIMITED,
    max_web_agent_pages_per_run: UNLIMITED,
    max_web_agent_run_duration_minutes: UNLIMITED,
    max_active_workflows_per_workspace: UNLIMITED,
    max_workflow_executions_per_day_per_workflow: UNLIMITED,
    max_workflow_concurrency: UNLIMITED,
    max_workflow_run_duration_minutes: UNLIMITED,
    max_files_per_month: UNLIMITED,
    max_file_size_mb: UNLIMITED,
    max_file_pages_per_file: UNLIMITED,
    files_persist_in_kb: true,
    knowledge_base_enabled: true,
    max_knowledge_base_size_gb: UNLIMITED,
    priority: PlanPriority::Maximum,
    data_retention_days: UNLIMITED,
    can_invite_users: true,
    max_emails_per_month: UNLIMITED,
    max_sms_per_month: UNLIMITED,
};

/// Pro limits with trial caps applied: fewer daily searches, monthly files
/// and web-agent runs while the subscriber evaluates the plan.
const TRIAL_PRO_LIMITS: PlanLimits = PlanLimits {
    max_web_searches_per_day: 75,
    max_files_per_month: 25,
    max_web_agent_runs_per_month: 2,
    ..PRO_LIMITS
};

const FREE_CONFIG: PlanConfig = PlanConfig {
    tier: PlanTier::Free,
    display_name: "Free",
    tagline: "1 workspace, 1 user. Unlimited chats, no knowledge base.",
    monthly_price_cents: 0,
    yearly_price_cents: 0,
    features: &[
        "Unlimited chats",
        "10 active chats per workspace",
        "25 web searches per day",
        "5 files per month (transient analysis)",
        "5 active workflows",
        "Unlimited connectors",
    ],
    cta: "Start for free",
};

const PRO_CONFIG: PlanConfig = PlanConfig {
    tier: PlanTier::Pro,
    display_name: "Pro",
    tagline: "Up to 3 workspaces. 1 user + 5 collaborators per workspace. Automations and web agent.",
    monthly_price_cents: 1_900,
    yearly_price_cents: 19_000,
    features: &[
        "Up to 3 workspaces",
        "1 user + 5 collaborators per workspace",
        "Unlimited chats",
        "150 web searches per day",
        "Web agent: 5 runs per month",
        "50 files per month (persistent)",
        "5 GB knowledge base",
        "20 active workflows",
        "High priority",
    ],
    cta: "Try Pro for 7 days",
};

const ENTERPRISE_CONFIG: PlanConfig = PlanConfig {
    tier: PlanTier::Enterprise,
    display_name: "Enterprise",
    tagline: "Unlimited and tailored: security, scale, advanced integrations.",
    monthly_price_cents: -1,
    yearly_price_cents: -1,
    features: &[
        "Unlimited workspaces",
        "Unlimited users and collaborators",
        "Unlimited chats (128k tokens)",
        "Unlimited web searches",
        "Unlimited web agent",
        "Unlimited files",
        "Unlimited knowledge base",
        "Unlimited workflows",
        "Maximum priority",
        "SSO SAML/SCIM",
        "Advanced audit",
        "EU data residency",
    ],
    cta: "Contact the team",
};

/// The static plan catalog.
///
/// A pure, total lookup: every tier is covered and the trial flag only
/// affects Pro, so there is no failure mode to handle at call sites.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanCatalog;

impl PlanCatalog {
    /// Create the catalog.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Limits for a tier, with the trial variant applied to Pro.
    #[must_use]
    pub fn limits_for(&self, tier: PlanTier, is_trial: bool) -> &'static PlanLimits {
        match (tier, is_trial) {
            (PlanTier::Pro, true) => &TRIAL_PRO_LIMITS,
            (PlanTier::Pro, false) => &PRO_LIMITS,
            (PlanTier::Free, _) => &FREE_LIMITS,
            (PlanTier::Enterprise, _) => &ENTERPRISE_LIMITS,
        }
    }

    /// Presentation metadata for a tier.
    #[must_use]
    pub fn config_for(&self, tier: PlanTier) -> &'static PlanConfig {
        match tier {
            PlanTier::Free => &FREE_CONFIG,
            PlanTier::Pro => &PRO_CONFIG,
            PlanTier::Enterprise => &ENTERPRISE_CONFIG,
        }
    }
}

/// Render a limit for display: the sentinel shows as "Unlimited", or
/// "Custom" on Enterprise where the real cap is contractual.
#[must_use]
pub fn format_limit(limit: i64, tier: PlanTier) -> String {
    if is_unlimited(limit) {
        if tier == PlanTier::Enterprise {
            "Custom".to_string()
        } else {
            "Unlimited".to_string()
        }
    } else {
        limit.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trial_only_affects_pro() {
        let catalog = PlanCatalog::new();

        assert_eq!(catalog.limits_for(PlanTier::Pro, false).max_web_searches_per_day, 150);
        assert_eq!(catalog.limits_for(PlanTier::Pro, true).max_web_searches_per_day, 75);
        assert_eq!(catalog.limits_for(PlanTier::Pro, true).max_files_per_month, 25);
        assert_eq!(catalog.limits_for(PlanTier::Pro, true).max_web_agent_runs_per_month, 2);

        // The trial flag is ignored off Pro.
        assert_eq!(
            catalog.limits_for(PlanTier::Free, true),
            catalog.limits_for(PlanTier::Free, false)
        );
        assert_eq!(
            catalog.limits_for(PlanTier::Enterprise, true),
            catalog.limits_for(PlanTier::Enterprise, false)
        );
    }

    #[test]
    fn test_trial_inherits_remaining_pro_limits() {
        let catalog = PlanCatalog::new();
        let pro = catalog.limits_for(PlanTier::Pro, false);
        let trial = catalog.limits_for(PlanTier::Pro, true);

        assert_eq!(trial.max_workspaces, pro.max_workspaces);
        assert_eq!(trial.max_chat_input_tokens, pro.max_chat_input_tokens);
        assert_eq!(trial.knowledge_base_enabled, pro.knowledge_base_enabled);
        assert_eq!(trial.max_knowledge_base_size_gb, pro.max_knowledge_base_size_gb);
    }

    #[test]
    fn test_free_tier_gates() {
        let limits = PlanCatalog::new().limits_for(PlanTier::Free, false);
        assert_eq!(limits.max_workspaces, 1);
        assert!(!limits.web_agent_enabled);
        assert!(!limits.knowledge_base_enabled);
        assert_eq!(limits.max_knowledge_base_size_gb, 0);
        assert!(!limits.can_invite_users);
        assert_eq!(limits.max_sms_per_month, 0);
    }

    #[test]
    fn test_enterprise_is_unlimited() {
        let limits = PlanCatalog::new().limits_for(PlanTier::Enterprise, false);
        assert!(is_unlimited(limits.max_workspaces));
        assert!(is_unlimited(limits.max_web_searches_per_day));
        assert!(is_unlimited(limits.max_sms_per_month));
        // Token cap is a real number even on Enterprise.
        assert_eq!(limits.max_chat_input_tokens, 128_000);
    }

    #[test]
    fn test_format_limit() {
        assert_eq!(format_limit(25, PlanTier::Free), "25");
        assert_eq!(format_limit(UNLIMITED, PlanTier::Pro), "Unlimited");
        assert_eq!(format_limit(UNLIMITED, PlanTier::Enterprise), "Custom");
    }

    #[test]
    fn test_tier_serde_snake_case() {
        assert_eq!(serde_json::to_string(&PlanTier::Pro).unwrap(), "\"pro\"");
        let tier: PlanTier = serde_json::from_str("\"enterprise\"").unwrap();
        assert_eq!(tier, PlanTier::Enterprise);
        assert_eq!(PlanTier::Free.to_string(), "free");
    }

    #[test]
    fn test_config_lookup() {
        let catalog = PlanCatalog::new();
        assert_eq!(catalog.config_for(PlanTier::Pro).display_name, "Pro");
        assert_eq!(catalog.config_for(PlanTier::Free).monthly_price_cents, 0);
        assert_eq!(catalog.config_for(PlanTier::Enterprise).monthly_price_cents, -1);
        assert!(!catalog.config_for(PlanTier::Pro).features.is_empty());
    }
}
