//! Plan lifecycle and quota enforcement orchestration.
//!
//! [`PlanService`] ties the pieces together: it resolves a subscriber's
//! effective plan (trial and expiry included), loads usage records (applying
//! calendar resets and lazily creating missing records), dispatches a
//! [`UsageAction`] to the matching check or recorder, and persists the
//! outcome.
//!
//! # Example
//!
//! ```rust,ignore
//! use quotagate::{EngineConfig, PlanCatalog, PlanService, UsageAction};
//!
//! let service = PlanService::new(store, PlanCatalog::new(), EngineConfig::default());
//!
//! let decision = service
//!     .check_usage_limit("user_123", &UsageAction::CreateWorkspace)
//!     .await?;
//! if decision.is_allowed() {
//!     // ... create the workspace ...
//!     service
//!         .record_usage("user_123", &UsageAction::CreateWorkspace)
//!         .await?;
//! }
//! ```
//!
//! # Concurrency
//!
//! The split check-then-record flow above is racy by construction: two
//! concurrent requests can both pass the same check before either records.
//! [`PlanService::try_consume`] closes that gap by holding the subscriber's
//! write lock across the check and the record; use it whenever the caller
//! does not need to interleave its own side effect between the two steps.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, trace};

use crate::actions::UsageAction;
use crate::calendar::{CivilDate, Clock, SystemClock};
use crate::checks;
use crate::config::EngineConfig;
use crate::decision::UsageDecision;
use crate::error::{QuotaGateError, Result};
use crate::plans::{PlanCatalog, PlanLimits, PlanTier};
use crate::storage::{SubscriberProfile, UsageStore};
use crate::usage::{GlobalUsage, WorkspaceUsage};

/// A subscriber's resolved plan state.
///
/// Derived from the stored profile at read time; nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberPlanState {
    /// The tier as stored. Not mutated by expiry.
    pub stored_tier: PlanTier,
    /// The tier limits are looked up under: `Free` once the plan expired.
    pub effective_tier: PlanTier,
    pub is_trial_active: bool,
    pub trial_start_date: Option<DateTime<Utc>>,
    pub plan_expires_at: Option<DateTime<Utc>>,
    pub is_expired: bool,
}

/// A subscriber's full usage snapshot, post-reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberUsage {
    pub global: GlobalUsage,
    pub workspaces: Vec<WorkspaceUsage>,
}

/// The quota and plan-enforcement orchestrator.
///
/// Construct one per process with your store implementation; all state lives
/// in the store, so the service itself is cheap and safe to share behind an
/// `Arc`.
pub struct PlanService<S: UsageStore> {
    store: S,
    catalog: PlanCatalog,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    /// One write lock per subscriber: recorders and `try_consume` serialize
    /// through here so concurrent increments cannot overshoot a cap.
    subscriber_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<S: UsageStore> PlanService<S> {
    /// Create a service backed by the system clock.
    #[must_use]
    pub fn new(store: S, catalog: PlanCatalog, config: EngineConfig) -> Self {
        Self::with_clock(store, catalog, config, Arc::new(SystemClock))
    }

    /// Create a service with an injected clock.
    #[must_use]
    pub fn with_clock(
        store: S,
        catalog: PlanCatalog,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            catalog,
            config,
            clock,
            subscriber_locks: DashMap::new(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now_utc()
    }

    fn today(&self) -> CivilDate {
        CivilDate::today_in(self.clock.now_utc(), self.config.timezone)
    }

    fn lock_for(&self, subscriber_id: &str) -> Arc<Mutex<()>> {
        self.subscriber_locks
            .entry(subscriber_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Resolve the subscriber's plan state from the stored profile.
    pub async fn plan_state(&self, subscriber_id: &str) -> Result<SubscriberPlanState> {
        let profile = self.load_profile(subscriber_id).await?;
        Ok(self.derive_plan_state(&profile))
    }

    fn derive_plan_state(&self, profile: &SubscriberProfile) -> SubscriberPlanState {
        let now = self.now();
        let is_expired = profile.plan_expires_at.is_some_and(|at| now > at);

        let trial_window_end =
            profile.created_at + Duration::days(i64::from(self.config.trial_days));
        let is_trial_active = profile.plan_tier == PlanTier::Pro
            && profile.plan_expires_at.is_some()
            && now < trial_window_end
            && !is_expired;

        SubscriberPlanState {
            stored_tier: profile.plan_tier,
            effective_tier: if is_expired {
                PlanTier::Free
            } else {
                profile.plan_tier
            },
            is_trial_active,
            trial_start_date: is_trial_active.then_some(profile.created_at),
            plan_expires_at: profile.plan_expires_at,
            is_expired,
        }
    }

    /// The limits the subscriber is currently checked against.
    pub async fn effective_limits(&self, subscriber_id: &str) -> Result<&'static PlanLimits> {
        let state = self.plan_state(subscriber_id).await?;
        Ok(self
            .catalog
            .limits_for(state.effective_tier, state.is_trial_active))
    }

    /// Load the subscriber's full usage snapshot, applying daily and monthly
    /// resets and persisting any record a reset mutated.
    pub async fn usage(&self, subscriber_id: &str) -> Result<SubscriberUsage> {
        let global = self.load_global(subscriber_id).await?;

        let today = self.today();
        let mut workspaces = self.store.list_workspace_usage(subscriber_id).await?;
        for workspace in &mut workspaces {
            let daily = workspace.ensure_daily_reset(today);
            let monthly = workspace.ensure_monthly_reset(today);
            if daily || monthly {
                debug!(
                    target: "quotagate::service",
                    subscriber_id = %subscriber_id,
                    workspace_id = %workspace.workspace_id,
                    daily,
                    monthly,
                    "usage counters reset"
                );
                workspace.touch(self.now());
                self.store
                    .save_workspace_usage(subscriber_id, workspace)
                    .await?;
            }
        }

        Ok(SubscriberUsage { global, workspaces })
    }

    /// Check whether `action` is allowed under the subscriber's current
    /// limits. Never mutates counters; resets that come due while loading
    /// are applied and persisted so stale daily/monthly counts are not
    /// compared against today's limits.
    ///
    /// Denials come back as `Ok` decisions; errors are reserved for contract
    /// violations (unknown subscriber, unprovisioned workspace) and storage
    /// failures.
    pub async fn check_usage_limit(
        &self,
        subscriber_id: &str,
        action: &UsageAction,
    ) -> Result<UsageDecision> {
        let state = self.plan_state(subscriber_id).await?;
        let tier = state.effective_tier;
        let limits = self.catalog.limits_for(tier, state.is_trial_active);

        let decision = match action {
            UsageAction::CreateWorkspace => {
                let global = self.load_global(subscriber_id).await?;
                checks::check_workspace_cap(global.total_workspaces, limits, tier)
            }
            UsageAction::WebSearch => {
                let global = self.load_global(subscriber_id).await?;
                checks::check_web_search(global.web_searches_today, limits, tier)
            }
            UsageAction::ChatInput { token_count } => {
                checks::check_chat_input(*token_count, limits, tier)
            }
            UsageAction::InviteOwner { workspace_id } => {
                let workspace = self.load_workspace(subscriber_id, workspace_id).await?;
                checks::check_owner_seats(workspace.owners_count, limits, tier)
            }
            UsageAction::InviteCollaborator { workspace_id } => {
                let workspace = self.load_workspace(subscriber_id, workspace_id).await?;
                checks::check_collaborator_seats(workspace.collaborators_count, limits, tier)
            }
            UsageAction::CreateChat { workspace_id } => {
                let workspace = self.load_workspace(subscriber_id, workspace_id).await?;
                checks::check_active_chats(workspace.active_chats_count, limits, tier)
            }
            UsageAction::WebAgentRun { workspace_id } => {
                let workspace = self.load_workspace(subscriber_id, workspace_id).await?;
                checks::check_web_agent_run(workspace.web_agent_runs_this_month, limits, tier)
            }
            UsageAction::CreateWorkflow { workspace_id } => {
                let workspace = self.load_workspace(subscriber_id, workspace_id).await?;
                checks::check_active_workflows(workspace.active_workflows_count, limits, tier)
            }
            UsageAction::ExecuteWorkflow {
                workspace_id,
                workflow_id,
            } => {
                let workspace = self.load_workspace(subscriber_id, workspace_id).await?;
                checks::check_workflow_executions(
                    workspace.executions_today(workflow_id),
                    limits,
                    tier,
                )
            }
            UsageAction::UploadFile { workspace_id } => {
                let workspace = self.load_workspace(subscriber_id, workspace_id).await?;
                checks::check_file_upload(workspace.files_this_month, limits, tier)
            }
            UsageAction::UseKnowledgeBase {
                workspace_id,
                add_bytes,
            } => {
                let workspace = self.load_workspace(subscriber_id, workspace_id).await?;
                checks::check_knowledge_base(
                    workspace.knowledge_base_bytes,
                    *add_bytes,
                    limits,
                    tier,
                )
            }
            UsageAction::SendEmail {
                workspace_id,
                count,
            } => {
                let workspace = self.load_workspace(subscriber_id, workspace_id).await?;
                checks::check_email_send(workspace.emails_this_month, *count, limits, tier)
            }
            UsageAction::SendSms {
                workspace_id,
                count,
            } => {
                let workspace = self.load_workspace(subscriber_id, workspace_id).await?;
                checks::check_sms_send(workspace.sms_this_month, *count, limits, tier)
            }
        };

        if !decision.allowed {
            debug!(
                target: "quotagate::service",
                subscriber_id = %subscriber_id,
                action = action.kind(),
                tier = %tier,
                reason = decision.reason.as_deref().unwrap_or(""),
                "usage denied"
            );
        }

        Ok(decision)
    }

    /// Record consumption for `action` and persist.
    ///
    /// Recorders do not re-validate limits: call
    /// [`check_usage_limit`](Self::check_usage_limit) first and record only
    /// on an allowed decision, or use [`try_consume`](Self::try_consume) to
    /// get both under one lock. Actions whose caps are enforced structurally
    /// (`create_chat`, `create_workflow`, `chat_input`) are accepted as
    /// no-ops.
    pub async fn record_usage(&self, subscriber_id: &str, action: &UsageAction) -> Result<()> {
        let lock = self.lock_for(subscriber_id);
        let _guard = lock.lock().await;
        self.record_usage_locked(subscriber_id, action).await
    }

    /// Check, then record if allowed, holding the subscriber's write lock
    /// across both steps. Two concurrent calls for the same subscriber can
    /// no longer both pass the same pre-increment check.
    pub async fn try_consume(
        &self,
        subscriber_id: &str,
        action: &UsageAction,
    ) -> Result<UsageDecision> {
        let lock = self.lock_for(subscriber_id);
        let _guard = lock.lock().await;

        let decision = self.check_usage_limit(subscriber_id, action).await?;
        if decision.allowed {
            self.record_usage_locked(subscriber_id, action).await?;
        }
        Ok(decision)
    }

    async fn record_usage_locked(&self, subscriber_id: &str, action: &UsageAction) -> Result<()> {
        let today = self.today();
        let now = self.now();

        match action {
            UsageAction::CreateWorkspace => {
                let mut global = self.load_global(subscriber_id).await?;
                global.record_workspace_created();
                global.touch(now);
                self.store.save_global_usage(subscriber_id, &global).await?;
            }
            UsageAction::WebSearch => {
                let mut global = self.load_global(subscriber_id).await?;
                global.record_web_search(today);
                global.touch(now);
                self.store.save_global_usage(subscriber_id, &global).await?;
            }
            UsageAction::InviteOwner { workspace_id } => {
                self.mutate_workspace(subscriber_id, workspace_id, |ws| {
                    ws.record_owner_invited();
                })
                .await?;
            }
            UsageAction::InviteCollaborator { workspace_id } => {
                self.mutate_workspace(subscriber_id, workspace_id, |ws| {
                    ws.record_collaborator_invited();
                })
                .await?;
            }
            UsageAction::WebAgentRun { workspace_id } => {
                self.mutate_workspace(subscriber_id, workspace_id, |ws| {
                    ws.record_web_agent_run(today);
                })
                .await?;
            }
            UsageAction::ExecuteWorkflow {
                workspace_id,
                workflow_id,
            } => {
                self.mutate_workspace(subscriber_id, workspace_id, |ws| {
                    ws.record_workflow_execution(workflow_id, today);
                })
                .await?;
            }
            UsageAction::UploadFile { workspace_id } => {
                self.mutate_workspace(subscriber_id, workspace_id, |ws| {
                    ws.record_file_upload(today);
                })
                .await?;
            }
            UsageAction::UseKnowledgeBase {
                workspace_id,
                add_bytes,
            } => {
                self.mutate_workspace(subscriber_id, workspace_id, |ws| {
                    ws.record_knowledge_base_bytes(*add_bytes);
                })
                .await?;
            }
            UsageAction::SendEmail {
                workspace_id,
                count,
            } => {
                self.mutate_workspace(subscriber_id, workspace_id, |ws| {
                    ws.record_emails_sent(*count, today);
                })
                .await?;
            }
            UsageAction::SendSms {
                workspace_id,
                count,
            } => {
                self.mutate_workspace(subscriber_id, workspace_id, |ws| {
                    ws.record_sms_sent(*count, today);
                })
                .await?;
            }
            // Caps for these are enforced against current active counts, not
            // consumption counters.
            UsageAction::CreateChat { .. }
            | UsageAction::CreateWorkflow { .. }
            | UsageAction::ChatInput { .. } => {
                trace!(
                    target: "quotagate::service",
                    subscriber_id = %subscriber_id,
                    action = action.kind(),
                    "no counter to record"
                );
            }
        }

        Ok(())
    }

    /// Get or lazily create the usage record for a workspace.
    ///
    /// Call this when a workspace is provisioned; workspace-scoped checks
    /// and recorders require the record to exist.
    pub async fn ensure_workspace_usage(
        &self,
        subscriber_id: &str,
        workspace_id: &str,
    ) -> Result<WorkspaceUsage> {
        if let Some(existing) = self
            .store
            .get_workspace_usage(subscriber_id, workspace_id)
            .await?
        {
            return Ok(existing);
        }

        let usage = WorkspaceUsage::new(workspace_id, self.today(), self.now());
        self.store
            .save_workspace_usage(subscriber_id, &usage)
            .await?;
        debug!(
            target: "quotagate::service",
            subscriber_id = %subscriber_id,
            workspace_id = %workspace_id,
            "workspace usage record created"
        );
        Ok(usage)
    }

    /// Move the subscriber to a new tier, with an optional expiry.
    pub async fn upgrade_plan(
        &self,
        subscriber_id: &str,
        new_tier: PlanTier,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut profile = self.load_profile(subscriber_id).await?;
        profile.plan_tier = new_tier;
        profile.plan_expires_at = expires_at;
        self.store.save_profile(subscriber_id, &profile).await?;

        info!(
            target: "quotagate::service",
            subscriber_id = %subscriber_id,
            tier = %new_tier,
            expires_at = expires_at.map(|at| at.to_rfc3339()).as_deref().unwrap_or("never"),
            "plan changed"
        );
        Ok(())
    }

    /// Start the Pro trial: tier becomes Pro with an expiry one trial length
    /// from now.
    pub async fn start_trial(&self, subscriber_id: &str) -> Result<()> {
        let expires_at = self.now() + Duration::days(i64::from(self.config.trial_days));
        self.upgrade_plan(subscriber_id, PlanTier::Pro, Some(expires_at))
            .await
    }

    /// Revert an expired trial to Free.
    ///
    /// Resources already over the Free caps are left in place; pruning them
    /// is an account-management concern, not quota enforcement.
    pub async fn handle_trial_expiry(&self, subscriber_id: &str) -> Result<()> {
        self.upgrade_plan(subscriber_id, PlanTier::Free, None).await
    }

    async fn load_profile(&self, subscriber_id: &str) -> Result<SubscriberProfile> {
        self.store
            .get_profile(subscriber_id)
            .await?
            .ok_or_else(|| QuotaGateError::ProfileNotFound {
                subscriber_id: subscriber_id.to_string(),
            })
    }

    /// Load the global record, lazily creating it and applying the daily
    /// reset. Persists when anything changed.
    async fn load_global(&self, subscriber_id: &str) -> Result<GlobalUsage> {
        let today = self.today();
        match self.store.get_global_usage(subscriber_id).await? {
            Some(mut usage) => {
                if usage.ensure_daily_reset(today) {
                    debug!(
                        target: "quotagate::service",
                        subscriber_id = %subscriber_id,
                        "daily counters reset"
                    );
                    usage.touch(self.now());
                    self.store.save_global_usage(subscriber_id, &usage).await?;
                }
                Ok(usage)
            }
            None => {
                let usage = GlobalUsage::new(today, self.now());
                self.store.save_global_usage(subscriber_id, &usage).await?;
                Ok(usage)
            }
        }
    }

    /// Load a workspace record, applying both resets. A missing record is a
    /// caller contract violation, not a denial.
    async fn load_workspace(
        &self,
        subscriber_id: &str,
        workspace_id: &str,
    ) -> Result<WorkspaceUsage> {
        let today = self.today();
        let mut usage = self
            .store
            .get_workspace_usage(subscriber_id, workspace_id)
            .await?
            .ok_or_else(|| QuotaGateError::WorkspaceUsageNotFound {
                workspace_id: workspace_id.to_string(),
            })?;

        let daily = usage.ensure_daily_reset(today);
        let monthly = usage.ensure_monthly_reset(today);
        if daily || monthly {
            usage.touch(self.now());
            self.store
                .save_workspace_usage(subscriber_id, &usage)
                .await?;
        }
        Ok(usage)
    }

    async fn mutate_workspace(
        &self,
        subscriber_id: &str,
        workspace_id: &str,
        mutate: impl FnOnce(&mut WorkspaceUsage),
    ) -> Result<()> {
        let mut usage = self.load_workspace(subscriber_id, workspace_id).await?;
        mutate(&mut usage);
        usage.touch(self.now());
        self.store
            .save_workspace_usage(subscriber_id, &usage)
            .await
    }
}
