//! Usage records and their reset and recording transitions.
//!
//! Two records exist per subscriber: one [`GlobalUsage`] row and one
//! [`WorkspaceUsage`] row per workspace. Both are created lazily on first
//! read with all counters zeroed and anchors set to today (monthly anchor one
//! calendar month out), mutated only by the reset methods and the `record_*`
//! mutators here, and never deleted by the engine.
//!
//! Reset methods are idempotent: they report whether they mutated the record
//! so callers know when a persist is due, and calling one twice on the same
//! day is a no-op because the anchor has already advanced.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::CivilDate;

/// Subscriber-wide usage counters.
///
/// Web searches are deliberately counted per subscriber, not per workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalUsage {
    pub total_workspaces: u64,
    pub web_searches_today: u64,
    pub last_daily_anchor: CivilDate,
    pub updated_at: DateTime<Utc>,
}

impl GlobalUsage {
    /// A zeroed record anchored to `today`.
    #[must_use]
    pub fn new(today: CivilDate, now: DateTime<Utc>) -> Self {
        Self {
            total_workspaces: 0,
            web_searches_today: 0,
            last_daily_anchor: today,
            updated_at: now,
        }
    }

    /// Zero the daily counters if a calendar day has passed since the last
    /// reset. Returns whether the record was mutated.
    pub fn ensure_daily_reset(&mut self, today: CivilDate) -> bool {
        if self.last_daily_anchor == today {
            return false;
        }
        self.web_searches_today = 0;
        self.last_daily_anchor = today;
        true
    }

    pub fn record_workspace_created(&mut self) {
        self.total_workspaces += 1;
    }

    /// Count a web search against today, resetting first if the stored
    /// counter belongs to an earlier day.
    pub fn record_web_search(&mut self, today: CivilDate) {
        self.ensure_daily_reset(today);
        self.web_searches_today += 1;
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

/// Per-workspace usage counters.
///
/// Structural counts (owners, collaborators, chats, workflows, knowledge-base
/// bytes) reflect current state and never reset; daily and monthly counters
/// are scoped to their anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceUsage {
    pub workspace_id: String,

    pub owners_count: u64,
    pub collaborators_count: u64,
    pub active_chats_count: u64,
    pub active_workflows_count: u64,
    pub knowledge_base_bytes: u64,

    /// Executions today, keyed by workflow id. Cleared on daily reset.
    #[serde(default)]
    pub workflow_executions_today: HashMap<String, u64>,

    pub files_this_month: u64,
    pub web_agent_runs_this_month: u64,
    pub emails_this_month: u64,
    pub sms_this_month: u64,

    pub last_daily_anchor: CivilDate,
    /// The *next* monthly reset boundary, inclusive.
    pub next_monthly_anchor: CivilDate,

    pub updated_at: DateTime<Utc>,
}

impl WorkspaceUsage {
    /// A zeroed record anchored to `today`, with the monthly boundary one
    /// calendar month out.
    #[must_use]
    pub fn new(workspace_id: impl Into<String>, today: CivilDate, now: DateTime<Utc>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            owners_count: 0,
            collaborators_count: 0,
            active_chats_count: 0,
            active_workflows_count: 0,
            knowledge_base_bytes: 0,
            workflow_executions_today: HashMap::new(),
            files_this_month: 0,
            web_agent_runs_this_month: 0,
            emails_this_month: 0,
            sms_this_month: 0,
            last_daily_anchor: today,
            next_monthly_anchor: today.add_calendar_months(1),
            updated_at: now,
        }
    }

    /// Zero the daily counters if a calendar day has passed. Returns whether
    /// the record was mutated.
    pub fn ensure_daily_reset(&mut self, today: CivilDate) -> bool {
        if self.last_daily_anchor == today {
            return false;
        }
        self.workflow_executions_today.clear();
        self.last_daily_anchor = today;
        true
    }

    /// Zero the monthly counters once today reaches the boundary
    /// (inclusive). The next boundary is anchored one month from *today*: if
    /// several boundaries were missed, one reset covers the whole gap and a
    /// fresh month starts from the day it fires.
    pub fn ensure_monthly_reset(&mut self, today: CivilDate) -> bool {
        if today < self.next_monthly_anchor {
            return false;
        }
        self.files_this_month = 0;
        self.web_agent_runs_this_month = 0;
        self.emails_this_month = 0;
        self.sms_this_month = 0;
        self.next_monthly_anchor = today.add_calendar_months(1);
        true
    }

    /// Executions recorded today for a single workflow.
    #[must_use]
    pub fn executions_today(&self, workflow_id: &str) -> u64 {
        self.workflow_executions_today
            .get(workflow_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn record_owner_invited(&mut self) {
        self.owners_count += 1;
    }

    pub fn record_collaborator_invited(&mut self) {
        self.collaborators_count += 1;
    }

    pub fn record_web_agent_run(&mut self, today: CivilDate) {
        self.ensure_monthly_reset(today);
        self.web_agent_runs_this_month += 1;
    }

    pub fn record_workflow_execution(&mut self, workflow_id: &str, today: CivilDate) {
        self.ensure_daily_reset(today);
        *self
            .workflow_executions_today
            .entry(workflow_id.to_string())
            .or_insert(0) += 1;
    }

    pub fn record_file_upload(&mut self, today: CivilDate) {
        self.ensure_monthly_reset(today);
        self.files_this_month += 1;
    }

    pub fn record_knowledge_base_bytes(&mut self, add_bytes: u64) {
        self.knowledge_base_bytes += add_bytes;
    }

    pub fn record_emails_sent(&mut self, count: u64, today: CivilDate) {
        self.ensure_monthly_reset(today);
        self.emails_this_month += count;
    }

    pub fn record_sms_sent(&mut self, count: u64, today: CivilDate) {
        self.ensure_monthly_reset(today);
        self.sms_this_month += count;
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> CivilDate {
        CivilDate::from_ymd(y, m, d).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_global_daily_reset() {
        let mut usage = GlobalUsage::new(date(2025, 1, 1), now());
        usage.web_searches_today = 12;

        assert!(usage.ensure_daily_reset(date(2025, 1, 2)));
        assert_eq!(usage.web_searches_today, 0);
        assert_eq!(usage.last_daily_anchor, date(2025, 1, 2));

        // Second call on the same day is a no-op.
        assert!(!usage.ensure_daily_reset(date(2025, 1, 2)));
    }

    #[test]
    fn test_daily_reset_preserves_structural_counts() {
        let mut usage = GlobalUsage::new(date(2025, 1, 1), now());
        usage.total_workspaces = 2;
        usage.web_searches_today = 5;

        usage.ensure_daily_reset(date(2025, 1, 2));
        assert_eq!(usage.total_workspaces, 2);
    }

    #[test]
    fn test_record_web_search_resets_stale_day_first() {
        let mut usage = GlobalUsage::new(date(2025, 1, 1), now());
        usage.web_searches_today = 24;

        usage.record_web_search(date(2025, 1, 2));
        assert_eq!(usage.web_searches_today, 1);
        assert_eq!(usage.last_daily_anchor, date(2025, 1, 2));
    }

    #[test]
    fn test_workspace_new_anchors() {
        let usage = WorkspaceUsage::new("ws_1", date(2025, 1, 15), now());
        assert_eq!(usage.last_daily_anchor, date(2025, 1, 15));
        assert_eq!(usage.next_monthly_anchor, date(2025, 2, 15));
        assert_eq!(usage.files_this_month, 0);
    }

    #[test]
    fn test_workspace_daily_reset_clears_execution_map() {
        let mut usage = WorkspaceUsage::new("ws_1", date(2025, 1, 1), now());
        usage.record_workflow_execution("wf_a", date(2025, 1, 1));
        usage.record_workflow_execution("wf_a", date(2025, 1, 1));
        usage.record_workflow_execution("wf_b", date(2025, 1, 1));
        assert_eq!(usage.executions_today("wf_a"), 2);
        assert_eq!(usage.executions_today("wf_b"), 1);

        assert!(usage.ensure_daily_reset(date(2025, 1, 2)));
        assert!(usage.workflow_executions_today.is_empty());
        assert_eq!(usage.executions_today("wf_a"), 0);
    }

    #[test]
    fn test_monthly_boundary_is_inclusive() {
        let mut usage = WorkspaceUsage::new("ws_1", date(2025, 1, 1), now());
        usage.files_this_month = 4;
        usage.emails_this_month = 100;
        assert_eq!(usage.next_monthly_anchor, date(2025, 2, 1));

        // The day before the boundary: nothing happens.
        assert!(!usage.ensure_monthly_reset(date(2025, 1, 31)));
        assert_eq!(usage.files_this_month, 4);

        // On the boundary itself the reset fires.
        assert!(usage.ensure_monthly_reset(date(2025, 2, 1)));
        assert_eq!(usage.files_this_month, 0);
        assert_eq!(usage.emails_this_month, 0);
        assert_eq!(usage.next_monthly_anchor, date(2025, 3, 1));

        assert!(!usage.ensure_monthly_reset(date(2025, 2, 1)));
    }

    #[test]
    fn test_monthly_reset_advances_from_today_after_gap() {
        let mut usage = WorkspaceUsage::new("ws_1", date(2025, 1, 1), now());
        usage.web_agent_runs_this_month = 3;

        // Three boundaries were missed; a single reset covers the gap and
        // the new boundary is one month from the day it fired.
        assert!(usage.ensure_monthly_reset(date(2025, 4, 15)));
        assert_eq!(usage.web_agent_runs_this_month, 0);
        assert_eq!(usage.next_monthly_anchor, date(2025, 5, 15));
    }

    #[test]
    fn test_monthly_reset_preserves_daily_and_structural_counts() {
        let mut usage = WorkspaceUsage::new("ws_1", date(2025, 1, 1), now());
        usage.collaborators_count = 3;
        usage.knowledge_base_bytes = 4096;
        usage.record_workflow_execution("wf_a", date(2025, 1, 1));

        usage.ensure_monthly_reset(date(2025, 2, 1));
        assert_eq!(usage.collaborators_count, 3);
        assert_eq!(usage.knowledge_base_bytes, 4096);
        assert_eq!(usage.executions_today("wf_a"), 1);
    }

    #[test]
    fn test_recorders_with_counts() {
        let mut usage = WorkspaceUsage::new("ws_1", date(2025, 1, 1), now());

        usage.record_emails_sent(5, date(2025, 1, 1));
        usage.record_emails_sent(2, date(2025, 1, 1));
        assert_eq!(usage.emails_this_month, 7);

        usage.record_sms_sent(3, date(2025, 1, 1));
        assert_eq!(usage.sms_this_month, 3);

        usage.record_knowledge_base_bytes(1024);
        usage.record_knowledge_base_bytes(512);
        assert_eq!(usage.knowledge_base_bytes, 1536);
    }

    #[test]
    fn test_monthly_recorder_resets_stale_month_first() {
        let mut usage = WorkspaceUsage::new("ws_1", date(2025, 1, 1), now());
        usage.files_this_month = 49;

        // Recording in a new month starts the counter fresh.
        usage.record_file_upload(date(2025, 2, 3));
        assert_eq!(usage.files_this_month, 1);
        assert_eq!(usage.next_monthly_anchor, date(2025, 3, 3));
    }

    #[test]
    fn test_serde_round_trip_with_anchors_as_strings() {
        let mut usage = WorkspaceUsage::new("ws_1", date(2025, 1, 31), now());
        usage.record_workflow_execution("wf_a", date(2025, 1, 31));

        let json = serde_json::to_string(&usage).unwrap();
        assert!(json.contains("\"last_daily_anchor\":\"2025-01-31\""));
        assert!(json.contains("\"next_monthly_anchor\":\"2025-02-28\""));

        let back: WorkspaceUsage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, usage);
    }
}
