//! Storage traits for plan and usage state.
//!
//! Implement [`UsageStore`] to persist engine state to your database. Every
//! record is read and written as a whole row keyed by subscriber id (plus
//! workspace id for workspace rows); the engine never issues partial updates.
//! An in-memory implementation is provided for testing behind the
//! `test-support` feature.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::plans::PlanTier;
use crate::usage::{GlobalUsage, WorkspaceUsage};

/// Stored subscription facts for a subscriber.
///
/// The plan tier is immutable for a billing period except through the plan
/// change operations; expiry is derived at read time, never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberProfile {
    pub plan_tier: PlanTier,
    /// When the current paid plan or trial lapses. `None` means no expiry.
    pub plan_expires_at: Option<DateTime<Utc>>,
    /// Account creation; the trial window is measured from here.
    pub created_at: DateTime<Utc>,
}

impl SubscriberProfile {
    /// A fresh Free profile created at `now`.
    #[must_use]
    pub fn free(now: DateTime<Utc>) -> Self {
        Self {
            plan_tier: PlanTier::Free,
            plan_expires_at: None,
            created_at: now,
        }
    }
}

/// Trait for storing subscriber plan and usage state.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Get the stored profile for a subscriber.
    async fn get_profile(&self, subscriber_id: &str) -> Result<Option<SubscriberProfile>>;

    /// Save/update the profile (whole-row upsert).
    async fn save_profile(&self, subscriber_id: &str, profile: &SubscriberProfile) -> Result<()>;

    /// Get the subscriber-wide usage record.
    async fn get_global_usage(&self, subscriber_id: &str) -> Result<Option<GlobalUsage>>;

    /// Save/update the subscriber-wide usage record (whole-row upsert).
    async fn save_global_usage(&self, subscriber_id: &str, usage: &GlobalUsage) -> Result<()>;

    /// Get one workspace usage record.
    async fn get_workspace_usage(
        &self,
        subscriber_id: &str,
        workspace_id: &str,
    ) -> Result<Option<WorkspaceUsage>>;

    /// List all workspace usage records for a subscriber.
    async fn list_workspace_usage(&self, subscriber_id: &str) -> Result<Vec<WorkspaceUsage>>;

    /// Save/update one workspace usage record (whole-row upsert, keyed by
    /// subscriber id + the record's `workspace_id`).
    async fn save_workspace_usage(
        &self,
        subscriber_id: &str,
        usage: &WorkspaceUsage,
    ) -> Result<()>;
}

/// In-memory store for testing.
#[cfg(any(test, feature = "test-support"))]
pub mod test {
    use std::collections::HashMap;
    use std::sync::{Arc, RwLock};

    use super::*;

    /// In-memory usage store.
    ///
    /// Wraps data in `Arc` for cheap cloning, so a test can keep a handle
    /// while the service under test owns another.
    #[derive(Default, Clone)]
    pub struct InMemoryUsageStore {
        inner: Arc<InMemoryUsageStoreInner>,
    }

    #[derive(Default)]
    struct InMemoryUsageStoreInner {
        profiles: RwLock<HashMap<String, SubscriberProfile>>,
        globals: RwLock<HashMap<String, GlobalUsage>>,
        workspaces: RwLock<HashMap<(String, String), WorkspaceUsage>>,
    }

    impl InMemoryUsageStore {
        /// Create a new empty store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a profile directly (for testing).
        pub fn seed_profile(&self, subscriber_id: &str, profile: SubscriberProfile) {
            self.inner
                .profiles
                .write()
                .unwrap()
                .insert(subscriber_id.to_string(), profile);
        }

        /// Number of workspace rows across all subscribers (for testing).
        #[must_use]
        pub fn workspace_row_count(&self) -> usize {
            self.inner.workspaces.read().unwrap().len()
        }
    }

    #[async_trait]
    impl UsageStore for InMemoryUsageStore {
        async fn get_profile(&self, subscriber_id: &str) -> Result<Option<SubscriberProfile>> {
            Ok(self
                .inner
                .profiles
                .read()
                .unwrap()
                .get(subscriber_id)
                .cloned())
        }

        async fn save_profile(
            &self,
            subscriber_id: &str,
            profile: &SubscriberProfile,
        ) -> Result<()> {
            self.inner
                .profiles
                .write()
                .unwrap()
                .insert(subscriber_id.to_string(), profile.clone());
            Ok(())
        }

        async fn get_global_usage(&self, subscriber_id: &str) -> Result<Option<GlobalUsage>> {
            Ok(self
                .inner
                .globals
                .read()
                .unwrap()
                .get(subscriber_id)
                .cloned())
        }

        async fn save_global_usage(&self, subscriber_id: &str, usage: &GlobalUsage) -> Result<()> {
            self.inner
                .globals
                .write()
                .unwrap()
                .insert(subscriber_id.to_string(), usage.clone());
            Ok(())
        }

        async fn get_workspace_usage(
            &self,
            subscriber_id: &str,
            workspace_id: &str,
        ) -> Result<Option<WorkspaceUsage>> {
            Ok(self
                .inner
                .workspaces
                .read()
                .unwrap()
                .get(&(subscriber_id.to_string(), workspace_id.to_string()))
                .cloned())
        }

        async fn list_workspace_usage(&self, subscriber_id: &str) -> Result<Vec<WorkspaceUsage>> {
            let workspaces = self.inner.workspaces.read().unwrap();
            let mut rows: Vec<WorkspaceUsage> = workspaces
                .iter()
                .filter(|((owner, _), _)| owner == subscriber_id)
                .map(|(_, usage)| usage.clone())
                .collect();
            rows.sort_by(|a, b| a.workspace_id.cmp(&b.workspace_id));
            Ok(rows)
        }

        async fn save_workspace_usage(
            &self,
            subscriber_id: &str,
            usage: &WorkspaceUsage,
        ) -> Result<()> {
            self.inner.workspaces.write().unwrap().insert(
                (subscriber_id.to_string(), usage.workspace_id.clone()),
                usage.clone(),
            );
            Ok(())
        }
    }
}
