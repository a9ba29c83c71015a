//! Error types for the quota engine.
//!
//! Quota denials are never errors: every check returns an
//! [`UsageDecision`](crate::decision::UsageDecision), and a denied action is a
//! normal `Ok` result. Errors are reserved for caller bugs (contract
//! violations) and storage failures.

/// The main error type for quota engine operations.
#[derive(Debug, thiserror::Error)]
pub enum QuotaGateError {
    /// No stored profile exists for the subscriber.
    #[error("Subscriber profile not found: {subscriber_id}")]
    ProfileNotFound { subscriber_id: String },

    /// A workspace-scoped action referenced a workspace with no usage record.
    ///
    /// Workspace records are provisioned when the workspace is created (see
    /// [`PlanService::ensure_workspace_usage`](crate::service::PlanService::ensure_workspace_usage)),
    /// so hitting this means the caller skipped provisioning or passed a
    /// foreign workspace id.
    #[error("Workspace usage record not found: {workspace_id}")]
    WorkspaceUsageNotFound { workspace_id: String },

    /// A stored calendar anchor could not be parsed as `YYYY-MM-DD`.
    #[error("Invalid calendar date: {0}")]
    InvalidDate(String),

    /// The backing store failed to load or persist a record.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl QuotaGateError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn invalid_date(value: impl Into<String>) -> Self {
        Self::InvalidDate(value.into())
    }

    /// Whether this error indicates a caller bug rather than an
    /// infrastructure failure.
    ///
    /// Contract violations should surface as 4xx/panics in the host
    /// application, not as retryable failures.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::ProfileNotFound { .. } | Self::WorkspaceUsageNotFound { .. }
        )
    }
}

/// Result type alias for quota engine operations.
pub type Result<T> = std::result::Result<T, QuotaGateError>;
