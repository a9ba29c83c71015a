//! Tagged actions consumed by the enforcement entry points.
//!
//! Every action a caller can propose is one variant of [`UsageAction`], each
//! carrying only the fields it needs. Workspace-scoped variants embed the
//! workspace id, so "workspace-scoped action without a workspace" cannot be
//! expressed. Dispatch over the enum is exhaustive: an unknown action kind is
//! a compile error, not a silent allow.
//!
//! On the wire an action is `{"type": "...", ...}` with snake_case kinds:
//!
//! ```rust
//! use quotagate::actions::UsageAction;
//!
//! let action: UsageAction =
//!     serde_json::from_str(r#"{"type": "web_search"}"#).unwrap();
//! assert_eq!(action, UsageAction::WebSearch);
//! ```

use serde::{Deserialize, Serialize};

/// A proposed action, checked by
/// [`PlanService::check_usage_limit`](crate::service::PlanService::check_usage_limit)
/// and recorded by
/// [`PlanService::record_usage`](crate::service::PlanService::record_usage).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UsageAction {
    CreateWorkspace,
    InviteOwner {
        workspace_id: String,
    },
    InviteCollaborator {
        workspace_id: String,
    },
    CreateChat {
        workspace_id: String,
    },
    WebSearch,
    WebAgentRun {
        workspace_id: String,
    },
    CreateWorkflow {
        workspace_id: String,
    },
    ExecuteWorkflow {
        workspace_id: String,
        workflow_id: String,
    },
    UploadFile {
        workspace_id: String,
    },
    UseKnowledgeBase {
        workspace_id: String,
        add_bytes: u64,
    },
    ChatInput {
        token_count: u64,
    },
    SendEmail {
        workspace_id: String,
        #[serde(default = "default_count")]
        count: u64,
    },
    SendSms {
        workspace_id: String,
        #[serde(default = "default_count")]
        count: u64,
    },
}

fn default_count() -> u64 {
    1
}

impl UsageAction {
    /// The action's wire kind, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateWorkspace => "create_workspace",
            Self::InviteOwner { .. } => "invite_owner",
            Self::InviteCollaborator { .. } => "invite_collaborator",
            Self::CreateChat { .. } => "create_chat",
            Self::WebSearch => "web_search",
            Self::WebAgentRun { .. } => "web_agent_run",
            Self::CreateWorkflow { .. } => "create_workflow",
            Self::ExecuteWorkflow { .. } => "execute_workflow",
            Self::UploadFile { .. } => "upload_file",
            Self::UseKnowledgeBase { .. } => "use_knowledge_base",
            Self::ChatInput { .. } => "chat_input",
            Self::SendEmail { .. } => "send_email",
            Self::SendSms { .. } => "send_sms",
        }
    }

    /// The target workspace, if this action is workspace-scoped.
    #[must_use]
    pub fn workspace_id(&self) -> Option<&str> {
        match self {
            Self::CreateWorkspace | Self::WebSearch | Self::ChatInput { .. } => None,
            Self::InviteOwner { workspace_id }
            | Self::InviteCollaborator { workspace_id }
            | Self::CreateChat { workspace_id }
            | Self::WebAgentRun { workspace_id }
            | Self::CreateWorkflow { workspace_id }
            | Self::ExecuteWorkflow { workspace_id, .. }
            | Self::UploadFile { workspace_id }
            | Self::UseKnowledgeBase { workspace_id, .. }
            | Self::SendEmail { workspace_id, .. }
            | Self::SendSms { workspace_id, .. } => Some(workspace_id),
        }
    }
}
