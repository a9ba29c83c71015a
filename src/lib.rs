//! Quotagate - plan enforcement and usage metering for multi-tenant SaaS
//!
//! Given a subscriber's plan and a proposed action (create a workspace, run a
//! workflow, send an email, grow a knowledge base, ...), quotagate decides
//! whether the action is allowed under the subscriber's current limits and,
//! if allowed, durably records the consumption. Persistence is pluggable:
//! implement [`UsageStore`] for your database and the engine does the rest.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use quotagate::{EngineConfig, PlanCatalog, PlanService, UsageAction};
//!
//! #[tokio::main]
//! async fn main() {
//!     quotagate::init_tracing();
//!
//!     let service = PlanService::new(
//!         my_store,                 // your UsageStore implementation
//!         PlanCatalog::new(),
//!         EngineConfig::default(),
//!     );
//!
//!     // Check and record in one race-free step:
//!     let decision = service
//!         .try_consume("user_123", &UsageAction::WebSearch)
//!         .await
//!         .unwrap();
//!     if !decision.is_allowed() {
//!         println!("{}", decision.reason.unwrap());
//!     }
//! }
//! ```
//!
//! # Design
//!
//! - Limits live in a compiled [`PlanCatalog`]; `-1` means unlimited.
//! - Daily and monthly counters reset against calendar anchors computed in a
//!   single civil timezone ([`calendar`]), never against raw timestamps.
//! - Every check returns a [`UsageDecision`]; denials are values, not errors.
//! - [`PlanService::try_consume`] serializes writers per subscriber so
//!   concurrent requests cannot overshoot a cap.

pub mod actions;
pub mod calendar;
pub mod checks;
pub mod config;
pub mod decision;
pub mod error;
pub mod messages;
pub mod plans;
pub mod service;
pub mod storage;
pub mod usage;

// Action exports
pub use actions::UsageAction;

// Calendar exports
pub use calendar::{CivilDate, Clock, SystemClock};

// Config exports
pub use config::{EngineConfig, EngineConfigBuilder};

// Decision exports
pub use decision::UsageDecision;

// Error exports
pub use error::{QuotaGateError, Result};

// Plan exports
pub use plans::{PlanCatalog, PlanConfig, PlanLimits, PlanPriority, PlanTier, UNLIMITED};

// Service exports
pub use service::{PlanService, SubscriberPlanState, SubscriberUsage};

// Storage exports
pub use storage::{SubscriberProfile, UsageStore};

// Usage exports
pub use usage::{GlobalUsage, WorkspaceUsage};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging with sensible defaults
///
/// This should be called early in your application, typically in main().
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "quotagate=debug")
/// - `QUOTAGATE_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("QUOTAGATE_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
