//! Switches browser extensions on and off based on the active tab's URL.
//!
//! Profile groups bundle URL conditions with target extension states. On every
//! URL change the highest-priority matching profile is applied, and the
//! previous profile's changes are rolled back.

pub mod config;
pub mod engine;
pub mod error;
pub mod extension_list;
pub mod management;
pub mod options;
pub mod profile_resolver;
pub mod reconciler;
pub mod types;
pub mod url_matcher;

#[cfg(test)]
mod test_support;

pub use config::SwitcherConfig;
pub use engine::ProfileEngine;
pub use error::{ConfigError, PatternError, ToggleError, ToggleFailureKind};
pub use management::{set_extension_enabled_safe, ExtensionManager, ToggleOutcome};
pub use options::{ProfileSettings, StoredOptions};
pub use profile_resolver::{find_matching_profile, match_profile};
pub use reconciler::{resolve_active_profile, ReconcileReport, StateReconciler};
pub use types::{
    ExtensionInfo, ExtensionStateConfig, ExtensionTargetState, MatchCondition, MatchType, ProfileGroup,
    ProfileMatchState, SavedExtensionState,
};
pub use url_matcher::{match_url, validate_pattern};

/// Initialize logging for a host process. `RUST_LOG` overrides the INFO default.
///
/// 可重复调用：已有全局 subscriber 时直接忽略
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(default_env_filter())
        .try_init();
}

fn default_env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}
