//! Prepares the installed-extension list the popup shows.
//!
//! Only real extensions are kept (no themes or apps) and the running extension
//! is excluded. `may_disable` is probed by re-applying each extension's current
//! state, since some extensions report `mayDisable` but still refuse changes
//! (policy-installed, deprecated).

use std::cmp::Ordering;

use anyhow::Result;
use futures::future::join_all;
use tracing::{debug, info};

use crate::config::SwitcherConfig;
use crate::management::{set_extension_enabled_safe, ExtensionManager};
use crate::options::StoredOptions;
use crate::types::ExtensionInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedExtension {
    pub info: ExtensionInfo,
    pub shown: bool,
    /// lowercase name used for filtering
    pub indexed_name: String,
    pub is_pinned: bool,
    /// 实际探测结果，可能比宿主报告的更严格
    pub may_disable: bool,
}

/// Pinned first, then enabled first, then by name.
pub fn sort_extensions(extensions: &mut [ExtensionInfo], pinned: &[String]) {
    extensions.sort_by(|a, b| {
        let a_pinned = pinned.contains(&a.id);
        let b_pinned = pinned.contains(&b.id);

        b_pinned
            .cmp(&a_pinned)
            .then_with(|| b.enabled.cmp(&a.enabled))
            .then_with(|| compare_names(&a.name, &b.name))
    });
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

async fn check_can_modify(manager: &dyn ExtensionManager, extension: &ExtensionInfo) -> bool {
    if !extension.may_disable {
        return false;
    }

    match set_extension_enabled_safe(manager, &extension.id, extension.enabled, true).await {
        Ok(outcome) => outcome.ok,
        Err(_) => false,
    }
}

pub async fn prepare_extension_list(
    manager: &dyn ExtensionManager,
    options: &StoredOptions,
    config: &SwitcherConfig,
) -> Result<Vec<PreparedExtension>> {
    let pinned = options.pinned_extensions();
    let self_id = config.self_extension_id.as_deref();

    let mut extensions: Vec<ExtensionInfo> = manager
        .list_extensions()
        .await?
        .into_iter()
        .filter(|e| e.kind == "extension" && Some(e.id.as_str()) != self_id)
        .collect();

    sort_extensions(&mut extensions, &pinned);

    let can_modify = join_all(extensions.iter().map(|e| check_can_modify(manager, e))).await;

    let prepared: Vec<PreparedExtension> = extensions
        .into_iter()
        .zip(can_modify)
        .map(|(info, may_disable)| {
            if !may_disable {
                debug!("Extension {} ({}) cannot be modified", info.name, info.id);
            }
            PreparedExtension {
                indexed_name: info.name.to_lowercase(),
                is_pinned: pinned.contains(&info.id),
                shown: true,
                may_disable,
                info,
            }
        })
        .collect();

    info!("📋 Prepared {} extensions ({} pinned)", prepared.len(), pinned.len());
    Ok(prepared)
}
