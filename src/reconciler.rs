//! 配置组状态切换
//!
//! 每次URL变化执行一轮：
//! 1. 解析当前应生效的配置组 (无匹配时退回默认配置组)
//! 2. 与当前生效的配置组相同则只更新 `last_matched_url`
//! 3. 离开旧配置组：按保存的状态逐个恢复，单个失败不影响其它扩展
//! 4. 进入新配置组：先记录原始状态，再切换到目标状态
//! 5. 整体写回 `ProfileMatchState`
//!
//! 切换失败只记录、不重试，整轮流程从不向调用方返回错误。
//! 被拒绝的切换不会保留在 `saved_states` 里：离开配置组时只恢复真正改动过的扩展。

use std::collections::{HashMap, HashSet};

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::SwitcherConfig;
use crate::management::{set_extension_enabled_safe, ExtensionManager, ToggleOutcome};
use crate::options::ProfileSettings;
use crate::profile_resolver::find_matching_profile;
use crate::types::{ProfileGroup, ProfileMatchState, SavedExtensionState};

/// 一轮切换的结果摘要
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub url: Option<String>,
    pub previous_profile_id: Option<String>,
    pub active_profile_id: Option<String>,
    /// 生效配置组是否发生变化
    pub changed: bool,
    /// 已恢复原状态的扩展
    pub restored: Vec<String>,
    /// 已切换到目标状态的扩展 (含本来就处于目标状态的)
    pub applied: Vec<String>,
    /// 宿主拒绝切换的扩展
    pub refused: Vec<String>,
}

/// 当前URL应生效的配置组
///
/// 全局开关关闭时永远为 None；没有匹配时使用启用中的默认配置组。
pub fn resolve_active_profile<'a>(url: &str, settings: &'a ProfileSettings) -> Option<&'a ProfileGroup> {
    if !settings.profiles_enabled {
        return None;
    }

    find_matching_profile(url, &settings.profile_groups)
        .or_else(|| settings.default_profile.as_ref().filter(|p| p.enabled))
}

/// Single owner of `ProfileMatchState`. All mutation goes through
/// [`StateReconciler::reconcile`] and [`StateReconciler::deactivate`].
pub struct StateReconciler {
    state: ProfileMatchState,
    max_concurrent_toggles: usize,
}

impl StateReconciler {
    pub fn new(config: &SwitcherConfig) -> Self {
        Self {
            state: ProfileMatchState::default(),
            // 超过 MAX_PERMITS 时 Semaphore::new 会 panic
            max_concurrent_toggles: config.max_concurrent_toggles.clamp(1, Semaphore::MAX_PERMITS),
        }
    }

    pub fn state(&self) -> &ProfileMatchState {
        &self.state
    }

    pub fn into_state(self) -> ProfileMatchState {
        self.state
    }

    /// 执行一轮匹配与切换
    pub async fn reconcile(
        &mut self,
        url: &str,
        settings: &ProfileSettings,
        manager: &dyn ExtensionManager,
    ) -> ReconcileReport {
        let target = resolve_active_profile(url, settings);
        let target_id = target.map(|p| p.id.clone());
        let previous_id = self.state.active_profile_id.clone();

        if target_id == previous_id {
            self.state.last_matched_url = Some(url.to_string());
            return ReconcileReport {
                url: Some(url.to_string()),
                previous_profile_id: previous_id.clone(),
                active_profile_id: previous_id,
                ..Default::default()
            };
        }

        info!(
            "🔄 Profile switch for {}: {} -> {}",
            url,
            previous_id.as_deref().unwrap_or("none"),
            target.map(|p| p.name.as_str()).unwrap_or("none")
        );

        let mut report = ReconcileReport {
            url: Some(url.to_string()),
            previous_profile_id: previous_id,
            active_profile_id: target_id.clone(),
            changed: true,
            ..Default::default()
        };

        self.restore_saved_states(manager, &mut report).await;

        let saved_states = match target {
            Some(profile) => self.apply_profile(profile, manager, &mut report).await,
            None => Vec::new(),
        };

        self.state = ProfileMatchState {
            active_profile_id: target_id,
            saved_states,
            last_matched_url: Some(url.to_string()),
        };

        if !report.refused.is_empty() {
            warn!(
                "⚠️  {} extension(s) could not be changed: {}",
                report.refused.len(),
                report.refused.join(", ")
            );
        }

        report
    }

    /// 恢复并清除当前生效的配置组 (关闭全局开关或退出时使用)
    pub async fn deactivate(&mut self, manager: &dyn ExtensionManager) -> ReconcileReport {
        let previous_id = self.state.active_profile_id.clone();
        let mut report = ReconcileReport {
            url: self.state.last_matched_url.clone(),
            previous_profile_id: previous_id.clone(),
            changed: previous_id.is_some(),
            ..Default::default()
        };

        if previous_id.is_none() {
            return report;
        }

        info!("🛑 Deactivating profile {}", previous_id.as_deref().unwrap_or_default());
        self.restore_saved_states(manager, &mut report).await;

        self.state = ProfileMatchState {
            active_profile_id: None,
            saved_states: Vec::new(),
            last_matched_url: self.state.last_matched_url.take(),
        };

        report
    }

    async fn restore_saved_states(&self, manager: &dyn ExtensionManager, report: &mut ReconcileReport) {
        if self.state.saved_states.is_empty() {
            return;
        }

        let changes = self
            .state
            .saved_states
            .iter()
            .map(|saved| (saved.extension_id.clone(), saved.was_enabled))
            .collect();

        for (id, outcome) in self.apply_toggles(manager, changes).await {
            if outcome.ok {
                report.restored.push(id);
            } else {
                debug!("Restore of {} skipped: {:?}", id, outcome.reason);
                report.refused.push(id);
            }
        }
    }

    /// 返回需要保存的原始状态
    async fn apply_profile(
        &self,
        profile: &ProfileGroup,
        manager: &dyn ExtensionManager,
        report: &mut ReconcileReport,
    ) -> Vec<SavedExtensionState> {
        let targets: Vec<(&str, bool)> = profile
            .extension_states
            .iter()
            .filter_map(|s| s.target_state.desired_enabled().map(|d| (s.extension_id.as_str(), d)))
            .collect();

        if targets.is_empty() {
            return Vec::new();
        }

        // 必须在恢复完成之后读取，才能拿到真正的原始状态
        let installed = match manager.list_extensions().await {
            Ok(list) => list,
            Err(e) => {
                warn!("⚠️  Failed to list extensions, profile {:?} not applied: {}", profile.name, e);
                Vec::new()
            }
        };
        let current: HashMap<&str, bool> = installed.iter().map(|e| (e.id.as_str(), e.enabled)).collect();

        let mut saved = Vec::new();
        let mut changes = Vec::new();
        let mut seen = HashSet::new();

        for (id, desired) in targets {
            // 同一扩展重复出现时只取第一条
            if !seen.insert(id) {
                continue;
            }
            let Some(&was_enabled) = current.get(id) else {
                debug!("Extension {} is not installed, skipping", id);
                continue;
            };

            saved.push(SavedExtensionState {
                extension_id: id.to_string(),
                was_enabled,
            });

            if was_enabled == desired {
                report.applied.push(id.to_string());
            } else {
                changes.push((id.to_string(), desired));
            }
        }

        for (id, outcome) in self.apply_toggles(manager, changes).await {
            if outcome.ok {
                report.applied.push(id);
            } else {
                saved.retain(|s| s.extension_id != id);
                report.refused.push(id);
            }
        }

        saved
    }

    /// 并发切换，互不影响；失败折算为 `ToggleOutcome`
    async fn apply_toggles(
        &self,
        manager: &dyn ExtensionManager,
        changes: Vec<(String, bool)>,
    ) -> Vec<(String, ToggleOutcome)> {
        let semaphore = Semaphore::new(self.max_concurrent_toggles);
        let semaphore = &semaphore;

        let tasks = changes.into_iter().map(|(id, enabled)| async move {
            let _permit = semaphore.acquire().await.ok();
            let outcome = match set_extension_enabled_safe(manager, &id, enabled, true).await {
                Ok(outcome) => outcome,
                Err(e) => ToggleOutcome::failed(e.kind()),
            };
            debug!("Set {} enabled={} -> {:?}", id, enabled, outcome);
            (id, outcome)
        });

        join_all(tasks).await
    }
}
