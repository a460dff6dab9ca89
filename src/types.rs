//! Profile group data model.
//!
//! Field names serialize in the camelCase shape the options storage already uses,
//! so stored profile groups decode without a migration.

use serde::{Deserialize, Serialize};

/// URL匹配条件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchType {
    /// 仅匹配主机名 (`*.example.com`, `**.example.com`, `example.*`)
    HostWildcard,
    /// 匹配完整URL (`https://*.example.com/*`)
    UrlWildcard,
    /// 正则表达式 (不区分大小写)
    Regex,
}

impl MatchType {
    pub fn name(&self) -> &'static str {
        match self {
            MatchType::HostWildcard => "host-wildcard",
            MatchType::UrlWildcard => "url-wildcard",
            MatchType::Regex => "regex",
        }
    }
}

/// URL匹配条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCondition {
    pub id: String,
    #[serde(rename = "type")]
    pub match_type: MatchType,
    pub pattern: String,
    pub enabled: bool,
}

impl MatchCondition {
    /// 创建一个启用的条件，分配新的 UUID
    pub fn new(match_type: MatchType, pattern: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            match_type,
            pattern: pattern.into(),
            enabled: true,
        }
    }
}

/// 扩展在配置组中的目标状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionTargetState {
    Enable,
    Disable,
    Keep,
}

impl ExtensionTargetState {
    /// `Keep` 没有目标值
    pub fn desired_enabled(&self) -> Option<bool> {
        match self {
            ExtensionTargetState::Enable => Some(true),
            ExtensionTargetState::Disable => Some(false),
            ExtensionTargetState::Keep => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionStateConfig {
    pub extension_id: String,
    pub target_state: ExtensionTargetState,
}

/// A named, prioritized bundle of URL conditions and extension target states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileGroup {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    /// Higher is checked first. Not unique.
    pub priority: i64,
    #[serde(default)]
    pub conditions: Vec<MatchCondition>,
    #[serde(default)]
    pub extension_states: Vec<ExtensionStateConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    /// Epoch milliseconds
    pub created_at: i64,
    pub updated_at: i64,
}

impl ProfileGroup {
    /// 创建一个空的、启用的配置组
    pub fn new(name: impl Into<String>, priority: i64) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            enabled: true,
            priority,
            conditions: Vec::new(),
            extension_states: Vec::new(),
            is_default: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_condition(mut self, condition: MatchCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_extension_state(
        mut self,
        extension_id: impl Into<String>,
        target_state: ExtensionTargetState,
    ) -> Self {
        self.extension_states.push(ExtensionStateConfig {
            extension_id: extension_id.into(),
            target_state,
        });
        self
    }
}

/// 应用配置组之前扩展的启用状态 (用于恢复)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedExtensionState {
    pub extension_id: String,
    pub was_enabled: bool,
}

/// 后台跟踪的配置组匹配状态
///
/// 只由 `StateReconciler` 修改；其它地方只能拿到快照。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMatchState {
    pub active_profile_id: Option<String>,
    pub saved_states: Vec<SavedExtensionState>,
    pub last_matched_url: Option<String>,
}

/// 宿主报告的已安装扩展
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionInfo {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub may_disable: bool,
    /// `extension`, `theme`, `hosted_app` ...
    #[serde(rename = "type")]
    pub kind: String,
}
