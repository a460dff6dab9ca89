//! Stored options shape.
//!
//! The list fields are kept as JSON strings, the way the options storage has
//! always held them. Decoding is lenient: a malformed field reads as empty
//! rather than failing the whole options load.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::ProfileGroup;

/// Where the extension list opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Popup,
    Tab,
    Window,
    Sidebar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ShowButtons {
    #[default]
    OnDemand,
    Always,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredOptions {
    pub position: Position,
    pub show_buttons: ShowButtons,
    /// JSON array of extension ids
    pub pinned_extensions: String,
    /// JSON array of `ProfileGroup`
    pub profile_groups: String,
    /// 配置组全局开关
    pub profiles_enabled: bool,
    /// JSON `ProfileGroup`, empty when unset
    pub default_profile_group: String,
}

impl Default for StoredOptions {
    fn default() -> Self {
        Self {
            position: Position::Popup,
            show_buttons: ShowButtons::OnDemand,
            pinned_extensions: "[]".to_string(),
            profile_groups: "[]".to_string(),
            profiles_enabled: true,
            default_profile_group: String::new(),
        }
    }
}

impl StoredOptions {
    /// Missing keys take their defaults; unknown legacy keys (`width`, `maxWidth`) are dropped.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn pinned_extensions(&self) -> Vec<String> {
        serde_json::from_str(&self.pinned_extensions).unwrap_or_else(|e| {
            warn!("⚠️  Ignoring malformed pinnedExtensions: {}", e);
            Vec::new()
        })
    }

    pub fn profile_groups(&self) -> Vec<ProfileGroup> {
        serde_json::from_str(&self.profile_groups).unwrap_or_else(|e| {
            warn!("⚠️  Ignoring malformed profileGroups: {}", e);
            Vec::new()
        })
    }

    pub fn default_profile_group(&self) -> Option<ProfileGroup> {
        if self.default_profile_group.trim().is_empty() {
            return None;
        }
        match serde_json::from_str(&self.default_profile_group) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("⚠️  Ignoring malformed defaultProfileGroup: {}", e);
                None
            }
        }
    }

    /// Pin or unpin an extension. Returns true when it is now pinned.
    pub fn toggle_pin(&mut self, extension_id: &str) -> Result<bool> {
        let mut pinned = self.pinned_extensions();
        let now_pinned = match pinned.iter().position(|id| id == extension_id) {
            Some(index) => {
                pinned.remove(index);
                false
            }
            None => {
                pinned.push(extension_id.to_string());
                true
            }
        };
        self.pinned_extensions = serde_json::to_string(&pinned)?;
        Ok(now_pinned)
    }

    pub fn settings(&self) -> ProfileSettings {
        ProfileSettings {
            profile_groups: self.profile_groups(),
            profiles_enabled: self.profiles_enabled,
            default_profile: self.default_profile_group(),
        }
    }
}

/// 状态切换所需的配置组视图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSettings {
    pub profile_groups: Vec<ProfileGroup>,
    pub profiles_enabled: bool,
    pub default_profile: Option<ProfileGroup>,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            profile_groups: Vec::new(),
            profiles_enabled: true,
            default_profile: None,
        }
    }
}

impl ProfileSettings {
    pub fn new(profile_groups: Vec<ProfileGroup>) -> Self {
        Self {
            profile_groups,
            ..Default::default()
        }
    }

    pub fn with_default_profile(mut self, profile: ProfileGroup) -> Self {
        self.default_profile = Some(profile);
        self
    }

    pub fn with_profiles_enabled(mut self, enabled: bool) -> Self {
        self.profiles_enabled = enabled;
        self
    }
}
