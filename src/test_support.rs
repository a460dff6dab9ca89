//! In-memory extension manager for unit tests.

use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::ToggleError;
use crate::management::ExtensionManager;
use crate::types::ExtensionInfo;

#[derive(Default)]
pub struct FakeManager {
    extensions: Mutex<Vec<ExtensionInfo>>,
    locked: Mutex<HashSet<String>>,
    broken: Mutex<HashSet<String>>,
    calls: Mutex<Vec<(String, bool)>>,
}

impl FakeManager {
    pub fn with_extensions(extensions: &[(&str, bool)]) -> Self {
        let manager = Self::default();
        {
            let mut list = manager.extensions.lock().unwrap();
            for (id, enabled) in extensions {
                list.push(ExtensionInfo {
                    id: id.to_string(),
                    name: id.to_uppercase(),
                    enabled: *enabled,
                    may_disable: true,
                    kind: "extension".to_string(),
                });
            }
        }
        manager
    }

    pub fn push(&self, info: ExtensionInfo) {
        self.extensions.lock().unwrap().push(info);
    }

    pub fn lock(&self, id: &str) {
        self.locked.lock().unwrap().insert(id.to_string());
    }

    /// set_enabled 返回 Unexpected，而不是 Refused
    pub fn break_extension(&self, id: &str) {
        self.broken.lock().unwrap().insert(id.to_string());
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.extensions
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.enabled)
            .unwrap()
    }

    pub fn calls(&self) -> Vec<(String, bool)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl ExtensionManager for FakeManager {
    async fn list_extensions(&self) -> Result<Vec<ExtensionInfo>> {
        Ok(self.extensions.lock().unwrap().clone())
    }

    async fn set_enabled(&self, id: &str, enabled: bool) -> std::result::Result<(), ToggleError> {
        self.calls.lock().unwrap().push((id.to_string(), enabled));

        if self.broken.lock().unwrap().contains(id) {
            return Err(ToggleError::Unexpected {
                id: id.to_string(),
                reason: "host API error".to_string(),
            });
        }

        if self.locked.lock().unwrap().contains(id) {
            return Err(ToggleError::Refused {
                id: id.to_string(),
                reason: "locked by policy".to_string(),
            });
        }

        let mut list = self.extensions.lock().unwrap();
        match list.iter_mut().find(|e| e.id == id) {
            Some(ext) => {
                ext.enabled = enabled;
                Ok(())
            }
            None => Err(ToggleError::Unexpected {
                id: id.to_string(),
                reason: "no such extension".to_string(),
            }),
        }
    }
}
