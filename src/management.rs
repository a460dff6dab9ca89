//! 扩展管理接口
//!
//! 宿主的扩展管理API由 `ExtensionManager` 抽象。切换失败不走异常路径，
//! 统一折算为 `ToggleOutcome`，调用方可以区分"被拒绝"和"成功"。

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::error::{ToggleError, ToggleFailureKind};
use crate::types::ExtensionInfo;

/// Host extension-management capability.
#[async_trait]
pub trait ExtensionManager: Send + Sync {
    /// All installed extensions, including themes and apps.
    async fn list_extensions(&self) -> Result<Vec<ExtensionInfo>>;

    /// Attempt to change one extension's enabled flag.
    async fn set_enabled(&self, id: &str, enabled: bool) -> std::result::Result<(), ToggleError>;
}

/// 单次切换的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub ok: bool,
    pub reason: Option<ToggleFailureKind>,
}

impl ToggleOutcome {
    pub fn success() -> Self {
        Self { ok: true, reason: None }
    }

    pub fn failed(reason: ToggleFailureKind) -> Self {
        Self { ok: false, reason: Some(reason) }
    }
}

/// 安全地切换扩展状态
///
/// `swallow = true` 时失败以 `ToggleOutcome { ok: false, .. }` 返回；
/// 否则原样返回错误 (用户显式切换时需要提示)。
pub async fn set_extension_enabled_safe(
    manager: &dyn ExtensionManager,
    id: &str,
    enabled: bool,
    swallow: bool,
) -> std::result::Result<ToggleOutcome, ToggleError> {
    match manager.set_enabled(id, enabled).await {
        Ok(()) => Ok(ToggleOutcome::success()),
        Err(e) if swallow => {
            debug!("Toggle of {} to {} swallowed: {}", id, enabled, e);
            Ok(ToggleOutcome::failed(e.kind()))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LockedManager;

    #[async_trait]
    impl ExtensionManager for LockedManager {
        async fn list_extensions(&self) -> Result<Vec<ExtensionInfo>> {
            Ok(Vec::new())
        }

        async fn set_enabled(&self, id: &str, _enabled: bool) -> std::result::Result<(), ToggleError> {
            Err(ToggleError::Refused {
                id: id.to_string(),
                reason: "policy".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_swallow_reports_refusal() {
        let outcome = set_extension_enabled_safe(&LockedManager, "ext", true, true).await.unwrap();
        assert!(!outcome.ok);
        assert_eq!(outcome.reason, Some(ToggleFailureKind::Refused));
    }

    #[tokio::test]
    async fn test_without_swallow_surfaces_error() {
        let err = set_extension_enabled_safe(&LockedManager, "ext", false, false)
            .await
            .unwrap_err();
        assert_eq!(err.extension_id(), "ext");
        assert!(err.to_string().contains("cannot be modified"));
    }
}
