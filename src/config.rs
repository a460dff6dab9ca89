use tokio::sync::Semaphore;

use crate::error::ConfigError;

/// 切换引擎配置
#[derive(Debug, Clone)]
pub struct SwitcherConfig {
    /// 运行中扩展自身的 id，从扩展列表中排除
    pub self_extension_id: Option<String>,
    /// 同一阶段内并发切换的扩展数上限
    pub max_concurrent_toggles: usize,
    /// 等待处理的URL事件队列长度
    pub queue_capacity: usize,
}

impl Default for SwitcherConfig {
    fn default() -> Self {
        Self {
            self_extension_id: None,
            max_concurrent_toggles: 8,
            queue_capacity: 64,
        }
    }
}

impl SwitcherConfig {
    pub fn with_self_extension_id(mut self, id: impl Into<String>) -> Self {
        self.self_extension_id = Some(id.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_toggles == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.max_concurrent_toggles > Semaphore::MAX_PERMITS {
            return Err(ConfigError::TooManyToggles {
                max: Semaphore::MAX_PERMITS,
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SwitcherConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_limits() {
        let config = SwitcherConfig {
            max_concurrent_toggles: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroConcurrency));

        let config = SwitcherConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroQueueCapacity));
    }

    #[test]
    fn test_rejects_concurrency_above_semaphore_limit() {
        let config = SwitcherConfig {
            max_concurrent_toggles: usize::MAX,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooManyToggles {
                max: Semaphore::MAX_PERMITS
            })
        );

        let config = SwitcherConfig {
            max_concurrent_toggles: Semaphore::MAX_PERMITS,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
