//! 错误类型
//!
//! 匹配与状态切换本身从不向调用方返回错误：
//! - `PatternError` 只在编辑时的 `validate_pattern` 中暴露，运行时一律视为不匹配
//! - `ToggleError` 在自动切换中被吞掉，仅在用户显式切换时上抛

use thiserror::Error;

/// 匹配规则编译失败
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Pattern cannot be empty")]
    Empty,

    #[error("Invalid regular expression: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// 宿主拒绝或无法切换扩展状态
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToggleError {
    /// 策略锁定、已弃用等，属于预期内的失败
    #[error("extension {id} cannot be modified: {reason}")]
    Refused { id: String, reason: String },

    #[error("unexpected failure toggling {id}: {reason}")]
    Unexpected { id: String, reason: String },
}

impl ToggleError {
    pub fn extension_id(&self) -> &str {
        match self {
            ToggleError::Refused { id, .. } | ToggleError::Unexpected { id, .. } => id,
        }
    }

    pub fn kind(&self) -> ToggleFailureKind {
        match self {
            ToggleError::Refused { .. } => ToggleFailureKind::Refused,
            ToggleError::Unexpected { .. } => ToggleFailureKind::Unexpected,
        }
    }
}

/// 失败类别 (用于 `ToggleOutcome::reason`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleFailureKind {
    Refused,
    Unexpected,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_concurrent_toggles must be at least 1")]
    ZeroConcurrency,

    #[error("max_concurrent_toggles must not exceed {max}")]
    TooManyToggles { max: usize },

    #[error("queue_capacity must be at least 1")]
    ZeroQueueCapacity,
}
