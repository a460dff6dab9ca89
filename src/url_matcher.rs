//! URL匹配模块
//!
//! 将单个匹配条件编译为URL谓词，支持三种类型：
//! - 主机通配符：只看主机名 (`*.example.com`、`**.example.com`、`.example.com`、`example.*`)
//! - URL通配符：匹配完整URL (`https://*.example.com/*`)
//! - 正则表达式：原样使用，不区分大小写
//!
//! 编译失败一律视为不匹配，只打印诊断日志，不会中断匹配流程。

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::error::PatternError;
use crate::types::{MatchCondition, MatchType};

/// 编译后的URL谓词
#[derive(Debug, Clone)]
pub enum UrlPredicate {
    /// 作用于主机名
    Host(Regex),
    /// 作用于完整URL
    Url(Regex),
}

impl UrlPredicate {
    pub fn test(&self, url: &str) -> bool {
        match self {
            UrlPredicate::Host(re) => re.is_match(&extract_host(url)),
            UrlPredicate::Url(re) => re.is_match(url),
        }
    }
}

fn build_case_insensitive(pattern: &str, source_pattern: &str) -> Result<Regex, PatternError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| PatternError::InvalidRegex {
            pattern: source_pattern.to_string(),
            source,
        })
}

/// 转义后把 `*` 还原为 `.*`
fn escape_with_wildcards(pattern: &str) -> String {
    regex::escape(pattern).replace(r"\*", ".*")
}

/// 主机通配符 -> 正则
///
/// - `.example.com` 等价于 `*.example.com`
/// - `**.example.com` 只匹配子域名，不含 example.com 本身
/// - `*.example.com` 匹配 example.com 及所有子域名
/// - 其它位置的 `*` 匹配任意字符
pub fn host_wildcard_to_regex(pattern: &str) -> Result<Regex, PatternError> {
    let normalized = if pattern.starts_with('.') {
        format!("*{}", pattern)
    } else {
        pattern.to_string()
    };

    let regex_str = if let Some(domain) = normalized.strip_prefix("**.") {
        format!(r"^.+\.{}$", regex::escape(domain))
    } else if let Some(domain) = normalized.strip_prefix("*.") {
        format!(r"^(.*\.)?{}$", regex::escape(domain))
    } else {
        format!("^{}$", escape_with_wildcards(&normalized))
    };

    build_case_insensitive(&regex_str, pattern)
}

/// URL通配符 -> 正则 (除 `*` 外全部转义，两端锚定)
pub fn url_wildcard_to_regex(pattern: &str) -> Result<Regex, PatternError> {
    // 转义后不会残留 `^`/`$` 锚点
    let regex_str = format!("^{}$", escape_with_wildcards(pattern));
    build_case_insensitive(&regex_str, pattern)
}

pub fn compile_regex(pattern: &str) -> Result<Regex, PatternError> {
    build_case_insensitive(pattern, pattern)
}

/// Compiles one condition. Each match type has its own compile function.
pub fn compile_condition(condition: &MatchCondition) -> Result<UrlPredicate, PatternError> {
    match condition.match_type {
        MatchType::HostWildcard => host_wildcard_to_regex(&condition.pattern).map(UrlPredicate::Host),
        MatchType::UrlWildcard => url_wildcard_to_regex(&condition.pattern).map(UrlPredicate::Url),
        MatchType::Regex => compile_regex(&condition.pattern).map(UrlPredicate::Url),
    }
}

/// 提取URL中的主机名
///
/// 标准解析失败时，退回到 `^(?:\w+://)?([^/:]+)` 的手工提取。
pub fn extract_host(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => parsed.host_str().unwrap_or("").to_string(),
        Err(_) => extract_host_fallback(url),
    }
}

fn extract_host_fallback(url: &str) -> String {
    let host_prefix = |s: &str| -> String {
        s.split(|c: char| c == '/' || c == ':').next().unwrap_or("").to_string()
    };

    if let Some(pos) = url.find("://") {
        let scheme = &url[..pos];
        let is_word_scheme =
            !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if is_word_scheme {
            let host = host_prefix(&url[pos + 3..]);
            if !host.is_empty() {
                return host;
            }
        }
    }

    host_prefix(url)
}

/// 检查URL是否匹配条件
///
/// 禁用的条件直接返回 false，不做编译。
pub fn match_url(url: &str, condition: &MatchCondition) -> bool {
    if !condition.enabled {
        return false;
    }

    match compile_condition(condition) {
        Ok(predicate) => predicate.test(url),
        Err(e) => {
            warn!(
                "⚠️  [URL Matcher] Invalid pattern {:?} ({}): {}",
                condition.pattern,
                condition.match_type.name(),
                e
            );
            false
        }
    }
}

/// 编辑时校验规则，返回错误描述；合法时返回 None
pub fn validate_pattern(pattern: &str, match_type: MatchType) -> Option<String> {
    if pattern.trim().is_empty() {
        return Some(PatternError::Empty.to_string());
    }

    if match_type == MatchType::Regex {
        if let Err(e) = compile_regex(pattern) {
            return Some(e.to_string());
        }
    }

    None
}
