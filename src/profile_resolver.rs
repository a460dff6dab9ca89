//! Picks the single active profile for a URL.
//!
//! Profiles are tried highest priority first. Equal priorities keep their input
//! order, so the result is deterministic for a fixed `(url, profiles)` pair.

use tracing::debug;

use crate::types::ProfileGroup;
use crate::url_matcher::match_url;

/// A profile matches when it is enabled, has at least one condition, and any
/// condition matches (OR only).
pub fn match_profile(url: &str, profile: &ProfileGroup) -> bool {
    if !profile.enabled || profile.conditions.is_empty() {
        return false;
    }

    profile.conditions.iter().any(|condition| match_url(url, condition))
}

pub fn find_matching_profile<'a>(url: &str, profiles: &'a [ProfileGroup]) -> Option<&'a ProfileGroup> {
    let mut candidates: Vec<&ProfileGroup> = profiles
        .iter()
        .filter(|p| p.enabled && !p.conditions.is_empty())
        .collect();

    // sort_by 是稳定排序，同优先级保持原顺序
    candidates.sort_by(|a, b| b.priority.cmp(&a.priority));

    let matched = candidates.into_iter().find(|profile| match_profile(url, profile));

    if let Some(profile) = matched {
        debug!("Profile {:?} (priority {}) matched {}", profile.name, profile.priority, url);
    }

    matched
}
