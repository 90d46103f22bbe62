//! Placeholder display names (`"Chat {n}"`).
//!
//! New usecases are created with a placeholder name that the backend naming
//! jobs later replace. Stage 1 polling keys off this pattern.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::Usecase;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Chat (\d+)$").unwrap())
}

/// True if `name` is still a system-assigned placeholder.
pub fn is_placeholder_name(name: &str) -> bool {
    placeholder_re().is_match(name)
}

/// The `n` in `"Chat {n}"`, if `name` is a placeholder.
pub fn placeholder_number(name: &str) -> Option<u64> {
    placeholder_re()
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Placeholder for the next new chat: one past the highest existing number.
pub fn next_placeholder_name(usecases: &[Usecase]) -> String {
    let next = usecases
        .iter()
        .filter_map(|u| placeholder_number(&u.display_name))
        .max()
        .map_or(1, |n| n.saturating_add(1));
    format!("Chat {}", next)
}
