//! Plan and run identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a sequential test plan.
///
/// Any non-empty string without surrounding whitespace. Plan ids must be
/// unique within a plan collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub String);

impl PlanId {
    /// Parse and validate a plan id.
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() || s.trim() != s {
            return None;
        }
        if s.chars().any(char::is_control) {
            return None;
        }
        Some(PlanId(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Run ID correlating log events and payloads of one CLI invocation.
///
/// Format: `run-YYYYMMDD-HHMMSS-<8 hex>`
/// Example: `run-20260115-143022-1f0c9a2b`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        RunId(format!(
            "run-{}-{}-{}",
            now.format("%Y%m%d"),
            now.format("%H%M%S"),
            &uuid[..8]
        ))
    }

    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != 28 || !s.starts_with("run-") {
            return None;
        }
        let bytes = s.as_bytes();
        if bytes.get(12) != Some(&b'-') || bytes.get(19) != Some(&b'-') {
            return None;
        }
        let date = &s[4..12];
        let time = &s[13..19];
        let suffix = &s[20..28];
        if !date.chars().all(|c| c.is_ascii_digit()) || !time.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        if !suffix.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')) {
            return None;
        }
        Some(RunId(s.to_string()))
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_id_rejects_blank_and_padded() {
        assert!(PlanId::parse("").is_none());
        assert!(PlanId::parse(" plan").is_none());
        assert!(PlanId::parse("a\tb").is_none());
        assert_eq!(PlanId::parse("ACC-7").unwrap().as_str(), "ACC-7");
    }

    #[test]
    fn run_id_round_trips_through_parse() {
        let id = RunId::new();
        assert!(RunId::parse(&id.0).is_some(), "{id}");
        assert!(RunId::parse("run-2026").is_none());
        assert!(RunId::parse("run-20260115-143022-1F0C9A2B").is_none());
    }
}
