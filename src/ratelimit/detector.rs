//! Rate limit detection
//!
//! Classifies polecat exits as rate-limit or not, from the exit code and captured
//! stderr. The supported agent CLI exits with a fixed sentinel code when throttled;
//! other CLIs surface throttling only in stderr, so both signals are checked.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Exit code the supported agent CLI uses when it is rate limited
pub const RATE_LIMIT_EXIT_CODE: i32 = 2;

/// Maximum characters of stderr carried in an event snippet
const MAX_SNIPPET_CHARS: usize = 500;

lazy_static! {
    /// Stderr patterns that indicate rate limiting, regardless of exit code.
    ///
    /// This list is a stable contract: any upstream CLI whose throttle output
    /// matches one of these is supported without code change.
    static ref RATE_LIMIT_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)429").expect("valid rate limit pattern"),
        Regex::new(r"(?i)rate[^a-z0-9]?limit").expect("valid rate limit pattern"),
        Regex::new(r"(?i)too many requests").expect("valid rate limit pattern"),
        Regex::new(r"(?i)overloaded").expect("valid rate limit pattern"),
        Regex::new(r"(?i)capacity").expect("valid rate limit pattern"),
    ];
}

/// A detected rate limit occurrence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitEvent {
    /// Agent identifier in `rig/polecat` form
    pub agent_id: String,

    /// Credential profile that was in use when the limit hit
    pub profile: String,

    /// API provider (e.g. "anthropic")
    pub provider: String,

    /// When the event was detected
    pub timestamp: DateTime<Utc>,

    /// Process exit code
    pub exit_code: i32,

    /// Trimmed stderr excerpt, capped at 500 characters
    pub error_snippet: String,
}

/// Detects rate limit events from exit codes and stderr output.
///
/// Classification itself is pure; the agent context set via
/// [`set_agent_info`](Detector::set_agent_info) is only copied into emitted
/// events. The handler builds a fresh detector per exit, so configuring and
/// detecting never race.
#[derive(Debug, Default)]
pub struct Detector {
    agent_id: String,
    profile: String,
    provider: String,
}

impl Detector {
    /// Create a detector with empty agent context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the agent context copied into emitted events
    pub fn set_agent_info(
        &mut self,
        agent_id: impl Into<String>,
        profile: impl Into<String>,
        provider: impl Into<String>,
    ) {
        self.agent_id = agent_id.into();
        self.profile = profile.into();
        self.provider = provider.into();
    }

    /// Classify an exit, returning an event iff it was a rate limit.
    ///
    /// A clean exit (code 0) is never a rate limit, whatever stderr says.
    pub fn detect(&self, exit_code: i32, stderr: &str) -> Option<RateLimitEvent> {
        if exit_code == 0 {
            return None;
        }

        if exit_code == RATE_LIMIT_EXIT_CODE || matches_rate_limit_pattern(stderr) {
            return Some(self.create_event(exit_code, extract_snippet(stderr)));
        }

        None
    }

    fn create_event(&self, exit_code: i32, snippet: String) -> RateLimitEvent {
        RateLimitEvent {
            agent_id: self.agent_id.clone(),
            profile: self.profile.clone(),
            provider: self.provider.clone(),
            timestamp: Utc::now(),
            exit_code,
            error_snippet: snippet,
        }
    }
}

/// Check stderr against the rate limit pattern list
fn matches_rate_limit_pattern(stderr: &str) -> bool {
    if stderr.is_empty() {
        return false;
    }
    RATE_LIMIT_PATTERNS.iter().any(|p| p.is_match(stderr))
}

/// Trim stderr and cap it at the snippet limit, marking truncation with `...`
fn extract_snippet(stderr: &str) -> String {
    let trimmed = stderr.trim();
    match trimmed.char_indices().nth(MAX_SNIPPET_CHARS) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_exit_code() {
        let detector = Detector::new();

        let event = detector.detect(2, "");
        assert!(event.is_some());
        assert_eq!(event.unwrap().exit_code, 2);

        assert!(detector.detect(0, "").is_none());
        assert!(detector.detect(1, "").is_none());
    }

    #[test]
    fn test_detect_stderr_patterns() {
        let detector = Detector::new();

        let cases = [
            "Error: received 429 response",
            "Error: rate limit exceeded",
            "rate-limit hit",
            "rate_limit_error",
            "ratelimit reached",
            "too many requests, please wait",
            "API is overloaded",
            "insufficient capacity",
            "the service is at capacity",
            "RATE LIMIT reached",
        ];
        for stderr in cases {
            assert!(
                detector.detect(1, stderr).is_some(),
                "expected detection for {:?}",
                stderr
            );
        }
    }

    #[test]
    fn test_detect_no_rate_limit() {
        let detector = Detector::new();

        assert!(detector.detect(1, "Error: file not found").is_none());
        assert!(detector.detect(1, "").is_none());
        assert!(detector.detect(124, "Error: operation timed out").is_none());
        // A clean exit cannot be a throttle, whatever stderr carries
        assert!(detector.detect(0, "429 too many requests").is_none());
    }

    #[test]
    fn test_detect_is_deterministic() {
        let detector = Detector::new();

        for _ in 0..3 {
            assert!(detector.detect(1, "rate limit").is_some());
            assert!(detector.detect(1, "all fine").is_none());
        }
    }

    #[test]
    fn test_event_fields() {
        let mut detector = Detector::new();
        detector.set_agent_info("gastown/Toast", "anthropic_acctA", "anthropic");

        let event = detector.detect(2, "rate limit exceeded").unwrap();
        assert_eq!(event.agent_id, "gastown/Toast");
        assert_eq!(event.profile, "anthropic_acctA");
        assert_eq!(event.provider, "anthropic");
        assert_eq!(event.exit_code, 2);
        assert_eq!(event.error_snippet, "rate limit exceeded");
        assert!(Utc::now() - event.timestamp < chrono::Duration::seconds(1));
    }

    #[test]
    fn test_event_fields_default_empty() {
        let detector = Detector::new();
        let event = detector.detect(2, "").unwrap();
        assert_eq!(event.agent_id, "");
        assert_eq!(event.profile, "");
        assert_eq!(event.provider, "");
    }

    #[test]
    fn test_snippet_truncation() {
        let detector = Detector::new();

        let long = format!("rate limit {}", "x".repeat(1000));
        let event = detector.detect(1, &long).unwrap();
        assert_eq!(event.error_snippet.chars().count(), MAX_SNIPPET_CHARS + 3);
        assert!(event.error_snippet.ends_with("..."));

        let short = "rate limit exceeded";
        let event = detector.detect(1, short).unwrap();
        assert_eq!(event.error_snippet, short);
    }

    #[test]
    fn test_snippet_trims_whitespace() {
        let detector = Detector::new();
        let event = detector.detect(1, "  429 response\n").unwrap();
        assert_eq!(event.error_snippet, "429 response");
    }
}
