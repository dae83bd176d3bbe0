//! Graceful session replacement
//!
//! The swap protocol: stop the throttled session, start a replacement under the
//! new credential profile, re-attach hooked work, and nudge the new session to
//! resume. Once the replacement is live, hook and nudge failures downgrade to
//! warnings rather than failing the swap.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::logging::Logger;
use crate::session::SessionController;
use crate::GasTownError;

/// Why a session is being swapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapReason {
    /// The session was throttled by its upstream provider
    RateLimit,
    /// The session stopped making progress
    Stuck,
    /// An operator requested the swap
    Manual,
}

impl fmt::Display for SwapReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimit => write!(f, "rate_limit"),
            Self::Stuck => write!(f, "stuck"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Parameters for swapping a polecat session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRequest {
    /// Rig containing the polecat
    pub rig: String,

    /// Polecat whose session is being replaced
    pub polecat: String,

    /// Profile being replaced
    pub old_profile: String,

    /// Profile the replacement session runs under
    pub new_profile: String,

    /// Bead ID of hooked work to re-attach, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooked_work: Option<String>,

    /// Why the swap is happening
    pub reason: SwapReason,
}

/// Outcome of a swap operation
#[derive(Debug)]
pub struct SwapResult {
    /// Whether the replacement session is live
    pub success: bool,

    /// Session ID of the replacement, set once `start` succeeds
    pub new_session_id: Option<String>,

    /// The failure, when `success` is false
    pub error: Option<GasTownError>,

    /// When the outcome was recorded
    pub timestamp: DateTime<Utc>,

    /// Audit record, populated on success
    pub event: Option<SwapEvent>,
}

impl SwapResult {
    fn failed(error: GasTownError) -> Self {
        Self {
            success: false,
            new_session_id: None,
            error: Some(error),
            timestamp: Utc::now(),
            event: None,
        }
    }
}

/// Audit record of a completed swap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapEvent {
    /// Rig containing the polecat
    pub rig: String,

    /// Polecat that was swapped
    pub polecat: String,

    /// Previous profile
    pub old_profile: String,

    /// New profile
    pub new_profile: String,

    /// Why the swap happened
    pub reason: SwapReason,

    /// When the swap completed
    pub timestamp: DateTime<Utc>,

    /// Session ID of the replacement session
    pub new_session_id: String,

    /// Work that was re-hooked, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooked_work: Option<String>,
}

/// Replaces polecat sessions through an injected [`SessionController`]
pub struct Swapper {
    controller: Arc<dyn SessionController>,
    logger: Arc<dyn Logger>,
}

impl Swapper {
    /// Create a swapper driving the given controller
    pub fn new(controller: Arc<dyn SessionController>, logger: Arc<dyn Logger>) -> Self {
        Self { controller, logger }
    }

    /// Terminate the old session and spawn a replacement with the new profile.
    ///
    /// The protocol: check cancellation, stop the old session if it is running,
    /// check cancellation again, start the replacement, re-hook work, nudge.
    /// Controller failures up to and including `start` fail the swap; hook and
    /// nudge failures are logged as warnings because the replacement session
    /// already exists and a heartbeat will re-engage it.
    ///
    /// Cancellation is honored only at the two explicit checkpoints; the
    /// controller owns any cancellation inside its own calls.
    pub fn swap(&self, cancel: &CancellationToken, req: &SwapRequest) -> SwapResult {
        if cancel.is_cancelled() {
            return SwapResult::failed(GasTownError::Canceled);
        }

        let running = match self.controller.is_running(&req.rig, &req.polecat) {
            Ok(running) => running,
            Err(err) => {
                return SwapResult::failed(GasTownError::Session(format!(
                    "checking session status: {}",
                    err
                )));
            }
        };

        if running {
            if let Err(err) = self.controller.stop(&req.rig, &req.polecat, false) {
                return SwapResult::failed(GasTownError::Session(format!(
                    "stopping old session: {}",
                    err
                )));
            }
        }

        // The old session may be gone by now; a cancellation here leaves it
        // stopped and the caller must retry.
        if cancel.is_cancelled() {
            return SwapResult::failed(GasTownError::Canceled);
        }

        let session_id = match self.controller.start(&req.rig, &req.polecat, &req.new_profile) {
            Ok(id) => id,
            Err(err) => {
                return SwapResult::failed(GasTownError::Session(format!(
                    "starting new session: {}",
                    err
                )));
            }
        };

        if let Some(work) = req.hooked_work.as_deref().filter(|w| !w.is_empty()) {
            if let Err(err) = self.controller.hook_work(&req.rig, &req.polecat, work) {
                self.logger.warn(
                    "failed to re-hook work",
                    &[
                        ("rig", req.rig.clone()),
                        ("polecat", req.polecat.clone()),
                        ("work", work.to_string()),
                        ("error", err.to_string()),
                    ],
                );
            }
        }

        let nudge = format!(
            "Resuming from {} swap. Profile changed from {} to {}. Check your hook for work.",
            req.reason, req.old_profile, req.new_profile
        );
        if let Err(err) = self.controller.nudge(&req.rig, &req.polecat, &nudge) {
            self.logger.warn(
                "failed to nudge new session",
                &[
                    ("rig", req.rig.clone()),
                    ("polecat", req.polecat.clone()),
                    ("error", err.to_string()),
                ],
            );
        }

        let timestamp = Utc::now();
        SwapResult {
            success: true,
            new_session_id: Some(session_id.clone()),
            error: None,
            timestamp,
            event: Some(SwapEvent {
                rig: req.rig.clone(),
                polecat: req.polecat.clone(),
                old_profile: req.old_profile.clone(),
                new_profile: req.new_profile.clone(),
                reason: req.reason,
                timestamp,
                new_session_id: session_id,
                hooked_work: req.hooked_work.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_reason_display() {
        assert_eq!(SwapReason::RateLimit.to_string(), "rate_limit");
        assert_eq!(SwapReason::Stuck.to_string(), "stuck");
        assert_eq!(SwapReason::Manual.to_string(), "manual");
    }

    #[test]
    fn test_swap_request_json_shape() {
        let req = SwapRequest {
            rig: "gastown".to_string(),
            polecat: "Toast".to_string(),
            old_profile: "acctA".to_string(),
            new_profile: "acctB".to_string(),
            hooked_work: None,
            reason: SwapReason::RateLimit,
        };

        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""reason":"rate_limit""#));
        // Absent hooked work stays out of the record entirely
        assert!(!json.contains("hooked_work"));
    }
}
