//! Rate limit exit handling
//!
//! The entry point the Witness calls when a supervised polecat session exits.
//! Orchestrates detection, fallback profile selection, and the session swap, and
//! reports a structured outcome so the supervisor can escalate or retry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::SecondsFormat;
use tokio_util::sync::CancellationToken;

use super::detector::{Detector, RateLimitEvent};
use super::events::{ConsoleSwapEventSink, SwapEventSink};
use super::selector::{RolePolicy, Selector};
use super::swapper::{SwapReason, SwapRequest, SwapResult, Swapper};
use crate::logging::{Logger, TracingLogger};
use crate::session::SessionController;
use crate::GasTownError;

/// Role key under which polecat fallback policies are registered
pub const POLECAT_ROLE: &str = "polecat";

/// Information about a polecat session exit, delivered by the supervisor
#[derive(Debug, Clone)]
pub struct PolecatExitInfo {
    /// Rig containing the polecat
    pub rig: String,

    /// Polecat that exited
    pub polecat: String,

    /// Process exit code
    pub exit_code: i32,

    /// Captured stderr from the session
    pub stderr: String,

    /// Profile that was in use
    pub current_profile: String,

    /// API provider (e.g. "anthropic")
    pub provider: String,

    /// Bead ID of hooked work, if any
    pub hooked_work: Option<String>,
}

/// Outcome of handling a session exit
#[derive(Debug, Default)]
pub struct HandleExitResult {
    /// Whether the exit was classified as a rate limit
    pub was_rate_limit: bool,

    /// The rate limit event, when one was detected
    pub event: Option<RateLimitEvent>,

    /// Whether a profile swap was attempted
    pub swap_attempted: bool,

    /// The swap outcome, when one was attempted
    pub swap_result: Option<SwapResult>,

    /// Every profile in the fallback chain is cooling down; the supervisor
    /// should escalate to an operator
    pub all_profiles_cooling: bool,

    /// Error encountered while handling the exit
    pub error: Option<GasTownError>,
}

/// Configuration for the rate limit handler
#[derive(Default)]
pub struct HandlerConfig {
    /// Cooldown applied to registered policies that do not set one
    pub default_cooldown_minutes: u32,

    /// Fallback policies per role
    pub role_policies: HashMap<String, RolePolicy>,

    /// Structured logger; defaults to [`TracingLogger`]
    pub logger: Option<Arc<dyn Logger>>,

    /// Audit sink; defaults to [`ConsoleSwapEventSink`]
    pub event_sink: Option<Arc<dyn SwapEventSink>>,
}

/// Orchestrates rate limit detection, profile selection, and session swapping.
///
/// One handler serves a whole rig; calls for distinct polecats may run
/// concurrently. Serializing exits of a single polecat is the supervisor's job.
pub struct Handler {
    selector: Selector,
    swapper: Swapper,
    logger: Arc<dyn Logger>,
    event_sink: Arc<dyn SwapEventSink>,
}

impl Handler {
    /// Create a handler driving the given session controller
    pub fn new(controller: Arc<dyn SessionController>, config: HandlerConfig) -> Self {
        let selector = Selector::new();
        for (role, mut policy) in config.role_policies {
            if policy.cooldown_minutes == 0 {
                policy.cooldown_minutes = config.default_cooldown_minutes;
            }
            selector.set_policy(role, policy);
        }

        let logger = config
            .logger
            .unwrap_or_else(|| Arc::new(TracingLogger) as Arc<dyn Logger>);
        let event_sink = config
            .event_sink
            .unwrap_or_else(|| Arc::new(ConsoleSwapEventSink) as Arc<dyn SwapEventSink>);
        let swapper = Swapper::new(controller, Arc::clone(&logger));

        Self {
            selector,
            swapper,
            logger,
            event_sink,
        }
    }

    /// Register or replace a role's fallback policy
    pub fn set_policy(&self, role: impl Into<String>, policy: RolePolicy) {
        self.selector.set_policy(role, policy);
    }

    /// The profile selector, for inspection and external configuration
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Process a polecat session exit.
    ///
    /// Classifies the exit, and on a rate limit selects a fallback profile and
    /// swaps the session. Never panics and never returns early without a
    /// populated result; the supervisor decides what to do with failures.
    pub fn handle_polecat_exit(
        &self,
        cancel: &CancellationToken,
        exit_info: &PolecatExitInfo,
    ) -> HandleExitResult {
        let mut result = HandleExitResult::default();

        let mut detector = Detector::new();
        detector.set_agent_info(
            format!("{}/{}", exit_info.rig, exit_info.polecat),
            &exit_info.current_profile,
            &exit_info.provider,
        );

        let Some(event) = detector.detect(exit_info.exit_code, &exit_info.stderr) else {
            return result;
        };

        result.was_rate_limit = true;
        self.log_rate_limit_event(&event);

        let new_profile = match self.selector.select_next(
            POLECAT_ROLE,
            &exit_info.current_profile,
            Some(&event),
        ) {
            Ok(profile) => profile,
            Err(GasTownError::AllProfilesCooling) => {
                result.all_profiles_cooling = true;
                self.alert_no_profiles_available(exit_info, &event);
                result.event = Some(event);
                return result;
            }
            Err(err) => {
                result.error = Some(GasTownError::Selection(err.to_string()));
                result.event = Some(event);
                return result;
            }
        };
        result.event = Some(event);

        result.swap_attempted = true;
        let request = SwapRequest {
            rig: exit_info.rig.clone(),
            polecat: exit_info.polecat.clone(),
            old_profile: exit_info.current_profile.clone(),
            new_profile,
            hooked_work: exit_info.hooked_work.clone(),
            reason: SwapReason::RateLimit,
        };

        let swap_result = self.swapper.swap(cancel, &request);
        if let Some(err) = &swap_result.error {
            result.error = Some(GasTownError::Session(format!("swapping session: {}", err)));
        }
        self.event_sink.emit(&request, &swap_result);
        result.swap_result = Some(swap_result);

        result
    }

    fn log_rate_limit_event(&self, event: &RateLimitEvent) {
        self.logger.info(
            "rate limit detected",
            &[
                ("agent", event.agent_id.clone()),
                ("profile", event.profile.clone()),
                ("provider", event.provider.clone()),
                ("exit_code", event.exit_code.to_string()),
                (
                    "timestamp",
                    event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                ),
                ("error", event.error_snippet.clone()),
            ],
        );
    }

    fn alert_no_profiles_available(&self, exit_info: &PolecatExitInfo, event: &RateLimitEvent) {
        self.logger.error(
            "all profiles cooling - agent cannot continue",
            &[
                ("rig", exit_info.rig.clone()),
                ("polecat", exit_info.polecat.clone()),
                ("last_profile", event.profile.clone()),
                (
                    "rate_limit_time",
                    event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                ),
                (
                    "hooked_work",
                    exit_info.hooked_work.clone().unwrap_or_default(),
                ),
            ],
        );
    }
}
