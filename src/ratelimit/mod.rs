//! Rate limit detection, profile selection, and session swapping
//!
//! Handles API rate limits hitting Gas Town agents: when a supervised polecat
//! exits because its upstream provider throttled it, this module selects the
//! next credential profile from the role's fallback chain (respecting per-profile
//! cooldowns) and gracefully replaces the session, re-attaching hooked work and
//! nudging the replacement to resume.
//!
//! Control flow per exit is linear: [`Handler`] runs the [`Detector`], drives the
//! [`Selector`] (which owns the [`CooldownStore`]), and hands a [`SwapRequest`]
//! to the [`Swapper`], which talks to the injected
//! [`SessionController`](crate::session::SessionController). There is no
//! background loop; everything is driven by incoming exit notifications.

mod cooldown;
mod detector;
mod events;
mod handler;
mod selector;
mod swapper;

pub use cooldown::CooldownStore;
pub use detector::{Detector, RateLimitEvent, RATE_LIMIT_EXIT_CODE};
pub use events::{ConsoleSwapEventSink, JsonlSwapEventSink, SwapEventSink};
pub use handler::{HandleExitResult, Handler, HandlerConfig, PolecatExitInfo, POLECAT_ROLE};
pub use selector::{RolePolicy, Selector};
pub use swapper::{SwapEvent, SwapReason, SwapRequest, SwapResult, Swapper};
