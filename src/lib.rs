//! Gas Town - Multi-Agent Workspace Orchestrator
//!
//! Gas Town launches, supervises, and swaps long-running interactive coding-agent
//! sessions (polecats, crew) across a hierarchy of project rigs. This crate contains
//! the rate-limit-driven profile swap core: detecting when a supervised agent has been
//! throttled by its upstream provider, selecting an alternate credential profile from
//! a per-role fallback chain, and gracefully replacing the session while preserving
//! in-flight work.
//!
//! # Architecture
//!
//! - **ratelimit**: Detection, cooldown tracking, profile selection, session swapping
//! - **session**: The `SessionController` seam the core drives, plus session naming
//! - **logging**: tracing setup and the leveled `Logger` reporting seam
//! - **error**: Crate-wide error enum and `Result` alias
//!
//! The core never spawns processes itself; it drives an injected
//! [`session::SessionController`] and reports outcomes through
//! [`logging::Logger`] and [`ratelimit::SwapEventSink`].

pub mod error;
pub mod logging;
pub mod ratelimit;
pub mod session;

// Re-exports
pub use error::{GasTownError, Result};
