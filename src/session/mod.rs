//! Polecat session lifecycle seam
//!
//! Defines the narrow interface the rate limit core uses to manipulate agent
//! sessions, plus the naming conventions for Gas Town tmux sessions. Production
//! wires a controller backed by a terminal multiplexer and the credential-profile
//! launcher; tests inject a recording double.

mod names;

pub use names::{
    crew_session_name, deacon_session_name, mayor_session_name, polecat_session_name,
    propulsion_nudge, propulsion_nudge_for_role, refinery_session_name, witness_session_name,
    SESSION_PREFIX,
};

use crate::Result;

/// Operations the swap protocol performs on agent sessions.
///
/// Implementations must be safe to call from multiple threads for *distinct*
/// `(rig, name)` pairs; serializing operations on a single agent is the
/// supervisor's responsibility.
pub trait SessionController: Send + Sync {
    /// Check whether the agent's session is currently running
    fn is_running(&self, rig: &str, name: &str) -> Result<bool>;

    /// Terminate the agent's session. `force` skips graceful shutdown.
    fn stop(&self, rig: &str, name: &str, force: bool) -> Result<()>;

    /// Launch a session for the agent under the given credential profile.
    ///
    /// Returns a short opaque session identifier (e.g. the tmux session name).
    fn start(&self, rig: &str, name: &str, profile: &str) -> Result<String>;

    /// Attach an in-flight work item (bead ID) to the agent's hook
    fn hook_work(&self, rig: &str, name: &str, work_id: &str) -> Result<()>;

    /// Deliver a short prompt to the session's input to trigger resumption
    fn nudge(&self, rig: &str, name: &str, message: &str) -> Result<()>;
}
