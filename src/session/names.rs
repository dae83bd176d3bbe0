//! Session naming conventions
//!
//! Every Gas Town session lives in the same terminal multiplexer server, so names
//! carry the rig and role. All of them share the `gt-` prefix.

/// Common prefix for all Gas Town tmux session names
pub const SESSION_PREFIX: &str = "gt-";

/// Session name for the Mayor agent
pub fn mayor_session_name() -> String {
    format!("{}mayor", SESSION_PREFIX)
}

/// Session name for the Deacon agent
pub fn deacon_session_name() -> String {
    format!("{}deacon", SESSION_PREFIX)
}

/// Session name for a rig's Witness agent
pub fn witness_session_name(rig: &str) -> String {
    format!("{}{}-witness", SESSION_PREFIX, rig)
}

/// Session name for a rig's Refinery agent
pub fn refinery_session_name(rig: &str) -> String {
    format!("{}{}-refinery", SESSION_PREFIX, rig)
}

/// Session name for a crew worker in a rig
pub fn crew_session_name(rig: &str, name: &str) -> String {
    format!("{}{}-crew-{}", SESSION_PREFIX, rig, name)
}

/// Session name for a polecat in a rig
pub fn polecat_session_name(rig: &str, name: &str) -> String {
    format!("{}{}-{}", SESSION_PREFIX, rig, name)
}

/// The universal propulsion nudge, sent after the beacon to trigger autonomous
/// work execution: if work is on your hook, you run it.
pub fn propulsion_nudge() -> &'static str {
    "Run `gt hook` to check your hook and begin work."
}

/// Role-specific propulsion nudge.
///
/// Polecats and crew check their hook for slung work; the patrol roles
/// (witness, refinery, deacon) start their patrol cycle; the mayor checks mail.
pub fn propulsion_nudge_for_role(role: &str) -> &'static str {
    match role {
        "polecat" | "crew" => propulsion_nudge(),
        "witness" => "Run `gt prime` to check patrol status and begin work.",
        "refinery" => "Run `gt prime` to check MQ status and begin patrol.",
        "deacon" => "Run `gt prime` to check patrol status and begin heartbeat cycle.",
        "mayor" => "Run `gt prime` to check mail and begin coordination.",
        _ => propulsion_nudge(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singleton_session_names() {
        assert_eq!(mayor_session_name(), "gt-mayor");
        assert_eq!(deacon_session_name(), "gt-deacon");
    }

    #[test]
    fn test_rig_session_names() {
        assert_eq!(witness_session_name("gastown"), "gt-gastown-witness");
        assert_eq!(refinery_session_name("gastown"), "gt-gastown-refinery");
        assert_eq!(crew_session_name("gastown", "max"), "gt-gastown-crew-max");
        assert_eq!(polecat_session_name("gastown", "Toast"), "gt-gastown-Toast");
    }

    #[test]
    fn test_propulsion_nudges() {
        assert_eq!(propulsion_nudge_for_role("polecat"), propulsion_nudge());
        assert_eq!(propulsion_nudge_for_role("crew"), propulsion_nudge());
        assert!(propulsion_nudge_for_role("witness").contains("gt prime"));
        assert!(propulsion_nudge_for_role("mayor").contains("mail"));
        // Unknown roles fall back to the universal nudge
        assert_eq!(propulsion_nudge_for_role("warboy"), propulsion_nudge());
    }
}
