//! Policy for suites that need the embedded PostgreSQL cluster.
//!
//! The cluster downloads PostgreSQL binaries on first use, which fails in
//! offline sandboxes. Suites skip with a marker unless
//! `PANEL_REQUIRE_TEST_CLUSTER` is truthy, in which case setup failures panic
//! so CI breakage is not masked.

/// Returns true when `PANEL_REQUIRE_TEST_CLUSTER` is "1", "true" or "yes".
pub fn test_cluster_required() -> bool {
    std::env::var("PANEL_REQUIRE_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip (returning `None`) or panic, depending on the policy above.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if test_cluster_required() {
        panic!("Test cluster setup failed: {reason}");
    }
    eprintln!("SKIP-TEST-CLUSTER: {reason}. Set PANEL_REQUIRE_TEST_CLUSTER=1 to fail instead.");
    None
}
