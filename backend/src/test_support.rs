//! Test utilities for the panel crate.
//!
//! Shared by unit tests and the integration tests under `tests/`. Compiled
//! for `cfg(test)` and the `test-support` feature only.

mod panel_store;

pub use panel_store::InMemoryPanel;
