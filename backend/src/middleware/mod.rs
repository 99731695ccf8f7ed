//! Request middleware.
//!
//! [`Trace`] assigns every request a trace id, echoes it in the `trace-id`
//! response header and scopes it for error payloads.

pub mod trace;

pub use trace::Trace;
