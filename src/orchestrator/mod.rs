//! Application-level orchestration utilities.
//!
//! This module owns the request lifecycle for the interactive UI (catalog fetch,
//! concurrent submissions, completion delivery) and the post-response processing that
//! turns a server result into a status line.

mod controller;
mod post_process;

#[cfg(feature = "tui")]
pub(crate) use controller::{run_controller, UiCommand, UiEvent};
pub(crate) use post_process::compose_status;
