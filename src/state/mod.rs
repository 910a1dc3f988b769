//! State module for tracking run progress
//!
//! # Components
//!
//! - `RunStatus`: Lifecycle status of a project run (pending, running, paused, ...)
//! - `RunState`: Shared pause flag and progress counters observed by all workers
//! - `RunHandle`: Cloneable handle that lets callers pause a run in progress

mod run_state;
mod run_status;

pub use run_state::{progress_percent, RunHandle, RunState};
pub use run_status::RunStatus;
