//! Typed records stored by the plugins.

pub mod broadcast;
pub mod problem_state;
pub mod remote_queue;
