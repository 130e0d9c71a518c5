//! Shared domain definitions for the Taskdeck engine.

pub mod arrange;
pub mod caller;
pub mod classify;
pub mod resource;
pub mod task;
