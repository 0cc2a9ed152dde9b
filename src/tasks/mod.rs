//! Background Tasks Module
//!
//! Periodic maintenance for the in-memory store.

mod purge;

pub use purge::spawn_purge_task;
