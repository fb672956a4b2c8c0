//! Document library: reconciliation state, mutation flows, and pure helpers.

pub mod actions;
pub mod logic;
pub mod schedule;
pub mod state;
