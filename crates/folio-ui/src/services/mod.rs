//! Browser-bound implementations of the core capabilities.

pub mod api;
pub mod storage;
