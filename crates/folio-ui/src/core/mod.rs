//! Core, DOM-free primitives for the library client.
pub mod auth;
pub mod clock;
pub mod config;
pub mod logging;
pub mod navigation;
pub mod storage;
pub mod store;
pub mod transport;
