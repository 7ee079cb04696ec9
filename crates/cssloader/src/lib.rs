//! cssloader - Theme manager daemon with scheduled preset changes.

pub mod api;
pub mod build_info;
pub mod catalog;
pub mod client;
pub mod config;
pub mod handlers;
pub mod scheduler;
pub mod server;
pub mod store;
pub mod theme;
