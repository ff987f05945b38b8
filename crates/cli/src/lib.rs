//! Fidei CLI - command orchestration over the governance services
//!
//! This crate provides the `fidei` binary, its configuration and the
//! command handlers it dispatches to.

pub mod commands;
pub mod config;
pub mod context;

pub use config::AppConfig;
pub use context::AppContext;
