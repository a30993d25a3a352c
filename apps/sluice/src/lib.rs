//! # sluice
//!
//! Application layer over `sluice-core`: configuration files, the shared
//! [`Engine`](engine::Engine), the HTTP API and the CLI.

pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
