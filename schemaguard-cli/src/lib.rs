//! SchemaGuard CLI - Command-line interface for the SchemaGuard engine.
//!
//! This crate provides the `schemaguard` binary: live-database validation,
//! schema comparison and export, dry-run-first repairs, and connection
//! management driven by a `schemaguard.toml` file.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod render;
