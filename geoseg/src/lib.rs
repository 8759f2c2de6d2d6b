//! Library surface for the `geoseg` binary: configuration loading and the
//! per-stage subcommand implementations. Kept as a library, not just a
//! `main.rs`, so the CLI's test module can drive subcommands without
//! spawning a process.

pub mod config;
pub mod tools;
