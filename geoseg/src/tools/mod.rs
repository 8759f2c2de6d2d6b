//! One module per pipeline stage, each exposing a `clap::Args` subcommand
//! struct and an async `run` function, mirroring how every stage is a
//! directory-in/directory-out engine with no stage talking to another
//! except through the manifest and tile tree on disk.

pub mod aggregate;
pub mod compare;
pub mod fuse;
pub mod tile;
