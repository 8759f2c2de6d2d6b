#![deny(clippy::all)]

mod container;
mod convert;
mod macros;
mod progress;
mod runtime;
mod server;
mod types;

pub use container::ContainerReader;
pub use convert::convert;
pub use progress::{Progress, ProgressData};
pub use server::TileServer;
pub use types::{ConvertOptions, ProbeResult, ReaderParameters, ServerOptions, TileCoord};
