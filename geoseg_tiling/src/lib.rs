//! The tiling layout engine, tile data I/O, and manifest writing.
//!
//! [`layout`] turns a `geoseg_core` [`TilingScheme`](geoseg_core::TilingScheme)
//! plus a raster's size/GSD into an ordered list of [`Tile`](geoseg_core::Tile)
//! identities. [`io`] reads the pixels each tile identity names off a
//! [`RasterSource`](geoseg_raster::RasterSource) and writes them to disk as
//! image or label tiles. [`summary`] assembles the per-raster results into
//! the `geoseg_core::manifest` shape and writes it out.

mod error;
pub mod io;
pub mod layout;
pub mod summary;

pub use error::TilingError;
