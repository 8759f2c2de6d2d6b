//! Affine transforms, geographic bounding boxes and the spherical-mercator
//! tiling math shared across the engine.

mod affine;
mod geo_bbox;
pub mod mercator;

pub use affine::Affine;
pub use geo_bbox::GeoBBox;
