//! Minimal JSON value tree used to serialize geometries and features to GeoJSON text.
//!
//! Parsing goes through `serde_json` (see `crate::geojson::parse`); this module only
//! needs to hold and stringify a tree once it has been built from geometry types.

mod array;
mod object;
mod stringify;
mod value;

pub use array::JsonArray;
pub use object::JsonObject;
pub use stringify::*;
pub use value::JsonValue;
