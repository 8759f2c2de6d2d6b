//! Tile identity: the `Tile` type and its canonical on-disk path encoding.
//!
//! A tile's identity is immutable and is exactly what its relative path
//! encodes; disk size and placement (transform/CRS) are mutable bookkeeping
//! attached after the identity is fixed, and are intentionally excluded from
//! equality so that `parse_path(relative_path(tile)) == tile` holds
//! regardless of when placement happens.

mod path;

pub use path::PathError;

use crate::geo::Affine;

/// The tile's type-specific identity.
#[derive(Clone, Debug)]
pub enum TileKind {
	/// A web-map XYZ tile; bounds are a pure function of `(x, y, z)`.
	Mercator { x: u32, y: u32, z: u32 },
	/// A rectangle in a source raster's pixel coordinate system. Offsets may be
	/// negative when the tile hangs over the raster's top/left edge.
	ImagePixel {
		raster_name: String,
		src_x: i64,
		src_y: i64,
		src_w: u64,
		src_h: u64,
	},
}

/// Geo-referencing attached to a tile once it has been placed on a raster.
#[derive(Clone, Debug, PartialEq)]
pub struct TilePlacement {
	pub transform: Affine,
	pub crs: String,
}

/// A tile: an immutable identity (`kind`) plus disk size and optional placement.
///
/// `disk_w`/`disk_h` default to the tile's source size; they differ once a tile
/// has been resampled on write. Equality and hashing consider only `kind`.
#[derive(Clone, Debug)]
pub struct Tile {
	pub kind: TileKind,
	pub disk_w: u32,
	pub disk_h: u32,
	pub placement: Option<TilePlacement>,
}

impl PartialEq for Tile {
	fn eq(&self, other: &Self) -> bool {
		match (&self.kind, &other.kind) {
			(TileKind::Mercator { x: x1, y: y1, z: z1 }, TileKind::Mercator { x: x2, y: y2, z: z2 }) => {
				x1 == x2 && y1 == y2 && z1 == z2
			}
			(
				TileKind::ImagePixel {
					raster_name: n1,
					src_x: x1,
					src_y: y1,
					src_w: w1,
					src_h: h1,
				},
				TileKind::ImagePixel {
					raster_name: n2,
					src_x: x2,
					src_y: y2,
					src_w: w2,
					src_h: h2,
				},
			) => n1 == n2 && x1 == x2 && y1 == y2 && w1 == w2 && h1 == h2,
			_ => false,
		}
	}
}

impl Eq for Tile {}

impl Tile {
	#[must_use]
	pub fn mercator(x: u32, y: u32, z: u32, disk_w: u32, disk_h: u32) -> Tile {
		Tile {
			kind: TileKind::Mercator { x, y, z },
			disk_w,
			disk_h,
			placement: None,
		}
	}

	#[must_use]
	pub fn image_pixel(raster_name: impl Into<String>, src_x: i64, src_y: i64, src_w: u64, src_h: u64) -> Tile {
		let disk_w = src_w.min(u64::from(u32::MAX)) as u32;
		let disk_h = src_h.min(u64::from(u32::MAX)) as u32;
		Tile {
			kind: TileKind::ImagePixel {
				raster_name: raster_name.into(),
				src_x,
				src_y,
				src_w,
				src_h,
			},
			disk_w,
			disk_h,
			placement: None,
		}
	}

	#[must_use]
	pub fn with_disk_size(mut self, disk_w: u32, disk_h: u32) -> Tile {
		self.disk_w = disk_w;
		self.disk_h = disk_h;
		self
	}

	#[must_use]
	pub fn with_placement(mut self, transform: Affine, crs: impl Into<String>) -> Tile {
		self.placement = Some(TilePlacement {
			transform,
			crs: crs.into(),
		});
		self
	}

	/// The tile's source-pixel rectangle size, i.e. the extent it covers before
	/// resampling. For Mercator tiles this is undefined at the identity level
	/// (it depends on the underlying raster's resolution), so `None` is returned.
	#[must_use]
	pub fn source_size(&self) -> Option<(u64, u64)> {
		match &self.kind {
			TileKind::Mercator { .. } => None,
			TileKind::ImagePixel { src_w, src_h, .. } => Some((*src_w, *src_h)),
		}
	}

	#[must_use]
	pub fn disk_size(&self) -> (u32, u32) {
		(self.disk_w, self.disk_h)
	}

	/// Relative path for this tile under a tile-tree root, including the given
	/// file extension (which must start with `.` if non-empty).
	#[must_use]
	pub fn relative_path(&self, ext: &str) -> String {
		path::relative_path(&self.kind, ext)
	}

	/// Parses a tile identity out of a relative path produced by [`relative_path`](Self::relative_path).
	/// The returned tile has no disk size information and no placement.
	///
	/// # Errors
	///
	/// Returns [`PathError`] if `relative` does not match either canonical layout.
	pub fn parse_path(relative: &str) -> Result<Tile, PathError> {
		let kind = path::parse(relative)?;
		Ok(Tile {
			kind,
			disk_w: 0,
			disk_h: 0,
			placement: None,
		})
	}
}
