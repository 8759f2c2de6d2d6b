//! Spatial index over a raster's auxiliary tiles, queried once per base tile
//! to find the auxiliaries overlapping it. Grounded on the `rstar` idiom
//! already used for edge indexing in the teacher's raster-mask pipeline
//! operation: an `RTreeObject` wrapper with an axis-aligned envelope, bulk
//! loaded once and queried with `locate_in_envelope_intersecting`.

use geoseg_core::tile::TileKind;
use geoseg_core::Tile;
use rstar::{RTree, RTreeObject, AABB};

/// An auxiliary tile's source-pixel rectangle, indexed by position in the
/// auxiliary tile list it was built from.
#[derive(Clone, Debug)]
struct IndexedTile {
	index: usize,
	x_min: i64,
	y_min: i64,
	x_max: i64,
	y_max: i64,
}

impl RTreeObject for IndexedTile {
	type Envelope = AABB<[i64; 2]>;

	fn envelope(&self) -> Self::Envelope {
		AABB::from_corners([self.x_min, self.y_min], [self.x_max, self.y_max])
	}
}

/// An R-tree over a raster's auxiliary tiles' source rectangles.
pub struct AuxiliaryIndex {
	tree: RTree<IndexedTile>,
}

impl AuxiliaryIndex {
	/// Builds the index from `aux_tiles`. Tiles that are not `ImagePixel`
	/// (shouldn't occur — fusion only classifies local-scheme tiles) are
	/// silently skipped rather than failing index construction.
	#[must_use]
	pub fn build(aux_tiles: &[Tile]) -> AuxiliaryIndex {
		let indexed: Vec<IndexedTile> = aux_tiles
			.iter()
			.enumerate()
			.filter_map(|(index, tile)| match &tile.kind {
				TileKind::ImagePixel { src_x, src_y, src_w, src_h, .. } => Some(IndexedTile {
					index,
					x_min: *src_x,
					y_min: *src_y,
					x_max: *src_x + *src_w as i64,
					y_max: *src_y + *src_h as i64,
				}),
				TileKind::Mercator { .. } => None,
			})
			.collect();
		AuxiliaryIndex {
			tree: RTree::bulk_load(indexed),
		}
	}

	/// Returns the indices (into the `aux_tiles` slice passed to [`build`](Self::build))
	/// of auxiliary tiles whose source rectangle intersects `base`'s.
	#[must_use]
	pub fn overlapping(&self, base: &Tile) -> Vec<usize> {
		let TileKind::ImagePixel { src_x, src_y, src_w, src_h, .. } = &base.kind else {
			return Vec::new();
		};
		let envelope = AABB::from_corners([*src_x, *src_y], [*src_x + *src_w as i64, *src_y + *src_h as i64]);
		self.tree.locate_in_envelope_intersecting(&envelope).map(|t| t.index).collect()
	}
}
