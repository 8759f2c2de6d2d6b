//! Tiling schemes: the set of parameters that decide how a raster is cut into
//! tiles (§4.1's layout engine consumes exactly one of these per raster).

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Where the tiling origin is placed relative to the raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileAlignment {
	/// Origin at the raster's center; tiles grow symmetrically outward.
	CenteredToImage,
	/// Origin at pixel `(0, 0)`.
	AlignedToImageBorder,
	/// Origin chosen so the tiled span is centered and minimizes the edge overhang.
	Optimized,
}

impl std::fmt::Display for TileAlignment {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			TileAlignment::CenteredToImage => "centered_to_image",
			TileAlignment::AlignedToImageBorder => "aligned_to_image_border",
			TileAlignment::Optimized => "optimized",
		})
	}
}

/// Flags shared by `LocalPixel` and `LocalMeter`, factored out so `LocalMeter`'s
/// resolution to `LocalPixel` is a single struct copy plus a unit conversion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalSchemeFlags {
	pub alignment: TileAlignment,
	pub use_overhang: bool,
	pub use_border: bool,
	pub aligned_to_base: bool,
}

/// How a raster is partitioned into tiles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum TilingScheme {
	Mercator { zoom: u32, use_border_tiles: bool },
	LocalPixel {
		tile_size_px: (u32, u32),
		tile_stride_px: (u32, u32),
		#[serde(flatten)]
		flags: LocalSchemeFlags,
	},
	LocalMeter {
		tile_size_m: (f64, f64),
		tile_stride_m: (f64, f64),
		#[serde(flatten)]
		flags: LocalSchemeFlags,
	},
}

impl TilingScheme {
	#[must_use]
	pub fn name(&self) -> &'static str {
		match self {
			TilingScheme::Mercator { .. } => "mercator",
			TilingScheme::LocalPixel { .. } => "local_pixel",
			TilingScheme::LocalMeter { .. } => "local_meter",
		}
	}

	/// Resolves a `LocalMeter` scheme to an equivalent `LocalPixel` scheme using
	/// the raster's ground sampling distance `(gsd_x, gsd_y)` in meters/pixel.
	/// `LocalPixel` resolves to itself; `Mercator` cannot be resolved this way.
	///
	/// Per-axis rounding is independent, so a square meter size can resolve to a
	/// non-square pixel size when `gsd_x != gsd_y`; this is intentional, not a bug
	/// — downstream stages already tolerate non-square tiles.
	///
	/// # Errors
	///
	/// Returns an error for `Mercator`, which has no pixel-size notion to resolve to.
	pub fn resolve_to_local_pixel(&self, gsd: (f64, f64)) -> Result<TilingScheme> {
		match self {
			TilingScheme::LocalPixel { .. } => Ok(self.clone()),
			TilingScheme::LocalMeter {
				tile_size_m,
				tile_stride_m,
				flags,
			} => Ok(TilingScheme::LocalPixel {
				tile_size_px: (
					(tile_size_m.0 / gsd.0).round() as u32,
					(tile_size_m.1 / gsd.1).round() as u32,
				),
				tile_stride_px: (
					(tile_stride_m.0 / gsd.0).round() as u32,
					(tile_stride_m.1 / gsd.1).round() as u32,
				),
				flags: *flags,
			}),
			TilingScheme::Mercator { .. } => bail!("a Mercator scheme has no pixel size to resolve"),
		}
	}

	/// Whether tiles are placed by [`TileAlignment::Optimized`]. Mercator
	/// tiling has no analogous notion and is never optimized.
	#[must_use]
	pub fn is_optimized(&self) -> bool {
		match self {
			TilingScheme::LocalPixel { flags, .. } | TilingScheme::LocalMeter { flags, .. } => flags.alignment == TileAlignment::Optimized,
			TilingScheme::Mercator { .. } => false,
		}
	}

	/// Whether this scheme lets tiles hang over the raster edge
	/// (`use_overhang` for local schemes, `use_border_tiles` for Mercator).
	#[must_use]
	pub fn uses_overhanging_tiles(&self) -> bool {
		match self {
			TilingScheme::LocalPixel { flags, .. } | TilingScheme::LocalMeter { flags, .. } => flags.use_overhang,
			TilingScheme::Mercator { use_border_tiles, .. } => *use_border_tiles,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn local_meter_resolves_per_axis_independently() {
		let scheme = TilingScheme::LocalMeter {
			tile_size_m: (100.0, 100.0),
			tile_stride_m: (50.0, 50.0),
			flags: LocalSchemeFlags {
				alignment: TileAlignment::CenteredToImage,
				use_overhang: true,
				use_border: false,
				aligned_to_base: true,
			},
		};
		let resolved = scheme.resolve_to_local_pixel((0.5, 0.3)).unwrap();
		match resolved {
			TilingScheme::LocalPixel {
				tile_size_px,
				tile_stride_px,
				..
			} => {
				assert_eq!(tile_size_px, (200, 333));
				assert_eq!(tile_stride_px, (100, 167));
			}
			_ => panic!("expected LocalPixel"),
		}
	}

	#[test]
	fn mercator_cannot_resolve() {
		let scheme = TilingScheme::Mercator {
			zoom: 14,
			use_border_tiles: true,
		};
		assert!(scheme.resolve_to_local_pixel((1.0, 1.0)).is_err());
	}

	#[test]
	fn local_pixel_resolves_to_itself() {
		let scheme = TilingScheme::LocalPixel {
			tile_size_px: (512, 512),
			tile_stride_px: (512, 512),
			flags: LocalSchemeFlags {
				alignment: TileAlignment::AlignedToImageBorder,
				use_overhang: false,
				use_border: true,
				aligned_to_base: false,
			},
		};
		assert_eq!(scheme.resolve_to_local_pixel((1.0, 1.0)).unwrap(), scheme);
	}

	#[test]
	fn is_optimized_checks_alignment_only() {
		let scheme = TilingScheme::LocalPixel {
			tile_size_px: (512, 512),
			tile_stride_px: (512, 512),
			flags: LocalSchemeFlags {
				alignment: TileAlignment::Optimized,
				use_overhang: true,
				use_border: true,
				aligned_to_base: false,
			},
		};
		assert!(scheme.is_optimized());
		assert!(!TilingScheme::Mercator { zoom: 10, use_border_tiles: true }.is_optimized());
	}

	#[test]
	fn uses_overhanging_tiles_reads_the_right_flag() {
		let mercator = TilingScheme::Mercator { zoom: 10, use_border_tiles: true };
		assert!(mercator.uses_overhanging_tiles());
	}

	#[test]
	fn json_roundtrip() {
		let scheme = TilingScheme::Mercator {
			zoom: 18,
			use_border_tiles: false,
		};
		let json = serde_json::to_string(&scheme).unwrap();
		assert_eq!(serde_json::from_str::<TilingScheme>(&json).unwrap(), scheme);
	}
}
