//! Canonical on-disk tile path encoding and parsing.
//!
//! ```text
//! spherical_mercator_tiles/z_<Z>/x_<X>/y_<Y><ext>
//! image_pixel_tiles/<raster_name>/width_height_<W>_<H>/width_offset_<OX>/height_offset_<OY><ext>
//! ```
//!
//! Only the final segment carries a file extension; every other segment is a
//! bare directory name. Offsets on the `ImagePixel` side may be negative.

use super::TileKind;
use std::fmt;

/// A relative tile path did not match either canonical layout.
#[derive(Clone, Debug, PartialEq)]
pub enum PathError {
	/// The path's first segment is neither `spherical_mercator_tiles` nor `image_pixel_tiles`,
	/// or the segment count for the recognized root does not match.
	UnrecognizedLayout(String),
	/// A segment was missing its expected prefix (e.g. `z_`, `width_offset_`).
	MissingPrefix { segment: String, expected_prefix: &'static str },
	/// A segment's numeric part could not be parsed as an integer.
	InvalidInteger(String),
}

impl fmt::Display for PathError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PathError::UnrecognizedLayout(path) => write!(f, "'{path}' does not match a known tile path layout"),
			PathError::MissingPrefix { segment, expected_prefix } => {
				write!(f, "segment '{segment}' is missing expected prefix '{expected_prefix}'")
			}
			PathError::InvalidInteger(segment) => write!(f, "segment '{segment}' does not contain a valid integer"),
		}
	}
}

impl std::error::Error for PathError {}

const MERCATOR_ROOT: &str = "spherical_mercator_tiles";
const IMAGE_PIXEL_ROOT: &str = "image_pixel_tiles";

pub(super) fn relative_path(kind: &TileKind, ext: &str) -> String {
	match kind {
		TileKind::Mercator { x, y, z } => format!("{MERCATOR_ROOT}/z_{z}/x_{x}/y_{y}{ext}"),
		TileKind::ImagePixel {
			raster_name,
			src_x,
			src_y,
			src_w,
			src_h,
		} => format!(
			"{IMAGE_PIXEL_ROOT}/{raster_name}/width_height_{src_w}_{src_h}/width_offset_{src_x}/height_offset_{src_y}{ext}"
		),
	}
}

pub(super) fn parse(relative: &str) -> Result<TileKind, PathError> {
	let segments: Vec<&str> = relative.split('/').collect();
	match segments.as_slice() {
		[MERCATOR_ROOT, z_seg, x_seg, y_seg] => {
			let z = parse_dir_int(z_seg, "z_")?;
			let x = parse_dir_int(x_seg, "x_")?;
			let (y, _ext) = parse_leaf_int(y_seg, "y_")?;
			Ok(TileKind::Mercator {
				x: x as u32,
				y: y as u32,
				z: z as u32,
			})
		}
		[IMAGE_PIXEL_ROOT, raster_name, wh_seg, wo_seg, ho_seg] => {
			let (src_w, src_h) = parse_width_height(wh_seg)?;
			let (src_x, _) = parse_leaf_int(wo_seg, "width_offset_")?;
			let (src_y, _ext) = parse_leaf_int(ho_seg, "height_offset_")?;
			Ok(TileKind::ImagePixel {
				raster_name: (*raster_name).to_string(),
				src_x,
				src_y,
				src_w,
				src_h,
			})
		}
		_ => Err(PathError::UnrecognizedLayout(relative.to_string())),
	}
}

fn parse_dir_int(segment: &str, prefix: &'static str) -> Result<i64, PathError> {
	let (value, rest) = parse_leaf_int(segment, prefix)?;
	if !rest.is_empty() {
		return Err(PathError::InvalidInteger(segment.to_string()));
	}
	Ok(value)
}

/// Strips `prefix`, then reads a leading (optionally negative) integer, returning
/// the integer and whatever remains of the segment (the file extension, for leaf
/// segments; an empty string for directory segments).
fn parse_leaf_int<'a>(segment: &'a str, prefix: &'static str) -> Result<(i64, &'a str), PathError> {
	let rest = segment.strip_prefix(prefix).ok_or_else(|| PathError::MissingPrefix {
		segment: segment.to_string(),
		expected_prefix: prefix,
	})?;

	let bytes = rest.as_bytes();
	let mut end = usize::from(bytes.first() == Some(&b'-'));
	let digits_start = end;
	while end < bytes.len() && bytes[end].is_ascii_digit() {
		end += 1;
	}
	if end == digits_start {
		return Err(PathError::InvalidInteger(segment.to_string()));
	}
	let value: i64 = rest[..end]
		.parse()
		.map_err(|_| PathError::InvalidInteger(segment.to_string()))?;
	Ok((value, &rest[end..]))
}

fn parse_width_height(segment: &str) -> Result<(u64, u64), PathError> {
	let rest = segment.strip_prefix("width_height_").ok_or_else(|| PathError::MissingPrefix {
		segment: segment.to_string(),
		expected_prefix: "width_height_",
	})?;
	let (w_str, h_str) = rest
		.split_once('_')
		.ok_or_else(|| PathError::InvalidInteger(segment.to_string()))?;
	let w: u64 = w_str.parse().map_err(|_| PathError::InvalidInteger(segment.to_string()))?;
	let h: u64 = h_str.parse().map_err(|_| PathError::InvalidInteger(segment.to_string()))?;
	Ok((w, h))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mercator_roundtrip() {
		let kind = TileKind::Mercator { x: 12, y: 340, z: 9 };
		let path = relative_path(&kind, ".png");
		assert_eq!(path, "spherical_mercator_tiles/z_9/x_12/y_340.png");
		let parsed = parse(&path).unwrap();
		match parsed {
			TileKind::Mercator { x, y, z } => assert_eq!((x, y, z), (12, 340, 9)),
			TileKind::ImagePixel { .. } => panic!("wrong variant"),
		}
	}

	#[test]
	fn image_pixel_roundtrip_with_negative_offset() {
		let kind = TileKind::ImagePixel {
			raster_name: "scene_001".to_string(),
			src_x: -64,
			src_y: 128,
			src_w: 2048,
			src_h: 1024,
		};
		let path = relative_path(&kind, ".png");
		assert_eq!(
			path,
			"image_pixel_tiles/scene_001/width_height_2048_1024/width_offset_-64/height_offset_128.png"
		);
		let parsed = parse(&path).unwrap();
		match parsed {
			TileKind::ImagePixel {
				raster_name,
				src_x,
				src_y,
				src_w,
				src_h,
			} => {
				assert_eq!(raster_name, "scene_001");
				assert_eq!(src_x, -64);
				assert_eq!(src_y, 128);
				assert_eq!((src_w, src_h), (2048, 1024));
			}
			TileKind::Mercator { .. } => panic!("wrong variant"),
		}
	}

	#[test]
	fn no_extension_is_fine() {
		let kind = TileKind::Mercator { x: 1, y: 1, z: 1 };
		let path = relative_path(&kind, "");
		assert_eq!(path, "spherical_mercator_tiles/z_1/x_1/y_1");
		assert!(parse(&path).is_ok());
	}

	#[test]
	fn unrecognized_root_is_rejected() {
		assert!(matches!(parse("nonsense/a/b/c"), Err(PathError::UnrecognizedLayout(_))));
	}

	#[test]
	fn missing_prefix_is_rejected() {
		assert!(matches!(
			parse("spherical_mercator_tiles/9/x_12/y_340.png"),
			Err(PathError::MissingPrefix { .. })
		));
	}
}
