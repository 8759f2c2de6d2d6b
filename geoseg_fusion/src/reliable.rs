//! The reliable-center computation: the radius, in disk pixels, of the
//! region around a tile's center that inference is considered trustworthy
//! over, derived from the *auxiliary* tile stride (never the base stride —
//! base tiles don't overlap, so they carry no stride information of their
//! own).

/// Scales a source-pixel stride to disk pixels using a tile's disk/source
/// size ratio, independently per axis.
#[must_use]
pub fn disk_stride(disk_size: (u32, u32), source_size: (u64, u64), source_stride: (f64, f64)) -> (f64, f64) {
	let ratio_x = f64::from(disk_size.0) / source_size.0 as f64;
	let ratio_y = f64::from(disk_size.1) / source_size.1 as f64;
	(source_stride.0 * ratio_x, source_stride.1 * ratio_y)
}

/// The reliable-center radius in disk pixels: `ceil(disk_stride / 2)` per
/// axis. Ceiling, not rounding, so the union of reliable rectangles tiled at
/// this stride covers the plane with no gaps — a rounded-down radius could
/// leave a one-pixel seam between adjacent reliable regions.
#[must_use]
pub fn reliable_offsets(disk_size: (u32, u32), source_size: (u64, u64), source_stride: (f64, f64)) -> (i64, i64) {
	let (stride_x, stride_y) = disk_stride(disk_size, source_size, source_stride);
	((stride_x / 2.0).ceil() as i64, (stride_y / 2.0).ceil() as i64)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn disk_stride_scales_by_ratio() {
		let (sx, sy) = disk_stride((256, 256), (512, 512), (128.0, 128.0));
		assert!((sx - 64.0).abs() < 1e-9);
		assert!((sy - 64.0).abs() < 1e-9);
	}

	#[test]
	fn reliable_offsets_round_up() {
		let (ox, oy) = reliable_offsets((256, 256), (512, 512), (129.0, 129.0));
		assert_eq!(ox, 33);
		assert_eq!(oy, 33);
	}
}
