use anyhow::{Result, ensure};

/// A 2-D affine transform in the GDAL geo-transform convention:
/// `world_x = a + col*b + row*c`, `world_y = d + col*e + row*f`.
///
/// Used both for a raster's pixel→world transform and for a tile's own
/// pixel→world transform once it has been placed on a raster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine {
	pub a: f64,
	pub b: f64,
	pub c: f64,
	pub d: f64,
	pub e: f64,
	pub f: f64,
}

impl Affine {
	#[must_use]
	pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Affine {
		Affine { a, b, c, d, e, f }
	}

	/// The identity transform (pixel coordinates equal world coordinates).
	#[must_use]
	pub fn identity() -> Affine {
		Affine::new(0.0, 1.0, 0.0, 0.0, 0.0, 1.0)
	}

	/// An axis-aligned transform with the given origin and pixel size; `pixel_height`
	/// is usually negative (north-up rasters store rows top-to-bottom while `y`
	/// increases northward).
	#[must_use]
	pub fn from_origin_and_pixel_size(x_origin: f64, y_origin: f64, pixel_width: f64, pixel_height: f64) -> Affine {
		Affine::new(x_origin, pixel_width, 0.0, y_origin, 0.0, pixel_height)
	}

	#[must_use]
	pub fn as_gdal_array(&self) -> [f64; 6] {
		[self.a, self.b, self.c, self.d, self.e, self.f]
	}

	#[must_use]
	pub fn from_gdal_array(t: [f64; 6]) -> Affine {
		Affine::new(t[0], t[1], t[2], t[3], t[4], t[5])
	}

	/// Ground sampling distance along each axis, i.e. the pixel size ignoring rotation.
	#[must_use]
	pub fn pixel_size(&self) -> (f64, f64) {
		(self.b.hypot(self.c), self.e.hypot(self.f))
	}

	/// Applies the transform to a pixel coordinate, returning a world coordinate.
	#[must_use]
	pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
		(self.a + col * self.b + row * self.c, self.d + col * self.e + row * self.f)
	}

	/// Inverts the transform so that `inverted().apply(world) == pixel`.
	///
	/// # Errors
	///
	/// Returns an error if the transform is singular (zero determinant).
	pub fn invert(&self) -> Result<Affine> {
		let det = self.b * self.f - self.c * self.e;
		ensure!(det.abs() > f64::EPSILON, "affine transform is singular (determinant {det})");
		let inv_b = self.f / det;
		let inv_c = -self.c / det;
		let inv_e = -self.e / det;
		let inv_f = self.b / det;
		let inv_a = -(self.a * inv_b + self.d * inv_c);
		let inv_d = -(self.a * inv_e + self.d * inv_f);
		Ok(Affine::new(inv_a, inv_b, inv_c, inv_d, inv_e, inv_f))
	}

	/// Composes two transforms so that `self.then(other).apply(p) == other.apply(self.apply(p))`.
	///
	/// Useful for building a tile-pixel→raster-pixel transform out of a
	/// tile-pixel→world transform followed by a world→raster-pixel transform
	/// (the inverse of the raster's own pixel→world transform).
	#[must_use]
	pub fn then(&self, other: &Affine) -> Affine {
		Affine::new(
			other.a + other.b * self.a + other.c * self.d,
			other.b * self.b + other.c * self.e,
			other.b * self.c + other.c * self.f,
			other.d + other.e * self.a + other.f * self.d,
			other.e * self.b + other.f * self.e,
			other.e * self.c + other.f * self.f,
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;

	#[test]
	fn identity_roundtrip() {
		let t = Affine::identity();
		let (x, y) = t.apply(3.0, 4.0);
		assert_eq!((x, y), (3.0, 4.0));
	}

	#[test]
	fn invert_undoes_apply() {
		let t = Affine::from_origin_and_pixel_size(100.0, 200.0, 0.5, -0.5);
		let inv = t.invert().unwrap();
		let (wx, wy) = t.apply(10.0, 20.0);
		let (px, py) = inv.apply(wx, wy);
		assert_relative_eq!(px, 10.0, epsilon = 1e-9);
		assert_relative_eq!(py, 20.0, epsilon = 1e-9);
	}

	#[test]
	fn invert_rejects_singular() {
		let t = Affine::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
		assert!(t.invert().is_err());
	}

	#[test]
	fn composition_matches_sequential_apply() {
		let tile_to_world = Affine::from_origin_and_pixel_size(500.0, 500.0, 1.0, -1.0);
		let world_to_raster = Affine::from_origin_and_pixel_size(0.0, 1000.0, 0.5, -0.5).invert().unwrap();
		let composed = tile_to_world.then(&world_to_raster);

		let (wx, wy) = tile_to_world.apply(5.0, 5.0);
		let expected = world_to_raster.apply(wx, wy);
		let actual = composed.apply(5.0, 5.0);
		assert_relative_eq!(actual.0, expected.0, epsilon = 1e-6);
		assert_relative_eq!(actual.1, expected.1, epsilon = 1e-6);
	}

	#[test]
	fn pixel_size_ignores_sign() {
		let t = Affine::from_origin_and_pixel_size(0.0, 0.0, 0.3, -0.3);
		let (px, py) = t.pixel_size();
		assert_relative_eq!(px, 0.3, epsilon = 1e-12);
		assert_relative_eq!(py, 0.3, epsilon = 1e-12);
	}
}
