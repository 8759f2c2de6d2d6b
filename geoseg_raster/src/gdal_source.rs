//! A GDAL-backed [`RasterSource`], with a small pool of reusable dataset
//! handles (GDAL handles are not safely shareable across threads at once, so
//! each blocking read borrows one handle for its duration).

use crate::band_mapping::BandMapping;
use crate::error::RasterError;
use crate::resample::ResampleAlg;
use crate::source::{PixelWindow, RasterSource, RasterWindow};
use async_trait::async_trait;
use gdal::Dataset;
use gdal::spatial_ref::{CoordTransform, SpatialRef};
use geoseg_core::{Affine, GeoBBox};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles are recycled up to this many reads before being closed and
/// reopened, so long-running tiling jobs don't accumulate GDAL-internal
/// caches indefinitely.
const DEFAULT_MAX_REUSE: u32 = 64;

struct Instance {
	dataset: Dataset,
	age: u32,
}

// `gdal::Dataset` wraps a raw GDAL handle that is only ever touched from the
// single blocking task holding this `Instance` at a time (enforced by the
// pool's mutex), so it is safe to move between threads.
unsafe impl Sync for Instance {}

pub struct GdalRasterSource {
	path: String,
	instances: Mutex<VecDeque<Instance>>,
	transform: Affine,
	crs: String,
	bbox: GeoBBox,
	gsd: (f64, f64),
	width: u32,
	height: u32,
	band_mapping: Arc<BandMapping>,
	max_reuse: u32,
}

impl GdalRasterSource {
	/// Opens `path` and inspects its geo-reference, CRS, bounds, GSD, and band
	/// layout up front, seeding the instance pool with the opened handle.
	pub async fn open(path: impl Into<String>) -> Result<GdalRasterSource, RasterError> {
		let path = path.into();
		let opened = path.clone();
		let (instance, transform, crs, bbox, gsd, width, height, band_mapping) =
			tokio::task::spawn_blocking(move || Self::open_blocking(&opened))
				.await
				.map_err(|e| RasterError::Gdal {
					context: "raster open task panicked",
					message: e.to_string(),
				})??;

		Ok(GdalRasterSource {
			path,
			instances: Mutex::new(VecDeque::from([instance])),
			transform,
			crs,
			bbox,
			gsd,
			width,
			height,
			band_mapping: Arc::new(band_mapping),
			max_reuse: DEFAULT_MAX_REUSE,
		})
	}

	#[allow(clippy::type_complexity)]
	fn open_blocking(
		path: &str,
	) -> Result<(Instance, Affine, String, GeoBBox, (f64, f64), u32, u32, BandMapping), RasterError> {
		gdal::config::set_config_option("GDAL_NUM_THREADS", "ALL_CPUS").ok();

		let dataset = Dataset::open(path).map_err(|e| RasterError::Open {
			path: path.to_string(),
			message: e.to_string(),
		})?;

		let gt = dataset.geo_transform().map_err(|e| RasterError::Gdal {
			context: "failed to read geo transform",
			message: e.to_string(),
		})?;
		if gt[2] != 0.0 || gt[4] != 0.0 {
			return Err(RasterError::RotatedTransformUnsupported { path: path.to_string() });
		}
		let transform = Affine::from_gdal_array(gt);

		let spatial_ref = dataset.spatial_ref().map_err(|_| RasterError::MissingSpatialReference {
			path: path.to_string(),
		})?;
		let crs = spatial_ref.to_wkt().map_err(|e| RasterError::Gdal {
			context: "failed to serialize spatial reference to WKT",
			message: e.to_string(),
		})?;

		let (width, height) = dataset.raster_size();
		let bbox = compute_bbox_4326(&dataset, &spatial_ref, &gt, width, height, path)?;
		let gsd = compute_gsd(&dataset, &transform);
		let band_mapping = BandMapping::from_dataset(&dataset, path).map_err(|e| match e {
			RasterError::Gdal { context, message } => RasterError::Gdal { context, message },
			other => other,
		})?;

		Ok((
			Instance { dataset, age: 0 },
			transform,
			crs,
			bbox,
			gsd,
			width as u32,
			height as u32,
			band_mapping,
		))
	}

	async fn get_instance(&self) -> Result<Instance, RasterError> {
		if let Some(instance) = self.instances.lock().await.pop_front() {
			return Ok(instance);
		}
		let path = self.path.clone();
		tokio::task::spawn_blocking(move || {
			let dataset = Dataset::open(&path).map_err(|e| RasterError::Open {
				path: path.clone(),
				message: e.to_string(),
			})?;
			Ok(Instance { dataset, age: 0 })
		})
		.await
		.map_err(|e| RasterError::Gdal {
			context: "raster reopen task panicked",
			message: e.to_string(),
		})?
	}

	async fn return_instance(&self, mut instance: Instance) {
		instance.age = instance.age.wrapping_add(1);
		if instance.age < self.max_reuse {
			self.instances.lock().await.push_back(instance);
		}
	}
}

#[async_trait]
impl RasterSource for GdalRasterSource {
	fn width(&self) -> u32 {
		self.width
	}

	fn height(&self) -> u32 {
		self.height
	}

	fn band_count(&self) -> usize {
		self.band_mapping.len()
	}

	fn transform(&self) -> Affine {
		self.transform
	}

	fn crs(&self) -> &str {
		&self.crs
	}

	fn gsd(&self) -> (f64, f64) {
		self.gsd
	}

	fn bbox(&self) -> &GeoBBox {
		&self.bbox
	}

	async fn read_window(
		&self,
		window: PixelWindow,
		out_size: (u32, u32),
		resample: ResampleAlg,
	) -> Result<RasterWindow, RasterError> {
		let instance = self.get_instance().await?;
		let band_mapping = Arc::clone(&self.band_mapping);
		let path = self.path.clone();
		let (width, height) = (self.width, self.height);

		let (result, instance) = tokio::task::spawn_blocking(move || {
			let result = read_window_blocking(&instance.dataset, &band_mapping, &path, width, height, window, out_size, resample);
			(result, instance)
		})
		.await
		.map_err(|e| RasterError::Gdal {
			context: "windowed read task panicked",
			message: e.to_string(),
		})?;

		self.return_instance(instance).await;
		result
	}

	async fn read_reprojected(
		&self,
		bbox: &GeoBBox,
		out_size: (u32, u32),
		dst_epsg: u32,
		resample: ResampleAlg,
	) -> Result<RasterWindow, RasterError> {
		let instance = self.get_instance().await?;
		let band_mapping = Arc::clone(&self.band_mapping);
		let path = self.path.clone();
		let bbox = *bbox;

		let (result, instance) = tokio::task::spawn_blocking(move || {
			let result = read_reprojected_blocking(&instance.dataset, &band_mapping, &path, &bbox, out_size, dst_epsg, resample);
			(result, instance)
		})
		.await
		.map_err(|e| RasterError::Gdal {
			context: "reprojected read task panicked",
			message: e.to_string(),
		})?;

		self.return_instance(instance).await;
		result
	}
}

fn compute_bbox_4326(
	dataset: &Dataset,
	spatial_ref: &SpatialRef,
	gt: &gdal::GeoTransform,
	width: usize,
	height: usize,
	path: &str,
) -> Result<GeoBBox, RasterError> {
	let _ = dataset;
	let target = SpatialRef::from_epsg(4326).map_err(|e| RasterError::Gdal {
		context: "failed to build EPSG:4326 spatial reference",
		message: e.to_string(),
	})?;
	let coord_transform = CoordTransform::new(spatial_ref, &target).map_err(|e| RasterError::Gdal {
		context: "failed to build coordinate transform to EPSG:4326",
		message: e.to_string(),
	})?;

	let bounds = coord_transform
		.transform_bounds(
			&[gt[0], gt[3], gt[0] + gt[1] * width as f64, gt[3] + gt[5] * height as f64],
			21,
		)
		.map_err(|e| RasterError::Gdal {
			context: "failed to transform raster bounds to EPSG:4326",
			message: e.to_string(),
		})?;

	// GDAL's OGREnvelope ordering does not always match (min, min, max, max);
	// normalize by min/max rather than trusting component order.
	log::trace!("raw bounds for '{path}': {bounds:?}");
	let mut bbox = GeoBBox::new_clamped(bounds[0], bounds[1], bounds[2], bounds[3]);
	bbox.limit_to_mercator();
	Ok(bbox)
}

/// Consults the `GSD` metadata tag (meters/pixel) falling back to the
/// transform's own pixel size when absent.
fn compute_gsd(dataset: &Dataset, transform: &Affine) -> (f64, f64) {
	if let Some(tag) = dataset.metadata_item("GSD", "")
		&& let Ok(value) = tag.trim().parse::<f64>()
		&& value.is_finite()
		&& value > 0.0
	{
		return (value, value);
	}
	transform.pixel_size()
}

#[allow(clippy::too_many_arguments)]
fn read_window_blocking(
	dataset: &Dataset,
	band_mapping: &BandMapping,
	path: &str,
	width: u32,
	height: u32,
	window: PixelWindow,
	out_size: (u32, u32),
	resample: ResampleAlg,
) -> Result<RasterWindow, RasterError> {
	let valid_x0 = window.x.max(0);
	let valid_y0 = window.y.max(0);
	let valid_x1 = (window.x + window.w as i64).min(i64::from(width));
	let valid_y1 = (window.y + window.h as i64).min(i64::from(height));
	if valid_x0 >= valid_x1 || valid_y0 >= valid_y1 {
		return Err(RasterError::OutOfBounds);
	}

	let (out_w, out_h) = out_size;
	let scale_x = f64::from(out_w) / window.w as f64;
	let scale_y = f64::from(out_h) / window.h as f64;
	let valid_w = (valid_x1 - valid_x0) as u64;
	let valid_h = (valid_y1 - valid_y0) as u64;

	let out_valid_w = (((valid_w as f64) * scale_x).round() as u32).clamp(1, out_w);
	let out_valid_h = (((valid_h as f64) * scale_y).round() as u32).clamp(1, out_h);
	let out_off_x = (((valid_x0 - window.x) as f64) * scale_x).round() as u32;
	let out_off_y = (((valid_y0 - window.y) as f64) * scale_y).round() as u32;
	let out_off_x = out_off_x.min(out_w.saturating_sub(out_valid_w));
	let out_off_y = out_off_y.min(out_h.saturating_sub(out_valid_h));

	let mut result = RasterWindow::zero_filled(out_w, out_h, band_mapping.len());

	for (plane, raw_index) in band_mapping.iter() {
		let band = dataset.rasterband(raw_index).map_err(|e| RasterError::Gdal {
			context: "failed to open raster band for windowed read",
			message: e.to_string(),
		})?;
		let buffer = band
			.read_as::<u8>(
				(valid_x0 as isize, valid_y0 as isize),
				(valid_w as usize, valid_h as usize),
				(out_valid_w as usize, out_valid_h as usize),
				Some(resample.into()),
			)
			.map_err(|e| RasterError::Gdal {
				context: "windowed raster read failed",
				message: format!("{path}: {e}"),
			})?;

		let dst = result.band_mut(plane);
		for row in 0..out_valid_h as usize {
			let src_row = &buffer.data[row * out_valid_w as usize..(row + 1) * out_valid_w as usize];
			let dst_row_start = (out_off_y as usize + row) * out_w as usize + out_off_x as usize;
			dst[dst_row_start..dst_row_start + out_valid_w as usize].copy_from_slice(src_row);
		}
	}

	Ok(result)
}

/// Reprojects `bbox` (EPSG:4326) into a `dst_epsg`-projected `out_size` buffer
/// via a raw GDAL warp operation, mirroring the reference reader's
/// reproject-to-memory-dataset path.
#[allow(clippy::too_many_arguments)]
fn read_reprojected_blocking(
	dataset: &Dataset,
	band_mapping: &BandMapping,
	path: &str,
	bbox: &GeoBBox,
	out_size: (u32, u32),
	dst_epsg: u32,
	resample: ResampleAlg,
) -> Result<RasterWindow, RasterError> {
	use gdal::raster::ColorInterpretation;
	use gdal::spatial_ref::SpatialRef;

	let (width, height) = out_size;
	let bounds = bbox.to_mercator();

	let driver = gdal::DriverManager::get_driver_by_name("MEM").map_err(|e| RasterError::Gdal {
		context: "failed to get GDAL MEM driver",
		message: e.to_string(),
	})?;
	let mut dst_ds = driver
		.create_with_band_type::<u8, _>("", width as usize, height as usize, band_mapping.len())
		.map_err(|e| RasterError::Gdal {
			context: "failed to create in-memory destination dataset",
			message: e.to_string(),
		})?;
	let dst_srs = SpatialRef::from_epsg(dst_epsg).map_err(|e| RasterError::Gdal {
		context: "failed to build destination spatial reference",
		message: e.to_string(),
	})?;
	dst_ds.set_spatial_ref(&dst_srs).map_err(|e| RasterError::Gdal {
		context: "failed to set destination spatial reference",
		message: e.to_string(),
	})?;

	let geo_transform: gdal::GeoTransform = [
		bounds[0],
		(bounds[2] - bounds[0]) / f64::from(width),
		0.0,
		bounds[3],
		0.0,
		(bounds[1] - bounds[3]) / f64::from(height),
	];
	dst_ds.set_geo_transform(&geo_transform).map_err(|e| RasterError::Gdal {
		context: "failed to set destination geo transform",
		message: e.to_string(),
	})?;

	if let Some(alpha) = band_mapping.alpha_band() {
		dst_ds
			.rasterband(alpha)
			.and_then(|b| b.set_color_interpretation(ColorInterpretation::AlphaBand))
			.map_err(|e| RasterError::Gdal {
				context: "failed to mark destination alpha band",
				message: e.to_string(),
			})?;
	}

	let h_src_ds = dataset.c_dataset();
	let h_dst_ds = dst_ds.c_dataset();

	// SAFETY: both handles come from live `gdal::Dataset`s kept alive for the
	// duration of this call; the warp API contract requires raw handles here.
	unsafe {
		use gdal_sys::{
			CPLErr, CPLGetLastErrorMsg, CSLSetNameValue, GDALChunkAndWarpMulti, GDALCreateGenImgProjTransformer2,
			GDALCreateWarpOperation, GDALCreateWarpOptions, GDALDestroyGenImgProjTransformer, GDALDestroyWarpOperation,
			GDALGenImgProjTransform, GDALWarpOperationH, GDALWarpOptions,
		};

		let mut options: GDALWarpOptions = *GDALCreateWarpOptions();
		options.hSrcDS = h_src_ds;
		options.hDstDS = h_dst_ds;
		options.nBandCount = band_mapping.len() as i32;
		options.panSrcBands = gdal_sys::CPLMalloc(band_mapping.len() * std::mem::size_of::<i32>()).cast();
		options.panDstBands = gdal_sys::CPLMalloc(band_mapping.len() * std::mem::size_of::<i32>()).cast();
		for (plane, raw_index) in band_mapping.iter() {
			*options.panSrcBands.add(plane) = raw_index as i32;
			*options.panDstBands.add(plane) = (plane + 1) as i32;
		}

		options.papszWarpOptions = CSLSetNameValue(options.papszWarpOptions, c"NUM_THREADS".as_ptr(), c"ALL_CPUS".as_ptr());
		options.eResampleAlg = resample.as_gdal();
		options.dfWarpMemoryLimit = 512.0 * 1024.0 * 1024.0;
		options.pTransformerArg = GDALCreateGenImgProjTransformer2(h_src_ds, h_dst_ds, core::ptr::null_mut());
		options.pfnTransformer = Some(GDALGenImgProjTransform);

		let operation: GDALWarpOperationH = GDALCreateWarpOperation(&options);
		let rv = GDALChunkAndWarpMulti(operation, 0, 0, width as i32, height as i32);
		GDALDestroyWarpOperation(operation);
		GDALDestroyGenImgProjTransformer(options.pTransformerArg);

		if rv != CPLErr::CE_None {
			return Err(RasterError::Gdal {
				context: "warp operation failed",
				message: format!("{path}: {:?}", CPLGetLastErrorMsg()),
			});
		}
	}

	let mut result = RasterWindow::zero_filled(width, height, band_mapping.len());
	for plane in 0..band_mapping.len() {
		let band = dst_ds.rasterband(plane + 1).map_err(|e| RasterError::Gdal {
			context: "failed to open destination band after warp",
			message: e.to_string(),
		})?;
		let buffer = band
			.read_as::<u8>((0, 0), (width as usize, height as usize), (width as usize, height as usize), None)
			.map_err(|e| RasterError::Gdal {
				context: "failed to read destination band after warp",
				message: e.to_string(),
			})?;
		result.band_mut(plane).copy_from_slice(&buffer.data);
	}

	Ok(result)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn mem_dataset(w: usize, h: usize, bands: usize) -> Dataset {
		let driver = gdal::DriverManager::get_driver_by_name("MEM").expect("MEM driver");
		driver.create_with_band_type::<u8, _>("", w, h, bands).expect("create mem dataset")
	}

	fn band_mapping_single() -> BandMapping {
		let dataset = mem_dataset(4, 4, 1);
		BandMapping::from_dataset(&dataset, "mem").expect("grey band mapping")
	}

	#[test]
	fn out_of_bounds_window_is_rejected() {
		let dataset = mem_dataset(4, 4, 1);
		let band_mapping = band_mapping_single();
		let window = PixelWindow::new(100, 100, 10, 10);
		let result = read_window_blocking(&dataset, &band_mapping, "mem", 4, 4, window, (10, 10), ResampleAlg::NearestNeighbour);
		assert!(matches!(result, Err(RasterError::OutOfBounds)));
	}

	#[test]
	fn partially_out_of_bounds_window_is_zero_padded() {
		let dataset = mem_dataset(4, 4, 1);
		let band_mapping = band_mapping_single();
		let window = PixelWindow::new(-2, -2, 4, 4);
		let result = read_window_blocking(&dataset, &band_mapping, "mem", 4, 4, window, (4, 4), ResampleAlg::NearestNeighbour)
			.expect("partial window should succeed, not error");
		assert_eq!(result.width, 4);
		assert_eq!(result.height, 4);
	}

	#[test]
	fn gsd_falls_back_to_transform_pixel_size() {
		let dataset = mem_dataset(4, 4, 1);
		let transform = Affine::from_origin_and_pixel_size(0.0, 0.0, 0.5, -0.5);
		let (gx, gy) = compute_gsd(&dataset, &transform);
		assert!((gx - 0.5).abs() < 1e-9);
		assert!((gy - 0.5).abs() < 1e-9);
	}
}
