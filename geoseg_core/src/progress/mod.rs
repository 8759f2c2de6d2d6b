//! Progress reporting handed into long-running stages (tiling a raster, fusing
//! a raster's tiles, aggregating a raster's outputs).
//!
//! Library code never decides on its own whether to render a bar: callers pass
//! a `&dyn ProgressTrait`, obtained from [`get_progress`], which renders a
//! terminal bar when the `cli` feature is enabled and is silent otherwise
//! (library embeddings, and always during tests).

mod terminal;

pub use terminal::TerminalProgress;

/// A handle for reporting progress through a bounded unit of work.
pub trait ProgressTrait: Send + Sync {
	fn set_position(&self, pos: u64);
	fn inc(&self, delta: u64);
	fn finish(&self);
	fn remove(&self);
}

/// A `ProgressTrait` that does nothing; used in tests and in library-only embeddings.
pub struct NoProgress;

impl ProgressTrait for NoProgress {
	fn set_position(&self, _pos: u64) {}
	fn inc(&self, _delta: u64) {}
	fn finish(&self) {}
	fn remove(&self) {}
}

/// Returns the progress handle appropriate for the current build: a rendered
/// terminal bar when the `cli` feature is enabled outside tests, otherwise
/// [`NoProgress`].
#[must_use]
pub fn get_progress(message: &str, max_value: u64) -> Box<dyn ProgressTrait> {
	#[cfg(all(feature = "cli", not(test)))]
	{
		Box::new(TerminalProgress::new(message, max_value))
	}
	#[cfg(not(all(feature = "cli", not(test))))]
	{
		let _ = (message, max_value);
		Box::new(NoProgress)
	}
}
