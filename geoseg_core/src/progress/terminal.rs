//! A dependency-free terminal progress bar, rendered to stderr.
//!
//! Features: message, sub-character-precision bar (7 partial block steps),
//! pos/len, percentage, speed (items/sec), ETA.

use super::ProgressTrait;
use std::cmp::min;
use std::env;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Inner {
	message: String,
	len: u64,
	pos: u64,
	start: Instant,
}

impl Inner {
	fn redraw(&self) {
		let len = self.len.max(1);
		let pos = self.pos.min(len);
		let elapsed = self.start.elapsed();
		let per_sec = if elapsed.as_secs_f64() > 0.0 {
			pos as f64 / elapsed.as_secs_f64()
		} else {
			0.0
		};
		let eta_secs = if per_sec > 0.0 { ((len - pos) as f64 / per_sec).max(0.0) } else { 0.0 };

		let bar = make_bar(pos, len, available_bar_width(&self.message, pos, len, per_sec, eta_secs));
		let percent = (pos as f64 * 100.0 / len as f64).floor() as u64;

		let mut line = String::new();
		let _ = write!(
			line,
			"{}▕{}▏{}/{} ({:>3}%) {:>5} {:>5}",
			self.message,
			bar,
			pos,
			len,
			percent,
			format_rate(per_sec),
			format_eta(Duration::from_secs_f64(eta_secs))
		);

		let mut stderr = io::stderr();
		let _ = write!(stderr, "\r\x1b[2K{line}");
		let _ = stderr.flush();
	}
}

/// A terminal progress bar handle, cloneable and thread-safe.
pub struct TerminalProgress {
	inner: Mutex<Inner>,
}

impl TerminalProgress {
	#[must_use]
	pub fn new(message: &str, max_value: u64) -> TerminalProgress {
		let progress = TerminalProgress {
			inner: Mutex::new(Inner {
				message: message.to_string(),
				len: max_value,
				pos: 0,
				start: Instant::now(),
			}),
		};
		progress.inner.lock().unwrap().redraw();
		progress
	}
}

impl ProgressTrait for TerminalProgress {
	fn set_position(&self, value: u64) {
		let mut inner = self.inner.lock().unwrap();
		inner.pos = min(value, inner.len);
		inner.redraw();
	}

	fn inc(&self, value: u64) {
		let mut inner = self.inner.lock().unwrap();
		inner.pos = inner.pos.saturating_add(value).min(inner.len);
		inner.redraw();
	}

	fn finish(&self) {
		let mut inner = self.inner.lock().unwrap();
		inner.pos = inner.len;
		inner.redraw();
		let _ = io::stderr().write_all(b"\n");
		let _ = io::stderr().flush();
	}

	fn remove(&self) {
		let mut inner = self.inner.lock().unwrap();
		inner.pos = inner.len;
		drop(inner);
		let _ = io::stderr().write_all(b"\r\x1b[2K");
		let _ = io::stderr().flush();
	}
}

fn terminal_width() -> usize {
	if let Ok(cols) = env::var("COLUMNS")
		&& let Ok(v) = cols.parse::<usize>()
	{
		return v.max(10);
	}
	80
}

fn available_bar_width(msg: &str, pos: u64, len: u64, per_sec: f64, eta_secs: f64) -> usize {
	let percent = (pos as f64 * 100.0 / len.max(1) as f64).floor() as u64;
	let right = format!(
		"▏{}/{} ({:>3}%) {:>5} {:>5}",
		pos,
		len,
		percent,
		format_rate(per_sec),
		format_eta(Duration::from_secs_f64(eta_secs))
	);
	let total_width = terminal_width();
	let taken = msg.chars().count() + right.chars().count();
	let min_bar = 10usize;
	if total_width > taken + 2 + min_bar {
		total_width - taken - 2
	} else {
		min_bar
	}
}

fn make_bar(pos: u64, len: u64, width: usize) -> String {
	let width = width.max(1);
	let frac = (pos as f64 / len.max(1) as f64).clamp(0.0, 1.0);
	let exact = frac * (width as f64);
	let whole = exact.floor() as usize;
	let rem = exact - whole as f64;
	let partials = ["█", "▉", "▊", "▋", "▌", "▍", "▎", "▏"];

	let mut s = String::with_capacity(width);
	for _ in 0..whole.min(width) {
		s.push('█');
	}
	if whole < width {
		let idx = (rem * 8.0).floor() as usize;
		if idx > 0 {
			s.push_str(partials[idx.min(7)]);
		} else {
			s.push(' ');
		}
		for _ in (whole + 1)..width {
			s.push(' ');
		}
	}
	s
}

fn format_rate(per_sec: f64) -> String {
	if per_sec.is_finite() {
		human_number(per_sec) + "/s"
	} else {
		"--/s".to_string()
	}
}

fn human_number(v: f64) -> String {
	let abs = v.abs();
	if abs >= 1_000_000_000.0 {
		format!("{:.1}G", v / 1_000_000_000.0)
	} else if abs >= 1_000_000.0 {
		format!("{:.1}M", v / 1_000_000.0)
	} else if abs >= 1_000.0 {
		format!("{:.1}k", v / 1_000.0)
	} else {
		format!("{v:.0}")
	}
}

fn format_eta(d: Duration) -> String {
	let total = d.as_secs();
	let h = total / 3600;
	let m = (total % 3600) / 60;
	let s = total % 60;
	if h > 0 {
		format!("{h:02}:{m:02}:{s:02}")
	} else {
		format!("{m:02}:{s:02}")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_starts_at_zero() {
		let progress = TerminalProgress::new("test", 100);
		assert_eq!(progress.inner.lock().unwrap().pos, 0);
	}

	#[test]
	fn set_position_clamps_to_len() {
		let progress = TerminalProgress::new("test", 100);
		progress.set_position(500);
		assert_eq!(progress.inner.lock().unwrap().pos, 100);
	}

	#[test]
	fn inc_accumulates() {
		let progress = TerminalProgress::new("test", 100);
		progress.set_position(10);
		progress.inc(20);
		assert_eq!(progress.inner.lock().unwrap().pos, 30);
	}

	#[test]
	fn finish_sets_position_to_len() {
		let progress = TerminalProgress::new("test", 100);
		progress.set_position(50);
		progress.finish();
		assert_eq!(progress.inner.lock().unwrap().pos, 100);
	}
}
