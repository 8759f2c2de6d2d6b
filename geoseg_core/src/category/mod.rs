//! Dataset category tables: the set of semantic classes a prediction or label
//! tile's palette indices refer to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The reserved palette index for the (at most one) ignore category.
pub const IGNORE_PALETTE_INDEX: u8 = 255;

/// Failure of a [`DatasetCategories`] invariant (§3 of the data model).
#[derive(Clone, Debug, PartialEq)]
pub enum CategoryError {
	TooFewCategories { found: usize },
	MultipleIgnoreCategories { names: Vec<String> },
	NonContiguousPaletteIndices { expected: u8, found: u8 },
	DuplicateLabelValue { value: Vec<i64>, first: String, second: String },
}

impl fmt::Display for CategoryError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CategoryError::TooFewCategories { found } => {
				write!(f, "a category set needs at least 2 categories, found {found}")
			}
			CategoryError::MultipleIgnoreCategories { names } => {
				write!(f, "at most one ignore category is allowed, found {}: {}", names.len(), names.join(", "))
			}
			CategoryError::NonContiguousPaletteIndices { expected, found } => {
				write!(f, "palette indices must be contiguous starting at 0; expected {expected}, found {found}")
			}
			CategoryError::DuplicateLabelValue { value, first, second } => {
				write!(f, "label value {value:?} is claimed by both '{first}' and '{second}'")
			}
		}
	}
}

impl std::error::Error for CategoryError {}

/// A single semantic class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetCategory {
	pub name: String,
	pub palette_index: u8,
	pub palette_color: (u8, u8, u8),
	/// Source-label-raster value tuples (e.g. RGB triples) that map to this category.
	pub label_values: Vec<Vec<i64>>,
	pub is_active: bool,
	pub is_ignore: bool,
	#[serde(default = "default_weight")]
	pub weight: f64,
}

fn default_weight() -> f64 {
	1.0
}

impl DatasetCategory {
	#[must_use]
	pub fn new(name: impl Into<String>, palette_index: u8, palette_color: (u8, u8, u8)) -> DatasetCategory {
		DatasetCategory {
			name: name.into(),
			palette_index,
			palette_color,
			label_values: Vec::new(),
			is_active: true,
			is_ignore: false,
			weight: 1.0,
		}
	}

	#[must_use]
	pub fn with_label_values(mut self, label_values: Vec<Vec<i64>>) -> DatasetCategory {
		self.label_values = label_values;
		self
	}

	#[must_use]
	pub fn as_ignore(mut self) -> DatasetCategory {
		self.is_ignore = true;
		self.palette_index = IGNORE_PALETTE_INDEX;
		self
	}

	#[must_use]
	pub fn inactive(mut self) -> DatasetCategory {
		self.is_active = false;
		self
	}

	#[must_use]
	pub fn with_weight(mut self, weight: f64) -> DatasetCategory {
		self.weight = weight;
		self
	}
}

/// An ordered, validated collection of [`DatasetCategory`] values.
///
/// Construction enforces every invariant in §3: at least two categories, at
/// most one ignore category, contiguous non-ignore palette indices starting
/// at 0, and no label value claimed by two active categories.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetCategories(Vec<DatasetCategory>);

impl DatasetCategories {
	/// # Errors
	///
	/// Returns [`CategoryError`] if `categories` violates any invariant in §3.
	pub fn new(categories: Vec<DatasetCategory>) -> Result<DatasetCategories, CategoryError> {
		if categories.len() < 2 {
			return Err(CategoryError::TooFewCategories { found: categories.len() });
		}

		let ignore_names: Vec<String> = categories.iter().filter(|c| c.is_ignore).map(|c| c.name.clone()).collect();
		if ignore_names.len() > 1 {
			return Err(CategoryError::MultipleIgnoreCategories { names: ignore_names });
		}

		let mut non_ignore_indices: Vec<u8> = categories.iter().filter(|c| !c.is_ignore).map(|c| c.palette_index).collect();
		non_ignore_indices.sort_unstable();
		for (expected, &found) in non_ignore_indices.iter().enumerate() {
			if expected as u8 != found {
				return Err(CategoryError::NonContiguousPaletteIndices {
					expected: expected as u8,
					found,
				});
			}
		}

		let mut seen: std::collections::HashMap<Vec<i64>, &str> = std::collections::HashMap::new();
		for category in categories.iter().filter(|c| c.is_active) {
			for value in &category.label_values {
				if let Some(&first) = seen.get(value) {
					if first != category.name {
						return Err(CategoryError::DuplicateLabelValue {
							value: value.clone(),
							first: first.to_string(),
							second: category.name.clone(),
						});
					}
				}
				seen.insert(value.clone(), &category.name);
			}
		}

		Ok(DatasetCategories(categories))
	}

	#[must_use]
	pub fn as_slice(&self) -> &[DatasetCategory] {
		&self.0
	}

	pub fn iter(&self) -> impl Iterator<Item = &DatasetCategory> {
		self.0.iter()
	}

	pub fn active(&self) -> impl Iterator<Item = &DatasetCategory> {
		self.0.iter().filter(|c| c.is_active)
	}

	#[must_use]
	pub fn ignore_category(&self) -> Option<&DatasetCategory> {
		self.0.iter().find(|c| c.is_ignore)
	}

	#[must_use]
	pub fn by_palette_index(&self, index: u8) -> Option<&DatasetCategory> {
		self.0.iter().find(|c| c.palette_index == index)
	}

	/// Maps each category's name to its palette color.
	#[must_use]
	pub fn palette_colors(&self) -> std::collections::HashMap<String, (u8, u8, u8)> {
		self.0.iter().map(|c| (c.name.clone(), c.palette_color)).collect()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	#[must_use]
	pub fn max_palette_index(&self) -> u8 {
		self.0.iter().map(|c| c.palette_index).max().unwrap_or(0)
	}
}

impl<'a> IntoIterator for &'a DatasetCategories {
	type Item = &'a DatasetCategory;
	type IntoIter = std::slice::Iter<'a, DatasetCategory>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}
