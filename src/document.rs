//! The loaded-document aggregate: source charset tag, the code-point grid,
//! the UTF-8 fidelity map, hyperlinks, and the optional ANSI color map.

use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
	ansi_art::ColorMap,
	error::{LoadError, LoadErrorCode},
	links::HyperLink,
};

/// Implementation constant: no line may exceed this many columns.
/// Not pinned by any upstream format document; chosen generous enough that
/// no real scene NFO or ANSI art trips it while bounding memory use for the
/// 3 MiB input cap.
pub const WIDTH_LIMIT: u32 = 4000;

/// Implementation constant: no document may exceed this many rows.
pub const LINES_LIMIT: u32 = 50_000;

/// Maximum input size accepted by [`crate::loader`].
pub const MAX_FILE_SIZE: usize = 3 * 1024 * 1024;

/// How the document's bytes were ultimately decoded. Assigned exactly once
/// per successful load; `Auto` only ever appears as an input preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceCharset {
	#[default]
	Auto,
	Utf16,
	Utf8Sig,
	Utf8,
	Cp437,
	Cp437InUtf8,
	Cp437InUtf16,
	Cp437InCp437,
	Cp437InCp437InUtf8,
	Cp437Strict,
	Windows1252,
}

impl SourceCharset {
	#[must_use]
	pub const fn label(self) -> &'static str {
		match self {
			Self::Auto => "auto-detect",
			Self::Utf16 => "UTF-16",
			Self::Utf8Sig => "UTF-8 (with BOM)",
			Self::Utf8 => "UTF-8",
			Self::Cp437 => "CP437",
			Self::Cp437InUtf8 => "CP437 (recovered from UTF-8)",
			Self::Cp437InUtf16 => "CP437 (recovered from UTF-16)",
			Self::Cp437InCp437 => "CP437 (doubly recovered)",
			Self::Cp437InCp437InUtf8 => "CP437 (doubly recovered via UTF-8)",
			Self::Cp437Strict => "CP437 (strict)",
			Self::Windows1252 => "Windows-1252",
		}
	}
}

/// Whether a double-encode recovery heuristic should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approach {
	False,
	Try,
	Force,
}

/// A `rows x cols` grid of code points. Cell value `'\0'` means empty.
#[derive(Debug, Clone, Default)]
pub struct Grid {
	rows: usize,
	cols: usize,
	cells: Vec<char>,
}

impl Grid {
	fn new(rows: usize, cols: usize) -> Self {
		Self { rows, cols, cells: vec!['\0'; rows * cols] }
	}

	#[must_use]
	pub const fn rows(&self) -> usize {
		self.rows
	}

	#[must_use]
	pub const fn cols(&self) -> usize {
		self.cols
	}

	#[must_use]
	pub fn char_at(&self, row: usize, col: usize) -> char {
		if row >= self.rows || col >= self.cols {
			return '\0';
		}
		self.cells[row * self.cols + col]
	}

	#[cfg(not(feature = "parallel"))]
	fn row_mut(&mut self, row: usize) -> &mut [char] {
		let cols = self.cols;
		&mut self.cells[row * cols..(row + 1) * cols]
	}
}

/// The primary load-pipeline output. Immutable once constructed; a failed
/// load produces the empty-but-valid `Document::default()` shape with
/// `last_error` set.
#[derive(Debug, Clone, Default)]
pub struct Document {
	text: String,
	grid: Grid,
	utf8_of_codepoint: HashMap<char, String>,
	links: Vec<HyperLink>,
	color_map: Option<ColorMap>,
	source_charset: SourceCharset,
	is_ansi: bool,
	ansi_hint_width: Option<u32>,
	ansi_hint_height: Option<u32>,
	line_wrap_enabled: bool,
	last_error: LoadError,
}

impl Document {
	/// Builds an empty-but-valid document carrying only an error.
	#[must_use]
	pub fn with_error(code: LoadErrorCode, description: impl Into<String>) -> Self {
		Self { last_error: LoadError::new(code, description), ..Self::default() }
	}

	pub(crate) fn set_links(&mut self, links: Vec<HyperLink>) {
		self.links = links;
	}

	pub(crate) fn set_color_map(&mut self, color_map: Option<ColorMap>) {
		self.color_map = color_map;
	}

	pub(crate) fn set_source_charset(&mut self, charset: SourceCharset) {
		self.source_charset = charset;
	}

	pub(crate) fn set_ansi_hints(&mut self, is_ansi: bool, width: Option<u32>, height: Option<u32>) {
		self.is_ansi = is_ansi;
		self.ansi_hint_width = width;
		self.ansi_hint_height = height;
	}

	pub(crate) fn set_line_wrap_enabled(&mut self, enabled: bool) {
		self.line_wrap_enabled = enabled;
	}

	pub(crate) fn set_text(&mut self, text: String) {
		self.text = text;
	}

	pub(crate) fn set_grid(&mut self, grid: Grid, utf8_of_codepoint: HashMap<char, String>) {
		self.grid = grid;
		self.utf8_of_codepoint = utf8_of_codepoint;
	}

	#[cfg(test)]
	pub(crate) fn set_grid_for_test(&mut self, grid: Grid, utf8_of_codepoint: HashMap<char, String>) {
		self.set_grid(grid, utf8_of_codepoint);
	}

	#[must_use]
	pub const fn grid_width(&self) -> usize {
		self.grid.cols()
	}

	#[must_use]
	pub const fn grid_height(&self) -> usize {
		self.grid.rows()
	}

	#[must_use]
	pub fn grid_char(&self, row: usize, col: usize) -> char {
		self.grid.char_at(row, col)
	}

	#[must_use]
	pub fn grid_char_utf8(&self, row: usize, col: usize) -> String {
		let ch = self.grid_char(row, col);
		self.utf8_of_codepoint.get(&ch).cloned().unwrap_or_else(|| ch.to_string())
	}

	#[must_use]
	pub fn text_utf8(&self) -> &str {
		&self.text
	}

	#[must_use]
	pub fn charset_name(&self) -> String {
		if self.is_ansi {
			format!("{} (ANSI ART)", self.source_charset.label())
		} else {
			self.source_charset.label().to_string()
		}
	}

	#[must_use]
	pub const fn is_ansi(&self) -> bool {
		self.is_ansi
	}

	#[must_use]
	pub const fn ansi_hint_width(&self) -> Option<u32> {
		self.ansi_hint_width
	}

	#[must_use]
	pub const fn ansi_hint_height(&self) -> Option<u32> {
		self.ansi_hint_height
	}

	#[must_use]
	pub const fn source_charset(&self) -> SourceCharset {
		self.source_charset
	}

	#[must_use]
	pub const fn line_wrap_enabled(&self) -> bool {
		self.line_wrap_enabled
	}

	#[must_use]
	pub const fn color_map(&self) -> Option<&ColorMap> {
		self.color_map.as_ref()
	}

	#[must_use]
	pub const fn last_error(&self) -> &LoadError {
		&self.last_error
	}

	#[must_use]
	pub fn link(&self, row: usize, col: usize) -> Option<&HyperLink> {
		self.links.iter().find(|link| link.row == row && col >= link.col_start && col < link.col_start + link.len)
	}

	#[must_use]
	pub fn link_by_index(&self, index: usize) -> Option<&HyperLink> {
		self.links.get(index)
	}

	#[must_use]
	pub fn links_for_row(&self, row: usize) -> Vec<&HyperLink> {
		self.links.iter().filter(|link| link.row == row).collect()
	}

	#[must_use]
	pub fn link_url_utf8(&self, row: usize, col: usize) -> Option<&str> {
		self.link(row, col).map(|link| link.href.as_str())
	}

	/// Prose-only derived view with decoration and junk lines stripped.
	/// Builds a fresh `String` each call; never mutates the document.
	#[must_use]
	pub fn stripped_text(&self) -> String {
		crate::strip::strip_to_prose(&self.text)
	}
}

/// Builds the grid (C11) from normalized lines, populating the code-point to
/// UTF-8 fidelity map as it copies each row.
pub(crate) fn build_grid(lines: &[String], max_line_len: usize) -> Result<(Grid, HashMap<char, String>), LoadErrorCode> {
	if lines.is_empty() || max_line_len == 0 {
		return Err(LoadErrorCode::EmptyFile);
	}
	if max_line_len > WIDTH_LIMIT as usize {
		return Err(LoadErrorCode::MaximumLineLengthExceeded);
	}
	if lines.len() > LINES_LIMIT as usize {
		return Err(LoadErrorCode::MaximumNumberOfLinesExceeded);
	}
	let mut grid = Grid::new(lines.len(), max_line_len);
	copy_rows(&mut grid, lines);
	let utf8_of_codepoint = build_utf8_map(lines);
	Ok((grid, utf8_of_codepoint))
}

#[cfg(feature = "parallel")]
fn copy_rows(grid: &mut Grid, lines: &[String]) {
	grid.cells.par_chunks_mut(grid.cols).zip(lines.par_iter()).for_each(|(row, line)| {
		for (cell, ch) in row.iter_mut().zip(line.chars()) {
			*cell = ch;
		}
	});
}

#[cfg(not(feature = "parallel"))]
fn copy_rows(grid: &mut Grid, lines: &[String]) {
	for (row_index, line) in lines.iter().enumerate() {
		let row = grid.row_mut(row_index);
		for (cell, ch) in row.iter_mut().zip(line.chars()) {
			*cell = ch;
		}
	}
}

fn build_utf8_map(lines: &[String]) -> HashMap<char, String> {
	let mut map = HashMap::new();
	for line in lines {
		for ch in line.chars() {
			map.entry(ch).or_insert_with(|| ch.to_string());
		}
	}
	map
}
