//! Full CSI state machine turning ANSI-art bytes into a colored grid.
//!
//! The wider pipeline treats this as the external "ANSI art processor"
//! collaborator described by the load pipeline's contract
//! (`Parse` → `Process` → `lines`/`max_line_length`/color map), but this
//! crate is the whole system, so it has to be the one implementing both
//! ends of that contract.

use crate::error::LoadErrorCode;

const DEFAULT_WIDTH: usize = 80;

/// One cell's SGR-derived appearance. `None` means "use the terminal
/// default" for that channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorCell {
	pub fg: Option<u8>,
	pub bg: Option<u8>,
	pub bold: bool,
	pub blink: bool,
	pub underline: bool,
	pub reverse: bool,
}

/// A `rows x cols` grid of [`ColorCell`], index-aligned with the document's
/// code-point grid. Present only when the document `is_ansi`.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
	rows: usize,
	cols: usize,
	cells: Vec<ColorCell>,
}

impl ColorMap {
	#[must_use]
	pub const fn rows(&self) -> usize {
		self.rows
	}

	#[must_use]
	pub const fn cols(&self) -> usize {
		self.cols
	}

	#[must_use]
	pub fn cell_at(&self, row: usize, col: usize) -> ColorCell {
		if row >= self.rows || col >= self.cols {
			return ColorCell::default();
		}
		self.cells[row * self.cols + col]
	}
}

/// Successful output of the ANSI art pipeline.
pub struct AnsiArtOutput {
	pub lines: Vec<String>,
	pub max_line_length: usize,
	pub color_map: ColorMap,
}

#[derive(Default)]
struct Cursor {
	row: usize,
	col: usize,
}

/// Holds the in-progress canvas across `parse`/`process`, mirroring the
/// two-step contract the rest of the pipeline expects from an ANSI art
/// collaborator.
pub struct AnsiArtProcessor {
	width_limit: usize,
	lines_limit: usize,
	width: usize,
	raw: Vec<char>,
	canvas: Vec<Vec<char>>,
	colors: Vec<Vec<ColorCell>>,
	cursor: Cursor,
	current: ColorCell,
	parsed: bool,
}

impl AnsiArtProcessor {
	#[must_use]
	pub fn new(width_limit: u32, lines_limit: u32, hint_width: Option<u32>) -> Self {
		let width = hint_width.map_or(DEFAULT_WIDTH, |w| w as usize).clamp(1, width_limit as usize);
		Self {
			width_limit: width_limit as usize,
			lines_limit: lines_limit as usize,
			width,
			raw: Vec::new(),
			canvas: vec![vec!['\0'; width]],
			colors: vec![vec![ColorCell::default(); width]],
			cursor: Cursor::default(),
			current: ColorCell::default(),
			parsed: false,
		}
	}

	/// Stage 1 of the contract: stash the raw wide text for processing.
	pub fn parse(&mut self, raw_wide: &str) -> bool {
		self.raw = raw_wide.chars().collect();
		self.parsed = true;
		true
	}

	/// Stage 2: run the CSI state machine over the parsed text. Returns
	/// `false` on any bound violation, which the caller maps to
	/// `ANSI_INTERNAL`.
	pub fn process(&mut self) -> bool {
		if !self.parsed {
			return false;
		}
		let chars = std::mem::take(&mut self.raw);
		let mut i = 0;
		while i < chars.len() {
			let ch = chars[i];
			// CP437 decoding renders ESC as the arrow glyph (the CSI shows up as
			// "<-[" once decoded); text sourced from UTF-8/UTF-16 still carries a
			// literal ESC. Accept either so the processor works regardless of
			// which decoder produced the wide text it was handed.
			let csi_len = if ch == '\u{001B}' && chars.get(i + 1) == Some(&'[') {
				2
			} else if ch == '\u{2190}' && chars.get(i + 1) == Some(&'[') {
				2
			} else {
				0
			};
			if csi_len > 0 {
				match parse_csi(&chars, i + csi_len) {
					Some((params, final_char, end)) => {
						if !self.apply_csi(&params, final_char) {
							return false;
						}
						i = end;
						continue;
					}
					None => {
						i += 1;
						continue;
					}
				}
			}
			if !self.put_char(ch) {
				return false;
			}
			i += 1;
		}
		true
	}

	fn ensure_row(&mut self, row: usize) -> bool {
		if row >= self.lines_limit {
			return false;
		}
		while self.canvas.len() <= row {
			self.canvas.push(vec!['\0'; self.width]);
			self.colors.push(vec![ColorCell::default(); self.width]);
		}
		true
	}

	fn put_char(&mut self, ch: char) -> bool {
		match ch {
			'\n' => {
				self.cursor.row += 1;
				self.cursor.col = 0;
				self.ensure_row(self.cursor.row)
			}
			'\r' => {
				self.cursor.col = 0;
				true
			}
			_ => {
				if self.cursor.col >= self.width {
					self.cursor.col = 0;
					self.cursor.row += 1;
				}
				if !self.ensure_row(self.cursor.row) {
					return false;
				}
				self.canvas[self.cursor.row][self.cursor.col] = ch;
				self.colors[self.cursor.row][self.cursor.col] = self.current;
				self.cursor.col += 1;
				true
			}
		}
	}

	fn apply_csi(&mut self, params: &[u32], final_char: char) -> bool {
		let p = |idx: usize, default: u32| params.get(idx).copied().unwrap_or(default);
		match final_char {
			'A' => self.cursor.row = self.cursor.row.saturating_sub(p(0, 1).max(1) as usize),
			'B' => self.cursor.row += p(0, 1).max(1) as usize,
			'C' => self.cursor.col = (self.cursor.col + p(0, 1).max(1) as usize).min(self.width_limit),
			'D' => self.cursor.col = self.cursor.col.saturating_sub(p(0, 1).max(1) as usize),
			'H' | 'f' => {
				self.cursor.row = p(0, 1).saturating_sub(1) as usize;
				self.cursor.col = p(1, 1).saturating_sub(1) as usize;
			}
			'J' | 'K' => {}
			'm' => self.apply_sgr(params),
			_ => {}
		}
		if !self.ensure_row(self.cursor.row) {
			return false;
		}
		if self.cursor.col >= self.width_limit {
			return false;
		}
		true
	}

	fn apply_sgr(&mut self, params: &[u32]) {
		if params.is_empty() {
			self.current = ColorCell::default();
			return;
		}
		for &code in params {
			match code {
				0 => self.current = ColorCell::default(),
				1 => self.current.bold = true,
				5 => self.current.blink = true,
				4 => self.current.underline = true,
				7 => self.current.reverse = true,
				22 => self.current.bold = false,
				25 => self.current.blink = false,
				27 => self.current.reverse = false,
				30..=37 => self.current.fg = Some(u8::try_from(code - 30).unwrap_or(0)),
				39 => self.current.fg = None,
				40..=47 => self.current.bg = Some(u8::try_from(code - 40).unwrap_or(0)),
				49 => self.current.bg = None,
				90..=97 => self.current.fg = Some(u8::try_from(code - 90 + 8).unwrap_or(0)),
				100..=107 => self.current.bg = Some(u8::try_from(code - 100 + 8).unwrap_or(0)),
				_ => {}
			}
		}
	}

	/// Consumes the processor, producing the final lines, reflowed plain
	/// text, and color map.
	#[must_use]
	pub fn into_output(self) -> AnsiArtOutput {
		let max_line_length = self.canvas.iter().map(|row| last_non_zero(row)).max().unwrap_or(0);
		let lines: Vec<String> = self.canvas.iter().map(|row| row[..max_line_length.max(1).min(row.len())].iter().map(|&c| if c == '\0' { ' ' } else { c }).collect()).collect();
		let rows = self.canvas.len();
		let cols = max_line_length.max(1);
		let mut cells = Vec::with_capacity(rows * cols);
		for row in &self.colors {
			for col_idx in 0..cols {
				cells.push(row.get(col_idx).copied().unwrap_or_default());
			}
		}
		AnsiArtOutput { lines, max_line_length, color_map: ColorMap { rows, cols, cells } }
	}
}

fn last_non_zero(row: &[char]) -> usize {
	row.iter().rposition(|&c| c != '\0').map_or(0, |pos| pos + 1)
}

fn parse_csi(chars: &[char], start: usize) -> Option<(Vec<u32>, char, usize)> {
	let mut pos = start;
	while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == ';') {
		pos += 1;
	}
	let final_char = *chars.get(pos)?;
	if !final_char.is_ascii_alphabetic() {
		return None;
	}
	let params: Vec<u32> =
		chars[start..pos].iter().collect::<String>().split(';').filter_map(|p| p.parse().ok()).collect();
	Some((params, final_char, pos + 1))
}

/// Runs the full `Parse` → `Process` contract over `raw_wide`, returning
/// `ANSI_INTERNAL` on any bound violation.
pub fn run(
	raw_wide: &str,
	width_limit: u32,
	lines_limit: u32,
	hint_width: Option<u32>,
) -> Result<AnsiArtOutput, LoadErrorCode> {
	let mut processor = AnsiArtProcessor::new(width_limit, lines_limit, hint_width);
	if !processor.parse(raw_wide) {
		return Err(LoadErrorCode::AnsiInternal);
	}
	if !processor.process() {
		return Err(LoadErrorCode::AnsiInternal);
	}
	Ok(processor.into_output())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn plain_text_with_no_escapes_renders_verbatim() {
		let output = run("hello", 4000, 50_000, None).unwrap();
		assert_eq!(output.lines[0].trim_end(), "hello");
	}

	#[test]
	fn sgr_sets_foreground_color() {
		let output = run("\u{1B}[31mred\u{1B}[0m", 4000, 50_000, None).unwrap();
		let cell = output.color_map.cell_at(0, 0);
		assert_eq!(cell.fg, Some(1));
	}

	#[test]
	fn cursor_forward_skips_cells() {
		let output = run("A\u{1B}[3CB", 4000, 50_000, None).unwrap();
		assert_eq!(output.lines[0].chars().nth(0), Some('A'));
		assert_eq!(output.lines[0].chars().nth(4), Some('B'));
	}

	#[test]
	fn newline_advances_row() {
		let output = run("A\nB", 4000, 50_000, None).unwrap();
		assert_eq!(output.lines.len(), 2);
		assert_eq!(output.lines[1].trim_end(), "B");
	}

	#[test]
	fn arrow_form_csi_from_cp437_decode_sets_colors() {
		let output = run("\u{2190}[31mred\u{2190}[0m", 4000, 50_000, None).unwrap();
		assert_eq!(output.lines[0].trim_end(), "red");
		assert_eq!(output.color_map.cell_at(0, 0).fg, Some(1));
	}

	#[test]
	fn exceeding_lines_limit_is_ansi_internal() {
		let raw = "\n".repeat(10);
		let err = run(&raw, 4000, 5, None).unwrap_err();
		assert_eq!(err, LoadErrorCode::AnsiInternal);
	}
}
