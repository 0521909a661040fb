//! Public entry points. Orchestrates C3–C12 (SAUCE strip, encoding detect,
//! whitespace/line/wrap normalization or the ANSI art processor, grid build,
//! link extraction) into a single [`Document`].
//!
//! `load_bytes`/`load_file` are the only way to build a `Document`; there is
//! no reload-in-place method, so invariant 6 ("reloading replaces all fields
//! atomically") holds trivially, with nothing partially mutated to observe.

use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::{
	ansi_art, ansi_scrub,
	charset::{self, CharsetPreference},
	document::{Document, SourceCharset, LINES_LIMIT, MAX_FILE_SIZE, WIDTH_LIMIT, build_grid},
	error::LoadErrorCode,
	lines, links, normalize, sauce, wrap,
};

/// Preference plus behavior flags accepted by [`load_bytes`]/[`load_file`].
/// A plain value type: the load pipeline is a pure function of bytes plus
/// options, with no config file of its own.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
	pub source_charset: CharsetPreference,
	pub line_wrap_enabled: bool,
}

impl Default for LoadOptions {
	fn default() -> Self {
		Self { source_charset: CharsetPreference::Auto, line_wrap_enabled: true }
	}
}

/// Loads an in-memory byte buffer. `ext` is the filename extension,
/// lowercase and without the leading dot (drives the `.nfo`/`.diz`-gated
/// UTF-8 attempt and ANSI content sniffing); pass `""` when unknown.
///
/// Never panics and never returns `Err`: failures are captured on the
/// returned document's `last_error`, leaving `text`/`grid`/`links`/
/// `color_map` empty but valid.
#[must_use]
pub fn load_bytes(data: &[u8], ext: &str, options: LoadOptions) -> Document {
	if data.len() > MAX_FILE_SIZE {
		return Document::with_error(
			LoadErrorCode::SizeExceedsLimit,
			format!("{} bytes exceeds the {MAX_FILE_SIZE}-byte limit", data.len()),
		);
	}
	match load_inner(data, ext, options) {
		Ok(doc) => doc,
		Err(code) => Document::with_error(code, default_description(code)),
	}
}

/// Loads a file from disk. `fs::read` collapses "couldn't open" and
/// "mid-file read error" into one failure mode, so both map to
/// [`LoadErrorCode::UnableToOpenPhysical`]; only the preceding `fs::metadata`
/// call distinguishes [`LoadErrorCode::FailedToDetermineSize`].
#[must_use]
pub fn load_file(path: impl AsRef<Path>, options: LoadOptions) -> Document {
	let path = path.as_ref();
	let metadata = match fs::metadata(path).with_context(|| format!("statting {}", path.display())) {
		Ok(metadata) => metadata,
		Err(err) => return Document::with_error(LoadErrorCode::FailedToDetermineSize, err.to_string()),
	};
	if metadata.len() as usize > MAX_FILE_SIZE {
		return Document::with_error(
			LoadErrorCode::SizeExceedsLimit,
			format!("{} bytes exceeds the {MAX_FILE_SIZE}-byte limit", metadata.len()),
		);
	}
	let data = match fs::read(path).with_context(|| format!("reading {}", path.display())) {
		Ok(data) => data,
		Err(err) => return Document::with_error(LoadErrorCode::UnableToOpenPhysical, err.to_string()),
	};
	let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
	load_bytes(&data, &ext, options)
}

fn default_description(code: LoadErrorCode) -> &'static str {
	match code {
		LoadErrorCode::NoError => "",
		LoadErrorCode::UnableToOpenPhysical => "could not open or read the file",
		LoadErrorCode::FailedToDetermineSize => "could not stat the file",
		LoadErrorCode::SizeExceedsLimit => "file too large",
		LoadErrorCode::Ferror => "read error",
		LoadErrorCode::EncodingProblem => "no decoder accepted this file",
		LoadErrorCode::UnrecognizedFileFormat => "file looks like binary data, not text",
		LoadErrorCode::SauceInternal => "malformed SAUCE record",
		LoadErrorCode::AnsiInternal => "ANSI art processor rejected this input",
		LoadErrorCode::EmptyFile => "no usable lines after normalization",
		LoadErrorCode::MaximumLineLengthExceeded => "a line exceeds the width limit",
		LoadErrorCode::MaximumNumberOfLinesExceeded => "too many lines",
	}
}

fn load_inner(data: &[u8], ext: &str, options: LoadOptions) -> Result<Document, LoadErrorCode> {
	let (body, sauce_info) = sauce::strip_sauce(data)?;
	let decoded = charset::decode(body, options.source_charset, ext)?;
	let is_ansi = sauce_info.is_ansi || decoded.ansi_detected;

	let mut doc = Document::default();
	doc.set_source_charset(decoded.charset);
	doc.set_line_wrap_enabled(options.line_wrap_enabled);
	doc.set_ansi_hints(is_ansi, sauce_info.ansi_hint_width, sauce_info.ansi_hint_height);

	if is_ansi {
		return load_ansi_art(doc, &decoded.text, sauce_info.ansi_hint_width);
	}
	load_plain_text(doc, decoded.text, decoded.charset == SourceCharset::Cp437Strict, options.line_wrap_enabled)
}

fn load_ansi_art(mut doc: Document, raw_wide: &str, hint_width: Option<u32>) -> Result<Document, LoadErrorCode> {
	let output = ansi_art::run(raw_wide, WIDTH_LIMIT, LINES_LIMIT, hint_width)?;
	let (grid, utf8_of_codepoint) = build_grid(&output.lines, output.max_line_length)?;
	doc.set_text(output.lines.join("\n"));
	doc.set_grid(grid, utf8_of_codepoint);
	doc.set_color_map(Some(output.color_map));
	doc.set_links(links::extract_links(&output.lines));
	Ok(doc)
}

fn load_plain_text(mut doc: Document, raw_text: String, strict: bool, wrap_enabled: bool) -> Result<Document, LoadErrorCode> {
	let mut text = raw_text;
	if !strict {
		text = normalize::normalize_whitespace(&text);
		text = ansi_scrub::scrub(&text);
	}
	let ends_with_newline = text.ends_with('\n');
	let (mut line_list, _) = lines::split_lines(&text);
	if ends_with_newline && line_list.last().is_some_and(String::is_empty) {
		line_list.pop();
	}
	if !strict {
		line_list = lines::heal_lf_lf(line_list);
	}
	if wrap_enabled {
		line_list = wrap::wrap_lines(line_list);
	}
	let max_len = line_list.iter().map(|line| line.chars().count()).max().unwrap_or(0);

	let rebuilt = line_list.join("\n");
	doc.set_text(if strict { rebuilt } else { format!("{rebuilt}\n") });
	let (grid, utf8_of_codepoint) = build_grid(&line_list, max_len)?;
	doc.set_grid(grid, utf8_of_codepoint);
	doc.set_links(links::extract_links(&line_list));
	Ok(doc)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn s1_sauce_strip_and_ansi_hint() {
		let mut data = b"HELLO\n".to_vec();
		data.push(0x1A);
		let mut record = vec![0u8; 128];
		record[0..5].copy_from_slice(b"SAUCE");
		record[5..7].copy_from_slice(b"00");
		record[94] = 1; // CHARACTER
		record[95] = 0; // ASCII
		record[96..98].copy_from_slice(&80u16.to_le_bytes());
		record[98..100].copy_from_slice(&1u16.to_le_bytes());
		data.extend(record);
		let doc = load_bytes(&data, "nfo", LoadOptions::default());
		assert!(doc.last_error().code.is_success());
		assert!(doc.is_ansi());
		assert_eq!(doc.ansi_hint_width(), Some(80));
		assert_eq!(doc.grid_height(), 1);
		assert_eq!(doc.grid_width(), 5);
		assert_eq!(doc.text_utf8(), "HELLO\n");
	}

	#[test]
	fn s2_utf8_bom_decodes_and_tags_sig() {
		let data = [0xEF, 0xBB, 0xBF, b'H', b'i', b'\n'];
		let doc = load_bytes(&data, "nfo", LoadOptions::default());
		assert_eq!(doc.source_charset(), SourceCharset::Utf8Sig);
		assert_eq!(doc.grid_char(0, 0), 'H');
		assert_eq!(doc.grid_char(0, 1), 'i');
	}

	#[test]
	fn s4_lf_lf_heal_collapses_to_ten_rows() {
		let mut text = String::new();
		for i in 0..20 {
			if i % 2 == 0 {
				text.push_str(&format!("line {i}"));
			}
			text.push('\n');
		}
		let doc = load_bytes(text.as_bytes(), "nfo", LoadOptions::default());
		assert!(doc.last_error().code.is_success());
		assert_eq!(doc.grid_height(), 10);
	}

	#[test]
	fn s5_inline_cursor_forward_expands_to_spaces() {
		let data = "A\u{2190}[5CB\n".as_bytes();
		let doc = load_bytes(data, "nfo", LoadOptions::default());
		assert_eq!(doc.text_utf8(), "A     B\n");
	}

	#[test]
	fn s6_long_line_wraps_when_enabled() {
		let line = "word ".repeat(30);
		let doc = load_bytes(line.trim_end().as_bytes(), "nfo", LoadOptions::default());
		assert!(doc.grid_height() >= 2);
		assert!(doc.grid_width() <= 100);
	}

	#[test]
	fn s6_long_line_untouched_when_wrap_disabled() {
		let line = "word ".repeat(30);
		let line = line.trim_end();
		let options = LoadOptions { line_wrap_enabled: false, ..LoadOptions::default() };
		let doc = load_bytes(line.as_bytes(), "nfo", options);
		assert_eq!(doc.grid_height(), 1);
	}

	#[test]
	fn s7_hyperlink_continuation_concatenates_href() {
		let data = b"http://example.com/\npath\n";
		let doc = load_bytes(data, "nfo", LoadOptions::default());
		let first = doc.link(0, 0).unwrap();
		let second = doc.link(1, 0).unwrap();
		assert_eq!(first.link_id, second.link_id);
		assert_eq!(first.href, "http://example.com/path");
	}

	#[test]
	fn empty_input_is_empty_file_error() {
		let doc = load_bytes(b"", "nfo", LoadOptions::default());
		assert_eq!(doc.last_error().code, LoadErrorCode::EmptyFile);
		assert_eq!(doc.grid_width(), 0);
		assert_eq!(doc.grid_height(), 0);
	}

	#[test]
	fn oversized_input_is_size_exceeds_limit() {
		let data = vec![b'a'; MAX_FILE_SIZE + 1];
		let doc = load_bytes(&data, "nfo", LoadOptions::default());
		assert_eq!(doc.last_error().code, LoadErrorCode::SizeExceedsLimit);
	}

	#[test]
	fn nonexistent_file_is_failed_to_determine_size() {
		let doc = load_file("/nonexistent/path/to/file.nfo", LoadOptions::default());
		assert_eq!(doc.last_error().code, LoadErrorCode::FailedToDetermineSize);
	}

	#[test]
	fn reload_of_own_utf8_export_reproduces_grid() {
		let original = load_bytes(b"HELLO\nWORLD\n", "nfo", LoadOptions::default());
		let exported = crate::export::export_utf8(&original, false);
		let reloaded = load_bytes(&exported, "nfo", LoadOptions::default());
		assert_eq!(reloaded.grid_width(), original.grid_width());
		assert_eq!(reloaded.grid_height(), original.grid_height());
		for row in 0..original.grid_height() {
			for col in 0..original.grid_width() {
				assert_eq!(reloaded.grid_char(row, col), original.grid_char(row, col));
			}
		}
	}

	#[test]
	fn plain_ansi_art_produces_color_map() {
		let data = b"\x1b[31mred\x1b[0m\n";
		let doc = load_bytes(data, "ans", LoadOptions::default());
		assert!(doc.is_ansi());
		assert!(doc.color_map().is_some());
	}
}
