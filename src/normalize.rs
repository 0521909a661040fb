//! Whitespace normalization: drop carriage returns, expand tabs, collapse
//! non-breaking spaces, and guarantee a terminal newline.

const TAB_WIDTH: usize = 8;

/// Normalizes `text` in place per the non-strict CP437/UTF-8 load path.
/// Skipped entirely for the `CP437_STRICT` charset, which needs the raw
/// bytes preserved for bit-exact round-tripping.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
	let trimmed = text.trim_end();
	let mut out = String::with_capacity(trimmed.len() + 1);
	for ch in trimmed.chars() {
		match ch {
			'\r' => {}
			'\t' => out.extend(std::iter::repeat_n(' ', TAB_WIDTH)),
			'\u{00A0}' => out.push(' '),
			other => out.push(other),
		}
	}
	if !out.ends_with('\n') {
		out.push('\n');
	}
	out
}
