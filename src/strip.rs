//! Prose-only derived view of a loaded document (C9 supplement).
//!
//! Re-derives a "just the words" rendering by scrubbing decoration down to
//! whitespace, dropping rule/divider/noise lines, and collapsing blank runs.
//! Never touches [`crate::document::Document`]; callers get a fresh `String`.

/// Strips `text` down to its prose content. Safe to call on already
/// normalized document text; produces the same shape regardless of input
/// line-ending style since callers only ever pass `\n`-terminated lines.
#[must_use]
pub fn strip_to_prose(text: &str) -> String {
	let scrubbed: String = text.chars().map(scrub_char).collect();
	let paragraphs: Vec<String> = scrubbed
		.lines()
		.map(str::trim_end)
		.filter(|line| !is_noise_line(line))
		.map(str::to_string)
		.collect();
	collapse_blank_runs(&paragraphs)
}

fn scrub_char(ch: char) -> char {
	if ch.is_ascii() || ch.is_alphanumeric() || ch.is_whitespace() {
		ch
	} else {
		' '
	}
}

fn is_noise_line(line: &str) -> bool {
	let trimmed = line.trim();
	if trimmed.is_empty() {
		return false;
	}
	if trimmed.chars().filter(|c| !c.is_whitespace()).count() <= 3 {
		return true;
	}
	if is_pure_punctuation(trimmed) {
		return true;
	}
	if is_single_repeated_char(trimmed) {
		return true;
	}
	if looks_like_rule(line) {
		return true;
	}
	false
}

fn is_pure_punctuation(trimmed: &str) -> bool {
	!trimmed.is_empty() && trimmed.chars().all(|c| !c.is_alphanumeric())
}

fn is_single_repeated_char(trimmed: &str) -> bool {
	let mut chars = trimmed.chars().filter(|c| !c.is_whitespace());
	let Some(first) = chars.next() else { return false };
	chars.all(|c| c == first)
}

fn looks_like_rule(line: &str) -> bool {
	let chars: Vec<char> = line.chars().collect();
	if chars.is_empty() {
		return false;
	}
	let leading_run = chars.iter().take_while(|c| **c == chars[0] && !c.is_whitespace()).count();
	if leading_run >= 1 && chars.get(leading_run).is_some_and(char::is_ascii_whitespace) {
		let gap = chars[leading_run..].iter().take_while(|c| c.is_whitespace()).count();
		if gap >= 3 && chars.len() > leading_run + gap {
			return true;
		}
	}
	let trailing_divider = chars.iter().rev().take_while(|c| is_divider_punct(**c) || c.is_whitespace()).count();
	trailing_divider >= 3 && chars.iter().rev().nth(trailing_divider).is_some_and(|c| is_divider_punct(*c))
}

fn is_divider_punct(ch: char) -> bool {
	matches!(ch, '-' | '_' | '=' | '*' | '~' | '.' | '#')
}

fn collapse_blank_runs(paragraphs: &[String]) -> String {
	let mut out: Vec<String> = Vec::with_capacity(paragraphs.len());
	let mut blank_run = 0usize;
	for line in paragraphs {
		if line.trim().is_empty() {
			blank_run += 1;
			continue;
		}
		if !out.is_empty() && blank_run > 0 {
			out.push(String::new());
		}
		blank_run = 0;
		out.push(trim_uniform_indent(line));
	}
	out.join("\n")
}

fn trim_uniform_indent(line: &str) -> String {
	line.trim_start().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn drops_short_and_punctuation_lines() {
		let text = "Hi\n---\nA real sentence here.\n###\n";
		let stripped = strip_to_prose(text);
		assert_eq!(stripped, "A real sentence here.");
	}

	#[test]
	fn collapses_multiple_blank_lines_to_one() {
		let text = "First paragraph line one.\n\n\n\nSecond paragraph line one.\n";
		let stripped = strip_to_prose(text);
		assert_eq!(stripped, "First paragraph line one.\n\nSecond paragraph line one.");
	}

	#[test]
	fn non_ascii_decoration_collapses_to_space_not_glue() {
		let text = "Word\u{2588}\u{2588}Word and more words to survive the length gate\n";
		let stripped = strip_to_prose(text);
		assert!(stripped.contains("Word  Word"));
	}

	#[test]
	fn ascii_punctuation_is_preserved() {
		let text = "Word|Word and more words to survive the length gate.\n";
		let stripped = strip_to_prose(text);
		assert!(stripped.contains("Word|Word"));
	}

	#[test]
	fn single_repeated_char_line_is_dropped() {
		let text = "=============\nThis line of prose should survive intact.\n";
		let stripped = strip_to_prose(text);
		assert_eq!(stripped, "This line of prose should survive intact.");
	}

	#[test]
	fn rule_shaped_line_is_dropped() {
		let text = "-   this looks like a divider with trailing text\nA genuine sentence follows here.\n";
		let stripped = strip_to_prose(text);
		assert_eq!(stripped, "A genuine sentence follows here.");
	}
}
