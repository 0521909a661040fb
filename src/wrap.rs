//! Heuristic long-line word-wrap that refuses to damage ANSI-ish block art.

const MAX_SOFT: usize = 100;
const MAX_HARD: usize = 160;
const EQUAL_RUN_MAX: usize = 3;

const BLOCK_CHARS: &[char] =
	&['\u{2580}', '\u{2584}', '\u{2588}', '\u{258C}', '\u{2590}', '\u{2591}', '\u{2592}', '\u{2593}'];

/// Wraps every line in `lines` that looks like prose rather than art.
#[must_use]
pub fn wrap_lines(lines: Vec<String>) -> Vec<String> {
	lines.into_iter().flat_map(|line| wrap_line(&line)).collect()
}

fn wrap_line(line: &str) -> Vec<String> {
	let chars: Vec<char> = line.chars().collect();
	if chars.len() <= MAX_SOFT {
		return vec![line.to_string()];
	}
	if chars.iter().any(|c| BLOCK_CHARS.contains(c)) {
		return vec![line.to_string()];
	}
	if chars.len() <= MAX_HARD && has_excessive_equal_run(&chars) {
		return vec![line.to_string()];
	}
	let leading_spaces = chars.iter().take_while(|c| **c == ' ').count();
	let indent: Vec<char> = vec![' '; leading_spaces + 2];
	let mut result = Vec::new();
	let mut current = chars;
	let mut first = true;
	loop {
		if current.len() <= MAX_SOFT {
			result.push(current.into_iter().collect());
			break;
		}
		let search_start = if first { 0 } else { indent.len() };
		let window_end = MAX_SOFT.min(current.len());
		let split_at = current[search_start..window_end]
			.iter()
			.rposition(|c| *c == ' ')
			.map(|pos| search_start + pos)
			.filter(|&p| p > search_start)
			.unwrap_or(window_end);
		let rest: Vec<char> = current[split_at..].to_vec();
		let chunk: String = current[..split_at].iter().collect::<String>().trim_end().to_string();
		result.push(chunk);
		let rest_str: String = rest.iter().collect();
		let rest_trimmed = rest_str.trim_start();
		current = indent.iter().copied().chain(rest_trimmed.chars()).collect();
		first = false;
	}
	result
}

fn has_excessive_equal_run(chars: &[char]) -> bool {
	let leading_spaces = chars.iter().take_while(|c| **c == ' ').count();
	let mut prev: Option<char> = None;
	let mut run = 0usize;
	for ch in &chars[leading_spaces..] {
		if *ch == ' ' {
			prev = None;
			run = 0;
			continue;
		}
		if Some(*ch) == prev {
			run += 1;
			if run > EQUAL_RUN_MAX {
				return true;
			}
		} else {
			prev = Some(*ch);
			run = 1;
		}
	}
	false
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn s6_long_line_wraps_with_indent() {
		let line = "word ".repeat(30);
		let line = line.trim_end();
		let wrapped = wrap_line(line);
		assert!(wrapped.len() >= 2);
		assert!(wrapped[0].chars().count() <= MAX_SOFT);
		assert!(wrapped[1].starts_with("  "));
	}

	#[test]
	fn short_lines_are_untouched() {
		assert_eq!(wrap_line("short line"), vec!["short line".to_string()]);
	}

	#[test]
	fn block_art_is_never_wrapped() {
		let line = format!("{}", "\u{2588}".repeat(200));
		assert_eq!(wrap_line(&line), vec![line]);
	}

	#[test]
	fn repeated_separator_characters_are_not_wrapped() {
		let line = "=".repeat(150);
		assert_eq!(wrap_line(&line), vec![line]);
	}

	#[test]
	fn hard_cut_when_no_space_available() {
		let line = "a".repeat(50) + " " + &"b".repeat(150);
		let wrapped = wrap_line(&line);
		assert!(wrapped.len() >= 2);
		assert_eq!(wrapped[0], "a".repeat(50));
	}

	#[test]
	fn preserves_leading_indent_on_first_line() {
		let mut line = "   ".to_string();
		line.push_str(&"word ".repeat(30));
		let wrapped = wrap_line(line.trim_end());
		assert!(wrapped[0].starts_with("   "));
	}
}
