//! Inline ANSI escape handling for text that is not full ANSI art: expands
//! Cursor Forward into spaces and drops other recognized-but-unsupported
//! sequences, leaving anything unrecognized untouched.

const CSI_SINGLE: char = '\u{00A2}';
const CSI_WIDE: char = '\u{2190}';
const MAX_CURSOR_FORWARD: u32 = 1024;

const DROPPED_FINALS: &[char] = &['A', 'B', 'D', 'E', 'F', 'G', 'J', 'K', 'S', 'T', 's', 'u'];

/// Scrubs inline CSI sequences out of `text`.
#[must_use]
pub fn scrub(text: &str) -> String {
	let chars: Vec<char> = text.chars().collect();
	let mut out = String::with_capacity(text.len());
	let mut i = 0;
	while i < chars.len() {
		let ch = chars[i];
		let csi_len = if ch == CSI_SINGLE {
			1
		} else if ch == CSI_WIDE && chars.get(i + 1) == Some(&'[') {
			2
		} else {
			0
		};
		if csi_len == 0 {
			out.push(ch);
			i += 1;
			continue;
		}
		match parse_csi(&chars, i + csi_len) {
			Some((params, final_char, end)) => {
				if final_char == 'C' {
					let n = params.first().copied().unwrap_or(1).clamp(1, MAX_CURSOR_FORWARD);
					for _ in 0..n {
						out.push(' ');
					}
				} else if DROPPED_FINALS.contains(&final_char) {
					// known but unsupported, silently dropped
				} else {
					out.extend(&chars[i..end]);
				}
				i = end;
			}
			None => {
				out.push(ch);
				i += 1;
			}
		}
	}
	out
}

/// Parses `[params]final` starting at `start`. Returns the parsed numeric
/// parameters, the final byte, and the index just past it.
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

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[test]
	fn s5_inline_cursor_forward_emits_spaces() {
		let input = format!("A{CSI_WIDE}[5CB");
		assert_eq!(scrub(&input), "A     B");
	}

	#[test]
	fn cursor_forward_defaults_to_one() {
		let input = format!("A{CSI_WIDE}[CB");
		assert_eq!(scrub(&input), "A B");
	}

	#[test]
	fn cursor_forward_clamps_to_max() {
		let input = format!("{CSI_WIDE}[99999C");
		assert_eq!(scrub(&input).len(), MAX_CURSOR_FORWARD as usize);
	}

	#[rstest]
	#[case('A')]
	#[case('J')]
	#[case('s')]
	fn known_unsupported_finals_are_dropped(#[case] final_char: char) {
		let input = format!("before{CSI_WIDE}[2{final_char}after");
		assert_eq!(scrub(&input), "beforeafter");
	}

	#[test]
	fn unknown_final_passes_through_untouched() {
		let input = format!("x{CSI_WIDE}[31my");
		assert_eq!(scrub(&input), input);
	}

	#[test]
	fn stray_csi_single_without_valid_sequence_is_preserved() {
		let input = format!("a{CSI_SINGLE}b");
		assert_eq!(scrub(&input), input);
	}

	#[test]
	fn stray_csi_wide_without_bracket_is_preserved() {
		let input = format!("a{CSI_WIDE}b");
		assert_eq!(scrub(&input), input);
	}
}
