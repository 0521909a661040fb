//! Line splitting and the LF/LF healing heuristic for files that used
//! blank-line-separated paragraphs instead of real line breaks.

/// Splits `text` on `\n`, right-trimming each line. Returns the lines and
/// the maximum line length observed.
#[must_use]
pub fn split_lines(text: &str) -> (Vec<String>, usize) {
	let mut max_len = 0usize;
	let lines: Vec<String> = text
		.split('\n')
		.map(|line| {
			let trimmed = line.trim_end();
			max_len = max_len.max(trimmed.chars().count());
			trimmed.to_string()
		})
		.collect();
	(lines, max_len)
}

/// Detects the "every other line is blank" pattern produced by files that
/// use `\n\n` as their paragraph separator rather than `\r\n`, and removes
/// the spurious blanks. Returns `lines` unchanged if the pattern isn't
/// clearly present.
#[must_use]
pub fn heal_lf_lf(lines: Vec<String>) -> Vec<String> {
	let total = lines.len();
	if total < 4 {
		return lines;
	}
	let mut even_empty = 0usize;
	let mut odd_empty = 0usize;
	for (idx, line) in lines.iter().enumerate() {
		if line.is_empty() {
			if idx % 2 == 0 {
				even_empty += 1;
			} else {
				odd_empty += 1;
			}
		}
	}
	#[allow(clippy::cast_precision_loss)]
	let total_f = total as f64;
	#[allow(clippy::cast_precision_loss)]
	let even_frac = even_empty as f64 / total_f;
	#[allow(clippy::cast_precision_loss)]
	let odd_frac = odd_empty as f64 / total_f;
	let strip_odd = even_frac <= 0.1 && (0.4..=0.6).contains(&odd_frac);
	let strip_even = odd_frac <= 0.1 && (0.4..=0.6).contains(&even_frac);
	if !strip_odd && !strip_even {
		return lines;
	}
	lines
		.into_iter()
		.enumerate()
		.filter(|(idx, line)| {
			let is_noisy_parity = if strip_odd { idx % 2 == 1 } else { idx % 2 == 0 };
			!(is_noisy_parity && line.is_empty())
		})
		.map(|(_, line)| line)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn split_tracks_max_len_and_trims_trailing_whitespace() {
		let (lines, max_len) = split_lines("short\nlonger line here  \n");
		assert_eq!(lines, vec!["short", "longer line here", ""]);
		assert_eq!(max_len, 16);
	}

	#[test]
	fn s4_lf_lf_heal_collapses_alternating_blanks() {
		let mut lines = Vec::new();
		for i in 0..20 {
			lines.push(if i % 2 == 0 { format!("line {i}") } else { String::new() });
		}
		let healed = heal_lf_lf(lines);
		assert_eq!(healed.len(), 10);
		assert!(healed.iter().all(|l| !l.is_empty()));
	}

	#[test]
	fn leaves_normal_text_untouched() {
		let lines = vec!["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()];
		assert_eq!(heal_lf_lf(lines.clone()), lines);
	}

	#[test]
	fn leaves_sparse_blanks_untouched() {
		let lines = vec![
			"a".to_string(),
			"b".to_string(),
			"c".to_string(),
			"d".to_string(),
			String::new(),
			"e".to_string(),
		];
		assert_eq!(heal_lf_lf(lines.clone()), lines);
	}
}
