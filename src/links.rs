//! Per-line hyperlink detection with cross-line continuation.
//!
//! A URL that gets word-wrapped across two lines (most often because the
//! source text itself split it, not our own wrapper) is represented as two
//! `HyperLink` records sharing one `link_id`; once the continuation resolves,
//! every record in the group is rewritten to carry the fully-concatenated
//! `href`.

use regex::Regex;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?:https?|ftp)://[^\s]+").expect("static URL pattern is valid"));

/// A single hyperlink occurrence. Records sharing `link_id` form a
/// continuation group spanning successive rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperLink {
	pub link_id: u32,
	pub href: String,
	pub row: usize,
	pub col_start: usize,
	pub len: usize,
}

struct OpenGroup {
	id: u32,
	href: String,
	member_indices: Vec<usize>,
}

/// Scans every line for hyperlinks, resolving cross-line continuations.
#[must_use]
pub fn extract_links(lines: &[String]) -> Vec<HyperLink> {
	let mut result: Vec<HyperLink> = Vec::new();
	let mut next_id = 0u32;
	let mut open: Option<OpenGroup> = None;

	for (row, line) in lines.iter().enumerate() {
		let char_len = line.chars().count();
		if let Some(found) = find_scheme_link(line) {
			finalize(&mut open, &mut result);
			let id = next_id;
			next_id += 1;
			let ends_at_line_end = found.col_start + found.len == char_len;
			result.push(HyperLink { link_id: id, href: found.text.clone(), row, col_start: found.col_start, len: found.len });
			open = ends_at_line_end.then(|| OpenGroup { id, href: found.text, member_indices: vec![result.len() - 1] });
			continue;
		}
		if let Some(group) = open.as_mut() {
			if let Some(token) = leading_token(line) {
				group.href.push_str(&token.text);
				let index = result.len();
				result.push(HyperLink {
					link_id: group.id,
					href: String::new(),
					row,
					col_start: token.col_start,
					len: token.len,
				});
				group.member_indices.push(index);
				if token.len != char_len {
					finalize(&mut open, &mut result);
				}
				continue;
			}
		}
		finalize(&mut open, &mut result);
	}
	finalize(&mut open, &mut result);
	result
}

fn finalize(open: &mut Option<OpenGroup>, result: &mut [HyperLink]) {
	if let Some(group) = open.take() {
		for index in group.member_indices {
			result[index].href.clone_from(&group.href);
		}
	}
}

struct Found {
	col_start: usize,
	len: usize,
	text: String,
}

fn find_scheme_link(line: &str) -> Option<Found> {
	let m = URL_PATTERN.find(line)?;
	let col_start = line[..m.start()].chars().count();
	let text = m.as_str().to_string();
	let len = text.chars().count();
	Some(Found { col_start, len, text })
}

/// The leading contiguous non-whitespace run of a line, used as a
/// continuation token when a link ran off the end of the previous line.
fn leading_token(line: &str) -> Option<Found> {
	if line.starts_with(char::is_whitespace) || line.is_empty() {
		return None;
	}
	let text: String = line.chars().take_while(|c| !c.is_whitespace()).collect();
	if text.is_empty() {
		return None;
	}
	let len = text.chars().count();
	Some(Found { col_start: 0, len, text })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn finds_single_line_url() {
		let lines = vec!["see http://example.com/page for details".to_string()];
		let links = extract_links(&lines);
		assert_eq!(links.len(), 1);
		assert_eq!(links[0].href, "http://example.com/page");
		assert_eq!(links[0].row, 0);
	}

	#[test]
	fn s7_continuation_resolves_to_concatenated_href() {
		let lines = vec!["http://example.com/".to_string(), "path".to_string()];
		let links = extract_links(&lines);
		assert_eq!(links.len(), 2);
		assert_eq!(links[0].link_id, links[1].link_id);
		assert_eq!(links[0].href, "http://example.com/path");
		assert_eq!(links[1].href, "http://example.com/path");
	}

	#[test]
	fn blank_line_resets_continuation() {
		let lines = vec!["http://example.com/".to_string(), String::new(), "notapath".to_string()];
		let links = extract_links(&lines);
		assert_eq!(links.len(), 1);
		assert_eq!(links[0].href, "http://example.com/");
	}

	#[test]
	fn no_links_in_plain_text() {
		let lines = vec!["just some prose".to_string()];
		assert!(extract_links(&lines).is_empty());
	}
}
