//! Serializes a loaded grid back to bytes (C13).
//!
//! Three modes: UTF-8 with BOM, UTF-16LE with BOM, and CP437 (inverse lookup,
//! counting code points it can't represent). Each can optionally substitute
//! the zero cell ("no character here") with a literal space so every row
//! reports equal visible length.

use std::sync::LazyLock;
#[cfg(feature = "parallel")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{cp437, document::Document};

/// Result of a CP437 export: the bytes plus how many code points had no
/// CP437 representation and were replaced with a space.
pub struct Cp437Export {
	pub bytes: Vec<u8>,
	pub chars_not_converted: u32,
}

fn cell_char(doc: &Document, row: usize, col: usize, boxed_whitespace: bool) -> char {
	let ch = doc.grid_char(row, col);
	if ch == '\0' && boxed_whitespace { ' ' } else { ch }
}

/// Exports `doc`'s grid as UTF-8 with a leading BOM.
#[must_use]
pub fn export_utf8(doc: &Document, boxed_whitespace: bool) -> Vec<u8> {
	let mut out = Vec::with_capacity(3 + doc.grid_height() * (doc.grid_width() + 1));
	out.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
	for row in 0..doc.grid_height() {
		for col in 0..doc.grid_width() {
			let ch = cell_char(doc, row, col, boxed_whitespace);
			if ch != '\0' {
				let mut buf = [0u8; 4];
				out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
			}
		}
		if row + 1 < doc.grid_height() {
			out.push(b'\n');
		}
	}
	out
}

/// Exports `doc`'s grid as UTF-16LE with a leading BOM.
#[must_use]
pub fn export_utf16le(doc: &Document, boxed_whitespace: bool) -> Vec<u8> {
	let mut units: Vec<u16> = Vec::with_capacity(1 + doc.grid_height() * (doc.grid_width() + 1));
	units.push(0xFEFF);
	for row in 0..doc.grid_height() {
		for col in 0..doc.grid_width() {
			let ch = cell_char(doc, row, col, boxed_whitespace);
			if ch != '\0' {
				let mut buf = [0u16; 2];
				units.extend_from_slice(ch.encode_utf16(&mut buf));
			}
		}
		if row + 1 < doc.grid_height() {
			units.push(u16::from(b'\n'));
		}
	}
	let mut bytes = Vec::with_capacity(units.len() * 2);
	for unit in units {
		bytes.extend_from_slice(&unit.to_le_bytes());
	}
	bytes
}

static INVERSE_HIGH_BIT: LazyLock<std::collections::HashMap<char, u8>> = LazyLock::new(|| {
	let mut map = std::collections::HashMap::new();
	for byte in cp437::HIGH_BIT_LOW..=0xFF {
		map.entry(cp437::high_bit(byte)).or_insert(byte);
	}
	map
});

fn cp437_byte_for(ch: char) -> Option<u8> {
	match ch {
		'\n' => Some(b'\n'),
		'\r' => Some(b'\r'),
		c if (0x20..=0x7E).contains(&(c as u32)) => u8::try_from(c as u32).ok(),
		c => INVERSE_HIGH_BIT.get(&c).copied(),
	}
}

/// Encodes one row of the grid to CP437 bytes, returning the bytes and how
/// many cells had no representation. Independent per row: this is the unit
/// of work the `parallel` feature fans out across rows.
fn encode_row(doc: &Document, row: usize, boxed_whitespace: bool) -> (Vec<u8>, u32) {
	let mut bytes = Vec::with_capacity(doc.grid_width());
	let mut chars_not_converted = 0u32;
	for col in 0..doc.grid_width() {
		let ch = cell_char(doc, row, col, boxed_whitespace);
		if ch == '\0' {
			continue;
		}
		match cp437_byte_for(ch) {
			Some(byte) => bytes.push(byte),
			None => {
				chars_not_converted += 1;
				bytes.push(b' ');
			}
		}
	}
	(bytes, chars_not_converted)
}

/// Exports `doc`'s grid as CP437, tracking code points with no CP437
/// representation (emitted as a space). Row encoding has no loop-carried
/// dependency, so the `parallel` feature fans it out across rows with
/// `rayon`; `chars_not_converted` accumulates through an atomic counter so
/// serial and parallel builds produce byte-identical output.
#[must_use]
pub fn export_cp437(doc: &Document, boxed_whitespace: bool) -> Cp437Export {
	#[cfg(feature = "parallel")]
	{
		let total_not_converted = AtomicU32::new(0);
		let rows: Vec<Vec<u8>> = (0..doc.grid_height())
			.into_par_iter()
			.map(|row| {
				let (row_bytes, not_converted) = encode_row(doc, row, boxed_whitespace);
				total_not_converted.fetch_add(not_converted, Ordering::Relaxed);
				row_bytes
			})
			.collect();
		Cp437Export { bytes: rows.join(&b'\n'), chars_not_converted: total_not_converted.load(Ordering::Relaxed) }
	}
	#[cfg(not(feature = "parallel"))]
	{
		let mut bytes = Vec::with_capacity(doc.grid_height() * (doc.grid_width() + 1));
		let mut chars_not_converted = 0u32;
		for row in 0..doc.grid_height() {
			let (row_bytes, not_converted) = encode_row(doc, row, boxed_whitespace);
			bytes.extend_from_slice(&row_bytes);
			chars_not_converted += not_converted;
			if row + 1 < doc.grid_height() {
				bytes.push(b'\n');
			}
		}
		Cp437Export { bytes, chars_not_converted }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::document::build_grid;

	fn doc_from(lines: &[&str]) -> Document {
		let owned: Vec<String> = lines.iter().map(|s| (*s).to_string()).collect();
		let max_len = owned.iter().map(|l| l.chars().count()).max().unwrap_or(0);
		let (grid, map) = build_grid(&owned, max_len).unwrap();
		let mut doc = Document::default();
		doc.set_grid_for_test(grid, map);
		doc
	}

	#[test]
	fn utf8_export_starts_with_bom() {
		let doc = doc_from(&["hi"]);
		let bytes = export_utf8(&doc, false);
		assert_eq!(&bytes[0..3], &[0xEF, 0xBB, 0xBF]);
		assert_eq!(&bytes[3..], b"hi");
	}

	#[test]
	fn utf16le_export_starts_with_bom() {
		let doc = doc_from(&["A"]);
		let bytes = export_utf16le(&doc, false);
		assert_eq!(&bytes[0..2], &[0xFF, 0xFE]);
		assert_eq!(&bytes[2..4], &[b'A', 0x00]);
	}

	#[test]
	fn cp437_export_roundtrips_block_glyph() {
		let doc = doc_from(&["\u{2588}\u{2588}"]);
		let export = export_cp437(&doc, false);
		assert_eq!(export.bytes, vec![0xDB, 0xDB]);
		assert_eq!(export.chars_not_converted, 0);
	}

	#[test]
	fn cp437_export_counts_unrepresentable_chars() {
		let doc = doc_from(&["\u{1F600}"]);
		let export = export_cp437(&doc, false);
		assert_eq!(export.chars_not_converted, 1);
		assert_eq!(export.bytes, vec![b' ']);
	}

	#[test]
	fn boxed_whitespace_fills_zero_cells() {
		let doc = doc_from(&["hi", "h"]);
		let bytes = export_utf8(&doc, true);
		assert_eq!(&bytes[3..], b"hi\nh ");
	}
}
