//! Encoding detector and double-encode recovery (C4, C5).
//!
//! Given a preference, runs the ordered cascade of decode attempts described
//! by the load pipeline: UTF-8-signature → UTF-16LE → UTF-16BE → UTF-8 (only
//! for `.nfo`/`.diz`) → CP437. A concrete preference instead calls a single
//! attempt directly, bypassing the cascade and its heuristics.

use std::sync::LazyLock;

use encoding_rs::{UTF_16BE, UTF_16LE, WINDOWS_1252};
use regex::Regex;

use crate::{
	cp437,
	document::{Approach, SourceCharset},
	error::LoadErrorCode,
	utf8util,
};

/// Why a CP437 decode attempt failed. `Unrecognized` corresponds to the
/// binary-short-file heuristic (spec Open Question: log when it fires, since
/// the pattern it matches on is suspiciously narrow); `Other` is every other
/// failure (currently only the strict decoder's embedded-NUL rejection).
enum Cp437Fail {
	Unrecognized,
	Other,
}

static BINARY_SHORT_FILE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\s+[A-Z][a-z]+\s+$").expect("static pattern is valid"));
static ANSI_CSI_SHAPE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\u{2190}\[[0-9;]+m").expect("static pattern is valid"));

/// Requested source charset. `Auto` runs the full detection cascade;
/// anything else calls one attempt directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharsetPreference {
	#[default]
	Auto,
	Utf16,
	Utf8Sig,
	Utf8,
	Cp437,
	Cp437Strict,
	Windows1252,
	Cp437InUtf8,
	Cp437InUtf16,
	Cp437InCp437,
}

/// Result of a successful decode: the wide text, the tag it was decoded
/// under, and whether the CP437 path's content-based ANSI detector fired.
pub struct Decoded {
	pub text: String,
	pub charset: SourceCharset,
	pub ansi_detected: bool,
}

/// Runs the detection cascade (or a single forced attempt) over `data`.
/// `ext` is the file extension, lowercase and without the leading dot, used
/// by the `.nfo`/`.diz`-gated UTF-8 attempt and by ANSI content sniffing.
pub fn decode(data: &[u8], preference: CharsetPreference, ext: &str) -> Result<Decoded, LoadErrorCode> {
	match preference {
		CharsetPreference::Auto => decode_auto(data, ext),
		CharsetPreference::Utf16 => {
			try_utf16le(data, Approach::False, ext).or_else(|| try_utf16be(data, ext)).ok_or(LoadErrorCode::EncodingProblem)
		}
		CharsetPreference::Utf8Sig => try_utf8_signature(data, ext).ok_or(LoadErrorCode::EncodingProblem),
		CharsetPreference::Utf8 => try_utf8(data, Approach::False, ext, true).ok_or(LoadErrorCode::EncodingProblem),
		CharsetPreference::Cp437 => try_cp437(data, Approach::False, ext, false).map_err(cp437_fail_to_code),
		CharsetPreference::Cp437Strict => {
			try_cp437(data, Approach::False, ext, true).map_err(cp437_fail_to_code)
		}
		CharsetPreference::Windows1252 => Ok(try_cp252(data)),
		CharsetPreference::Cp437InUtf8 => try_utf8(data, Approach::Force, ext, true).ok_or(LoadErrorCode::EncodingProblem),
		CharsetPreference::Cp437InUtf16 => {
			try_utf16le(data, Approach::Force, ext).ok_or(LoadErrorCode::EncodingProblem)
		}
		CharsetPreference::Cp437InCp437 => {
			try_cp437(data, Approach::Force, ext, false).map_err(cp437_fail_to_code)
		}
	}
}

fn cp437_fail_to_code(fail: Cp437Fail) -> LoadErrorCode {
	match fail {
		Cp437Fail::Unrecognized => LoadErrorCode::UnrecognizedFileFormat,
		Cp437Fail::Other => LoadErrorCode::EncodingProblem,
	}
}

fn decode_auto(data: &[u8], ext: &str) -> Result<Decoded, LoadErrorCode> {
	if let Some(result) = try_utf8_signature(data, ext) {
		return Ok(result);
	}
	if let Some(result) = try_utf16le(data, Approach::Try, ext) {
		return Ok(result);
	}
	if let Some(result) = try_utf16be(data, ext) {
		return Ok(result);
	}
	if matches!(ext, "nfo" | "diz") {
		if let Some(result) = try_utf8(data, Approach::Try, ext, false) {
			return Ok(result);
		}
	}
	try_cp437(data, Approach::Try, ext, false).map_err(cp437_fail_to_code)
}

fn try_utf8_signature(data: &[u8], ext: &str) -> Option<Decoded> {
	if data.len() < 3 || data[0..3] != [0xEF, 0xBB, 0xBF] {
		return None;
	}
	let mut decoded = try_utf8(&data[3..], Approach::Try, ext, true)?;
	if decoded.charset == SourceCharset::Utf8 {
		decoded.charset = SourceCharset::Utf8Sig;
	}
	Some(decoded)
}

fn try_utf8(data: &[u8], approach: Approach, ext: &str, force_attempt: bool) -> Option<Decoded> {
	if !force_attempt && !matches!(ext, "nfo" | "diz") {
		return None;
	}
	if !utf8util::validate(data) {
		return None;
	}
	let text = String::from_utf8_lossy(data).into_owned();
	let force = approach == Approach::Force;
	if force || (approach == Approach::Try && double_encode_heuristic_utf8(&text)) {
		let narrowed = utf8util::to_latin9(&text);
		if let Ok(inner) = try_cp437(&narrowed, Approach::Try, ext, false) {
			let charset = if inner.charset == SourceCharset::Cp437InCp437 {
				SourceCharset::Cp437InCp437InUtf8
			} else {
				SourceCharset::Cp437InUtf8
			};
			return Some(Decoded { text: inner.text, charset, ansi_detected: inner.ansi_detected });
		}
	}
	Some(Decoded { text, charset: SourceCharset::Utf8, ansi_detected: false })
}

fn double_encode_heuristic_utf8(text: &str) -> bool {
	let has = |s: &str| text.contains(s);
	let primary = (has("\u{00df}") || has("\u{00cd}"))
		&& (has("\u{00dc}\u{00dc}") || has("\u{00db}\u{00db}"))
		&& (has("\u{00b1}") || has("\u{00b2}"));
	let secondary = has("\u{009a}\u{009a}") && has("\u{00e1}\u{00e1}");
	primary || secondary
}

fn double_encode_heuristic_utf16(text: &str) -> bool {
	let has = |s: &str| text.contains(s);
	(has("\u{00df}") || has("\u{00cd}"))
		&& (has("\u{00dc}\u{00dc}") || has("\u{00db}\u{00db}"))
		&& (has("\u{00b1}") || has("\u{00b2}"))
}

fn try_utf16le(data: &[u8], approach: Approach, ext: &str) -> Option<Decoded> {
	if data.len() < 2 || data[0] != 0xFF || data[1] != 0xFE {
		return None;
	}
	let body = &data[2..];
	let (decoded, _, had_errors) = UTF_16LE.decode_without_bom_handling(body);
	if had_errors {
		return None;
	}
	let text = decoded.into_owned();
	if text.contains('\0') {
		return None;
	}
	if spurious_bom(&text, body) {
		return None;
	}
	let force = approach == Approach::Force;
	if force || (approach == Approach::Try && double_encode_heuristic_utf16(&text)) {
		let narrowed = utf8util::to_latin9(&text);
		if let Ok(inner) = try_cp437(&narrowed, Approach::Try, ext, false) {
			return Some(Decoded { text: inner.text, charset: SourceCharset::Cp437InUtf16, ansi_detected: inner.ansi_detected });
		}
	}
	Some(Decoded { text, charset: SourceCharset::Utf16, ansi_detected: false })
}

fn try_utf16be(data: &[u8], _ext: &str) -> Option<Decoded> {
	if data.len() < 2 || data[0] != 0xFE || data[1] != 0xFF {
		return None;
	}
	let body = &data[2..];
	let (decoded, _, had_errors) = UTF_16BE.decode_without_bom_handling(body);
	if had_errors {
		return None;
	}
	let text = decoded.into_owned();
	if text.contains('\0') {
		return None;
	}
	if spurious_bom(&text, body) {
		return None;
	}
	Some(Decoded { text, charset: SourceCharset::Utf16, ansi_detected: false })
}

fn spurious_bom(decoded: &str, raw_body: &[u8]) -> bool {
	let decoded_has_letters = decoded.chars().any(|c| c.is_ascii_alphabetic());
	let raw_has_letters = raw_body.iter().any(u8::is_ascii_alphabetic);
	!decoded_has_letters && raw_has_letters
}

fn try_cp252(data: &[u8]) -> Decoded {
	let (decoded, _, _) = WINDOWS_1252.decode(data);
	Decoded { text: decoded.into_owned(), charset: SourceCharset::Windows1252, ansi_detected: false }
}

fn try_cp437(data: &[u8], approach: Approach, ext: &str, strict: bool) -> Result<Decoded, Cp437Fail> {
	let mut approach = approach;
	let mut data = data;
	let trimmed_end = {
		let mut end = data.len();
		while end > 0 && data[end - 1] == 0 {
			end -= 1;
		}
		end
	};
	data = &data[..trimmed_end];
	if !strict && data.len() >= 3 && data[0..3] == [0xEF, 0xBB, 0xBF] && approach == Approach::Try {
		data = &data[3..];
	}
	if !strict && approach == Approach::Try && data.first() != Some(&0x1B) && has_force_upgrade_signal(data) {
		approach = Approach::Force;
	}
	let force = approach == Approach::Force;
	let has_crlf = data.windows(2).any(|w| w == [b'\r', b'\n']);
	let has_lone_cr = has_lone_cr(data);
	let newline_for_bare_cr = !has_crlf || (has_crlf && has_lone_cr);
	let mut text = String::with_capacity(data.len());
	let mut found_binary = false;
	let mut remapped = false;
	let mut i = 0;
	while i < data.len() {
		let b = data[i];
		if b >= cp437::HIGH_BIT_LOW {
			let mut ch = cp437::high_bit(b);
			if force {
				let cp = ch as u32;
				if (u32::from(cp437::HIGH_BIT_LOW)..=0xFF).contains(&cp) {
					if let Ok(byte_again) = u8::try_from(cp) {
						ch = cp437::high_bit(byte_again);
						remapped = true;
					}
				}
			}
			text.push(ch);
			i += 1;
			continue;
		}
		if strict && b == 0x00 {
			return Err(Cp437Fail::Other);
		}
		if b <= 0x1F {
			if b == 0x00 {
				text.push(' ');
				found_binary = true;
				i += 1;
				continue;
			}
			if b == b'\r' {
				if !strict && data.get(i + 1) == Some(&b'\r') && data.get(i + 2) == Some(&b'\n') {
					text.push(' ');
					i += 3;
					continue;
				}
				if data.get(i + 1) == Some(&b'\n') {
					text.push('\r');
					i += 1;
					continue;
				}
				if !strict && newline_for_bare_cr {
					text.push('\n');
				} else {
					text.push(if strict { cp437::control_strict(b) } else { cp437::control_lenient(b) });
				}
				i += 1;
				continue;
			}
			text.push(if strict { cp437::control_strict(b) } else { cp437::control_lenient(b) });
			i += 1;
			continue;
		}
		if force && matches!(b, 0x55 | 0x59 | 0x5F) && !adjacent_looks_alnum(data, i) {
			text.push(match b {
				0x55 => '\u{2588}',
				0x59 => '\u{258C}',
				_ => '\u{2590}',
			});
		} else {
			text.push(b as char);
		}
		i += 1;
	}
	let ansi_detected = detect_ansi(&text, ext, false);
	if found_binary && !ansi_detected && BINARY_SHORT_FILE.is_match(&text) {
		tracing::debug!("binary-short-file heuristic rejected CP437 decode (ext={ext:?})");
		return Err(Cp437Fail::Unrecognized);
	}
	let charset = if strict {
		SourceCharset::Cp437Strict
	} else if remapped {
		SourceCharset::Cp437InCp437
	} else {
		SourceCharset::Cp437
	};
	Ok(Decoded { text, charset, ansi_detected })
}

fn has_force_upgrade_signal(data: &[u8]) -> bool {
	data.windows(2).any(|w| w == [0x9A, 0x9A] || w == [0xFD, 0xFD] || w == [0xE1, 0xE1])
}

fn has_lone_cr(data: &[u8]) -> bool {
	data.iter().enumerate().any(|(i, &b)| b == b'\r' && data.get(i + 1) != Some(&b'\n'))
}

fn adjacent_looks_alnum(data: &[u8], pos: usize) -> bool {
	let before = pos.checked_sub(1).and_then(|i| data.get(i));
	let after = data.get(pos + 1);
	before.is_some_and(|b| b.is_ascii_alphanumeric()) || after.is_some_and(|b| b.is_ascii_alphanumeric())
}

/// ANSI content sniffing used by the CP437 decode paths: true if already
/// flagged, or the filename/content combination looks like ANSI art.
#[must_use]
pub fn detect_ansi(text: &str, ext: &str, already_ansi: bool) -> bool {
	if already_ansi {
		return true;
	}
	if ext == "ans" && text.contains("\u{2190}[") {
		return true;
	}
	ext != "nfo" && ANSI_CSI_SHAPE.is_match(text)
}
