//! Detects and strips a trailing SAUCE metadata record.

use crate::error::LoadErrorCode;

const RECORD_SIZE: usize = 128;
const ID_VERSION: &[u8] = b"SAUCE00";

/// What the SAUCE reader learned about the file, beyond the bytes it
/// stripped off the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SauceInfo {
	pub is_ansi: bool,
	pub ansi_hint_width: Option<u32>,
	pub ansi_hint_height: Option<u32>,
}

/// Strips a trailing SAUCE record (and its optional comment block) from
/// `data`, returning the remaining content bytes and whatever hints the
/// record carried. Returns `Ok` with `SauceInfo::default()` unchanged data
/// when no record is present; `Err` only for a record that matched the
/// `SAUCE` signature but failed validation.
pub fn strip_sauce(data: &[u8]) -> Result<(&[u8], SauceInfo), LoadErrorCode> {
	if data.len() <= RECORD_SIZE {
		return Ok((data, SauceInfo::default()));
	}
	let tail_start = data.len() - RECORD_SIZE;
	let tail = &data[tail_start..];
	let (record_start, complete) = if tail.starts_with(b"SAUCE") {
		(tail_start, true)
	} else if let Some(offset) = find_subslice(tail, ID_VERSION) {
		(tail_start + offset, false)
	} else {
		return Ok((data, SauceInfo::default()));
	};
	let record = &data[record_start..];
	let record_len = record.len();
	if &record[5..7.min(record_len)] != b"00" {
		return Err(LoadErrorCode::SauceInternal);
	}
	let field_u8 = |offset: usize| -> u8 { record.get(offset).copied().unwrap_or(0) };
	let field_u16 = |offset: usize| -> u16 {
		match (record.get(offset), record.get(offset + 1)) {
			(Some(&lo), Some(&hi)) => u16::from_le_bytes([lo, hi]),
			_ => 0,
		}
	};
	let data_type = field_u8(94);
	let file_type = field_u8(95);
	let t_info1 = field_u16(96);
	let t_info2 = field_u16(98);
	let comments = field_u8(104);
	let is_ansi = if !complete && data_type == 0 && file_type == 0 {
		true
	} else if complete && data_type == 1 && file_type == 0x20 && comments == 0x20 {
		false
	} else if data_type == 1 && matches!(file_type, 0 | 1) {
		true
	} else {
		return Err(LoadErrorCode::SauceInternal);
	};
	if comments > 255 {
		return Err(LoadErrorCode::SauceInternal);
	}
	let comments = usize::from(comments);
	let comment_bytes = if comments > 0 { comments * 64 + 5 } else { 0 };
	let strip_len = record_len + comment_bytes;
	if strip_len > data.len() {
		return Err(LoadErrorCode::SauceInternal);
	}
	let mut remaining = &data[..data.len() - strip_len];
	while remaining.last() == Some(&0x1A) {
		remaining = &remaining[..remaining.len() - 1];
	}
	let width_limit = i64::from(crate::document::WIDTH_LIMIT);
	let lines_limit = i64::from(crate::document::LINES_LIMIT);
	let ansi_hint_width =
		(i64::from(t_info1) > 0 && i64::from(t_info1) < width_limit * 2).then_some(u32::from(t_info1));
	let ansi_hint_height =
		(i64::from(t_info2) > 0 && i64::from(t_info2) < lines_limit * 2).then_some(u32::from(t_info2));
	Ok((remaining, SauceInfo { is_ansi, ansi_hint_width, ansi_hint_height }))
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
	haystack.windows(needle.len()).position(|window| window == needle)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn build_record(data_type: u8, file_type: u8, t_info1: u16, t_info2: u16, comments: u8) -> Vec<u8> {
		let mut record = vec![0u8; RECORD_SIZE];
		record[0..5].copy_from_slice(b"SAUCE");
		record[5..7].copy_from_slice(b"00");
		record[94] = data_type;
		record[95] = file_type;
		record[96..98].copy_from_slice(&t_info1.to_le_bytes());
		record[98..100].copy_from_slice(&t_info2.to_le_bytes());
		record[104] = comments;
		record
	}

	#[test]
	fn no_sauce_when_short() {
		let data = b"HELLO\n";
		let (remaining, info) = strip_sauce(data).unwrap();
		assert_eq!(remaining, data);
		assert_eq!(info, SauceInfo::default());
	}

	#[test]
	fn s1_strips_sauce_and_sets_ansi_hint() {
		let mut data = b"HELLO\n".to_vec();
		data.push(0x1A);
		data.extend(build_record(1, 0, 80, 1, 0));
		let (remaining, info) = strip_sauce(&data).unwrap();
		assert_eq!(remaining, b"HELLO\n");
		assert!(info.is_ansi);
		assert_eq!(info.ansi_hint_width, Some(80));
		assert_eq!(info.ansi_hint_height, Some(1));
	}

	#[test]
	fn not_ansi_escape_hatch() {
		let mut data = b"plain prose text here\n".to_vec();
		data.extend(build_record(1, 0x20, 0, 0, 0x20));
		let (_, info) = strip_sauce(&data).unwrap();
		assert!(!info.is_ansi);
	}

	#[test]
	fn bad_version_is_sauce_internal() {
		let mut record = build_record(1, 0, 0, 0, 0);
		record[5..7].copy_from_slice(b"01");
		let mut data = b"HELLO\n".to_vec();
		data.extend(record);
		assert_eq!(strip_sauce(&data).unwrap_err(), LoadErrorCode::SauceInternal);
	}

	#[test]
	fn unsupported_filetype_is_sauce_internal() {
		let mut data = b"HELLO\n".to_vec();
		data.extend(build_record(1, 7, 0, 0, 0));
		assert_eq!(strip_sauce(&data).unwrap_err(), LoadErrorCode::SauceInternal);
	}
}
