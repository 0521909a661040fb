//! UTF-8 validation and narrow-byte round-tripping used by the double-encode
//! recovery heuristics.

use encoding_rs::ISO_8859_15;

#[must_use]
pub fn validate(bytes: &[u8]) -> bool {
	std::str::from_utf8(bytes).is_ok()
}

/// Re-encodes a UTF-8 string into the single-byte Latin-9 (ISO-8859-15)
/// codepage, dropping any character with no Latin-9 representation to `?`.
///
/// This reverses an accidental "CP437 bytes that were UTF-8-encoded as if
/// they were Latin-1" transformation: decoding those UTF-8 bytes yields Latin
/// code points, and re-narrowing through Latin-9 recovers bytes close enough
/// to the original CP437 stream to re-enter CP437 decoding.
#[must_use]
pub fn to_latin9(input: &str) -> Vec<u8> {
	let (bytes, _, _) = ISO_8859_15.encode(input);
	bytes.into_owned()
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case(b"hello", true)]
	#[case(b"caf\xc3\xa9", true)]
	#[case(b"\xff\xfe", false)]
	fn validate_cases(#[case] input: &[u8], #[case] expected: bool) {
		assert_eq!(validate(input), expected);
	}

	#[test]
	fn to_latin9_round_trips_block_characters() {
		let narrowed = to_latin9("\u{00dc}\u{00dc}");
		assert_eq!(narrowed, vec![0xDC, 0xDC]);
	}

	#[test]
	fn to_latin9_handles_ascii() {
		assert_eq!(to_latin9("hello"), b"hello".to_vec());
	}
}
