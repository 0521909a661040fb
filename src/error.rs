use std::fmt;

/// Tagged error code carried on a loaded [`crate::document::Document`].
///
/// Never thrown across the public API: every `load_*` entry point returns a
/// `Document` whose `last_error` field is `NoError` on success or one of
/// these variants on failure, with the rest of the document left empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadErrorCode {
	#[default]
	NoError,
	UnableToOpenPhysical,
	FailedToDetermineSize,
	SizeExceedsLimit,
	Ferror,
	EncodingProblem,
	UnrecognizedFileFormat,
	SauceInternal,
	AnsiInternal,
	EmptyFile,
	MaximumLineLengthExceeded,
	MaximumNumberOfLinesExceeded,
}

impl LoadErrorCode {
	#[must_use]
	pub const fn is_success(self) -> bool {
		matches!(self, Self::NoError)
	}
}

/// A `LoadErrorCode` paired with a human-readable description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
	pub code: LoadErrorCode,
	pub description: String,
}

impl LoadError {
	#[must_use]
	pub fn new(code: LoadErrorCode, description: impl Into<String>) -> Self {
		Self { code, description: description.into() }
	}

	#[must_use]
	pub const fn none() -> Self {
		Self { code: LoadErrorCode::NoError, description: String::new() }
	}
}

impl Default for LoadError {
	fn default() -> Self {
		Self::none()
	}
}

impl fmt::Display for LoadError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.code {
			LoadErrorCode::NoError => write!(f, "no error"),
			LoadErrorCode::UnableToOpenPhysical => write!(f, "unable to open file: {}", self.description),
			LoadErrorCode::FailedToDetermineSize => write!(f, "failed to determine file size: {}", self.description),
			LoadErrorCode::SizeExceedsLimit => write!(f, "file size exceeds the 3 MiB limit: {}", self.description),
			LoadErrorCode::Ferror => write!(f, "read error: {}", self.description),
			LoadErrorCode::EncodingProblem => write!(f, "unable to determine text encoding: {}", self.description),
			LoadErrorCode::UnrecognizedFileFormat => write!(f, "unrecognized file format: {}", self.description),
			LoadErrorCode::SauceInternal => write!(f, "malformed SAUCE record: {}", self.description),
			LoadErrorCode::AnsiInternal => write!(f, "ANSI art processor failed: {}", self.description),
			LoadErrorCode::EmptyFile => write!(f, "file has no usable lines: {}", self.description),
			LoadErrorCode::MaximumLineLengthExceeded => write!(f, "a line exceeds the width limit: {}", self.description),
			LoadErrorCode::MaximumNumberOfLinesExceeded => {
				write!(f, "file exceeds the line count limit: {}", self.description)
			}
		}
	}
}

impl std::error::Error for LoadError {}
