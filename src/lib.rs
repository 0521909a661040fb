#![warn(clippy::all, clippy::nursery, clippy::pedantic)]

pub mod ansi_art;
mod ansi_scrub;
mod charset;
mod cp437;
pub mod document;
pub mod error;
pub mod export;
mod lines;
mod links;
pub mod loader;
mod normalize;
mod sauce;
mod strip;
mod utf8util;
mod wrap;

pub use charset::CharsetPreference;
pub use document::{Document, SourceCharset};
pub use error::{LoadError, LoadErrorCode};
pub use links::HyperLink;
pub use loader::{LoadOptions, load_bytes, load_file};
