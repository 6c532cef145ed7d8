use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{fmt, io};

use crate::error::LoadError;

/// Where corpus or vocabulary bytes come from.
///
/// The engine only needs something readable; provisioning the content
/// (extracting packaged resources, downloading, ...) is the caller's job.
#[derive(Clone, Debug)]
pub enum ContentSource {
	/// A file on disk, read fully at initialization.
	File(PathBuf),
	/// Already decoded text.
	Text(String),
	/// Raw bytes, decoded as UTF-8.
	Bytes(Vec<u8>),
}

impl ContentSource {
	/// Convenience constructor for a file source.
	pub fn file<P: AsRef<Path>>(path: P) -> Self {
		ContentSource::File(path.as_ref().to_path_buf())
	}

	/// Returns the backing file path, if any.
	pub fn path(&self) -> Option<&Path> {
		match self {
			ContentSource::File(path) => Some(path),
			_ => None,
		}
	}

	/// Reads the whole source as UTF-8 text.
	///
	/// - A missing or unopenable file is `SourceUnavailable`
	/// - A read error after opening is `IoFailure`
	/// - Invalid UTF-8 is `DecodeFailure`
	pub fn read_text(&self) -> Result<String, LoadError> {
		match self {
			ContentSource::File(path) => read_file(path),
			ContentSource::Text(text) => Ok(text.clone()),
			ContentSource::Bytes(bytes) => decode_utf8(bytes.clone(), &self.to_string()),
		}
	}
}

impl fmt::Display for ContentSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ContentSource::File(path) => write!(f, "{}", path.display()),
			ContentSource::Text(text) => write!(f, "<text, {} bytes>", text.len()),
			ContentSource::Bytes(bytes) => write!(f, "<bytes, {} bytes>", bytes.len()),
		}
	}
}

/// Reads a text file fully into memory.
fn read_file(path: &Path) -> Result<String, LoadError> {
	let mut file = File::open(path).map_err(|source| LoadError::SourceUnavailable {
		path: path.to_path_buf(),
		source,
	})?;

	let mut bytes = Vec::new();
	file.read_to_end(&mut bytes).map_err(|source| LoadError::IoFailure {
		what: path.display().to_string(),
		source,
	})?;

	decode_utf8(bytes, &path.display().to_string())
}

fn decode_utf8(bytes: Vec<u8>, what: &str) -> Result<String, LoadError> {
	String::from_utf8(bytes).map_err(|e| LoadError::DecodeFailure {
		what: what.to_owned(),
		reason: e.utf8_error().to_string(),
	})
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/corpus.txt` + `"bin"` → `data/corpus.bin`
pub(crate) fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn output_path_replaces_extension() {
		let path = build_output_path("data/corpus.txt", "bin").unwrap();
		assert_eq!(path, PathBuf::from("data/corpus.bin"));
	}

	#[test]
	fn output_path_without_parent_stays_relative() {
		let path = build_output_path("corpus.txt", "bin").unwrap();
		assert_eq!(path, PathBuf::from("corpus.bin"));
	}

	#[test]
	fn missing_file_is_source_unavailable() {
		let source = ContentSource::file("/definitely/not/here/vocab.txt");
		assert!(matches!(source.read_text(), Err(LoadError::SourceUnavailable { .. })));
	}

	#[test]
	fn invalid_utf8_is_decode_failure() {
		let source = ContentSource::Bytes(vec![b'h', b'i', 0xff, 0xfe]);
		assert!(matches!(source.read_text(), Err(LoadError::DecodeFailure { .. })));
	}

	#[test]
	fn text_and_bytes_read_back() {
		assert_eq!(ContentSource::Text("a b".to_owned()).read_text().unwrap(), "a b");
		assert_eq!(ContentSource::Bytes(b"c d".to_vec()).read_text().unwrap(), "c d");
	}
}
