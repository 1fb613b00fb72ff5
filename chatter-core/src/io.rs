use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Opens a corpus file for one-pass streaming.
///
/// The file is not read here; the tokenizer pulls from the returned buffer.
pub fn open_corpus<P: AsRef<Path>>(path: P) -> io::Result<BufReader<File>> {
	Ok(BufReader::new(File::open(path)?))
}

/// Derives a corpus name from its path.
///
/// Examples:
/// - `"./data/moby.txt"` → `"moby"`
/// - `"moby.txt"` → `"moby"`
pub fn corpus_name<P: AsRef<Path>>(path: P) -> io::Result<String> {
	let stem = path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().into_owned())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists the files of a directory having the given extension.
///
/// Returns file names only (no paths), sorted so corpora are trained
/// in a stable order.
pub fn list_corpora<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().into_owned());
			}
		}
	}

	files.sort();
	Ok(files)
}
