use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Error that occurs when atomically replacing a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to replace file `{path}`: {source}")]
pub struct FileReplaceError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Opens a file at the given path and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use ubc_monitor::fsutil;
/// let reader = fsutil::open_file_reader("/proc/user_beancounters")?;
/// # Ok::<(), fsutil::FileOpenError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileOpenError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Reads the whole content of `path`, returning `Ok(None)` if the file does not exist.
///
/// Any other failure (permissions, a directory in place of the file, invalid UTF-8)
/// is reported as a [`FileOpenError`].
pub fn read_optional_to_string(path: impl AsRef<Path>) -> Result<Option<String>, FileOpenError> {
    let path = path.as_ref();
    let mut reader = match open_file_reader(path) {
        Ok(reader) => reader,
        Err(err) if err.source.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };

    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .map_err(|source| FileOpenError {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Some(content))
}

/// Replaces the content of `path` with `contents` so that readers observe either the
/// old file or the complete new one.
///
/// The data is written to a temporary file in the same directory, synced to disk and
/// then renamed over `path`. On failure the temporary file is removed and the previous
/// file is left untouched.
///
/// # Errors
///
/// Returns a [`FileReplaceError`] if the temporary file cannot be created, written,
/// synced or renamed.
pub fn write_atomic(path: impl AsRef<Path>, contents: &[u8]) -> Result<(), FileReplaceError> {
    let path = path.as_ref();
    let wrap = |source: io::Error| FileReplaceError {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(wrap)?;
    tmp.write_all(contents).map_err(wrap)?;
    tmp.as_file().sync_all().map_err(wrap)?;
    tmp.persist(path).map_err(|err| wrap(err.error))?;
    log::trace!("Replaced `{}` ({} bytes)", path.display(), contents.len());

    Ok(())
}
