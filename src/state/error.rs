use std::path::PathBuf;

use crate::fsutil;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read state file: {0}")]
    Read(#[source] fsutil::FileOpenError),
    #[error("failed to decode state file `{path}`: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported format {found} in state file `{path}`, expected {expected}")]
    UnsupportedFormat {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
    #[error("failed to encode state: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write state file: {0}")]
    Write(#[source] fsutil::FileReplaceError),
}

pub type Result<T> = std::result::Result<T, Error>;
