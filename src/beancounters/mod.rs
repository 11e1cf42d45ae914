//! Typed view of the OpenVZ/Virtuozzo user beancounters (UBC) of a single container.
//!
//! A [`Snapshot`] is produced fresh on every read of `/proc/user_beancounters` and maps
//! each resource name (e.g. `kmemsize`, `numproc`) to its [`ResourceCounters`].
//!
//! # Example
//!
//! ```rust
//! use ubc_monitor::beancounters::parse_snapshot;
//!
//! let text = "\
//! Version: 2.5
//!        uid  resource     held  maxheld  barrier  limit  failcnt
//!       101:  numproc        12       40      240    240        3
//! ";
//! let snapshot = parse_snapshot(text).unwrap();
//! assert_eq!(snapshot.container_id().as_ref(), "101");
//! assert_eq!(snapshot.resources()["numproc"].failcnt, 3);
//! ```

mod error;
mod parser;

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::container::ContainerID;
use crate::fsutil;

pub use error::{Error, Result};
pub use parser::{CounterField, ParseError, parse_snapshot};

/// Resource name to counters, as read from one snapshot or persisted as a baseline.
pub type Resources = HashMap<String, ResourceCounters>;

/// The counters of a single beancounter resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceCounters {
    /// Current usage.
    pub held: u64,
    /// Maximum usage since the container started.
    pub maxheld: u64,
    /// Soft limit.
    pub barrier: u64,
    /// Hard limit.
    pub limit: u64,
    /// Number of refused allocations since the container started.
    pub failcnt: u64,
}

impl ResourceCounters {
    /// Returns a copy of these counters with `failcnt` replaced.
    pub fn with_failcnt(self, failcnt: u64) -> Self {
        Self { failcnt, ..self }
    }
}

/// One parsed read of the beancounters file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    version: Option<String>,
    container_id: ContainerID,
    resources: Resources,
}

impl Snapshot {
    pub fn new(version: Option<String>, container_id: ContainerID, resources: Resources) -> Self {
        Self {
            version,
            container_id,
            resources,
        }
    }

    /// Returns the format version from the `Version:` line, if present.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn container_id(&self) -> &ContainerID {
        &self.container_id
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Splits the snapshot into its container id and resources.
    pub fn into_parts(self) -> (ContainerID, Resources) {
        (self.container_id, self.resources)
    }
}

impl std::str::FromStr for Snapshot {
    type Err = ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        parse_snapshot(s)
    }
}

/// Reads and parses the beancounters file at `path`.
///
/// # Errors
///
/// - [`Error::FileOpen`] if the file can't be opened.
/// - [`Error::Read`] if reading from the file fails.
/// - [`Error::Parse`] if the content is not a well-formed single-container snapshot.
pub fn read_snapshot(path: impl AsRef<Path>) -> Result<Snapshot> {
    let path = path.as_ref();
    let mut reader = fsutil::open_file_reader(path)?;

    let mut text = String::new();
    reader.read_to_string(&mut text).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let snapshot = parse_snapshot(&text).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    log::debug!(
        "Read {} resources for container {} from `{}`",
        snapshot.resources().len(),
        snapshot.container_id(),
        path.display()
    );

    Ok(snapshot)
}
