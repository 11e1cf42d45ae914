use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::beancounters::{ResourceCounters, Resources};
use crate::fsutil;

use super::{Error, Result, StateStore};

/// Version of the on-disk layout written by [`FileStateStore`].
const STATE_FORMAT: u32 = 1;

#[derive(Serialize)]
struct StateFileRef<'a> {
    format: u32,
    resources: BTreeMap<&'a str, &'a ResourceCounters>,
}

#[derive(Deserialize)]
struct StateFile {
    format: u32,
    resources: Resources,
}

/// A [`StateStore`] keeping the baseline as a JSON document in a single file.
///
/// Saving goes through [`fsutil::write_atomic`], so the file always holds either the
/// previous baseline or the complete new one.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<Resources> {
        let Some(content) = fsutil::read_optional_to_string(&self.path).map_err(Error::Read)?
        else {
            log::debug!(
                "No state file at `{}`, starting without baseline",
                self.path.display()
            );
            return Ok(Resources::new());
        };

        let state: StateFile = serde_json::from_str(&content).map_err(|e| Error::Decode {
            path: self.path.clone(),
            source: e,
        })?;
        if state.format != STATE_FORMAT {
            return Err(Error::UnsupportedFormat {
                path: self.path.clone(),
                found: state.format,
                expected: STATE_FORMAT,
            });
        }

        log::debug!(
            "Loaded baseline of {} resources from `{}`",
            state.resources.len(),
            self.path.display()
        );
        Ok(state.resources)
    }

    fn save(&self, state: &Resources) -> Result<()> {
        let document = StateFileRef {
            format: STATE_FORMAT,
            resources: state
                .iter()
                .map(|(name, counters)| (name.as_str(), counters))
                .collect(),
        };
        let mut encoded = serde_json::to_vec_pretty(&document).map_err(Error::Encode)?;
        encoded.push(b'\n');

        fsutil::write_atomic(&self.path, &encoded).map_err(Error::Write)?;
        log::debug!(
            "Saved baseline of {} resources to `{}`",
            state.len(),
            self.path.display()
        );
        Ok(())
    }
}
