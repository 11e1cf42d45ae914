use crate::beancounters::Resources;

use super::Result;

/// Carries the baseline of the previous check across invocations.
pub trait StateStore {
    /// Returns the persisted baseline, or an empty one if nothing was saved yet.
    fn load(&self) -> Result<Resources>;

    /// Replaces the persisted baseline with `state`.
    ///
    /// Implementations must never leave a partially written baseline behind.
    fn save(&self, state: &Resources) -> Result<()>;
}
