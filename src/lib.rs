//! UBC Monitor: reports increased fail counts of the OpenVZ/Virtuozzo user beancounters
//! of a container.
//!
//! Every run reads `/proc/user_beancounters`, compares each resource's `failcnt`
//! against the values stored by the previous run and stores the new baseline. It is
//! meant to be invoked periodically, e.g. from cron, with at most one instance per
//! state file at a time.
pub mod beancounters;
pub mod config;
pub mod container;
pub mod error;
pub mod fsutil;
pub mod monitor;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use monitor::{Monitor, Report};

/// Runs a single check with the paths from `config`.
///
/// # Errors
///
/// Returns an error if the beancounters file can't be read or parsed, or if the
/// state file can't be decoded or replaced.
pub fn run(config: &Config) -> Result<Report> {
    log::debug!(
        "Checking `{}` against baseline `{}`",
        config.ubc_file.display(),
        config.state_file.display()
    );
    let store = state::FileStateStore::new(&config.state_file);
    Monitor::new(&config.ubc_file, store).check()
}
