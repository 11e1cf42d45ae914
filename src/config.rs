use std::path::PathBuf;

/// Default location of the kernel beancounters file.
pub const DEFAULT_UBC_FILE: &str = "/proc/user_beancounters";

/// Default location of the baseline kept between checks.
pub const DEFAULT_STATE_FILE: &str = "/root/ubc-monitor.json";

/// Check the user beancounters of a container and report increased fail counts.
#[derive(Debug, Clone, PartialEq, Eq, clap::Parser)]
#[command(version, about)]
pub struct Config {
    /// Read user beancounters from this file.
    #[arg(long = "ubc", env = "UBC_MONITOR_UBC_FILE", default_value = DEFAULT_UBC_FILE)]
    pub ubc_file: PathBuf,

    /// File to store the fail counts of the last check in.
    #[arg(
        long = "database",
        visible_alias = "state",
        env = "UBC_MONITOR_STATE_FILE",
        default_value = DEFAULT_STATE_FILE
    )]
    pub state_file: PathBuf,
}
