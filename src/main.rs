use clap::Parser;

/// Entry point for the UBC Monitor.
///
/// Runs one check and prints a report to stdout only if a fail count increased. Logs
/// go to stderr and are controlled by `RUST_LOG`.
///
/// # Errors
///
/// Returns an error, and so exits non-zero, if the beancounters file can't be parsed
/// or the state file can't be read or written.
///
/// # Examples
///
/// ```bash
/// ubc-monitor --ubc /proc/user_beancounters --database /root/ubc-monitor.json
/// ```
fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let config = ubc_monitor::Config::parse();
    let report = ubc_monitor::run(&config)?;
    print!("{report}");
    Ok(())
}
