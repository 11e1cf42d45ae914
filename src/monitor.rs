//! Detects increased `failcnt` values between two reads of the beancounters.
//!
//! [`diff`] compares the current resources against the baseline of the previous
//! check. A `failcnt` only ever grows while a container is running, so a lower value
//! is taken as a sign of a restart: it is not reported, and the baseline keeps the
//! old value so that only counts beyond it are reported later on.
//!
//! [`Monitor`] wires this to the beancounters file and a [`StateStore`].

use std::fmt;
use std::path::PathBuf;

use crate::beancounters::{self, Resources};
use crate::container::ContainerID;
use crate::error::Result;
use crate::state::StateStore;

/// A resource whose `failcnt` grew since the last check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Increase {
    pub resource: String,
    pub old_failcnt: u64,
    pub new_failcnt: u64,
}

impl fmt::Display for Increase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Increased failcnt for \"{}\" {} -> {}",
            self.resource, self.old_failcnt, self.new_failcnt
        )
    }
}

/// Outcome of comparing a snapshot against the baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    /// Increases, sorted by resource name.
    pub increases: Vec<Increase>,
    /// The baseline to persist for the next check.
    pub next: Resources,
}

/// Compares `current` against the `old` baseline.
///
/// Resources without a baseline are taken over unchanged. Resources only present in
/// `old` are dropped. A `failcnt` below the baseline is replaced by the baseline value
/// in `next`.
pub fn diff(old: &Resources, current: &Resources) -> Diff {
    let mut increases = Vec::new();
    let mut next = Resources::with_capacity(current.len());

    for (name, counters) in current {
        let mut counters = *counters;

        if let Some(baseline) = old.get(name) {
            log::trace!(
                "{name}: failcnt {} (baseline {})",
                counters.failcnt,
                baseline.failcnt
            );
            if counters.failcnt > baseline.failcnt {
                increases.push(Increase {
                    resource: name.clone(),
                    old_failcnt: baseline.failcnt,
                    new_failcnt: counters.failcnt,
                });
            } else if counters.failcnt < baseline.failcnt {
                log::warn!(
                    "failcnt for \"{name}\" dropped from {} to {}, assuming the container was restarted",
                    baseline.failcnt,
                    counters.failcnt
                );
                counters = counters.with_failcnt(baseline.failcnt);
            }
        }

        next.insert(name.clone(), counters);
    }

    increases.sort_by(|a, b| a.resource.cmp(&b.resource));
    Diff { increases, next }
}

/// Increases detected for one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    container_id: ContainerID,
    increases: Vec<Increase>,
}

impl Report {
    pub fn new(container_id: ContainerID, increases: Vec<Increase>) -> Self {
        Self {
            container_id,
            increases,
        }
    }

    pub fn container_id(&self) -> &ContainerID {
        &self.container_id
    }

    pub fn increases(&self) -> &[Increase] {
        &self.increases
    }

    pub fn is_empty(&self) -> bool {
        self.increases.is_empty()
    }
}

/// Renders the header line followed by one line per increase, or nothing if there
/// are no increases.
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }

        writeln!(
            f,
            "Detected increased fail counts of UBC parameters for container ID {}",
            self.container_id
        )?;
        for increase in &self.increases {
            writeln!(f, "{increase}")?;
        }
        Ok(())
    }
}

/// Runs checks of one beancounters file against a baseline kept in a [`StateStore`].
pub struct Monitor<S> {
    ubc_file: PathBuf,
    store: S,
}

impl<S: StateStore> Monitor<S> {
    pub fn new(ubc_file: impl Into<PathBuf>, store: S) -> Self {
        Self {
            ubc_file: ubc_file.into(),
            store,
        }
    }

    /// Reads the current counters, compares them against the stored baseline and
    /// saves the corrected baseline.
    ///
    /// # Errors
    ///
    /// Returns an error if the beancounters file can't be read or parsed, or if the
    /// baseline can't be loaded or saved. Nothing is saved if reading fails.
    pub fn check(&self) -> Result<Report> {
        let snapshot = beancounters::read_snapshot(&self.ubc_file)?;
        let old = self.store.load()?;

        let (container_id, current) = snapshot.into_parts();
        let Diff { increases, next } = diff(&old, &current);
        self.store.save(&next)?;

        for increase in &increases {
            log::info!("container {container_id}: {increase}");
        }
        Ok(Report::new(container_id, increases))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::beancounters::ResourceCounters;
    use crate::error::Error;
    use crate::state::{self, FileStateStore};

    fn failcnt(failcnt: u64) -> ResourceCounters {
        ResourceCounters {
            held: 10,
            maxheld: 20,
            barrier: 100,
            limit: 200,
            failcnt,
        }
    }

    fn resources(entries: &[(&str, u64)]) -> Resources {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), failcnt(*value)))
            .collect()
    }

    #[test]
    fn resource_without_baseline_is_taken_over() {
        let old = resources(&[("A", 3)]);
        let current = resources(&[("A", 3), ("B", 9)]);

        let result = diff(&old, &current);
        assert!(result.increases.is_empty());
        assert_eq!(result.next["B"], current["B"]);
    }

    #[test]
    fn first_run_reports_nothing() {
        let current = resources(&[("A", 3), ("B", 9)]);
        let result = diff(&Resources::new(), &current);
        assert!(result.increases.is_empty());
        assert_eq!(result.next, current);
    }

    #[test]
    fn increase_is_reported() {
        let result = diff(&resources(&[("R", 5)]), &resources(&[("R", 7)]));

        assert_eq!(
            result.increases,
            vec![Increase {
                resource: "R".to_owned(),
                old_failcnt: 5,
                new_failcnt: 7,
            }]
        );
        assert_eq!(
            result.increases[0].to_string(),
            "Increased failcnt for \"R\" 5 -> 7"
        );
        assert_eq!(result.next["R"].failcnt, 7);
    }

    #[test]
    fn decrease_keeps_baseline() {
        let current = resources(&[("R", 1)]);
        let result = diff(&resources(&[("R", 5)]), &current);

        assert!(result.increases.is_empty());
        assert_eq!(result.next["R"], current["R"].with_failcnt(5));
    }

    #[test]
    fn equal_is_carried_through() {
        let result = diff(&resources(&[("R", 5)]), &resources(&[("R", 5)]));
        assert!(result.increases.is_empty());
        assert_eq!(result.next["R"].failcnt, 5);
    }

    #[test]
    fn removed_resources_are_dropped() {
        let result = diff(&resources(&[("A", 1), ("gone", 4)]), &resources(&[("A", 1)]));
        assert!(!result.next.contains_key("gone"));
        assert_eq!(result.next.len(), 1);
    }

    #[test]
    fn restart_masks_counts_below_old_baseline() {
        let baseline = resources(&[("R", 5)]);

        let after_restart = diff(&baseline, &resources(&[("R", 1)]));
        let below = diff(&after_restart.next, &resources(&[("R", 4)]));
        assert!(below.increases.is_empty());
        assert_eq!(below.next["R"].failcnt, 5);

        let above = diff(&below.next, &resources(&[("R", 6)]));
        assert_eq!(above.increases.len(), 1);
        assert_eq!(above.increases[0].old_failcnt, 5);
    }

    #[test]
    fn increases_are_sorted_by_resource() {
        let old = resources(&[("numproc", 0), ("kmemsize", 0), ("tcpsndbuf", 0)]);
        let current = resources(&[("numproc", 1), ("kmemsize", 2), ("tcpsndbuf", 3)]);

        let names: Vec<_> = diff(&old, &current)
            .increases
            .into_iter()
            .map(|i| i.resource)
            .collect();
        assert_eq!(names, ["kmemsize", "numproc", "tcpsndbuf"]);
    }

    #[test]
    fn report_rendering() {
        let id = ContainerID::new("101").unwrap();
        assert_eq!(Report::new(id.clone(), Vec::new()).to_string(), "");

        let report = Report::new(
            id,
            vec![Increase {
                resource: "numproc".to_owned(),
                old_failcnt: 1,
                new_failcnt: 2,
            }],
        );
        assert_eq!(
            report.to_string(),
            "Detected increased fail counts of UBC parameters for container ID 101\n\
             Increased failcnt for \"numproc\" 1 -> 2\n"
        );
    }

    fn write_ubc(path: &std::path::Path, rows: &[(&str, u64)]) {
        let mut file = std::fs::File::create(path).unwrap();
        writeln!(file, "Version: 2.5").unwrap();
        writeln!(
            file,
            "       uid  resource  held  maxheld  barrier  limit  failcnt"
        )
        .unwrap();
        for (idx, (name, value)) in rows.iter().enumerate() {
            let prefix = if idx == 0 { "101:" } else { "" };
            writeln!(file, "  {prefix} {name} 10 20 100 200 {value}").unwrap();
        }
    }

    #[test]
    fn check_first_run_creates_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let ubc = dir.path().join("user_beancounters");
        let state_file = dir.path().join("state.json");
        write_ubc(&ubc, &[("numproc", 3), ("kmemsize", 0)]);

        let monitor = Monitor::new(&ubc, FileStateStore::new(&state_file));
        let report = monitor.check().unwrap();
        assert!(report.is_empty());
        assert_eq!(report.to_string(), "");

        let snapshot = beancounters::read_snapshot(&ubc).unwrap();
        let saved = FileStateStore::new(&state_file).load().unwrap();
        assert_eq!(&saved, snapshot.resources());
    }

    #[test]
    fn check_twice_without_change_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let ubc = dir.path().join("user_beancounters");
        write_ubc(&ubc, &[("numproc", 3), ("kmemsize", 1)]);

        let monitor = Monitor::new(&ubc, FileStateStore::new(dir.path().join("state.json")));
        monitor.check().unwrap();
        assert!(monitor.check().unwrap().is_empty());
    }

    #[test]
    fn check_reports_increase_once() {
        let dir = tempfile::tempdir().unwrap();
        let ubc = dir.path().join("user_beancounters");
        let monitor = Monitor::new(&ubc, FileStateStore::new(dir.path().join("state.json")));

        write_ubc(&ubc, &[("numproc", 3)]);
        monitor.check().unwrap();

        write_ubc(&ubc, &[("numproc", 8)]);
        let report = monitor.check().unwrap();
        assert_eq!(report.container_id().as_ref(), "101");
        assert_eq!(report.increases().len(), 1);
        assert_eq!(
            report.increases()[0].to_string(),
            "Increased failcnt for \"numproc\" 3 -> 8"
        );

        assert!(monitor.check().unwrap().is_empty());
    }

    #[test]
    fn check_with_malformed_counters_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let ubc = dir.path().join("user_beancounters");
        let state_file = dir.path().join("state.json");
        let monitor = Monitor::new(&ubc, FileStateStore::new(&state_file));

        write_ubc(&ubc, &[("numproc", 3)]);
        monitor.check().unwrap();
        let before = std::fs::read(&state_file).unwrap();

        std::fs::write(&ubc, "Version: 2.5\n uid resource\n 101: numproc 1 2\n").unwrap();
        assert!(matches!(
            monitor.check().unwrap_err(),
            Error::Snapshot(beancounters::Error::Parse { .. })
        ));
        assert_eq!(std::fs::read(&state_file).unwrap(), before);
    }

    #[test]
    fn check_with_corrupt_state_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ubc = dir.path().join("user_beancounters");
        let state_file = dir.path().join("state.json");
        write_ubc(&ubc, &[("numproc", 3)]);
        std::fs::write(&state_file, "not json").unwrap();

        let monitor = Monitor::new(&ubc, FileStateStore::new(&state_file));
        assert!(matches!(
            monitor.check().unwrap_err(),
            Error::State(state::Error::Decode { .. })
        ));
        assert_eq!(std::fs::read_to_string(&state_file).unwrap(), "not json");
    }

    /// Keeps the baseline in memory and refuses every save.
    struct ReadOnlyStore(Resources);

    impl StateStore for ReadOnlyStore {
        fn load(&self) -> state::Result<Resources> {
            Ok(self.0.clone())
        }

        fn save(&self, _state: &Resources) -> state::Result<()> {
            Err(state::Error::Encode(
                serde_json::from_str::<u64>("x").unwrap_err(),
            ))
        }
    }

    #[test]
    fn check_fails_without_report_when_save_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ubc = dir.path().join("user_beancounters");
        write_ubc(&ubc, &[("numproc", 8)]);

        let store = ReadOnlyStore(resources(&[("numproc", 3)]));
        let monitor = Monitor::new(&ubc, store);
        assert!(matches!(
            monitor.check().unwrap_err(),
            Error::State(state::Error::Encode(_))
        ));
    }
}
