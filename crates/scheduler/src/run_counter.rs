//! Per-check run counter and duration log cadence

use std::time::Duration;

use tracing::info;

/// Number of leading runs that are always logged
const ALWAYS_LOGGED_RUNS: u32 = 5;
/// Cadence of duration logs after the leading runs
const LOG_EVERY: u32 = 20;

/// Counts runs of the one check owned by a scheduler
#[derive(Debug, Clone, Copy, Default)]
pub struct RunCounter {
    runs: u32,
}

impl RunCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance and return the 1-based run number
    pub fn next_run(&mut self) -> u32 {
        self.runs = self.runs.wrapping_add(1);
        self.runs
    }

    pub fn runs(&self) -> u32 {
        self.runs
    }
}

/// Whether a run's duration gets logged
pub fn should_log_run(run: u32) -> bool {
    (1..=ALWAYS_LOGGED_RUNS).contains(&run) || (run > 0 && run % LOG_EVERY == 0)
}

/// Log a check duration following the run cadence
pub fn log_check_duration(name: &str, elapsed: Duration, run: u32) {
    if !should_log_run(run) {
        return;
    }
    if run == ALWAYS_LOGGED_RUNS {
        info!(
            check = %name,
            run,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "Finished {} check #{} in {:?}. First {} check runs finished, next runs will be logged every {} runs.",
            name, run, elapsed, ALWAYS_LOGGED_RUNS, LOG_EVERY
        );
    } else {
        info!(
            check = %name,
            run,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "Finished {} check #{} in {:?}",
            name, run, elapsed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_cadence_for_25_runs() {
        let mut counter = RunCounter::new();
        let logged: Vec<u32> = (0..25)
            .map(|_| counter.next_run())
            .filter(|run| should_log_run(*run))
            .collect();
        assert_eq!(logged, vec![1, 2, 3, 4, 5, 20]);
    }

    #[test]
    fn test_cadence_continues() {
        assert!(should_log_run(40));
        assert!(should_log_run(100));
        assert!(!should_log_run(41));
        assert!(!should_log_run(0));
    }
}
