use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::communication::messages::StatusReport;

/// Additive aggregation of the terminal per-street reports.
///
/// `spawned` is recorded next to the reports because a shutdown race can
/// leave the status channel short; the shortfall must stay observable.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub spawned: usize,
    pub reports: Vec<StatusReport>,
    pub total_arrived: u64,
    pub total_passed: u64,
    pub total_waiting: u64,
}

impl SimulationSummary {
    pub fn collect(spawned: usize, mut reports: Vec<StatusReport>) -> Self {
        reports.sort_by_key(|report| report.street_id);
        let total_arrived = reports.iter().map(|r| r.total_arrived).sum();
        let total_passed = reports.iter().map(|r| r.total_passed).sum();
        let total_waiting = reports.iter().map(|r| r.waiting).sum();
        Self {
            spawned,
            reports,
            total_arrived,
            total_passed,
            total_waiting,
        }
    }

    /// False only if a shutdown race swallowed some agent's report.
    pub fn is_complete(&self) -> bool {
        self.reports.len() == self.spawned
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Writes one CSV row per street report.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_path(path)?;
        for report in &self.reports {
            writer.serialize(report)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== Summary ==")?;
        for report in &self.reports {
            writeln!(
                f,
                "Street {}: Total Arrived = {}, Passed = {}, Waiting = {}",
                report.street_id, report.total_arrived, report.total_passed, report.waiting
            )?;
        }
        if !self.is_complete() {
            writeln!(
                f,
                "({} of {} streets reported)",
                self.reports.len(),
                self.spawned
            )?;
        }
        write!(
            f,
            "Totals: arrived = {}, passed = {}, waiting = {}",
            self.total_arrived, self.total_passed, self.total_waiting
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(street_id: usize, total_arrived: u64, total_passed: u64) -> StatusReport {
        StatusReport {
            street_id,
            total_arrived,
            total_passed,
            waiting: total_arrived - total_passed,
        }
    }

    #[test]
    fn collect_sorts_and_sums() {
        let summary =
            SimulationSummary::collect(3, vec![report(2, 5, 3), report(0, 4, 4), report(1, 7, 2)]);
        assert!(summary.is_complete());
        assert_eq!(
            summary.reports.iter().map(|r| r.street_id).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(summary.total_arrived, 16);
        assert_eq!(summary.total_passed, 9);
        assert_eq!(summary.total_waiting, 7);
    }

    #[test]
    fn missing_reports_are_visible() {
        let summary = SimulationSummary::collect(4, vec![report(0, 1, 0)]);
        assert!(!summary.is_complete());
        let rendered = summary.to_string();
        assert!(rendered.contains("1 of 4 streets reported"));
    }
}
