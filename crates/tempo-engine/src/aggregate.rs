//! Date-range attendance reports.
//!
//! Every session is resolved first, so a justified student is counted once
//! as `justified` and never also as `late`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use tempo_config::ReportConfig;
use tempo_core::CoreError;
use tempo_core::dates::parse_session_date;
use tempo_core::entities::Session;
use tempo_core::enums::CanonicalStatus;

use crate::resolver::resolve;

/// Inclusive range of session dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if `end` is before `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if end < start {
            return Err(CoreError::Validation(format!(
                "date range ends ({end}) before it starts ({start})"
            )));
        }
        Ok(Self { start, end })
    }

    /// # Errors
    ///
    /// Returns `CoreError::Validation` for malformed dates or an inverted range.
    pub fn parse(start: &str, end: &str) -> Result<Self, CoreError> {
        Self::new(parse_session_date(start)?, parse_session_date(end)?)
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start..=self.end).contains(&date)
    }
}

/// What counts as "attended" for the attendance rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendancePolicy {
    /// Count unjustified `Late` as attended. Present and Justified always are.
    pub late_counts_as_attended: bool,
}

impl From<&ReportConfig> for AttendancePolicy {
    fn from(config: &ReportConfig) -> Self {
        Self {
            late_counts_as_attended: config.late_counts_as_attended,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusTally {
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub justified: u32,
    /// `attended / total`, or `None` when nothing was recorded.
    pub attendance_rate: Option<f64>,
}

impl StatusTally {
    fn record(&mut self, status: CanonicalStatus) {
        match status {
            CanonicalStatus::Present => self.present += 1,
            CanonicalStatus::Absent => self.absent += 1,
            CanonicalStatus::Late => self.late += 1,
            CanonicalStatus::Justified => self.justified += 1,
        }
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.present + self.absent + self.late + self.justified
    }

    #[must_use]
    pub const fn attended(&self, policy: AttendancePolicy) -> u32 {
        let late = if policy.late_counts_as_attended {
            self.late
        } else {
            0
        };
        self.present + self.justified + late
    }

    fn finish(&mut self, policy: AttendancePolicy) {
        let total = self.total();
        self.attendance_rate =
            (total > 0).then(|| f64::from(self.attended(policy)) / f64::from(total));
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StudentSummary {
    #[serde(flatten)]
    pub tally: StatusTally,
    /// Longest run of consecutive `Absent` sessions, by date.
    pub longest_absence_streak: u32,
    /// Run of `Absent` sessions ending at the latest session.
    pub current_absence_streak: u32,
}

impl StudentSummary {
    fn record(&mut self, status: CanonicalStatus) {
        self.tally.record(status);
        if status == CanonicalStatus::Absent {
            self.current_absence_streak += 1;
            self.longest_absence_streak = self
                .longest_absence_streak
                .max(self.current_absence_streak);
        } else {
            self.current_absence_streak = 0;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceReport {
    pub range: DateRange,
    pub policy: AttendancePolicy,
    /// Sessions inside the range that were counted.
    pub sessions: usize,
    pub per_student: BTreeMap<String, StudentSummary>,
    pub per_class: BTreeMap<String, StatusTally>,
}

/// Roll up canonical statuses of the sessions dated within `range`.
#[must_use]
pub fn aggregate(sessions: &[Session], range: DateRange, policy: AttendancePolicy) -> AttendanceReport {
    let mut in_range: Vec<&Session> = sessions
        .iter()
        .filter(|s| range.contains(s.key.date()))
        .collect();
    // Streaks need chronological order.
    in_range.sort_by(|a, b| {
        (a.key.date(), a.key.class_id()).cmp(&(b.key.date(), b.key.class_id()))
    });

    let mut per_student: BTreeMap<String, StudentSummary> = BTreeMap::new();
    let mut per_class: BTreeMap<String, StatusTally> = BTreeMap::new();

    for session in &in_range {
        let class_tally = per_class
            .entry(session.key.class_id().to_string())
            .or_default();
        for (student, status) in resolve(session) {
            class_tally.record(status);
            per_student.entry(student).or_default().record(status);
        }
    }

    for summary in per_student.values_mut() {
        summary.tally.finish(policy);
    }
    for tally in per_class.values_mut() {
        tally.finish(policy);
    }

    AttendanceReport {
        range,
        policy,
        sessions: in_range.len(),
        per_student,
        per_class,
    }
}
