//! Cycle history maintenance.
//!
//! Rolling averages are cached on the history and only recomputed when a
//! record is committed or removed, never on a read.
//!
//! Both averages drop physiologically implausible values before averaging:
//! cycle lengths outside 21..=45 days and flow lengths outside 2..=10 days.

use crate::dates::{days_between, days_in_month, first_of_month};
use crate::{
    CycleHistory, CycleRecord, CycleStats, Error, Result, RollingAverages, SymptomRecord,
};
use chrono::{Duration, NaiveDate};
use std::ops::RangeInclusive;
use uuid::Uuid;

/// Cycle length assumed before any valid delta exists
pub const DEFAULT_CYCLE_LENGTH: i64 = 28;

/// Flow length assumed when no record has a plausible length
pub const DEFAULT_FLOW_LENGTH: i64 = 5;

/// Start-to-start deltas kept when averaging
pub const VALID_CYCLE_LENGTHS: RangeInclusive<i64> = 21..=45;

/// Inclusive flow lengths kept when averaging
pub const VALID_FLOW_LENGTHS: RangeInclusive<i64> = 2..=10;

impl Default for CycleHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CYCLE_LENGTH, DEFAULT_FLOW_LENGTH)
    }
}

impl CycleHistory {
    /// Empty history seeded with the given averages
    pub fn new(average_cycle_length: i64, average_flow_length: i64) -> Self {
        Self {
            records: Vec::new(),
            symptoms: Vec::new(),
            last_start_date: None,
            average_cycle_length,
            average_flow_length,
        }
    }

    /// Add a newly recorded period and refresh the cached averages
    ///
    /// The record goes to the front of the list and becomes the last start
    /// date. Rejects records whose end precedes their start.
    pub fn commit_record(&mut self, record: CycleRecord) -> Result<RollingAverages> {
        if record.end_date < record.start_date {
            return Err(Error::MalformedRecord(format!(
                "period ends {} before it starts {}",
                record.end_date, record.start_date
            )));
        }

        tracing::info!(
            "Committing period {} to {} ({:?})",
            record.start_date,
            record.end_date,
            record.flow
        );

        self.last_start_date = Some(record.start_date);
        self.records.insert(0, record);
        Ok(self.recompute_averages())
    }

    /// Delete a record by id and refresh the cached averages
    pub fn remove_record(&mut self, id: Uuid) -> Result<RollingAverages> {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        if self.records.len() == before {
            return Err(Error::NotFound(format!("period record {}", id)));
        }

        self.last_start_date = self.records.first().map(|r| r.start_date);
        tracing::info!("Removed period record {}", id);
        Ok(self.recompute_averages())
    }

    /// Recompute both averages from the stored records
    ///
    /// With no valid cycle delta the previous cycle average is kept. With no
    /// valid flow length the flow average falls back to the default.
    pub fn recompute_averages(&mut self) -> RollingAverages {
        if let Some(cycle_length) = average_cycle_length(&self.records) {
            self.average_cycle_length = cycle_length;
        }
        self.average_flow_length =
            average_flow_length(&self.records).unwrap_or(DEFAULT_FLOW_LENGTH);

        tracing::debug!(
            "Averages now cycle={} flow={} over {} records",
            self.average_cycle_length,
            self.average_flow_length,
            self.records.len()
        );

        RollingAverages {
            cycle_length: self.average_cycle_length,
            flow_length: self.average_flow_length,
        }
    }

    /// Store symptoms for a date, replacing any earlier entry for that date
    pub fn upsert_symptom(&mut self, record: SymptomRecord) {
        match self.symptoms.iter_mut().find(|s| s.date == record.date) {
            Some(existing) => {
                tracing::debug!("Replacing symptoms for {}", record.date);
                *existing = record;
            }
            None => {
                tracing::debug!("Recording symptoms for {}", record.date);
                self.symptoms.insert(0, record);
            }
        }
    }

    /// Symptoms logged on `date`, if any
    pub fn symptoms_on(&self, date: NaiveDate) -> Option<&SymptomRecord> {
        self.symptoms.iter().find(|s| s.date == date)
    }

    /// Records overlapping the given month
    pub fn records_in_month(&self, year: i32, month: u32) -> Result<Vec<&CycleRecord>> {
        let first = first_of_month(year, month)?;
        let last = first + Duration::days(days_in_month(year, month)? as i64 - 1);
        Ok(self
            .records
            .iter()
            .filter(|r| r.start_date <= last && r.end_date >= first)
            .collect())
    }

    /// Summary numbers for the statistics panel
    pub fn stats(&self) -> CycleStats {
        let cycles = valid_cycle_lengths(&self.records);
        let latest = self.records.first();

        CycleStats {
            total_records: self.records.len(),
            average_cycle_length: self.average_cycle_length,
            average_flow_length: self.average_flow_length,
            shortest_cycle: cycles.iter().copied().min(),
            longest_cycle: cycles.iter().copied().max(),
            last_period_start: latest.map(|r| r.start_date),
            last_period_end: latest.map(|r| r.end_date),
        }
    }
}

/// Plausible start-to-start deltas between neighbouring records
fn valid_cycle_lengths(records: &[CycleRecord]) -> Vec<i64> {
    records
        .windows(2)
        .map(|pair| days_between(pair[1].start_date, pair[0].start_date).abs())
        .filter(|len| VALID_CYCLE_LENGTHS.contains(len))
        .collect()
}

/// Rounded mean of the valid cycle deltas, or `None` if there are none
pub fn average_cycle_length(records: &[CycleRecord]) -> Option<i64> {
    rounded_mean(&valid_cycle_lengths(records))
}

/// Rounded mean of the valid flow lengths, or `None` if there are none
pub fn average_flow_length(records: &[CycleRecord]) -> Option<i64> {
    let lengths: Vec<i64> = records
        .iter()
        .map(CycleRecord::flow_length)
        .filter(|len| VALID_FLOW_LENGTHS.contains(len))
        .collect();
    rounded_mean(&lengths)
}

fn rounded_mean(values: &[i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let sum: i64 = values.iter().sum();
    Some((sum as f64 / values.len() as f64).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;
    use crate::{FlowIntensity, Mood, SymptomTag};

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn record(start: &str, end: &str) -> CycleRecord {
        CycleRecord::new(d(start), d(end), FlowIntensity::Normal)
    }

    #[test]
    fn test_default_history() {
        let history = CycleHistory::default();
        assert!(history.records.is_empty());
        assert_eq!(history.last_start_date, None);
        assert_eq!(history.average_cycle_length, 28);
        assert_eq!(history.average_flow_length, 5);
    }

    #[test]
    fn test_first_record_keeps_default_cycle() {
        crate::logging::init_test();
        let mut history = CycleHistory::default();
        let averages = history.commit_record(record("2024-01-01", "2024-01-05")).unwrap();

        assert_eq!(averages.cycle_length, 28);
        assert_eq!(averages.flow_length, 5);
        assert_eq!(history.last_start_date, Some(d("2024-01-01")));
    }

    #[test]
    fn test_cycle_average_discards_outliers() {
        let mut history = CycleHistory::default();
        history.commit_record(record("2024-01-01", "2024-01-05")).unwrap();
        let averages = history.commit_record(record("2024-01-29", "2024-02-02")).unwrap();
        assert_eq!(averages.cycle_length, 28);

        // 46 days after Jan 29 is out of range
        let averages = history.commit_record(record("2024-03-15", "2024-03-19")).unwrap();
        assert_eq!(averages.cycle_length, 28);
        assert_eq!(history.records[0].start_date, d("2024-03-15"));
        assert_eq!(history.last_start_date, Some(d("2024-03-15")));
    }

    #[test]
    fn test_cycle_average_rounds() {
        let mut history = CycleHistory::default();
        history.commit_record(record("2024-01-01", "2024-01-04")).unwrap();
        history.commit_record(record("2024-01-28", "2024-01-31")).unwrap(); // 27
        let averages = history.commit_record(record("2024-02-26", "2024-02-29")).unwrap(); // 29
        assert_eq!(averages.cycle_length, 28);

        let averages = history.commit_record(record("2024-03-26", "2024-03-29")).unwrap(); // 29
        // (27 + 29 + 29) / 3 = 28.33 → 28
        assert_eq!(averages.cycle_length, 28);
        assert_eq!(averages.flow_length, 4);
    }

    #[test]
    fn test_previous_cycle_average_retained_when_all_invalid() {
        let mut history = CycleHistory::new(31, 5);
        history.commit_record(record("2024-01-01", "2024-01-05")).unwrap();
        let averages = history.commit_record(record("2024-01-11", "2024-01-15")).unwrap();
        assert_eq!(averages.cycle_length, 31);
    }

    #[test]
    fn test_flow_length_is_inclusive() {
        let r = record("2024-01-01", "2024-01-05");
        assert_eq!(r.flow_length(), 5);
        assert_eq!(average_flow_length(&[r]), Some(5));
    }

    #[test]
    fn test_flow_average_discards_outliers_and_defaults() {
        let single_day = record("2024-01-01", "2024-01-01");
        let two_weeks = record("2024-02-01", "2024-02-14");
        assert_eq!(average_flow_length(&[single_day.clone(), two_weeks.clone()]), None);

        let mut history = CycleHistory::new(28, 7);
        history.commit_record(single_day).unwrap();
        assert_eq!(history.average_flow_length, DEFAULT_FLOW_LENGTH);

        let mixed = vec![record("2024-01-01", "2024-01-03"), record("2024-02-01", "2024-02-06")];
        // 3 and 6 → 4.5 → 5
        assert_eq!(average_flow_length(&mixed), Some(5));
    }

    #[test]
    fn test_rejects_end_before_start() {
        let mut history = CycleHistory::default();
        let result = history.commit_record(record("2024-01-05", "2024-01-01"));
        assert!(matches!(result, Err(Error::MalformedRecord(_))));
        assert!(history.records.is_empty());
        assert_eq!(history.last_start_date, None);
    }

    #[test]
    fn test_remove_record_resets_last_start() {
        let mut history = CycleHistory::default();
        history.commit_record(record("2024-01-01", "2024-01-05")).unwrap();
        history.commit_record(record("2024-01-31", "2024-02-04")).unwrap();
        assert_eq!(history.average_cycle_length, 30);

        let newest = history.records[0].id;
        history.remove_record(newest).unwrap();
        assert_eq!(history.last_start_date, Some(d("2024-01-01")));
        assert_eq!(history.records.len(), 1);

        let last = history.records[0].id;
        history.remove_record(last).unwrap();
        assert_eq!(history.last_start_date, None);

        assert!(matches!(history.remove_record(last), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_symptom_upsert_by_date() {
        let mut history = CycleHistory::default();

        let mut first = SymptomRecord::new(d("2024-01-02"));
        first.symptoms = vec![SymptomTag::Cramps];
        history.upsert_symptom(first);

        let mut other_day = SymptomRecord::new(d("2024-01-03"));
        other_day.mood = Some(Mood::Happy);
        history.upsert_symptom(other_day);

        let mut replacement = SymptomRecord::new(d("2024-01-02"));
        replacement.symptoms = vec![SymptomTag::Headache, SymptomTag::Fatigue];
        replacement.note = "rough day".into();
        history.upsert_symptom(replacement);

        assert_eq!(history.symptoms.len(), 2);
        let stored = history.symptoms_on(d("2024-01-02")).unwrap();
        assert_eq!(stored.symptoms, vec![SymptomTag::Headache, SymptomTag::Fatigue]);
        assert_eq!(stored.note, "rough day");
        assert!(history.symptoms_on(d("2024-01-04")).is_none());
    }

    #[test]
    fn test_records_in_month() {
        let mut history = CycleHistory::default();
        history.commit_record(record("2024-01-29", "2024-02-02")).unwrap();
        history.commit_record(record("2024-02-26", "2024-03-01")).unwrap();
        history.commit_record(record("2024-03-25", "2024-03-29")).unwrap();

        assert_eq!(history.records_in_month(2024, 2).unwrap().len(), 2);
        assert_eq!(history.records_in_month(2024, 3).unwrap().len(), 2);
        assert_eq!(history.records_in_month(2024, 4).unwrap().len(), 0);
    }

    #[test]
    fn test_stats() {
        let mut history = CycleHistory::default();
        assert_eq!(history.stats().total_records, 0);
        assert_eq!(history.stats().shortest_cycle, None);

        history.commit_record(record("2024-01-01", "2024-01-05")).unwrap();
        history.commit_record(record("2024-01-27", "2024-01-31")).unwrap(); // 26
        history.commit_record(record("2024-02-27", "2024-03-02")).unwrap(); // 31

        let stats = history.stats();
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.shortest_cycle, Some(26));
        assert_eq!(stats.longest_cycle, Some(31));
        assert_eq!(stats.last_period_start, Some(d("2024-02-27")));
        assert_eq!(stats.last_period_end, Some(d("2024-03-02")));
        assert_eq!(stats.average_cycle_length, 29);
    }
}
