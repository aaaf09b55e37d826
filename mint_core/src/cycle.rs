//! Cycle engine: prediction, phase classification and day-kind queries.
//!
//! Every function here is a pure computation over a borrowed
//! [`CycleHistory`] and explicit dates. Nothing reads the clock and nothing
//! mutates the history.
//!
//! ## Modeling assumptions
//!
//! - The luteal phase is a fixed 14 days, so ovulation is placed 14 days
//!   before the next predicted start.
//! - The fertile window runs from 5 days before ovulation through 1 day after.
//! - A date before the last recorded start is the tail of an unrecorded
//!   previous cycle and classifies as luteal.

use crate::dates::{add_days, days_between};
use crate::{CycleHistory, Phase, PhaseClass, Prediction};
use chrono::NaiveDate;

/// Days from ovulation to the next period start
pub const LUTEAL_PHASE_DAYS: i64 = 14;

/// Fertile days before the ovulation date
pub const FERTILE_DAYS_BEFORE_OVULATION: i64 = 5;

/// Fertile days after the ovulation date
pub const FERTILE_DAYS_AFTER_OVULATION: i64 = 1;

/// Half-width of the ovulation window around the computed ovulation day
pub const OVULATION_WINDOW_RADIUS: i64 = 2;

/// Anchor dates of the cycle following `last_start_date`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleAnchors {
    pub next_start: NaiveDate,
    pub next_end: NaiveDate,
    pub ovulation: NaiveDate,
    pub fertile_start: NaiveDate,
    pub fertile_end: NaiveDate,
}

impl CycleAnchors {
    /// Project the next cycle from a history
    ///
    /// `None` without a last start date, or when an anchor would fall outside
    /// the representable calendar.
    pub fn project(history: &CycleHistory) -> Option<Self> {
        let last_start = history.last_start_date?;
        let next_start = add_days(last_start, history.average_cycle_length)?;
        let ovulation = add_days(next_start, -LUTEAL_PHASE_DAYS)?;

        Some(Self {
            next_start,
            next_end: add_days(next_start, history.average_flow_length.checked_sub(1)?)?,
            ovulation,
            fertile_start: add_days(ovulation, -FERTILE_DAYS_BEFORE_OVULATION)?,
            fertile_end: add_days(ovulation, FERTILE_DAYS_AFTER_OVULATION)?,
        })
    }
}

/// Predict the next cycle relative to `today`
///
/// Returns `None` when no cycle has been recorded yet; that is the normal
/// empty state, not an error. Also `None` when the projection would leave
/// the representable calendar.
///
/// `days_until_next` never goes below 0 (an overdue period reports 0) and
/// `current_cycle_day` never goes below 1.
pub fn predict(history: &CycleHistory, today: NaiveDate) -> Option<Prediction> {
    let last_start = history.last_start_date?;
    let anchors = CycleAnchors::project(history)?;

    let days_until_next = days_between(today, anchors.next_start).max(0);
    let current_cycle_day = (days_between(last_start, today) + 1).max(1);
    let current_phase = classify_phase(
        today,
        last_start,
        history.average_flow_length,
        history.average_cycle_length,
    );

    tracing::debug!(
        "Predicted next start {} ({} days away, cycle day {}, {:?})",
        anchors.next_start,
        days_until_next,
        current_cycle_day,
        current_phase
    );

    Some(Prediction {
        next_start_date: anchors.next_start,
        ovulation_date: anchors.ovulation,
        fertile_window_start: anchors.fertile_start,
        fertile_window_end: anchors.fertile_end,
        days_until_next,
        current_cycle_day,
        current_phase,
    })
}

/// Classify `date` into one of the four cycle phases
///
/// Rules, first match wins:
///
/// 1. Before `last_start` → luteal
/// 2. `days_since < flow_length` → menstrual
/// 3. `days_since < ovulation_day - 2` → follicular
/// 4. `days_since <= ovulation_day + 2` → ovulation
/// 5. Otherwise → luteal
///
/// where `ovulation_day = cycle_length - 14`. Total for every date.
pub fn classify_phase(
    date: NaiveDate,
    last_start: NaiveDate,
    flow_length: i64,
    cycle_length: i64,
) -> Phase {
    let days_since = days_between(last_start, date);
    if days_since < 0 {
        return Phase::Luteal;
    }

    if days_since < flow_length {
        return Phase::Menstrual;
    }

    let ovulation_day = cycle_length.saturating_sub(LUTEAL_PHASE_DAYS);
    if days_since < ovulation_day.saturating_sub(OVULATION_WINDOW_RADIUS) {
        Phase::Follicular
    } else if days_since <= ovulation_day.saturating_add(OVULATION_WINDOW_RADIUS) {
        Phase::Ovulation
    } else {
        Phase::Luteal
    }
}

/// Phase of `date` for a history, or `None` before any cycle is recorded
pub fn phase_on(history: &CycleHistory, date: NaiveDate) -> Option<Phase> {
    history.last_start_date.map(|last_start| {
        classify_phase(
            date,
            last_start,
            history.average_flow_length,
            history.average_cycle_length,
        )
    })
}

/// True if `date` lies inside any recorded period (inclusive)
pub fn is_recorded_period_day(history: &CycleHistory, date: NaiveDate) -> bool {
    history.records.iter().any(|r| r.contains(date))
}

/// True if `date` is within 2 days of the projected ovulation date
pub fn is_ovulation_day(history: &CycleHistory, date: NaiveDate) -> bool {
    CycleAnchors::project(history)
        .map(|a| days_between(a.ovulation, date).abs() <= OVULATION_WINDOW_RADIUS)
        .unwrap_or(false)
}

/// True if `date` lies inside the projected next period
///
/// This window is computed from the averages alone and may overlap recorded
/// periods.
pub fn is_predicted_period_day(history: &CycleHistory, date: NaiveDate) -> bool {
    CycleAnchors::project(history)
        .map(|a| date >= a.next_start && date <= a.next_end)
        .unwrap_or(false)
}

/// True if `date` lies inside the fertile window of the next projected cycle
pub fn is_fertile_day(history: &CycleHistory, date: NaiveDate) -> bool {
    CycleAnchors::project(history)
        .map(|a| date >= a.fertile_start && date <= a.fertile_end)
        .unwrap_or(false)
}

/// Every day-kind predicate for one date
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DayKinds {
    pub is_today: bool,
    pub recorded_period: bool,
    pub ovulation: bool,
    pub predicted_period: bool,
    pub fertile: bool,
}

impl DayKinds {
    pub fn evaluate(history: &CycleHistory, date: NaiveDate, today: NaiveDate) -> Self {
        Self {
            is_today: date == today,
            recorded_period: is_recorded_period_day(history, date),
            ovulation: is_ovulation_day(history, date),
            predicted_period: is_predicted_period_day(history, date),
            fertile: is_fertile_day(history, date),
        }
    }

    /// Collapse to one marker: today > recorded > ovulation > predicted > fertile
    pub fn display_class(&self) -> PhaseClass {
        if self.is_today {
            PhaseClass::Today
        } else if self.recorded_period {
            PhaseClass::Menstrual
        } else if self.ovulation {
            PhaseClass::Ovulation
        } else if self.predicted_period {
            PhaseClass::PredictedMenstrual
        } else if self.fertile {
            PhaseClass::Fertile
        } else {
            PhaseClass::None
        }
    }
}

/// Display class for a single date
pub fn display_class(history: &CycleHistory, date: NaiveDate, today: NaiveDate) -> PhaseClass {
    DayKinds::evaluate(history, date, today).display_class()
}
