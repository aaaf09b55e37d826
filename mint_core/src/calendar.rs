//! Month grid generation for the period calendar.
//!
//! A grid is always 6 rows of 7 days starting on Sunday. Leading cells are
//! the tail of the previous month, trailing cells the head of the next one.
//! Only cells of the displayed month are annotated.

use crate::cycle::DayKinds;
use crate::dates::{
    add_days, days_in_month, first_of_month, format_date, next_month, previous_month,
    weekday_index,
};
use crate::{CalendarCell, CycleHistory, Error, PhaseClass, Result};
use chrono::{Datelike, NaiveDate};

/// Cells in every month grid
pub const GRID_CELLS: usize = 42;

/// Build the 42-cell grid for `year`/`month` (1-12)
///
/// Fails with `InvalidDate` when the month does not exist.
pub fn month_grid(
    year: i32,
    month: u32,
    history: &CycleHistory,
    today: NaiveDate,
) -> Result<Vec<CalendarCell>> {
    let first = first_of_month(year, month)?;
    let length = days_in_month(year, month)?;
    let leading = weekday_index(first) as i64;

    let mut cells = Vec::with_capacity(GRID_CELLS);

    // Tail of the previous month
    let (prev_year, prev_month) = previous_month(year, month);
    tracing::debug!(
        "Building grid for {}-{:02}: {} days from {}-{:02}",
        year,
        month,
        leading,
        prev_year,
        prev_month
    );
    for offset in (1..=leading).rev() {
        cells.push(outside_cell(shift(first, -offset)?));
    }

    // The displayed month
    for day in 0..length as i64 {
        let date = shift(first, day)?;
        let kinds = DayKinds::evaluate(history, date, today);
        cells.push(CalendarCell {
            day_number: date.day(),
            iso_date: format_date(date),
            belongs_to_displayed_month: true,
            is_today: kinds.is_today,
            phase_class: kinds.display_class(),
        });
    }

    // Head of the next month
    let (next_year, next_month) = next_month(year, month);
    let next_first = first_of_month(next_year, next_month)?;
    let trailing = GRID_CELLS - cells.len();
    for offset in 0..trailing as i64 {
        cells.push(outside_cell(shift(next_first, offset)?));
    }

    Ok(cells)
}

fn shift(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    add_days(date, days)
        .ok_or_else(|| Error::InvalidDate(format!("{} shifted by {} days", date, days)))
}

fn outside_cell(date: NaiveDate) -> CalendarCell {
    CalendarCell {
        day_number: date.day(),
        iso_date: format_date(date),
        belongs_to_displayed_month: false,
        is_today: false,
        phase_class: PhaseClass::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;
    use crate::CycleRecord;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn sample_history() -> CycleHistory {
        let mut history = CycleHistory::default();
        history
            .records
            .push(CycleRecord::new(d("2024-01-28"), d("2024-02-01"), Default::default()));
        history.last_start_date = Some(d("2024-01-28"));
        history
    }

    #[test]
    fn test_grid_always_has_42_cells() {
        let history = sample_history();
        let today = d("2024-05-05");
        for year in [2023, 2024, 2025] {
            for month in 1..=12 {
                let grid = month_grid(year, month, &history, today).unwrap();
                assert_eq!(grid.len(), GRID_CELLS, "{}-{}", year, month);
            }
        }
    }

    #[test]
    fn test_leap_february() {
        let history = CycleHistory::default();
        let today = d("2000-01-01");

        let leap = month_grid(2024, 2, &history, today).unwrap();
        assert!(leap
            .iter()
            .any(|c| c.iso_date == "2024-02-29" && c.belongs_to_displayed_month));

        let common = month_grid(2023, 2, &history, today).unwrap();
        assert!(!common.iter().any(|c| c.iso_date == "2023-02-29"));
        assert_eq!(
            common.iter().filter(|c| c.belongs_to_displayed_month).count(),
            28
        );
    }

    #[test]
    fn test_grid_starts_on_sunday_before_first() {
        let history = CycleHistory::default();
        // 2024-02-01 is a Thursday: four days of January lead
        let grid = month_grid(2024, 2, &history, d("2000-01-01")).unwrap();
        let leading: Vec<_> = grid.iter().take(4).map(|c| c.iso_date.as_str()).collect();
        assert_eq!(leading, vec!["2024-01-28", "2024-01-29", "2024-01-30", "2024-01-31"]);
        assert!(grid[..4].iter().all(|c| !c.belongs_to_displayed_month));
        assert_eq!(grid[4].iso_date, "2024-02-01");
        assert_eq!(grid[4].day_number, 1);
    }

    #[test]
    fn test_month_starting_on_sunday_has_no_leading_cells() {
        let history = CycleHistory::default();
        let grid = month_grid(2024, 9, &history, d("2000-01-01")).unwrap();
        assert_eq!(grid[0].iso_date, "2024-09-01");
        assert!(grid[0].belongs_to_displayed_month);
        // 30 days of September, 12 days of October
        assert_eq!(grid[41].iso_date, "2024-10-12");
    }

    #[test]
    fn test_year_boundaries() {
        let history = CycleHistory::default();
        let today = d("2000-01-01");

        // 2025-01-01 is a Wednesday
        let january = month_grid(2025, 1, &history, today).unwrap();
        assert_eq!(january[0].iso_date, "2024-12-29");

        let december = month_grid(2024, 12, &history, today).unwrap();
        let last = december.last().unwrap();
        assert!(last.iso_date.starts_with("2025-01-"));
        assert!(!last.belongs_to_displayed_month);
    }

    #[test]
    fn test_adjacent_month_cells_are_not_annotated() {
        let history = sample_history();
        // February grid leads with Jan 28-31, all recorded period days
        let grid = month_grid(2024, 2, &history, d("2024-01-29")).unwrap();
        for cell in grid.iter().filter(|c| !c.belongs_to_displayed_month) {
            assert_eq!(cell.phase_class, PhaseClass::None);
            assert!(!cell.is_today);
        }
        let feb_first = grid.iter().find(|c| c.iso_date == "2024-02-01").unwrap();
        assert_eq!(feb_first.phase_class, PhaseClass::Menstrual);
    }

    #[test]
    fn test_today_marker_in_grid() {
        let history = sample_history();
        let grid = month_grid(2024, 2, &history, d("2024-02-01")).unwrap();
        let cell = grid.iter().find(|c| c.iso_date == "2024-02-01").unwrap();
        assert!(cell.is_today);
        assert_eq!(cell.phase_class, PhaseClass::Today);
    }

    #[test]
    fn test_last_representable_month_is_an_error() {
        let history = CycleHistory::default();
        let max = NaiveDate::MAX;
        let result = month_grid(max.year(), max.month(), &history, d("2024-01-01"));
        assert!(matches!(result, Err(Error::InvalidDate(_))));
    }

    #[test]
    fn test_unprojectable_history_still_renders() {
        let mut history = sample_history();
        history.average_cycle_length = 1_000_000_000_000_000;

        let grid = month_grid(2024, 2, &history, d("2024-02-10")).unwrap();
        assert_eq!(grid.len(), GRID_CELLS);
        let feb_first = grid.iter().find(|c| c.iso_date == "2024-02-01").unwrap();
        assert_eq!(feb_first.phase_class, PhaseClass::Menstrual);
        assert!(!grid
            .iter()
            .any(|c| matches!(c.phase_class, PhaseClass::Fertile | PhaseClass::Ovulation)));
    }

    #[test]
    fn test_invalid_month_rejected() {
        let history = CycleHistory::default();
        assert!(month_grid(2024, 0, &history, d("2024-01-01")).is_err());
        assert!(month_grid(2024, 13, &history, d("2024-01-01")).is_err());
    }
}
