use chrono::{Datelike, Days, NaiveDate};
use models::StreakSnapshot;
use serde::Serialize;

/// Number of days shown in the activity grid, today included.
pub const CALENDAR_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityCalendarDay {
    pub date: NaiveDate,
    pub day_of_month: u32,
    /// Inferred from the streak count, not fetched per day.
    pub is_active: bool,
    pub is_today: bool,
}

/// Rebuild the last [`CALENDAR_DAYS`] days (oldest first) ending at `today`.
///
/// Assumes the streak is an unbroken run of `count` days ending at
/// `last_active`; no day after `last_active` is ever marked active.
pub fn reconstruct_calendar(snapshot: &StreakSnapshot, today: NaiveDate) -> Vec<ActivityCalendarDay> {
    let active = snapshot.first_active().map(|first| first..=snapshot.last_active);
    (0..CALENDAR_DAYS)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
        .map(|date| ActivityCalendarDay {
            date,
            day_of_month: date.day(),
            is_active: active.as_ref().is_some_and(|range| range.contains(&date)),
            is_today: date == today,
        })
        .collect()
}

/// Grid plus how stale the reported streak is.
///
/// The grid is an approximation: when the last activity was before
/// yesterday the backend will reset the streak on the next solve, and the
/// days in between are reported in `gap_days` rather than guessed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreakCalendar {
    pub days: Vec<ActivityCalendarDay>,
    /// True when `today` is more than one day past `last_active`.
    pub is_stale: bool,
    /// Days strictly between `last_active` and `today`.
    pub gap_days: u32,
}

impl StreakCalendar {
    pub fn build(snapshot: &StreakSnapshot, today: NaiveDate) -> Self {
        let gap_days = if snapshot.count == 0 {
            0
        } else {
            let elapsed = today.signed_duration_since(snapshot.last_active).num_days();
            u32::try_from(elapsed - 1).unwrap_or(0)
        };
        Self { days: reconstruct_calendar(snapshot, today), is_stale: gap_days > 0, gap_days }
    }

    pub fn active_days(&self) -> usize {
        self.days.iter().filter(|d| d.is_active).count()
    }
}
