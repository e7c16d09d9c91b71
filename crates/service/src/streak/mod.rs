//! Streak display logic: a 30-day activity grid reconstructed from the
//! server's streak count, plus level and milestone metadata.

pub mod calendar;
pub mod level;
pub mod service;

pub use calendar::{reconstruct_calendar, ActivityCalendarDay, StreakCalendar, CALENDAR_DAYS};
pub use level::{milestones, streak_message, Milestone, StreakLevel, LEVELS};
pub use service::{StreakOverview, StreakService};
