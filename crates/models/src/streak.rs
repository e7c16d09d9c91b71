use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Payload of `GET /api/streaks/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_active: DateTime<Utc>,
    /// Active days over the last 30, as a percentage. The server counts a
    /// 31-date window, so a fully active user can exceed 100.
    pub streak_percentage: f32,
    pub problems_solved_today: u32,
    /// Last 7 days, oldest first.
    pub weekly_activity: Vec<bool>,
}

impl StreakStats {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.weekly_activity.len() != 7 {
            return Err(ModelError::Validation(format!(
                "weekly_activity must have 7 entries, got {}",
                self.weekly_activity.len()
            )));
        }
        if !self.streak_percentage.is_finite() || self.streak_percentage < 0.0 {
            return Err(ModelError::Validation("streak_percentage out of range".into()));
        }
        Ok(())
    }

    /// `streak_percentage` capped to 0..=100 for display.
    pub fn activity_percentage(&self) -> f32 {
        self.streak_percentage.clamp(0.0, 100.0)
    }

    /// Summary used for calendar reconstruction, dated in the local calendar.
    pub fn snapshot(&self) -> StreakSnapshot {
        StreakSnapshot {
            count: self.current_streak,
            last_active: self.last_active.with_timezone(&Local).date_naive(),
        }
    }
}

/// Server-reported streak summary: `count` consecutive days ending at `last_active`.
///
/// When `count` is zero the date carries no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSnapshot {
    pub count: u32,
    pub last_active: NaiveDate,
}

impl StreakSnapshot {
    pub fn new(count: u32, last_active: NaiveDate) -> Self {
        Self { count, last_active }
    }

    /// First day of the assumed unbroken run, `None` when there is no streak.
    pub fn first_active(&self) -> Option<NaiveDate> {
        if self.count == 0 {
            return None;
        }
        self.last_active.checked_sub_days(chrono::Days::new(u64::from(self.count - 1)))
    }
}
