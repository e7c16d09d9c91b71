use std::sync::Arc;

use chrono::{Local, NaiveDate};
use models::StreakStats;
use serde::Serialize;
use tracing::{debug, instrument};

use super::calendar::StreakCalendar;
use super::level::{milestones, streak_message, Milestone, StreakLevel};
use crate::errors::ServiceError;
use crate::provider::DataProvider;

/// Everything the streak views render, derived from one stats fetch.
#[derive(Debug, Clone, Serialize)]
pub struct StreakOverview {
    pub stats: StreakStats,
    pub calendar: StreakCalendar,
    pub level: &'static StreakLevel,
    pub message: &'static str,
    pub milestones: Vec<Milestone>,
    pub days_to_next_level: Option<u32>,
}

impl StreakOverview {
    pub fn from_stats(stats: StreakStats, today: NaiveDate) -> Self {
        let count = stats.current_streak;
        let calendar = StreakCalendar::build(&stats.snapshot(), today);
        Self {
            calendar,
            level: StreakLevel::for_count(count),
            message: streak_message(count),
            milestones: milestones(count),
            days_to_next_level: StreakLevel::days_to_next(count),
            stats,
        }
    }
}

pub struct StreakService {
    provider: Arc<dyn DataProvider>,
}

impl StreakService {
    pub fn new(provider: Arc<dyn DataProvider>) -> Self {
        Self { provider }
    }

    /// Fetch stats and derive the overview as of `today`. A failed fetch is
    /// returned as-is; call again to retry.
    #[instrument(skip(self))]
    pub async fn overview(&self, today: NaiveDate) -> Result<StreakOverview, ServiceError> {
        let stats = self.provider.streak_stats().await?;
        debug!(current = stats.current_streak, longest = stats.longest_streak, "streak stats fetched");
        Ok(StreakOverview::from_stats(stats, today))
    }

    pub async fn overview_today(&self) -> Result<StreakOverview, ServiceError> {
        self.overview(Local::now().date_naive()).await
    }
}
