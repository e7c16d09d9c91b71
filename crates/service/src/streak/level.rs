use serde::Serialize;

/// Display tier reached once a streak meets `threshold` days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakLevel {
    pub threshold: u32,
    pub label: &'static str,
    pub color: &'static str,
}

/// Tiers in ascending threshold order.
pub static LEVELS: [StreakLevel; 6] = [
    StreakLevel { threshold: 0, label: "Beginner", color: "#64ffda" },
    StreakLevel { threshold: 7, label: "Rising", color: "#4CAF50" },
    StreakLevel { threshold: 14, label: "Pro", color: "#FF9800" },
    StreakLevel { threshold: 30, label: "Expert", color: "#FF5722" },
    StreakLevel { threshold: 50, label: "Master", color: "#9C27B0" },
    StreakLevel { threshold: 100, label: "Legendary", color: "#FFD700" },
];

impl StreakLevel {
    /// Highest tier whose threshold `count` meets.
    pub fn for_count(count: u32) -> &'static StreakLevel {
        LEVELS.iter().rev().find(|level| count >= level.threshold).unwrap_or(&LEVELS[0])
    }

    pub fn next(&self) -> Option<&'static StreakLevel> {
        LEVELS.iter().find(|level| level.threshold > self.threshold)
    }

    /// Days still missing to reach the next tier, `None` at the top.
    pub fn days_to_next(count: u32) -> Option<u32> {
        Self::for_count(count).next().map(|next| next.threshold - count)
    }
}

pub fn streak_message(count: u32) -> &'static str {
    match count {
        0 => "Start your coding journey today!",
        1 => "Great start! Keep the momentum going!",
        2..=6 => "You're building a habit! Keep it up!",
        7..=13 => "Impressive consistency! You're on fire!",
        14..=29 => "Amazing dedication! You're a pro!",
        30..=49 => "Incredible streak! You're an expert!",
        50..=99 => "Legendary status incoming!",
        _ => "You're a coding legend! Incredible dedication!",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Milestone {
    pub days: u32,
    pub title: &'static str,
    pub achieved: bool,
}

const MILESTONES: [(u32, &str); 3] = [(7, "Week Warrior"), (30, "Month Master"), (100, "Century Champion")];

pub fn milestones(count: u32) -> Vec<Milestone> {
    MILESTONES
        .iter()
        .map(|&(days, title)| Milestone { days, title, achieved: count >= days })
        .collect()
}
