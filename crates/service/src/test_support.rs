#![cfg(test)]
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, TimeZone, Utc};
use models::{StreakStats, User};

use crate::auth::{AuthEvent, AuthEventKind, AuthRepository, SessionManager, Subscription};

pub fn sample_user() -> User {
    let mut user = User::new("5b0c7a52-3f1e-4a51-9b8e-1f1f2d7c0a11", "ada", "ada@example.com");
    user.extra.insert("bio".into(), serde_json::json!("loves recursion"));
    user
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

pub fn sample_stats(current: u32) -> StreakStats {
    StreakStats {
        current_streak: current,
        longest_streak: current.max(12),
        last_active: Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap(),
        streak_percentage: 40.0,
        problems_solved_today: 2,
        weekly_activity: vec![false, true, true, true, true, true, true],
    }
}

/// Record every event of `kind` into a shared vector.
pub fn event_log<R: AuthRepository>(
    manager: &SessionManager<R>,
    kind: AuthEventKind,
) -> (Arc<Mutex<Vec<AuthEvent>>>, Subscription) {
    let log: Arc<Mutex<Vec<AuthEvent>>> = Arc::default();
    let sink = Arc::clone(&log);
    let sub = manager.on_auth_event(kind, move |event| sink.lock().unwrap().push(event.clone()));
    (log, sub)
}
