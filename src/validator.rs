use crate::config::Configuration;
use crate::habits::{ALL_HABITS, HabitId};
use crate::models::DayRecord;
use chrono::NaiveTime;

const MINUTES_PER_DAY: i64 = 24 * 60;

pub fn is_satisfied(habit: HabitId, record: &DayRecord, config: &Configuration) -> bool {
    match habit {
        HabitId::Learning => record.learning_done && record.learning_hours >= config.learning_min_hours,
        HabitId::Workout => record.workout_done,
        HabitId::Sleep => woke_on_time(record, config),
        HabitId::ScreenTime => record.screen_time_hours <= config.screen_time_limit_hours,
    }
}

// Unrecognised ids never block completion.
pub fn is_satisfied_by_key(habit: &str, record: &DayRecord, config: &Configuration) -> bool {
    habit
        .parse::<HabitId>()
        .map(|id| is_satisfied(id, record, config))
        .unwrap_or(true)
}

pub fn enabled_required_habits(config: &Configuration) -> Vec<HabitId> {
    ALL_HABITS
        .into_iter()
        .filter(|habit| config.is_enabled(*habit))
        .collect()
}

fn woke_on_time(record: &DayRecord, config: &Configuration) -> bool {
    let Some(wake) = record.wake_time else {
        return false;
    };
    late_minutes(wake, config.target_wake_time) <= i64::from(config.wake_tolerance_minutes)
}

fn late_minutes(wake: NaiveTime, target: NaiveTime) -> i64 {
    let diff = (wake - target).num_minutes().rem_euclid(MINUTES_PER_DAY);
    if diff > MINUTES_PER_DAY / 2 {
        diff - MINUTES_PER_DAY
    } else {
        diff
    }
}
