use crate::config::Configuration;
use crate::habits::{HabitId, STREAK_HABITS};
use crate::models::{DayRecord, StreakStates};
use crate::validator::is_satisfied;
use chrono::NaiveDate;
use serde::Serialize;

pub const WINDOW_DAYS: i64 = 7;

const LEARNING_WEIGHT: f64 = 30.0;
const WORKOUT_WEIGHT: f64 = 20.0;
const SLEEP_WEIGHT: f64 = 20.0;
const SCREEN_WEIGHT: f64 = 15.0;
const MIT_WEIGHT: f64 = 15.0;
const STREAK_BONUS_CAP: f64 = 10.0;

const LATE_DAY_HOUR: u32 = 20;
const LATE_DAY_PENALTY: f64 = 5.0;
const LATE_WAKE_PENALTY: f64 = 3.0;
const HIGH_SCREEN_TODAY_PENALTY: f64 = 4.0;
const SCREEN_OVERUSE_PENALTY: f64 = 5.0;
const RECOVERY_DAY_PENALTY: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct ScoreInputs<'a> {
    pub today: NaiveDate,
    /// Hour within the logical day, so 0 is the cutoff hour.
    pub hour_of_day: u32,
    pub window: &'a [DayRecord],
    pub today_record: Option<&'a DayRecord>,
    pub yesterday_record: Option<&'a DayRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub learning: f64,
    pub workout: f64,
    pub sleep: f64,
    pub screen_time: f64,
    pub mits: f64,
    pub streak_bonus: f64,
    pub penalties: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSnapshot {
    pub score: u8,
    pub finalized_days: usize,
    pub breakdown: ScoreBreakdown,
}

impl ScoreSnapshot {
    fn empty() -> Self {
        Self {
            score: 0,
            finalized_days: 0,
            breakdown: ScoreBreakdown::default(),
        }
    }
}

pub fn compute_score(
    inputs: &ScoreInputs<'_>,
    streaks: &StreakStates,
    config: &Configuration,
) -> ScoreSnapshot {
    let first_day = inputs.today - chrono::Duration::days(WINDOW_DAYS - 1);
    let finalized: Vec<&DayRecord> = inputs
        .window
        .iter()
        .filter(|record| record.finalized && record.date >= first_day && record.date <= inputs.today)
        .collect();

    if finalized.is_empty() {
        return ScoreSnapshot::empty();
    }

    let window = WINDOW_DAYS as f64;
    let workout_target = f64::from(config.weekly_workout_target);

    let mut breakdown = ScoreBreakdown {
        learning: count_days(&finalized, |r| r.learning_done) / window * LEARNING_WEIGHT,
        workout: (count_days(&finalized, |r| r.workout_done) / workout_target * WORKOUT_WEIGHT)
            .min(WORKOUT_WEIGHT),
        sleep: count_days(&finalized, |r| is_satisfied(HabitId::Sleep, r, config)) / window
            * SLEEP_WEIGHT,
        ..ScoreBreakdown::default()
    };

    let average_screen =
        finalized.iter().map(|r| r.screen_time_hours).sum::<f64>() / finalized.len() as f64;
    let (screen_points, screen_penalty) = screen_tier(average_screen, config.screen_time_limit_hours);
    breakdown.screen_time = screen_points;
    breakdown.penalties += screen_penalty;

    let mit_ratios: Vec<f64> = finalized
        .iter()
        .filter_map(|r| {
            let (done, filled) = r.mit_progress();
            (filled > 0).then(|| done as f64 / filled as f64)
        })
        .collect();
    if !mit_ratios.is_empty() {
        breakdown.mits = mit_ratios.iter().sum::<f64>() / mit_ratios.len() as f64 * MIT_WEIGHT;
    }

    breakdown.streak_bonus = streak_bonus(streaks, config);
    breakdown.penalties += situational_penalties(inputs, streaks, config);

    let total = breakdown.learning
        + breakdown.workout
        + breakdown.sleep
        + breakdown.screen_time
        + breakdown.mits
        + breakdown.streak_bonus
        - breakdown.penalties;

    ScoreSnapshot {
        score: total.round().clamp(0.0, 100.0) as u8,
        finalized_days: finalized.len(),
        breakdown,
    }
}

fn count_days(days: &[&DayRecord], pred: impl Fn(&DayRecord) -> bool) -> f64 {
    days.iter().filter(|r| pred(**r)).count() as f64
}

fn screen_tier(average: f64, goal: f64) -> (f64, f64) {
    if average <= goal {
        (SCREEN_WEIGHT, 0.0)
    } else if average <= goal * 1.5 {
        (10.0, 0.0)
    } else if average <= goal * 2.0 {
        (5.0, 0.0)
    } else {
        (0.0, SCREEN_OVERUSE_PENALTY)
    }
}

fn streak_weight(habit: HabitId) -> f64 {
    match habit {
        HabitId::Learning => 0.6,
        HabitId::Workout => 0.5,
        HabitId::Sleep => 0.4,
        HabitId::ScreenTime => 0.0,
    }
}

fn streak_bonus(streaks: &StreakStates, config: &Configuration) -> f64 {
    STREAK_HABITS
        .into_iter()
        .filter(|habit| config.is_enabled(*habit))
        .filter_map(|habit| streaks.get(&habit).map(|s| f64::from(s.current) * streak_weight(habit)))
        .sum::<f64>()
        .min(STREAK_BONUS_CAP)
}

fn situational_penalties(
    inputs: &ScoreInputs<'_>,
    streaks: &StreakStates,
    config: &Configuration,
) -> f64 {
    let mut penalty = 0.0;

    if config.enabled.learning
        && inputs.hour_of_day >= LATE_DAY_HOUR
        && !inputs.today_record.is_some_and(|r| r.learning_done)
    {
        penalty += LATE_DAY_PENALTY;
    }

    if config.enabled.sleep {
        if let Some(yesterday) = inputs.yesterday_record {
            if yesterday.wake_time.is_some() && !is_satisfied(HabitId::Sleep, yesterday, config) {
                penalty += LATE_WAKE_PENALTY;
            }
        }
    }

    if config.enabled.screen_time
        && inputs
            .today_record
            .is_some_and(|r| r.screen_time_hours > config.screen_time_limit_hours)
    {
        penalty += HIGH_SCREEN_TODAY_PENALTY;
    }

    // Disabled habits keep their recovery frozen without costing points.
    let owed: u32 = streaks
        .iter()
        .filter(|(habit, _)| config.is_enabled(**habit))
        .map(|(_, s)| s.recovery_days_remaining)
        .sum();
    penalty + f64::from(owed) * RECOVERY_DAY_PENALTY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StreakState, TaskItem};
    use chrono::{Duration, NaiveTime};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 11).unwrap()
    }

    fn perfect_day(offset: i64) -> DayRecord {
        let mut record = DayRecord::new(today() - Duration::days(offset));
        record.learning_done = true;
        record.learning_hours = 2.0;
        record.workout_done = true;
        record.wake_time = NaiveTime::from_hms_opt(6, 45, 0);
        record.screen_time_hours = 1.0;
        record.mits[0] = TaskItem { text: "ship".into(), done: true };
        record.finalized = true;
        record
    }

    fn inputs(window: &[DayRecord]) -> ScoreInputs<'_> {
        ScoreInputs {
            today: today(),
            hour_of_day: 12,
            window,
            today_record: None,
            yesterday_record: None,
        }
    }

    #[test]
    fn empty_window_scores_zero() {
        let snapshot = compute_score(&inputs(&[]), &StreakStates::new(), &Configuration::default());
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.finalized_days, 0);
    }

    #[test]
    fn unfinalized_days_do_not_count() {
        let mut day = perfect_day(1);
        day.finalized = false;
        let window = vec![day];
        let snapshot = compute_score(&inputs(&window), &StreakStates::new(), &Configuration::default());
        assert_eq!(snapshot.score, 0);
    }

    #[test]
    fn perfect_week_scores_full_marks() {
        let window: Vec<DayRecord> = (0..7).map(perfect_day).collect();
        let snapshot = compute_score(&inputs(&window), &StreakStates::new(), &Configuration::default());
        assert_eq!(snapshot.breakdown.learning, 30.0);
        assert_eq!(snapshot.breakdown.workout, 20.0);
        assert_eq!(snapshot.breakdown.sleep, 20.0);
        assert_eq!(snapshot.breakdown.screen_time, 15.0);
        assert_eq!(snapshot.breakdown.mits, 15.0);
        assert_eq!(snapshot.score, 100);
    }

    #[test]
    fn days_outside_window_are_ignored() {
        let window = vec![perfect_day(7), perfect_day(30)];
        let snapshot = compute_score(&inputs(&window), &StreakStates::new(), &Configuration::default());
        assert_eq!(snapshot.score, 0);
    }

    #[test]
    fn single_good_day_is_partial() {
        let window = vec![perfect_day(0)];
        let snapshot = compute_score(&inputs(&window), &StreakStates::new(), &Configuration::default());
        // 30/7 + 20/5 + 20/7 + 15 + 15
        assert_eq!(snapshot.score, 41);
    }

    #[test]
    fn screen_tiers_step_down() {
        assert_eq!(screen_tier(2.0, 2.0), (15.0, 0.0));
        assert_eq!(screen_tier(3.0, 2.0), (10.0, 0.0));
        assert_eq!(screen_tier(4.0, 2.0), (5.0, 0.0));
        assert_eq!(screen_tier(4.5, 2.0), (0.0, SCREEN_OVERUSE_PENALTY));
    }

    #[test]
    fn streak_bonus_is_capped() {
        let mut streaks = StreakStates::new();
        for habit in STREAK_HABITS {
            streaks.insert(habit, StreakState { current: 30, best: 30, ..StreakState::default() });
        }
        assert_eq!(streak_bonus(&streaks, &Configuration::default()), STREAK_BONUS_CAP);
    }

    #[test]
    fn recovery_and_late_day_penalties_subtract() {
        let window = vec![perfect_day(1)];
        let base = compute_score(&inputs(&window), &StreakStates::new(), &Configuration::default());

        let mut streaks = StreakStates::new();
        streaks.insert(
            HabitId::Workout,
            StreakState { recovery_days_remaining: 3, ..StreakState::default() },
        );
        let today_record = DayRecord::new(today());
        let late = ScoreInputs {
            hour_of_day: 21,
            today_record: Some(&today_record),
            ..inputs(&window)
        };
        let penalised = compute_score(&late, &streaks, &Configuration::default());
        assert_eq!(penalised.breakdown.penalties, LATE_DAY_PENALTY + 3.0 * RECOVERY_DAY_PENALTY);
        assert!(penalised.score < base.score);
    }

    #[test]
    fn late_wake_yesterday_is_penalised() {
        let mut yesterday = perfect_day(1);
        yesterday.wake_time = NaiveTime::from_hms_opt(9, 30, 0);
        let window = vec![yesterday.clone()];
        let with_yesterday = ScoreInputs {
            yesterday_record: Some(&yesterday),
            ..inputs(&window)
        };
        let snapshot = compute_score(&with_yesterday, &StreakStates::new(), &Configuration::default());
        assert_eq!(snapshot.breakdown.penalties, LATE_WAKE_PENALTY);
    }

    #[test]
    fn score_never_goes_negative() {
        let mut bad = DayRecord::new(today());
        bad.finalized = true;
        bad.screen_time_hours = 12.0;
        let window = vec![bad.clone()];
        let mut streaks = StreakStates::new();
        streaks.insert(
            HabitId::Learning,
            StreakState { recovery_days_remaining: 5, ..StreakState::default() },
        );
        let worst = ScoreInputs {
            hour_of_day: 23,
            today_record: Some(&bad),
            ..inputs(&window)
        };
        assert_eq!(compute_score(&worst, &streaks, &Configuration::default()).score, 0);
    }

    #[test]
    fn disabled_habit_recovery_costs_nothing() {
        let window = vec![perfect_day(1)];
        let mut streaks = StreakStates::new();
        streaks.insert(
            HabitId::Workout,
            StreakState { recovery_days_remaining: 5, ..StreakState::default() },
        );
        let mut config = Configuration::default();
        let clean = compute_score(&inputs(&window), &StreakStates::new(), &config);

        config.enabled.workout = false;
        let frozen = compute_score(&inputs(&window), &streaks, &config);
        assert_eq!(frozen.breakdown.penalties, 0.0);
        assert_eq!(frozen.score, clean.score);

        config.enabled.workout = true;
        let owed = compute_score(&inputs(&window), &streaks, &config);
        assert_eq!(owed.breakdown.penalties, 5.0 * RECOVERY_DAY_PENALTY);
    }

    #[test]
    fn high_screen_time_today_is_penalised_when_enabled() {
        let window = vec![perfect_day(1)];
        let mut today_record = DayRecord::new(today());
        today_record.screen_time_hours = 5.0;
        let with_today = ScoreInputs {
            today_record: Some(&today_record),
            ..inputs(&window)
        };

        let mut config = Configuration::default();
        let snapshot = compute_score(&with_today, &StreakStates::new(), &config);
        assert_eq!(snapshot.breakdown.penalties, HIGH_SCREEN_TODAY_PENALTY);

        config.enabled.screen_time = false;
        let snapshot = compute_score(&with_today, &StreakStates::new(), &config);
        assert_eq!(snapshot.breakdown.penalties, 0.0);
    }

    #[test]
    fn mit_average_skips_days_without_filled_mits() {
        let mut half = perfect_day(1);
        half.mits[1] = TaskItem { text: "review".into(), done: false };
        let mut none_filled = perfect_day(2);
        none_filled.mits[0] = TaskItem::default();
        let window = vec![perfect_day(0), half, none_filled];

        let snapshot = compute_score(&inputs(&window), &StreakStates::new(), &Configuration::default());
        // (1.0 + 0.5) / 2 days with MITs
        assert_eq!(snapshot.breakdown.mits, 0.75 * MIT_WEIGHT);
        assert_eq!(snapshot.finalized_days, 3);
    }
}
