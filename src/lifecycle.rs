use crate::config::{Configuration, parse_clock};
use crate::day_state::{self, classify_finalized};
use crate::errors::TrackerError;
use crate::habits::STREAK_HABITS;
use crate::models::{
    DayPatch, DayRecord, DayState, MIT_COUNT, Preview, StatsResponse, StreakStates, TaskItem,
    TerminalState,
};
use crate::score::{self, ScoreInputs, ScoreSnapshot};
use crate::stats;
use crate::storage::Store;
use crate::streak::{self, StreakOutcome};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, warn};

const MAX_TASKS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub today: NaiveDate,
    /// Dates closed as NOT_COUNTED by this run.
    pub closed: Vec<NaiveDate>,
    pub kept: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalizeOutcome {
    pub record: DayRecord,
    pub state: TerminalState,
    pub streaks: StreakStates,
    pub score: ScoreSnapshot,
}

pub struct Tracker<S: Store> {
    store: S,
}

impl<S: Store> Tracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn today(&mut self, now: NaiveDateTime) -> Result<DayRecord, TrackerError> {
        let config = self.store.load_configuration().await?;
        let report = self.sweep_with(&config, now).await?;
        self.ensure_record(report.today).await
    }

    pub async fn day(&self, date: NaiveDate) -> Result<DayRecord, TrackerError> {
        Ok(self
            .store
            .load_day_record(date)
            .await?
            .unwrap_or_else(|| DayRecord::new(date)))
    }

    pub async fn current_state(
        &self,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<DayState, TrackerError> {
        let config = self.store.load_configuration().await?;
        let record = self.day(date).await?;
        Ok(day_state::current_state(&record, config.logical_date(now)))
    }

    pub async fn preview_final_state(&self, date: NaiveDate) -> Result<Preview, TrackerError> {
        let config = self.store.load_configuration().await?;
        let record = self.day(date).await?;
        Ok(day_state::preview_final_state(&record, &config))
    }

    pub async fn update_day(
        &mut self,
        date: NaiveDate,
        patch: DayPatch,
        now: NaiveDateTime,
    ) -> Result<DayRecord, TrackerError> {
        let config = self.store.load_configuration().await?;
        self.sweep_with(&config, now).await?;
        let mut record = self.day(date).await?;
        if record.finalized {
            return Err(TrackerError::AlreadyFinalized { date });
        }
        if date != config.logical_date(now) {
            return Err(TrackerError::DayClosed { date });
        }

        apply_patch(&mut record, patch)?;
        record.last_interaction = Some(now);
        self.store.save_day_record(&record).await?;
        debug!(%date, "day record updated");
        Ok(record)
    }

    pub async fn finalize(
        &mut self,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<FinalizeOutcome, TrackerError> {
        let config = self.store.load_configuration().await?;
        self.sweep_with(&config, now).await?;
        let mut record = self.day(date).await?;
        if record.finalized {
            return Err(TrackerError::AlreadyFinalized { date });
        }
        let today = config.logical_date(now);
        if date != today {
            return Err(TrackerError::DayClosed { date });
        }
        validate_record(&record)?;

        record.finalized = true;
        record.finalized_at = Some(now);
        record.last_interaction = Some(now);
        let (state, failing) = classify_finalized(&record, &config);
        record.terminal_state = Some(state);

        let mut streaks = self.store.load_streak_states().await?;
        for habit in STREAK_HABITS {
            let current = streaks.get(&habit).cloned().unwrap_or_default();
            let (next, outcome) = streak::evaluate(habit, &record, &current, &config);
            if outcome == StreakOutcome::Broken {
                info!(%date, habit = %habit, from = current.current, to = next.current, "streak broken");
            }
            streaks.insert(habit, next);
        }

        // Scored before the commit so nothing can fail once the day is persisted.
        let score = self.score_with(&config, &streaks, now, Some(&record)).await?;
        self.store.commit_finalized(&record, &streaks).await?;
        info!(
            %date,
            state = ?state,
            failing = ?failing,
            score = score.score,
            "day finalized"
        );

        Ok(FinalizeOutcome {
            record,
            state,
            streaks,
            score,
        })
    }

    pub async fn run_rollover_sweep(&mut self, now: NaiveDateTime) -> Result<SweepReport, TrackerError> {
        let config = self.store.load_configuration().await?;
        self.sweep_with(&config, now).await
    }

    async fn sweep_with(
        &mut self,
        config: &Configuration,
        now: NaiveDateTime,
    ) -> Result<SweepReport, TrackerError> {
        let today = config.logical_date(now);
        let mut report = SweepReport {
            today,
            closed: Vec::new(),
            kept: Vec::new(),
        };

        let last_active = self.store.load_last_active_date().await?;
        if let Some(last) = last_active {
            if last > today {
                warn!(%last, %today, "last active date is ahead of today, skipping sweep");
                self.ensure_record(today).await?;
                return Ok(report);
            }
            let mut date = last;
            while date < today {
                match self.store.load_day_record(date).await? {
                    Some(record) if record.finalized => report.kept.push(date),
                    Some(record) if record.terminal_state == Some(TerminalState::NotCounted) => {}
                    existing => {
                        let mut record = existing.unwrap_or_else(|| DayRecord::new(date));
                        record.finalized = false;
                        record.terminal_state = Some(TerminalState::NotCounted);
                        self.store.save_day_record(&record).await?;
                        report.closed.push(date);
                    }
                }
                date += Duration::days(1);
            }
        }

        self.ensure_record(today).await?;
        if last_active != Some(today) {
            self.store.save_last_active_date(today).await?;
        }

        if !report.closed.is_empty() {
            info!(%today, closed = report.closed.len(), "rollover closed unfinalized days");
        }
        Ok(report)
    }

    pub async fn streaks(&self) -> Result<StreakStates, TrackerError> {
        Ok(self.store.load_streak_states().await?)
    }

    pub async fn score(&self, now: NaiveDateTime) -> Result<ScoreSnapshot, TrackerError> {
        let config = self.store.load_configuration().await?;
        let streaks = self.store.load_streak_states().await?;
        self.score_with(&config, &streaks, now, None).await
    }

    pub async fn history(&self, now: NaiveDateTime) -> Result<StatsResponse, TrackerError> {
        let config = self.store.load_configuration().await?;
        let today = config.logical_date(now);
        let from = stats::history_start(today);
        let records = self.store.load_day_range(from, today).await?;
        Ok(stats::build_history_at(today, &records))
    }

    async fn score_with(
        &self,
        config: &Configuration,
        streaks: &StreakStates,
        now: NaiveDateTime,
        pending: Option<&DayRecord>,
    ) -> Result<ScoreSnapshot, TrackerError> {
        let today = config.logical_date(now);
        let yesterday = today - Duration::days(1);
        let mut window = self
            .store
            .load_day_range(today - Duration::days(score::WINDOW_DAYS - 1), today)
            .await?;
        if let Some(pending) = pending {
            window.retain(|record| record.date != pending.date);
            window.push(pending.clone());
        }
        let yesterday_record = self.store.load_day_record(yesterday).await?;
        let today_record = window.iter().find(|record| record.date == today);

        let inputs = ScoreInputs {
            today,
            hour_of_day: config.logical_hour(now),
            window: &window,
            today_record,
            yesterday_record: yesterday_record.as_ref(),
        };
        Ok(score::compute_score(&inputs, streaks, config))
    }

    async fn ensure_record(&mut self, date: NaiveDate) -> Result<DayRecord, TrackerError> {
        if let Some(record) = self.store.load_day_record(date).await? {
            return Ok(record);
        }
        let record = DayRecord::new(date);
        self.store.save_day_record(&record).await?;
        debug!(%date, "created day record");
        Ok(record)
    }
}

fn apply_patch(record: &mut DayRecord, patch: DayPatch) -> Result<(), TrackerError> {
    if let Some(raw) = patch.wake_time {
        record.wake_time = if raw.trim().is_empty() {
            None
        } else {
            Some(parse_clock(&raw).ok_or_else(|| {
                TrackerError::Validation(format!("wake time must be HH:MM, got {raw:?}"))
            })?)
        };
    }
    if let Some(done) = patch.learning_done {
        record.learning_done = done;
    }
    if let Some(hours) = patch.learning_hours {
        record.learning_hours = check_hours("learning hours", hours)?;
    }
    if let Some(topic) = patch.learning_topic {
        record.learning_topic = topic;
    }
    if let Some(done) = patch.workout_done {
        record.workout_done = done;
    }
    if let Some(kind) = patch.workout_type {
        record.workout_type = kind;
    }
    if let Some(hours) = patch.screen_time_hours {
        record.screen_time_hours = check_hours("screen time", hours)?;
    }
    if let Some(mood) = patch.mood {
        record.mood = match mood {
            0 => None,
            1..=5 => Some(mood),
            other => {
                return Err(TrackerError::Validation(format!(
                    "mood must be between 1 and 5, got {other}"
                )));
            }
        };
    }
    if let Some(mits) = patch.mits {
        if mits.len() > MIT_COUNT {
            return Err(TrackerError::Validation(format!(
                "at most {MIT_COUNT} most important tasks, got {}",
                mits.len()
            )));
        }
        let mut slots: [TaskItem; MIT_COUNT] = Default::default();
        for (slot, mit) in slots.iter_mut().zip(mits) {
            *slot = mit;
        }
        record.mits = slots;
    }
    if let Some(tasks) = patch.tasks {
        if tasks.len() > MAX_TASKS {
            return Err(TrackerError::Validation(format!(
                "at most {MAX_TASKS} additional tasks, got {}",
                tasks.len()
            )));
        }
        record.tasks = tasks;
    }
    Ok(())
}

fn check_hours(field: &str, hours: f64) -> Result<f64, TrackerError> {
    if hours.is_finite() && (0.0..=24.0).contains(&hours) {
        Ok(hours)
    } else {
        Err(TrackerError::Validation(format!(
            "{field} must be between 0 and 24, got {hours}"
        )))
    }
}

fn validate_record(record: &DayRecord) -> Result<(), TrackerError> {
    check_hours("learning hours", record.learning_hours)?;
    check_hours("screen time", record.screen_time_hours)?;
    if record.learning_done && record.learning_hours <= 0.0 {
        return Err(TrackerError::Validation(
            "learning is marked done but no hours were logged".into(),
        ));
    }
    if let Some(mood) = record.mood {
        if !(1..=5).contains(&mood) {
            return Err(TrackerError::Validation(format!(
                "mood must be between 1 and 5, got {mood}"
            )));
        }
    }
    Ok(())
}
