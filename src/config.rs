use crate::errors::TrackerError;
use crate::habits::HabitId;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fmt};
use tokio::fs;
use tracing::warn;

const WAKE_TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakSensitivity {
    #[default]
    Strict,
    #[serde(alias = "normal")]
    Moderate,
    Lenient,
}

impl fmt::Display for StreakSensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StreakSensitivity::Strict => "strict",
            StreakSensitivity::Moderate => "moderate",
            StreakSensitivity::Lenient => "lenient",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HabitToggles {
    pub learning: bool,
    pub workout: bool,
    pub sleep: bool,
    pub screen_time: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Configuration {
    pub enabled: HabitToggles,
    pub learning_min_hours: f64,
    pub target_wake_time: NaiveTime,
    pub wake_tolerance_minutes: u32,
    pub screen_time_limit_hours: f64,
    pub weekly_workout_target: u32,
    pub sensitivity: StreakSensitivity,
    pub day_cutoff_hour: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            enabled: HabitToggles {
                learning: true,
                workout: true,
                sleep: true,
                screen_time: true,
            },
            learning_min_hours: 1.0,
            target_wake_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or_default(),
            wake_tolerance_minutes: 30,
            screen_time_limit_hours: 3.0,
            weekly_workout_target: 5,
            sensitivity: StreakSensitivity::Strict,
            day_cutoff_hour: 0,
        }
    }
}

impl Configuration {
    pub fn is_enabled(&self, habit: HabitId) -> bool {
        match habit {
            HabitId::Learning => self.enabled.learning,
            HabitId::Workout => self.enabled.workout,
            HabitId::Sleep => self.enabled.sleep,
            HabitId::ScreenTime => self.enabled.screen_time,
        }
    }

    // Before the cutoff hour, `now` still belongs to the previous day.
    pub fn logical_date(&self, now: NaiveDateTime) -> NaiveDate {
        self.logical_now(now).date()
    }

    pub fn logical_hour(&self, now: NaiveDateTime) -> u32 {
        self.logical_now(now).hour()
    }

    fn logical_now(&self, now: NaiveDateTime) -> NaiveDateTime {
        now - Duration::hours(i64::from(self.day_cutoff_hour))
    }

    pub fn from_toml(source: &str) -> Result<Self, TrackerError> {
        let raw: RawSettings = toml::from_str(source)
            .map_err(|err| TrackerError::InvalidConfiguration(err.to_string()))?;
        raw.validate()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    sensitivity: Option<StreakSensitivity>,
    day_cutoff_hour: Option<u32>,
    weekly_workout_target: Option<u32>,
    learning: Option<RawLearning>,
    #[serde(alias = "gym")]
    workout: Option<RawToggle>,
    sleep: Option<RawSleep>,
    screen_time: Option<RawScreenTime>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawToggle {
    enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLearning {
    enabled: Option<bool>,
    min_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSleep {
    enabled: Option<bool>,
    target_wake_time: Option<String>,
    tolerance_minutes: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScreenTime {
    enabled: Option<bool>,
    daily_limit_hours: Option<f64>,
}

impl RawSettings {
    fn validate(self) -> Result<Configuration, TrackerError> {
        let learning = self.learning.ok_or_else(|| missing("learning"))?;
        let sleep = self.sleep.ok_or_else(|| missing("sleep"))?;
        let screen = self.screen_time.ok_or_else(|| missing("screen_time"))?;

        let learning_min_hours = learning
            .min_hours
            .ok_or_else(|| missing("learning.min_hours"))?;
        if !learning_min_hours.is_finite() || learning_min_hours <= 0.0 || learning_min_hours > 24.0 {
            return Err(invalid(format!(
                "learning.min_hours must be in (0, 24], got {learning_min_hours}"
            )));
        }

        let wake_raw = sleep
            .target_wake_time
            .ok_or_else(|| missing("sleep.target_wake_time"))?;
        let target_wake_time = parse_clock(&wake_raw).ok_or_else(|| {
            invalid(format!("sleep.target_wake_time must be HH:MM, got {wake_raw:?}"))
        })?;
        let wake_tolerance_minutes = sleep
            .tolerance_minutes
            .ok_or_else(|| missing("sleep.tolerance_minutes"))?;
        if wake_tolerance_minutes > 12 * 60 {
            return Err(invalid(format!(
                "sleep.tolerance_minutes must be at most 720, got {wake_tolerance_minutes}"
            )));
        }

        let screen_time_limit_hours = screen
            .daily_limit_hours
            .ok_or_else(|| missing("screen_time.daily_limit_hours"))?;
        if !screen_time_limit_hours.is_finite()
            || screen_time_limit_hours <= 0.0
            || screen_time_limit_hours > 24.0
        {
            return Err(invalid(format!(
                "screen_time.daily_limit_hours must be in (0, 24], got {screen_time_limit_hours}"
            )));
        }

        let weekly_workout_target = self.weekly_workout_target.unwrap_or(5);
        if !(1..=7).contains(&weekly_workout_target) {
            return Err(invalid(format!(
                "weekly_workout_target must be between 1 and 7, got {weekly_workout_target}"
            )));
        }

        let day_cutoff_hour = self.day_cutoff_hour.unwrap_or(0);
        if day_cutoff_hour > 23 {
            return Err(invalid(format!(
                "day_cutoff_hour must be between 0 and 23, got {day_cutoff_hour}"
            )));
        }

        Ok(Configuration {
            enabled: HabitToggles {
                learning: learning.enabled != Some(false),
                workout: self.workout.and_then(|w| w.enabled) != Some(false),
                sleep: sleep.enabled != Some(false),
                screen_time: screen.enabled != Some(false),
            },
            learning_min_hours,
            target_wake_time,
            wake_tolerance_minutes,
            screen_time_limit_hours,
            weekly_workout_target,
            sensitivity: self.sensitivity.unwrap_or_default(),
            day_cutoff_hour,
        })
    }
}

fn missing(field: &str) -> TrackerError {
    TrackerError::InvalidConfiguration(format!("missing required setting `{field}`"))
}

fn invalid(message: String) -> TrackerError {
    TrackerError::InvalidConfiguration(message)
}

pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), WAKE_TIME_FORMAT).ok()
}

pub fn resolve_settings_path() -> PathBuf {
    env::var("APP_SETTINGS_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/settings.toml"))
}

pub async fn load_configuration(path: &Path) -> Result<Configuration, TrackerError> {
    match fs::read_to_string(path).await {
        Ok(source) => Configuration::from_toml(&source),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "settings file not found, using default rules");
            Ok(Configuration::default())
        }
        Err(err) => Err(TrackerError::InvalidConfiguration(format!(
            "failed to read {}: {err}",
            path.display()
        ))),
    }
}
