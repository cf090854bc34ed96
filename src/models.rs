use crate::habits::HabitId;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MIT_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminalState {
    Completed,
    Missed,
    NotCounted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayState {
    NotStarted,
    InProgress,
    Completed,
    Missed,
    NotCounted,
}

impl From<TerminalState> for DayState {
    fn from(state: TerminalState) -> Self {
        match state {
            TerminalState::Completed => DayState::Completed,
            TerminalState::Missed => DayState::Missed,
            TerminalState::NotCounted => DayState::NotCounted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskItem {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

impl TaskItem {
    pub fn is_filled(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    #[serde(default, with = "clock_format")]
    pub wake_time: Option<NaiveTime>,
    #[serde(default)]
    pub learning_done: bool,
    #[serde(default)]
    pub learning_hours: f64,
    #[serde(default)]
    pub learning_topic: String,
    #[serde(default)]
    pub workout_done: bool,
    #[serde(default)]
    pub workout_type: String,
    #[serde(default)]
    pub screen_time_hours: f64,
    #[serde(default)]
    pub mood: Option<u8>,
    #[serde(default)]
    pub mits: [TaskItem; MIT_COUNT],
    #[serde(default)]
    pub tasks: Vec<TaskItem>,
    #[serde(default)]
    pub finalized: bool,
    #[serde(default)]
    pub finalized_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub terminal_state: Option<TerminalState>,
    #[serde(default)]
    pub last_interaction: Option<NaiveDateTime>,
}

impl DayRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            wake_time: None,
            learning_done: false,
            learning_hours: 0.0,
            learning_topic: String::new(),
            workout_done: false,
            workout_type: String::new(),
            screen_time_hours: 0.0,
            mood: None,
            mits: Default::default(),
            tasks: Vec::new(),
            finalized: false,
            finalized_at: None,
            terminal_state: None,
            last_interaction: None,
        }
    }

    pub fn is_untouched(&self) -> bool {
        self.wake_time.is_none()
            && !self.learning_done
            && self.learning_hours == 0.0
            && self.learning_topic.is_empty()
            && !self.workout_done
            && self.workout_type.is_empty()
            && self.screen_time_hours == 0.0
            && self.mood.is_none()
            && self.mits.iter().all(|mit| *mit == TaskItem::default())
            && self.tasks.is_empty()
    }

    /// (done, filled) across the three MIT slots.
    pub fn mit_progress(&self) -> (usize, usize) {
        let filled = self.mits.iter().filter(|mit| mit.is_filled()).count();
        let done = self
            .mits
            .iter()
            .filter(|mit| mit.is_filled() && mit.done)
            .count();
        (done, filled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakState {
    pub current: u32,
    pub best: u32,
    #[serde(default)]
    pub last_evaluated: Option<NaiveDate>,
    #[serde(default)]
    pub last_broken: Option<NaiveDate>,
    #[serde(default)]
    pub last_missed: Option<NaiveDate>,
    #[serde(default)]
    pub recovery_days_remaining: u32,
}

impl StreakState {
    pub fn is_recovering(&self) -> bool {
        self.recovery_days_remaining > 0
    }
}

pub type StreakStates = BTreeMap<HabitId, StreakState>;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub days: BTreeMap<String, DayRecord>,
    #[serde(default)]
    pub streaks: StreakStates,
    #[serde(default)]
    pub last_active_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DayPatch {
    /// `HH:MM`; an empty string clears the wake time.
    pub wake_time: Option<String>,
    pub learning_done: Option<bool>,
    pub learning_hours: Option<f64>,
    pub learning_topic: Option<String>,
    pub workout_done: Option<bool>,
    pub workout_type: Option<String>,
    pub screen_time_hours: Option<f64>,
    /// 0 clears the mood.
    pub mood: Option<u8>,
    pub mits: Option<Vec<TaskItem>>,
    pub tasks: Option<Vec<TaskItem>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub state: TerminalState,
    pub failing_habits: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DayResponse {
    pub record: DayRecord,
    pub state: DayState,
    pub preview: Option<Preview>,
}

#[derive(Debug, Serialize)]
pub struct DailyPoint {
    pub date: String,
    pub state: DayState,
    pub learning_hours: f64,
    pub screen_time_hours: f64,
    pub mood: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct WeeklyPoint {
    pub week: String,
    pub start_date: String,
    pub end_date: String,
    pub completed: u8,
    pub missed: u8,
    pub not_counted: u8,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub last_7_days: Vec<DailyPoint>,
    pub weekly_totals: Vec<WeeklyPoint>,
}

mod clock_format {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(time) => serializer.serialize_some(&time.format("%H:%M").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => crate::config::parse_clock(value)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid wake time {value:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    #[test]
    fn new_record_is_untouched() {
        let mut record = DayRecord::new(date());
        assert!(record.is_untouched());
        record.last_interaction = Some(date().and_hms_opt(9, 0, 0).unwrap());
        assert!(record.is_untouched());
        record.mits[1].text = "write report".into();
        assert!(!record.is_untouched());
    }

    #[test]
    fn mit_progress_ignores_blank_slots() {
        let mut record = DayRecord::new(date());
        record.mits[0] = TaskItem { text: "a".into(), done: true };
        record.mits[1] = TaskItem { text: "b".into(), done: false };
        record.mits[2] = TaskItem { text: "  ".into(), done: true };
        assert_eq!(record.mit_progress(), (1, 2));
    }

    #[test]
    fn wake_time_serializes_as_clock_text() {
        let mut record = DayRecord::new(date());
        record.wake_time = NaiveTime::from_hms_opt(6, 45, 0);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["wake_time"], "06:45");
        assert_eq!(value["date"], "2026-01-05");

        let back: DayRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back.wake_time, record.wake_time);
    }

    #[test]
    fn sparse_record_json_fills_defaults() {
        let record: DayRecord = serde_json::from_str(r#"{"date":"2026-01-05"}"#).unwrap();
        assert!(record.is_untouched());
        assert!(!record.finalized);
        assert_eq!(record.terminal_state, None);
    }
}
