use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitId {
    Learning,
    #[serde(alias = "gym")]
    Workout,
    Sleep,
    #[serde(alias = "screenTime")]
    ScreenTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HabitShape {
    FlagWithHours,
    Flag,
    TimeWithTolerance,
    Ceiling,
}

pub const ALL_HABITS: [HabitId; 4] = [
    HabitId::Learning,
    HabitId::Workout,
    HabitId::Sleep,
    HabitId::ScreenTime,
];

pub const STREAK_HABITS: [HabitId; 3] = [HabitId::Learning, HabitId::Workout, HabitId::Sleep];

impl HabitId {
    pub fn key(self) -> &'static str {
        match self {
            HabitId::Learning => "learning",
            HabitId::Workout => "workout",
            HabitId::Sleep => "sleep",
            HabitId::ScreenTime => "screen_time",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            HabitId::Learning => "Learning",
            HabitId::Workout => "Workout",
            HabitId::Sleep => "Wake on time",
            HabitId::ScreenTime => "Screen time",
        }
    }

    pub fn shape(self) -> HabitShape {
        match self {
            HabitId::Learning => HabitShape::FlagWithHours,
            HabitId::Workout => HabitShape::Flag,
            HabitId::Sleep => HabitShape::TimeWithTolerance,
            HabitId::ScreenTime => HabitShape::Ceiling,
        }
    }

    pub fn tracks_streak(self) -> bool {
        STREAK_HABITS.contains(&self)
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownHabit(pub String);

impl FromStr for HabitId {
    type Err = UnknownHabit;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "learning" => Ok(HabitId::Learning),
            "workout" | "gym" => Ok(HabitId::Workout),
            "sleep" => Ok(HabitId::Sleep),
            "screen_time" | "screenTime" => Ok(HabitId::ScreenTime),
            other => Err(UnknownHabit(other.to_string())),
        }
    }
}
