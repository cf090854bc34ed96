use crate::config::Configuration;
use crate::habits::HabitId;
use crate::models::{DayRecord, DayState, Preview, TerminalState};
use crate::validator::{enabled_required_habits, is_satisfied};
use chrono::NaiveDate;

pub fn terminal_state(record: &DayRecord, config: &Configuration) -> TerminalState {
    if !record.finalized {
        return TerminalState::NotCounted;
    }
    classify_finalized(record, config).0
}

pub fn ui_state(record: &DayRecord) -> DayState {
    if record.is_untouched() {
        DayState::NotStarted
    } else {
        DayState::InProgress
    }
}

pub fn preview_final_state(record: &DayRecord, config: &Configuration) -> Preview {
    let (state, failing) = classify_finalized(record, config);
    Preview {
        state,
        failing_habits: failing
            .into_iter()
            .map(|habit| habit.display_name().to_string())
            .collect(),
    }
}

pub fn current_state(record: &DayRecord, today: NaiveDate) -> DayState {
    if let Some(state) = record.terminal_state {
        return state.into();
    }
    if record.date < today {
        return DayState::NotCounted;
    }
    ui_state(record)
}

pub(crate) fn classify_finalized(
    record: &DayRecord,
    config: &Configuration,
) -> (TerminalState, Vec<HabitId>) {
    let failing: Vec<HabitId> = enabled_required_habits(config)
        .into_iter()
        .filter(|habit| !is_satisfied(*habit, record, config))
        .collect();

    let state = if failing.is_empty() {
        TerminalState::Completed
    } else {
        TerminalState::Missed
    };
    (state, failing)
}
