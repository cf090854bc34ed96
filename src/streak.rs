use crate::config::{Configuration, StreakSensitivity};
use crate::habits::HabitId;
use crate::models::{DayRecord, StreakState};
use crate::validator::is_satisfied;

pub const MAX_RECOVERY_DAYS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakOutcome {
    AlreadyEvaluated,
    Stale,
    Disabled,
    /// The day was never finalized; silence is neutral.
    NotCounted,
    Extended,
    Recovering(u32),
    Recovered,
    StillRecovering,
    NothingToBreak,
    Broken,
    Forgiven,
}

pub fn evaluate(
    habit: HabitId,
    record: &DayRecord,
    state: &StreakState,
    config: &Configuration,
) -> (StreakState, StreakOutcome) {
    match state.last_evaluated {
        Some(last) if last == record.date => return (state.clone(), StreakOutcome::AlreadyEvaluated),
        Some(last) if last > record.date => return (state.clone(), StreakOutcome::Stale),
        _ => {}
    }
    if !config.is_enabled(habit) {
        return (state.clone(), StreakOutcome::Disabled);
    }
    if !record.finalized {
        return (state.clone(), StreakOutcome::NotCounted);
    }

    let satisfied = is_satisfied(habit, record, config);
    let mut next = state.clone();
    next.last_evaluated = Some(record.date);

    if state.is_recovering() {
        if !satisfied {
            next.last_missed = Some(record.date);
            return (next, StreakOutcome::StillRecovering);
        }
        next.recovery_days_remaining -= 1;
        if next.recovery_days_remaining == 0 {
            next.current = 1;
            next.best = next.best.max(1);
            return (next, StreakOutcome::Recovered);
        }
        next.current = 0;
        let remaining = next.recovery_days_remaining;
        return (next, StreakOutcome::Recovering(remaining));
    }

    if satisfied {
        next.current = next.current.saturating_add(1);
        next.best = next.best.max(next.current);
        return (next, StreakOutcome::Extended);
    }

    let previous_was_miss = state.last_missed.is_some() && state.last_missed == state.last_evaluated;
    next.last_missed = Some(record.date);
    if state.current == 0 {
        return (next, StreakOutcome::NothingToBreak);
    }

    let prior = state.current;
    next.best = next.best.max(prior);
    match config.sensitivity {
        StreakSensitivity::Strict => {
            next.current = 0;
            next.recovery_days_remaining = recovery_days_for(prior);
        }
        StreakSensitivity::Moderate => {
            next.current = prior / 2;
        }
        StreakSensitivity::Lenient => {
            if !previous_was_miss {
                return (next, StreakOutcome::Forgiven);
            }
            next.current = 0;
        }
    }
    next.last_broken = Some(record.date);
    (next, StreakOutcome::Broken)
}

/// Longer streaks owe longer cooldowns, one day per three streak days, capped.
pub fn recovery_days_for(prior_streak: u32) -> u32 {
    prior_streak.div_ceil(3).min(MAX_RECOVERY_DAYS)
}
