use crate::day_state::current_state;
use crate::models::{DailyPoint, DayRecord, DayState, StatsResponse, WeeklyPoint};
use crate::storage::date_key;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;

const WEEK_COUNT: usize = 8;

pub fn history_start(today: NaiveDate) -> NaiveDate {
    week_start(today) - Duration::weeks(WEEK_COUNT as i64 - 1)
}

pub fn build_history_at(today: NaiveDate, records: &[DayRecord]) -> StatsResponse {
    let by_date: BTreeMap<String, &DayRecord> = records
        .iter()
        .map(|record| (date_key(record.date), record))
        .collect();
    let state_on = |date: NaiveDate| -> DayState {
        match by_date.get(&date_key(date)) {
            Some(record) => current_state(record, today),
            None => current_state(&DayRecord::new(date), today),
        }
    };

    let mut last_7_days = Vec::with_capacity(7);
    for offset in (0..7).rev() {
        let date = today - Duration::days(offset as i64);
        let record = by_date.get(&date_key(date));
        last_7_days.push(DailyPoint {
            date: date.to_string(),
            state: state_on(date),
            learning_hours: record.map_or(0.0, |r| r.learning_hours),
            screen_time_hours: record.map_or(0.0, |r| r.screen_time_hours),
            mood: record.and_then(|r| r.mood),
        });
    }

    let current_week_start = week_start(today);
    let mut weekly_totals = Vec::with_capacity(WEEK_COUNT);

    for offset in (0..WEEK_COUNT).rev() {
        let start = current_week_start - Duration::weeks(offset as i64);
        let end = start + Duration::days(6);

        let mut completed = 0u8;
        let mut missed = 0u8;
        let mut not_counted = 0u8;
        for day_offset in 0..7 {
            let date = start + Duration::days(day_offset);
            if date > today {
                break;
            }
            match state_on(date) {
                DayState::Completed => completed += 1,
                DayState::Missed => missed += 1,
                DayState::NotCounted => not_counted += 1,
                DayState::NotStarted | DayState::InProgress => {}
            }
        }

        weekly_totals.push(WeeklyPoint {
            week: week_label(start),
            start_date: start.to_string(),
            end_date: end.to_string(),
            completed,
            missed,
            not_counted,
        });
    }

    StatsResponse {
        last_7_days,
        weekly_totals,
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}
