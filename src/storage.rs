use crate::config::{self, Configuration};
use crate::errors::{StoreError, TrackerError};
use crate::models::{AppData, DayRecord, StreakStates};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::{debug, error};

#[async_trait]
pub trait Store: Send + Sync {
    async fn load_day_record(&self, date: NaiveDate) -> Result<Option<DayRecord>, StoreError>;

    async fn save_day_record(&mut self, record: &DayRecord) -> Result<(), StoreError>;

    async fn load_day_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DayRecord>, StoreError>;

    async fn load_streak_states(&self) -> Result<StreakStates, StoreError>;

    async fn save_streak_states(&mut self, states: &StreakStates) -> Result<(), StoreError>;

    async fn load_last_active_date(&self) -> Result<Option<NaiveDate>, StoreError>;

    async fn save_last_active_date(&mut self, date: NaiveDate) -> Result<(), StoreError>;

    /// Either both land or neither does.
    async fn commit_finalized(
        &mut self,
        record: &DayRecord,
        streaks: &StreakStates,
    ) -> Result<(), StoreError>;

    async fn load_configuration(&self) -> Result<Configuration, TrackerError>;
}

pub struct FileStore {
    data_path: PathBuf,
    settings_path: PathBuf,
    data: AppData,
}

impl FileStore {
    pub async fn open(data_path: PathBuf, settings_path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = data_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let data = load_data(&data_path).await;
        Ok(Self {
            data_path,
            settings_path,
            data,
        })
    }

    async fn commit(&mut self, next: AppData) -> Result<(), StoreError> {
        persist_data(&self.data_path, &next).await?;
        self.data = next;
        Ok(())
    }
}

#[async_trait]
impl Store for FileStore {
    async fn load_day_record(&self, date: NaiveDate) -> Result<Option<DayRecord>, StoreError> {
        Ok(self.data.days.get(&date_key(date)).cloned())
    }

    async fn save_day_record(&mut self, record: &DayRecord) -> Result<(), StoreError> {
        let mut next = self.data.clone();
        next.days.insert(date_key(record.date), record.clone());
        self.commit(next).await
    }

    async fn load_day_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DayRecord>, StoreError> {
        // Keys are zero-padded ISO dates, so string order is date order.
        Ok(self
            .data
            .days
            .range(date_key(from)..=date_key(to))
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn load_streak_states(&self) -> Result<StreakStates, StoreError> {
        Ok(self.data.streaks.clone())
    }

    async fn save_streak_states(&mut self, states: &StreakStates) -> Result<(), StoreError> {
        let mut next = self.data.clone();
        next.streaks = states.clone();
        self.commit(next).await
    }

    async fn load_last_active_date(&self) -> Result<Option<NaiveDate>, StoreError> {
        Ok(self.data.last_active_date)
    }

    async fn save_last_active_date(&mut self, date: NaiveDate) -> Result<(), StoreError> {
        let mut next = self.data.clone();
        next.last_active_date = Some(date);
        self.commit(next).await
    }

    async fn commit_finalized(
        &mut self,
        record: &DayRecord,
        streaks: &StreakStates,
    ) -> Result<(), StoreError> {
        let mut next = self.data.clone();
        next.days.insert(date_key(record.date), record.clone());
        next.streaks = streaks.clone();
        self.commit(next).await
    }

    async fn load_configuration(&self) -> Result<Configuration, TrackerError> {
        config::load_configuration(&self.settings_path).await
    }
}

pub fn resolve_data_path() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from("data/state.json")
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

/// Writes to a sibling temp file first so a crash mid-write never truncates the document.
pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload).await?;
    fs::rename(&tmp, path).await?;
    debug!(path = %path.display(), days = data.days.len(), "state persisted");
    Ok(())
}
