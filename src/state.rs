use crate::lifecycle::Tracker;
use crate::storage::FileStore;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<Mutex<Tracker<FileStore>>>,
}

impl AppState {
    pub fn new(store: FileStore) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(Tracker::new(store))),
        }
    }
}
