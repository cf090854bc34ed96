pub mod app;
pub mod config;
pub mod day_state;
pub mod errors;
pub mod habits;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod score;
pub mod state;
pub mod stats;
pub mod storage;
pub mod streak;
pub mod ui;
pub mod validator;

pub use app::router;
pub use lifecycle::Tracker;
pub use state::AppState;
pub use storage::{FileStore, Store, resolve_data_path};
