use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct RecordBody {
    date: String,
    finalized: bool,
    mood: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct PreviewBody {
    state: String,
    failing_habits: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DayBody {
    record: RecordBody,
    state: String,
    preview: Option<PreviewBody>,
}

#[derive(Debug, Deserialize)]
struct StreakBody {
    current: u32,
}

#[derive(Debug, Deserialize)]
struct FinalizeBody {
    state: String,
    streaks: BTreeMap<String, StreakBody>,
}

#[derive(Debug, Deserialize)]
struct ScoreBody {
    score: u8,
    finalized_days: usize,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_path(stem: &str, ext: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("habit_dashboard_{stem}_{}_{}.{ext}", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/today")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

/// Starts the binary with fresh state. A missing settings file means default rules.
async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_habit_dashboard"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", unique_path("state", "json"))
        .env("APP_SETTINGS_PATH", unique_path("settings", "toml"))
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = spawn_server().await;
    #[cfg(unix)]
    cleanup::register(server.child.id());
    let server = Arc::new(server);
    *guard = Some(Arc::clone(&server));
    server
}

async fn get_today(client: &Client, base_url: &str) -> DayBody {
    client
        .get(format!("{base_url}/api/today"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_today_is_created_and_editable() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = get_today(&client, &server.base_url).await;
    assert!(!before.record.date.is_empty());
    assert!(!before.record.finalized);
    assert!(before.state == "NOT_STARTED" || before.state == "IN_PROGRESS");

    let response = client
        .put(format!("{}/api/today", server.base_url))
        .json(&serde_json::json!({ "mood": 3, "workout_done": true }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let updated: DayBody = response.json().await.unwrap();

    assert_eq!(updated.record.date, before.record.date);
    assert_eq!(updated.record.mood, Some(3));
    assert_eq!(updated.state, "IN_PROGRESS");
    let preview = updated.preview.expect("open day carries a preview");
    assert_eq!(preview.state, "MISSED");
    assert!(preview.failing_habits.contains(&"Learning".to_string()));
    assert!(!preview.failing_habits.contains(&"Workout".to_string()));
}

#[tokio::test]
async fn http_rejects_invalid_input() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .put(format!("{}/api/today", server.base_url))
        .json(&serde_json::json!({ "mood": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .get(format!("{}/api/days/yesterday", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/api/days/2001-01-01/finalize", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn http_finalize_once_then_conflict() {
    let server = spawn_server().await;
    let client = Client::new();

    let response = client
        .put(format!("{}/api/today", server.base_url))
        .json(&serde_json::json!({
            "wake_time": "06:30",
            "learning_done": true,
            "learning_hours": 2.0,
            "workout_done": true,
            "screen_time_hours": 1.0
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/api/today/finalize", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let finalized: FinalizeBody = response.json().await.unwrap();
    assert_eq!(finalized.state, "COMPLETED");
    assert_eq!(finalized.streaks["learning"].current, 1);
    assert_eq!(finalized.streaks["workout"].current, 1);
    assert_eq!(finalized.streaks["sleep"].current, 1);

    let again = client
        .post(format!("{}/api/today/finalize", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::CONFLICT);

    let today = get_today(&client, &server.base_url).await;
    assert_eq!(today.state, "COMPLETED");
    assert!(today.preview.is_none());

    let score: ScoreBody = client
        .get(format!("{}/api/score", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(score.finalized_days, 1);
    assert!(score.score > 0);
}
