#![allow(dead_code)]

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::Client;
use server::config::Config;
use server::engine::{Backend, EngineCommand};

/// Scripted engine driven by `sh`; see the header of the script for modes.
pub const FAKE_ENGINE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/fake_gtp.sh");

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Build a reqwest client for tests.
pub fn client() -> Client {
    Client::new()
}

/// Generate a unique suffix based on timestamp + a per-process counter to avoid collisions.
pub fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}", std::process::id(), ts % 1_000_000_000, n)
}

/// The fake engine's command log, deleted when dropped.
pub struct EngineLog(PathBuf);

impl Deref for EngineLog {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
    }
}

impl Drop for EngineLog {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

/// Fresh path for the fake engine's command log. The file does not exist yet.
pub fn log_path() -> EngineLog {
    EngineLog(std::env::temp_dir().join(format!("fake-gtp-{}.log", unique_suffix())))
}

/// Config running the fake engine in `mode`, logging to `log`.
pub fn fake_config(backend: Backend, mode: &str, log: &Path) -> Config {
    let engine = EngineCommand {
        program: "sh".to_string(),
        args: vec![
            FAKE_ENGINE.to_string(),
            mode.to_string(),
            log.display().to_string(),
        ],
    };
    let mut config = Config::new(backend, engine);
    config.engine_timeout = Duration::from_secs(5);
    config.engine_trace = true;
    config
}

/// Start the bridge on an ephemeral port and return its base URL.
pub async fn spawn_app(config: Config) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, config));
    format!("http://{addr}")
}

/// Commands the fake engine received, without its `args` line.
pub fn logged_commands(log: &Path) -> Vec<String> {
    std::fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .filter(|l| !l.starts_with("args "))
        .map(String::from)
        .collect()
}

/// The arguments line the fake engine was started with.
pub fn logged_args(log: &Path) -> Option<String> {
    std::fs::read_to_string(log)
        .ok()?
        .lines()
        .find(|l| l.starts_with("args "))
        .map(String::from)
}
