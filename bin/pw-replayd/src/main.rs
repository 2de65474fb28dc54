//! PledgeWire Replay Daemon
//!
//! Drains the persisted retry queue against the remote API on a fixed timer.
//! Embedding hosts trigger replay opportunistically; this daemon is the
//! standalone alternative with a real schedule.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PW_BASE_URL` | - | Remote API base URL (required) |
//! | `PW_USERNAME` | - | API username (required) |
//! | `PW_APP_PASSWORD` | - | API application password (required) |
//! | `PW_INSECURE_LOCAL` | `false` | Skip TLS verification for local targets |
//! | `PW_QUEUE_DB` | `pledgewire.db` | SQLite database path |
//! | `PW_QUEUE_RECORD_KEY` | `pledgewire_retry_queue` | Queue record key |
//! | `PW_REPLAY_INTERVAL_SECS` | `60` | Seconds between replay runs |
//! | `PW_MAX_ATTEMPTS` | unbounded | Replay attempts before dead-lettering |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pw_common::ApiCredentials;
use pw_ops::hooks;
use pw_queue::{sqlite::DEFAULT_RECORD_KEY, RemoteDispatcher, ReplayDriver, SqliteQueueStore};
use pw_remote::{ApiClient, RemoteClientConfig};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Starting PledgeWire replay daemon");

    let credentials = ApiCredentials::from_env()
        .ok_or_else(|| anyhow::anyhow!("PW_BASE_URL, PW_USERNAME and PW_APP_PASSWORD are required"))?;

    let db_path = env_or("PW_QUEUE_DB", "pledgewire.db");
    let record_key = env_or("PW_QUEUE_RECORD_KEY", DEFAULT_RECORD_KEY);
    let interval_secs: u64 = env_or_parse("PW_REPLAY_INTERVAL_SECS", 60);
    let max_attempts: Option<u32> = std::env::var("PW_MAX_ATTEMPTS")
        .ok()
        .and_then(|v| v.parse().ok());

    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    let store = Arc::new(SqliteQueueStore::new(pool, record_key));
    store.init_schema().await?;
    info!(db = %db_path, "Queue store initialized");

    let client = ApiClient::new(&credentials, RemoteClientConfig::default())?;
    info!(base_url = %credentials.base_url, "Remote API client initialized");

    let mut driver = ReplayDriver::new(store, Arc::new(RemoteDispatcher::new(client)))
        .with_max_attempts(max_attempts);
    driver.subscribe_all(hooks::replay_listeners());

    tokio::select! {
        _ = driver.run_interval(Duration::from_secs(interval_secs)) => {}
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("PledgeWire replay daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
