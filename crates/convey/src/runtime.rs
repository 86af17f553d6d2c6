// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process wiring shared by every subcommand: tracing, signals, and the
//! store/backend/service stack built from configuration.

use std::sync::Arc;
use std::time::Duration;

use convey_config::ConveyConfig;
use convey_core::ConveyError;
use convey_storage::SqliteStore;
use convey_sync::{BroadcastObserver, HttpBackend, RetryPolicy, SyncService};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fully wired collaborators for one process.
pub struct Runtime {
    pub store: Arc<SqliteStore>,
    pub observer: BroadcastObserver,
    pub service: SyncService,
}

impl Runtime {
    /// Open the SQLite store and build the sync service on top of it.
    ///
    /// Timers are not armed; call [`SyncService::start`] for that.
    pub async fn open(config: &ConveyConfig) -> Result<Self, ConveyError> {
        let store = Arc::new(SqliteStore::open(config.storage.database_path.clone()).await?);
        let backend = HttpBackend::new(Duration::from_secs(config.queue.request_timeout_secs))?;
        let observer = BroadcastObserver::default();
        let policy = retry_policy(config);

        let service = SyncService::new(
            store.clone(),
            Arc::new(backend),
            Arc::new(observer.clone()),
            policy,
        );
        info!(
            database = %config.storage.database_path,
            max_retries = policy.max_retries,
            "runtime initialized"
        );

        Ok(Self {
            store,
            observer,
            service,
        })
    }

    /// Stop timers and the queue worker, then checkpoint the database.
    pub async fn shutdown(self) -> Result<(), ConveyError> {
        self.service.shutdown().await;
        self.store.close().await?;
        debug!("runtime shut down");
        Ok(())
    }
}

pub fn retry_policy(config: &ConveyConfig) -> RetryPolicy {
    RetryPolicy::new(
        config.queue.max_retries,
        Duration::from_millis(config.queue.retry_delay_ms),
    )
}

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("convey={log_level},warn")));

    // A second init (e.g. in tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Cancel the returned token on SIGINT or SIGTERM.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, only Ctrl+C is handled");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}
