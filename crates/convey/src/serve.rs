// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `convey serve` command implementation.
//!
//! Runs the ingestion daemon: reads control messages from stdin, answers on
//! stdout, and forwards every delivery notification as its own stdout line.
//! Logs go to stderr so stdout stays machine-readable.

use convey_config::ConveyConfig;
use convey_core::ConveyError;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::control::{self, Outbound};
use crate::runtime::{self, Runtime};

/// Runs the `convey serve` command until stdin closes or a signal arrives.
///
/// On stdin EOF the queue is drained before exiting; on a signal, in-flight
/// work is abandoned after the current task.
pub async fn run_serve(config: ConveyConfig) -> Result<(), ConveyError> {
    let runtime = Runtime::open(&config).await?;
    let settings = runtime.service.start(&config.sync.to_settings()).await?;
    info!(
        endpoint_configured = settings.has_endpoint(),
        auto_sync = settings.auto_sync,
        "convey daemon ready"
    );

    let cancel = runtime::install_signal_handler();
    let (out_tx, out_rx) = mpsc::unbounded_channel::<Outbound>();

    let writer = tokio::spawn(write_output(out_rx));
    let forwarder = tokio::spawn(forward_events(
        runtime.observer.subscribe(),
        out_tx.clone(),
        cancel.clone(),
    ));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let response = control::handle_line(&runtime.service, &line).await;
                    if out_tx.send(Outbound::Response(response)).is_err() {
                        warn!("control output closed, stopping");
                        break;
                    }
                }
                Ok(None) => {
                    info!("control input closed, draining queue");
                    tokio::select! {
                        _ = runtime.service.wait_idle() => {}
                        _ = cancel.cancelled() => {}
                    }
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "failed to read control input, stopping");
                    break;
                }
            },
            _ = cancel.cancelled() => break,
        }
    }

    info!("shutting down");
    let result = runtime.shutdown().await;

    cancel.cancel();
    if let Err(e) = forwarder.await {
        warn!(error = %e, "event forwarder panicked");
    }
    drop(out_tx);
    if let Err(e) = writer.await {
        warn!(error = %e, "output writer panicked");
    }

    result
}

/// Serialize outbound lines to stdout, one JSON document per line.
async fn write_output(mut rx: mpsc::UnboundedReceiver<Outbound>) {
    let mut stdout = tokio::io::stdout();
    while let Some(outbound) = rx.recv().await {
        let mut line = match serde_json::to_string(&outbound) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "failed to encode control output");
                continue;
            }
        };
        line.push('\n');
        if let Err(e) = stdout.write_all(line.as_bytes()).await {
            warn!(error = %e, "failed to write control output");
            break;
        }
        let _ = stdout.flush().await;
    }
}

/// Relay sync events to the output until cancelled, then flush what is buffered.
async fn forward_events(
    mut events: broadcast::Receiver<convey_core::SyncEvent>,
    out: mpsc::UnboundedSender<Outbound>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if out.send(Outbound::Event(event)).is_err() {
                        return;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event forwarder lagged, notifications dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return,
            },
            _ = cancel.cancelled() => break,
        }
    }

    while let Ok(event) = events.try_recv() {
        if out.send(Outbound::Event(event)).is_err() {
            break;
        }
    }
    debug!("event forwarder stopped");
}
