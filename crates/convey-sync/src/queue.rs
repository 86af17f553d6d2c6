// SPDX-FileCopyrightText: 2026 Convey Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory delivery queue with a single worker and exponential-backoff retries.
//!
//! Producers push tasks into an unbounded channel; one worker task drains it
//! in FIFO order. For each task the worker publishes `syncing`, runs the
//! processing pipeline, persists the result, then attempts remote delivery.
//! A failed delivery is re-submitted through the same channel after its
//! backoff delay, landing at the tail of the queue.
//!
//! Every enqueue of a record id bumps that id's generation. When the worker
//! pops a task from an older generation it drops it unprocessed, so the
//! latest capture of a record always wins.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use convey_core::{
    ConveyError, DeliveryOutcome, DeliveryStatus, LocalStore, ObserverSink, OriginContext,
    Record, RemoteBackend, SyncEvent, SyncState,
};
use convey_process::ProcessingPipeline;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{Mutex, Notify, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backoff::RetryPolicy;
use crate::task::DeliveryTask;

/// Handle to a running delivery queue.
pub struct DeliveryQueue {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// State shared by the enqueue side, the worker, and pending retry timers.
struct Shared {
    tx: mpsc::UnboundedSender<DeliveryTask>,
    pipeline: ProcessingPipeline,
    store: Arc<dyn LocalStore>,
    backend: Arc<dyn RemoteBackend>,
    observer: Arc<dyn ObserverSink>,
    policy: RetryPolicy,
    /// Latest generation per record id.
    generations: DashMap<String, u64>,
    next_generation: AtomicU64,
    /// Tasks that have not reached a terminal state, including pending retries.
    outstanding: AtomicUsize,
    idle: Notify,
    /// True while the worker is working through a backlog.
    draining: AtomicBool,
    cancel: CancellationToken,
}

impl DeliveryQueue {
    /// Start the queue worker on the current tokio runtime.
    pub fn spawn(
        pipeline: ProcessingPipeline,
        store: Arc<dyn LocalStore>,
        backend: Arc<dyn RemoteBackend>,
        observer: Arc<dyn ObserverSink>,
        policy: RetryPolicy,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            tx,
            pipeline,
            store,
            backend,
            observer,
            policy,
            generations: DashMap::new(),
            next_generation: AtomicU64::new(0),
            outstanding: AtomicUsize::new(0),
            idle: Notify::new(),
            draining: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        });

        let worker = tokio::spawn(Arc::clone(&shared).run(rx));
        info!(
            max_retries = policy.max_retries,
            retry_delay_ms = policy.base_delay.as_millis() as u64,
            "delivery queue started"
        );

        Self {
            shared,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Append a new task for `record` to the tail of the queue.
    ///
    /// Returns the task id. Never waits on the worker.
    pub fn enqueue(
        &self,
        record: Record,
        origin: Option<OriginContext>,
    ) -> Result<String, ConveyError> {
        self.ensure_running()?;
        let generation = self.shared.bump_generation();
        self.shared
            .generations
            .insert(record.id.clone(), generation);
        self.submit(record, origin, generation)
    }

    /// Re-enqueue every record held by the local store.
    ///
    /// Records are enqueued in id order. An id that already has a task queued,
    /// in flight, or waiting for a retry is left alone: that task carries a
    /// capture at least as new as the stored copy. Returns how many were enqueued.
    pub async fn sync_all(&self) -> Result<usize, ConveyError> {
        let mut records: Vec<_> = self.shared.store.get_all().await?.into_values().collect();
        records.sort_by(|a, b| a.id().cmp(b.id()));

        let mut count = 0;
        for processed in records {
            self.ensure_running()?;
            let generation = match self.shared.generations.entry(processed.id().to_string()) {
                Entry::Occupied(_) => {
                    debug!(record_id = %processed.id(), "task already live, not re-enqueued");
                    continue;
                }
                Entry::Vacant(slot) => {
                    let generation = self.shared.bump_generation();
                    slot.insert(generation);
                    generation
                }
            };
            self.submit(processed.into_record(), None, generation)?;
            count += 1;
        }
        info!(count, "re-enqueued stored records");
        Ok(count)
    }

    fn ensure_running(&self) -> Result<(), ConveyError> {
        if self.shared.cancel.is_cancelled() {
            return Err(ConveyError::Internal("delivery queue is shut down".into()));
        }
        Ok(())
    }

    /// Push a task whose generation is already registered for its record id.
    fn submit(
        &self,
        record: Record,
        origin: Option<OriginContext>,
        generation: u64,
    ) -> Result<String, ConveyError> {
        let task = DeliveryTask::new(record, origin, generation);
        let task_id = task.id.clone();
        debug!(task_id = %task_id, record_id = %task.record_id(), generation, "task enqueued");

        self.shared.outstanding.fetch_add(1, Ordering::SeqCst);
        if self.shared.tx.send(task).is_err() {
            self.shared.finish();
            return Err(ConveyError::Internal("delivery queue worker is gone".into()));
        }
        Ok(task_id)
    }

    /// Resolve once no task is queued, in flight, or waiting for a retry.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.shared.outstanding.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Number of tasks not yet in a terminal state.
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::SeqCst)
    }

    pub fn is_draining(&self) -> bool {
        self.shared.draining.load(Ordering::SeqCst)
    }

    pub fn policy(&self) -> RetryPolicy {
        self.shared.policy
    }

    /// Stop accepting work, cancel pending retries, and wait for the worker.
    ///
    /// A task already in flight runs to completion; queued tasks are dropped.
    pub async fn shutdown(&self) {
        self.shared.cancel.cancel();
        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            error!(error = %e, "delivery worker panicked");
        }
        info!("delivery queue stopped");
    }
}

impl Shared {
    async fn run(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<DeliveryTask>) {
        loop {
            let task = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                task = rx.recv() => match task {
                    Some(task) => task,
                    None => break,
                },
            };

            self.draining.store(true, Ordering::SeqCst);
            self.handle(task).await;
            if rx.is_empty() {
                self.draining.store(false, Ordering::SeqCst);
            }
        }

        rx.close();
        let mut dropped = 0usize;
        while let Ok(task) = rx.try_recv() {
            debug!(record_id = %task.record_id(), "dropping queued task on shutdown");
            dropped += 1;
            self.finish();
        }
        self.draining.store(false, Ordering::SeqCst);
        debug!(dropped, "delivery worker exited");
    }

    /// Run one task through status, pipeline, persistence, and delivery.
    async fn handle(self: &Arc<Self>, task: DeliveryTask) {
        if !self.is_current(&task) {
            debug!(
                record_id = %task.record_id(),
                generation = task.generation,
                "task superseded by a newer capture"
            );
            self.finish();
            return;
        }

        let record_id = task.record_id().to_string();
        let attempt = task.retry_count + 1;
        debug!(record_id = %record_id, task_id = %task.id, attempt, "processing task");

        self.write_status(DeliveryStatus::new(&record_id, SyncState::Syncing))
            .await;

        let processed = self.pipeline.process(task.record.clone());

        if let Err(e) = self.store.persist(&processed).await {
            error!(record_id = %record_id, error = %e, "local persistence failed");
            self.fail(&task, e.to_string()).await;
            return;
        }

        let settings = match self.store.get_config().await {
            Ok(settings) => settings.unwrap_or_default(),
            Err(e) => {
                error!(record_id = %record_id, error = %e, "failed to read sync settings");
                self.fail(&task, e.to_string()).await;
                return;
            }
        };

        let outcome = if settings.has_endpoint() {
            self.backend.deliver(&processed, &settings).await
        } else {
            Ok(DeliveryOutcome::Skipped)
        };

        match outcome {
            Ok(outcome) => {
                match outcome {
                    DeliveryOutcome::Delivered => {
                        info!(record_id = %record_id, attempt, "record delivered")
                    }
                    DeliveryOutcome::Skipped => {
                        debug!(record_id = %record_id, "no endpoint configured, delivery skipped")
                    }
                }
                self.write_status(DeliveryStatus::new(&record_id, SyncState::Success))
                    .await;
                self.observer
                    .notify(SyncEvent::success(&record_id, task.origin));
                self.settle(&task);
            }
            Err(e) => {
                let message = e.to_string();
                match self.policy.next_delay(task.retry_count) {
                    Some(delay) if self.is_current(&task) => {
                        warn!(
                            record_id = %record_id,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %message,
                            "delivery failed, scheduling retry"
                        );
                        self.write_status(
                            DeliveryStatus::new(&record_id, SyncState::Pending)
                                .with_error(message),
                        )
                        .await;
                        self.schedule_retry(task, delay);
                    }
                    Some(_) => {
                        debug!(record_id = %record_id, "retry skipped, newer capture pending");
                        self.finish();
                    }
                    None => {
                        error!(
                            record_id = %record_id,
                            attempts = attempt,
                            error = %message,
                            "delivery failed permanently"
                        );
                        self.fail(&task, message).await;
                    }
                }
            }
        }
    }

    /// Terminal failure: `error` status, failure event, task discarded.
    async fn fail(&self, task: &DeliveryTask, message: String) {
        let record_id = task.record_id();
        self.write_status(
            DeliveryStatus::new(record_id, SyncState::Error).with_error(message.clone()),
        )
        .await;
        self.observer
            .notify(SyncEvent::error(record_id, message, task.origin));
        self.settle(task);
    }

    /// Re-submit `task` through the channel once `delay` has elapsed.
    fn schedule_retry(self: &Arc<Self>, task: DeliveryTask, delay: std::time::Duration) {
        let shared = Arc::clone(self);
        let retry = task.into_retry();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    debug!(record_id = %retry.record_id(), retry = retry.retry_count, "re-enqueueing retry");
                    if shared.tx.send(retry).is_err() {
                        shared.finish();
                    }
                }
                _ = shared.cancel.cancelled() => {
                    debug!(record_id = %retry.record_id(), "pending retry cancelled");
                    shared.finish();
                }
            }
        });
    }

    /// Status writes are best effort: a failure is logged, never propagated.
    async fn write_status(&self, status: DeliveryStatus) {
        if let Err(e) = self.store.set_status(&status).await {
            warn!(
                record_id = %status.record_id,
                state = %status.state,
                error = %e,
                "failed to write delivery status"
            );
        }
    }

    fn bump_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, task: &DeliveryTask) -> bool {
        self.generations
            .get(task.record_id())
            .is_some_and(|latest| *latest == task.generation)
    }

    /// Terminal for the newest generation: forget the id, then mark done.
    fn settle(&self, task: &DeliveryTask) {
        self.generations
            .remove_if(task.record_id(), |_, latest| *latest == task.generation);
        self.finish();
    }

    fn finish(&self) {
        if self.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}
