use flume::{bounded, Receiver, Sender};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::types::{ActivityLog, ActivityStatus};

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Queue capacity (max logs in memory before backpressure)
    pub queue_capacity: usize,

    /// Logs emitted per flush
    pub batch_size: usize,

    /// Max wait time before flushing batch (milliseconds)
    pub batch_timeout_ms: u64,

    pub worker_count: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10_000,
            batch_size: 100,
            batch_timeout_ms: 1000,
            worker_count: 2,
        }
    }
}

/// Async activity logger with queue mechanism.
///
/// Records are flushed as structured `tracing` events on target `activity`,
/// so they end up wherever the subscriber writes.
#[derive(Clone)]
pub struct ActivityLogger {
    sender: Sender<ActivityLog>,
}

impl ActivityLogger {
    /// Initialize logger with background workers. Must be called inside a tokio runtime.
    pub fn new(config: LoggerConfig) -> Self {
        let (sender, receiver) = bounded(config.queue_capacity.max(1));

        info!(
            "Initializing ActivityLogger: queue={}, batch={}, timeout={}ms, workers={}",
            config.queue_capacity, config.batch_size, config.batch_timeout_ms, config.worker_count
        );

        for worker_id in 0..config.worker_count.max(1) {
            let receiver = receiver.clone();
            let config = config.clone();

            tokio::spawn(async move {
                Self::worker_loop(worker_id, receiver, config).await;
            });
        }

        Self { sender }
    }

    /// Logger with no workers attached; records stay in the queue.
    pub fn detached(capacity: usize) -> (Self, Receiver<ActivityLog>) {
        let (sender, receiver) = bounded(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Log activity (non-blocking, fire-and-forget)
    pub fn log(&self, activity: ActivityLog) {
        if let Err(e) = self.sender.try_send(activity) {
            warn!("Failed to enqueue log (queue full?): {}", e);
        }
    }

    async fn worker_loop(worker_id: usize, receiver: Receiver<ActivityLog>, config: LoggerConfig) {
        info!("Logger worker {} started", worker_id);

        let batch_size = config.batch_size.max(1);
        let mut batch: Vec<ActivityLog> = Vec::with_capacity(batch_size);
        let batch_timeout = Duration::from_millis(config.batch_timeout_ms);

        loop {
            let deadline = tokio::time::Instant::now() + batch_timeout;

            while batch.len() < batch_size {
                match tokio::time::timeout_at(deadline, receiver.recv_async()).await {
                    Ok(Ok(log)) => batch.push(log),
                    Ok(Err(_)) => {
                        // Channel closed, flush and exit
                        if !batch.is_empty() {
                            Self::flush_batch(&batch, worker_id);
                        }
                        info!("Logger worker {} shutting down (channel closed)", worker_id);
                        return;
                    }
                    Err(_) => break,
                }
            }

            if !batch.is_empty() {
                Self::flush_batch(&batch, worker_id);
                batch.clear();
            } else {
                sleep(Duration::from_millis(100)).await;
            }
        }
    }

    fn flush_batch(batch: &[ActivityLog], worker_id: usize) {
        debug!("Worker {} flushing {} activity logs", worker_id, batch.len());

        for log in batch {
            let custom = log.custom_json().to_string();
            let message = log.message_content.as_deref().unwrap_or("");

            match log.activity_status {
                ActivityStatus::Error => error!(
                    target: "activity",
                    session_id = %log.session_id,
                    user_id = ?log.user_id,
                    activity_type = log.activity_type.as_str(),
                    status = log.activity_status.as_str(),
                    error_type = log.error_type.as_deref().unwrap_or(""),
                    error_message = log.error_message.as_deref().unwrap_or(""),
                    custom = %custom,
                    created_at = %log.created_at,
                    "{}",
                    message
                ),
                ActivityStatus::Warning => warn!(
                    target: "activity",
                    session_id = %log.session_id,
                    user_id = ?log.user_id,
                    activity_type = log.activity_type.as_str(),
                    status = log.activity_status.as_str(),
                    custom = %custom,
                    created_at = %log.created_at,
                    "{}",
                    message
                ),
                _ => info!(
                    target: "activity",
                    session_id = %log.session_id,
                    user_id = ?log.user_id,
                    activity_type = log.activity_type.as_str(),
                    status = log.activity_status.as_str(),
                    processing_time_ms = ?log.processing_time_ms,
                    custom = %custom,
                    created_at = %log.created_at,
                    "{}",
                    message
                ),
            }
        }
    }

    /// Get queue statistics (for monitoring)
    pub fn queue_len(&self) -> usize {
        self.sender.len()
    }

    pub fn is_queue_full(&self) -> bool {
        self.sender.is_full()
    }
}
