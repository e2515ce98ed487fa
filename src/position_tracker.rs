// src/position_tracker.rs - Window position sampler
use std::sync::Arc;

use log::{debug, error, info, trace};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};

use crate::{
    kv_store::{keys, read_value},
    Config, KeyValueStore, MemoError, Result, SharedStore,
};

/// Reports where the widget window currently sits on screen.
pub trait PositionSource: Send + Sync {
    /// Current top-left corner, or `None` if the window is unavailable.
    fn position(&self) -> Option<(i32, i32)>;
}

/// Whether a sampled position is a real on-screen location.
///
/// Minimized windows report large negative coordinates; those must never
/// overwrite the last good position.
pub fn is_valid_position(x: i32, y: i32, threshold: i32) -> bool {
    x >= threshold && y >= threshold
}

/// Persists a sample if it is valid. Returns whether it was written.
pub fn record_sample(store: &dyn KeyValueStore, x: i32, y: i32, threshold: i32) -> bool {
    if !is_valid_position(x, y, threshold) {
        debug!("Ignoring off-screen position ({}, {})", x, y);
        return false;
    }

    if saved_position(store) == Some((x, y)) {
        trace!("Position unchanged at ({}, {})", x, y);
        return false;
    }

    // Both coordinates go in one write so a failure never pairs a new x with an old y.
    match store.set_many(vec![(keys::POS_X, json!(x)), (keys::POS_Y, json!(y))]) {
        Ok(()) => {
            trace!("Saved window position ({}, {})", x, y);
            true
        }
        Err(e) => {
            error!("Failed to save window position: {}", e);
            false
        }
    }
}

/// Last persisted position, if both coordinates are present and readable.
pub fn saved_position(store: &dyn KeyValueStore) -> Option<(i32, i32)> {
    let x = read_value::<i32>(store, keys::POS_X).ok().flatten()?;
    let y = read_value::<i32>(store, keys::POS_Y).ok().flatten()?;
    Some((x, y))
}

#[derive(Debug, Clone)]
pub enum TrackerCommand {
    /// Stop sampling and exit the task
    Stop,
}

/// Samples the window position on a fixed interval and persists valid
/// positions. Must be stopped on shutdown so nothing is written afterwards.
pub struct PositionTracker {
    store: SharedStore,
    source: Arc<dyn PositionSource>,
    interval: Duration,
    threshold: i32,

    /// Channel to send commands to the sampling task
    command_tx: Option<mpsc::Sender<TrackerCommand>>,

    /// Handle to the sampling task
    task: Option<JoinHandle<()>>,
}

impl PositionTracker {
    pub fn new(store: SharedStore, source: Arc<dyn PositionSource>, config: &Config) -> Self {
        Self {
            store,
            source,
            interval: Duration::from_millis(config.position_interval_ms),
            threshold: config.invalid_coordinate_threshold,
            command_tx: None,
            task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Starts the sampling task. Calling it while running does nothing.
    pub fn start(&mut self) {
        if self.task.is_some() {
            debug!("Position tracker already running");
            return;
        }
        info!("Starting position tracker every {:?}", self.interval);

        let (command_tx, mut command_rx) = mpsc::channel(4);
        let store = Arc::clone(&self.store);
        let source = Arc::clone(&self.source);
        let period = self.interval;
        let threshold = self.threshold;

        let task = tokio::spawn(async move {
            let mut interval = time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Some((x, y)) = source.position() {
                            record_sample(store.as_ref(), x, y, threshold);
                        }
                    }
                    cmd = command_rx.recv() => match cmd {
                        Some(TrackerCommand::Stop) | None => {
                            info!("Position tracker stopping...");
                            break;
                        }
                    }
                }
            }
        });

        self.command_tx = Some(command_tx);
        self.task = Some(task);
    }

    /// Stops the sampling task and waits for it to finish.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(task) = self.task.take() else {
            debug!("Position tracker is not running");
            return Ok(());
        };

        if let Some(tx) = self.command_tx.take() {
            if let Err(e) = tx.send(TrackerCommand::Stop).await {
                error!("Failed to send stop command to position tracker: {}", e);
            }
        }

        task.await.map_err(|e| {
            let message = format!("Failed to stop position tracker: {}", e);
            error!("{}", message);
            MemoError::ApplicationError { message }
        })?;

        info!("Position tracker stopped");
        Ok(())
    }
}
