//! Background sync task
//!
//! Drives a `SyncController` from three sources: connectivity belief
//! changes, received notifications and front-end commands. The task holds
//! the notification subscription for its whole life and releases it on
//! exit.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{Delivery, SyncController, SyncSnapshot};
use crate::notifications::NotificationSubscription;

/// Commands sent to the sync task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncCommand {
    Approve(String),
    Reject(String),
    /// Manual refresh
    Refresh,
    Shutdown,
}

/// Results reported back by the sync task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum SyncTaskEvent {
    Approved { id: String, delivery: Delivery },
    Rejected { id: String, delivery: Delivery },
    Refreshed { count: usize },
    Error { message: String },
}

/// Handle for controlling the background sync task
pub struct SyncHandle {
    pub command_tx: mpsc::Sender<SyncCommand>,
    pub event_rx: mpsc::Receiver<SyncTaskEvent>,
    pub snapshot_rx: watch::Receiver<SyncSnapshot>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Stop the task and wait for it to release its resources
    pub async fn shutdown(self) {
        // Already gone if the send fails
        let _ = self.command_tx.send(SyncCommand::Shutdown).await;
        if let Err(e) = self.task.await {
            warn!("Sync task ended abnormally: {}", e);
        }
    }
}

/// Spawn the sync task
///
/// The task performs an initial connectivity check straight away; the
/// resulting belief change triggers the first fetch.
pub fn spawn_sync_task(
    controller: Arc<SyncController>,
    subscription: NotificationSubscription,
) -> SyncHandle {
    let (command_tx, command_rx) = mpsc::channel(16);
    let (event_tx, event_rx) = mpsc::channel(64);
    let snapshot_rx = controller.subscribe();

    let task = tokio::spawn(sync_task(controller, subscription, command_rx, event_tx));

    SyncHandle {
        command_tx,
        event_rx,
        snapshot_rx,
        task,
    }
}

async fn sync_task(
    controller: Arc<SyncController>,
    mut subscription: NotificationSubscription,
    mut command_rx: mpsc::Receiver<SyncCommand>,
    event_tx: mpsc::Sender<SyncTaskEvent>,
) {
    let monitor = controller.monitor().clone();
    let mut belief = monitor.subscribe();
    let mut notifications_open = true;

    monitor.check().await;

    loop {
        tokio::select! {
            changed = belief.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *belief.borrow_and_update();
                controller.on_connectivity_changed(state).await;
            }

            notification = subscription.recv(), if notifications_open => {
                match notification {
                    Some(_) => controller.on_notification().await,
                    None => {
                        debug!("Notification hub closed");
                        notifications_open = false;
                    }
                }
            }

            cmd = command_rx.recv() => {
                let event = match cmd {
                    Some(SyncCommand::Approve(id)) => match controller.approve(&id).await {
                        Ok(delivery) => SyncTaskEvent::Approved { id, delivery },
                        Err(e) => SyncTaskEvent::Error { message: e.to_string() },
                    },
                    Some(SyncCommand::Reject(id)) => match controller.reject(&id).await {
                        Ok(delivery) => SyncTaskEvent::Rejected { id, delivery },
                        Err(e) => SyncTaskEvent::Error { message: e.to_string() },
                    },
                    Some(SyncCommand::Refresh) => match controller.refresh().await {
                        Ok(count) => SyncTaskEvent::Refreshed { count },
                        Err(e) => SyncTaskEvent::Error { message: e.to_string() },
                    },
                    Some(SyncCommand::Shutdown) | None => break,
                };
                // Never block the loop on a slow reader
                if event_tx.try_send(event).is_err() {
                    debug!("Sync event dropped");
                }
            }
        }
    }

    monitor.stop_polling();
    drop(subscription);
    debug!("Sync task stopped");
}
