//! Client-side synchronization
//!
//! The `SyncController` owns the list of pending products and keeps it
//! in step with the remote service:
//!
//! 1. Connectivity lost: list cleared, monitor re-checks every interval
//! 2. Connectivity regained: polling stops, list re-fetched, push token registered
//! 3. Notification received: list re-fetched, whatever the belief
//! 4. Approve/reject: product removed locally first, remote call only when online
//!
//! ## Usage
//!
//! ```ignore
//! let controller = Arc::new(SyncController::new(gateway, monitor, registrar));
//! let handle = spawn_sync_task(controller, hub.subscribe());
//! handle.command_tx.send(SyncCommand::Refresh).await?;
//! ```

mod controller;
mod task;

use serde::Serialize;

use crate::models::{ConnectivityState, Product};

pub use controller::{Delivery, SyncController};
pub use task::{spawn_sync_task, SyncCommand, SyncHandle, SyncTaskEvent};

/// Read-only view of the controller state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncSnapshot {
    pub connectivity: ConnectivityState,
    /// `None` until the first successful fetch (and again while offline)
    pub products: Option<Vec<Product>>,
    /// A manual refresh is in flight
    pub refreshing: bool,
}

/// Which screen the presentation layer should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Offline,
    Loading,
    Empty,
    Content,
}

impl SyncSnapshot {
    pub fn view(&self) -> View {
        if self.connectivity == ConnectivityState::Disconnected {
            return View::Offline;
        }
        match &self.products {
            None => View::Loading,
            Some(products) if products.is_empty() => View::Empty,
            Some(_) => View::Content,
        }
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.as_ref()?.iter().find(|p| p.id == id)
    }
}
