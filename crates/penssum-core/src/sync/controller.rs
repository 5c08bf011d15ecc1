//! Sync controller
//!
//! Owns the canonical list of pending products. All state lives in a
//! `watch` channel and is only touched through `send_modify`, never
//! across an await point; concurrent callers interleave at network and
//! timer awaits and the last completed fetch wins.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::SyncSnapshot;
use crate::connectivity::ConnectivityMonitor;
use crate::error::Result;
use crate::gateway::ProductGateway;
use crate::models::{ConnectivityState, Product};
use crate::push::PushRegistrar;

/// What happened to the remote side of a moderation action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    /// Remote call(s) completed
    Sent,
    /// Offline; the local removal stands and nothing is queued
    Skipped,
}

pub struct SyncController {
    gateway: Arc<dyn ProductGateway>,
    monitor: Arc<ConnectivityMonitor>,
    registrar: PushRegistrar,
    state: watch::Sender<SyncSnapshot>,
}

impl SyncController {
    pub fn new(
        gateway: Arc<dyn ProductGateway>,
        monitor: Arc<ConnectivityMonitor>,
        registrar: PushRegistrar,
    ) -> Self {
        let (state, _) = watch::channel(SyncSnapshot::default());
        Self {
            gateway,
            monitor,
            registrar,
            state,
        }
    }

    pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
        &self.monitor
    }

    pub fn registrar(&self) -> &PushRegistrar {
        &self.registrar
    }

    /// Current state
    pub fn snapshot(&self) -> SyncSnapshot {
        self.state.borrow().clone()
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.state.subscribe()
    }

    pub fn products(&self) -> Option<Vec<Product>> {
        self.state.borrow().products.clone()
    }

    /// React to a new connectivity belief
    ///
    /// Entering `Disconnected` clears the list and starts polling.
    /// Entering `Connected` stops polling, re-fetches and registers the
    /// push token. Repeating the current belief does nothing.
    pub async fn on_connectivity_changed(&self, next: ConnectivityState) {
        let mut previous = next;
        self.state.send_if_modified(|s| {
            previous = s.connectivity;
            if previous == next {
                return false;
            }
            s.connectivity = next;
            if next == ConnectivityState::Disconnected {
                s.products = None;
            }
            true
        });

        if previous == next {
            return;
        }
        debug!("Connectivity belief {:?} -> {:?}", previous, next);

        match next {
            ConnectivityState::Disconnected => {
                self.monitor.start_polling();
            }
            ConnectivityState::Connected => {
                self.monitor.stop_polling();
                // Failure is logged inside fetch
                let _ = self.fetch().await;
                self.register_push().await;
            }
            ConnectivityState::Unknown => {}
        }
    }

    /// React to a received push notification
    pub async fn on_notification(&self) {
        debug!("Notification received, refreshing pending products");
        let _ = self.fetch().await;
    }

    /// Replace the local list with the server's pending products
    ///
    /// On failure the list is left as it was.
    pub async fn fetch(&self) -> Result<usize> {
        match self.gateway.fetch_pending().await {
            Ok(products) => {
                let count = products.len();
                self.state.send_modify(|s| s.products = Some(products));
                info!("Fetched {} pending product(s)", count);
                Ok(count)
            }
            Err(e) => {
                warn!("Failed to fetch pending products: {}", e);
                Err(e.into())
            }
        }
    }

    /// Pull-to-refresh: fetch with the `refreshing` flag raised
    ///
    /// The flag is lowered however the fetch ends, including when this
    /// future is dropped.
    pub async fn refresh(&self) -> Result<usize> {
        let _guard = RefreshGuard::raise(&self.state);
        self.fetch().await
    }

    /// Approve a product
    pub async fn approve(&self, id: &str) -> Result<Delivery> {
        self.remove_local(id);

        if !self.monitor.check().await {
            info!("Offline, approval of {} not sent", id);
            return Ok(Delivery::Skipped);
        }

        self.gateway
            .approve(id)
            .await
            .inspect_err(|e| warn!("Approving {} failed: {}", id, e))?;
        info!("Approved {}", id);
        Ok(Delivery::Sent)
    }

    /// Reject a product: archive its files, then delete it and notify the owner
    pub async fn reject(&self, id: &str) -> Result<Delivery> {
        let files = match self.remove_local(id) {
            Some(product) => product.files,
            None => {
                debug!("Rejecting {} which is not in the local list", id);
                Vec::new()
            }
        };

        if !self.monitor.check().await {
            info!("Offline, rejection of {} not sent", id);
            return Ok(Delivery::Skipped);
        }

        self.gateway
            .mark_files_for_removal(&files)
            .await
            .inspect_err(|e| warn!("Removing files of {} failed: {}", id, e))?;
        self.gateway
            .delete_product(id, true)
            .await
            .inspect_err(|e| warn!("Deleting {} failed: {}", id, e))?;
        info!("Rejected {}", id);
        Ok(Delivery::Sent)
    }

    /// Optimistic removal; returns the removed entry
    fn remove_local(&self, id: &str) -> Option<Product> {
        let mut removed = None;
        self.state.send_if_modified(|s| {
            let Some(products) = s.products.as_mut() else {
                return false;
            };
            let Some(pos) = products.iter().position(|p| p.id == id) else {
                return false;
            };
            removed = Some(products.remove(pos));
            true
        });
        removed
    }

    async fn register_push(&self) {
        let connected = self.state.borrow().connectivity.is_connected();
        match self.registrar.register(connected).await {
            Ok(Some(token)) => debug!("Push token {}", token),
            Ok(None) => {}
            Err(e) => warn!("Push registration failed: {}", e),
        }
    }
}

/// Raises `refreshing` for its lifetime
struct RefreshGuard<'a> {
    state: &'a watch::Sender<SyncSnapshot>,
}

impl<'a> RefreshGuard<'a> {
    fn raise(state: &'a watch::Sender<SyncSnapshot>) -> Self {
        state.send_modify(|s| s.refreshing = true);
        Self { state }
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.refreshing = false);
    }
}
