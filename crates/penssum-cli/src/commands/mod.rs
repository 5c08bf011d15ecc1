//! Command handlers

pub mod config;
pub mod moderate;
pub mod open;
pub mod pending;
pub mod register;
pub mod show;
pub mod status;
pub mod watch;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use penssum_core::{
    Config, ConfiguredPushProvider, ConnectivityMonitor, FileTokenStore, HttpGateway, HttpProbe,
    NotificationHub, ProductGateway, PushRegistrar, ReachabilityProbe, SyncController,
};

/// Everything a command needs, wired from one configuration
pub struct App {
    pub config: Arc<Config>,
    pub monitor: Arc<ConnectivityMonitor>,
    pub controller: Arc<SyncController>,
    pub hub: NotificationHub,
}

impl App {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let probe = HttpProbe::new(&config.api_url, config.probe_timeout())
            .context("Failed to build connectivity probe")?;
        let gateway = Arc::new(HttpGateway::new(&config.api_url));
        debug!("Using service at {}", config.api_url);
        Ok(Self::with_services(config, gateway, Arc::new(probe)))
    }

    /// Wire the app around an arbitrary gateway and probe
    pub fn with_services(
        config: Arc<Config>,
        gateway: Arc<dyn ProductGateway>,
        probe: Arc<dyn ReachabilityProbe>,
    ) -> Self {
        let monitor = ConnectivityMonitor::new(probe, config.poll_interval());
        let registrar = PushRegistrar::new(
            Arc::new(ConfiguredPushProvider::new(config.push.clone())),
            Arc::new(FileTokenStore::new(config.token_store_path())),
            gateway.clone(),
        );
        let controller = Arc::new(SyncController::new(gateway, monitor.clone(), registrar));
        let hub = NotificationHub::new(config.notifications);

        Self {
            config,
            monitor,
            controller,
            hub,
        }
    }

    /// One connectivity check, fed to the controller as a belief change
    ///
    /// When connected this fetches the pending list and runs push
    /// registration. Returns whether the service was reachable.
    pub async fn sync_once(&self) -> bool {
        let connected = self.monitor.check().await;
        self.controller
            .on_connectivity_changed(self.monitor.state())
            .await;
        // One-shot commands don't wait for reconnection
        self.monitor.stop_polling();
        connected
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory services for command tests

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use penssum_core::error::{GatewayError, GatewayResult};
    use penssum_core::{Config, FileRef, Product, ProductGateway, PushToken, ReachabilityProbe};
    use tempfile::TempDir;

    use super::App;

    /// Gateway serving a fixed list, counting fetches
    #[derive(Default)]
    pub struct StubGateway {
        pub pending: Mutex<Vec<Product>>,
        pub fail_fetch: AtomicBool,
        pub fetches: AtomicUsize,
    }

    impl StubGateway {
        pub fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProductGateway for StubGateway {
        async fn fetch_pending(&self) -> GatewayResult<Vec<Product>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(GatewayError::Status {
                    endpoint: "/products".to_string(),
                    status: 500,
                });
            }
            Ok(self.pending.lock().unwrap().clone())
        }

        async fn approve(&self, _id: &str) -> GatewayResult<()> {
            Ok(())
        }

        async fn mark_files_for_removal(&self, _files: &[FileRef]) -> GatewayResult<()> {
            Ok(())
        }

        async fn delete_product(&self, _id: &str, _notify: bool) -> GatewayResult<()> {
            Ok(())
        }

        async fn register_device(&self, _token: &PushToken) -> GatewayResult<()> {
            Ok(())
        }
    }

    pub struct StubProbe(pub bool);

    #[async_trait]
    impl ReachabilityProbe for StubProbe {
        async fn probe(&self) -> GatewayResult<bool> {
            Ok(self.0)
        }
    }

    pub fn product(id: &str) -> Product {
        serde_json::from_value(serde_json::json!({"_id": id, "category": "Tareas"})).unwrap()
    }

    pub fn app(temp_dir: &TempDir, gateway: Arc<StubGateway>, reachable: bool) -> App {
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        App::with_services(Arc::new(config), gateway, Arc::new(StubProbe(reachable)))
    }
}
