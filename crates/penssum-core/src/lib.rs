//! Penssum Core Library
//!
//! Client-side core of the Penssum moderation console: the list of
//! products awaiting admin review, kept in step with the remote service
//! across connectivity loss, push notifications and optimistic
//! approve/reject actions.
//!
//! # Architecture
//!
//! - **Gateway**: typed HTTP client for the product endpoints
//! - **Connectivity monitor**: tri-state reachability belief with a cancellable retry timer
//! - **Sync controller**: owns the pending list, published through a `watch` channel
//! - **Push registrar**: registers the device token at most once per install
//!
//! # Quick Start
//!
//! ```text
//! let config = Arc::new(Config::load()?);
//! let gateway = Arc::new(HttpGateway::new(&config.api_url));
//! let monitor = ConnectivityMonitor::new(Arc::new(probe), config.poll_interval());
//! let controller = Arc::new(SyncController::new(gateway, monitor, registrar));
//!
//! let handle = spawn_sync_task(controller, hub.subscribe());
//! ```
//!
//! # Modules
//!
//! - `config`: Application configuration
//! - `gateway`: Remote product endpoints
//! - `connectivity`: Reachability belief and retry timer
//! - `notifications`: Received notification fan-out
//! - `push`: Push permission and token registration
//! - `token_store`: Persisted registration state
//! - `sync`: Sync controller and background task

pub mod config;
pub mod connectivity;
pub mod error;
pub mod gateway;
pub mod models;
pub mod notifications;
pub mod push;
pub mod sync;
pub mod token_store;

pub use config::Config;
pub use connectivity::{ConnectivityMonitor, HttpProbe, ReachabilityProbe, RetryTimer};
pub use error::{GatewayError, SyncError};
pub use gateway::{HttpGateway, ProductGateway};
pub use models::{ConnectivityState, FileRef, Product, PushToken};
pub use notifications::{NotificationHub, NotificationSubscription, PushNotification};
pub use push::{ConfiguredPushProvider, PushProvider, PushRegistrar};
pub use sync::{
    spawn_sync_task, Delivery, SyncCommand, SyncController, SyncHandle, SyncSnapshot,
    SyncTaskEvent, View,
};
pub use token_store::{FileTokenStore, TokenStore};
