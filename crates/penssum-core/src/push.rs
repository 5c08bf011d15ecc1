//! Push registration
//!
//! Obtains this device's push token and registers it with the remote
//! service at most once per install. The token store remembers a
//! successful registration across launches.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::{Platform, PermissionStatus, PushSettings};
use crate::error::{Result, SyncError};
use crate::gateway::ProductGateway;
use crate::models::PushToken;
use crate::token_store::TokenStore;

/// Importance level of a notification channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    Default,
    High,
    Max,
}

/// Android notification channel description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: Importance,
    pub vibration_pattern: Vec<u64>,
    pub light_color: String,
}

impl NotificationChannel {
    /// Channel every moderation notification is posted to
    pub fn default_channel() -> Self {
        Self {
            id: "default".to_string(),
            name: "default".to_string(),
            importance: Importance::Max,
            vibration_pattern: vec![0, 250, 250, 250],
            light_color: "#FF231F7C".to_string(),
        }
    }
}

/// Platform seam for notification permission and tokens
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// False on simulators and development hosts
    fn is_physical_device(&self) -> bool;

    fn platform(&self) -> Platform;

    async fn permission_status(&self) -> Result<PermissionStatus>;

    async fn request_permission(&self) -> Result<PermissionStatus>;

    async fn push_token(&self) -> Result<PushToken>;

    /// Declare a channel; repeating a declaration is harmless
    async fn declare_channel(&self, channel: &NotificationChannel) -> Result<()>;
}

/// Provider whose answers come from configuration
///
/// Used on hosts without a native push service; permission requests
/// cannot change the configured answer.
#[derive(Debug, Clone)]
pub struct ConfiguredPushProvider {
    settings: PushSettings,
}

impl ConfiguredPushProvider {
    pub fn new(settings: PushSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl PushProvider for ConfiguredPushProvider {
    fn is_physical_device(&self) -> bool {
        self.settings.physical_device
    }

    fn platform(&self) -> Platform {
        self.settings.platform
    }

    async fn permission_status(&self) -> Result<PermissionStatus> {
        Ok(self.settings.permission)
    }

    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(self.settings.permission)
    }

    async fn push_token(&self) -> Result<PushToken> {
        self.settings
            .token
            .as_deref()
            .map(PushToken::new)
            .ok_or_else(|| SyncError::Push("no push token configured".to_string()))
    }

    async fn declare_channel(&self, channel: &NotificationChannel) -> Result<()> {
        debug!("Channel '{}' declared", channel.id);
        Ok(())
    }
}

/// Registers the device token with the remote service
pub struct PushRegistrar {
    provider: Arc<dyn PushProvider>,
    store: Arc<dyn TokenStore>,
    gateway: Arc<dyn ProductGateway>,
}

impl PushRegistrar {
    pub fn new(
        provider: Arc<dyn PushProvider>,
        store: Arc<dyn TokenStore>,
        gateway: Arc<dyn ProductGateway>,
    ) -> Self {
        Self {
            provider,
            store,
            gateway,
        }
    }

    /// Token recorded by an earlier successful registration
    pub fn registered_token(&self) -> Result<Option<PushToken>> {
        self.store.load_token()
    }

    /// Run the registration flow
    ///
    /// Returns the device token, or `None` when the device is not
    /// physical or permission was refused. The remote call happens only
    /// if no token has been stored yet and `connected` is true.
    pub async fn register(&self, connected: bool) -> Result<Option<PushToken>> {
        let mut token = None;

        if self.provider.is_physical_device() {
            let mut status = self.provider.permission_status().await?;
            if status != PermissionStatus::Granted {
                status = self.provider.request_permission().await?;
            }
            if status != PermissionStatus::Granted {
                debug!("Notification permission not granted, skipping registration");
                return Ok(None);
            }

            let device_token = self.provider.push_token().await?;
            if self.store.load_token()?.is_none() && connected {
                self.gateway.register_device(&device_token).await?;
                info!("Registered device for push notifications");

                if let Err(e) = self.store.save_token(&device_token) {
                    warn!("Registered token could not be saved: {}", e);
                }
            }
            token = Some(device_token);
        } else {
            debug!("Not a physical device, push registration skipped");
        }

        if self.provider.platform() == Platform::Android {
            self.provider
                .declare_channel(&NotificationChannel::default_channel())
                .await?;
        }

        Ok(token)
    }
}
