//! Remote product gateway
//!
//! Thin request layer over the moderation endpoints of the remote
//! service. Every call is a single POST with a JSON body; there are no
//! retries and no timeout beyond the transport default.
//!
//! ## Endpoints
//!
//! | Operation          | Path                   | Body                            |
//! |--------------------|------------------------|---------------------------------|
//! | fetch pending      | `/products`            | `{review: true}`                |
//! | approve            | `/product/accept`      | `{id}`                          |
//! | mark files removed | `/product/remove/files`| `{files, activate: true}`       |
//! | delete product     | `/product/remove`      | `{id, notification: true}`      |
//! | register device    | `/apk/device/add`      | `{deviceID}`                    |

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};
use crate::models::{FileRef, Product, PushToken};

const FETCH_PENDING: &str = "/products";
const ACCEPT: &str = "/product/accept";
const REMOVE_FILES: &str = "/product/remove/files";
const REMOVE: &str = "/product/remove";
const DEVICE_ADD: &str = "/apk/device/add";

/// Operations offered by the remote product service
#[async_trait]
pub trait ProductGateway: Send + Sync {
    /// Products flagged for review, in server order
    async fn fetch_pending(&self) -> GatewayResult<Vec<Product>>;

    async fn approve(&self, id: &str) -> GatewayResult<()>;

    /// Mark a product's files for removal/archival
    async fn mark_files_for_removal(&self, files: &[FileRef]) -> GatewayResult<()>;

    /// Delete a product record, optionally notifying its owner
    async fn delete_product(&self, id: &str, notify: bool) -> GatewayResult<()>;

    async fn register_device(&self, token: &PushToken) -> GatewayResult<()>;
}

#[derive(Debug, Serialize)]
struct ReviewFilter {
    review: bool,
}

#[derive(Debug, Serialize)]
struct ProductId<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct RemoveFiles<'a> {
    files: &'a [FileRef],
    activate: bool,
}

#[derive(Debug, Serialize)]
struct RemoveProduct<'a> {
    id: &'a str,
    notification: bool,
}

#[derive(Debug, Serialize)]
struct DeviceAdd<'a> {
    #[serde(rename = "deviceID")]
    device_id: &'a str,
}

/// HTTP implementation backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> GatewayResult<reqwest::Response> {
        debug!("POST {}", path);
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                endpoint: path.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ProductGateway for HttpGateway {
    async fn fetch_pending(&self) -> GatewayResult<Vec<Product>> {
        let response = self
            .post(FETCH_PENDING, &ReviewFilter { review: true })
            .await?;
        response
            .json::<Vec<Product>>()
            .await
            .map_err(|source| GatewayError::Decode {
                endpoint: FETCH_PENDING.to_string(),
                source,
            })
    }

    async fn approve(&self, id: &str) -> GatewayResult<()> {
        self.post(ACCEPT, &ProductId { id }).await?;
        Ok(())
    }

    async fn mark_files_for_removal(&self, files: &[FileRef]) -> GatewayResult<()> {
        self.post(
            REMOVE_FILES,
            &RemoveFiles {
                files,
                activate: true,
            },
        )
        .await?;
        Ok(())
    }

    async fn delete_product(&self, id: &str, notify: bool) -> GatewayResult<()> {
        self.post(
            REMOVE,
            &RemoveProduct {
                id,
                notification: notify,
            },
        )
        .await?;
        Ok(())
    }

    async fn register_device(&self, token: &PushToken) -> GatewayResult<()> {
        self.post(
            DEVICE_ADD,
            &DeviceAdd {
                device_id: token.as_str(),
            },
        )
        .await?;
        Ok(())
    }
}
