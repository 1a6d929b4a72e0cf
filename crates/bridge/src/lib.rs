use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use shared::{
    domain::{EntryKind, WindowState},
    protocol::{BridgeRequest, CallResult, Credentials, UnlockOutcome},
};
use thiserror::Error;
use tracing::{debug, warn};

pub mod events;
pub mod validation;

pub use events::{DeliveryReport, EventHub, Subscription};
pub use validation::ValidationError;

/// The privileged side of the bridge. Calls resolve to the host's reply
/// envelope; notifications are fire-and-forget.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn invoke(&self, request: BridgeRequest) -> Result<CallResult>;
    fn notify(&self, request: BridgeRequest) -> Result<()>;
}

pub struct MissingTransport;

#[async_trait]
impl RemoteTransport for MissingTransport {
    async fn invoke(&self, request: BridgeRequest) -> Result<CallResult> {
        Err(anyhow!("remote process unavailable for {}", request.method()))
    }

    fn notify(&self, request: BridgeRequest) -> Result<()> {
        Err(anyhow!("remote process unavailable for {}", request.method()))
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("invalid argument for {method}: {source}")]
    Validation {
        method: &'static str,
        #[source]
        source: ValidationError,
    },
    #[error("{method} could not reach the remote process: {message}")]
    Unavailable {
        method: &'static str,
        message: String,
    },
    #[error("{method} failed: {message}")]
    Remote {
        method: &'static str,
        message: String,
    },
    #[error("{method} returned a malformed reply: {message}")]
    MalformedReply {
        method: &'static str,
        message: String,
    },
}

impl BridgeError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Fixed catalog of remote operations. Every argument is validated here and
/// only well-formed values reach the transport.
#[derive(Clone)]
pub struct ValidatedBridge {
    transport: Arc<dyn RemoteTransport>,
}

impl ValidatedBridge {
    pub fn new(transport: Arc<dyn RemoteTransport>) -> Self {
        Self { transport }
    }

    pub fn disconnected() -> Self {
        Self::new(Arc::new(MissingTransport))
    }

    /// Window controls are fire-and-forget; an error only means the host
    /// never saw the request, so the caller has to apply it locally.
    pub fn minimize(&self) -> Result<(), BridgeError> {
        self.notify(BridgeRequest::MinimizeWindow)
    }

    pub fn maximize(&self) -> Result<(), BridgeError> {
        self.notify(BridgeRequest::MaximizeWindow)
    }

    pub fn close(&self) -> Result<(), BridgeError> {
        self.notify(BridgeRequest::CloseWindow)
    }

    pub fn report_window_state(&self, state: WindowState) -> Result<(), BridgeError> {
        self.notify(BridgeRequest::ReportWindowState { state })
    }

    pub async fn save_products(&self, list: impl Into<Value>) -> Result<(), BridgeError> {
        self.save_list(EntryKind::Products, list).await
    }

    pub async fn save_keywords(&self, list: impl Into<Value>) -> Result<(), BridgeError> {
        self.save_list(EntryKind::Keywords, list).await
    }

    pub async fn save_list(
        &self,
        kind: EntryKind,
        list: impl Into<Value>,
    ) -> Result<(), BridgeError> {
        let method = match kind {
            EntryKind::Products => "products.save",
            EntryKind::Keywords => "keywords.save",
        };
        let entries = validation::validate_entry_list(&list.into())
            .map_err(|source| reject(method, source))?;
        self.call(BridgeRequest::SaveList { kind, entries })
            .await
            .map(|_| ())
    }

    pub async fn start_auto_refresh(
        &self,
        interval_ms: impl Into<Value>,
    ) -> Result<(), BridgeError> {
        let interval_ms = validation::validate_refresh_interval(&interval_ms.into())
            .map_err(|source| reject("refresh.start", source))?;
        self.call(BridgeRequest::StartRefresh { interval_ms })
            .await
            .map(|_| ())
    }

    pub async fn stop_auto_refresh(&self) -> Result<(), BridgeError> {
        self.call(BridgeRequest::StopRefresh).await.map(|_| ())
    }

    pub async fn try_unlock(
        &self,
        credentials: impl Into<Value>,
    ) -> Result<UnlockOutcome, BridgeError> {
        let mut raw = credentials.into();
        let sanitized = validation::sanitize_credentials(&raw);
        validation::wipe_strings(&mut raw);
        let credentials = sanitized.map_err(|source| reject("lock.try_unlock", source))?;
        self.submit_unlock(credentials).await
    }

    /// Same checks as [`Self::try_unlock`] for callers that already hold
    /// typed credentials, without an untyped copy of the password.
    pub async fn unlock_with(
        &self,
        credentials: &Credentials,
    ) -> Result<UnlockOutcome, BridgeError> {
        let credentials =
            validation::sanitize_credential_pair(&credentials.user, &credentials.pass)
                .map_err(|source| reject("lock.try_unlock", source))?;
        self.submit_unlock(credentials).await
    }

    pub fn report_connectivity(&self, online: impl Into<Value>) {
        let online = validation::coerce_bool(&online.into());
        // Already logged by `notify`; connectivity has no local fallback.
        let _ = self.notify(BridgeRequest::ReportConnectivity { online });
    }

    pub async fn get_version(&self) -> Result<String, BridgeError> {
        let request = BridgeRequest::GetVersion;
        let method = request.method();
        let data = self.call(request).await?;
        decode_data(method, data)
    }

    async fn submit_unlock(&self, credentials: Credentials) -> Result<UnlockOutcome, BridgeError> {
        let request = BridgeRequest::TryUnlock { credentials };
        let method = request.method();
        let data = self.call(request).await?;
        decode_data(method, data)
    }

    async fn call(&self, request: BridgeRequest) -> Result<Option<Value>, BridgeError> {
        let method = request.method();
        debug!(method, "forwarding bridge call");

        let reply = self
            .transport
            .invoke(request)
            .await
            .map_err(|err| BridgeError::Unavailable {
                method,
                message: format!("{err:#}"),
            })?;

        if !reply.success {
            return Err(BridgeError::Remote {
                method,
                message: reply
                    .error
                    .unwrap_or_else(|| "remote reported failure without a reason".to_string()),
            });
        }
        Ok(reply.data)
    }

    fn notify(&self, request: BridgeRequest) -> Result<(), BridgeError> {
        let method = request.method();
        debug!(method, "forwarding bridge notification");
        self.transport.notify(request).map_err(|err| {
            warn!(method, "bridge notification was not delivered: {err:#}");
            BridgeError::Unavailable {
                method,
                message: format!("{err:#}"),
            }
        })
    }
}

fn reject(method: &'static str, source: ValidationError) -> BridgeError {
    warn!(method, "rejected bridge call before crossing: {source}");
    BridgeError::Validation { method, source }
}

fn decode_data<T: serde::de::DeserializeOwned>(
    method: &'static str,
    data: Option<Value>,
) -> Result<T, BridgeError> {
    let data = data.ok_or_else(|| BridgeError::MalformedReply {
        method,
        message: "missing data".to_string(),
    })?;
    serde_json::from_value(data).map_err(|err| BridgeError::MalformedReply {
        method,
        message: err.to_string(),
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
