//! Configuration for building an [`AgentKit`](crate::AgentKit).

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use url::Url;

use crate::telemetry::{HttpTelemetrySink, LogTelemetrySink, TelemetrySink};

/// Credentials and settings used when the caller does not supply a wallet provider.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct AgentKitConfig {
    /// Solana RPC endpoint; defaults to the devnet cluster.
    pub rpc_url: Option<String>,
    /// Base58 encoded 64-byte secret key.
    pub private_key: Option<String>,
    pub telemetry: Option<TelemetryConfig>,
}

impl AgentKitConfig {
    pub fn with_private_key(mut self, private_key: impl Into<String>) -> Self {
        self.private_key = Some(private_key.into());
        self
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = Some(rpc_url.into());
        self
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.telemetry = Some(telemetry);
        self
    }
}

impl fmt::Debug for AgentKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentKitConfig")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("telemetry", &self.telemetry)
            .finish()
    }
}

/// Where invocation telemetry goes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Post events to `endpoint` instead of logging them.
    pub enabled: bool,
    /// Collector URL; defaults to [`DEFAULT_ENDPOINT`](crate::telemetry::DEFAULT_ENDPOINT).
    pub endpoint: Option<Url>,
}

impl TelemetryConfig {
    pub fn build_sink(&self) -> crate::Result<Arc<dyn TelemetrySink>> {
        if !self.enabled {
            return Ok(Arc::new(LogTelemetrySink));
        }
        let sink = match &self.endpoint {
            Some(endpoint) => HttpTelemetrySink::new(endpoint.clone()),
            None => HttpTelemetrySink::with_default_endpoint()?,
        };
        Ok(Arc::new(sink))
    }
}
