//! Side-channel instrumentation for action invocations.
//!
//! Events are handed to a [`TelemetrySink`] on a detached task, so a failing
//! sink never reaches the invocation that produced the event.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::{Arc, OnceLock, RwLock};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::runtime::Handle;
use url::Url;

use crate::error::{Error, Result};
use crate::wallet::WalletProvider;

pub const ACTION_INVOCATION_EVENT: &str = "agent_action_invocation";
pub const WALLET_INITIALIZATION_EVENT: &str = "agent_initialization";
pub const DEFAULT_ENDPOINT: &str = "https://cca-lite.coinbase.com/amp";

/// A flat telemetry record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryEvent {
    pub name: String,
    pub action: String,
    pub component: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(flatten)]
    pub properties: BTreeMap<String, String>,
}

impl TelemetryEvent {
    pub fn new(
        name: impl Into<String>,
        action: impl Into<String>,
        component: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            action: action.into(),
            component: component.into(),
            timestamp: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn action_invocation(action_name: &str, class_name: &str, method_name: &str) -> Self {
        Self::new(ACTION_INVOCATION_EVENT, "invoke_action", "agent_action")
            .with_property("action_name", action_name)
            .with_property("class_name", class_name)
            .with_property("method_name", method_name)
    }

    pub fn wallet_initialization(wallet: &dyn WalletProvider) -> Self {
        Self::new(
            WALLET_INITIALIZATION_EVENT,
            "initialize_wallet_provider",
            "wallet_provider",
        )
        .with_wallet(wallet)
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Attach the wallet's identifying fields. Absent network fields are omitted.
    pub fn with_wallet(mut self, wallet: &dyn WalletProvider) -> Self {
        let network = wallet.network();
        self = self
            .with_property("wallet_provider", wallet.name())
            .with_property("wallet_address", wallet.address())
            .with_property("protocol_family", network.protocol_family);
        if let Some(network_id) = network.network_id {
            self = self.with_property("network_id", network_id);
        }
        if let Some(chain_id) = network.chain_id {
            self = self.with_property("chain_id", chain_id);
        }
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

#[async_trait]
pub trait TelemetrySink: Send + Sync + Debug {
    async fn send(&self, event: TelemetryEvent) -> Result<()>;
}

/// Writes events to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTelemetrySink;

#[async_trait]
impl TelemetrySink for LogTelemetrySink {
    async fn send(&self, event: TelemetryEvent) -> Result<()> {
        tracing::debug!(
            event = %event.name,
            action = %event.action,
            component = %event.component,
            properties = ?event.properties,
            "telemetry event"
        );
        Ok(())
    }
}

/// Posts events to an analytics collector.
#[derive(Debug, Clone)]
pub struct HttpTelemetrySink {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTelemetrySink {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Sink pointed at [`DEFAULT_ENDPOINT`].
    pub fn with_default_endpoint() -> Result<Self> {
        let endpoint = Url::parse(DEFAULT_ENDPOINT)
            .map_err(|e| Error::Config(format!("invalid telemetry endpoint: {e}")))?;
        Ok(Self::new(endpoint))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl TelemetrySink for HttpTelemetrySink {
    async fn send(&self, event: TelemetryEvent) -> Result<()> {
        let timestamp = event
            .timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        let body = analytics_payload(&event, timestamp)?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Telemetry(format!(
                "collector responded with {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Wire body for the analytics collector: the envelope list as a JSON string
/// plus an md5 checksum over that string and the upload time.
pub fn analytics_payload(event: &TelemetryEvent, timestamp: i64) -> Result<Value> {
    let mut properties = Map::new();
    properties.insert("component_type".into(), json!(event.component));
    properties.insert("platform".into(), json!("server"));
    properties.insert("project_name".into(), json!("agentkit"));
    properties.insert("time_start".into(), json!(timestamp));
    properties.insert("agentkit_language".into(), json!("rust"));
    if let Value::Object(fields) = serde_json::to_value(event)? {
        properties.extend(fields);
    }

    let envelopes = json!([{
        "event_type": event.name,
        "platform": "server",
        "event_properties": properties,
    }]);
    let encoded = serde_json::to_string(&envelopes)?;
    let checksum = md5::compute(format!("{encoded}{timestamp}"));

    Ok(json!({
        "e": encoded,
        "checksum": format!("{checksum:x}"),
    }))
}

static DEFAULT_SINK: OnceLock<RwLock<Arc<dyn TelemetrySink>>> = OnceLock::new();

fn default_slot() -> &'static RwLock<Arc<dyn TelemetrySink>> {
    DEFAULT_SINK.get_or_init(|| RwLock::new(Arc::new(LogTelemetrySink)))
}

/// Replace the process-wide sink used by registries without their own.
pub fn install(sink: Arc<dyn TelemetrySink>) {
    match default_slot().write() {
        Ok(mut slot) => *slot = sink,
        Err(poisoned) => *poisoned.into_inner() = sink,
    }
}

pub fn default_sink() -> Arc<dyn TelemetrySink> {
    match default_slot().read() {
        Ok(slot) => Arc::clone(&slot),
        Err(poisoned) => Arc::clone(&poisoned.into_inner()),
    }
}

/// Fire and forget. `sink` falls back to the process-wide default.
pub fn emit(sink: Option<&Arc<dyn TelemetrySink>>, event: TelemetryEvent) {
    let sink = sink.cloned().unwrap_or_else(default_sink);
    let Ok(handle) = Handle::try_current() else {
        tracing::debug!(event = %event.name, "no async runtime, dropping telemetry event");
        return;
    };
    handle.spawn(async move {
        let name = event.name.clone();
        if let Err(err) = sink.send(event).await {
            tracing::warn!(event = %name, error = %err, "failed to send telemetry event");
        }
    });
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_action_invocation_event_fields() {
        let event = TelemetryEvent::action_invocation(
            "WalletActionProvider_native_transfer",
            "WalletActionProvider",
            "native_transfer",
        );
        assert_eq!(event.name, ACTION_INVOCATION_EVENT);
        assert_eq!(event.action, "invoke_action");
        assert_eq!(event.component, "agent_action");
        assert_eq!(
            event.property("action_name"),
            Some("WalletActionProvider_native_transfer")
        );
        assert_eq!(event.property("method_name"), Some("native_transfer"));
        assert_eq!(event.property("wallet_address"), None);
    }

    #[test]
    fn test_event_serializes_flat() {
        let event = TelemetryEvent::new("n", "a", "c").with_property("class_name", "X");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({ "name": "n", "action": "a", "component": "c", "class_name": "X" })
        );
    }

    #[test]
    fn test_analytics_payload_checksum() {
        let event = TelemetryEvent::new("agent_action_invocation", "invoke_action", "agent_action");
        let payload = analytics_payload(&event, 1_700_000_000_000).unwrap();

        let encoded = payload["e"].as_str().unwrap();
        let expected = format!("{:x}", md5::compute(format!("{encoded}1700000000000")));
        assert_eq!(payload["checksum"], json!(expected));

        let envelopes: Value = serde_json::from_str(encoded).unwrap();
        let envelope = &envelopes[0];
        assert_eq!(envelope["event_type"], "agent_action_invocation");
        assert_eq!(envelope["event_properties"]["component_type"], "agent_action");
        assert_eq!(envelope["event_properties"]["project_name"], "agentkit");
        assert_eq!(envelope["event_properties"]["time_start"], 1_700_000_000_000i64);
        assert_eq!(envelope["event_properties"]["action"], "invoke_action");
    }

    #[test]
    fn test_emit_without_runtime_is_a_noop() {
        let (sink, mut rx) = RecordingSink::new();
        emit(Some(&sink), TelemetryEvent::new("n", "a", "c"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_emit_delivers_to_sink() {
        let (sink, mut rx) = RecordingSink::new();
        emit(Some(&sink), TelemetryEvent::new("n", "a", "c"));
        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.name, "n");
    }

    #[test]
    fn test_default_endpoint() {
        let sink = HttpTelemetrySink::with_default_endpoint().unwrap();
        assert_eq!(sink.endpoint().as_str(), DEFAULT_ENDPOINT);
    }
}
