//! Core of the agent kit: declare actions on providers, bind them to a wallet,
//! and hand them to an agent runtime as named, schema-described tools.
//!
//! A provider builds an [`ActionRegistry`] in its constructor. [`AgentKit`]
//! gathers the actions of every provider that supports the wallet's network.

pub mod actions;
pub mod agent;
pub mod config;
pub mod custom_actions;
pub mod error;
pub mod network;
pub mod provider;
pub mod schema;
pub mod telemetry;
pub mod wallet;
pub mod wallet_actions;

pub use actions::{Action, ActionDeclaration, ActionInvoker, ActionMetadata, ActionRegistry};
pub use agent::{AgentKit, AgentKitOptions};
pub use config::{AgentKitConfig, TelemetryConfig};
pub use custom_actions::{CustomActionDefinition, CustomActionProvider};
pub use error::{Error, Result};
pub use network::{Network, SolanaCluster};
pub use provider::ActionProvider;
pub use schema::{ActionSchema, EmptyInput, SchemaError};
pub use telemetry::{HttpTelemetrySink, LogTelemetrySink, TelemetryEvent, TelemetrySink};
pub use wallet::{SolanaKeypairWalletProvider, SvmWalletProvider, WalletProvider};
pub use wallet_actions::WalletActionProvider;
