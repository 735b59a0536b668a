use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::actions::Action;
use crate::config::AgentKitConfig;
use crate::error::{Error, Result};
use crate::network::SolanaCluster;
use crate::provider::ActionProvider;
use crate::telemetry::{self, TelemetryEvent};
use crate::wallet::{SolanaKeypairWalletProvider, WalletProvider};
use crate::wallet_actions::WalletActionProvider;

/// Inputs to [`AgentKit::create`].
#[derive(Default)]
pub struct AgentKitOptions {
    pub config: AgentKitConfig,
    pub wallet_provider: Option<Arc<dyn WalletProvider>>,
    pub action_providers: Option<Vec<Arc<dyn ActionProvider>>>,
}

impl AgentKitOptions {
    pub fn new(config: AgentKitConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_wallet_provider(mut self, wallet: Arc<dyn WalletProvider>) -> Self {
        self.wallet_provider = Some(wallet);
        self
    }

    pub fn with_action_providers(mut self, providers: Vec<Arc<dyn ActionProvider>>) -> Self {
        self.action_providers = Some(providers);
        self
    }
}

/// core struct tying one wallet to the providers an agent can use.
pub struct AgentKit {
    wallet_provider: Arc<dyn WalletProvider>,
    action_providers: Vec<Arc<dyn ActionProvider>>,
}

impl AgentKit {
    pub async fn create(options: AgentKitOptions) -> Result<Self> {
        let AgentKitOptions {
            config,
            wallet_provider,
            action_providers,
        } = options;

        let sink = match &config.telemetry {
            Some(telemetry) => Some(telemetry.build_sink()?),
            None => None,
        };

        let wallet_provider: Arc<dyn WalletProvider> = match wallet_provider {
            Some(wallet) => wallet,
            None => Arc::new(keypair_wallet(&config).await?),
        };

        // Nothing below can fail, so the process-wide sink only changes on success.
        if let Some(sink) = sink {
            telemetry::install(sink);
        }
        let action_providers = action_providers.unwrap_or_else(|| {
            let wallet_actions: Arc<dyn ActionProvider> = Arc::new(WalletActionProvider::new());
            vec![wallet_actions]
        });

        tracing::info!(
            wallet = wallet_provider.name(),
            address = %wallet_provider.address(),
            providers = action_providers.len(),
            "agentkit initialized"
        );
        telemetry::emit(
            None,
            TelemetryEvent::wallet_initialization(wallet_provider.as_ref()),
        );

        Ok(Self {
            wallet_provider,
            action_providers,
        })
    }

    pub fn wallet_provider(&self) -> &Arc<dyn WalletProvider> {
        &self.wallet_provider
    }

    pub fn action_providers(&self) -> &[Arc<dyn ActionProvider>] {
        &self.action_providers
    }

    /// Actions of every provider that supports the wallet's network, in provider order.
    pub fn get_actions(&self) -> Vec<Action> {
        let network = self.wallet_provider.network();
        let mut actions = Vec::new();
        for provider in &self.action_providers {
            if provider.supports_network(&network) {
                actions.extend(provider.get_actions(&self.wallet_provider));
            } else {
                tracing::debug!(
                    provider = provider.name(),
                    protocol_family = %network.protocol_family,
                    "action provider does not support network, skipping"
                );
            }
        }
        actions
    }

    /// Run the action registered under `name`.
    pub async fn invoke(&self, name: &str, args: Value) -> Result<String> {
        let action = self
            .get_actions()
            .into_iter()
            .find(|action| action.name == name)
            .ok_or_else(|| Error::UnknownAction(name.to_string()))?;
        action.invoke(args).await
    }
}

impl fmt::Debug for AgentKit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let providers: Vec<_> = self.action_providers.iter().map(|p| p.name()).collect();
        f.debug_struct("AgentKit")
            .field("wallet_provider", &self.wallet_provider)
            .field("action_providers", &providers)
            .finish()
    }
}

/// Without an explicit RPC URL the wallet targets devnet, whose genesis hash is known.
async fn keypair_wallet(config: &AgentKitConfig) -> Result<SolanaKeypairWalletProvider> {
    let secret = config.private_key.as_deref().ok_or_else(|| {
        Error::Config("private_key is required if not providing a wallet provider".into())
    })?;
    let keypair = SolanaKeypairWalletProvider::parse_keypair(secret)?;

    match &config.rpc_url {
        Some(rpc_url) => {
            SolanaKeypairWalletProvider::from_rpc_url(rpc_url.as_str(), keypair).await
        }
        None => {
            let cluster = SolanaCluster::Devnet;
            SolanaKeypairWalletProvider::new(keypair, cluster.rpc_url(), cluster.genesis_hash())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionDeclaration, ActionRegistry};
    use crate::config::TelemetryConfig;
    use crate::network::Network;
    use crate::schema::ActionSchema;
    use crate::wallet::testing::MockWallet;
    use serde_json::json;
    use solana_sdk::signature::{Keypair, Signer};

    /// Provider limited to one protocol family.
    struct FamilyProvider {
        family: &'static str,
        registry: ActionRegistry,
    }

    impl FamilyProvider {
        fn new(owner: &str, family: &'static str) -> Self {
            let mut registry = ActionRegistry::new(owner);
            registry.register(
                "ping",
                ActionDeclaration::new("ping", "Reply with pong", ActionSchema::empty()),
                |_| async { Ok("pong".to_string()) },
            );
            Self { family, registry }
        }
    }

    impl ActionProvider for FamilyProvider {
        fn name(&self) -> &str {
            self.family
        }

        fn registry(&self) -> Option<&ActionRegistry> {
            Some(&self.registry)
        }

        fn supports_network(&self, network: &Network) -> bool {
            network.protocol_family == self.family
        }
    }

    fn options() -> AgentKitOptions {
        AgentKitOptions::default().with_wallet_provider(Arc::new(MockWallet::new("agent-wallet")))
    }

    fn names(actions: &[Action]) -> Vec<String> {
        actions.iter().map(|a| a.name.clone()).collect()
    }

    #[tokio::test]
    async fn test_defaults_to_wallet_actions() {
        let kit = AgentKit::create(options()).await.unwrap();
        assert_eq!(kit.action_providers().len(), 1);
        assert_eq!(kit.action_providers()[0].name(), "wallet");
        assert_eq!(
            names(&kit.get_actions()),
            vec![
                "WalletActionProvider_get_wallet_details",
                "WalletActionProvider_native_transfer"
            ]
        );
    }

    #[tokio::test]
    async fn test_filters_providers_by_network() {
        let providers: Vec<Arc<dyn ActionProvider>> = vec![
            Arc::new(FamilyProvider::new("EvmProvider", "evm")),
            Arc::new(FamilyProvider::new("SvmProvider", "svm")),
        ];
        let kit = AgentKit::create(options().with_action_providers(providers))
            .await
            .unwrap();

        assert_eq!(names(&kit.get_actions()), vec!["SvmProvider_ping"]);
        assert_eq!(names(&kit.get_actions()), names(&kit.get_actions()));
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let err = AgentKit::create(AgentKitOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err
            .to_string()
            .contains("private_key is required if not providing a wallet provider"));
    }

    #[tokio::test]
    async fn test_failed_create_keeps_default_sink() {
        let before = telemetry::default_sink();
        let config = AgentKitConfig::default().with_telemetry(TelemetryConfig {
            enabled: true,
            endpoint: None,
        });

        let err = AgentKit::create(AgentKitOptions::new(config)).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(Arc::ptr_eq(&before, &telemetry::default_sink()));
    }

    #[tokio::test]
    async fn test_actions_follow_provider_order() {
        let providers: Vec<Arc<dyn ActionProvider>> = vec![
            Arc::new(FamilyProvider::new("FirstProvider", "svm")),
            Arc::new(WalletActionProvider::new()),
            Arc::new(FamilyProvider::new("LastProvider", "svm")),
        ];
        let kit = AgentKit::create(options().with_action_providers(providers))
            .await
            .unwrap();

        assert_eq!(
            names(&kit.get_actions()),
            vec![
                "FirstProvider_ping",
                "WalletActionProvider_get_wallet_details",
                "WalletActionProvider_native_transfer",
                "LastProvider_ping"
            ]
        );
    }

    #[tokio::test]
    async fn test_builds_keypair_wallet_from_config() {
        let keypair = Keypair::new();
        let secret = bs58::encode(keypair.to_bytes()).into_string();
        let kit = AgentKit::create(AgentKitOptions::new(
            AgentKitConfig::default().with_private_key(secret),
        ))
        .await
        .unwrap();

        let wallet = kit.wallet_provider();
        assert_eq!(wallet.address(), keypair.pubkey().to_string());
        assert_eq!(wallet.name(), SolanaKeypairWalletProvider::NAME);
        assert_eq!(wallet.network(), SolanaCluster::Devnet.network());
    }

    #[tokio::test]
    async fn test_invoke_by_name() {
        let providers: Vec<Arc<dyn ActionProvider>> =
            vec![Arc::new(FamilyProvider::new("SvmProvider", "svm"))];
        let kit = AgentKit::create(options().with_action_providers(providers))
            .await
            .unwrap();

        assert_eq!(kit.invoke("SvmProvider_ping", json!({})).await.unwrap(), "pong");

        let err = kit.invoke("SvmProvider_missing", json!({})).await.unwrap_err();
        assert!(matches!(err, Error::UnknownAction(name) if name == "SvmProvider_missing"));
    }
}
