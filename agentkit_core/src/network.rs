//! Network descriptors used by providers to decide where they can operate.

use serde::{Deserialize, Serialize};

pub const SVM_PROTOCOL_FAMILY: &str = "svm";
pub const EVM_PROTOCOL_FAMILY: &str = "evm";

pub const SOLANA_MAINNET_GENESIS_HASH: &str = "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdpKuc147dw2N9d";
pub const SOLANA_TESTNET_GENESIS_HASH: &str = "4uhcVJyU9pJkvQyS88uRDiswHXSCkY3zQawwpjk2NsNY";
pub const SOLANA_DEVNET_GENESIS_HASH: &str = "EtWTRABZaYq6iMfeYKouRu166VU2xqa1wcaWoxPkrZBG";

/// EVM chain ids and the network ids they map to.
const EVM_NETWORKS: &[(u64, &str)] = &[
    (1, "ethereum-mainnet"),
    (11155111, "ethereum-sepolia"),
    (137, "polygon-mainnet"),
    (80001, "polygon-mumbai"),
    (8453, "base-mainnet"),
    (84532, "base-sepolia"),
    (42161, "arbitrum-mainnet"),
    (421614, "arbitrum-sepolia"),
    (10, "optimism-mainnet"),
    (11155420, "optimism-sepolia"),
];

/// The network a wallet provider is connected to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub protocol_family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
}

impl Network {
    pub fn new(protocol_family: impl Into<String>) -> Self {
        Self {
            protocol_family: protocol_family.into(),
            network_id: None,
            chain_id: None,
        }
    }

    pub fn with_network_id(mut self, network_id: impl Into<String>) -> Self {
        self.network_id = Some(network_id.into());
        self
    }

    pub fn with_chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = Some(chain_id.into());
        self
    }

    /// EVM network for a chain id; the network id is filled in for known chains.
    pub fn evm(chain_id: u64) -> Self {
        let network = Self::new(EVM_PROTOCOL_FAMILY).with_chain_id(chain_id.to_string());
        match evm_network_id(chain_id) {
            Some(network_id) => network.with_network_id(network_id),
            None => network,
        }
    }

    pub fn is_svm(&self) -> bool {
        self.protocol_family == SVM_PROTOCOL_FAMILY
    }

    pub fn is_evm(&self) -> bool {
        self.protocol_family == EVM_PROTOCOL_FAMILY
    }
}

pub fn evm_network_id(chain_id: u64) -> Option<&'static str> {
    EVM_NETWORKS
        .iter()
        .find(|(id, _)| *id == chain_id)
        .map(|(_, network_id)| *network_id)
}

pub fn evm_chain_id(network_id: &str) -> Option<u64> {
    EVM_NETWORKS
        .iter()
        .find(|(_, id)| *id == network_id)
        .map(|(chain_id, _)| *chain_id)
}

/// Public Solana clusters, identified by their genesis hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolanaCluster {
    Mainnet,
    Testnet,
    Devnet,
}

impl SolanaCluster {
    pub const ALL: [SolanaCluster; 3] = [
        SolanaCluster::Mainnet,
        SolanaCluster::Testnet,
        SolanaCluster::Devnet,
    ];

    pub fn genesis_hash(&self) -> &'static str {
        match self {
            SolanaCluster::Mainnet => SOLANA_MAINNET_GENESIS_HASH,
            SolanaCluster::Testnet => SOLANA_TESTNET_GENESIS_HASH,
            SolanaCluster::Devnet => SOLANA_DEVNET_GENESIS_HASH,
        }
    }

    pub fn network_id(&self) -> &'static str {
        match self {
            SolanaCluster::Mainnet => "solana-mainnet",
            SolanaCluster::Testnet => "solana-testnet",
            SolanaCluster::Devnet => "solana-devnet",
        }
    }

    /// Default public RPC endpoint for the cluster.
    pub fn rpc_url(&self) -> &'static str {
        match self {
            SolanaCluster::Mainnet => "https://api.mainnet-beta.solana.com",
            SolanaCluster::Testnet => "https://api.testnet.solana.com",
            SolanaCluster::Devnet => "https://api.devnet.solana.com",
        }
    }

    pub fn from_genesis_hash(genesis_hash: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|cluster| cluster.genesis_hash() == genesis_hash)
    }

    pub fn network(&self) -> Network {
        Network::new(SVM_PROTOCOL_FAMILY)
            .with_network_id(self.network_id())
            .with_chain_id(self.genesis_hash())
    }
}
