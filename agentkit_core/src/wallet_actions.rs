//! Wallet actions for agentkit
//!
//! Includes: wallet details (address, network, native balance) and native asset transfers.

use std::sync::Arc;

use bigdecimal::{num_bigint::BigInt, BigDecimal};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::actions::{ActionDeclaration, ActionRegistry};
use crate::error::Result;
use crate::network::Network;
use crate::provider::ActionProvider;
use crate::schema::{ActionSchema, EmptyInput};
use crate::telemetry::TelemetrySink;
use crate::wallet::WalletProvider;

const GET_WALLET_DETAILS_DESCRIPTION: &str = "
This tool will return the details of the connected wallet including:
- Wallet address
- Network information (protocol family, network ID, chain ID)
- Native token balance, in whole units and in the smallest unit
- Wallet provider name
";

const NATIVE_TRANSFER_DESCRIPTION: &str = "
This tool will transfer native tokens from the wallet to another onchain address.

It takes the following inputs:
- to: The address to receive the funds
- value: The amount to transfer in whole units e.g. 1 SOL or 0.00001 SOL

Important notes:
- Ensure sufficient balance of the input asset before transferring
- Ensure there is sufficient native token balance for fees
";

/// Input for `native_transfer`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NativeTransferInput {
    /// The destination address to receive the funds
    pub to: String,
    /// The amount to transfer in whole units e.g. 1 SOL or 0.00001 SOL
    pub value: String,
}

// =============================================================================
// WalletActionProvider - basic wallet information and native transfers
// =============================================================================

/// Network-agnostic actions over whichever wallet the agent is bound to.
#[derive(Debug)]
pub struct WalletActionProvider {
    registry: ActionRegistry,
}

impl WalletActionProvider {
    pub const NAME: &'static str = "wallet";
    pub const OWNER: &'static str = "WalletActionProvider";

    pub fn new() -> Self {
        Self::build(ActionRegistry::new(Self::OWNER))
    }

    pub fn with_telemetry(sink: Arc<dyn TelemetrySink>) -> Self {
        Self::build(ActionRegistry::with_telemetry(Self::OWNER, sink))
    }

    fn build(mut registry: ActionRegistry) -> Self {
        registry
            .register_with_wallet(
                "get_wallet_details",
                ActionDeclaration::new(
                    "get_wallet_details",
                    GET_WALLET_DETAILS_DESCRIPTION,
                    ActionSchema::of::<EmptyInput>(),
                ),
                get_wallet_details,
            )
            .register_with_wallet(
                "native_transfer",
                ActionDeclaration::new(
                    "native_transfer",
                    NATIVE_TRANSFER_DESCRIPTION,
                    ActionSchema::of::<NativeTransferInput>(),
                ),
                native_transfer,
            );

        Self { registry }
    }
}

impl Default for WalletActionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionProvider for WalletActionProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn registry(&self) -> Option<&ActionRegistry> {
        Some(&self.registry)
    }

    /// Wallet actions work on every network.
    fn supports_network(&self, _network: &Network) -> bool {
        true
    }
}

async fn get_wallet_details(wallet: Arc<dyn WalletProvider>, input: Value) -> Result<String> {
    let _: EmptyInput = serde_json::from_value(input)?;

    let balance = match wallet.balance().await {
        Ok(balance) => balance,
        Err(err) => return Ok(format!("Error getting wallet details: {err}")),
    };
    let network = wallet.network();
    let asset = NativeAsset::for_network(&network);

    Ok(format!(
        "Wallet Details:
- Provider: {}
- Address: {}
- Network:
  * Protocol Family: {}
  * Network ID: {}
  * Chain ID: {}
- {} Balance: {} {}
- Native Balance: {} {}",
        wallet.name(),
        wallet.address(),
        network.protocol_family,
        network.network_id.as_deref().unwrap_or("N/A"),
        network.chain_id.as_deref().unwrap_or("N/A"),
        asset.symbol,
        format_units(balance, asset.decimals),
        asset.symbol,
        balance,
        asset.base_unit,
    ))
}

async fn native_transfer(wallet: Arc<dyn WalletProvider>, input: Value) -> Result<String> {
    let input: NativeTransferInput = serde_json::from_value(input)?;
    let symbol = NativeAsset::for_network(&wallet.network()).symbol;

    match wallet.native_transfer(&input.to, &input.value).await {
        Ok(tx) => Ok(format!(
            "Transferred {} {} to {}.\nTransaction hash: {}",
            input.value, symbol, input.to, tx
        )),
        Err(err) => Ok(format!("Error transferring the asset: {err}")),
    }
}

/// Display parameters for a network's native asset.
struct NativeAsset {
    symbol: &'static str,
    decimals: i64,
    base_unit: &'static str,
}

impl NativeAsset {
    fn for_network(network: &Network) -> Self {
        if network.is_svm() {
            Self {
                symbol: "SOL",
                decimals: 9,
                base_unit: "LAMPORTS",
            }
        } else if network.is_evm() {
            Self {
                symbol: "ETH",
                decimals: 18,
                base_unit: "WEI",
            }
        } else {
            Self {
                symbol: "NATIVE",
                decimals: 0,
                base_unit: "UNITS",
            }
        }
    }
}

/// Render `amount` base units as whole units with six decimal places.
fn format_units(amount: u128, decimals: i64) -> String {
    BigDecimal::new(BigInt::from(amount), decimals)
        .with_scale(6)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::testing::RecordingSink;
    use crate::wallet::testing::MockWallet;
    use serde_json::json;

    fn provider() -> WalletActionProvider {
        let (sink, _rx) = RecordingSink::new();
        WalletActionProvider::with_telemetry(sink)
    }

    fn find<'a>(actions: &'a [crate::Action], name: &str) -> &'a crate::Action {
        actions.iter().find(|a| a.name == name).unwrap()
    }

    #[test]
    fn test_declares_wallet_actions() {
        let provider = provider();
        let registry = provider.registry().unwrap();
        let names: Vec<_> = registry.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "WalletActionProvider_get_wallet_details",
                "WalletActionProvider_native_transfer"
            ]
        );
        assert!(registry.iter().all(|m| m.needs_wallet()));
        assert!(provider.supports_network(&Network::new("anything")));
    }

    #[tokio::test]
    async fn test_get_wallet_details() {
        let wallet: Arc<dyn WalletProvider> =
            Arc::new(MockWallet::new("So1anaAddress").with_balance(1_500_000_000));
        let actions = provider().get_actions(&wallet);

        let details = find(&actions, "WalletActionProvider_get_wallet_details")
            .invoke(json!({}))
            .await
            .unwrap();
        assert!(details.contains("- Provider: mock_wallet_provider"));
        assert!(details.contains("- Address: So1anaAddress"));
        assert!(details.contains("* Protocol Family: svm"));
        assert!(details.contains("* Network ID: solana-devnet"));
        assert!(details.contains("- SOL Balance: 1.500000 SOL"));
        assert!(details.contains("- Native Balance: 1500000000 LAMPORTS"));
    }

    #[tokio::test]
    async fn test_get_wallet_details_without_network_ids() {
        let wallet: Arc<dyn WalletProvider> =
            Arc::new(MockWallet::new("0xabc").with_network(Network::new("evm")));
        let actions = provider().get_actions(&wallet);

        let details = find(&actions, "WalletActionProvider_get_wallet_details")
            .invoke(json!({}))
            .await
            .unwrap();
        assert!(details.contains("* Network ID: N/A"));
        assert!(details.contains("* Chain ID: N/A"));
        assert!(details.contains("- ETH Balance: "));
        assert!(details.contains("- Native Balance: 0 WEI"));
    }

    #[tokio::test]
    async fn test_native_transfer() {
        let wallet: Arc<dyn WalletProvider> = Arc::new(MockWallet::new("from"));
        let actions = provider().get_actions(&wallet);
        let transfer = find(&actions, "WalletActionProvider_native_transfer");

        let result = transfer
            .invoke(json!({ "to": "dest", "value": "0.5" }))
            .await
            .unwrap();
        assert_eq!(result, "Transferred 0.5 SOL to dest.\nTransaction hash: tx-dest-0.5");

        let result = transfer
            .invoke(json!({ "to": "", "value": "0.5" }))
            .await
            .unwrap();
        assert_eq!(result, "Error transferring the asset: missing destination");
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(1_500_000_000, 9), "1.500000");
        assert_eq!(format_units(42, 0), "42.000000");
    }
}
