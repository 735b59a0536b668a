use std::fmt::{self, Debug};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use bigdecimal::{BigDecimal, ToPrimitive};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    message::{v0, VersionedMessage},
    native_token::LAMPORTS_PER_SOL,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    system_instruction,
    transaction::VersionedTransaction,
};

use crate::error::{Error, Result};
use crate::network::{Network, SolanaCluster};

/// Priority fee attached to native transfers, in micro-lamports per compute unit.
const TRANSFER_COMPUTE_UNIT_PRICE: u64 = 10_000;
const TRANSFER_COMPUTE_UNIT_LIMIT: u32 = 2_000;

/// The context object handed to actions that operate on a wallet.
///
/// Accessors are synchronous; they are read by the telemetry path and by
/// network filtering on every call.
#[async_trait]
pub trait WalletProvider: Send + Sync + Debug {
    fn address(&self) -> String;

    fn network(&self) -> Network;

    fn name(&self) -> &str;

    /// Native balance in the network's base unit (lamports, wei).
    async fn balance(&self) -> anyhow::Result<u128>;

    /// Transfer `value` whole units of the native asset to `to`, returning the transaction id.
    async fn native_transfer(&self, to: &str, value: &str) -> anyhow::Result<String>;
}

/// Wallet provider for Solana (SVM) networks.
/// allows for flexible wallet implementations, from local keypairs to remote signers.
#[async_trait]
pub trait SvmWalletProvider: WalletProvider {
    fn pubkey(&self) -> Pubkey;

    async fn sign_transaction(
        &self,
        tx: VersionedTransaction,
    ) -> anyhow::Result<VersionedTransaction>;

    async fn send_transaction(&self, tx: VersionedTransaction) -> anyhow::Result<Signature>;

    async fn wait_for_transaction_receipt(&self, signature: &Signature) -> anyhow::Result<bool>;
}

/// wallet provider backed by a local Solana Keypair.
pub struct SolanaKeypairWalletProvider {
    keypair: Arc<Keypair>,
    client: Arc<RpcClient>,
    cluster: SolanaCluster,
}

impl SolanaKeypairWalletProvider {
    pub const NAME: &'static str = "solana_keypair_wallet_provider";

    /// Build a provider for the cluster identified by `genesis_hash`.
    pub fn new(keypair: Keypair, rpc_url: impl Into<String>, genesis_hash: &str) -> Result<Self> {
        let cluster = SolanaCluster::from_genesis_hash(genesis_hash).ok_or_else(|| {
            Error::Wallet(format!("unknown network with genesis hash: {genesis_hash}"))
        })?;

        Ok(Self {
            keypair: Arc::new(keypair),
            client: Arc::new(RpcClient::new(rpc_url.into())),
            cluster,
        })
    }

    /// Connect to `rpc_url` and detect the cluster from its genesis hash.
    pub async fn from_rpc_url(rpc_url: impl Into<String>, keypair: Keypair) -> Result<Self> {
        let rpc_url = rpc_url.into();
        let client = RpcClient::new(rpc_url.clone());
        let genesis_hash = client.get_genesis_hash().await?;
        Self::new(keypair, rpc_url, &genesis_hash.to_string())
    }

    /// Decode a base58 encoded 64-byte secret key.
    pub fn parse_keypair(secret: &str) -> Result<Keypair> {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| Error::Wallet(format!("invalid base58 private key: {e}")))?;
        Keypair::from_bytes(&bytes)
            .map_err(|e| Error::Wallet(format!("invalid private key: {e}")))
    }

    pub fn url_for_cluster(cluster: SolanaCluster) -> &'static str {
        cluster.rpc_url()
    }

    pub fn cluster(&self) -> SolanaCluster {
        self.cluster
    }

    pub fn rpc_url(&self) -> String {
        self.client.url()
    }
}

impl Debug for SolanaKeypairWalletProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolanaKeypairWalletProvider")
            .field("address", &self.keypair.pubkey())
            .field("cluster", &self.cluster)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WalletProvider for SolanaKeypairWalletProvider {
    fn address(&self) -> String {
        self.keypair.pubkey().to_string()
    }

    fn network(&self) -> Network {
        self.cluster.network()
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    async fn balance(&self) -> anyhow::Result<u128> {
        let lamports = self.client.get_balance(&self.keypair.pubkey()).await?;
        Ok(u128::from(lamports))
    }

    async fn native_transfer(&self, to: &str, value: &str) -> anyhow::Result<String> {
        let to_pubkey = Pubkey::from_str(to)?;
        let lamports = sol_to_lamports(value)?;
        let payer = self.keypair.pubkey();

        let instructions = [
            ComputeBudgetInstruction::set_compute_unit_price(TRANSFER_COMPUTE_UNIT_PRICE),
            ComputeBudgetInstruction::set_compute_unit_limit(TRANSFER_COMPUTE_UNIT_LIMIT),
            system_instruction::transfer(&payer, &to_pubkey, lamports),
        ];

        let latest_blockhash = self.client.get_latest_blockhash().await?;
        let message = v0::Message::try_compile(&payer, &instructions, &[], latest_blockhash)?;
        let tx = VersionedTransaction::try_new(
            VersionedMessage::V0(message),
            &[self.keypair.as_ref()],
        )?;

        let signature = self.client.send_transaction(&tx).await?;
        Ok(signature.to_string())
    }
}

#[async_trait]
impl SvmWalletProvider for SolanaKeypairWalletProvider {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(
        &self,
        tx: VersionedTransaction,
    ) -> anyhow::Result<VersionedTransaction> {
        let signed = VersionedTransaction::try_new(tx.message, &[self.keypair.as_ref()])?;
        Ok(signed)
    }

    async fn send_transaction(&self, tx: VersionedTransaction) -> anyhow::Result<Signature> {
        Ok(self.client.send_transaction(&tx).await?)
    }

    async fn wait_for_transaction_receipt(&self, signature: &Signature) -> anyhow::Result<bool> {
        Ok(self.client.confirm_transaction(signature).await?)
    }
}

/// Convert a whole-SOL decimal string into lamports.
pub fn sol_to_lamports(value: &str) -> anyhow::Result<u64> {
    let amount = BigDecimal::from_str(value.trim())
        .map_err(|e| anyhow!("invalid amount {value:?}: {e}"))?;
    let lamports = amount * BigDecimal::from(LAMPORTS_PER_SOL);
    if !lamports.is_integer() {
        bail!("amount {value:?} has more than 9 decimal places");
    }
    let lamports = lamports
        .with_scale(0)
        .to_u64()
        .ok_or_else(|| anyhow!("amount {value:?} is out of range"))?;
    if lamports == 0 {
        bail!("transfer amount must be positive, got {value:?}");
    }
    Ok(lamports)
}
