//! Action providers and the binding of their registries to a wallet.

use std::sync::Arc;

use crate::actions::{Action, ActionRegistry};
use crate::network::Network;
use crate::wallet::WalletProvider;

/// A namespace of actions, optionally composing other providers.
///
/// Handlers declared in [`ActionProvider::registry`] capture the state of the
/// provider that declared them, so composed children always run against their
/// own instance.
pub trait ActionProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Declared actions; `None` for a provider that declares nothing itself.
    fn registry(&self) -> Option<&ActionRegistry>;

    /// Directly composed providers.
    fn action_providers(&self) -> &[Arc<dyn ActionProvider>] {
        &[]
    }

    /// Whether this provider can operate on `network`. Not consulted for children.
    fn supports_network(&self, network: &Network) -> bool;

    /// Actions of this provider and its direct children, bound to `wallet`.
    ///
    /// Children of children are not flattened. A provider without actions is
    /// logged and skipped.
    fn get_actions(&self, wallet: &Arc<dyn WalletProvider>) -> Vec<Action> {
        let mut actions = Vec::new();
        collect_actions(self.name(), self.registry(), wallet, &mut actions);
        for child in self.action_providers() {
            collect_actions(child.name(), child.registry(), wallet, &mut actions);
        }
        actions
    }
}

fn collect_actions(
    provider: &str,
    registry: Option<&ActionRegistry>,
    wallet: &Arc<dyn WalletProvider>,
    actions: &mut Vec<Action>,
) {
    match registry {
        Some(registry) if !registry.is_empty() => {
            actions.extend(registry.iter().map(|metadata| metadata.bind(wallet)));
        }
        _ => tracing::warn!(provider, "action provider has no actions, skipping"),
    }
}
