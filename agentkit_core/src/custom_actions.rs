//! Providers assembled from plain action definitions at runtime.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::actions::{
    ActionDeclaration, ActionFuture, ActionInvoker, ActionRegistry, StandaloneHandler,
    WalletHandler,
};
use crate::error::Result;
use crate::network::Network;
use crate::provider::ActionProvider;
use crate::schema::ActionSchema;
use crate::telemetry::TelemetrySink;
use crate::wallet::WalletProvider;

/// One action supplied as data.
#[derive(Debug, Clone)]
pub struct CustomActionDefinition {
    pub name: String,
    pub description: String,
    pub schema: ActionSchema,
    invoke: ActionInvoker,
}

impl CustomActionDefinition {
    /// Action whose function takes only the validated input.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ActionSchema,
        invoke: F,
    ) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let handler: StandaloneHandler =
            Arc::new(move |input: Value| -> ActionFuture { Box::pin(invoke(input)) });
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            invoke: ActionInvoker::Standalone(handler),
        }
    }

    /// Action whose function takes the wallet provider, then the validated input.
    pub fn with_wallet<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ActionSchema,
        invoke: F,
    ) -> Self
    where
        F: Fn(Arc<dyn WalletProvider>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let handler: WalletHandler = Arc::new(
            move |wallet: Arc<dyn WalletProvider>, input: Value| -> ActionFuture {
                Box::pin(invoke(wallet, input))
            },
        );
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            invoke: ActionInvoker::WithWallet(handler),
        }
    }

    pub fn needs_wallet(&self) -> bool {
        matches!(self.invoke, ActionInvoker::WithWallet(_))
    }
}

/// Provider whose actions come from [`CustomActionDefinition`]s.
///
/// Unlike statically declared actions, these validate their own input against
/// the definition's schema; a rejected input fails with
/// [`Error::InvalidInput`](crate::Error::InvalidInput).
#[derive(Debug)]
pub struct CustomActionProvider {
    registry: ActionRegistry,
}

impl CustomActionProvider {
    pub const NAME: &'static str = "custom";
    pub const OWNER: &'static str = "CustomActionProvider";

    pub fn new(actions: Vec<CustomActionDefinition>) -> Self {
        Self::build(ActionRegistry::new(Self::OWNER), actions)
    }

    pub fn with_telemetry(
        actions: Vec<CustomActionDefinition>,
        sink: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self::build(ActionRegistry::with_telemetry(Self::OWNER, sink), actions)
    }

    fn build(mut registry: ActionRegistry, actions: Vec<CustomActionDefinition>) -> Self {
        for definition in actions {
            let declaration = ActionDeclaration::new(
                definition.name.clone(),
                definition.description,
                definition.schema.clone(),
            );
            let schema = definition.schema;

            match definition.invoke {
                ActionInvoker::Standalone(invoke) => {
                    registry.register(&definition.name, declaration, move |input| {
                        validated_call(schema.clone(), Arc::clone(&invoke), input)
                    });
                }
                ActionInvoker::WithWallet(invoke) => {
                    registry.register_with_wallet(
                        &definition.name,
                        declaration,
                        move |wallet, input| {
                            let invoke = Arc::clone(&invoke);
                            validated_wallet_call(schema.clone(), invoke, wallet, input)
                        },
                    );
                }
            }
        }

        Self { registry }
    }
}

async fn validated_call(
    schema: ActionSchema,
    invoke: StandaloneHandler,
    input: Value,
) -> Result<String> {
    let parsed = schema.validate(&input)?;
    invoke(parsed).await
}

async fn validated_wallet_call(
    schema: ActionSchema,
    invoke: WalletHandler,
    wallet: Arc<dyn WalletProvider>,
    input: Value,
) -> Result<String> {
    let parsed = schema.validate(&input)?;
    invoke(wallet, parsed).await
}

impl ActionProvider for CustomActionProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn registry(&self) -> Option<&ActionRegistry> {
        Some(&self.registry)
    }

    /// Custom actions are available on every network.
    fn supports_network(&self, _network: &Network) -> bool {
        true
    }
}
