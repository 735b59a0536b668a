use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{json, Value};

use crate::error::Result;
use crate::schema::ActionSchema;
use crate::telemetry::{self, TelemetryEvent, TelemetrySink};
use crate::wallet::WalletProvider;

pub type ActionFuture = BoxFuture<'static, Result<String>>;

pub type StandaloneHandler = Arc<dyn Fn(Value) -> ActionFuture + Send + Sync>;

pub type WalletHandler = Arc<dyn Fn(Arc<dyn WalletProvider>, Value) -> ActionFuture + Send + Sync>;

/// Call shape of a declared action.
#[derive(Clone)]
pub enum ActionInvoker {
    /// Takes only the validated input.
    Standalone(StandaloneHandler),
    /// Takes the wallet provider first, then the validated input.
    WithWallet(WalletHandler),
}

impl fmt::Debug for ActionInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionInvoker::Standalone(_) => f.write_str("Standalone"),
            ActionInvoker::WithWallet(_) => f.write_str("WithWallet"),
        }
    }
}

/// What a provider states about an action when declaring it.
#[derive(Debug, Clone)]
pub struct ActionDeclaration {
    pub name: String,
    pub description: String,
    pub schema: ActionSchema,
}

impl ActionDeclaration {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ActionSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
        }
    }
}

/// A declared action as stored in its provider's registry.
#[derive(Debug, Clone)]
pub struct ActionMetadata {
    pub name: String,
    pub description: String,
    pub schema: ActionSchema,
    invoker: ActionInvoker,
}

impl ActionMetadata {
    pub fn needs_wallet(&self) -> bool {
        matches!(self.invoker, ActionInvoker::WithWallet(_))
    }

    pub fn invoker(&self) -> &ActionInvoker {
        &self.invoker
    }

    /// Bind to `wallet`. Standalone actions never see the wallet.
    pub fn bind(&self, wallet: &Arc<dyn WalletProvider>) -> Action {
        let invoke: StandaloneHandler = match &self.invoker {
            ActionInvoker::Standalone(handler) => Arc::clone(handler),
            ActionInvoker::WithWallet(handler) => {
                let handler = Arc::clone(handler);
                let wallet = Arc::clone(wallet);
                Arc::new(move |input: Value| handler(Arc::clone(&wallet), input))
            }
        };

        Action {
            name: self.name.clone(),
            description: self.description.clone(),
            schema: self.schema.clone(),
            invoke,
        }
    }
}

/// A ready-to-call action handed to the agent runtime.
#[derive(Clone)]
pub struct Action {
    pub name: String,
    pub description: String,
    pub schema: ActionSchema,
    invoke: StandaloneHandler,
}

impl Action {
    /// Run the action. `args` is expected to already satisfy `schema`.
    pub fn invoke(&self, args: Value) -> ActionFuture {
        (self.invoke)(args)
    }

    /// Function-calling definition for LLM tool schemas.
    pub fn tool_definition(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.schema.document(),
        })
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// The actions a provider declares, in declaration order.
///
/// Every declared handler is wrapped so that each call emits an
/// `agent_action_invocation` telemetry event before the handler is called.
pub struct ActionRegistry {
    owner: String,
    telemetry: Option<Arc<dyn TelemetrySink>>,
    entries: Vec<(String, ActionMetadata)>,
}

impl ActionRegistry {
    /// Registry whose events go to the process-wide sink.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            telemetry: None,
            entries: Vec::new(),
        }
    }

    pub fn with_telemetry(owner: impl Into<String>, sink: Arc<dyn TelemetrySink>) -> Self {
        Self {
            owner: owner.into(),
            telemetry: Some(sink),
            entries: Vec::new(),
        }
    }

    /// Name prefixed onto every action declared here.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Declare an action that takes only its input.
    ///
    /// # Panics
    ///
    /// If the declared name is empty or contains characters other than ASCII
    /// letters, digits, `_` and `-`.
    pub fn register<F, Fut>(
        &mut self,
        method_name: &str,
        declaration: ActionDeclaration,
        handler: F,
    ) -> &mut Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let event = self.invocation_event(method_name, &declaration);
        let sink = self.telemetry.clone();

        let invoker: StandaloneHandler = Arc::new(move |input: Value| -> ActionFuture {
            telemetry::emit(sink.as_ref(), event.clone());
            Box::pin(handler(input))
        });

        self.insert(method_name, declaration, ActionInvoker::Standalone(invoker))
    }

    /// Declare an action that takes the wallet provider and its input.
    ///
    /// # Panics
    ///
    /// Same conditions as [`ActionRegistry::register`].
    pub fn register_with_wallet<F, Fut>(
        &mut self,
        method_name: &str,
        declaration: ActionDeclaration,
        handler: F,
    ) -> &mut Self
    where
        F: Fn(Arc<dyn WalletProvider>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let event = self.invocation_event(method_name, &declaration);
        let sink = self.telemetry.clone();

        let invoker: WalletHandler = Arc::new(
            move |wallet: Arc<dyn WalletProvider>, input: Value| -> ActionFuture {
                let event = event.clone().with_wallet(wallet.as_ref());
                telemetry::emit(sink.as_ref(), event);
                Box::pin(handler(wallet, input))
            },
        );

        self.insert(method_name, declaration, ActionInvoker::WithWallet(invoker))
    }

    pub fn get(&self, method_name: &str) -> Option<&ActionMetadata> {
        self.entries
            .iter()
            .find(|(method, _)| method == method_name)
            .map(|(_, metadata)| metadata)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionMetadata> {
        self.entries.iter().map(|(_, metadata)| metadata)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn invocation_event(
        &self,
        method_name: &str,
        declaration: &ActionDeclaration,
    ) -> TelemetryEvent {
        assert!(
            is_valid_action_name(&declaration.name),
            "action {:?} declared by {}::{} must be non-empty and use only ASCII letters, digits, `_` or `-`",
            declaration.name,
            self.owner,
            method_name,
        );
        let action_name = self.prefixed(&declaration.name);
        TelemetryEvent::action_invocation(&action_name, &self.owner, method_name)
    }

    fn prefixed(&self, name: &str) -> String {
        format!("{}_{}", self.owner, name)
    }

    // Re-declaring a method replaces its entry in place.
    fn insert(
        &mut self,
        method_name: &str,
        declaration: ActionDeclaration,
        invoker: ActionInvoker,
    ) -> &mut Self {
        let metadata = ActionMetadata {
            name: self.prefixed(&declaration.name),
            description: declaration.description,
            schema: declaration.schema,
            invoker,
        };

        match self.entries.iter_mut().find(|(method, _)| method == method_name) {
            Some((_, existing)) => *existing = metadata,
            None => self.entries.push((method_name.to_string(), metadata)),
        }
        self
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("owner", &self.owner)
            .field(
                "actions",
                &self.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn is_valid_action_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
