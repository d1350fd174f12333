//! Actions and the factory that creates them.

use crate::context::ValidationErrors;
use crate::error::StageError;
use crate::request::ActionRequest;
use async_trait::async_trait;
use serde_json::Value;
use stagehand_convert::FieldSpec;
use stagehand_urls::HandlerType;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Request-handling logic resolved and invoked by the pipeline.
///
/// One instance is created per request, so implementations may keep bound
/// field values in plain struct fields.
#[async_trait]
pub trait Action: Send + Sync {
	/// Fields the binder should populate, with their declared types.
	fn fields(&self) -> Vec<FieldSpec> {
		Vec::new()
	}

	/// Assigns a converted value. Called once per bound field.
	fn set_field(&mut self, name: &str, _value: Value) -> Result<(), StageError> {
		Err(StageError::binding(format!("Unknown field '{}'", name)))
	}

	/// Adds validation messages after binding. Any message short-circuits
	/// the pipeline with the input result code.
	fn validate(&self, _errors: &mut ValidationErrors) {}

	/// Runs the action and returns its result code.
	async fn execute(&mut self, request: &ActionRequest) -> Result<String, StageError>;

	/// State exposed to renderers.
	fn model(&self) -> Value {
		Value::Null
	}
}

/// Creates action instances for a handler type.
pub trait ActionFactory: Send + Sync {
	fn create(&self, handler_type: &HandlerType) -> Result<Box<dyn Action>, StageError>;
}

type Constructor = Arc<dyn Fn() -> Box<dyn Action> + Send + Sync>;

/// In-memory [`ActionFactory`] keyed by handler type.
///
/// ```
/// use async_trait::async_trait;
/// use stagehand_dispatch::{Action, ActionCatalog, ActionFactory, ActionRequest, StageError};
/// use stagehand_urls::HandlerType;
///
/// struct Ping;
///
/// #[async_trait]
/// impl Action for Ping {
///     async fn execute(&mut self, _request: &ActionRequest) -> Result<String, StageError> {
///         Ok("pong".to_string())
///     }
/// }
///
/// let catalog = ActionCatalog::new().with_action("Ping", || Ping);
///
/// assert!(catalog.create(&HandlerType::from_static("Ping")).is_ok());
/// assert!(catalog.create(&HandlerType::from_static("Pong")).is_err());
/// ```
#[derive(Default, Clone)]
pub struct ActionCatalog {
	constructors: HashMap<HandlerType, Constructor>,
}

impl ActionCatalog {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register<A, F>(&mut self, handler_type: impl Into<HandlerType>, constructor: F)
	where
		A: Action + 'static,
		F: Fn() -> A + Send + Sync + 'static,
	{
		let constructor: Constructor = Arc::new(move || Box::new(constructor()) as Box<dyn Action>);
		self.constructors.insert(handler_type.into(), constructor);
	}

	pub fn with_action<A, F>(mut self, handler_type: impl Into<HandlerType>, constructor: F) -> Self
	where
		A: Action + 'static,
		F: Fn() -> A + Send + Sync + 'static,
	{
		self.register(handler_type, constructor);
		self
	}

	pub fn contains(&self, handler_type: &HandlerType) -> bool {
		self.constructors.contains_key(handler_type)
	}

	pub fn len(&self) -> usize {
		self.constructors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.constructors.is_empty()
	}
}

impl ActionFactory for ActionCatalog {
	fn create(&self, handler_type: &HandlerType) -> Result<Box<dyn Action>, StageError> {
		self.constructors
			.get(handler_type)
			.map(|constructor| constructor())
			.ok_or_else(|| {
				StageError::instantiation(format!("No action registered for '{}'", handler_type))
			})
	}
}

impl fmt::Debug for ActionCatalog {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<_> = self.constructors.keys().map(HandlerType::as_str).collect();
		names.sort_unstable();
		f.debug_struct("ActionCatalog")
			.field("actions", &names)
			.finish()
	}
}
