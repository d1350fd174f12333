//! Boot-time assembly of the dispatch core.
//!
//! [`DispatcherBuilder`] collects scan results, converter bindings and the
//! external collaborators, then freezes them into a [`Dispatcher`]. Every
//! boot-fatal condition surfaces from [`DispatcherBuilder::build`] as a
//! [`BootError`], so a server that fails to build its dispatcher never
//! accepts a request.

use stagehand_convert::{ConverterRegistry, ConverterRegistryBuilder};
use stagehand_dispatch::{
	ActionFactory, ActionRequest, BindParametersStage, DEFAULT_FAILURE_RESULT, DEFAULT_INPUT_RESULT,
	DEFAULT_NOT_FOUND_RESULT, ErrorKind, ExceptionHandler, ExceptionHandlerMap,
	InstantiateActionStage, InvokeActionStage, NotFoundStage, Outcome, Pipeline, RenderResultStage,
	Renderer, ResolveActionStage, Stage, ValidateStage,
};
use stagehand_urls::{ActionRegistry, PatternLimits, RouteError, ScanEntry};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "conf")]
use stagehand_conf::{DispatchSettings, SettingsError};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum BootError {
	/// Duplicate route, malformed pattern or invalid base path
	#[error("Route registration failed: {0}")]
	Route(#[from] RouteError),

	#[cfg(feature = "conf")]
	#[error("Invalid dispatch settings: {0}")]
	Settings(#[from] SettingsError),

	#[error("No action factory configured")]
	MissingFactory,
}

/// Result codes and limits used to assemble the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
	pub not_found_result: String,
	pub failure_result: String,
	pub input_result: String,
	pub render_on_short_circuit: bool,
	pub pattern_limits: PatternLimits,
}

impl Default for DispatchOptions {
	fn default() -> Self {
		Self {
			not_found_result: DEFAULT_NOT_FOUND_RESULT.to_string(),
			failure_result: DEFAULT_FAILURE_RESULT.to_string(),
			input_result: DEFAULT_INPUT_RESULT.to_string(),
			render_on_short_circuit: true,
			pattern_limits: PatternLimits::default(),
		}
	}
}

#[cfg(feature = "conf")]
impl From<&DispatchSettings> for DispatchOptions {
	fn from(settings: &DispatchSettings) -> Self {
		Self {
			not_found_result: settings.not_found_result.clone(),
			failure_result: settings.failure_result.clone(),
			input_result: settings.input_result.clone(),
			render_on_short_circuit: settings.render_on_short_circuit,
			pattern_limits: PatternLimits::new(
				settings.patterns.max_length,
				settings.patterns.max_segments,
			),
		}
	}
}

/// Collects everything the dispatcher needs during boot.
pub struct DispatcherBuilder {
	options: DispatchOptions,
	#[cfg(feature = "conf")]
	settings: Option<DispatchSettings>,
	entries: Vec<ScanEntry>,
	converters: ConverterRegistryBuilder,
	factory: Option<Arc<dyn ActionFactory>>,
	renderer: Option<Arc<dyn Renderer>>,
	handlers: ExceptionHandlerMap,
	interceptors: Vec<Arc<dyn Stage>>,
	missing_stage: Option<Arc<dyn Stage>>,
}

impl DispatcherBuilder {
	/// Starts with default options and the built-in converters.
	pub fn new() -> Self {
		Self {
			options: DispatchOptions::default(),
			#[cfg(feature = "conf")]
			settings: None,
			entries: Vec::new(),
			converters: ConverterRegistryBuilder::with_defaults(),
			factory: None,
			renderer: None,
			handlers: ExceptionHandlerMap::new(),
			interceptors: Vec::new(),
			missing_stage: None,
		}
	}

	pub fn options(mut self, options: DispatchOptions) -> Self {
		self.options = options;
		self
	}

	/// Uses loaded settings. They are validated again by [`build`](Self::build).
	#[cfg(feature = "conf")]
	pub fn settings(mut self, settings: DispatchSettings) -> Self {
		self.options = DispatchOptions::from(&settings);
		self.settings = Some(settings);
		self
	}

	pub fn scan_entry(mut self, entry: ScanEntry) -> Self {
		self.entries.push(entry);
		self
	}

	pub fn scan_entries(mut self, entries: impl IntoIterator<Item = ScanEntry>) -> Self {
		self.entries.extend(entries);
		self
	}

	/// Adjusts the converter registry before it is frozen.
	///
	/// ```
	/// use std::sync::Arc;
	/// use stagehand::boot::DispatcherBuilder;
	/// use stagehand::convert::{StringConverter, TypeKey};
	///
	/// let builder = DispatcherBuilder::new().converters(|registry| {
	///     registry
	///         .declare_class(TypeKey::named("Email"), None, Vec::new())
	///         .register(TypeKey::named("Email"), Arc::new(StringConverter))
	/// });
	/// # let _ = builder;
	/// ```
	pub fn converters(
		mut self,
		configure: impl FnOnce(ConverterRegistryBuilder) -> ConverterRegistryBuilder,
	) -> Self {
		self.converters = configure(self.converters);
		self
	}

	pub fn action_factory(mut self, factory: Arc<dyn ActionFactory>) -> Self {
		self.factory = Some(factory);
		self
	}

	/// Renderer used as the last stage and after short-circuits.
	pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
		self.renderer = Some(renderer);
		self
	}

	pub fn exception_handler(
		mut self,
		kind: &'static ErrorKind,
		handler: impl ExceptionHandler + 'static,
	) -> Self {
		self.handlers.register(kind, Arc::new(handler));
		self
	}

	/// Adds a stage that runs after validation and before the action.
	pub fn interceptor(mut self, stage: impl Stage + 'static) -> Self {
		self.interceptors.push(Arc::new(stage));
		self
	}

	/// Replaces the stage that handles unresolved requests.
	pub fn missing_stage(mut self, stage: impl Stage + 'static) -> Self {
		self.missing_stage = Some(Arc::new(stage));
		self
	}

	/// Registers every scan entry and assembles the pipeline.
	///
	/// Fails on the first boot-fatal error.
	pub fn build(self) -> Result<Dispatcher, BootError> {
		#[cfg(feature = "conf")]
		if let Some(settings) = &self.settings {
			settings.validate()?;
		}

		let factory = self.factory.ok_or(BootError::MissingFactory)?;
		let options = self.options;

		let mut registry = ActionRegistry::with_limits(options.pattern_limits);
		for entry in &self.entries {
			registry.register_scan(entry)?;
		}
		let registry = Arc::new(registry);
		let converters = Arc::new(self.converters.build());

		let missing = self
			.missing_stage
			.unwrap_or_else(|| Arc::new(NotFoundStage::new(options.not_found_result.clone())));

		let mut pipeline = Pipeline::builder()
			.stage(ResolveActionStage::new(registry.clone()).with_missing_stage(missing))
			.stage(InstantiateActionStage::new(factory))
			.stage(BindParametersStage::new(converters.clone()))
			.stage(ValidateStage::new(options.input_result.clone()));
		for interceptor in self.interceptors {
			pipeline = pipeline.stage_arc(interceptor);
		}
		pipeline = pipeline.stage(InvokeActionStage);
		if let Some(renderer) = self.renderer {
			pipeline = pipeline
				.stage(RenderResultStage::new(renderer.clone()))
				.renderer(renderer);
		}
		let pipeline = pipeline
			.exception_handlers(self.handlers)
			.failure_result(options.failure_result.clone())
			.render_on_short_circuit(options.render_on_short_circuit)
			.build();

		tracing::info!(
			actions = registry.len(),
			converters = converters.len(),
			stages = ?pipeline.stage_names(),
			"Dispatcher ready"
		);

		Ok(Dispatcher {
			registry,
			converters,
			pipeline,
			options,
		})
	}
}

impl Default for DispatcherBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// The frozen dispatch core, shared by every request.
pub struct Dispatcher {
	registry: Arc<ActionRegistry>,
	converters: Arc<ConverterRegistry>,
	pipeline: Pipeline,
	options: DispatchOptions,
}

impl Dispatcher {
	pub fn builder() -> DispatcherBuilder {
		DispatcherBuilder::new()
	}

	/// Dispatches a request that cannot be aborted.
	pub async fn dispatch(&self, request: ActionRequest) -> Outcome {
		self.pipeline
			.execute(request, &CancellationToken::new())
			.await
	}

	/// Dispatches a request, stopping before the next stage once `cancel`
	/// fires.
	pub async fn dispatch_with_cancel(
		&self,
		request: ActionRequest,
		cancel: &CancellationToken,
	) -> Outcome {
		self.pipeline.execute(request, cancel).await
	}

	pub fn registry(&self) -> &ActionRegistry {
		&self.registry
	}

	pub fn converters(&self) -> &ConverterRegistry {
		&self.converters
	}

	pub fn pipeline(&self) -> &Pipeline {
		&self.pipeline
	}

	pub fn options(&self) -> &DispatchOptions {
		&self.options
	}
}

impl fmt::Debug for Dispatcher {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Dispatcher")
			.field("actions", &self.registry.len())
			.field("converters", &self.converters.len())
			.field("pipeline", &self.pipeline)
			.field("options", &self.options)
			.finish()
	}
}
