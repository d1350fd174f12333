//! The workflow pipeline executor.
//!
//! ```text
//! PENDING ──▶ RUNNING ──▶ COMPLETED        every stage continued
//!                    ├──▶ SHORT_CIRCUITED  a stage returned without `next`,
//!                    │                     or a handler caught its error
//!                    ├──▶ FAILED           error with no registered handler,
//!                    │                     or a stage panicked
//!                    └──▶ CANCELLED        aborted before a stage started
//! ```

use crate::context::InvocationContext;
use crate::error::ErrorKind;
use crate::exception::{ExceptionHandler, ExceptionHandlerMap};
use crate::render::Renderer;
use crate::request::ActionRequest;
use crate::stage::{Next, Stage};
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Result code used when a stage error has no registered handler.
pub const DEFAULT_FAILURE_RESULT: &str = "error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
	Pending,
	Running,
	Completed,
	ShortCircuited,
	Failed,
	Cancelled,
}

impl PipelineState {
	pub fn is_terminal(self) -> bool {
		!matches!(self, PipelineState::Pending | PipelineState::Running)
	}
}

impl fmt::Display for PipelineState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			PipelineState::Pending => "pending",
			PipelineState::Running => "running",
			PipelineState::Completed => "completed",
			PipelineState::ShortCircuited => "short_circuited",
			PipelineState::Failed => "failed",
			PipelineState::Cancelled => "cancelled",
		};
		f.write_str(name)
	}
}

/// What happened to one request.
#[derive(Debug)]
pub struct Outcome {
	pub state: PipelineState,
	pub result_code: Option<String>,
	/// The finished context. `None` when the request was cancelled.
	pub context: Option<InvocationContext>,
}

/// An ordered, immutable list of stages plus the error handling around them.
pub struct Pipeline {
	stages: Vec<Arc<dyn Stage>>,
	handlers: ExceptionHandlerMap,
	renderer: Option<Arc<dyn Renderer>>,
	failure_result: String,
	render_on_short_circuit: bool,
}

impl Pipeline {
	pub fn builder() -> PipelineBuilder {
		PipelineBuilder::new()
	}

	/// Runs every stage against a fresh context for `request`.
	pub async fn execute(&self, request: ActionRequest, cancel: &CancellationToken) -> Outcome {
		self.run_context(InvocationContext::new(request), cancel)
			.await
	}

	/// Runs every stage against an existing context.
	pub async fn run_context(
		&self,
		mut ctx: InvocationContext,
		cancel: &CancellationToken,
	) -> Outcome {
		ctx.set_state(PipelineState::Running);
		tracing::debug!(
			path = %ctx.request().path(),
			method = %ctx.request().method(),
			"Dispatching request"
		);

		let caught = AssertUnwindSafe(Next::new(&self.stages, cancel).run(&mut ctx))
			.catch_unwind()
			.await;
		let result = match caught {
			Ok(result) => result,
			Err(panic) => {
				tracing::error!(
					path = %ctx.request().path(),
					panic = panic_message(panic.as_ref()),
					"Stage panicked"
				);
				ctx.set_result_code(self.failure_result.clone());
				ctx.set_state(PipelineState::Failed);
				return Outcome {
					state: PipelineState::Failed,
					result_code: ctx.result_code().map(str::to_string),
					context: Some(ctx),
				};
			}
		};

		if ctx.progress.cancelled {
			tracing::debug!(path = %ctx.request().path(), "Releasing cancelled request");
			return Outcome {
				state: PipelineState::Cancelled,
				result_code: None,
				context: None,
			};
		}

		let state = match result {
			Ok(()) if ctx.progress.completed => PipelineState::Completed,
			Ok(()) => {
				tracing::debug!(
					path = %ctx.request().path(),
					result_code = ?ctx.result_code(),
					"Pipeline short-circuited"
				);
				self.render_after_short_circuit(&mut ctx).await
			}
			Err(error) => match self.handlers.find(error.kind()) {
				Some((kind, handler)) => {
					tracing::warn!(
						path = %ctx.request().path(),
						kind = kind.name(),
						error = %error,
						"Stage error handled"
					);
					let code = handler.handle(&mut ctx, &error).await;
					ctx.set_result_code(code);
					self.render_after_short_circuit(&mut ctx).await
				}
				None => {
					tracing::error!(
						path = %ctx.request().path(),
						error = %error,
						"Unhandled stage error"
					);
					ctx.set_result_code(self.failure_result.clone());
					PipelineState::Failed
				}
			},
		};

		ctx.set_state(state);
		Outcome {
			state,
			result_code: ctx.result_code().map(str::to_string),
			context: Some(ctx),
		}
	}

	/// Stage names in execution order.
	pub fn stage_names(&self) -> Vec<&str> {
		self.stages.iter().map(|stage| stage.name()).collect()
	}

	pub fn exception_handlers(&self) -> &ExceptionHandlerMap {
		&self.handlers
	}

	pub fn failure_result(&self) -> &str {
		&self.failure_result
	}

	async fn render_after_short_circuit(&self, ctx: &mut InvocationContext) -> PipelineState {
		let Some(renderer) = &self.renderer else {
			return PipelineState::ShortCircuited;
		};
		if !self.render_on_short_circuit || ctx.is_rendered() {
			return PipelineState::ShortCircuited;
		}

		match renderer.render(ctx).await {
			Ok(()) => {
				ctx.mark_rendered();
				PipelineState::ShortCircuited
			}
			Err(error) => {
				tracing::error!(
					path = %ctx.request().path(),
					error = %error,
					"Rendering after short-circuit failed"
				);
				ctx.set_result_code(self.failure_result.clone());
				PipelineState::Failed
			}
		}
	}
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
	if let Some(message) = panic.downcast_ref::<&str>() {
		message
	} else if let Some(message) = panic.downcast_ref::<String>() {
		message
	} else {
		"non-string panic payload"
	}
}

impl fmt::Debug for Pipeline {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Pipeline")
			.field("stages", &self.stage_names())
			.field("handlers", &self.handlers)
			.field("has_renderer", &self.renderer.is_some())
			.field("failure_result", &self.failure_result)
			.field("render_on_short_circuit", &self.render_on_short_circuit)
			.finish()
	}
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
	stages: Vec<Arc<dyn Stage>>,
	handlers: ExceptionHandlerMap,
	renderer: Option<Arc<dyn Renderer>>,
	failure_result: String,
	render_on_short_circuit: bool,
}

impl PipelineBuilder {
	pub fn new() -> Self {
		Self {
			stages: Vec::new(),
			handlers: ExceptionHandlerMap::new(),
			renderer: None,
			failure_result: DEFAULT_FAILURE_RESULT.to_string(),
			render_on_short_circuit: true,
		}
	}

	/// Appends a stage.
	pub fn stage(self, stage: impl Stage + 'static) -> Self {
		self.stage_arc(Arc::new(stage))
	}

	pub fn stage_arc(mut self, stage: Arc<dyn Stage>) -> Self {
		self.stages.push(stage);
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

	pub fn exception_handlers(mut self, handlers: ExceptionHandlerMap) -> Self {
		self.handlers = handlers;
		self
	}

	/// Renderer used after a short-circuit or a handled error.
	pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
		self.renderer = Some(renderer);
		self
	}

	pub fn failure_result(mut self, code: impl Into<String>) -> Self {
		self.failure_result = code.into();
		self
	}

	pub fn render_on_short_circuit(mut self, enabled: bool) -> Self {
		self.render_on_short_circuit = enabled;
		self
	}

	pub fn build(self) -> Pipeline {
		tracing::debug!(stages = self.stages.len(), handlers = self.handlers.len(), "Built pipeline");
		Pipeline {
			stages: self.stages,
			handlers: self.handlers,
			renderer: self.renderer,
			failure_result: self.failure_result,
			render_on_short_circuit: self.render_on_short_circuit,
		}
	}
}

impl Default for PipelineBuilder {
	fn default() -> Self {
		Self::new()
	}
}
