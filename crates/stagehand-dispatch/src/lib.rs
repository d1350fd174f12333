//! # Stagehand Dispatch
//!
//! Runs one request through an ordered list of [`Stage`]s.
//!
//! Each request gets a fresh [`InvocationContext`]. Stages mutate it and
//! either continue the chain through [`Next`] or return early to
//! short-circuit. Stage errors never escape the [`Pipeline`]: they are
//! matched against an [`ExceptionHandlerMap`] by [`ErrorKind`] lineage, and
//! unmatched errors end the request with the configured failure result.
//!
//! ## Example
//!
//! ```
//! use async_trait::async_trait;
//! use stagehand_dispatch::{
//!     ActionRequest, InvocationContext, Next, Pipeline, PipelineState, Stage, StageError,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! struct Maintenance;
//!
//! #[async_trait]
//! impl Stage for Maintenance {
//!     fn name(&self) -> &str {
//!         "maintenance"
//!     }
//!
//!     async fn run(&self, ctx: &mut InvocationContext, _next: Next<'_>) -> Result<(), StageError> {
//!         ctx.set_result_code("maintenance");
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let pipeline = Pipeline::builder().stage(Maintenance).build();
//! let outcome = pipeline
//!     .execute(ActionRequest::get("/"), &CancellationToken::new())
//!     .await;
//!
//! assert_eq!(outcome.state, PipelineState::ShortCircuited);
//! assert_eq!(outcome.result_code.as_deref(), Some("maintenance"));
//! # }
//! ```

pub mod action;
pub mod context;
pub mod error;
pub mod exception;
pub mod pipeline;
pub mod render;
pub mod request;
pub mod stage;
pub mod stages;

pub use action::{Action, ActionCatalog, ActionFactory};
pub use context::{InvocationContext, Resolution, ValidationErrors};
pub use error::{ErrorKind, StageError};
pub use exception::{ExceptionHandler, ExceptionHandlerMap, ResultCode};
pub use pipeline::{DEFAULT_FAILURE_RESULT, Outcome, Pipeline, PipelineBuilder, PipelineState};
pub use render::Renderer;
pub use request::ActionRequest;
pub use stage::{Next, Stage};
pub use stages::{
	BindParametersStage, DEFAULT_INPUT_RESULT, DEFAULT_NOT_FOUND_RESULT, InstantiateActionStage,
	InvokeActionStage, NotFoundStage, RenderResultStage, ResolveActionStage, ValidateStage,
};

/// Result type for stage code
pub type Result<T> = std::result::Result<T, StageError>;
