//! # Stagehand
//!
//! Request-dispatch core for MVC-style server frameworks.
//!
//! Stagehand resolves a request path to an action, binds typed parameters
//! onto it, and runs it through an ordered pipeline of stages. It is a
//! library embedded in a surrounding server: the action scanner, renderer
//! and object construction are supplied by the host.
//!
//! ## Crates
//!
//! - [`convert`] - converter registry with hierarchical type lookup
//! - [`urls`] - action descriptors, URI patterns and the action registry
//! - [`dispatch`] - invocation context, stages and the pipeline executor
//! - [`conf`] - dispatch settings loaded from TOML (feature `conf`)
//!
//! ## Feature Flags
//!
//! - `conf` (default) - [`DispatchSettings`](conf::DispatchSettings) and
//!   [`DispatcherBuilder::settings`](boot::DispatcherBuilder::settings)
//!
//! ## Quick Example
//!
//! ```
//! use serde_json::Value;
//! use stagehand::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct ShowUser {
//!     id: Option<i64>,
//! }
//!
//! #[async_trait]
//! impl Action for ShowUser {
//!     fn fields(&self) -> Vec<FieldSpec> {
//!         vec![FieldSpec::of::<i64>("id")]
//!     }
//!
//!     fn set_field(&mut self, name: &str, value: Value) -> Result<(), StageError> {
//!         match name {
//!             "id" => self.id = value.as_i64(),
//!             _ => return Err(StageError::binding(format!("unknown field {}", name))),
//!         }
//!         Ok(())
//!     }
//!
//!     async fn execute(&mut self, _request: &ActionRequest) -> Result<String, StageError> {
//!         Ok("success".to_string())
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let dispatcher = Dispatcher::builder()
//!     .scan_entry(ScanEntry::new("ShowUser", "/user").with_pattern("{id}"))
//!     .action_factory(Arc::new(ActionCatalog::new().with_action("ShowUser", ShowUser::default)))
//!     .build()
//!     .unwrap();
//!
//! let outcome = dispatcher.dispatch(ActionRequest::get("/user/42")).await;
//! assert_eq!(outcome.state, PipelineState::Completed);
//! assert_eq!(outcome.result_code.as_deref(), Some("success"));
//!
//! let missing = dispatcher.dispatch(ActionRequest::get("/nowhere")).await;
//! assert_eq!(missing.result_code.as_deref(), Some("not_found"));
//! # }
//! ```

pub mod boot;

pub use stagehand_convert as convert;
pub use stagehand_dispatch as dispatch;
pub use stagehand_urls as urls;

#[cfg(feature = "conf")]
pub use stagehand_conf as conf;

pub use boot::{BootError, DispatchOptions, Dispatcher, DispatcherBuilder};
pub use tokio_util::sync::CancellationToken;

/// Common imports for hosts embedding the dispatch core
pub mod prelude {
	pub use crate::boot::{BootError, DispatchOptions, Dispatcher, DispatcherBuilder};
	pub use crate::convert::{Converter, ConverterRegistry, FieldSpec, ScalarKind, TypeKey, Typed};
	pub use crate::dispatch::{
		Action, ActionCatalog, ActionFactory, ActionRequest, ExceptionHandler, InvocationContext,
		Next, Outcome, PipelineState, Renderer, ResultCode, Stage, StageError, ValidationErrors,
	};
	pub use crate::urls::{ActionDescriptor, HandlerType, ScanEntry, UriParameters};

	#[cfg(feature = "conf")]
	pub use crate::conf::DispatchSettings;

	pub use async_trait::async_trait;
	pub use tokio_util::sync::CancellationToken;
}
