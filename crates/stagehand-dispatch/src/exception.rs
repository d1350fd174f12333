//! Error kind → exception handler table.

use crate::context::InvocationContext;
use crate::error::{ErrorKind, StageError};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Turns a stage error into a result code.
///
/// Called by the executor with the failing request's context. The returned
/// code replaces the context's result code before rendering.
#[async_trait]
pub trait ExceptionHandler: Send + Sync {
	async fn handle(&self, ctx: &mut InvocationContext, error: &StageError) -> String;
}

#[async_trait]
impl<F> ExceptionHandler for F
where
	F: Fn(&mut InvocationContext, &StageError) -> String + Send + Sync,
{
	async fn handle(&self, ctx: &mut InvocationContext, error: &StageError) -> String {
		self(ctx, error)
	}
}

/// Handler that always answers with the same result code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCode(pub String);

impl ResultCode {
	pub fn new(code: impl Into<String>) -> Self {
		Self(code.into())
	}
}

#[async_trait]
impl ExceptionHandler for ResultCode {
	async fn handle(&self, _ctx: &mut InvocationContext, _error: &StageError) -> String {
		self.0.clone()
	}
}

/// Handlers keyed by error kind.
///
/// Lookup walks the error's kind lineage and returns the handler registered
/// for the most specific kind. Kinds are matched by identity, not by name.
#[derive(Clone, Default)]
pub struct ExceptionHandlerMap {
	handlers: Vec<(&'static ErrorKind, Arc<dyn ExceptionHandler>)>,
}

impl ExceptionHandlerMap {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `handler` for `kind` and its descendants, replacing any
	/// handler previously registered for exactly `kind`.
	pub fn register(&mut self, kind: &'static ErrorKind, handler: Arc<dyn ExceptionHandler>) {
		match self
			.handlers
			.iter_mut()
			.find(|(registered, _)| *registered == kind)
		{
			Some(slot) => {
				slot.1 = handler;
				tracing::debug!(kind = kind.name(), "Replaced exception handler");
			}
			None => self.handlers.push((kind, handler)),
		}
	}

	/// Finds the handler for `kind`, falling back to the nearest registered
	/// ancestor. Returns the kind the handler was registered for.
	pub fn find(
		&self,
		kind: &'static ErrorKind,
	) -> Option<(&'static ErrorKind, &Arc<dyn ExceptionHandler>)> {
		kind.lineage().find_map(|candidate| {
			self.handlers
				.iter()
				.find(|(registered, _)| *registered == candidate)
				.map(|(registered, handler)| (*registered, handler))
		})
	}

	/// Registered kind names, sorted.
	pub fn kinds(&self) -> Vec<&'static str> {
		let mut kinds: Vec<_> = self.handlers.iter().map(|(kind, _)| kind.name()).collect();
		kinds.sort_unstable();
		kinds
	}

	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}
}

impl fmt::Debug for ExceptionHandlerMap {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ExceptionHandlerMap")
			.field("kinds", &self.kinds())
			.finish()
	}
}
