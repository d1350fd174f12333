//! Stage errors and their kind hierarchy.
//!
//! Error kinds form an open, statically declared tree. Exception handlers are
//! registered against a kind and catch every error whose kind is that kind or
//! one of its descendants.
//!
//! ```
//! use stagehand_dispatch::error::{ACTION, ErrorKind, StageError};
//!
//! static PAYMENT: ErrorKind = ErrorKind::child("payment", &ACTION);
//! static CARD_DECLINED: ErrorKind = ErrorKind::child("card_declined", &PAYMENT);
//!
//! let error = StageError::new(&CARD_DECLINED, "card was declined");
//! let lineage: Vec<_> = error.kind().lineage().map(|k| k.name()).collect();
//!
//! assert_eq!(lineage, ["card_declined", "payment", "action", "error"]);
//! ```

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// A node in the error-kind hierarchy.
///
/// Kinds are compared by identity, so declare each one as a `static`. Two
/// kinds that share a name are still distinct.
#[derive(Debug)]
pub struct ErrorKind {
	name: &'static str,
	parent: Option<&'static ErrorKind>,
}

impl ErrorKind {
	pub const fn root(name: &'static str) -> Self {
		Self { name, parent: None }
	}

	pub const fn child(name: &'static str, parent: &'static ErrorKind) -> Self {
		Self {
			name,
			parent: Some(parent),
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn parent(&self) -> Option<&'static ErrorKind> {
		self.parent
	}

	/// This kind followed by each ancestor up to the root.
	pub fn lineage(&'static self) -> impl Iterator<Item = &'static ErrorKind> {
		std::iter::successors(Some(self), |kind| kind.parent)
	}

	/// Whether `self` is `ancestor` or descends from it.
	pub fn is_a(&'static self, ancestor: &ErrorKind) -> bool {
		self.lineage().any(|kind| std::ptr::eq(kind, ancestor))
	}
}

impl PartialEq for ErrorKind {
	fn eq(&self, other: &Self) -> bool {
		std::ptr::eq(self, other)
	}
}

impl Eq for ErrorKind {}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

/// Root of every stage error.
pub static ERROR: ErrorKind = ErrorKind::root("error");
/// The action factory could not produce an instance.
pub static INSTANTIATION: ErrorKind = ErrorKind::child("instantiation", &ERROR);
/// A resolved field could not be assigned on the action.
pub static BINDING: ErrorKind = ErrorKind::child("binding", &ERROR);
/// Raised by action code.
pub static ACTION: ErrorKind = ErrorKind::child("action", &ERROR);
/// The renderer failed.
pub static RENDER: ErrorKind = ErrorKind::child("render", &ERROR);
/// A stage ran without the context state it requires.
pub static INTERNAL: ErrorKind = ErrorKind::child("internal", &ERROR);

/// An error raised by a pipeline stage.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct StageError {
	kind: &'static ErrorKind,
	message: String,
	payload: Option<Value>,
	#[source]
	source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StageError {
	pub fn new(kind: &'static ErrorKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
			payload: None,
			source: None,
		}
	}

	pub fn action(message: impl Into<String>) -> Self {
		Self::new(&ACTION, message)
	}

	pub fn binding(message: impl Into<String>) -> Self {
		Self::new(&BINDING, message)
	}

	pub fn instantiation(message: impl Into<String>) -> Self {
		Self::new(&INSTANTIATION, message)
	}

	pub fn internal(message: impl Into<String>) -> Self {
		Self::new(&INTERNAL, message)
	}

	pub fn render(message: impl Into<String>) -> Self {
		Self::new(&RENDER, message)
	}

	/// Attaches structured data for exception handlers and renderers.
	pub fn with_payload(mut self, payload: Value) -> Self {
		self.payload = Some(payload);
		self
	}

	pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
		self.source = Some(Box::new(source));
		self
	}

	pub fn kind(&self) -> &'static ErrorKind {
		self.kind
	}

	pub fn message(&self) -> &str {
		&self.message
	}

	pub fn payload(&self) -> Option<&Value> {
		self.payload.as_ref()
	}
}
