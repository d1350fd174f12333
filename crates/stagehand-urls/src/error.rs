//! Errors raised while building the action registry.

use crate::descriptor::HandlerType;
use crate::pattern::PatternError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
	/// A second action claimed a base path held by a non-overridable action.
	#[error(
		"Duplicate base path '{base_path}': '{rejected}' conflicts with non-overridable '{existing}'"
	)]
	Duplicate {
		base_path: String,
		existing: HandlerType,
		rejected: HandlerType,
	},

	#[error("Invalid base path '{0}': must start with '/'")]
	InvalidBasePath(String),

	#[error("Malformed URI parameter pattern for '{handler_type}': {source}")]
	MalformedPattern {
		handler_type: HandlerType,
		#[source]
		source: PatternError,
	},
}
