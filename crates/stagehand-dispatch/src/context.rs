//! Per-request invocation context.

use crate::action::Action;
use crate::pipeline::PipelineState;
use crate::request::ActionRequest;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use stagehand_urls::{ActionDescriptor, RouteMatch, UriParameters};
use std::fmt;
use std::sync::Arc;

/// Outcome of action resolution for the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Resolution {
	/// Resolution has not run yet.
	#[default]
	Pending,
	Resolved(Arc<ActionDescriptor>),
	/// No descriptor matched the request path.
	Missing,
}

/// Field-level binding and validation messages in the order they were
/// reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
	fields: IndexMap<String, Vec<String>>,
}

impl ValidationErrors {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
		self.fields
			.entry(field.into())
			.or_default()
			.push(message.into());
	}

	pub fn get(&self, field: &str) -> &[String] {
		self.fields
			.get(field)
			.map(Vec::as_slice)
			.unwrap_or_default()
	}

	pub fn contains(&self, field: &str) -> bool {
		self.fields.contains_key(field)
	}

	pub fn fields(&self) -> impl Iterator<Item = &str> {
		self.fields.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.fields
			.iter()
			.map(|(field, messages)| (field.as_str(), messages.as_slice()))
	}

	/// Number of fields with at least one message.
	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	/// JSON object of field → messages, for renderers.
	pub fn to_json(&self) -> Value {
		let map: Map<String, Value> = self
			.fields
			.iter()
			.map(|(field, messages)| {
				let messages = messages.iter().cloned().map(Value::String).collect();
				(field.clone(), Value::Array(messages))
			})
			.collect();
		Value::Object(map)
	}
}

/// Chain bookkeeping written by the continuation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ChainProgress {
	pub(crate) completed: bool,
	pub(crate) cancelled: bool,
}

/// Mutable state of one request as it moves through the pipeline.
///
/// A context is created when the request enters the pipeline and is
/// exclusively owned by that request until it is dropped.
pub struct InvocationContext {
	request: ActionRequest,
	resolution: Resolution,
	action: Option<Box<dyn Action>>,
	uri_parameters: UriParameters,
	result_code: Option<String>,
	validation_errors: ValidationErrors,
	rendered: bool,
	state: PipelineState,
	pub(crate) progress: ChainProgress,
}

impl InvocationContext {
	pub fn new(request: ActionRequest) -> Self {
		Self {
			request,
			resolution: Resolution::Pending,
			action: None,
			uri_parameters: UriParameters::new(),
			result_code: None,
			validation_errors: ValidationErrors::new(),
			rendered: false,
			state: PipelineState::Pending,
			progress: ChainProgress::default(),
		}
	}

	pub fn request(&self) -> &ActionRequest {
		&self.request
	}

	pub fn resolution(&self) -> &Resolution {
		&self.resolution
	}

	/// The resolved descriptor, if resolution found one.
	pub fn descriptor(&self) -> Option<&Arc<ActionDescriptor>> {
		match &self.resolution {
			Resolution::Resolved(descriptor) => Some(descriptor),
			_ => None,
		}
	}

	pub fn is_missing(&self) -> bool {
		self.resolution == Resolution::Missing
	}

	/// Records a successful route match.
	pub fn resolve(&mut self, route: RouteMatch) {
		self.resolution = Resolution::Resolved(route.descriptor);
		self.uri_parameters = route.uri_parameters;
	}

	pub fn mark_missing(&mut self) {
		self.resolution = Resolution::Missing;
		self.uri_parameters = UriParameters::new();
	}

	pub fn action(&self) -> Option<&dyn Action> {
		self.action.as_deref()
	}

	pub fn action_mut(&mut self) -> Option<&mut (dyn Action + 'static)> {
		self.action.as_deref_mut()
	}

	pub fn set_action(&mut self, action: Box<dyn Action>) {
		self.action = Some(action);
	}

	pub fn uri_parameters(&self) -> &UriParameters {
		&self.uri_parameters
	}

	pub fn result_code(&self) -> Option<&str> {
		self.result_code.as_deref()
	}

	pub fn set_result_code(&mut self, code: impl Into<String>) {
		self.result_code = Some(code.into());
	}

	pub fn validation_errors(&self) -> &ValidationErrors {
		&self.validation_errors
	}

	pub fn validation_errors_mut(&mut self) -> &mut ValidationErrors {
		&mut self.validation_errors
	}

	pub fn is_rendered(&self) -> bool {
		self.rendered
	}

	pub fn mark_rendered(&mut self) {
		self.rendered = true;
	}

	/// Current pipeline state. Stages always observe
	/// [`PipelineState::Running`].
	pub fn state(&self) -> PipelineState {
		self.state
	}

	pub(crate) fn set_state(&mut self, state: PipelineState) {
		self.state = state;
	}

	/// Split borrow used by stages that run the action against the request.
	pub(crate) fn action_with_request(&mut self) -> (Option<&mut (dyn Action + 'static)>, &ActionRequest) {
		(self.action.as_deref_mut(), &self.request)
	}

	/// Split borrow used by validation.
	pub(crate) fn action_with_errors(&mut self) -> (Option<&(dyn Action + 'static)>, &mut ValidationErrors) {
		(self.action.as_deref(), &mut self.validation_errors)
	}
}

impl fmt::Debug for InvocationContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InvocationContext")
			.field("request", &self.request)
			.field("resolution", &self.resolution)
			.field("has_action", &self.action.is_some())
			.field("uri_parameters", &self.uri_parameters)
			.field("result_code", &self.result_code)
			.field("validation_errors", &self.validation_errors)
			.field("rendered", &self.rendered)
			.field("state", &self.state)
			.finish()
	}
}
