//! Inbound request description.

use http::Method;
use std::collections::HashMap;

/// The request as seen by the dispatch core.
///
/// Raw parameters are multi-valued: a name submitted several times keeps
/// every value in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
	path: String,
	method: Method,
	raw_parameters: HashMap<String, Vec<String>>,
}

impl ActionRequest {
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			method,
			raw_parameters: HashMap::new(),
		}
	}

	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Appends one value for `name`.
	///
	/// ```
	/// use stagehand_dispatch::ActionRequest;
	///
	/// let request = ActionRequest::get("/search")
	///     .with_param("tag", "rust")
	///     .with_param("tag", "web");
	///
	/// assert_eq!(request.param("tag"), Some("rust"));
	/// assert_eq!(request.params("tag").len(), 2);
	/// ```
	pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.raw_parameters
			.entry(name.into())
			.or_default()
			.push(value.into());
		self
	}

	pub fn with_parameters(mut self, parameters: HashMap<String, Vec<String>>) -> Self {
		self.raw_parameters = parameters;
		self
	}

	pub fn path(&self) -> &str {
		&self.path
	}

	pub fn method(&self) -> &Method {
		&self.method
	}

	/// First value submitted for `name`.
	pub fn param(&self, name: &str) -> Option<&str> {
		self.params(name).first().map(String::as_str)
	}

	/// Every value submitted for `name`, or an empty slice.
	pub fn params(&self, name: &str) -> &[String] {
		self.raw_parameters
			.get(name)
			.map(Vec::as_slice)
			.unwrap_or_default()
	}

	pub fn raw_parameters(&self) -> &HashMap<String, Vec<String>> {
		&self.raw_parameters
	}
}
