//! The action registry.
//!
//! Built once during boot, then shared read-only between requests.

use crate::descriptor::{ActionDescriptor, ScanEntry};
use crate::error::RouteError;
use crate::params::UriParameters;
use crate::pattern::PatternLimits;
use indexmap::IndexMap;
use std::sync::Arc;

/// A resolved action and the parameters captured from the request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
	pub descriptor: Arc<ActionDescriptor>,
	pub uri_parameters: UriParameters,
}

/// Catalog of action descriptors keyed by base path.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
	by_path: IndexMap<String, Arc<ActionDescriptor>>,
	/// Descriptors ordered longest base path first; ties keep registration order.
	by_length: Vec<Arc<ActionDescriptor>>,
	limits: PatternLimits,
}

impl ActionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a registry that parses scan-entry patterns with `limits`.
	pub fn with_limits(limits: PatternLimits) -> Self {
		Self {
			limits,
			..Self::default()
		}
	}

	pub fn limits(&self) -> &PatternLimits {
		&self.limits
	}

	/// Registers a descriptor under its base path.
	///
	/// A descriptor already registered as overridable is replaced. A
	/// non-overridable one makes the registration fail with
	/// [`RouteError::Duplicate`].
	pub fn register(
		&mut self,
		descriptor: ActionDescriptor,
	) -> Result<Arc<ActionDescriptor>, RouteError> {
		let base_path = descriptor.base_path().to_string();

		if let Some(existing) = self.by_path.get(&base_path) {
			if !existing.is_overridable() {
				tracing::error!(
					base_path = %base_path,
					existing = %existing.handler_type(),
					rejected = %descriptor.handler_type(),
					"Duplicate action registration"
				);
				return Err(RouteError::Duplicate {
					base_path,
					existing: existing.handler_type().clone(),
					rejected: descriptor.handler_type().clone(),
				});
			}
			tracing::debug!(
				base_path = %base_path,
				replaced = %existing.handler_type(),
				by = %descriptor.handler_type(),
				"Overriding action registration"
			);
		} else {
			tracing::debug!(
				base_path = %base_path,
				handler = %descriptor.handler_type(),
				"Registered action"
			);
		}

		let descriptor = Arc::new(descriptor);
		self.by_path.insert(base_path, descriptor.clone());
		self.rebuild_order();
		Ok(descriptor)
	}

	/// Parses a scan entry with this registry's limits and registers it.
	pub fn register_scan(&mut self, entry: &ScanEntry) -> Result<Arc<ActionDescriptor>, RouteError> {
		let descriptor = ActionDescriptor::from_scan(entry, &self.limits)?;
		self.register(descriptor)
	}

	/// Resolves a request path.
	///
	/// An exact base-path match wins. Otherwise every descriptor whose base
	/// path prefixes `path` is tried, longest base path first, and the first
	/// whose pattern accepts the remainder is returned.
	///
	/// # Examples
	///
	/// ```
	/// use stagehand_urls::{ActionRegistry, ScanEntry};
	///
	/// let mut registry = ActionRegistry::new();
	/// registry.register_scan(&ScanEntry::new("Files", "/files").with_pattern("{*rest}")).unwrap();
	///
	/// let found = registry.lookup("/files/a/b/c").unwrap();
	/// assert_eq!(found.uri_parameters.get("rest"), Some("a/b/c"));
	/// assert!(registry.lookup("/other").is_none());
	/// ```
	pub fn lookup(&self, path: &str) -> Option<RouteMatch> {
		if let Some(descriptor) = self.by_path.get(path) {
			return Some(RouteMatch {
				descriptor: descriptor.clone(),
				uri_parameters: UriParameters::new(),
			});
		}

		self.by_length.iter().find_map(|descriptor| {
			descriptor.match_path(path).map(|uri_parameters| RouteMatch {
				descriptor: descriptor.clone(),
				uri_parameters,
			})
		})
	}

	/// Returns the descriptor registered under exactly `base_path`.
	pub fn get(&self, base_path: &str) -> Option<&Arc<ActionDescriptor>> {
		self.by_path.get(base_path)
	}

	/// Snapshot of every descriptor in registration order.
	pub fn all(&self) -> Vec<Arc<ActionDescriptor>> {
		self.by_path.values().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.by_path.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_path.is_empty()
	}

	fn rebuild_order(&mut self) {
		self.by_length = self.by_path.values().cloned().collect();
		self.by_length
			.sort_by(|a, b| b.base_path().len().cmp(&a.base_path().len()));
	}
}
