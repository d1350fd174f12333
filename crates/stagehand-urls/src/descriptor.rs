//! Action descriptors and the scan entries they are built from.

use crate::error::RouteError;
use crate::params::UriParameters;
use crate::pattern::{PatternLimits, UriPattern};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Opaque identifier of the type implementing an action.
///
/// The dispatch core never interprets it; it is only handed back to the
/// action factory when an instance is needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerType(Cow<'static, str>);

impl HandlerType {
	pub const fn from_static(name: &'static str) -> Self {
		Self(Cow::Borrowed(name))
	}

	pub fn new(name: impl Into<String>) -> Self {
		Self(Cow::Owned(name.into()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for HandlerType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&'static str> for HandlerType {
	fn from(name: &'static str) -> Self {
		Self::from_static(name)
	}
}

impl From<String> for HandlerType {
	fn from(name: String) -> Self {
		Self::new(name)
	}
}

/// Registration record produced by the external action scanner.
///
/// ```
/// use stagehand_urls::ScanEntry;
///
/// let entry: ScanEntry = serde_json::from_str(
///     r#"{"handler_type": "UserEdit", "base_path": "/user/edit", "uri_parameter_pattern": "{id}"}"#,
/// )
/// .unwrap();
///
/// assert!(!entry.overridable);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEntry {
	pub handler_type: HandlerType,
	pub base_path: String,
	#[serde(default)]
	pub uri_parameter_pattern: Option<String>,
	#[serde(default)]
	pub overridable: bool,
}

impl ScanEntry {
	pub fn new(handler_type: impl Into<HandlerType>, base_path: impl Into<String>) -> Self {
		Self {
			handler_type: handler_type.into(),
			base_path: base_path.into(),
			uri_parameter_pattern: None,
			overridable: false,
		}
	}

	pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
		self.uri_parameter_pattern = Some(pattern.into());
		self
	}

	pub fn overridable(mut self, overridable: bool) -> Self {
		self.overridable = overridable;
		self
	}
}

/// Immutable description of one routable action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDescriptor {
	base_path: String,
	pattern: Option<UriPattern>,
	overridable: bool,
	handler_type: HandlerType,
}

impl ActionDescriptor {
	/// Builds a descriptor from a scan entry.
	///
	/// The base path must start with `/`. A trailing `/` is removed unless the
	/// base path is the root. An empty pattern is treated as no pattern.
	pub fn from_scan(entry: &ScanEntry, limits: &PatternLimits) -> Result<Self, RouteError> {
		let base_path = normalize_base_path(&entry.base_path)?;

		let pattern = match entry.uri_parameter_pattern.as_deref() {
			None | Some("") => None,
			Some(source) => Some(UriPattern::parse_with_limits(source, limits).map_err(|source| {
				RouteError::MalformedPattern {
					handler_type: entry.handler_type.clone(),
					source,
				}
			})?),
		};

		Ok(Self {
			base_path,
			pattern,
			overridable: entry.overridable,
			handler_type: entry.handler_type.clone(),
		})
	}

	pub fn base_path(&self) -> &str {
		&self.base_path
	}

	pub fn pattern(&self) -> Option<&UriPattern> {
		self.pattern.as_ref()
	}

	pub fn is_overridable(&self) -> bool {
		self.overridable
	}

	pub fn handler_type(&self) -> &HandlerType {
		&self.handler_type
	}

	/// Matches a request path against this descriptor.
	///
	/// A path equal to the base path matches with no parameters. Otherwise
	/// the path must continue the base path with `/` and the remainder must
	/// satisfy the pattern.
	pub fn match_path(&self, path: &str) -> Option<UriParameters> {
		if path == self.base_path {
			return Some(UriParameters::new());
		}
		let pattern = self.pattern.as_ref()?;
		let suffix = if self.base_path == "/" {
			path.strip_prefix('/')?
		} else {
			path.strip_prefix(self.base_path.as_str())?.strip_prefix('/')?
		};
		pattern.match_suffix(suffix)
	}

	/// Builds a request path for this action from capture values.
	///
	/// ```
	/// use stagehand_urls::{ActionDescriptor, PatternLimits, ScanEntry};
	///
	/// let entry = ScanEntry::new("UserEdit", "/user/edit").with_pattern("{id}");
	/// let descriptor = ActionDescriptor::from_scan(&entry, &PatternLimits::default()).unwrap();
	///
	/// assert_eq!(descriptor.reverse(&[("id", "42")]).as_deref(), Some("/user/edit/42"));
	/// ```
	pub fn reverse(&self, values: &[(&str, &str)]) -> Option<String> {
		let Some(pattern) = &self.pattern else {
			return Some(self.base_path.clone());
		};
		let suffix = pattern.reverse(values)?;
		if self.base_path == "/" {
			Some(format!("/{}", suffix))
		} else {
			Some(format!("{}/{}", self.base_path, suffix))
		}
	}
}

fn normalize_base_path(raw: &str) -> Result<String, RouteError> {
	if !raw.starts_with('/') {
		return Err(RouteError::InvalidBasePath(raw.to_string()));
	}
	let trimmed = raw.trim_end_matches('/');
	if trimmed.is_empty() {
		return Ok("/".to_string());
	}
	Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn descriptor(base: &str, pattern: Option<&str>) -> ActionDescriptor {
		let mut entry = ScanEntry::new("Handler", base);
		entry.uri_parameter_pattern = pattern.map(str::to_string);
		ActionDescriptor::from_scan(&entry, &PatternLimits::default()).unwrap()
	}

	#[rstest]
	#[case("/user/edit", "/user/edit")]
	#[case("/user/edit/", "/user/edit")]
	#[case("/", "/")]
	#[case("//", "/")]
	fn test_base_path_normalization(#[case] raw: &str, #[case] expected: &str) {
		assert_eq!(descriptor(raw, None).base_path(), expected);
	}

	#[rstest]
	#[case("")]
	#[case("user/edit")]
	fn test_base_path_must_be_absolute(#[case] raw: &str) {
		let entry = ScanEntry::new("Handler", raw);
		let err = ActionDescriptor::from_scan(&entry, &PatternLimits::default()).unwrap_err();
		assert!(matches!(err, RouteError::InvalidBasePath(_)));
	}

	#[rstest]
	fn test_empty_pattern_means_no_pattern() {
		assert!(descriptor("/a", Some("")).pattern().is_none());
	}

	#[rstest]
	fn test_malformed_pattern_names_handler() {
		let entry = ScanEntry::new("Broken", "/a").with_pattern("{id");
		let err = ActionDescriptor::from_scan(&entry, &PatternLimits::default()).unwrap_err();

		match err {
			RouteError::MalformedPattern { handler_type, .. } => {
				assert_eq!(handler_type.as_str(), "Broken")
			}
			other => panic!("unexpected error: {:?}", other),
		}
	}

	#[rstest]
	#[case("/user/edit", Some(vec![]))]
	#[case("/user/edit/42", Some(vec![("id", "42")]))]
	#[case("/user/edit/", None)]
	#[case("/user/editor/42", None)]
	#[case("/user", None)]
	fn test_match_path(#[case] path: &str, #[case] expected: Option<Vec<(&str, &str)>>) {
		let descriptor = descriptor("/user/edit", Some("{id}"));
		let expected = expected.map(|pairs| pairs.into_iter().collect::<UriParameters>());
		assert_eq!(descriptor.match_path(path), expected);
	}

	#[rstest]
	fn test_root_base_path_with_pattern() {
		let descriptor = descriptor("/", Some("{page}"));

		assert_eq!(descriptor.match_path("/").map(|p| p.len()), Some(0));
		assert_eq!(
			descriptor.match_path("/about").unwrap().get("page"),
			Some("about")
		);
		assert_eq!(descriptor.reverse(&[("page", "about")]).as_deref(), Some("/about"));
	}

	#[rstest]
	fn test_descriptor_without_pattern_only_matches_exactly() {
		let descriptor = descriptor("/status", None);

		assert!(descriptor.match_path("/status").is_some());
		assert!(descriptor.match_path("/status/extra").is_none());
		assert_eq!(descriptor.reverse(&[]).as_deref(), Some("/status"));
	}
}
