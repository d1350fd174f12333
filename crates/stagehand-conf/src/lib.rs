//! # Stagehand Conf
//!
//! Settings consumed while booting the dispatch core.
//!
//! Settings can be built in code, parsed from a TOML string, or read from a
//! `.toml` file. Every field has a default, so an empty file is a
//! valid configuration.
//!
//! ```
//! use stagehand_conf::DispatchSettings;
//!
//! let settings = DispatchSettings::from_toml_str(
//!     r#"
//! not_found_result = "missing"
//!
//! [patterns]
//! max_segments = 16
//! "#,
//! )
//! .unwrap();
//!
//! assert_eq!(settings.not_found_result, "missing");
//! assert_eq!(settings.failure_result, "error");
//! assert_eq!(settings.patterns.max_segments, 16);
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Default maximum length of a URI parameter pattern, in bytes.
pub const DEFAULT_MAX_PATTERN_LENGTH: usize = 1024;

/// Default maximum number of `/`-separated segments in a URI parameter pattern.
pub const DEFAULT_MAX_PATTERN_SEGMENTS: usize = 32;

/// Settings for the dispatch core
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSettings {
	/// Result code produced when no action matches the request path
	#[serde(default = "default_not_found_result")]
	pub not_found_result: String,

	/// Result code produced when a stage fails with an unmapped error
	#[serde(default = "default_failure_result")]
	pub failure_result: String,

	/// Result code produced when binding or validation reported errors
	#[serde(default = "default_input_result")]
	pub input_result: String,

	/// Render the context after a short-circuit or a handled stage error
	#[serde(default = "default_true")]
	pub render_on_short_circuit: bool,

	/// Limits applied to URI parameter patterns at registration time
	#[serde(default)]
	pub patterns: PatternSettings,
}

/// Limits applied to URI parameter patterns
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSettings {
	#[serde(default = "default_max_length")]
	pub max_length: usize,

	#[serde(default = "default_max_segments")]
	pub max_segments: usize,
}

fn default_not_found_result() -> String {
	"not_found".to_string()
}

fn default_failure_result() -> String {
	"error".to_string()
}

fn default_input_result() -> String {
	"input".to_string()
}

fn default_true() -> bool {
	true
}

fn default_max_length() -> usize {
	DEFAULT_MAX_PATTERN_LENGTH
}

fn default_max_segments() -> usize {
	DEFAULT_MAX_PATTERN_SEGMENTS
}

impl Default for DispatchSettings {
	fn default() -> Self {
		Self {
			not_found_result: default_not_found_result(),
			failure_result: default_failure_result(),
			input_result: default_input_result(),
			render_on_short_circuit: true,
			patterns: PatternSettings::default(),
		}
	}
}

impl Default for PatternSettings {
	fn default() -> Self {
		Self {
			max_length: DEFAULT_MAX_PATTERN_LENGTH,
			max_segments: DEFAULT_MAX_PATTERN_SEGMENTS,
		}
	}
}

impl DispatchSettings {
	/// Create new settings with defaults
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse settings from a TOML document and validate them
	pub fn from_toml_str(contents: &str) -> Result<Self, SettingsError> {
		let settings: DispatchSettings = toml::from_str(contents)
			.map_err(|e| SettingsError::ParseError(format!("TOML parse error: {}", e)))?;
		settings.validate()?;
		Ok(settings)
	}

	/// Load settings from a `.toml` file
	///
	/// # Examples
	///
	/// ```
	/// use stagehand_conf::{DispatchSettings, SettingsError};
	///
	/// let err = DispatchSettings::from_file("/nonexistent/dispatch.yaml").unwrap_err();
	/// assert!(matches!(err, SettingsError::UnsupportedFormat(_)));
	/// ```
	pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
		let path = path.into();
		if path.extension().and_then(|s| s.to_str()) != Some("toml") {
			return Err(SettingsError::UnsupportedFormat(format!(
				"{}: supported formats: .toml",
				path.display()
			)));
		}

		let contents = std::fs::read_to_string(&path).map_err(|e| {
			SettingsError::FileError(format!("Failed to read {}: {}", path.display(), e))
		})?;

		tracing::debug!(path = %path.display(), "loading dispatch settings");
		Self::from_toml_str(&contents)
	}

	/// Validate settings
	pub fn validate(&self) -> Result<(), SettingsError> {
		for (name, value) in [
			("not_found_result", &self.not_found_result),
			("failure_result", &self.failure_result),
			("input_result", &self.input_result),
		] {
			if value.trim().is_empty() {
				return Err(SettingsError::ValidationError(format!(
					"{} must not be empty",
					name
				)));
			}
		}

		if self.patterns.max_length == 0 {
			return Err(SettingsError::ValidationError(
				"patterns.max_length must be greater than zero".to_string(),
			));
		}

		if self.patterns.max_segments == 0 {
			return Err(SettingsError::ValidationError(
				"patterns.max_segments must be greater than zero".to_string(),
			));
		}

		Ok(())
	}

	pub fn with_not_found_result(mut self, code: impl Into<String>) -> Self {
		self.not_found_result = code.into();
		self
	}

	pub fn with_failure_result(mut self, code: impl Into<String>) -> Self {
		self.failure_result = code.into();
		self
	}

	pub fn with_input_result(mut self, code: impl Into<String>) -> Self {
		self.input_result = code.into();
		self
	}

	pub fn with_render_on_short_circuit(mut self, render: bool) -> Self {
		self.render_on_short_circuit = render;
		self
	}

	pub fn with_pattern_limits(mut self, max_length: usize, max_segments: usize) -> Self {
		self.patterns = PatternSettings {
			max_length,
			max_segments,
		};
		self
	}
}

/// Settings errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
	#[error("File error: {0}")]
	FileError(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Unsupported format: {0}")]
	UnsupportedFormat(String),
}
