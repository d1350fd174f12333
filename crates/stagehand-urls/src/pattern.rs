//! URI parameter patterns.
//!
//! A pattern describes the path segments that may follow an action's base
//! path. Segments are separated by `/` and each one is either literal text,
//! a named capture `{name}`, or a trailing wildcard `{*name}` that swallows
//! every remaining segment. Literal braces are written `\{` and `\}`.
//!
//! ```
//! use stagehand_urls::UriPattern;
//!
//! let pattern = UriPattern::parse("{year}/{month}/{*slug}").unwrap();
//! let params = pattern.match_suffix("2024/05/hello/world").unwrap();
//!
//! assert_eq!(params.get("year"), Some("2024"));
//! assert_eq!(params.get("slug"), Some("hello/world"));
//! ```

use crate::params::UriParameters;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Default maximum pattern length in bytes.
pub const DEFAULT_MAX_PATTERN_LENGTH: usize = 1024;

/// Default maximum number of `/`-separated segments in a pattern.
pub const DEFAULT_MAX_PATTERN_SEGMENTS: usize = 32;

static CAPTURE_NAME: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid capture name regex pattern")
});

/// Errors raised while parsing a [`UriPattern`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
	#[error("Pattern length {length} exceeds maximum allowed length of {max} bytes")]
	TooLong { length: usize, max: usize },

	#[error("Pattern has {count} segments, exceeding maximum of {max}")]
	TooManySegments { count: usize, max: usize },

	#[error("Unterminated capture in segment '{segment}' of pattern '{pattern}'")]
	Unterminated { pattern: String, segment: String },

	#[error("Unmatched '}}' in segment '{segment}' of pattern '{pattern}'")]
	UnmatchedClose { pattern: String, segment: String },

	#[error("Capture must occupy a whole segment: '{segment}' in pattern '{pattern}'")]
	PartialCapture { pattern: String, segment: String },

	#[error("Invalid capture name '{name}' in pattern '{pattern}'")]
	InvalidCaptureName { pattern: String, name: String },

	#[error("Duplicate capture name '{name}' in pattern '{pattern}'")]
	DuplicateCapture { pattern: String, name: String },

	#[error("Wildcard '{name}' must be the last segment of pattern '{pattern}'")]
	MisplacedWildcard { pattern: String, name: String },
}

/// Size limits applied when parsing patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternLimits {
	pub max_length: usize,
	pub max_segments: usize,
}

impl PatternLimits {
	pub fn new(max_length: usize, max_segments: usize) -> Self {
		Self {
			max_length,
			max_segments,
		}
	}
}

impl Default for PatternLimits {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_PATTERN_LENGTH, DEFAULT_MAX_PATTERN_SEGMENTS)
	}
}

/// One parsed pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
	/// Text that must equal the path segment exactly.
	Literal(String),
	/// `{name}`: one non-empty path segment.
	Capture(String),
	/// `{*name}`: the rest of the path, slashes included.
	Wildcard(String),
}

impl Segment {
	pub fn capture_name(&self) -> Option<&str> {
		match self {
			Segment::Literal(_) => None,
			Segment::Capture(name) | Segment::Wildcard(name) => Some(name),
		}
	}
}

/// A parsed URI parameter pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriPattern {
	source: String,
	segments: Vec<Segment>,
}

impl UriPattern {
	/// Parses a pattern with the default [`PatternLimits`].
	pub fn parse(pattern: &str) -> Result<Self, PatternError> {
		Self::parse_with_limits(pattern, &PatternLimits::default())
	}

	/// Parses a pattern, rejecting it if it exceeds `limits`.
	///
	/// A single leading `/` is ignored so `"/{id}"` and `"{id}"` are the same
	/// pattern.
	pub fn parse_with_limits(pattern: &str, limits: &PatternLimits) -> Result<Self, PatternError> {
		if pattern.len() > limits.max_length {
			return Err(PatternError::TooLong {
				length: pattern.len(),
				max: limits.max_length,
			});
		}

		let body = pattern.strip_prefix('/').unwrap_or(pattern);
		let raw_segments: Vec<&str> = body.split('/').collect();
		if raw_segments.len() > limits.max_segments {
			return Err(PatternError::TooManySegments {
				count: raw_segments.len(),
				max: limits.max_segments,
			});
		}

		let mut segments = Vec::with_capacity(raw_segments.len());
		let mut seen = HashSet::new();
		let last = raw_segments.len() - 1;

		for (index, raw) in raw_segments.iter().enumerate() {
			let segment = parse_segment(pattern, raw)?;
			match &segment {
				Segment::Wildcard(name) if index != last => {
					return Err(PatternError::MisplacedWildcard {
						pattern: pattern.to_string(),
						name: name.clone(),
					});
				}
				_ => {}
			}
			if let Some(name) = segment.capture_name()
				&& !seen.insert(name.to_string())
			{
				return Err(PatternError::DuplicateCapture {
					pattern: pattern.to_string(),
					name: name.to_string(),
				});
			}
			segments.push(segment);
		}

		Ok(Self {
			source: pattern.to_string(),
			segments,
		})
	}

	pub fn as_str(&self) -> &str {
		&self.source
	}

	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	/// Capture names in declaration order.
	pub fn capture_names(&self) -> impl Iterator<Item = &str> {
		self.segments.iter().filter_map(Segment::capture_name)
	}

	pub fn has_wildcard(&self) -> bool {
		matches!(self.segments.last(), Some(Segment::Wildcard(_)))
	}

	/// Matches the part of a request path that follows the base path and its
	/// separating `/`.
	///
	/// Returns the captured parameters, or `None` if the suffix does not fit
	/// the pattern. A `{name}` capture never matches an empty segment. A
	/// wildcard matches whatever remains, including an empty final segment,
	/// but a wildcard still requires that segment to exist.
	pub fn match_suffix(&self, suffix: &str) -> Option<UriParameters> {
		let parts: Vec<&str> = suffix.split('/').collect();
		let mut params = UriParameters::new();

		for (index, segment) in self.segments.iter().enumerate() {
			match segment {
				Segment::Literal(text) => {
					if parts.get(index)? != text {
						return None;
					}
				}
				Segment::Capture(name) => {
					let part = parts.get(index)?;
					if part.is_empty() {
						return None;
					}
					params.insert(name.as_str(), *part);
				}
				Segment::Wildcard(name) => {
					if index >= parts.len() {
						return None;
					}
					params.insert(name.as_str(), parts[index..].join("/"));
					return Some(params);
				}
			}
		}

		if parts.len() != self.segments.len() {
			return None;
		}
		Some(params)
	}

	/// Builds the path suffix for the given capture values.
	///
	/// Returns `None` if a capture value is missing, a `{name}` value is empty
	/// or contains `/`.
	///
	/// ```
	/// use stagehand_urls::UriPattern;
	///
	/// let pattern = UriPattern::parse("edit/{id}").unwrap();
	/// assert_eq!(pattern.reverse(&[("id", "42")]).as_deref(), Some("edit/42"));
	/// assert_eq!(pattern.reverse(&[]), None);
	/// ```
	pub fn reverse(&self, values: &[(&str, &str)]) -> Option<String> {
		let lookup = |name: &str| {
			values
				.iter()
				.find(|(candidate, _)| *candidate == name)
				.map(|(_, value)| *value)
		};

		let mut parts = Vec::with_capacity(self.segments.len());
		for segment in &self.segments {
			match segment {
				Segment::Literal(text) => parts.push(text.as_str()),
				Segment::Capture(name) => {
					let value = lookup(name)?;
					if value.is_empty() || value.contains('/') {
						return None;
					}
					parts.push(value);
				}
				Segment::Wildcard(name) => parts.push(lookup(name)?),
			}
		}
		Some(parts.join("/"))
	}
}

impl fmt::Display for UriPattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.source)
	}
}

fn parse_segment(pattern: &str, raw: &str) -> Result<Segment, PatternError> {
	let mut literal = String::with_capacity(raw.len());
	// Unescaped braces with their char offset inside the segment.
	let mut braces: Vec<(usize, char)> = Vec::new();
	let mut chars = raw.chars().enumerate().peekable();

	while let Some((offset, ch)) = chars.next() {
		match ch {
			'\\' => match chars.peek() {
				Some(&(_, next @ ('{' | '}'))) => {
					literal.push(next);
					chars.next();
				}
				_ => literal.push('\\'),
			},
			'{' | '}' => braces.push((offset, ch)),
			_ => literal.push(ch),
		}
	}

	if braces.is_empty() {
		return Ok(Segment::Literal(literal));
	}

	let char_len = raw.chars().count();
	if let [(0, '{'), (close, '}')] = braces.as_slice()
		&& *close == char_len - 1
	{
		let inner = &raw[1..raw.len() - 1];
		let (name, wildcard) = match inner.strip_prefix('*') {
			Some(name) => (name, true),
			None => (inner, false),
		};
		if !CAPTURE_NAME.is_match(name) {
			return Err(PatternError::InvalidCaptureName {
				pattern: pattern.to_string(),
				name: name.to_string(),
			});
		}
		return Ok(if wildcard {
			Segment::Wildcard(name.to_string())
		} else {
			Segment::Capture(name.to_string())
		});
	}

	let mut depth = 0usize;
	for (_, brace) in &braces {
		match brace {
			'{' => depth += 1,
			_ if depth == 0 => {
				return Err(PatternError::UnmatchedClose {
					pattern: pattern.to_string(),
					segment: raw.to_string(),
				});
			}
			_ => depth -= 1,
		}
	}
	if depth > 0 {
		return Err(PatternError::Unterminated {
			pattern: pattern.to_string(),
			segment: raw.to_string(),
		});
	}
	Err(PatternError::PartialCapture {
		pattern: pattern.to_string(),
		segment: raw.to_string(),
	})
}
