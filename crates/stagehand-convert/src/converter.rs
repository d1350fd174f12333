//! Converter trait and the built-in scalar converters.
//!
//! Converters map between raw request strings and typed values. Typed values
//! are carried as [`serde_json::Value`] so an action can deserialize them into
//! its own field types.

use crate::types::{ScalarKind, TypeKey};
use chrono::NaiveDate;
use serde_json::{Number, Value};
use std::fmt;
use thiserror::Error;

/// Errors produced while converting a single value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConverterError {
	#[error("Invalid value '{value}' for {target}: {reason}")]
	InvalidValue {
		value: String,
		target: String,
		reason: String,
	},

	#[error("Value '{value}' is out of range for {target}")]
	OutOfRange { value: String, target: String },

	#[error("Converter '{converter}' does not support {target}")]
	UnsupportedType { converter: String, target: String },

	#[error("No converter registered for {0}")]
	NoConverter(String),
}

pub type ConverterResult<T> = Result<T, ConverterError>;

impl ConverterError {
	pub fn invalid(value: &str, target: &TypeKey, reason: impl fmt::Display) -> Self {
		Self::InvalidValue {
			value: value.to_string(),
			target: target.to_string(),
			reason: reason.to_string(),
		}
	}

	fn unsupported(converter: &dyn Converter, target: &TypeKey) -> Self {
		Self::UnsupportedType {
			converter: converter.name().to_string(),
			target: target.to_string(),
		}
	}
}

/// Bidirectional mapping between raw strings and typed values for one type
/// or type family.
///
/// `target` is the element type being converted, with array layers removed
/// but primitive/boxed form preserved, so a converter can reject blank input
/// for primitives while accepting it as `null` for boxed scalars.
pub trait Converter: Send + Sync {
	/// Short identifier used in logs and error messages.
	fn name(&self) -> &str;

	fn from_raw(&self, raw: &str, target: &TypeKey) -> ConverterResult<Value>;

	fn to_raw(&self, value: &Value, target: &TypeKey) -> ConverterResult<String>;
}

impl fmt::Debug for dyn Converter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Converter")
			.field("name", &self.name())
			.finish()
	}
}

// Blank input is `null` for nullable targets and an error for primitives.
fn blank(raw: &str, target: &TypeKey) -> Option<ConverterResult<Value>> {
	if !raw.trim().is_empty() {
		return None;
	}
	if target.is_nullable() {
		Some(Ok(Value::Null))
	} else {
		Some(Err(ConverterError::invalid(raw, target, "a value is required")))
	}
}

fn null_to_raw(value: &Value) -> Option<String> {
	value.is_null().then(String::new)
}

fn mismatch(value: &Value, target: &TypeKey) -> ConverterError {
	ConverterError::invalid(&value.to_string(), target, "value has the wrong shape")
}

/// Boolean converter
///
/// Accepts `true/false`, `1/0`, `yes/no` and `on/off` in any case.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanConverter;

impl Converter for BooleanConverter {
	fn name(&self) -> &str {
		"boolean"
	}

	fn from_raw(&self, raw: &str, target: &TypeKey) -> ConverterResult<Value> {
		if let Some(result) = blank(raw, target) {
			return result;
		}
		match raw.trim().to_ascii_lowercase().as_str() {
			"true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
			"false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
			_ => Err(ConverterError::invalid(raw, target, "expected a boolean")),
		}
	}

	fn to_raw(&self, value: &Value, target: &TypeKey) -> ConverterResult<String> {
		if let Some(raw) = null_to_raw(value) {
			return Ok(raw);
		}
		value
			.as_bool()
			.map(|b| b.to_string())
			.ok_or_else(|| mismatch(value, target))
	}
}

/// Integer converter
///
/// Range-checks the parsed value against the target's [`ScalarKind`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerConverter;

impl Converter for IntegerConverter {
	fn name(&self) -> &str {
		"integer"
	}

	fn from_raw(&self, raw: &str, target: &TypeKey) -> ConverterResult<Value> {
		let Some((min, max)) = target.scalar_kind().and_then(|k| k.integer_range()) else {
			return Err(ConverterError::unsupported(self, target));
		};
		if let Some(result) = blank(raw, target) {
			return result;
		}

		let parsed: i128 = raw
			.trim()
			.parse()
			.map_err(|e| ConverterError::invalid(raw, target, e))?;
		if parsed < min || parsed > max {
			return Err(ConverterError::OutOfRange {
				value: raw.to_string(),
				target: target.to_string(),
			});
		}

		let number = if parsed < 0 {
			Number::from(parsed as i64)
		} else {
			Number::from(parsed as u64)
		};
		Ok(Value::Number(number))
	}

	fn to_raw(&self, value: &Value, target: &TypeKey) -> ConverterResult<String> {
		if let Some(raw) = null_to_raw(value) {
			return Ok(raw);
		}
		match value {
			Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
			_ => Err(mismatch(value, target)),
		}
	}
}

/// Floating-point converter
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatConverter;

impl Converter for FloatConverter {
	fn name(&self) -> &str {
		"float"
	}

	fn from_raw(&self, raw: &str, target: &TypeKey) -> ConverterResult<Value> {
		let Some(kind) = target.scalar_kind().filter(ScalarKind::is_float) else {
			return Err(ConverterError::unsupported(self, target));
		};
		if let Some(result) = blank(raw, target) {
			return result;
		}

		let parsed: f64 = raw
			.trim()
			.parse()
			.map_err(|e| ConverterError::invalid(raw, target, e))?;
		if kind == ScalarKind::F32 && parsed.is_finite() && parsed.abs() > f32::MAX as f64 {
			return Err(ConverterError::OutOfRange {
				value: raw.to_string(),
				target: target.to_string(),
			});
		}

		Number::from_f64(parsed)
			.map(Value::Number)
			.ok_or_else(|| ConverterError::invalid(raw, target, "not a finite number"))
	}

	fn to_raw(&self, value: &Value, target: &TypeKey) -> ConverterResult<String> {
		if let Some(raw) = null_to_raw(value) {
			return Ok(raw);
		}
		value
			.as_f64()
			.map(|f| f.to_string())
			.ok_or_else(|| mismatch(value, target))
	}
}

/// Single-character converter
#[derive(Debug, Clone, Copy, Default)]
pub struct CharConverter;

impl Converter for CharConverter {
	fn name(&self) -> &str {
		"char"
	}

	fn from_raw(&self, raw: &str, target: &TypeKey) -> ConverterResult<Value> {
		if raw.is_empty() {
			if let Some(result) = blank(raw, target) {
				return result;
			}
		}
		let mut chars = raw.chars();
		match (chars.next(), chars.next()) {
			(Some(c), None) => Ok(Value::String(c.to_string())),
			_ => Err(ConverterError::invalid(
				raw,
				target,
				"expected exactly one character",
			)),
		}
	}

	fn to_raw(&self, value: &Value, target: &TypeKey) -> ConverterResult<String> {
		if let Some(raw) = null_to_raw(value) {
			return Ok(raw);
		}
		match value.as_str() {
			Some(s) if s.chars().count() == 1 => Ok(s.to_string()),
			_ => Err(mismatch(value, target)),
		}
	}
}

/// String converter (identity)
#[derive(Debug, Clone, Copy, Default)]
pub struct StringConverter;

impl Converter for StringConverter {
	fn name(&self) -> &str {
		"string"
	}

	fn from_raw(&self, raw: &str, _target: &TypeKey) -> ConverterResult<Value> {
		Ok(Value::String(raw.to_string()))
	}

	fn to_raw(&self, value: &Value, target: &TypeKey) -> ConverterResult<String> {
		match value {
			Value::Null => Ok(String::new()),
			Value::String(s) => Ok(s.clone()),
			_ => Err(mismatch(value, target)),
		}
	}
}

/// UUID converter
///
/// Values are normalised to the lowercase hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidConverter;

impl Converter for UuidConverter {
	fn name(&self) -> &str {
		"uuid"
	}

	fn from_raw(&self, raw: &str, target: &TypeKey) -> ConverterResult<Value> {
		if let Some(result) = blank(raw, target) {
			return result;
		}
		uuid::Uuid::parse_str(raw.trim())
			.map(|id| Value::String(id.hyphenated().to_string()))
			.map_err(|e| ConverterError::invalid(raw, target, e))
	}

	fn to_raw(&self, value: &Value, target: &TypeKey) -> ConverterResult<String> {
		if let Some(raw) = null_to_raw(value) {
			return Ok(raw);
		}
		let s = value.as_str().ok_or_else(|| mismatch(value, target))?;
		uuid::Uuid::parse_str(s)
			.map(|id| id.hyphenated().to_string())
			.map_err(|e| ConverterError::invalid(s, target, e))
	}
}

/// Calendar date converter
///
/// Parses with a `chrono` format string (ISO `%Y-%m-%d` by default) and
/// carries the date as an ISO string.
#[derive(Debug, Clone)]
pub struct DateConverter {
	format: String,
}

impl DateConverter {
	pub fn new() -> Self {
		Self::with_format("%Y-%m-%d")
	}

	/// Creates a converter for a custom input format.
	///
	/// ```
	/// use stagehand_convert::{Converter, DateConverter, TypeKey};
	///
	/// let converter = DateConverter::with_format("%d/%m/%Y");
	/// let value = converter.from_raw("24/12/2025", &TypeKey::DATE).unwrap();
	/// assert_eq!(value, "2025-12-24");
	/// assert_eq!(converter.to_raw(&value, &TypeKey::DATE).unwrap(), "24/12/2025");
	/// ```
	pub fn with_format(format: impl Into<String>) -> Self {
		Self {
			format: format.into(),
		}
	}
}

impl Default for DateConverter {
	fn default() -> Self {
		Self::new()
	}
}

impl Converter for DateConverter {
	fn name(&self) -> &str {
		"date"
	}

	fn from_raw(&self, raw: &str, target: &TypeKey) -> ConverterResult<Value> {
		if let Some(result) = blank(raw, target) {
			return result;
		}
		NaiveDate::parse_from_str(raw.trim(), &self.format)
			.map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
			.map_err(|e| ConverterError::invalid(raw, target, e))
	}

	fn to_raw(&self, value: &Value, target: &TypeKey) -> ConverterResult<String> {
		if let Some(raw) = null_to_raw(value) {
			return Ok(raw);
		}
		let s = value.as_str().ok_or_else(|| mismatch(value, target))?;
		NaiveDate::parse_from_str(s, "%Y-%m-%d")
			.map(|date| date.format(&self.format).to_string())
			.map_err(|e| ConverterError::invalid(s, target, e))
	}
}
