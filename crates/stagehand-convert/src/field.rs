//! Bindable field descriptions.

use crate::converter::{Converter, ConverterError, ConverterResult};
use crate::registry::ConverterRegistry;
use crate::types::{TypeKey, Typed};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// One bindable field of an action.
///
/// The optional converter override bypasses the registry's hierarchical walk
/// for this field only.
#[derive(Clone)]
pub struct FieldSpec {
	name: String,
	type_key: TypeKey,
	converter: Option<Arc<dyn Converter>>,
}

impl FieldSpec {
	pub fn new(name: impl Into<String>, type_key: TypeKey) -> Self {
		Self {
			name: name.into(),
			type_key,
			converter: None,
		}
	}

	/// Describes a field whose type is a Rust type implementing [`Typed`].
	///
	/// ```
	/// use stagehand_convert::{FieldSpec, ScalarKind, TypeKey};
	///
	/// let field = FieldSpec::of::<Vec<u32>>("ids");
	/// assert!(field.is_array());
	/// assert_eq!(field.type_key().element(), &TypeKey::Primitive(ScalarKind::U32));
	/// ```
	pub fn of<T: Typed + ?Sized>(name: impl Into<String>) -> Self {
		Self::new(name, T::type_key())
	}

	pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
		self.converter = Some(converter);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn type_key(&self) -> &TypeKey {
		&self.type_key
	}

	pub fn converter_override(&self) -> Option<&Arc<dyn Converter>> {
		self.converter.as_ref()
	}

	pub fn is_array(&self) -> bool {
		self.type_key.is_array()
	}
}

impl fmt::Debug for FieldSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FieldSpec")
			.field("name", &self.name)
			.field("type_key", &self.type_key)
			.field("converter", &self.converter.as_ref().map(|c| c.name()))
			.finish()
	}
}

impl ConverterRegistry {
	/// Resolves the converter for a field, honouring its override.
	pub fn resolve(&self, field: &FieldSpec) -> ConverterResult<Arc<dyn Converter>> {
		if let Some(converter) = field.converter_override() {
			return Ok(converter.clone());
		}
		self.lookup(field.type_key())
			.ok_or_else(|| ConverterError::NoConverter(field.type_key().to_string()))
	}

	/// Converts the raw values submitted for `field`.
	///
	/// Array fields convert every value with the element converter and yield a
	/// JSON array. Scalar fields convert the first value only.
	///
	/// # Examples
	///
	/// ```
	/// use serde_json::json;
	/// use stagehand_convert::{ConverterRegistry, FieldSpec};
	///
	/// let registry = ConverterRegistry::with_defaults();
	/// let raw = vec!["1".to_string(), "2".to_string()];
	///
	/// let ids = registry.convert_field(&FieldSpec::of::<Vec<i64>>("ids"), &raw).unwrap();
	/// assert_eq!(ids, json!([1, 2]));
	///
	/// let first = registry.convert_field(&FieldSpec::of::<i64>("id"), &raw).unwrap();
	/// assert_eq!(first, json!(1));
	/// ```
	pub fn convert_field(&self, field: &FieldSpec, raw: &[String]) -> ConverterResult<Value> {
		let converter = self.resolve(field)?;
		let element = field.type_key().element();

		if field.is_array() {
			return raw
				.iter()
				.map(|value| converter.from_raw(value, element))
				.collect::<ConverterResult<Vec<_>>>()
				.map(Value::Array);
		}

		match raw.first() {
			Some(value) => converter.from_raw(value, element),
			None => converter.from_raw("", element),
		}
	}
}
