//! Converter registry with hierarchical fallback.

use crate::converter::{
	BooleanConverter, CharConverter, Converter, ConverterError, ConverterResult, DateConverter,
	FloatConverter, IntegerConverter, StringConverter, UuidConverter,
};
use crate::graph::TypeGraph;
use crate::types::{ScalarKind, TypeKey, Typed};
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Mutable boot-time builder for a [`ConverterRegistry`].
///
/// # Examples
///
/// ```
/// use stagehand_convert::{ConverterRegistryBuilder, IntegerConverter, ScalarKind, TypeKey};
/// use std::sync::Arc;
///
/// let registry = ConverterRegistryBuilder::new()
///     .register(TypeKey::Boxed(ScalarKind::I32), Arc::new(IntegerConverter))
///     .build();
///
/// assert!(registry.lookup(&TypeKey::Primitive(ScalarKind::I32)).is_some());
/// assert!(registry.lookup(&TypeKey::STRING).is_none());
/// ```
#[derive(Default)]
pub struct ConverterRegistryBuilder {
	converters: HashMap<TypeKey, Arc<dyn Converter>>,
	types: TypeGraph,
}

impl ConverterRegistryBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a builder pre-populated with the built-in converters.
	///
	/// Every scalar kind, `string`, `uuid` and `date` are covered. Integer
	/// kinds share one converter instance, as do the float kinds.
	pub fn with_defaults() -> Self {
		let integer: Arc<dyn Converter> = Arc::new(IntegerConverter);
		let float: Arc<dyn Converter> = Arc::new(FloatConverter);

		let mut builder = Self::new();
		for kind in [
			ScalarKind::I8,
			ScalarKind::I16,
			ScalarKind::I32,
			ScalarKind::I64,
			ScalarKind::U8,
			ScalarKind::U16,
			ScalarKind::U32,
			ScalarKind::U64,
		] {
			builder = builder.register(TypeKey::Boxed(kind), integer.clone());
		}
		builder
			.register(TypeKey::Boxed(ScalarKind::F32), float.clone())
			.register(TypeKey::Boxed(ScalarKind::F64), float)
			.register(TypeKey::Boxed(ScalarKind::Bool), Arc::new(BooleanConverter))
			.register(TypeKey::Boxed(ScalarKind::Char), Arc::new(CharConverter))
			.register(TypeKey::STRING, Arc::new(StringConverter))
			.register(TypeKey::UUID, Arc::new(UuidConverter))
			.register(TypeKey::DATE, Arc::new(DateConverter::new()))
	}

	/// Binds `converter` to `key`, replacing any previous binding.
	///
	/// Primitive keys are stored under their boxed form and array keys under
	/// their element type, matching how lookups are normalised.
	pub fn register(mut self, key: TypeKey, converter: Arc<dyn Converter>) -> Self {
		let key = key.element().normalized();
		if let Some(previous) = self.converters.insert(key.clone(), converter) {
			tracing::debug!(
				target_type = %key,
				previous = previous.name(),
				"converter binding replaced"
			);
		}
		self
	}

	pub fn register_for<T: Typed + ?Sized>(self, converter: Arc<dyn Converter>) -> Self {
		self.register(T::type_key(), converter)
	}

	/// Replaces the type-relationship table used for hierarchical lookup.
	pub fn types(mut self, types: TypeGraph) -> Self {
		self.types = types;
		self
	}

	pub fn declare_class(
		mut self,
		key: TypeKey,
		superclass: Option<TypeKey>,
		interfaces: impl IntoIterator<Item = TypeKey>,
	) -> Self {
		self.types.declare_class(key, superclass, interfaces);
		self
	}

	pub fn declare_interface(
		mut self,
		key: TypeKey,
		extends: impl IntoIterator<Item = TypeKey>,
	) -> Self {
		self.types.declare_interface(key, extends);
		self
	}

	/// Freezes the registry. The result is read-only and can be shared across
	/// requests without locking.
	pub fn build(self) -> ConverterRegistry {
		tracing::debug!(
			converters = self.converters.len(),
			types = self.types.len(),
			"converter registry frozen"
		);
		ConverterRegistry {
			converters: self.converters,
			types: self.types,
		}
	}
}

/// Frozen map from type to converter.
pub struct ConverterRegistry {
	converters: HashMap<TypeKey, Arc<dyn Converter>>,
	types: TypeGraph,
}

impl ConverterRegistry {
	pub fn builder() -> ConverterRegistryBuilder {
		ConverterRegistryBuilder::new()
	}

	/// Registry holding only the built-in converters.
	pub fn with_defaults() -> Self {
		ConverterRegistryBuilder::with_defaults().build()
	}

	/// Finds the converter for `key`.
	///
	/// 1. Array layers are stripped; primitives are looked up as their boxed
	///    form.
	/// 2. The superclass chain is walked from `key` upwards, stopping before
	///    `Object`.
	/// 3. The interface graph is walked breadth-first, starting from the
	///    interfaces of `key`. Each time the frontier empties, the interfaces
	///    of the next superclass level are added, until `Object` is reached.
	///
	/// # Examples
	///
	/// ```
	/// use stagehand_convert::{ConverterRegistry, ScalarKind, TypeKey};
	/// use std::sync::Arc;
	///
	/// let registry = ConverterRegistry::with_defaults();
	/// let primitive = registry.lookup(&TypeKey::Primitive(ScalarKind::I32)).unwrap();
	/// let boxed = registry.lookup(&TypeKey::Boxed(ScalarKind::I32)).unwrap();
	/// let array = registry
	///     .lookup(&TypeKey::array_of(TypeKey::Primitive(ScalarKind::I32)))
	///     .unwrap();
	///
	/// assert!(Arc::ptr_eq(&primitive, &boxed));
	/// assert!(Arc::ptr_eq(&primitive, &array));
	/// ```
	pub fn lookup(&self, key: &TypeKey) -> Option<Arc<dyn Converter>> {
		let target = key.element().normalized();

		for level in self.types.superclass_chain(&target) {
			if let Some(converter) = self.converters.get(level) {
				return Some(converter.clone());
			}
		}

		let found = self.lookup_interfaces(&target);
		if found.is_none() {
			tracing::trace!(target_type = %key, "no converter found in type hierarchy");
		}
		found
	}

	fn lookup_interfaces(&self, target: &TypeKey) -> Option<Arc<dyn Converter>> {
		let mut visited: HashSet<&TypeKey> = HashSet::new();
		let mut frontier: VecDeque<&TypeKey> = VecDeque::new();

		for level in self.types.superclass_chain(target) {
			frontier.extend(self.types.interfaces(level));

			while let Some(interface) = frontier.pop_front() {
				if !visited.insert(interface) {
					continue;
				}
				if let Some(converter) = self.converters.get(interface) {
					return Some(converter.clone());
				}
				frontier.extend(self.types.interfaces(interface));
			}
		}

		None
	}

	pub fn lookup_for<T: Typed + ?Sized>(&self) -> Option<Arc<dyn Converter>> {
		self.lookup(&T::type_key())
	}

	/// Converts one raw value to the element type of `key`.
	pub fn convert(&self, raw: &str, key: &TypeKey) -> ConverterResult<Value> {
		let converter = self
			.lookup(key)
			.ok_or_else(|| ConverterError::NoConverter(key.to_string()))?;
		converter.from_raw(raw, key.element())
	}

	/// Formats a typed value back into its raw form.
	pub fn to_raw(&self, value: &Value, key: &TypeKey) -> ConverterResult<String> {
		let converter = self
			.lookup(key)
			.ok_or_else(|| ConverterError::NoConverter(key.to_string()))?;
		converter.to_raw(value, key.element())
	}

	/// Type keys with a direct binding, sorted for stable diagnostics output.
	pub fn registered_types(&self) -> Vec<&TypeKey> {
		let mut keys: Vec<_> = self.converters.keys().collect();
		keys.sort();
		keys
	}

	pub fn type_graph(&self) -> &TypeGraph {
		&self.types
	}

	pub fn len(&self) -> usize {
		self.converters.len()
	}

	pub fn is_empty(&self) -> bool {
		self.converters.is_empty()
	}
}

impl std::fmt::Debug for ConverterRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConverterRegistry")
			.field("types", &self.registered_types())
			.finish()
	}
}
