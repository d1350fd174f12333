//! # Stagehand Convert
//!
//! Type-converter registry used to bind raw request strings onto typed
//! action fields.
//!
//! ## Lookup order
//!
//! ```text
//! [T]  ──strip arrays──▶ T ──primitive→boxed──▶ T'
//!   T' → superclass(T') → … (stops before Object)
//!   interfaces(T') breadth-first → interfaces(superclass(T')) → …
//! ```
//!
//! The registry is assembled once with [`ConverterRegistryBuilder`] and frozen
//! into a [`ConverterRegistry`] that is shared read-only between requests.
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use stagehand_convert::{ConverterRegistry, FieldSpec, ScalarKind, TypeKey};
//!
//! let registry = ConverterRegistry::with_defaults();
//!
//! let value = registry.convert("42", &TypeKey::Primitive(ScalarKind::I32)).unwrap();
//! assert_eq!(value, json!(42));
//!
//! let field = FieldSpec::of::<Vec<bool>>("flags");
//! let bound = registry
//!     .convert_field(&field, &["on".to_string(), "off".to_string()])
//!     .unwrap();
//! assert_eq!(bound, json!([true, false]));
//! ```

pub mod converter;
pub mod field;
pub mod graph;
pub mod registry;
pub mod types;

pub use converter::{
	BooleanConverter, CharConverter, Converter, ConverterError, ConverterResult, DateConverter,
	FloatConverter, IntegerConverter, StringConverter, UuidConverter,
};
pub use field::FieldSpec;
pub use graph::TypeGraph;
pub use registry::{ConverterRegistry, ConverterRegistryBuilder};
pub use types::{ScalarKind, TypeKey, Typed};
