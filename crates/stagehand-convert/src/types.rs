//! Type keys used to address converters.
//!
//! The registry never reflects over values. Every bindable type is described
//! by a [`TypeKey`], and relationships between named types live in an explicit
//! [`TypeGraph`](crate::TypeGraph).

use std::borrow::Cow;
use std::fmt;

/// Scalar kinds that exist both as a primitive and as a nullable boxed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarKind {
	Bool,
	I8,
	I16,
	I32,
	I64,
	U8,
	U16,
	U32,
	U64,
	F32,
	F64,
	Char,
}

impl ScalarKind {
	pub fn name(&self) -> &'static str {
		match self {
			Self::Bool => "bool",
			Self::I8 => "i8",
			Self::I16 => "i16",
			Self::I32 => "i32",
			Self::I64 => "i64",
			Self::U8 => "u8",
			Self::U16 => "u16",
			Self::U32 => "u32",
			Self::U64 => "u64",
			Self::F32 => "f32",
			Self::F64 => "f64",
			Self::Char => "char",
		}
	}

	/// Inclusive integer range of this kind, or `None` for non-integer kinds.
	pub fn integer_range(&self) -> Option<(i128, i128)> {
		let range = match self {
			Self::I8 => (i8::MIN as i128, i8::MAX as i128),
			Self::I16 => (i16::MIN as i128, i16::MAX as i128),
			Self::I32 => (i32::MIN as i128, i32::MAX as i128),
			Self::I64 => (i64::MIN as i128, i64::MAX as i128),
			Self::U8 => (0, u8::MAX as i128),
			Self::U16 => (0, u16::MAX as i128),
			Self::U32 => (0, u32::MAX as i128),
			Self::U64 => (0, u64::MAX as i128),
			_ => return None,
		};
		Some(range)
	}

	pub fn is_integer(&self) -> bool {
		self.integer_range().is_some()
	}

	pub fn is_float(&self) -> bool {
		matches!(self, Self::F32 | Self::F64)
	}
}

impl fmt::Display for ScalarKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Identifies a bindable type.
///
/// - `Primitive` and `Boxed` are the non-nullable and nullable forms of a
///   scalar. Both resolve to the same converter.
/// - `Named` covers every other type (strings, identifiers, user types and
///   interfaces declared in a [`TypeGraph`](crate::TypeGraph)).
/// - `Array` wraps a component type; arrays share their component's converter.
/// - `Object` is the root of every superclass chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeKey {
	Object,
	Primitive(ScalarKind),
	Boxed(ScalarKind),
	Named(Cow<'static, str>),
	Array(Box<TypeKey>),
}

impl TypeKey {
	pub const STRING: TypeKey = TypeKey::Named(Cow::Borrowed("string"));
	pub const UUID: TypeKey = TypeKey::Named(Cow::Borrowed("uuid"));
	pub const DATE: TypeKey = TypeKey::Named(Cow::Borrowed("date"));

	/// Creates a named type key.
	///
	/// # Examples
	///
	/// ```
	/// use stagehand_convert::TypeKey;
	///
	/// let key = TypeKey::named("app::UserId");
	/// assert_eq!(key.to_string(), "app::UserId");
	/// ```
	pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
		Self::Named(name.into())
	}

	pub fn array_of(component: TypeKey) -> Self {
		Self::Array(Box::new(component))
	}

	/// Returns the key for a Rust type implementing [`Typed`].
	pub fn of<T: Typed + ?Sized>() -> Self {
		T::type_key()
	}

	pub fn is_object(&self) -> bool {
		matches!(self, Self::Object)
	}

	pub fn is_array(&self) -> bool {
		matches!(self, Self::Array(_))
	}

	/// Returns whether this key accepts an absent value.
	pub fn is_nullable(&self) -> bool {
		!matches!(self, Self::Primitive(_))
	}

	pub fn scalar_kind(&self) -> Option<ScalarKind> {
		match self {
			Self::Primitive(kind) | Self::Boxed(kind) => Some(*kind),
			_ => None,
		}
	}

	/// Strips every array layer and returns the innermost component.
	pub fn element(&self) -> &TypeKey {
		let mut current = self;
		while let Self::Array(component) = current {
			current = component;
		}
		current
	}

	/// Maps primitive scalars onto their boxed form; other keys are unchanged.
	///
	/// ```
	/// use stagehand_convert::{ScalarKind, TypeKey};
	///
	/// assert_eq!(
	///     TypeKey::Primitive(ScalarKind::I32).normalized(),
	///     TypeKey::Boxed(ScalarKind::I32)
	/// );
	/// assert_eq!(TypeKey::STRING.normalized(), TypeKey::STRING);
	/// ```
	pub fn normalized(&self) -> TypeKey {
		match self {
			Self::Primitive(kind) => Self::Boxed(*kind),
			other => other.clone(),
		}
	}
}

impl fmt::Display for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Object => f.write_str("object"),
			Self::Primitive(kind) => write!(f, "{}", kind),
			Self::Boxed(kind) => write!(f, "Option<{}>", kind),
			Self::Named(name) => f.write_str(name),
			Self::Array(component) => write!(f, "[{}]", component),
		}
	}
}

/// Rust types with a known [`TypeKey`].
pub trait Typed {
	fn type_key() -> TypeKey;
}

macro_rules! impl_typed_for_scalar {
	($($ty:ty => $kind:ident),* $(,)?) => {
		$(
			impl Typed for $ty {
				fn type_key() -> TypeKey {
					TypeKey::Primitive(ScalarKind::$kind)
				}
			}
		)*
	};
}

impl_typed_for_scalar! {
	bool => Bool,
	i8 => I8,
	i16 => I16,
	i32 => I32,
	i64 => I64,
	u8 => U8,
	u16 => U16,
	u32 => U32,
	u64 => U64,
	f32 => F32,
	f64 => F64,
	char => Char,
}

impl Typed for String {
	fn type_key() -> TypeKey {
		TypeKey::STRING
	}
}

impl Typed for str {
	fn type_key() -> TypeKey {
		TypeKey::STRING
	}
}

impl Typed for uuid::Uuid {
	fn type_key() -> TypeKey {
		TypeKey::UUID
	}
}

impl Typed for chrono::NaiveDate {
	fn type_key() -> TypeKey {
		TypeKey::DATE
	}
}

// `Option<scalar>` is the nullable boxed form.
impl<T: Typed> Typed for Option<T> {
	fn type_key() -> TypeKey {
		match T::type_key() {
			TypeKey::Primitive(kind) => TypeKey::Boxed(kind),
			other => other,
		}
	}
}

impl<T: Typed> Typed for Vec<T> {
	fn type_key() -> TypeKey {
		TypeKey::array_of(T::type_key())
	}
}

impl<T: Typed> Typed for [T] {
	fn type_key() -> TypeKey {
		TypeKey::array_of(T::type_key())
	}
}

impl<T: Typed, const N: usize> Typed for [T; N] {
	fn type_key() -> TypeKey {
		TypeKey::array_of(T::type_key())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_option_of_scalar_is_boxed() {
		assert_eq!(
			TypeKey::of::<Option<i64>>(),
			TypeKey::Boxed(ScalarKind::I64)
		);
		assert_eq!(TypeKey::of::<Option<String>>(), TypeKey::STRING);
	}

	#[rstest]
	fn test_arrays_wrap_component() {
		let key = TypeKey::of::<Vec<Vec<u8>>>();
		assert!(key.is_array());
		assert_eq!(key.element(), &TypeKey::Primitive(ScalarKind::U8));
		assert_eq!(key.to_string(), "[[u8]]");
		assert_eq!(TypeKey::of::<[i32; 4]>(), TypeKey::of::<[i32]>());
	}

	#[rstest]
	#[case(ScalarKind::I8, Some((-128, 127)))]
	#[case(ScalarKind::U16, Some((0, 65535)))]
	#[case(ScalarKind::F64, None)]
	#[case(ScalarKind::Char, None)]
	fn test_integer_range(#[case] kind: ScalarKind, #[case] expected: Option<(i128, i128)>) {
		assert_eq!(kind.integer_range(), expected);
	}

	#[rstest]
	fn test_nullability() {
		assert!(!TypeKey::Primitive(ScalarKind::Bool).is_nullable());
		assert!(TypeKey::Boxed(ScalarKind::Bool).is_nullable());
		assert!(TypeKey::STRING.is_nullable());
	}
}
