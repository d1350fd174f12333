//! Explicit type-relationship table.

use crate::types::TypeKey;
use std::collections::HashMap;

static OBJECT: TypeKey = TypeKey::Object;

#[derive(Debug, Clone, Default)]
struct TypeNode {
	superclass: Option<TypeKey>,
	interfaces: Vec<TypeKey>,
	is_interface: bool,
}

/// Supertype and implemented-interface edges between [`TypeKey`]s.
///
/// Types that were never declared have no interfaces and [`TypeKey::Object`]
/// as their superclass. Interfaces have no superclass; their `extends` edges
/// are stored as interfaces so the breadth-first walk reaches them. Keys are
/// stored the way the registry looks them up: array layers stripped and
/// primitives boxed.
///
/// # Examples
///
/// ```
/// use stagehand_convert::{TypeGraph, TypeKey};
///
/// let mut graph = TypeGraph::new();
/// graph.declare_interface(TypeKey::named("Identifier"), []);
/// graph.declare_class(
///     TypeKey::named("UserId"),
///     Some(TypeKey::named("Id")),
///     [TypeKey::named("Identifier")],
/// );
///
/// assert_eq!(graph.superclass(&TypeKey::named("UserId")), Some(&TypeKey::named("Id")));
/// assert_eq!(graph.superclass(&TypeKey::named("Id")), Some(&TypeKey::Object));
/// assert_eq!(graph.superclass(&TypeKey::Object), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
	nodes: HashMap<TypeKey, TypeNode>,
}

impl TypeGraph {
	pub fn new() -> Self {
		Self::default()
	}

	/// Declares a class with an optional superclass and its directly
	/// implemented interfaces. Redeclaring a type replaces its edges.
	pub fn declare_class(
		&mut self,
		key: TypeKey,
		superclass: Option<TypeKey>,
		interfaces: impl IntoIterator<Item = TypeKey>,
	) -> &mut Self {
		self.nodes.insert(
			canonical(&key),
			TypeNode {
				superclass: superclass.as_ref().map(canonical),
				interfaces: interfaces.into_iter().map(|k| canonical(&k)).collect(),
				is_interface: false,
			},
		);
		self
	}

	/// Declares an interface and the interfaces it extends.
	pub fn declare_interface(
		&mut self,
		key: TypeKey,
		extends: impl IntoIterator<Item = TypeKey>,
	) -> &mut Self {
		self.nodes.insert(
			canonical(&key),
			TypeNode {
				superclass: None,
				interfaces: extends.into_iter().map(|k| canonical(&k)).collect(),
				is_interface: true,
			},
		);
		self
	}

	/// Returns the direct superclass of `key`.
	///
	/// `Object` and interfaces have none; undeclared types extend `Object`.
	pub fn superclass(&self, key: &TypeKey) -> Option<&TypeKey> {
		if key.is_object() {
			return None;
		}
		match self.node(key) {
			Some(node) if node.is_interface => None,
			Some(node) => Some(node.superclass.as_ref().unwrap_or(&OBJECT)),
			None => Some(&OBJECT),
		}
	}

	/// Returns the interfaces directly implemented (or extended) by `key`.
	pub fn interfaces(&self, key: &TypeKey) -> &[TypeKey] {
		self.node(key)
			.map(|node| node.interfaces.as_slice())
			.unwrap_or(&[])
	}

	pub fn is_interface(&self, key: &TypeKey) -> bool {
		self.node(key).is_some_and(|node| node.is_interface)
	}

	pub fn contains(&self, key: &TypeKey) -> bool {
		self.node(key).is_some()
	}

	fn node(&self, key: &TypeKey) -> Option<&TypeNode> {
		match key {
			TypeKey::Named(_) | TypeKey::Boxed(_) | TypeKey::Object => self.nodes.get(key),
			_ => self.nodes.get(&canonical(key)),
		}
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Iterates the superclass chain of `key`, starting with `key` itself and
	/// stopping before `Object`.
	///
	/// A cyclic declaration is cut off at the first repeated type.
	pub fn superclass_chain<'a>(&'a self, key: &'a TypeKey) -> impl Iterator<Item = &'a TypeKey> {
		let mut seen: Vec<&'a TypeKey> = Vec::new();
		let mut current = Some(key);
		std::iter::from_fn(move || {
			let next = current.filter(|k| !k.is_object() && !seen.contains(k))?;
			seen.push(next);
			current = self.superclass(next);
			Some(next)
		})
	}
}

fn canonical(key: &TypeKey) -> TypeKey {
	key.element().normalized()
}
