//! Ordered URI parameters.

use indexmap::IndexMap;
use indexmap::map::Iter;

/// Capture name → value pairs in pattern-declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriParameters {
	values: IndexMap<String, String>,
}

impl UriParameters {
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.values.insert(name.into(), value.into());
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.values.get(name).map(String::as_str)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.values.contains_key(name)
	}

	/// Capture names in declaration order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.values.keys().map(String::as_str)
	}

	/// Captured values in declaration order.
	pub fn values(&self) -> impl Iterator<Item = &str> {
		self.values.values().map(String::as_str)
	}

	pub fn iter(&self) -> Iter<'_, String, String> {
		self.values.iter()
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

impl<'a> IntoIterator for &'a UriParameters {
	type Item = (&'a String, &'a String);
	type IntoIter = Iter<'a, String, String>;

	fn into_iter(self) -> Self::IntoIter {
		self.values.iter()
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for UriParameters {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut params = Self::new();
		for (name, value) in iter {
			params.insert(name, value);
		}
		params
	}
}
