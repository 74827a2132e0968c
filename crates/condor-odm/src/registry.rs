//! Collection-name registry
//!
//! Maps Rust model types to collection names. A registry is an ordinary
//! value owned by a [`crate::Database`] handle, so independent handles never
//! share names.
//!
//! - Thread-safe access with `parking_lot::RwLock`
//! - Explicit names via [`CollectionRegistry::register`]
//! - Derived names (`OrderItem` -> `order_items`), cached on first use

use parking_lot::RwLock;
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use tracing::{trace, warn};

use crate::error::{OdmError, OdmResult};

/// A type stored in a collection.
///
/// # Example
///
/// ```rust
/// use condor_odm::{CollectionRegistry, Model};
///
/// struct OrderItem;
/// impl Model for OrderItem {}
///
/// struct Person;
/// impl Model for Person {
/// 	const COLLECTION: Option<&'static str> = Some("people");
/// }
///
/// let registry = CollectionRegistry::new();
/// assert_eq!(registry.resolve::<OrderItem>(), "order_items");
/// assert_eq!(registry.resolve::<Person>(), "people");
/// ```
pub trait Model: 'static {
	/// Collection name; derived from the type name when `None`.
	const COLLECTION: Option<&'static str> = None;
}

#[derive(Debug, Default)]
pub struct CollectionRegistry {
	names: RwLock<HashMap<TypeId, String>>,
}

impl CollectionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Bind `T` to `name`, replacing any previous binding.
	pub fn register<T: 'static>(&self, name: impl Into<String>) {
		let name = name.into();
		let previous = self.names.write().insert(TypeId::of::<T>(), name.clone());
		if let Some(previous) = previous
			&& previous != name
		{
			warn!(
				model = type_name::<T>(),
				previous = %previous,
				collection = %name,
				"collection name overridden"
			);
		}
	}

	/// Registered name of `T`, without any fallback.
	pub fn get<T: 'static>(&self) -> OdmResult<String> {
		self.names
			.read()
			.get(&TypeId::of::<T>())
			.cloned()
			.ok_or_else(|| OdmError::NotRegistered(type_name::<T>().to_string()))
	}

	/// Collection name of `T`: a registered name, then `T::COLLECTION`, then
	/// the snake_case plural of the type name. The result is cached.
	pub fn resolve<T: Model>(&self) -> String {
		let key = TypeId::of::<T>();
		if let Some(name) = self.names.read().get(&key) {
			return name.clone();
		}

		let name = match T::COLLECTION {
			Some(name) => name.to_string(),
			None => collection_name_for(type_name::<T>()),
		};
		trace!(model = type_name::<T>(), collection = %name, "collection name resolved");
		self.names.write().entry(key).or_insert(name).clone()
	}

	pub fn contains<T: 'static>(&self) -> bool {
		self.names.read().contains_key(&TypeId::of::<T>())
	}

	pub fn len(&self) -> usize {
		self.names.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.names.read().is_empty()
	}

	/// Forget every registered and cached name.
	pub fn clear(&self) {
		self.names.write().clear();
	}
}

/// Derive a collection name from a Rust type path.
///
/// The last path segment is converted to snake_case and pluralized.
pub fn collection_name_for(type_path: &str) -> String {
	let base = type_path.split('<').next().unwrap_or(type_path);
	let ident = base.rsplit("::").next().unwrap_or(base);
	pluralize(&to_snake_case(ident))
}

fn to_snake_case(ident: &str) -> String {
	let chars: Vec<char> = ident.chars().collect();
	let mut out = String::with_capacity(ident.len() + 4);

	for (i, &c) in chars.iter().enumerate() {
		if c.is_uppercase() {
			let prev = i.checked_sub(1).map(|p| chars[p]);
			let next = chars.get(i + 1).copied();
			let boundary = match prev {
				Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
				Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
				_ => false,
			};
			if boundary && !out.ends_with('_') {
				out.push('_');
			}
			out.extend(c.to_lowercase());
		} else {
			out.push(c);
		}
	}
	out
}

fn pluralize(word: &str) -> String {
	const SIBILANTS: [&str; 5] = ["s", "x", "z", "ch", "sh"];

	if let Some(stem) = word.strip_suffix('y')
		&& stem
			.chars()
			.last()
			.is_some_and(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
	{
		return format!("{}ies", stem);
	}
	if SIBILANTS.iter().any(|suffix| word.ends_with(suffix)) {
		return format!("{}es", word);
	}
	format!("{}s", word)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	struct User;
	impl Model for User {}

	struct Category;
	impl Model for Category {}

	struct Audit;
	impl Model for Audit {
		const COLLECTION: Option<&'static str> = Some("audit_log");
	}

	#[rstest]
	#[case("User", "users")]
	#[case("OrderItem", "order_items")]
	#[case("Category", "categories")]
	#[case("Key", "keys")]
	#[case("Address", "addresses")]
	#[case("Box", "boxes")]
	#[case("Branch", "branches")]
	#[case("HTTPRequest", "http_requests")]
	#[case("my_app::models::BlogPost", "blog_posts")]
	#[case("Wrapper<my_app::Inner>", "wrappers")]
	fn test_collection_name_for(#[case] type_path: &str, #[case] expected: &str) {
		assert_eq!(collection_name_for(type_path), expected);
	}

	#[rstest]
	fn test_resolve_derives_and_caches() {
		let registry = CollectionRegistry::new();
		assert!(!registry.contains::<Category>());

		assert_eq!(registry.resolve::<Category>(), "categories");
		assert!(registry.contains::<Category>());
		assert_eq!(registry.len(), 1);
	}

	#[rstest]
	fn test_resolve_prefers_constant() {
		let registry = CollectionRegistry::new();
		assert_eq!(registry.resolve::<Audit>(), "audit_log");
	}

	#[rstest]
	fn test_register_overrides_derived_name() {
		let registry = CollectionRegistry::new();
		assert_eq!(registry.resolve::<User>(), "users");

		registry.register::<User>("accounts");
		assert_eq!(registry.resolve::<User>(), "accounts");
		assert_eq!(registry.get::<User>().unwrap(), "accounts");
	}

	#[rstest]
	fn test_get_unregistered() {
		let registry = CollectionRegistry::new();
		assert!(matches!(
			registry.get::<User>(),
			Err(OdmError::NotRegistered(_))
		));
	}

	#[rstest]
	fn test_clear() {
		let registry = CollectionRegistry::new();
		registry.register::<User>("accounts");
		registry.clear();

		assert!(registry.is_empty());
		assert_eq!(registry.resolve::<User>(), "users");
	}
}
