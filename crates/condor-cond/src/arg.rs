//! Call arguments accepted by the condition builder
//!
//! [`Arg`] is the closed set of argument shapes the dispatcher understands.
//! Strongly typed callers build arguments through the `From` impls (usually
//! via the [`args!`](crate::args) macro); loosely typed callers, such as
//! request handlers holding decoded JSON, go through [`Arg::from_json`].

use bson::{Bson, Document};

use crate::cond::Cond;

/// A single positional argument of a condition call.
///
/// The first argument of a call decides its shape; later arguments are
/// either values (see [`Arg::into_bson`]) or the start of a follow-up call.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
	/// A string: a field token in first position, a value elsewhere
	Str(String),
	/// A boolean: a guard in first position, a value elsewhere
	Bool(bool),
	/// A string-keyed mapping of field tokens to values
	Map(Document),
	/// An ordered list of arguments
	List(Vec<Arg>),
	/// A nested condition builder
	Cond(Cond),
	/// Any other value (numbers, dates, ids, null, ...)
	Value(Bson),
}

impl Arg {
	/// Convert the argument into a BSON value for use on the right-hand side
	/// of a condition.
	///
	/// A nested builder contributes its serialized document.
	pub fn into_bson(self) -> Bson {
		match self {
			Arg::Str(s) => Bson::String(s),
			Arg::Bool(b) => Bson::Boolean(b),
			Arg::Map(document) => Bson::Document(document),
			Arg::List(items) => Bson::Array(items.into_iter().map(Arg::into_bson).collect()),
			Arg::Cond(cond) => Bson::Document(cond.to_bson()),
			Arg::Value(value) => value,
		}
	}

	/// Short name of the argument shape, used in error messages.
	pub fn kind(&self) -> String {
		match self {
			Arg::Str(_) => "string".to_string(),
			Arg::Bool(_) => "bool".to_string(),
			Arg::Map(_) => "map".to_string(),
			Arg::List(_) => "list".to_string(),
			Arg::Cond(_) => "condition".to_string(),
			Arg::Value(value) => format!("{:?}", value.element_type()),
		}
	}

	/// Build an argument from an untyped JSON value.
	///
	/// Objects become maps, arrays become lists, and integers that fit in an
	/// `i64` stay integral.
	///
	/// # Examples
	///
	/// ```
	/// use condor_cond::Arg;
	/// use serde_json::json;
	///
	/// let arg = Arg::from_json(json!({ "age >": 18 }));
	/// assert!(matches!(arg, Arg::Map(_)));
	///
	/// let arg = Arg::from_json(json!(["age", ">", 18]));
	/// assert!(matches!(arg, Arg::List(ref items) if items.len() == 3));
	/// ```
	pub fn from_json(value: serde_json::Value) -> Self {
		match value {
			serde_json::Value::String(s) => Arg::Str(s),
			serde_json::Value::Bool(b) => Arg::Bool(b),
			serde_json::Value::Array(items) => {
				Arg::List(items.into_iter().map(Arg::from_json).collect())
			}
			serde_json::Value::Object(map) => Arg::Map(json_object_to_document(map)),
			other => Arg::Value(json_to_bson(other)),
		}
	}
}

fn json_object_to_document(map: serde_json::Map<String, serde_json::Value>) -> Document {
	map.into_iter()
		.map(|(key, value)| (key, json_to_bson(value)))
		.collect()
}

fn json_to_bson(value: serde_json::Value) -> Bson {
	match value {
		serde_json::Value::Null => Bson::Null,
		serde_json::Value::Bool(b) => Bson::Boolean(b),
		serde_json::Value::Number(n) => match n.as_i64() {
			Some(i) => Bson::Int64(i),
			None => Bson::Double(n.as_f64().unwrap_or(f64::NAN)),
		},
		serde_json::Value::String(s) => Bson::String(s),
		serde_json::Value::Array(items) => Bson::Array(items.into_iter().map(json_to_bson).collect()),
		serde_json::Value::Object(map) => Bson::Document(json_object_to_document(map)),
	}
}

impl From<&str> for Arg {
	fn from(s: &str) -> Self {
		Arg::Str(s.to_string())
	}
}

impl From<String> for Arg {
	fn from(s: String) -> Self {
		Arg::Str(s)
	}
}

impl From<&String> for Arg {
	fn from(s: &String) -> Self {
		Arg::Str(s.clone())
	}
}

impl From<bool> for Arg {
	fn from(b: bool) -> Self {
		Arg::Bool(b)
	}
}

impl From<i32> for Arg {
	fn from(i: i32) -> Self {
		Arg::Value(Bson::Int32(i))
	}
}

impl From<i64> for Arg {
	fn from(i: i64) -> Self {
		Arg::Value(Bson::Int64(i))
	}
}

impl From<f64> for Arg {
	fn from(f: f64) -> Self {
		Arg::Value(Bson::Double(f))
	}
}

impl From<bson::DateTime> for Arg {
	fn from(dt: bson::DateTime) -> Self {
		Arg::Value(Bson::DateTime(dt))
	}
}

impl From<bson::oid::ObjectId> for Arg {
	fn from(oid: bson::oid::ObjectId) -> Self {
		Arg::Value(Bson::ObjectId(oid))
	}
}

impl From<Document> for Arg {
	fn from(document: Document) -> Self {
		Arg::Map(document)
	}
}

impl From<Cond> for Arg {
	fn from(cond: Cond) -> Self {
		Arg::Cond(cond)
	}
}

/// Dynamic BSON values keep their shape: strings stay strings, documents
/// become maps and arrays become lists.
impl From<Bson> for Arg {
	fn from(value: Bson) -> Self {
		match value {
			Bson::String(s) => Arg::Str(s),
			Bson::Boolean(b) => Arg::Bool(b),
			Bson::Document(document) => Arg::Map(document),
			Bson::Array(items) => Arg::List(items.into_iter().map(Arg::from).collect()),
			other => Arg::Value(other),
		}
	}
}

impl<T: Into<Arg>> From<Vec<T>> for Arg {
	fn from(items: Vec<T>) -> Self {
		Arg::List(items.into_iter().map(Into::into).collect())
	}
}

impl<T: Into<Arg>, const N: usize> From<[T; N]> for Arg {
	fn from(items: [T; N]) -> Self {
		Arg::List(items.into_iter().map(Into::into).collect())
	}
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
	fn from(value: Option<T>) -> Self {
		value.map_or(Arg::Value(Bson::Null), Into::into)
	}
}

/// Build a `Vec<Arg>` from heterogeneous values.
///
/// # Examples
///
/// ```
/// use condor_cond::{args, Arg};
/// use bson::doc;
///
/// let call = args!["age", ">", 18];
/// assert_eq!(call.len(), 3);
///
/// let call = args![doc! { "status": "active" }, false];
/// assert!(matches!(call[1], Arg::Bool(false)));
/// ```
#[macro_export]
macro_rules! args {
	() => {
		::std::vec::Vec::<$crate::Arg>::new()
	};
	($($arg:expr),+ $(,)?) => {
		::std::vec![$($crate::Arg::from($arg)),+]
	};
}

#[cfg(test)]
mod tests {
	use super::*;
	use bson::doc;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_into_bson_converts_each_shape() {
		assert_eq!(Arg::from("x").into_bson(), Bson::String("x".into()));
		assert_eq!(Arg::from(true).into_bson(), Bson::Boolean(true));
		assert_eq!(Arg::from(7).into_bson(), Bson::Int32(7));
		assert_eq!(
			Arg::from(vec!["a", "b"]).into_bson(),
			Bson::Array(vec![Bson::String("a".into()), Bson::String("b".into())])
		);
		assert_eq!(
			Arg::from(doc! { "a": 1 }).into_bson(),
			Bson::Document(doc! { "a": 1 })
		);
	}

	#[rstest]
	fn test_bson_keeps_its_shape() {
		assert!(matches!(Arg::from(Bson::String("f".into())), Arg::Str(_)));
		assert!(matches!(Arg::from(Bson::Boolean(false)), Arg::Bool(false)));
		assert!(matches!(Arg::from(Bson::Document(doc! {})), Arg::Map(_)));
		assert!(matches!(Arg::from(Bson::Array(vec![])), Arg::List(_)));
		assert!(matches!(Arg::from(Bson::Null), Arg::Value(Bson::Null)));
	}

	#[rstest]
	fn test_option_none_is_null() {
		let value: Option<i32> = None;
		assert_eq!(Arg::from(value), Arg::Value(Bson::Null));
		assert_eq!(Arg::from(Some(3)), Arg::Value(Bson::Int32(3)));
	}

	#[rstest]
	fn test_from_json_numbers() {
		assert_eq!(Arg::from_json(json!(42)), Arg::Value(Bson::Int64(42)));
		assert_eq!(Arg::from_json(json!(1.5)), Arg::Value(Bson::Double(1.5)));
		assert_eq!(Arg::from_json(json!(null)), Arg::Value(Bson::Null));
	}

	#[rstest]
	fn test_from_json_object_becomes_map() {
		let arg = Arg::from_json(json!({ "age": { "$gte": 18 }, "tags": ["a"] }));
		assert_eq!(
			arg,
			Arg::Map(doc! { "age": { "$gte": 18_i64 }, "tags": ["a"] })
		);
	}

	#[rstest]
	fn test_kind_names_value_type() {
		assert_eq!(Arg::from("f").kind(), "string");
		assert_eq!(Arg::from(1.5).kind(), "Double");
	}

	#[rstest]
	fn test_args_macro() {
		let call = args!["name", "LIKE", "jo"];
		assert_eq!(
			call,
			vec![
				Arg::Str("name".into()),
				Arg::Str("LIKE".into()),
				Arg::Str("jo".into()),
			]
		);
		assert!(args![].is_empty());
	}
}
