//! The fluent condition builder

use bson::{Bson, Document};

use crate::arg::Arg;
use crate::dispatch::{dispatch, group};
use crate::error::CondResult;
use crate::operator::Operator;
use crate::tree::{Combine, ConditionTree};

/// Dynamic condition builder producing a MongoDB filter document.
///
/// Every method consumes the builder and hands it back, so calls chain with
/// `?`. Arguments are classified by shape; see [`Cond::filter`].
///
/// # Examples
///
/// ```
/// use condor_cond::{args, Cond};
/// use bson::doc;
///
/// let cond = Cond::new()
/// 	.filter(args!["age >=", 18])?
/// 	.like("name", "jo")?
/// 	.in_("role", vec!["admin", "user"])?;
///
/// assert_eq!(
/// 	cond.to_bson(),
/// 	doc! {
/// 		"age": { "$gte": 18 },
/// 		"name": { "$regex": ".*jo.*", "$options": "i" },
/// 		"role": { "$in": ["admin", "user"] },
/// 	}
/// );
/// # Ok::<(), condor_cond::CondError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cond {
	tree: ConditionTree,
}

impl Cond {
	/// Create an empty AND builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Create an empty OR builder, whose top-level elements become `$or`
	/// alternatives.
	pub fn any() -> Self {
		Self::with_mode(Combine::Or)
	}

	/// Create an empty builder with an explicit combination mode.
	pub fn with_mode(mode: Combine) -> Self {
		Self {
			tree: ConditionTree::new(mode),
		}
	}

	/// Build a condition from decoded JSON, which is dispatched like a single
	/// argument (an object is a map, an array a call).
	///
	/// # Examples
	///
	/// ```
	/// use condor_cond::Cond;
	/// use bson::doc;
	/// use serde_json::json;
	///
	/// let cond = Cond::from_json(json!({ "age >": 18, "status": "active" }))?;
	/// assert_eq!(cond.to_bson(), doc! { "age": { "$gt": 18_i64 }, "status": "active" });
	/// # Ok::<(), condor_cond::CondError>(())
	/// ```
	pub fn from_json(value: serde_json::Value) -> CondResult<Self> {
		Self::new().filter(vec![Arg::from_json(value)])
	}

	/// Add conditions in any accepted call shape.
	///
	/// - `[cond, ..]`: a nested builder, embedded when non-empty
	/// - `[bool, ..]`: a guard; `false` discards the whole builder
	/// - `[field]`, `[field, value]`, `[field, operator, value]`
	/// - `[map, ..]`: one condition per entry, keys may embed an operator
	/// - `[list, ..]`: a flattened call, or independent items
	///
	/// # Examples
	///
	/// ```
	/// use condor_cond::{args, Cond};
	/// use bson::doc;
	///
	/// let cond = Cond::new()
	/// 	.filter(args![doc! { "age >=": 18, "status": "active" }])?
	/// 	.filter(args!["name", "!=", "root"])?;
	/// assert_eq!(
	/// 	cond.to_bson(),
	/// 	doc! { "age": { "$gte": 18 }, "status": "active", "name": { "$ne": "root" } }
	/// );
	///
	/// let skipped = Cond::new().filter(args![false, "age", 18])?;
	/// assert!(skipped.is_skipped());
	/// assert!(skipped.to_bson().is_empty());
	/// # Ok::<(), condor_cond::CondError>(())
	/// ```
	pub fn filter(mut self, args: Vec<Arg>) -> CondResult<Self> {
		dispatch(&mut self.tree, args)?;
		Ok(self)
	}

	/// Add a `$or` group built from `args`.
	///
	/// Nothing is added when the group resolves to an empty document.
	///
	/// # Examples
	///
	/// ```
	/// use condor_cond::{args, Cond};
	/// use bson::doc;
	///
	/// let cond = Cond::new()
	/// 	.equal("kind", "post")?
	/// 	.or(args![doc! { "draft": false, "owner": "me" }])?;
	/// assert_eq!(
	/// 	cond.to_bson(),
	/// 	doc! { "kind": "post", "$or": [{ "draft": false }, { "owner": "me" }] }
	/// );
	/// # Ok::<(), condor_cond::CondError>(())
	/// ```
	pub fn or(mut self, args: Vec<Arg>) -> CondResult<Self> {
		group(&mut self.tree, Combine::Or, args)?;
		Ok(self)
	}

	/// Add an AND group built from `args`.
	///
	/// Inside an OR builder this yields one alternative made of several
	/// conditions.
	pub fn and(mut self, args: Vec<Arg>) -> CondResult<Self> {
		group(&mut self.tree, Combine::And, args)?;
		Ok(self)
	}

	/// `{field: value}`
	pub fn equal(self, field: &str, value: impl Into<Bson>) -> CondResult<Self> {
		self.explicit(field, Operator::Eq, value.into())
	}

	/// `{field: {"$ne": value}}`
	pub fn ne(self, field: &str, value: impl Into<Bson>) -> CondResult<Self> {
		self.explicit(field, Operator::Ne, value.into())
	}

	/// `{field: {"$gt": value}}`
	pub fn gt(self, field: &str, value: impl Into<Bson>) -> CondResult<Self> {
		self.explicit(field, Operator::Gt, value.into())
	}

	/// `{field: {"$gte": value}}`
	pub fn gte(self, field: &str, value: impl Into<Bson>) -> CondResult<Self> {
		self.explicit(field, Operator::Gte, value.into())
	}

	/// `{field: {"$lt": value}}`
	pub fn lt(self, field: &str, value: impl Into<Bson>) -> CondResult<Self> {
		self.explicit(field, Operator::Lt, value.into())
	}

	/// `{field: {"$lte": value}}`
	pub fn lte(self, field: &str, value: impl Into<Bson>) -> CondResult<Self> {
		self.explicit(field, Operator::Lte, value.into())
	}

	/// `{field: {"$in": values}}`; a scalar is wrapped into a one-element list.
	pub fn in_(self, field: &str, values: impl Into<Bson>) -> CondResult<Self> {
		self.explicit(field, Operator::In, values.into())
	}

	/// `{field: {"$nin": values}}`; a scalar is wrapped into a one-element list.
	pub fn not_in(self, field: &str, values: impl Into<Bson>) -> CondResult<Self> {
		self.explicit(field, Operator::NotIn, values.into())
	}

	/// `{field: {"$gte": lower, "$lte": upper}}`
	pub fn between(
		self,
		field: &str,
		lower: impl Into<Bson>,
		upper: impl Into<Bson>,
	) -> CondResult<Self> {
		let bounds = Bson::Array(vec![lower.into(), upper.into()]);
		self.explicit(field, Operator::Between, bounds)
	}

	/// `{field: {"$not": {"$gte": lower, "$lte": upper}}}`
	pub fn not_between(
		self,
		field: &str,
		lower: impl Into<Bson>,
		upper: impl Into<Bson>,
	) -> CondResult<Self> {
		let bounds = Bson::Array(vec![lower.into(), upper.into()]);
		self.explicit(field, Operator::NotBetween, bounds)
	}

	/// Case-insensitive substring match.
	pub fn like(self, field: &str, pattern: &str) -> CondResult<Self> {
		self.explicit(field, Operator::Like, Bson::String(pattern.to_string()))
	}

	/// Case-insensitive prefix match.
	pub fn left_like(self, field: &str, pattern: &str) -> CondResult<Self> {
		self.explicit(field, Operator::LeftLike, Bson::String(pattern.to_string()))
	}

	/// Case-insensitive suffix match.
	pub fn right_like(self, field: &str, pattern: &str) -> CondResult<Self> {
		self.explicit(field, Operator::RightLike, Bson::String(pattern.to_string()))
	}

	/// Negated [`Cond::like`].
	pub fn not_like(self, field: &str, pattern: &str) -> CondResult<Self> {
		self.explicit(field, Operator::NotLike, Bson::String(pattern.to_string()))
	}

	/// Negated [`Cond::left_like`].
	pub fn not_left_like(self, field: &str, pattern: &str) -> CondResult<Self> {
		self.explicit(
			field,
			Operator::NotLeftLike,
			Bson::String(pattern.to_string()),
		)
	}

	/// Negated [`Cond::right_like`].
	pub fn not_right_like(self, field: &str, pattern: &str) -> CondResult<Self> {
		self.explicit(
			field,
			Operator::NotRightLike,
			Bson::String(pattern.to_string()),
		)
	}

	/// Serialize into a filter document.
	///
	/// An empty or skipped builder yields an empty document.
	pub fn to_bson(&self) -> Document {
		self.tree.to_document()
	}

	/// Whether no condition was added.
	pub fn is_empty(&self) -> bool {
		self.tree.is_empty()
	}

	/// Whether a `false` guard discarded this builder.
	pub fn is_skipped(&self) -> bool {
		self.tree.is_skipped()
	}

	/// Number of top-level elements.
	pub fn len(&self) -> usize {
		self.tree.len()
	}

	/// The underlying tree.
	pub fn tree(&self) -> &ConditionTree {
		&self.tree
	}

	fn explicit(self, field: &str, operator: Operator, value: Bson) -> CondResult<Self> {
		self.filter(vec![
			Arg::from(field),
			Arg::Str(operator.to_string()),
			Arg::Value(value),
		])
	}
}

impl From<Cond> for Document {
	fn from(cond: Cond) -> Self {
		cond.to_bson()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::args;
	use crate::error::CondError;
	use bson::doc;
	use rstest::rstest;

	#[rstest]
	fn test_new_is_empty() {
		let cond = Cond::new();
		assert!(cond.is_empty());
		assert!(!cond.is_skipped());
		assert_eq!(cond.len(), 0);
		assert_eq!(cond.to_bson(), Document::new());
	}

	#[rstest]
	fn test_comparison_methods() {
		let cond = Cond::new()
			.ne("a", 1)
			.unwrap()
			.gt("b", 2)
			.unwrap()
			.gte("c", 3)
			.unwrap()
			.lt("d", 4)
			.unwrap()
			.lte("e", 5)
			.unwrap();
		assert_eq!(
			cond.to_bson(),
			doc! {
				"a": { "$ne": 1 },
				"b": { "$gt": 2 },
				"c": { "$gte": 3 },
				"d": { "$lt": 4 },
				"e": { "$lte": 5 },
			}
		);
	}

	#[rstest]
	fn test_like_family() {
		let cond = Cond::any()
			.left_like("a", "x")
			.unwrap()
			.right_like("b", "y")
			.unwrap()
			.not_like("c", "z")
			.unwrap();
		assert_eq!(
			cond.to_bson(),
			doc! { "$or": [
				{ "a": { "$regex": "^x.*", "$options": "i" } },
				{ "b": { "$regex": ".*y$", "$options": "i" } },
				{ "c": { "$not": { "$regex": ".*z.*", "$options": "i" } } },
			] }
		);
	}

	#[rstest]
	fn test_like_pattern_is_escaped() {
		let cond = Cond::new().like("email", "a.b+c").unwrap();
		assert_eq!(
			cond.to_bson(),
			doc! { "email": { "$regex": r".*a\.b\+c.*", "$options": "i" } }
		);
	}

	#[rstest]
	fn test_not_in_wraps_scalar() {
		let cond = Cond::new().not_in("role", "guest").unwrap();
		assert_eq!(cond.to_bson(), doc! { "role": { "$nin": ["guest"] } });
	}

	#[rstest]
	fn test_equal_rejects_empty_field() {
		assert_eq!(Cond::new().equal("", 1).unwrap_err(), CondError::EmptyField);
	}

	#[rstest]
	fn test_or_and_inside_any() {
		let cond = Cond::any()
			.and(args![doc! { "a": 1, "b": 2 }])
			.unwrap()
			.equal("c", 3)
			.unwrap();
		assert_eq!(
			cond.to_bson(),
			doc! { "$or": [{ "a": 1, "b": 2 }, { "c": 3 }] }
		);
	}

	#[rstest]
	fn test_second_or_group_replaces_first() {
		let cond = Cond::new()
			.equal("kind", "post")
			.unwrap()
			.or(args![doc! { "a": 1, "b": 2 }])
			.unwrap()
			.or(args![doc! { "c": 3, "d": 4 }])
			.unwrap();
		assert_eq!(cond.len(), 3);
		assert_eq!(
			cond.to_bson(),
			doc! { "kind": "post", "$or": [{ "c": 3 }, { "d": 4 }] }
		);
	}

	#[rstest]
	fn test_empty_or_group_adds_nothing() {
		let cond = Cond::new().or(args![]).unwrap();
		assert!(cond.is_empty());
	}

	#[rstest]
	fn test_nested_cond_argument() {
		let inner = Cond::any().equal("a", 1).unwrap().equal("b", 2).unwrap();
		let cond = Cond::new()
			.filter(args![inner, "c", 3])
			.unwrap()
			.filter(args![Cond::new()])
			.unwrap();
		assert_eq!(cond.len(), 2);
		assert_eq!(
			cond.to_bson(),
			doc! { "$or": [{ "a": 1 }, { "b": 2 }], "c": 3 }
		);
	}

	#[rstest]
	fn test_from_json_list_call() {
		let cond = Cond::from_json(serde_json::json!(["name", "like", "ann"])).unwrap();
		assert_eq!(
			cond.to_bson(),
			doc! { "name": { "$regex": ".*ann.*", "$options": "i" } }
		);
	}

	#[rstest]
	fn test_into_document() {
		let document: Document = Cond::new().equal("a", 1).unwrap().into();
		assert_eq!(document, doc! { "a": 1 });
	}
}
