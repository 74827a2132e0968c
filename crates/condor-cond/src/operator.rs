//! Operator vocabulary and the embedded-operator field syntax
//!
//! A field token may carry its operator after the field path, as in
//! `"age >"` or `"name NOT LIKE"`. [`get_op`] splits such a token, and
//! [`Operator::from_token`] maps the operator string onto the fixed
//! vocabulary understood by the serializer.

use std::fmt;

use bson::{Bson, doc};

use crate::error::{CondError, CondResult};

/// Operator used when a token carries no operator of its own.
pub const DEFAULT_OPERATOR: &str = "=";

/// Comparison operators recognized by the condition builder.
///
/// Each operator maps to exactly one wire-level form; see [`Operator::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
	/// Implicit equality (`{field: value}`)
	Eq,
	/// Not equal (`$ne`)
	Ne,
	/// Greater than (`$gt`)
	Gt,
	/// Greater than or equal (`$gte`)
	Gte,
	/// Less than (`$lt`)
	Lt,
	/// Less than or equal (`$lte`)
	Lte,
	/// Membership (`$in`)
	In,
	/// Exclusion (`$nin`)
	NotIn,
	/// Case-insensitive "contains" match
	Like,
	/// Case-insensitive "starts with" match
	LeftLike,
	/// Case-insensitive "ends with" match
	RightLike,
	/// Negated [`Operator::Like`]
	NotLike,
	/// Negated [`Operator::LeftLike`]
	NotLeftLike,
	/// Negated [`Operator::RightLike`]
	NotRightLike,
	/// Inclusive range (`$gte` + `$lte`)
	Between,
	/// Negated inclusive range
	NotBetween,
}

impl Operator {
	/// Recognize an operator string.
	///
	/// Matching is case-insensitive and runs of whitespace count as one space,
	/// so `"not  like"` and `"NOT LIKE"` are the same operator. Returns `None`
	/// for anything outside the vocabulary.
	///
	/// # Examples
	///
	/// ```
	/// use condor_cond::Operator;
	///
	/// assert_eq!(Operator::from_token(">="), Some(Operator::Gte));
	/// assert_eq!(Operator::from_token("not in"), Some(Operator::NotIn));
	/// assert_eq!(Operator::from_token("$nin"), Some(Operator::NotIn));
	/// assert_eq!(Operator::from_token("~"), None);
	/// ```
	pub fn from_token(token: &str) -> Option<Self> {
		let normalized = token
			.split_whitespace()
			.collect::<Vec<_>>()
			.join(" ")
			.to_ascii_lowercase();

		let op = match normalized.as_str() {
			"=" | "==" | "$eq" => Operator::Eq,
			"!=" | "<>" | "$ne" => Operator::Ne,
			">" | "$gt" => Operator::Gt,
			">=" | "$gte" => Operator::Gte,
			"<" | "$lt" => Operator::Lt,
			"<=" | "$lte" => Operator::Lte,
			"in" | "$in" => Operator::In,
			"not in" | "$nin" => Operator::NotIn,
			"like" => Operator::Like,
			"left like" => Operator::LeftLike,
			"right like" => Operator::RightLike,
			"not like" => Operator::NotLike,
			"not left like" => Operator::NotLeftLike,
			"not right like" => Operator::NotRightLike,
			"between" => Operator::Between,
			"not between" => Operator::NotBetween,
			_ => return None,
		};
		Some(op)
	}

	/// Wire-level operator key, or `None` for implicit equality and the
	/// composite operators (pattern and range) that expand into several keys.
	pub fn symbol(&self) -> Option<&'static str> {
		match self {
			Operator::Ne => Some("$ne"),
			Operator::Gt => Some("$gt"),
			Operator::Gte => Some("$gte"),
			Operator::Lt => Some("$lt"),
			Operator::Lte => Some("$lte"),
			Operator::In => Some("$in"),
			Operator::NotIn => Some("$nin"),
			_ => None,
		}
	}

	/// Whether the operator is a negated form.
	pub fn is_negated(&self) -> bool {
		matches!(
			self,
			Operator::NotLike | Operator::NotLeftLike | Operator::NotRightLike | Operator::NotBetween
		)
	}

	/// Shape `value` into the right-hand side of a primitive condition.
	///
	/// - `Eq` keeps the literal value.
	/// - `In`/`NotIn` wrap a scalar into a one-element list.
	/// - `Between`/`NotBetween` need a two-element array `[lower, upper]`.
	/// - The `Like` family needs a string, which is regex-escaped and
	///   anchored with `.*`, `^` and `$` as the variant requires.
	pub fn apply(&self, value: Bson) -> CondResult<Bson> {
		let shaped = match self {
			Operator::Eq => value,
			Operator::Ne => Bson::Document(doc! { "$ne": value }),
			Operator::Gt => Bson::Document(doc! { "$gt": value }),
			Operator::Gte => Bson::Document(doc! { "$gte": value }),
			Operator::Lt => Bson::Document(doc! { "$lt": value }),
			Operator::Lte => Bson::Document(doc! { "$lte": value }),
			Operator::In => Bson::Document(doc! { "$in": into_list(value) }),
			Operator::NotIn => Bson::Document(doc! { "$nin": into_list(value) }),
			Operator::Between | Operator::NotBetween => {
				let (lower, upper) = self.range_bounds(value)?;
				let range = doc! { "$gte": lower, "$lte": upper };
				self.negate_if_needed(range)
			}
			Operator::Like
			| Operator::LeftLike
			| Operator::RightLike
			| Operator::NotLike
			| Operator::NotLeftLike
			| Operator::NotRightLike => {
				let pattern = match value {
					Bson::String(pattern) => pattern,
					other => {
						return Err(CondError::InvalidValue {
							operator: self.to_string(),
							reason: format!("expected a string pattern, got {:?}", other.element_type()),
						});
					}
				};
				let regex = doc! { "$regex": self.anchor(&pattern), "$options": "i" };
				self.negate_if_needed(regex)
			}
		};
		Ok(shaped)
	}

	fn range_bounds(&self, value: Bson) -> CondResult<(Bson, Bson)> {
		match value {
			Bson::Array(items) if items.len() == 2 => {
				let mut bounds = items.into_iter();
				match (bounds.next(), bounds.next()) {
					(Some(lower), Some(upper)) => Ok((lower, upper)),
					_ => Err(self.bounds_error(0)),
				}
			}
			Bson::Array(items) => Err(self.bounds_error(items.len())),
			_ => Err(self.bounds_error(1)),
		}
	}

	fn bounds_error(&self, got: usize) -> CondError {
		CondError::InvalidValue {
			operator: self.to_string(),
			reason: format!("expected [lower, upper], got {} value(s)", got),
		}
	}

	fn anchor(&self, pattern: &str) -> String {
		let escaped = regex::escape(pattern);
		match self {
			Operator::LeftLike | Operator::NotLeftLike => format!("^{}.*", escaped),
			Operator::RightLike | Operator::NotRightLike => format!(".*{}$", escaped),
			_ => format!(".*{}.*", escaped),
		}
	}

	fn negate_if_needed(&self, document: bson::Document) -> Bson {
		if self.is_negated() {
			Bson::Document(doc! { "$not": document })
		} else {
			Bson::Document(document)
		}
	}
}

impl fmt::Display for Operator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let token = match self {
			Operator::Eq => "=",
			Operator::Ne => "!=",
			Operator::Gt => ">",
			Operator::Gte => ">=",
			Operator::Lt => "<",
			Operator::Lte => "<=",
			Operator::In => "IN",
			Operator::NotIn => "NOT IN",
			Operator::Like => "LIKE",
			Operator::LeftLike => "LEFT LIKE",
			Operator::RightLike => "RIGHT LIKE",
			Operator::NotLike => "NOT LIKE",
			Operator::NotLeftLike => "NOT LEFT LIKE",
			Operator::NotRightLike => "NOT RIGHT LIKE",
			Operator::Between => "BETWEEN",
			Operator::NotBetween => "NOT BETWEEN",
		};
		f.write_str(token)
	}
}

/// Split a field token into `(field, operator)`.
///
/// The field is the longest prefix made of ASCII letters, digits, `_` and
/// `.`. Whatever follows, trimmed, is the operator; an empty remainder means
/// [`DEFAULT_OPERATOR`]. This function never fails: a token without an
/// operator is simply a field.
///
/// # Examples
///
/// ```
/// use condor_cond::get_op;
///
/// assert_eq!(get_op("age >"), ("age", ">"));
/// assert_eq!(get_op("age"), ("age", "="));
/// assert_eq!(get_op("a.b_c"), ("a.b_c", "="));
/// assert_eq!(get_op("name NOT LIKE"), ("name", "NOT LIKE"));
/// ```
pub fn get_op(token: &str) -> (&str, &str) {
	let boundary = token
		.char_indices()
		.find(|(_, c)| !is_field_char(*c))
		.map(|(index, _)| index);

	match boundary {
		Some(index) => {
			let operator = token[index..].trim();
			let operator = if operator.is_empty() {
				DEFAULT_OPERATOR
			} else {
				operator
			};
			(&token[..index], operator)
		}
		None => (token, DEFAULT_OPERATOR),
	}
}

fn into_list(value: Bson) -> Bson {
	match value {
		Bson::Array(items) => Bson::Array(items),
		other => Bson::Array(vec![other]),
	}
}

fn is_field_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("age >", "age", ">")]
	#[case("age>=", "age", ">=")]
	#[case("age", "age", "=")]
	#[case("a.b_c", "a.b_c", "=")]
	#[case("age ", "age", "=")]
	#[case("name LIKE", "name", "LIKE")]
	#[case("name  not   in ", "name", "not   in")]
	#[case(">", "", ">")]
	#[case("", "", "=")]
	fn test_get_op(#[case] token: &str, #[case] field: &str, #[case] operator: &str) {
		assert_eq!(get_op(token), (field, operator));
	}

	#[rstest]
	#[case("=", Operator::Eq)]
	#[case("==", Operator::Eq)]
	#[case("<>", Operator::Ne)]
	#[case("!=", Operator::Ne)]
	#[case("$lte", Operator::Lte)]
	#[case("IN", Operator::In)]
	#[case("not   in", Operator::NotIn)]
	#[case("Like", Operator::Like)]
	#[case("LEFT LIKE", Operator::LeftLike)]
	#[case("not right like", Operator::NotRightLike)]
	#[case("BETWEEN", Operator::Between)]
	#[case("NOT BETWEEN", Operator::NotBetween)]
	fn test_from_token(#[case] token: &str, #[case] expected: Operator) {
		assert_eq!(Operator::from_token(token), Some(expected));
	}

	#[rstest]
	#[case("~")]
	#[case("$regex")]
	#[case("contains")]
	#[case("")]
	fn test_from_token_rejects_unknown(#[case] token: &str) {
		assert_eq!(Operator::from_token(token), None);
	}

	#[rstest]
	fn test_display_round_trips_through_from_token() {
		let all = [
			Operator::Eq,
			Operator::Ne,
			Operator::Gt,
			Operator::Gte,
			Operator::Lt,
			Operator::Lte,
			Operator::In,
			Operator::NotIn,
			Operator::Like,
			Operator::LeftLike,
			Operator::RightLike,
			Operator::NotLike,
			Operator::NotLeftLike,
			Operator::NotRightLike,
			Operator::Between,
			Operator::NotBetween,
		];
		for op in all {
			assert_eq!(Operator::from_token(&op.to_string()), Some(op));
		}
	}

	#[rstest]
	fn test_apply_comparison() {
		let shaped = Operator::Gt.apply(Bson::Int32(18)).unwrap();
		assert_eq!(shaped, Bson::Document(doc! { "$gt": 18 }));
	}

	#[rstest]
	#[case(Operator::Ne, "$ne")]
	#[case(Operator::Gt, "$gt")]
	#[case(Operator::Gte, "$gte")]
	#[case(Operator::Lt, "$lt")]
	#[case(Operator::Lte, "$lte")]
	#[case(Operator::In, "$in")]
	#[case(Operator::NotIn, "$nin")]
	fn test_apply_uses_wire_key(#[case] operator: Operator, #[case] key: &str) {
		let Bson::Document(shaped) = operator.apply(Bson::Int32(1)).unwrap() else {
			panic!("expected a document for {}", operator);
		};
		assert_eq!(shaped.keys().collect::<Vec<_>>(), vec![key]);
		assert_eq!(operator.symbol(), Some(key));
	}

	#[rstest]
	fn test_apply_in_wraps_scalar() {
		let shaped = Operator::In.apply(Bson::String("admin".into())).unwrap();
		assert_eq!(shaped, Bson::Document(doc! { "$in": ["admin"] }));
	}

	#[rstest]
	fn test_apply_between_requires_two_bounds() {
		let err = Operator::Between
			.apply(Bson::Array(vec![Bson::Int32(1)]))
			.unwrap_err();
		assert!(matches!(err, CondError::InvalidValue { .. }));

		let err = Operator::NotBetween.apply(Bson::Int32(1)).unwrap_err();
		assert!(matches!(err, CondError::InvalidValue { .. }));
	}

	#[rstest]
	fn test_apply_like_escapes_pattern() {
		let shaped = Operator::LeftLike.apply(Bson::String("a.b".into())).unwrap();
		assert_eq!(
			shaped,
			Bson::Document(doc! { "$regex": "^a\\.b.*", "$options": "i" })
		);
	}

	#[rstest]
	fn test_apply_not_like_wraps_in_not() {
		let shaped = Operator::NotRightLike
			.apply(Bson::String("son".into()))
			.unwrap();
		assert_eq!(
			shaped,
			Bson::Document(doc! { "$not": { "$regex": ".*son$", "$options": "i" } })
		);
	}

	#[rstest]
	fn test_apply_like_rejects_non_string() {
		let err = Operator::Like.apply(Bson::Int64(3)).unwrap_err();
		assert!(matches!(err, CondError::InvalidValue { .. }));
	}
}
