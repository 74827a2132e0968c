//! Condition tree and its serialization to a query document

use bson::{Bson, Document};
use tracing::trace;

use crate::error::{CondError, CondResult};
use crate::operator::Operator;

/// Logical-OR key used when serializing an OR tree.
pub const OR_KEY: &str = "$or";

/// How the elements of a tree are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combine {
	/// Merge element documents into one flat document
	#[default]
	And,
	/// Wrap element documents in a `$or` list
	Or,
}

/// One field mapped to a literal value or an operator-document.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveCondition {
	field: String,
	value: Bson,
}

impl PrimitiveCondition {
	/// Create a condition from an already shaped right-hand side.
	///
	/// Fails with [`CondError::EmptyField`] when `field` is empty.
	pub fn new(field: impl Into<String>, value: Bson) -> CondResult<Self> {
		let field = field.into();
		if field.is_empty() {
			return Err(CondError::EmptyField);
		}
		Ok(Self { field, value })
	}

	/// Create a condition by shaping `value` with `operator`.
	///
	/// # Examples
	///
	/// ```
	/// use condor_cond::{Operator, PrimitiveCondition};
	/// use bson::{doc, Bson};
	///
	/// let cond = PrimitiveCondition::with_operator("age", Operator::Gte, Bson::Int32(18)).unwrap();
	/// assert_eq!(cond.to_document(), doc! { "age": { "$gte": 18 } });
	/// ```
	pub fn with_operator(
		field: impl Into<String>,
		operator: Operator,
		value: Bson,
	) -> CondResult<Self> {
		let field = field.into();
		if field.is_empty() {
			return Err(CondError::EmptyField);
		}
		let value = operator.apply(value)?;
		Ok(Self { field, value })
	}

	/// Field path of the condition.
	pub fn field(&self) -> &str {
		&self.field
	}

	/// Right-hand side: a literal or an operator-document.
	pub fn value(&self) -> &Bson {
		&self.value
	}

	/// Single-key document for this condition.
	pub fn to_document(&self) -> Document {
		let mut document = Document::new();
		document.insert(self.field.clone(), self.value.clone());
		document
	}
}

/// An entry of a [`ConditionTree`].
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
	/// A single field condition
	Primitive(PrimitiveCondition),
	/// The resolved document of a sub-tree
	Nested(Document),
}

impl Element {
	/// Document contributed by this element.
	pub fn to_document(&self) -> Document {
		match self {
			Element::Primitive(condition) => condition.to_document(),
			Element::Nested(document) => document.clone(),
		}
	}
}

/// Ordered elements plus a combination mode and a skip flag.
///
/// The tree is filled by the dispatcher and can be serialized any number of
/// times; appending after a read simply changes the next serialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionTree {
	elements: Vec<Element>,
	mode: Combine,
	skip: bool,
}

impl ConditionTree {
	/// Create an empty tree with the given combination mode.
	pub fn new(mode: Combine) -> Self {
		Self {
			elements: Vec::new(),
			mode,
			skip: false,
		}
	}

	/// Append an element.
	pub fn push(&mut self, element: Element) {
		self.elements.push(element);
	}

	/// Mark the whole tree as discarded.
	pub fn set_skip(&mut self) {
		self.skip = true;
	}

	/// Whether a `false` guard discarded this tree.
	pub fn is_skipped(&self) -> bool {
		self.skip
	}

	/// Combination mode.
	pub fn mode(&self) -> Combine {
		self.mode
	}

	/// Elements in insertion order.
	pub fn elements(&self) -> &[Element] {
		&self.elements
	}

	/// Number of elements.
	pub fn len(&self) -> usize {
		self.elements.len()
	}

	/// Whether no element was added.
	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}

	/// Serialize the tree into a query document.
	///
	/// - empty or skipped tree: empty document ("match everything")
	/// - one element: that element's document, unwrapped
	/// - AND: element documents merged in order, later keys overwrite
	///   earlier ones
	/// - OR: `{"$or": [..element documents..]}`
	pub fn to_document(&self) -> Document {
		if self.skip {
			return Document::new();
		}

		match self.elements.as_slice() {
			[] => Document::new(),
			[only] => only.to_document(),
			elements => match self.mode {
				Combine::And => merge(elements),
				Combine::Or => {
					let alternatives: Vec<Bson> = elements
						.iter()
						.map(|element| Bson::Document(element.to_document()))
						.collect();
					let mut document = Document::new();
					document.insert(OR_KEY, alternatives);
					document
				}
			},
		}
	}
}

fn merge(elements: &[Element]) -> Document {
	let mut merged = Document::new();
	for element in elements {
		for (key, value) in element.to_document() {
			if merged.insert(key.clone(), value).is_some() {
				trace!(field = %key, "AND-merge overwrote an earlier condition");
			}
		}
	}
	merged
}
