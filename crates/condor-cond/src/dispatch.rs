//! Argument dispatcher
//!
//! Classifies a positional argument list by the shape of its first argument
//! and turns it into tree elements. Shapes, in priority order:
//!
//! 1. nested builder: its document becomes one element, the rest is a new call
//! 2. boolean guard: `false` discards the tree, `true` lets the rest through
//! 3. field token: `field`, `field value` or `field operator value`
//! 4. map: every entry is a condition in the current tree, the rest is a new call
//! 5. list: one flattened call when it starts with a string, otherwise every
//!    item is processed on its own
//!
//! Any other first argument is an error.

use bson::Document;
use tracing::{debug, trace};

use crate::arg::Arg;
use crate::error::{CondError, CondResult};
use crate::operator::{Operator, get_op};
use crate::tree::{Combine, ConditionTree, Element, PrimitiveCondition};

/// Apply one call to `tree`.
pub(crate) fn dispatch(tree: &mut ConditionTree, args: Vec<Arg>) -> CondResult<()> {
	let mut args = args.into_iter();
	let Some(first) = args.next() else {
		return Ok(());
	};

	match first {
		Arg::Cond(nested) => {
			trace!("dispatch: nested builder");
			let document = nested.to_bson();
			if !document.is_empty() {
				tree.push(Element::Nested(document));
			}
			dispatch(tree, args.collect())
		}
		Arg::Bool(false) => {
			debug!("dispatch: false guard, discarding condition branch");
			tree.set_skip();
			Ok(())
		}
		Arg::Bool(true) => {
			trace!("dispatch: true guard");
			dispatch(tree, args.collect())
		}
		Arg::Str(token) => {
			trace!(token = %token, "dispatch: field");
			field_call(tree, token, args.collect())
		}
		Arg::Map(map) => {
			trace!(entries = map.len(), "dispatch: map");
			push_map(tree, map)?;
			dispatch(tree, args.collect())
		}
		Arg::List(items) => {
			trace!(items = items.len(), "dispatch: list");
			let rest = args.collect();
			sequence(tree, items)?;
			dispatch(tree, rest)
		}
		Arg::Value(value) => Err(CondError::InvalidArgument(format!(
			"unsupported argument type {:?}",
			value.element_type()
		))),
	}
}

/// Run `args` in a fresh sub-tree of `mode` and append its document when it
/// is not empty.
pub(crate) fn group(tree: &mut ConditionTree, mode: Combine, args: Vec<Arg>) -> CondResult<()> {
	let mut child = ConditionTree::new(mode);
	dispatch(&mut child, args)?;
	push_resolved(tree, &child);
	Ok(())
}

fn field_call(tree: &mut ConditionTree, token: String, rest: Vec<Arg>) -> CondResult<()> {
	let arity = rest.len() + 1;
	let mut rest = rest.into_iter();

	match (rest.next(), rest.next()) {
		(None, _) => {
			trace!(field = %token, "dispatch: bare field, nothing to add");
			Ok(())
		}
		(Some(value), None) => {
			let (field, operator) = get_op(&token);
			let operator = resolve_operator(field, operator)?;
			push_condition(tree, field, operator, value)
		}
		(Some(operator), Some(value)) if arity == 3 => {
			let operator = match operator {
				Arg::Str(operator) => resolve_operator(&token, &operator)?,
				other => {
					return Err(CondError::InvalidArgument(format!(
						"operator for field `{}` must be a string, got {}",
						token,
						other.kind()
					)));
				}
			};
			push_condition(tree, &token, operator, value)
		}
		_ => Err(CondError::InvalidArgument(format!(
			"field `{}` takes at most an operator and a value, got {} arguments",
			token, arity
		))),
	}
}

fn sequence(tree: &mut ConditionTree, items: Vec<Arg>) -> CondResult<()> {
	if matches!(items.first(), Some(Arg::Str(_))) {
		return dispatch(tree, items);
	}

	for item in items {
		match item {
			Arg::Map(map) => {
				let mut child = ConditionTree::new(Combine::Or);
				push_map(&mut child, map)?;
				push_resolved(tree, &child);
			}
			Arg::List(inner) => dispatch(tree, inner)?,
			other => dispatch(tree, vec![other])?,
		}
	}
	Ok(())
}

fn push_map(tree: &mut ConditionTree, map: Document) -> CondResult<()> {
	for (key, value) in map {
		let (field, operator) = get_op(&key);
		let operator = resolve_operator(field, operator)?;
		let condition = PrimitiveCondition::with_operator(field, operator, value)?;
		tree.push(Element::Primitive(condition));
	}
	Ok(())
}

fn push_condition(
	tree: &mut ConditionTree,
	field: &str,
	operator: Operator,
	value: Arg,
) -> CondResult<()> {
	let condition = PrimitiveCondition::with_operator(field, operator, value.into_bson())?;
	tree.push(Element::Primitive(condition));
	Ok(())
}

fn push_resolved(tree: &mut ConditionTree, child: &ConditionTree) {
	let document = child.to_document();
	if !document.is_empty() {
		tree.push(Element::Nested(document));
	}
}

fn resolve_operator(field: &str, operator: &str) -> CondResult<Operator> {
	if operator.trim().is_empty() {
		return Err(CondError::EmptyOperator {
			field: field.to_string(),
		});
	}
	Operator::from_token(operator).ok_or_else(|| CondError::UnknownOperator {
		field: field.to_string(),
		operator: operator.to_string(),
	})
}
