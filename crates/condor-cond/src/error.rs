//! Error types for condition building
//!
//! Every malformed call is reported to the immediate caller. Nothing here is
//! retried, and no error is deferred to query execution.

use thiserror::Error;

/// Errors raised while building a condition tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CondError {
	/// The call shape is not one the builder understands (wrong arity,
	/// unsupported first argument, ...).
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// A field name was empty after operator resolution.
	#[error("Field name must not be empty")]
	EmptyField,

	/// An explicit operator was required but the operator string was empty.
	#[error("Empty operator for field `{field}`")]
	EmptyOperator {
		/// Field the operator was meant for.
		field: String,
	},

	/// The operator string is outside the recognized vocabulary.
	#[error("Unknown operator `{operator}` for field `{field}`")]
	UnknownOperator {
		/// Field the operator was attached to.
		field: String,
		/// The operator string as written by the caller.
		operator: String,
	},

	/// The value does not have the shape the operator needs.
	#[error("Invalid value for `{operator}`: {reason}")]
	InvalidValue {
		/// Display form of the operator.
		operator: String,
		/// What was wrong with the value.
		reason: String,
	},
}

/// Result type alias for condition building.
pub type CondResult<T> = Result<T, CondError>;
