//! ODM error types
//!
//! A single error type for everything between a [`condor_cond::Cond`] and
//! the document store.

use condor_cond::CondError;
use thiserror::Error;

/// Result type for ODM operations
pub type OdmResult<T> = Result<T, OdmError>;

/// Unified error type for ODM operations
#[derive(Debug, Error)]
pub enum OdmError {
	/// The condition could not be built
	#[error(transparent)]
	Condition(#[from] CondError),

	/// Connection error
	#[error("Connection error: {0}")]
	Connection(String),

	/// Query/operation execution error
	#[error("Execution error: {0}")]
	Execution(String),

	/// Serialization/deserialization error
	#[error("Serialization error: {0}")]
	Serialization(String),

	/// Invalid operation for the current backend
	#[error("Invalid operation: {0}")]
	InvalidOperation(String),

	/// Configuration error
	#[error("Configuration error: {0}")]
	Config(String),

	/// No collection is known for a model type
	#[error("No collection registered for `{0}`")]
	NotRegistered(String),
}

impl From<bson::error::Error> for OdmError {
	fn from(err: bson::error::Error) -> Self {
		OdmError::Serialization(err.to_string())
	}
}

impl From<toml::de::Error> for OdmError {
	fn from(err: toml::de::Error) -> Self {
		OdmError::Config(err.to_string())
	}
}

#[cfg(feature = "mongodb")]
impl From<mongodb::error::Error> for OdmError {
	fn from(err: mongodb::error::Error) -> Self {
		use mongodb::error::ErrorKind;

		match *err.kind {
			ErrorKind::InvalidArgument { .. } => OdmError::InvalidOperation(err.to_string()),
			ErrorKind::Io(_) | ErrorKind::Authentication { .. } => {
				OdmError::Connection(err.to_string())
			}
			_ => OdmError::Execution(err.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_condition_error_is_transparent() {
		let error: OdmError = CondError::EmptyField.into();
		assert!(matches!(error, OdmError::Condition(CondError::EmptyField)));
		assert_eq!(error.to_string(), "Field name must not be empty");
	}

	#[rstest]
	#[case(OdmError::Connection("refused".into()), "Connection error: refused")]
	#[case(OdmError::Execution("timeout".into()), "Execution error: timeout")]
	#[case(OdmError::NotRegistered("User".into()), "No collection registered for `User`")]
	fn test_display(#[case] error: OdmError, #[case] expected: &str) {
		assert_eq!(error.to_string(), expected);
	}

	#[rstest]
	fn test_toml_error_becomes_config() {
		let err = toml::from_str::<toml::Table>("= broken").unwrap_err();
		assert!(matches!(OdmError::from(err), OdmError::Config(_)));
	}

	#[cfg(feature = "mongodb")]
	#[rstest]
	fn test_driver_errors_are_classified() {
		let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
		let err = mongodb::error::Error::from(io);
		assert!(matches!(OdmError::from(err), OdmError::Connection(_)));

		let err = mongodb::error::Error::custom("server said no");
		assert!(matches!(OdmError::from(err), OdmError::Execution(_)));
	}
}
