use std::fmt;

use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
	pub field: String,
	pub message: String,
}

impl ValidationError {
	pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			message: message.into(),
		}
	}
}

impl fmt::Display for ValidationError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.field.is_empty() {
			write!(f, "{}", self.message)
		} else {
			write!(f, "{}: {}", self.field, self.message)
		}
	}
}

struct ErrorList<'a>(&'a [ValidationError]);

impl fmt::Display for ErrorList<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, e) in self.0.iter().enumerate() {
			if i > 0 {
				f.write_str("; ")?;
			}
			write!(f, "{e}")?;
		}
		Ok(())
	}
}

/// Errors raised while transcoding between domain objects and wire trees.
#[derive(Error, Debug)]
pub enum MarshalError {
	#[error("unknown wire class: <tag='{0}'>")]
	UnknownType(String),

	/// An unregistered object class, or a value JSON cannot carry.
	#[error("not supported on the wire: {0}")]
	UnsupportedType(String),

	#[error("malformed wire data: {0}")]
	MalformedWireData(String),

	#[error("invalid timestamp '{0}'")]
	Timestamp(String),

	#[error("cannot assign field '{field}' on '{class}': {reason}")]
	Field {
		class: String,
		field: String,
		reason: String,
	},
}

/// Persistence failures reported by the platform.
#[derive(Error, Debug)]
pub enum PersistenceError {
	/// The object version did not match the stored version.
	#[error("stale object: {0}")]
	Stale(String),

	#[error("{0}")]
	Other(String),
}

#[derive(Error, Debug)]
pub enum Error {
	#[error("invalid object: {}", ErrorList(.0))]
	InvalidObject(Vec<ValidationError>),

	#[error("unknown object: {0}")]
	UnknownObject(String),

	#[error("unsupported schema: {0}")]
	UnsupportedSchema(String),

	#[error("unknown parameter '{name}' (value: {value})")]
	UnknownParameter { name: String, value: String },

	#[error("authentication failed: {0}")]
	Authentication(String),

	#[error(transparent)]
	Persistence(#[from] PersistenceError),

	/// The call would corrupt the platform state, e.g. deleting a location that still has data.
	#[error("invalid call: {0}")]
	InvalidCall(String),

	#[error("operation failed: {0}")]
	OperationFailed(String),

	#[error(transparent)]
	Marshal(#[from] MarshalError),

	#[error("upload to '{path}' failed with status {status}")]
	Upload { path: String, status: u16 },

	#[error("transport error: {0}")]
	Transport(String),

	#[error("internal error: {0}")]
	Internal(String),

	#[error("invalid server URL specified: '{0}'")]
	InvalidUrl(String),

	#[error("configuration error: {0}")]
	Config(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

impl Error {
	pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidObject(vec![ValidationError::new(field, message)])
	}

	/// Validation errors carried by an `InvalidObject`, empty for any other kind.
	pub fn validation_errors(&self) -> &[ValidationError] {
		match self {
			Self::InvalidObject(errors) => errors,
			_ => &[],
		}
	}

	pub fn is_stale(&self) -> bool {
		matches!(self, Self::Persistence(PersistenceError::Stale(_)))
	}
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn invalid_object_lists_every_field() {
		let err = Error::InvalidObject(vec![
			ValidationError::new("location", "Location must be set"),
			ValidationError::new("schema", "Schema must be set"),
		]);

		assert_eq!(
			err.to_string(),
			"invalid object: location: Location must be set; schema: Schema must be set"
		);
		assert_eq!(err.validation_errors().len(), 2);
	}

	#[test]
	fn stale_is_a_persistence_error() {
		let err: Error = PersistenceError::Stale("location 4".into()).into();
		assert!(err.is_stale());
		assert!(!Error::Internal("boom".into()).is_stale());
	}
}
