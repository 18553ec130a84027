//! Translation of platform faults into client errors.

use tracing::warn;

use crate::error::{Error, PersistenceError, ValidationError};

pub const AUTHENTICATION: i64 = 1;
pub const UNKNOWN_OBJECT: i64 = 2;
pub const UNSUPPORTED_SCHEMA: i64 = 3;
pub const INVALID_OBJECT: i64 = 4;
pub const UNKNOWN_PARAMETER: i64 = 5;
pub const STALE_OBJECT: i64 = 6;
pub const INVALID_CALL: i64 = 7;
pub const OPERATION_FAILED: i64 = 8;
pub const PERSISTENCE: i64 = 9;

/// Maps a fault code reported by the platform onto an [`Error`].
///
/// Unknown codes are surfaced as [`Error::Internal`] carrying the platform's message.
pub fn translate(code: i64, message: impl Into<String>) -> Error {
	let message = message.into();
	match code {
		AUTHENTICATION => Error::Authentication(message),
		UNKNOWN_OBJECT => Error::UnknownObject(message),
		UNSUPPORTED_SCHEMA => Error::UnsupportedSchema(message),
		INVALID_OBJECT => Error::InvalidObject(vec![ValidationError::new("", message)]),
		UNKNOWN_PARAMETER => Error::UnknownParameter {
			name: message,
			value: String::new(),
		},
		STALE_OBJECT => PersistenceError::Stale(message).into(),
		INVALID_CALL => Error::InvalidCall(message),
		OPERATION_FAILED => Error::OperationFailed(message),
		PERSISTENCE => PersistenceError::Other(message).into(),
		code => {
			warn!(code, %message, "Unknown fault code from the platform");
			Error::Internal(message)
		}
	}
}

#[cfg(test)]
mod tests {
	use tracing_test::traced_test;

	use super::*;

	#[test]
	fn known_codes() {
		assert!(matches!(translate(1, "no"), Error::Authentication(m) if m == "no"));
		assert!(translate(STALE_OBJECT, "location 3").is_stale());
		assert!(matches!(
			translate(PERSISTENCE, "disk full"),
			Error::Persistence(PersistenceError::Other(_))
		));
		assert_eq!(
			translate(INVALID_OBJECT, "bad").validation_errors()[0].message,
			"bad"
		);
	}

	#[test]
	#[traced_test]
	fn unknown_codes_are_logged() {
		let err = translate(42, "what happened");

		assert!(matches!(err, Error::Internal(m) if m == "what happened"));
		assert!(logs_contain("Unknown fault code from the platform"));
	}
}
