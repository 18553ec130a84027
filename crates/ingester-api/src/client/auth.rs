use serde::{Deserialize, Serialize};

/// How the client identifies itself to the platform.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Authentication {
	Credentials { username: String, password: String },
	/// A private, randomly generated key issued by the platform.
	Key { key: String },
}

impl Authentication {
	pub fn credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self::Credentials {
			username: username.into(),
			password: password.into(),
		}
	}

	pub fn key(key: impl Into<String>) -> Self {
		Self::Key { key: key.into() }
	}
}

// Keeps secrets out of logs.
impl std::fmt::Debug for Authentication {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Credentials { username, .. } => f
				.debug_struct("Credentials")
				.field("username", username)
				.finish_non_exhaustive(),
			Self::Key { .. } => f.debug_struct("Key").finish_non_exhaustive(),
		}
	}
}

pub(crate) trait WithAuth {
	fn with_auth(self, auth: Option<&Authentication>) -> Self;
}

impl WithAuth for reqwest::blocking::RequestBuilder {
	fn with_auth(self, auth: Option<&Authentication>) -> Self {
		match auth {
			Some(Authentication::Credentials { username, password }) => {
				self.basic_auth(username, Some(password))
			}
			Some(Authentication::Key { key }) => self.bearer_auth(key),
			None => self,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn debug_output_hides_secrets() {
		let output = format!("{:?}", Authentication::credentials("casey", "password"));
		assert!(output.contains("casey"));
		assert!(!output.contains("password\""));

		assert!(!format!("{:?}", Authentication::key("s3cr3t")).contains("s3cr3t"));
	}

	#[test]
	fn serializes_with_a_type_tag() {
		let auth: Authentication =
			serde_json::from_str(r#"{"type": "key", "key": "abc"}"#).unwrap();
		assert_eq!(auth, Authentication::key("abc"));
	}
}
