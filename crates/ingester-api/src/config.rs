//! Client configuration

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{client::auth::Authentication, Error, Result};

/// Where the platform lives and how to authenticate against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// RPC endpoint, e.g. `http://localhost:8080/api`
	pub service_url: String,

	/// Base URL of the file side channel. Derived from `service_url` when unset.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data_url: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub auth: Option<Authentication>,

	/// HTTP timeout, in seconds
	#[serde(default = "default_timeout")]
	pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
	30
}

impl ClientConfig {
	pub fn new(service_url: impl Into<String>) -> Self {
		Self {
			service_url: service_url.into(),
			data_url: None,
			auth: None,
			timeout_secs: default_timeout(),
		}
	}

	pub fn with_auth(mut self, auth: Authentication) -> Self {
		self.auth = Some(auth);
		self
	}

	/// Load configuration from a JSON file
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		info!("Loading client config from {:?}", path);

		let json = fs::read_to_string(path)?;
		let config: ClientConfig = serde_json::from_str(&json)
			.map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
		config.check()?;

		Ok(config)
	}

	/// Save configuration to a JSON file
	pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
		let json =
			serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
		fs::write(path.as_ref(), json)?;
		info!("Saved client config to {:?}", path.as_ref());
		Ok(())
	}

	/// Rejects anything but HTTP and HTTPS service URLs.
	pub fn check(&self) -> Result<()> {
		if self.service_url.starts_with("http://") || self.service_url.starts_with("https://") {
			Ok(())
		} else {
			Err(Error::InvalidUrl(self.service_url.clone()))
		}
	}

	/// The configured data URL, or the service URL with a trailing `/api` replaced by `/data`.
	pub fn data_url(&self) -> String {
		if let Some(url) = &self.data_url {
			return url.clone();
		}

		let base = self.service_url.trim_end_matches('/');
		match base.strip_suffix("/api") {
			Some(root) => format!("{root}/data"),
			None => format!("{base}/data"),
		}
	}
}
