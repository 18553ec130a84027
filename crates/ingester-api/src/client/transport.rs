//! Carriers for RPC calls and the file side channel.

use std::time::Duration;

use reqwest::{blocking::Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, trace};

use super::{
	auth::{Authentication, WithAuth},
	fault,
};
use crate::{config::ClientConfig, Error, Result};

/// Moves RPC calls and file contents between the client and the platform.
pub trait Transport {
	/// Invokes a remote method, returning its result. Platform faults are returned as errors.
	fn call(&self, method: &str, params: Vec<Value>) -> Result<Value>;

	/// Uploads file contents to a data path, e.g. `{transaction}/{class}:{id}/{field}`.
	fn upload(&self, path: &str, contents: Vec<u8>) -> Result<()>;

	/// Downloads the contents at a data path, `None` if there is nothing there.
	fn download(&self, path: &str) -> Result<Option<Vec<u8>>>;
}

/// JSON RPC over HTTP, with the file side channel served under a separate data URL.
///
/// Calls are POSTed to the service URL as `{"method": ..., "params": [...]}` and answered with
/// either `{"result": ...}` or `{"fault": {"faultCode": ..., "faultString": ...}}`.
pub struct HttpTransport {
	client: Client,
	service_url: String,
	data_url: String,
	auth: Option<Authentication>,
}

impl HttpTransport {
	pub fn new(config: &ClientConfig) -> Result<Self> {
		config.check()?;

		let client = Client::builder()
			.timeout(Duration::from_secs(config.timeout_secs))
			.build()
			.map_err(|e| Error::Transport(e.to_string()))?;

		Ok(Self {
			client,
			service_url: config.service_url.clone(),
			data_url: config.data_url(),
			auth: config.auth.clone(),
		})
	}

	fn data_path(&self, path: &str) -> String {
		format!("{}/{}", self.data_url.trim_end_matches('/'), path)
	}
}

impl Transport for HttpTransport {
	fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
		debug!(method, "Calling platform");

		let response = self
			.client
			.post(&self.service_url)
			.with_auth(self.auth.as_ref())
			.json(&json!({ "method": method, "params": params }))
			.send()
			.map_err(|e| Error::Transport(e.to_string()))?;

		let status = response.status();
		let body: Value = response.json().map_err(|e| {
			Error::Transport(format!("invalid response to '{method}' ({status}): {e}"))
		})?;

		parse_response(body)
	}

	fn upload(&self, path: &str, contents: Vec<u8>) -> Result<()> {
		let url = self.data_path(path);
		trace!(%url, bytes = contents.len(), "Uploading file");

		let response = self
			.client
			.post(&url)
			.with_auth(self.auth.as_ref())
			.header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
			.body(contents)
			.send()
			.map_err(|e| Error::Transport(e.to_string()))?;

		if response.status().is_success() {
			Ok(())
		} else {
			Err(Error::Upload {
				path: path.to_string(),
				status: response.status().as_u16(),
			})
		}
	}

	fn download(&self, path: &str) -> Result<Option<Vec<u8>>> {
		let response = self
			.client
			.get(self.data_path(path))
			.with_auth(self.auth.as_ref())
			.send()
			.map_err(|e| Error::Transport(e.to_string()))?;

		match response.status() {
			StatusCode::OK => response
				.bytes()
				.map(|bytes| Some(bytes.to_vec()))
				.map_err(|e| Error::Transport(e.to_string())),
			StatusCode::NOT_FOUND => Ok(None),
			status => Err(Error::Internal(format!(
				"unexpected status {status} downloading '{path}'"
			))),
		}
	}
}

/// Unwraps an RPC response envelope.
pub(crate) fn parse_response(mut body: Value) -> Result<Value> {
	if let Some(fault) = body.get("fault") {
		let code = fault.get("faultCode").and_then(Value::as_i64).unwrap_or(0);
		let message = fault
			.get("faultString")
			.and_then(Value::as_str)
			.unwrap_or_default();
		return Err(fault::translate(code, message));
	}

	if let Some(result) = body.get_mut("result") {
		return Ok(result.take());
	}

	Err(Error::Transport(format!(
		"response has neither a result nor a fault: {body}"
	)))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unwraps_results() {
		assert_eq!(
			parse_response(json!({"result": "PONG"})).unwrap(),
			json!("PONG")
		);
		assert_eq!(parse_response(json!({"result": null})).unwrap(), Value::Null);
	}

	#[test]
	fn translates_faults() {
		let err = parse_response(json!({"fault": {"faultCode": 3, "faultString": "no"}}))
			.unwrap_err();
		assert!(matches!(err, Error::UnsupportedSchema(m) if m == "no"));

		assert!(matches!(
			parse_response(json!({"status": "ok"})),
			Err(Error::Transport(_))
		));
	}
}
