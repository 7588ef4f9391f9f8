//! HTTP collaborator and configuration
//!
//! The engine talks to the backend through the [`FormApi`] trait so
//! hosts and tests can inject their own transport. [`RestClient`] is
//! the reqwest implementation. All configuration is passed explicitly
//! via [`ClientConfig`]; the engine never reads ambient global state.

use crate::error::{FormEngineError, OptionFetchError};
use crate::schema::{FormDefinition, OptionRequestType};
use crate::serialize::MultipartField;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// The backend's uniform response envelope. `status == 1` denotes
/// success; anything else is an application-level failure even on
/// HTTP 200.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
	#[serde(default)]
	pub status: i64,
	#[serde(default)]
	pub message: Option<String>,
	#[serde(default)]
	pub data: Option<serde_json::Value>,
}

impl Envelope {
	pub fn is_success(&self) -> bool {
		self.status == 1
	}

	/// A success envelope carrying the given data, for tests and
	/// in-process transports.
	pub fn success(data: serde_json::Value) -> Self {
		Self {
			status: 1,
			message: None,
			data: Some(data),
		}
	}

	pub fn failure(message: impl Into<String>) -> Self {
		Self {
			status: 0,
			message: Some(message.into()),
			data: None,
		}
	}
}

/// Transport seam between the engine and the REST backend.
#[async_trait]
pub trait FormApi: Send + Sync {
	/// Fetch a form definition: `GET /forms/{form_id}` returning
	/// `{status: 1, data: {form: ...}}`.
	async fn fetch_form(&self, form_id: &str) -> Result<FormDefinition, FormEngineError>;

	/// Fetch a remote option payload. The caller owns envelope probing
	/// and row mapping; this returns the raw JSON body.
	async fn fetch_options(
		&self,
		method: OptionRequestType,
		url: &str,
	) -> Result<serde_json::Value, OptionFetchError>;

	/// Post a serialized submission as `multipart/form-data`.
	async fn submit_form(
		&self,
		url: &str,
		fields: Vec<MultipartField>,
	) -> Result<Envelope, FormEngineError>;
}

/// Explicit configuration for [`RestClient`].
///
/// # Examples
///
/// ```
/// use eventform::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new("https://api.example.com")
/// 	.with_bearer_token("secret")
/// 	.with_timeout(Duration::from_secs(10));
/// assert_eq!(config.base_url, "https://api.example.com");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
	/// Backend base URL; relative `optionUrl`s resolve against it.
	pub base_url: String,
	/// Optional bearer token attached to every request.
	pub bearer_token: Option<String>,
	/// Request timeout (default: 30 seconds).
	pub timeout: Duration,
}

impl ClientConfig {
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			bearer_token: None,
			timeout: Duration::from_secs(30),
		}
	}

	pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
		self.bearer_token = Some(token.into());
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}
}

/// reqwest-backed [`FormApi`] implementation.
pub struct RestClient {
	config: ClientConfig,
	client: reqwest::Client,
}

impl RestClient {
	pub fn new(config: ClientConfig) -> Result<Self, FormEngineError> {
		let client = reqwest::Client::builder()
			.timeout(config.timeout)
			.build()
			.map_err(|err| FormEngineError::Client(format!("failed to build http client: {err}")))?;

		Ok(Self { config, client })
	}

	fn build_url(&self, path: &str) -> String {
		if path.starts_with("http://") || path.starts_with("https://") {
			return path.to_string();
		}
		format!(
			"{}/{}",
			self.config.base_url.trim_end_matches('/'),
			path.trim_start_matches('/')
		)
	}

	fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
		let mut request = self.client.request(method, url);
		if let Some(token) = &self.config.bearer_token {
			request = request.bearer_auth(token);
		}
		request
	}
}

#[async_trait]
impl FormApi for RestClient {
	async fn fetch_form(&self, form_id: &str) -> Result<FormDefinition, FormEngineError> {
		let url = self.build_url(&format!("forms/{form_id}"));
		tracing::debug!(%url, "fetching form definition");

		let response = self
			.request(reqwest::Method::GET, &url)
			.send()
			.await
			.map_err(|err| FormEngineError::SchemaLoad {
				reason: err.to_string(),
			})?;

		if !response.status().is_success() {
			return Err(FormEngineError::SchemaLoad {
				reason: format!("HTTP {}", response.status().as_u16()),
			});
		}

		let envelope: Envelope =
			response
				.json()
				.await
				.map_err(|err| FormEngineError::SchemaLoad {
					reason: format!("malformed response: {err}"),
				})?;

		if !envelope.is_success() {
			return Err(FormEngineError::SchemaLoad {
				reason: envelope
					.message
					.unwrap_or_else(|| "backend rejected the request".to_string()),
			});
		}

		let form = envelope
			.data
			.as_ref()
			.and_then(|data| data.get("form"))
			.cloned()
			.ok_or_else(|| FormEngineError::SchemaLoad {
				reason: "response has no form payload".to_string(),
			})?;

		serde_json::from_value(form).map_err(|err| FormEngineError::SchemaLoad {
			reason: format!("malformed form definition: {err}"),
		})
	}

	async fn fetch_options(
		&self,
		method: OptionRequestType,
		url: &str,
	) -> Result<serde_json::Value, OptionFetchError> {
		let url = self.build_url(url);
		tracing::debug!(%url, "fetching options");

		let request = match method {
			OptionRequestType::Get => self.request(reqwest::Method::GET, &url),
			// POST option sources take an empty JSON body.
			OptionRequestType::Post => self
				.request(reqwest::Method::POST, &url)
				.json(&serde_json::json!({})),
		};

		let response = request
			.send()
			.await
			.map_err(|err| OptionFetchError::Http(err.to_string()))?;

		if !response.status().is_success() {
			return Err(OptionFetchError::Status(response.status().as_u16()));
		}

		response
			.json()
			.await
			.map_err(|err| OptionFetchError::BadShape(err.to_string()))
	}

	async fn submit_form(
		&self,
		url: &str,
		fields: Vec<MultipartField>,
	) -> Result<Envelope, FormEngineError> {
		let url = self.build_url(url);
		tracing::debug!(%url, parts = fields.len(), "submitting form");

		let form = crate::serialize::into_multipart_form(fields);
		let response = self
			.request(reqwest::Method::POST, &url)
			.multipart(form)
			.send()
			.await
			.map_err(|err| FormEngineError::Submission {
				reason: err.to_string(),
			})?;

		if !response.status().is_success() {
			return Err(FormEngineError::Submission {
				reason: format!("HTTP {}", response.status().as_u16()),
			});
		}

		response
			.json()
			.await
			.map_err(|err| FormEngineError::Submission {
				reason: format!("malformed response: {err}"),
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_envelope_success_flag() {
		let envelope: Envelope =
			serde_json::from_value(serde_json::json!({"status": 1, "data": {}})).unwrap();
		assert!(envelope.is_success());

		let envelope: Envelope =
			serde_json::from_value(serde_json::json!({"status": 0, "message": "nope"})).unwrap();
		assert!(!envelope.is_success());
		assert_eq!(envelope.message.as_deref(), Some("nope"));
	}

	#[test]
	fn test_envelope_defaults_to_failure() {
		let envelope: Envelope = serde_json::from_value(serde_json::json!({})).unwrap();
		assert!(!envelope.is_success());
	}

	#[test]
	fn test_build_url_resolves_relative_paths() {
		let client = RestClient::new(ClientConfig::new("https://api.example.com/")).unwrap();

		assert_eq!(
			client.build_url("/cities/IN"),
			"https://api.example.com/cities/IN"
		);
		assert_eq!(
			client.build_url("forms/42"),
			"https://api.example.com/forms/42"
		);
	}

	#[test]
	fn test_build_url_passes_absolute_urls_through() {
		let client = RestClient::new(ClientConfig::new("https://api.example.com")).unwrap();

		assert_eq!(
			client.build_url("https://other.example.com/cities"),
			"https://other.example.com/cities"
		);
	}

	#[test]
	fn test_config_defaults() {
		let config = ClientConfig::new("https://api.example.com");
		assert_eq!(config.timeout, Duration::from_secs(30));
		assert!(config.bearer_token.is_none());
	}
}
