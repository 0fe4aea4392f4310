// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::{
		ClientConfig, DEFAULT_API_BASE, DEFAULT_AUTHORIZE_ENDPOINT, DEFAULT_BUCKET_LEVEL_HEADER,
		DEFAULT_TOKEN_ENDPOINT,
	},
	error::ConfigError,
};

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret.
	pub client_secret: TokenSecret,
	/// Optional API base override.
	pub api_base: Option<Url>,
	/// Optional authorization page override.
	pub authorize_endpoint: Option<Url>,
	/// Optional token endpoint path override.
	pub token_endpoint: Option<String>,
	/// Optional bucket-level header override.
	pub bucket_level_header: Option<String>,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with the provided credentials.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: TokenSecret::new(client_secret),
			api_base: None,
			authorize_endpoint: None,
			token_endpoint: None,
			bucket_level_header: None,
		}
	}

	/// Overrides the API base (defaults to [`DEFAULT_API_BASE`]).
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Overrides the authorization page (defaults to [`DEFAULT_AUTHORIZE_ENDPOINT`]).
	pub fn authorize_endpoint(mut self, url: Url) -> Self {
		self.authorize_endpoint = Some(url);

		self
	}

	/// Overrides the token endpoint path (defaults to [`DEFAULT_TOKEN_ENDPOINT`]).
	pub fn token_endpoint(mut self, path: impl Into<String>) -> Self {
		self.token_endpoint = Some(path.into());

		self
	}

	/// Overrides the bucket-level header name (defaults to [`DEFAULT_BUCKET_LEVEL_HEADER`]).
	pub fn bucket_level_header(mut self, name: impl Into<String>) -> Self {
		self.bucket_level_header = Some(name.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let api_base = match self.api_base {
			Some(url) => url,
			None => parse_default("api", DEFAULT_API_BASE)?,
		};
		let authorize_endpoint = match self.authorize_endpoint {
			Some(url) => url,
			None => parse_default("authorize", DEFAULT_AUTHORIZE_ENDPOINT)?,
		};
		let config = ClientConfig {
			client_id: self.client_id,
			client_secret: self.client_secret,
			api_base: with_trailing_slash(api_base),
			authorize_endpoint,
			token_endpoint: self.token_endpoint.unwrap_or_else(|| DEFAULT_TOKEN_ENDPOINT.into()),
			bucket_level_header: self
				.bucket_level_header
				.unwrap_or_else(|| DEFAULT_BUCKET_LEVEL_HEADER.into()),
		};

		config.validate()?;

		Ok(config)
	}
}

impl ClientConfig {
	/// Validates invariants for the configuration.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::MissingClientId);
		}
		if self.client_secret.expose().trim().is_empty() {
			return Err(ConfigError::MissingClientSecret);
		}
		if self.token_endpoint.trim_start_matches('/').trim().is_empty() {
			return Err(ConfigError::MissingTokenEndpoint);
		}
		if self.bucket_level_header.trim().is_empty() {
			return Err(ConfigError::MissingBucketHeader);
		}

		validate_endpoint("api", &self.api_base)?;
		validate_endpoint("authorize", &self.authorize_endpoint)?;

		Ok(())
	}
}

fn parse_default(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|_| ConfigError::InvalidEndpoint { endpoint: name, url: raw.into() })
}

// `Url::join` drops the last path segment unless the base ends with `/`.
fn with_trailing_slash(mut url: Url) -> Url {
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	url
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	if matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base() {
		Ok(())
	} else {
		Err(ConfigError::InvalidEndpoint { endpoint: name, url: url.to_string() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse test URL.")
	}

	#[test]
	fn defaults_point_at_lightspeed() {
		let config = ClientConfig::builder("client", "secret")
			.build()
			.expect("Default configuration should build.");

		assert_eq!(config.api_base.as_str(), DEFAULT_API_BASE);
		assert_eq!(config.authorize_endpoint.as_str(), DEFAULT_AUTHORIZE_ENDPOINT);
		assert_eq!(config.token_endpoint, DEFAULT_TOKEN_ENDPOINT);
		assert_eq!(config.bucket_level_header, DEFAULT_BUCKET_LEVEL_HEADER);
		assert!(config.is_token_endpoint("/oauth/access_token.php"));
		assert!(config.is_token_endpoint("oauth/access_token.php"));
		assert!(!config.is_token_endpoint("/API/Account/1/Item.json"));
	}

	#[test]
	fn rejects_missing_credentials_and_bad_endpoints() {
		assert!(matches!(
			ClientConfig::builder("", "secret").build(),
			Err(ConfigError::MissingClientId)
		));
		assert!(matches!(
			ClientConfig::builder("client", " ").build(),
			Err(ConfigError::MissingClientSecret)
		));
		assert!(matches!(
			ClientConfig::builder("client", "secret").api_base(url("mailto:ops@example.com")).build(),
			Err(ConfigError::InvalidEndpoint { endpoint: "api", .. })
		));
		assert!(matches!(
			ClientConfig::builder("client", "secret").token_endpoint("/").build(),
			Err(ConfigError::MissingTokenEndpoint)
		));
		assert!(matches!(
			ClientConfig::builder("client", "secret").bucket_level_header("").build(),
			Err(ConfigError::MissingBucketHeader)
		));
	}

	#[test]
	fn api_base_gains_trailing_slash() {
		let config = ClientConfig::builder("client", "secret")
			.api_base(url("http://127.0.0.1:8080/proxy"))
			.build()
			.expect("Configuration with a path prefix should build.");

		assert_eq!(config.api_base.as_str(), "http://127.0.0.1:8080/proxy/");

		let debug = format!("{config:?}");

		assert!(debug.contains("<redacted>"));
		assert!(!debug.contains("\"secret\""));
	}
}
