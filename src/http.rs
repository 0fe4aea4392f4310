//! Transport primitives for API round trips.
//!
//! The module exposes [`ApiTransport`] alongside the transport-neutral [`ApiRequest`] and
//! [`ApiResponse`] values so downstream crates can plug in any HTTP stack. A transport answers
//! with `Ok(ApiResponse)` for *every* HTTP response, error statuses included, and reserves
//! `Err` for failures where no response exists at all (DNS, TCP, TLS, timeouts). Status
//! classification, bucket-level bookkeeping, and JSON decoding stay in the dispatcher.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::_prelude::*;

/// Boxed future returned by [`ApiTransport::execute`].
pub type TransportFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing a single API round trip.
///
/// Implementations must be `Send + Sync + 'static` so a client can be shared across tasks
/// behind an `Arc`, and the returned future must be `Send` so callers can spawn it.
/// Connection pooling, TLS, timeouts, and socket-level retries belong to the transport.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted when no response could be obtained.
	type TransportError: 'static + Send + Sync + StdError;

	/// Executes the request and returns the raw response.
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_, Self::TransportError>;
}

/// HTTP methods used by the Lightspeed API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the method token as sent on the wire.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully resolved outbound request handed to an [`ApiTransport`].
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL, query string included.
	pub url: Url,
	/// Extra request headers (e.g. `Authorization`).
	pub headers: Vec<(String, String)>,
	/// Request body.
	pub body: RequestBody,
}
impl ApiRequest {
	/// Returns the first header value matching `name` case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		find_header(&self.headers, name)
	}

	/// Fails on the first header whose value HTTP cannot carry.
	///
	/// Control characters other than horizontal tab, and `DEL`, are rejected; `obs-text` bytes
	/// pass as they do in `http::HeaderValue`.
	pub fn check_headers(&self) -> Result<(), InvalidHeaderValue> {
		match self.headers.iter().find(|(_, value)| !value.bytes().all(is_header_value_byte)) {
			Some((name, _)) => Err(InvalidHeaderValue { name: name.clone() }),
			None => Ok(()),
		}
	}
}

/// Header value containing a byte that cannot be sent on the wire.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Header `{name}` holds a character that is not allowed in HTTP header values.")]
pub struct InvalidHeaderValue {
	/// Name of the rejected header.
	pub name: String,
}

/// Body encodings supported by the dispatcher.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
	/// No body is sent.
	Empty,
	/// JSON document sent with `Content-Type: application/json`.
	Json(Value),
	/// `multipart/form-data` body.
	Multipart(MultipartForm),
}

/// Ordered list of multipart parts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultipartForm {
	/// Parts in wire order.
	pub parts: Vec<MultipartPart>,
}
impl MultipartForm {
	/// Appends a text part.
	pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.parts.push(MultipartPart { name: name.into(), content: PartContent::Text(value.into()) });

		self
	}

	/// Appends a file part.
	pub fn file(
		mut self,
		name: impl Into<String>,
		bytes: Vec<u8>,
		file_name: Option<String>,
	) -> Self {
		self.parts.push(MultipartPart {
			name: name.into(),
			content: PartContent::File { bytes, file_name },
		});

		self
	}

	/// Looks up a part by field name.
	pub fn part(&self, name: &str) -> Option<&MultipartPart> {
		self.parts.iter().find(|part| part.name == name)
	}
}

/// One named multipart field.
#[derive(Clone, Debug, PartialEq)]
pub struct MultipartPart {
	/// Field name.
	pub name: String,
	/// Field content.
	pub content: PartContent,
}

/// Content carried by a [`MultipartPart`].
#[derive(Clone, PartialEq)]
pub enum PartContent {
	/// Plain text field.
	Text(String),
	/// File upload.
	File {
		/// Raw file bytes.
		bytes: Vec<u8>,
		/// File name reported in the part's `Content-Disposition`.
		file_name: Option<String>,
	},
}
impl Debug for PartContent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
			Self::File { bytes, file_name } => f
				.debug_struct("File")
				.field("len", &bytes.len())
				.field("file_name", file_name)
				.finish(),
		}
	}
}

/// Raw HTTP response returned by an [`ApiTransport`].
#[derive(Clone, Debug, Default)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers in arrival order.
	pub headers: Vec<(String, String)>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response with the provided status and body and no headers.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: Vec::new(), body: body.into() }
	}

	/// Appends a response header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Returns the first header value matching `name` case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		find_header(&self.headers, name)
	}

	/// Returns `true` for 4xx and 5xx statuses.
	pub fn is_error_status(&self) -> bool {
		self.status >= 400
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
	headers
		.iter()
		.find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
		.map(|(_, value)| value.as_str())
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	type TransportError = ReqwestError;

	fn execute(&self, request: ApiRequest) -> TransportFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let ApiRequest { method, url, headers, body } = request;
			let mut builder = client.request(reqwest_method(method), url);

			for (name, value) in &headers {
				builder = builder.header(name, value);
			}

			builder = match body {
				RequestBody::Empty => builder,
				RequestBody::Json(value) => builder
					.header(reqwest::header::CONTENT_TYPE, "application/json")
					.body(value.to_string()),
				RequestBody::Multipart(form) => builder.multipart(reqwest_form(form)),
			};

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
				})
				.collect();
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse { status, headers, body })
		})
	}
}

fn is_header_value_byte(byte: u8) -> bool {
	byte == b'\t' || (byte >= 0x20 && byte != 0x7f)
}

#[cfg(feature = "reqwest")]
fn reqwest_method(method: Method) -> reqwest::Method {
	match method {
		Method::Get => reqwest::Method::GET,
		Method::Post => reqwest::Method::POST,
		Method::Put => reqwest::Method::PUT,
		Method::Delete => reqwest::Method::DELETE,
	}
}

#[cfg(feature = "reqwest")]
fn reqwest_form(form: MultipartForm) -> reqwest::multipart::Form {
	use reqwest::multipart::{Form, Part};

	form.parts.into_iter().fold(Form::new(), |acc, part| {
		let field = match part.content {
			PartContent::Text(text) => Part::text(text),
			PartContent::File { bytes, file_name: Some(name) } => Part::bytes(bytes).file_name(name),
			PartContent::File { bytes, file_name: None } => Part::bytes(bytes),
		};

		acc.part(part.name, field)
	})
}
