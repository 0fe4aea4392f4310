//! Single-round-trip request dispatch.
//!
//! [`ApiExecutor`] turns an [`ApiCall`] into exactly one transport round trip: endpoint
//! resolution, query encoding, body encoding (JSON or multipart), bucket-level bookkeeping, and
//! response classification. [`RequestDispatcher`] layers bearer authorization on top by asking
//! the [`TokenManager`] for a valid token before every call except those aimed at the token
//! endpoint.

// std
use std::path::{Path, PathBuf};
// self
use crate::{
	_prelude::*,
	auth::Token,
	config::ClientConfig,
	error::RequestError,
	flows::{RefreshMetrics, TokenManager},
	http::{ApiRequest, ApiResponse, ApiTransport, Method, MultipartForm, RequestBody},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	rate_limit::{BucketLevel, RateLimitObserver, RateLimitSink},
	store::TokenSink,
};

/// Multipart field carrying the JSON-encoded request data.
pub const DATA_PART: &str = "data";
/// Multipart field carrying the uploaded file.
pub const FILE_PART: &str = "image";

/// One API call: method, endpoint, optional data, query parameters, and file upload.
#[derive(Clone, Debug)]
pub struct ApiCall {
	method: Method,
	endpoint: String,
	data: Value,
	query: Vec<(String, String)>,
	file: Option<FilePayload>,
}
impl ApiCall {
	/// Creates a call without data, query, or file.
	pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
		Self { method, endpoint: endpoint.into(), data: Value::Null, query: Vec::new(), file: None }
	}

	/// `GET` call.
	pub fn get(endpoint: impl Into<String>) -> Self {
		Self::new(Method::Get, endpoint)
	}

	/// `POST` call.
	pub fn post(endpoint: impl Into<String>) -> Self {
		Self::new(Method::Post, endpoint)
	}

	/// `PUT` call.
	pub fn put(endpoint: impl Into<String>) -> Self {
		Self::new(Method::Put, endpoint)
	}

	/// `DELETE` call.
	pub fn delete(endpoint: impl Into<String>) -> Self {
		Self::new(Method::Delete, endpoint)
	}

	/// Sets the request data.
	///
	/// Non-empty data is sent as a JSON body, or as the `data` part when a file is attached.
	/// `null`, `{}`, and `[]` count as empty.
	pub fn data(mut self, data: Value) -> Self {
		self.data = data;

		self
	}

	/// Serializes `data` and sets it as the request data.
	pub fn try_data<S>(self, data: &S) -> Result<Self, RequestError>
	where
		S: ?Sized + Serialize,
	{
		let value = serde_json::to_value(data).map_err(RequestError::Encode)?;

		Ok(self.data(value))
	}

	/// Appends a query parameter.
	pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((name.into(), value.into()));

		self
	}

	/// Appends several query parameters.
	pub fn queries<I, K, V>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.query.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));

		self
	}

	/// Attaches a file; the call is then sent as `multipart/form-data`.
	pub fn file(mut self, file: FilePayload) -> Self {
		self.file = Some(file);

		self
	}

	/// HTTP method.
	pub fn method(&self) -> Method {
		self.method
	}

	/// Endpoint as supplied by the caller.
	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}

	/// Request data.
	pub fn data_ref(&self) -> &Value {
		&self.data
	}

	/// Query parameters in insertion order.
	pub fn query_pairs(&self) -> &[(String, String)] {
		&self.query
	}

	pub(crate) fn with_endpoint(mut self, endpoint: String) -> Self {
		self.endpoint = endpoint;

		self
	}

	fn encode_body(&self) -> Result<RequestBody, RequestError> {
		if let Some(file) = &self.file {
			let data = serde_json::to_string(&self.data).map_err(RequestError::Encode)?;
			let (bytes, file_name) = file.load()?;
			let form = MultipartForm::default().text(DATA_PART, data).file(FILE_PART, bytes, file_name);

			return Ok(RequestBody::Multipart(form));
		}

		if is_empty_data(&self.data) {
			Ok(RequestBody::Empty)
		} else {
			Ok(RequestBody::Json(self.data.clone()))
		}
	}
}

/// Returns `true` for `null`, `{}`, and `[]`.
pub fn is_empty_data(data: &Value) -> bool {
	match data {
		Value::Null => true,
		Value::Object(map) => map.is_empty(),
		Value::Array(items) => items.is_empty(),
		_ => false,
	}
}

/// File attached to a multipart call.
#[derive(Clone)]
pub struct FilePayload {
	source: FileSource,
	file_name: Option<String>,
}
#[derive(Clone)]
enum FileSource {
	Path(PathBuf),
	Bytes(Vec<u8>),
}
impl FilePayload {
	/// File read from disk when the call is sent.
	///
	/// The reported file name defaults to the path's final component.
	pub fn from_path(path: impl Into<PathBuf>) -> Self {
		Self { source: FileSource::Path(path.into()), file_name: None }
	}

	/// In-memory file content; no file name unless one is set.
	pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
		Self { source: FileSource::Bytes(bytes.into()), file_name: None }
	}

	/// Overrides the file name reported in the part's `Content-Disposition`.
	pub fn file_name(mut self, name: impl Into<String>) -> Self {
		self.file_name = Some(name.into());

		self
	}

	/// File name that will be sent, if any.
	pub fn resolved_file_name(&self) -> Option<String> {
		self.file_name.clone().or_else(|| match &self.source {
			FileSource::Path(path) => basename(path),
			FileSource::Bytes(_) => None,
		})
	}

	fn load(&self) -> Result<(Vec<u8>, Option<String>), RequestError> {
		let bytes = match &self.source {
			FileSource::Path(path) => std::fs::read(path)
				.map_err(|source| RequestError::File { path: path.clone(), source })?,
			FileSource::Bytes(bytes) => bytes.clone(),
		};

		Ok((bytes, self.resolved_file_name()))
	}
}
impl Debug for FilePayload {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut s = f.debug_struct("FilePayload");

		match &self.source {
			FileSource::Path(path) => s.field("path", path),
			FileSource::Bytes(bytes) => s.field("len", &bytes.len()),
		};

		s.field("file_name", &self.file_name).finish()
	}
}

fn basename(path: &Path) -> Option<String> {
	path.file_name().map(|name| name.to_string_lossy().into_owned())
}

/// Unauthenticated round-trip executor shared by the dispatcher and the token grants.
pub struct ApiExecutor<T>
where
	T: ApiTransport,
{
	transport: Arc<T>,
	config: Arc<ClientConfig>,
	observer: RateLimitObserver,
}
impl<T> ApiExecutor<T>
where
	T: ApiTransport,
{
	/// Creates an executor over `transport`.
	pub fn new(transport: Arc<T>, config: Arc<ClientConfig>) -> Self {
		Self { transport, config, observer: RateLimitObserver::new() }
	}

	/// Validated configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Bucket-level observer fed by every response.
	pub fn observer(&self) -> &RateLimitObserver {
		&self.observer
	}

	/// Resolves `endpoint` against the API base, keeping any path prefix the base carries.
	pub fn resolve(&self, endpoint: &str) -> Result<Url, RequestError> {
		self.config.api_base.join(endpoint.trim_start_matches('/')).map_err(|source| {
			RequestError::InvalidEndpoint { endpoint: endpoint.to_owned(), source }
		})
	}

	/// Sends `call` once, attaching `bearer` as the `Authorization` credential when present.
	pub async fn execute(&self, call: ApiCall, bearer: Option<&str>) -> Result<Value, RequestError> {
		let mut url = self.resolve(&call.endpoint)?;

		if !call.query.is_empty() {
			url.query_pairs_mut().extend_pairs(&call.query);
		}

		let body = call.encode_body()?;
		let mut headers = vec![("Accept".to_owned(), "application/json".to_owned())];

		if let Some(token) = bearer {
			headers.push(("Authorization".to_owned(), format!("Bearer {token}")));
		}

		let request = ApiRequest { method: call.method, url, headers, body };

		request.check_headers().map_err(RequestError::build)?;

		let response =
			self.transport.execute(request).await.map_err(RequestError::transport)?;

		if let Some(raw) = response.header(&self.config.bucket_level_header) {
			self.observer.record(raw).await;
		}

		if response.is_error_status() {
			return Err(RequestError::Status { status: response.status, body: response.text() });
		}

		decode_body(&response)
	}
}
impl<T> Debug for ApiExecutor<T>
where
	T: ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiExecutor")
			.field("config", &self.config)
			.field("observer", &self.observer)
			.finish()
	}
}

fn decode_body(response: &ApiResponse) -> Result<Value, RequestError> {
	if response.body.iter().all(u8::is_ascii_whitespace) {
		return Ok(Value::Null);
	}

	serde_json::from_slice(&response.body)
		.map_err(|source| RequestError::Decode { status: response.status, source })
}

/// Authorized request dispatcher owning the token lifecycle and bucket-level state.
pub struct RequestDispatcher<T>
where
	T: ApiTransport,
{
	executor: ApiExecutor<T>,
	tokens: TokenManager,
}
impl<T> RequestDispatcher<T>
where
	T: ApiTransport,
{
	/// Creates a dispatcher without hooks.
	pub fn new(transport: Arc<T>, config: Arc<ClientConfig>) -> Self {
		Self { executor: ApiExecutor::new(transport, config), tokens: TokenManager::new() }
	}

	/// Installs the persistence hook invoked after every exchange and refresh.
	pub fn with_token_sink(mut self, sink: Arc<dyn TokenSink>) -> Self {
		self.tokens = self.tokens.with_sink(sink);

		self
	}

	/// Installs the hook invoked with every parsed bucket level.
	pub fn with_rate_limit_sink(mut self, sink: Arc<dyn RateLimitSink>) -> Self {
		self.executor.observer = self.executor.observer.with_sink(sink);

		self
	}

	/// Validated configuration.
	pub fn config(&self) -> &ClientConfig {
		self.executor.config()
	}

	/// Token lifecycle owner.
	pub fn tokens(&self) -> &TokenManager {
		&self.tokens
	}

	/// Refresh counters.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		self.tokens.refresh_metrics()
	}

	/// Latest bucket level reported by the API.
	pub fn bucket_level(&self) -> Option<BucketLevel> {
		self.executor.observer.current()
	}

	/// Exchanges an authorization code for a token.
	pub async fn exchange_authorization_code(&self, code: &str) -> Result<Token> {
		self.tokens.exchange_authorization_code(&self.executor, code).await
	}

	/// Refreshes the current token unconditionally.
	pub async fn refresh_token(&self) -> Result<Token> {
		self.tokens.refresh(&self.executor).await
	}

	/// Returns the current token, refreshing it first when expired.
	pub async fn ensure_valid_token(&self) -> Result<Token> {
		self.tokens.ensure_valid(&self.executor).await
	}

	/// Sends one call and returns the decoded JSON body.
	///
	/// Calls to the token endpoint go out unauthenticated. Every other call first obtains a valid
	/// token (refreshing at most once) and fails with
	/// [`TokenError::NotSet`](crate::error::TokenError::NotSet) before touching the network when
	/// no token is held.
	pub async fn send(&self, call: ApiCall) -> Result<Value> {
		const KIND: FlowKind = FlowKind::ApiRequest;

		let span = FlowSpan::new(KIND, "send");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let token = if self.config().is_token_endpoint(call.endpoint()) {
					None
				} else {
					Some(self.ensure_valid_token().await?)
				};

				self.executor
					.execute(call, token.as_ref().map(Token::access_token))
					.await
					.map_err(Error::from)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
impl<T> Debug for RequestDispatcher<T>
where
	T: ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestDispatcher")
			.field("executor", &self.executor)
			.field("tokens", &self.tokens)
			.finish()
	}
}
