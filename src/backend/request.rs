//! Transport-agnostic request descriptions.

// crates.io
use oauth2::{
	HttpRequest,
	http::{
		Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
// self
use crate::{_prelude::*, backend::Operation, error::ConfigError};

/// Header carrying the correlation code.
pub const HEADER_CORRELATION: &str = "rcode";
/// Header carrying the captcha secret during the token exchange.
pub const HEADER_SECRET: &str = "secret";
/// Header carrying the bearer token.
pub const HEADER_TOKEN: &str = "token";
/// Header carrying the raw captcha value during verification.
pub const HEADER_CAPTCHA: &str = "captcha";

/// A single backend call before it is handed to a transport.
#[derive(Clone)]
pub struct ApiRequest {
	/// Operation label used for classification and logs.
	pub operation: Operation,
	method: Method,
	url: Url,
	headers: Vec<(&'static str, String)>,
	body: Option<Vec<u8>>,
}
impl ApiRequest {
	/// Starts a `GET` request.
	pub fn get(operation: Operation, url: Url) -> Self {
		Self::new(operation, Method::GET, url)
	}

	/// Starts a `POST` request.
	pub fn post(operation: Operation, url: Url) -> Self {
		Self::new(operation, Method::POST, url)
	}

	fn new(operation: Operation, method: Method, url: Url) -> Self {
		Self { operation, method, url, headers: Vec::new(), body: None }
	}

	/// Appends a query parameter.
	pub fn query(mut self, key: &str, value: &str) -> Self {
		self.url.query_pairs_mut().append_pair(key, value);

		self
	}

	/// Adds a header.
	pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
		self.headers.push((name, value.into()));

		self
	}

	/// Serializes `payload` as the JSON body.
	pub fn json<T>(mut self, payload: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		let bytes = serde_json::to_vec(payload)
			.map_err(|source| ConfigError::RequestBody { operation: self.operation, source })?;

		self.body = Some(bytes);

		Ok(self)
	}

	/// Target URL including query parameters.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// Converts the description into the transport's request type.
	pub fn into_http(self) -> Result<HttpRequest> {
		let mut builder = Request::builder()
			.method(self.method)
			.uri(self.url.as_str())
			.header(ACCEPT, "application/json");

		if self.body.is_some() {
			builder = builder.header(CONTENT_TYPE, "application/json");
		}
		for (name, value) in self.headers {
			builder = builder.header(name, value);
		}

		builder.body(self.body.unwrap_or_default()).map_err(|e| ConfigError::from(e).into())
	}
}
impl Debug for ApiRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		// Header values carry credentials.
		let header_names = self.headers.iter().map(|(name, _)| *name).collect::<Vec<_>>();

		f.debug_struct("ApiRequest")
			.field("operation", &self.operation)
			.field("method", &self.method)
			.field("path", &self.url.path())
			.field("headers", &header_names)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn into_http_sets_json_headers_and_body() {
		let url = Url::parse("https://api.example.com/orders").expect("Fixture URL should parse.");
		let request = ApiRequest::post(Operation::OrderList, url)
			.header(HEADER_CORRELATION, "abc")
			.header(HEADER_TOKEN, "tok")
			.json(&serde_json::json!({ "filial_id": 100 }))
			.expect("JSON body should serialize.")
			.into_http()
			.expect("Request should build.");

		assert_eq!(request.method(), Method::POST);
		assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
		assert_eq!(request.headers()[HEADER_CORRELATION], "abc");
		assert_eq!(request.headers()[HEADER_TOKEN], "tok");
		assert_eq!(request.body().as_slice(), br#"{"filial_id":100}"#);
	}

	#[test]
	fn query_pairs_are_encoded_and_debug_hides_values() {
		let url = Url::parse("https://id.example.com/check").expect("Fixture URL should parse.");
		let request = ApiRequest::get(Operation::CaptchaCheck, url)
			.query("captcha", "a b&c")
			.header(HEADER_CAPTCHA, "a b&c");

		assert_eq!(request.url().query(), Some("captcha=a+b%26c"));

		let rendered = format!("{request:?}");

		assert!(rendered.contains("captcha"));
		assert!(!rendered.contains("a b&c"));

		let http = request.into_http().expect("GET request should build.");

		assert!(http.body().is_empty());
		assert!(http.headers().get(CONTENT_TYPE).is_none());
	}
}
