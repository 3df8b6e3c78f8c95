//! Builder and validation errors for [`StorefrontConfig`](crate::config::StorefrontConfig).

// self
use crate::{
	_prelude::*,
	backend::Operation,
	config::{Endpoints, StorefrontConfig},
};

/// Errors raised while building or validating a [`StorefrontConfig`].
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StorefrontConfigError {
	/// No identity provider base URL and no explicit identity endpoint.
	#[error("Missing endpoint for the {operation} call.")]
	MissingEndpoint {
		/// Operation without an endpoint.
		operation: Operation,
	},
	/// Endpoint cannot be derived from the configured base.
	#[error("Cannot derive the {operation} endpoint from {base}.")]
	InvalidEndpoint {
		/// Operation whose endpoint failed.
		operation: Operation,
		/// Base URL used for the join.
		base: String,
	},
	/// Endpoints must use HTTPS.
	#[error("The {operation} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Operation whose endpoint failed validation.
		operation: Operation,
		/// Offending URL.
		url: String,
	},
	/// Polling needs at least one attempt.
	#[error("Poll budget must allow at least one attempt.")]
	ZeroPollBudget,
	/// Negative delays are meaningless.
	#[error("Poll interval cannot be negative.")]
	NegativePollInterval,
	/// The profile view must be an absolute in-app path.
	#[error("Profile path must start with '/': {path}.")]
	RelativeProfilePath {
		/// Offending path.
		path: String,
	},
}

/// Builder for [`StorefrontConfig`] values.
///
/// Endpoints default to fixed paths joined onto the identity and API base URLs; individual
/// endpoints can be overridden with [`StorefrontConfigBuilder::endpoint`].
#[derive(Debug, Default)]
pub struct StorefrontConfigBuilder {
	/// Base URL of the identity provider.
	pub identity_base: Option<Url>,
	/// Base URL of the storefront API.
	pub api_base: Option<Url>,
	/// Explicit endpoint overrides.
	pub overrides: HashMap<Operation, Url>,
	/// Facility identifier override.
	pub facility_id: Option<u32>,
	/// Poll interval override.
	pub poll_interval: Option<Duration>,
	/// Poll budget override.
	pub poll_budget: Option<u32>,
	/// Profile path override.
	pub profile_path: Option<String>,
}
impl StorefrontConfigBuilder {
	/// Sets the identity provider base URL.
	pub fn identity_base(mut self, url: Url) -> Self {
		self.identity_base = Some(url);

		self
	}

	/// Sets the storefront API base URL.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Overrides the endpoint used for a single operation.
	pub fn endpoint(mut self, operation: Operation, url: Url) -> Self {
		self.overrides.insert(operation, url);

		self
	}

	/// Overrides the facility identifier.
	pub fn facility_id(mut self, id: u32) -> Self {
		self.facility_id = Some(id);

		self
	}

	/// Overrides the wait between status polls.
	pub fn poll_interval(mut self, interval: Duration) -> Self {
		self.poll_interval = Some(interval);

		self
	}

	/// Overrides the number of status polls.
	pub fn poll_budget(mut self, budget: u32) -> Self {
		self.poll_budget = Some(budget);

		self
	}

	/// Overrides the account view path.
	pub fn profile_path(mut self, path: impl Into<String>) -> Self {
		self.profile_path = Some(path.into());

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<StorefrontConfig, StorefrontConfigError> {
		let resolve = |operation| self.resolve(operation);
		let endpoints = Endpoints {
			captcha_image: resolve(Operation::CaptchaImage)?,
			captcha_check: resolve(Operation::CaptchaCheck)?,
			token_exchange: resolve(Operation::TokenExchange)?,
			profile: resolve(Operation::Profile)?,
			order_submit: resolve(Operation::OrderSubmit)?,
			order_status: resolve(Operation::OrderStatus)?,
			order_list: resolve(Operation::OrderList)?,
		};
		let config = StorefrontConfig {
			endpoints,
			facility_id: self.facility_id.unwrap_or(StorefrontConfig::DEFAULT_FACILITY_ID),
			poll_interval: self.poll_interval.unwrap_or(StorefrontConfig::DEFAULT_POLL_INTERVAL),
			poll_budget: self.poll_budget.unwrap_or(StorefrontConfig::DEFAULT_POLL_BUDGET),
			profile_path: self
				.profile_path
				.unwrap_or_else(|| StorefrontConfig::DEFAULT_PROFILE_PATH.into()),
		};

		config.validate()?;

		Ok(config)
	}

	fn resolve(&self, operation: Operation) -> Result<Url, StorefrontConfigError> {
		if let Some(url) = self.overrides.get(&operation) {
			return Ok(url.clone());
		}

		let base = match operation {
			Operation::CaptchaImage | Operation::CaptchaCheck | Operation::TokenExchange =>
				self.identity_base.as_ref(),
			_ => self.api_base.as_ref(),
		}
		.ok_or(StorefrontConfigError::MissingEndpoint { operation })?;

		join_path(base, default_path(operation)).ok_or_else(|| {
			StorefrontConfigError::InvalidEndpoint { operation, base: base.to_string() }
		})
	}
}

fn default_path(operation: Operation) -> &'static str {
	match operation {
		Operation::CaptchaImage => "captcha",
		Operation::CaptchaCheck => "captcha/check",
		Operation::TokenExchange => "token",
		Operation::Profile => "profile",
		Operation::OrderSubmit => "orders/submit",
		Operation::OrderStatus => "orders/status",
		Operation::OrderList => "orders",
	}
}

// `Url::join` drops the last path segment unless the base ends with a slash.
fn join_path(base: &Url, path: &str) -> Option<Url> {
	let mut base = base.clone();

	if !base.path().ends_with('/') {
		let with_slash = format!("{}/", base.path());

		base.set_path(&with_slash);
	}

	base.set_query(None);
	base.join(path).ok()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Fixture URL should parse.")
	}

	#[test]
	fn defaults_join_onto_bases_with_or_without_trailing_slash() {
		let config = StorefrontConfig::builder()
			.identity_base(url("https://id.example.com/oneid"))
			.api_base(url("https://shop.example.com/api/"))
			.build()
			.expect("Config should build from bases.");

		assert_eq!(
			config.endpoints.captcha_check.as_str(),
			"https://id.example.com/oneid/captcha/check"
		);
		assert_eq!(config.endpoints.token_exchange.as_str(), "https://id.example.com/oneid/token");
		assert_eq!(
			config.endpoints.order_status.as_str(),
			"https://shop.example.com/api/orders/status"
		);
		assert_eq!(config.facility_id, 100);
		assert_eq!(config.poll_interval, Duration::seconds(15));
		assert_eq!(config.poll_budget, 20);
		assert_eq!(config.profile_path, "/profile");
	}

	#[test]
	fn overrides_replace_derived_endpoints() {
		let config = StorefrontConfig::builder()
			.identity_base(url("https://id.example.com/"))
			.endpoint(Operation::Profile, url("https://accounts.example.com/me"))
			.endpoint(Operation::OrderSubmit, url("https://orders.example.com/new"))
			.endpoint(Operation::OrderStatus, url("https://orders.example.com/status"))
			.endpoint(Operation::OrderList, url("https://orders.example.com/list"))
			.build()
			.expect("Overrides should satisfy every API endpoint.");

		assert_eq!(config.endpoints.profile.as_str(), "https://accounts.example.com/me");
		assert_eq!(
			config.endpoints.get(Operation::OrderList).as_str(),
			"https://orders.example.com/list"
		);
	}

	#[test]
	fn build_reports_missing_and_insecure_endpoints() {
		let err = StorefrontConfig::builder()
			.identity_base(url("https://id.example.com/"))
			.build()
			.expect_err("Missing API base must fail.");

		assert_eq!(err, StorefrontConfigError::MissingEndpoint { operation: Operation::Profile });

		let err = StorefrontConfig::builder()
			.identity_base(url("http://id.example.com/"))
			.api_base(url("https://shop.example.com/"))
			.build()
			.expect_err("Plain HTTP must be rejected.");

		assert!(matches!(
			err,
			StorefrontConfigError::InsecureEndpoint { operation: Operation::CaptchaImage, .. }
		));
	}

	#[test]
	fn build_validates_polling_and_profile_path() {
		let builder = || {
			StorefrontConfig::builder()
				.identity_base(url("https://id.example.com/"))
				.api_base(url("https://shop.example.com/"))
		};

		assert_eq!(builder().poll_budget(0).build(), Err(StorefrontConfigError::ZeroPollBudget));
		assert_eq!(
			builder().poll_interval(Duration::seconds(-1)).build(),
			Err(StorefrontConfigError::NegativePollInterval)
		);
		assert!(matches!(
			builder().profile_path("profile").build(),
			Err(StorefrontConfigError::RelativeProfilePath { .. })
		));
	}
}
