//! Storefront configuration: endpoints, facility context, and polling policy.
//!
//! [`StorefrontConfig`] is validated data. Build it with [`StorefrontConfig::builder`] or
//! deserialize it and call [`StorefrontConfig::validate`]; every flow reads it immutably.

pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, backend::Operation};

/// Endpoint set used by the identity and storefront flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
	/// Captcha image served by the identity provider.
	pub captcha_image: Url,
	/// Captcha verification endpoint.
	pub captcha_check: Url,
	/// Secret → bearer token exchange endpoint.
	pub token_exchange: Url,
	/// User profile endpoint.
	pub profile: Url,
	/// Order submission endpoint.
	pub order_submit: Url,
	/// Order status endpoint.
	pub order_status: Url,
	/// Order list endpoint.
	pub order_list: Url,
}
impl Endpoints {
	/// Returns the URL configured for `operation`.
	pub fn get(&self, operation: Operation) -> &Url {
		match operation {
			Operation::CaptchaImage => &self.captcha_image,
			Operation::CaptchaCheck => &self.captcha_check,
			Operation::TokenExchange => &self.token_exchange,
			Operation::Profile => &self.profile,
			Operation::OrderSubmit => &self.order_submit,
			Operation::OrderStatus => &self.order_status,
			Operation::OrderList => &self.order_list,
		}
	}
}

/// Validated storefront configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontConfig {
	/// Endpoint definitions.
	pub endpoints: Endpoints,
	/// Branch/filial identifier sent with profile, order, and order-list calls.
	pub facility_id: u32,
	/// Wait between two non-terminal status polls.
	pub poll_interval: Duration,
	/// Maximum number of status polls per submission.
	pub poll_budget: u32,
	/// In-app path the user is sent to once an order is approved.
	pub profile_path: String,
}
impl StorefrontConfig {
	/// Facility identifier used by the storefront backend.
	pub const DEFAULT_FACILITY_ID: u32 = 100;
	/// Delay between two status polls.
	pub const DEFAULT_POLL_INTERVAL: Duration = Duration::seconds(15);
	/// Number of status polls before giving up.
	pub const DEFAULT_POLL_BUDGET: u32 = 20;
	/// Account view shown after an approved order.
	pub const DEFAULT_PROFILE_PATH: &str = "/profile";

	/// Creates an empty builder.
	pub fn builder() -> StorefrontConfigBuilder {
		StorefrontConfigBuilder::default()
	}

	/// Validates invariants; call after deserializing.
	pub fn validate(&self) -> Result<(), StorefrontConfigError> {
		for operation in Operation::ALL {
			let url = self.endpoints.get(operation);

			if url.scheme() != "https" {
				return Err(StorefrontConfigError::InsecureEndpoint {
					operation,
					url: url.to_string(),
				});
			}
		}

		if self.poll_budget == 0 {
			return Err(StorefrontConfigError::ZeroPollBudget);
		}
		if self.poll_interval.is_negative() {
			return Err(StorefrontConfigError::NegativePollInterval);
		}
		if !self.profile_path.starts_with('/') {
			return Err(StorefrontConfigError::RelativeProfilePath {
				path: self.profile_path.clone(),
			});
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config() -> StorefrontConfig {
		StorefrontConfig::builder()
			.identity_base(Url::parse("https://id.example.com/api").expect("Base should parse."))
			.api_base(Url::parse("https://shop.example.com/v1/").expect("Base should parse."))
			.build()
			.expect("Config should build.")
	}

	#[test]
	fn serde_round_trip_keeps_validated_values() {
		let config = config();
		let payload = serde_json::to_string(&config).expect("Config should serialize.");
		let decoded: StorefrontConfig =
			serde_json::from_str(&payload).expect("Config should deserialize.");

		assert_eq!(decoded, config);
		assert!(decoded.validate().is_ok());
	}

	#[test]
	fn validate_rejects_tampered_values() {
		let mut config = config();

		config.poll_budget = 0;

		assert_eq!(config.validate(), Err(StorefrontConfigError::ZeroPollBudget));

		let mut config = self::config();

		config.endpoints.order_status =
			Url::parse("http://shop.example.com/v1/orders/status").expect("URL should parse.");

		assert!(matches!(
			config.validate(),
			Err(StorefrontConfigError::InsecureEndpoint { operation: Operation::OrderStatus, .. })
		));
	}
}
