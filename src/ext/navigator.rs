//! Navigation contract used when a flow wants to move the user somewhere else.

// self
use crate::{_prelude::*, obs};

/// Receives navigation requests issued by storefront flows.
///
/// Both calls are fire-and-forget: the flow does not wait for the UI to settle.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Moves the user to an in-app path, e.g. `/profile` after an approved order.
	fn navigate(&self, path: &str);

	/// Performs a full-page redirect, e.g. to the identity provider after captcha verification.
	fn redirect(&self, url: &Url);
}

/// Default [`Navigator`] that only logs the requested destination.
#[derive(Clone, Debug, Default)]
pub struct NoopNavigator;
impl Navigator for NoopNavigator {
	fn navigate(&self, path: &str) {
		obs::flow_debug!("navigation to {path} requested without a navigator");
	}

	fn redirect(&self, url: &Url) {
		let origin = url.origin().ascii_serialization();

		obs::flow_debug!("redirect to {origin} requested without a navigator");
	}
}
