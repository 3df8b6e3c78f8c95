//! Restores a stored session against a live storefront and reports the order history.
//!
//! Set `STOREFRONT_IDENTITY_BASE` and `STOREFRONT_API_BASE`, then run the demo twice: the first
//! run prints the captcha URL and reads the answer from stdin, the second reuses the session
//! persisted in `STOREFRONT_STATE` (default `storefront-state.json`).

// std
use std::{env, io, sync::Arc};
// crates.io
use color_eyre::{Result, eyre::eyre};
use url::Url;
// self
use dealer_storefront::{
	config::StorefrontConfig,
	flows::{CaptchaCheck, HandshakeOutcome, SessionOutcome, Storefront},
	store::{FileStore, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = StorefrontConfig::builder()
		.identity_base(Url::parse(&env::var("STOREFRONT_IDENTITY_BASE")?)?)
		.api_base(Url::parse(&env::var("STOREFRONT_API_BASE")?)?)
		.build()?;
	let state_path =
		env::var("STOREFRONT_STATE").unwrap_or_else(|_| "storefront-state.json".into());
	let store: Arc<dyn SessionStore> = Arc::new(FileStore::open(state_path)?);
	let storefront = Storefront::new(store, config)?;

	match storefront.restore_session().await? {
		SessionOutcome::Authorized { reauthenticated } => {
			println!("Session restored (re-authenticated: {reauthenticated}).");
		},
		SessionOutcome::Unavailable => return Err(eyre!("The storefront is unavailable.")),
		SessionOutcome::Anonymous | SessionOutcome::Rejected => {
			println!("Solve the captcha at {}", storefront.captcha_challenge_url().await?);

			let mut answer = String::new();

			io::stdin().read_line(&mut answer)?;

			let CaptchaCheck::Verified { redirect_url } =
				storefront.verify_captcha(&answer).await
			else {
				return Err(eyre!("The captcha was rejected."));
			};

			println!("The identity provider continues at {redirect_url}.");

			if storefront.complete_handshake().await != HandshakeOutcome::Completed {
				return Err(eyre!("The identity handshake failed."));
			}

			println!("Session: {:?}.", storefront.restore_session().await?);
		},
	}

	for order in storefront.orders().await? {
		println!(
			"Order {} for modification {}: status {}.",
			order.id.as_deref().unwrap_or("?"),
			order.modification_id.as_deref().unwrap_or("?"),
			order.status.as_deref().unwrap_or("?"),
		);
	}

	Ok(())
}
