//! Persisted order selection (modification, color, dealer).

// self
use crate::{
	_prelude::*,
	backend::TransportErrorMapper,
	flows::Storefront,
	http::ApiHttpClient,
	store::StoreSlot,
};

/// Vehicle configuration and dealer the user picked for a purchase.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSelection {
	/// Selected vehicle modification.
	pub modification_id: String,
	/// Selected body color.
	pub color_id: String,
	/// Selected dealer.
	pub dealer_id: String,
}
impl OrderSelection {
	/// Creates a selection from the three identifiers.
	pub fn new(
		modification_id: impl Into<String>,
		color_id: impl Into<String>,
		dealer_id: impl Into<String>,
	) -> Self {
		Self {
			modification_id: modification_id.into(),
			color_id: color_id.into(),
			dealer_id: dealer_id.into(),
		}
	}

	/// Fails with [`Error::MissingData`] naming the first blank identifier.
	pub fn validate(&self) -> Result<()> {
		for (field, value) in self.fields() {
			if value.trim().is_empty() {
				return Err(Error::MissingData { field });
			}
		}

		Ok(())
	}

	/// Returns `true` when every identifier is present.
	pub fn is_complete(&self) -> bool {
		self.validate().is_ok()
	}

	fn fields(&self) -> [(&'static str, &str); 3] {
		[
			("modification id", &self.modification_id),
			("color id", &self.color_id),
			("dealer id", &self.dealer_id),
		]
	}

	fn slots(&self) -> [(StoreSlot, &str); 3] {
		[
			(StoreSlot::ModificationId, &self.modification_id),
			(StoreSlot::ColorId, &self.color_id),
			(StoreSlot::DealerId, &self.dealer_id),
		]
	}
}

impl<C, M> Storefront<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Persists the selection. Blank identifiers clear their slot, so a partial selection
	/// can be saved while the user is still choosing.
	pub async fn select_order(&self, selection: &OrderSelection) -> Result<()> {
		for (slot, value) in selection.slots() {
			let value = value.trim();

			if value.is_empty() {
				self.store.clear(&[slot]).await?;
			} else {
				self.store.set(slot, value.to_owned()).await?;
			}
		}

		Ok(())
	}

	/// Reads the persisted selection; absent identifiers come back empty.
	pub async fn order_selection(&self) -> Result<OrderSelection> {
		let mut selection = OrderSelection::default();

		selection.modification_id =
			self.store.get(StoreSlot::ModificationId).await?.unwrap_or_default();
		selection.color_id = self.store.get(StoreSlot::ColorId).await?.unwrap_or_default();
		selection.dealer_id = self.store.get(StoreSlot::DealerId).await?.unwrap_or_default();

		Ok(selection)
	}

	/// Forgets the persisted selection.
	pub async fn clear_order_selection(&self) -> Result<()> {
		self.store.clear(&StoreSlot::SELECTION).await?;

		Ok(())
	}
}
