//! Authenticated user profile returned by the storefront backend.

// crates.io
use serde::Deserializer;
// self
use crate::{_prelude::*, backend::lenient};

/// Legal classification of the account holder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientKind {
	/// Private person.
	Individual,
	/// Registered company.
	Entity,
	/// Any classification the client does not recognize.
	#[default]
	Unknown,
}
impl ClientKind {
	/// Classifies a raw backend value; unrecognized values, numeric codes included, map to
	/// [`ClientKind::Unknown`].
	pub fn from_code(code: &str) -> Self {
		match code.trim().to_ascii_lowercase().as_str() {
			"individual" | "physical" | "person" => Self::Individual,
			"entity" | "legal" | "company" => Self::Entity,
			_ => Self::Unknown,
		}
	}
}
impl<'de> Deserialize<'de> for ClientKind {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		lenient::text(deserializer).map(|code| Self::from_code(&code))
	}
}

/// Profile payload cached after a successful authenticated fetch.
///
/// Deployments disagree on field names and scalar types. When several names for one field are
/// present, the canonical name wins, then the aliases in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawProfile")]
pub struct UserProfile {
	/// Display name.
	pub name: Option<String>,
	/// Contact phone number.
	pub phone: Option<String>,
	/// Contact email address.
	pub email: Option<String>,
	/// Taxpayer identifier.
	pub tax_id: Option<String>,
	/// Individual or entity.
	pub client_kind: ClientKind,
}
impl UserProfile {
	/// Returns `true` when the account belongs to a registered company.
	pub fn is_entity(&self) -> bool {
		self.client_kind == ClientKind::Entity
	}
}
impl From<RawProfile> for UserProfile {
	fn from(raw: RawProfile) -> Self {
		Self {
			name: raw.name.or(raw.full_name),
			phone: raw.phone.or(raw.phone_number),
			email: raw.email,
			tax_id: raw.tax_id.or(raw.tin).or(raw.inn),
			client_kind: raw
				.client_kind
				.or(raw.client_type)
				.or(raw.kind)
				.unwrap_or_default(),
		}
	}
}

// Every spelling gets its own slot so payloads carrying two of them still decode.
#[derive(Deserialize)]
struct RawProfile {
	#[serde(default, deserialize_with = "lenient::optional_text")]
	name: Option<String>,
	#[serde(default, deserialize_with = "lenient::optional_text")]
	full_name: Option<String>,
	#[serde(default, deserialize_with = "lenient::optional_text")]
	phone: Option<String>,
	#[serde(default, deserialize_with = "lenient::optional_text")]
	phone_number: Option<String>,
	#[serde(default, deserialize_with = "lenient::optional_text")]
	email: Option<String>,
	#[serde(default, deserialize_with = "lenient::optional_text")]
	tax_id: Option<String>,
	#[serde(default, deserialize_with = "lenient::optional_text")]
	tin: Option<String>,
	#[serde(default, deserialize_with = "lenient::optional_text")]
	inn: Option<String>,
	#[serde(default)]
	client_kind: Option<ClientKind>,
	#[serde(default)]
	client_type: Option<ClientKind>,
	#[serde(default, rename = "type")]
	kind: Option<ClientKind>,
}
