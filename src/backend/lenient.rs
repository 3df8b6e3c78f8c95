//! Decoders for scalar fields the backend sends as strings on some deployments and as numbers
//! on others.

// crates.io
use serde::Deserializer;
// self
use crate::_prelude::*;

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
	Text(String),
	Integer(i64),
	Float(f64),
	Flag(bool),
}
impl From<Lenient> for String {
	fn from(value: Lenient) -> Self {
		match value {
			Lenient::Text(text) => text,
			Lenient::Integer(number) => number.to_string(),
			Lenient::Float(number) => number.to_string(),
			Lenient::Flag(flag) => flag.to_string(),
		}
	}
}

/// Reads a string, number, or boolean as its string form.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	Lenient::deserialize(deserializer).map(String::from)
}

/// Like [`text`], with `null` read as `None`.
pub(crate) fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(Option::<Lenient>::deserialize(deserializer)?.map(String::from))
}
