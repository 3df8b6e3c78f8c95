//! Correlation code shared with the identity provider for the lifetime of a session.

// std
use std::ops::Deref;
// crates.io
use rand::Rng;
// self
use crate::_prelude::*;

const CODE_MAX_LEN: usize = 128;

/// Error returned when a correlation code fails validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum CorrelationCodeError {
	/// The code was empty.
	#[error("Correlation code cannot be empty.")]
	Empty,
	/// The code contains whitespace characters.
	#[error("Correlation code contains whitespace.")]
	ContainsWhitespace,
	/// The code exceeded the allowed character count.
	#[error("Correlation code exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Opaque client-generated identifier sent as `rcode` with every identity-provider call.
///
/// Freshly generated codes are 32 lowercase hex characters. Codes read back from storage only
/// need to be non-empty and free of whitespace.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CorrelationCode(String);
impl CorrelationCode {
	/// Validates an existing code.
	pub fn new(value: impl AsRef<str>) -> Result<Self, CorrelationCodeError> {
		let view = value.as_ref();

		validate(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Generates a random 128-bit code rendered as lowercase hex.
	pub fn generate() -> Self {
		let bytes = rand::rng().random::<[u8; 16]>();

		Self(bytes.iter().map(|byte| format!("{byte:02x}")).collect())
	}

	/// Returns the code as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Deref for CorrelationCode {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for CorrelationCode {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<CorrelationCode> for String {
	fn from(value: CorrelationCode) -> Self {
		value.0
	}
}
impl TryFrom<String> for CorrelationCode {
	type Error = CorrelationCodeError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate(&value)?;

		Ok(Self(value))
	}
}
impl FromStr for CorrelationCode {
	type Err = CorrelationCodeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for CorrelationCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "CorrelationCode({})", self.0)
	}
}
impl Display for CorrelationCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn validate(view: &str) -> Result<(), CorrelationCodeError> {
	if view.is_empty() {
		return Err(CorrelationCodeError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(CorrelationCodeError::ContainsWhitespace);
	}
	if view.len() > CODE_MAX_LEN {
		return Err(CorrelationCodeError::TooLong { max: CODE_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn generated_codes_are_lowercase_hex_and_distinct() {
		let first = CorrelationCode::generate();
		let second = CorrelationCode::generate();

		assert_eq!(first.len(), 32);
		assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
		assert_ne!(first, second);
	}

	#[test]
	fn stored_codes_are_validated() {
		assert_eq!(
			CorrelationCode::new("abc123").expect("Legacy codes should stay valid.").as_str(),
			"abc123"
		);
		assert_eq!(CorrelationCode::new(""), Err(CorrelationCodeError::Empty));
		assert_eq!(CorrelationCode::new("ab c"), Err(CorrelationCodeError::ContainsWhitespace));
		assert!(CorrelationCode::new("a".repeat(CODE_MAX_LEN + 1)).is_err());
		assert!(serde_json::from_str::<CorrelationCode>("\" abc\"").is_err());
	}
}
