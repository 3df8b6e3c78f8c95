//! Identity-domain values: the correlation code, redacted secrets, and the user profile.

pub mod code;
pub mod profile;
pub mod secret;

pub use code::*;
pub use profile::*;
pub use secret::*;
