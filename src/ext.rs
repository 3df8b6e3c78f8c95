//! Public extension contracts implemented by the embedding application.
//!
//! The crate never renders anything. Whatever hosts it (a web shell, a desktop app, a test
//! harness) receives navigation requests through [`Navigator`].

pub mod navigator;

pub use navigator::*;
