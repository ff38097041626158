//! Power-Dict library
//!
//! Exposes the stores, the Wordnik client and the menu so integration tests
//! can drive them without the binary.

pub mod cli;
pub mod menu;
pub mod provider;
pub mod store;
