//! Core library for the sensord home-automation endpoint
//!
//! Holds everything the HTTP daemon delegates to: the file-backed collection
//! store, the smart-plug actuator interface, configuration loading, and the
//! LAN address helper used by the startup banner.

pub mod actuator;
pub mod config;
pub mod error;
pub mod net;
pub mod store;

pub use error::{CoreError, Result};
pub use store::{CollectionStore, StoreError};
