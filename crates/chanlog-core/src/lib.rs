//! Core of the channel logger bot.
//!
//! Framework-agnostic: the messaging client and the user directory live
//! behind ports (traits) implemented in adapter crates.

pub mod buttons;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logger;
pub mod logging;
pub mod messaging;
pub mod security;
pub mod template;
pub mod welcome;

pub use errors::{Error, Result};
