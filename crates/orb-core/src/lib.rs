//! Core domain + application logic for the OpenRouter Telegram bot.
//!
//! This crate is intentionally framework-agnostic. Telegram / Supabase /
//! OpenRouter live behind ports (traits) implemented in adapter crates.

pub mod chat;
pub mod config;
pub mod context;
pub mod domain;
pub mod errors;
pub mod files;
pub mod formatting;
pub mod logging;
pub mod policy;
pub mod ports;
pub mod profiles;
pub mod quota;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
