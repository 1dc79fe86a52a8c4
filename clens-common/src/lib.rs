//! # CulinaryLens Common Library
//!
//! Shared code for the CulinaryLens crates including:
//! - Ingredient and protocol data model
//! - Common error type
//! - TOML bootstrap configuration
//! - Perception progress events

pub mod config;
pub mod error;
pub mod events;
pub mod models;

pub use error::{Error, Result};
