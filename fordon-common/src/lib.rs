//! # Fordon Common Library
//!
//! Shared code for the fordon registry services including:
//! - Database initialization and schema migrations
//! - Configuration loading and root folder resolution
//! - Common error types

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
