//! # Recipe Common Library
//!
//! Shared code for the recipe service including:
//! - Error types and field-level validation errors
//! - Bootstrap configuration loading
//! - Database initialization, schema and migrations
//! - Row models
//! - Password hashing and token generation
//! - Payload validation helpers (text fields, emails, prices, id lists)

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod price;
pub mod validation;

pub use error::{Error, Result};
pub use price::Price;
pub use validation::FieldErrors;
