//! HTTP API handlers for recipe-api

pub mod attributes;
pub mod auth;
pub mod body;
pub mod health;
pub mod recipes;
pub mod schema;
pub mod users;

pub use attributes::attribute_routes;
pub use auth::{require_auth, CurrentUser};
pub use body::Payload;
pub use health::health_routes;
pub use recipes::recipe_routes;
pub use schema::schema_routes;
