//! Database access for recipe-api
//!
//! Every query that touches recipes, tags or ingredients is scoped by the
//! owning user id; rows belonging to other users are indistinguishable from
//! missing rows.

pub mod attributes;
pub mod recipes;
pub mod tokens;
pub mod users;

pub use recipe_common::db::{init_database, init_memory_database, wait_for_database};
