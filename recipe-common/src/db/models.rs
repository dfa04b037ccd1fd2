//! Database models

use serde::Serialize;
use sqlx::FromRow;

use crate::Price;

/// Account row
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub password_salt: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl User {
    pub fn check_password(&self, password: &str) -> bool {
        crate::auth::verify_password(password, &self.password_hash, &self.password_salt)
    }
}

/// Recipe row without its tag/ingredient associations
#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price_cents: i64,
    pub link: String,
    pub description: String,
    pub image: Option<String>,
}

impl RecipeRow {
    pub fn price(&self) -> Price {
        Price::from_cents(self.price_cents)
    }
}

/// A tag or ingredient as rendered to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Attribute {
    pub id: i64,
    pub name: String,
}

/// Tags and ingredients share one shape; this selects the tables involved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Tag,
    Ingredient,
}

impl AttributeKind {
    /// Table holding the attribute rows
    pub const fn table(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tags",
            AttributeKind::Ingredient => "ingredients",
        }
    }

    /// Linking table between recipes and this attribute
    pub const fn link_table(self) -> &'static str {
        match self {
            AttributeKind::Tag => "recipe_tags",
            AttributeKind::Ingredient => "recipe_ingredients",
        }
    }

    /// Column in the linking table referencing the attribute
    pub const fn link_column(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tag_id",
            AttributeKind::Ingredient => "ingredient_id",
        }
    }

    /// Payload / query parameter name (`tags`, `ingredients`)
    pub const fn field(self) -> &'static str {
        self.table()
    }

    /// Singular label used in messages
    pub const fn label(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tag",
            AttributeKind::Ingredient => "ingredient",
        }
    }
}
