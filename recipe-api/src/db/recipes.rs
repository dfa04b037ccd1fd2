//! Recipe persistence
//!
//! Every query is scoped to the owning user. A recipe owned by someone else
//! is indistinguishable from one that doesn't exist.

use recipe_common::db::{Attribute, AttributeKind, RecipeRow};
use recipe_common::{Error, Price, Result};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use super::attributes::{attributes_for_recipes, replace_recipe_attributes};

const RECIPE_COLUMNS: &str =
    "id, user_id, title, time_minutes, price_cents, link, description, image";

/// Recipe with its tags and ingredients
#[derive(Debug, Clone)]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: Price,
    pub link: String,
    pub description: String,
    /// Path relative to the media root
    pub image: Option<String>,
    pub tags: Vec<Attribute>,
    pub ingredients: Vec<Attribute>,
}

impl Recipe {
    fn from_row(row: RecipeRow, tags: Vec<Attribute>, ingredients: Vec<Attribute>) -> Self {
        let price = row.price();
        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            time_minutes: row.time_minutes,
            price,
            link: row.link,
            description: row.description,
            image: row.image,
            tags,
            ingredients,
        }
    }
}

/// List filters; each set matches recipes linked to any of its ids
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<i64>>,
}

/// Validated fields of a new recipe
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i64,
    pub price: Price,
    pub link: String,
    pub description: String,
    pub tags: Vec<String>,
    pub ingredients: Vec<String>,
}

/// Changes applied by an update; `None` leaves a field untouched
///
/// `Some` tag or ingredient names replace the whole set.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<Price>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<String>>,
}

/// A user's recipes, newest first
pub async fn list_recipes(
    pool: &SqlitePool,
    user_id: i64,
    filter: &RecipeFilter,
) -> Result<Vec<Recipe>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE user_id = "));
    query.push_bind(user_id);

    if let Some(ids) = &filter.tags {
        push_link_filter(&mut query, AttributeKind::Tag, ids);
    }
    if let Some(ids) = &filter.ingredients {
        push_link_filter(&mut query, AttributeKind::Ingredient, ids);
    }
    query.push(" ORDER BY id DESC");

    let rows: Vec<RecipeRow> = query.build_query_as().fetch_all(pool).await?;
    debug!("Listed {} recipes for user {}", rows.len(), user_id);
    attach_attributes(pool, rows).await
}

/// Restrict to recipes linked to any of `ids`; the subquery keeps rows distinct
fn push_link_filter(query: &mut QueryBuilder<Sqlite>, kind: AttributeKind, ids: &[i64]) {
    if ids.is_empty() {
        query.push(" AND 0");
        return;
    }

    query.push(format!(
        " AND id IN (SELECT recipe_id FROM {} WHERE {} IN (",
        kind.link_table(),
        kind.link_column()
    ));
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    query.push("))");
}

async fn attach_attributes(pool: &SqlitePool, rows: Vec<RecipeRow>) -> Result<Vec<Recipe>> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut tags = attributes_for_recipes(pool, AttributeKind::Tag, &ids).await?;
    let mut ingredients = attributes_for_recipes(pool, AttributeKind::Ingredient, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.id;
            Recipe::from_row(
                row,
                tags.remove(&id).unwrap_or_default(),
                ingredients.remove(&id).unwrap_or_default(),
            )
        })
        .collect())
}

async fn get_row(pool: &SqlitePool, user_id: i64, id: i64) -> Result<Option<RecipeRow>> {
    let row = sqlx::query_as::<_, RecipeRow>(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ? AND user_id = ?"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Load one recipe owned by `user_id`
pub async fn get_recipe(pool: &SqlitePool, user_id: i64, id: i64) -> Result<Option<Recipe>> {
    let Some(row) = get_row(pool, user_id, id).await? else {
        return Ok(None);
    };
    Ok(attach_attributes(pool, vec![row]).await?.pop())
}

async fn reload(pool: &SqlitePool, user_id: i64, id: i64) -> Result<Recipe> {
    get_recipe(pool, user_id, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("recipe {} vanished after write", id)))
}

/// Insert a recipe with its tags and ingredients in one transaction
pub async fn create_recipe(pool: &SqlitePool, user_id: i64, recipe: &NewRecipe) -> Result<Recipe> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO recipes (user_id, title, time_minutes, price_cents, link, description)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(&recipe.title)
    .bind(recipe.time_minutes)
    .bind(recipe.price.cents())
    .bind(&recipe.link)
    .bind(&recipe.description)
    .execute(&mut *tx)
    .await?;
    let id = result.last_insert_rowid();

    replace_recipe_attributes(&mut *tx, AttributeKind::Tag, user_id, id, &recipe.tags).await?;
    replace_recipe_attributes(&mut *tx, AttributeKind::Ingredient, user_id, id, &recipe.ingredients)
        .await?;

    tx.commit().await?;
    debug!("Created recipe {} for user {}", id, user_id);

    reload(pool, user_id, id).await
}

/// Apply `changes`; `None` if the recipe doesn't exist for this user
pub async fn update_recipe(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
    changes: &RecipeChanges,
) -> Result<Option<Recipe>> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE recipes SET
            title = COALESCE(?, title),
            time_minutes = COALESCE(?, time_minutes),
            price_cents = COALESCE(?, price_cents),
            link = COALESCE(?, link),
            description = COALESCE(?, description),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(changes.title.as_deref())
    .bind(changes.time_minutes)
    .bind(changes.price.map(|p| p.cents()))
    .bind(changes.link.as_deref())
    .bind(changes.description.as_deref())
    .bind(id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    if let Some(tags) = &changes.tags {
        replace_recipe_attributes(&mut *tx, AttributeKind::Tag, user_id, id, tags).await?;
    }
    if let Some(ingredients) = &changes.ingredients {
        replace_recipe_attributes(&mut *tx, AttributeKind::Ingredient, user_id, id, ingredients)
            .await?;
    }

    tx.commit().await?;
    reload(pool, user_id, id).await.map(Some)
}

/// Delete a recipe and return the removed row (for image cleanup)
pub async fn delete_recipe(pool: &SqlitePool, user_id: i64, id: i64) -> Result<Option<RecipeRow>> {
    let row = sqlx::query_as::<_, RecipeRow>(&format!(
        "DELETE FROM recipes WHERE id = ? AND user_id = ? RETURNING {RECIPE_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Outcome of replacing a recipe image
#[derive(Debug, Clone)]
pub struct ImageReplaced {
    pub recipe: Recipe,
    /// Path of the image that was replaced, if any
    pub previous: Option<String>,
}

/// Point the recipe at a newly stored image
pub async fn set_recipe_image(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
    image: &str,
) -> Result<Option<ImageReplaced>> {
    let mut tx = pool.begin().await?;

    // Write before reading: a deferred transaction that reads first can't
    // wait for the write lock
    let touched = sqlx::query(
        "UPDATE recipes SET updated_at = CURRENT_TIMESTAMP WHERE id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();
    if touched == 0 {
        return Ok(None);
    }

    let previous: Option<String> = sqlx::query_scalar("SELECT image FROM recipes WHERE id = ?")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query("UPDATE recipes SET image = ? WHERE id = ?")
        .bind(image)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let recipe = reload(pool, user_id, id).await?;
    Ok(Some(ImageReplaced { recipe, previous }))
}
