//! Tag and ingredient persistence
//!
//! Both kinds share one implementation parameterised by [`AttributeKind`].
//! Table and column names come from the kind, never from user input.

use recipe_common::db::{Attribute, AttributeKind};
use recipe_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

/// List a user's attributes, newest name first
///
/// With `assigned_only`, only attributes linked to at least one recipe.
pub async fn list_attributes(
    pool: &SqlitePool,
    kind: AttributeKind,
    user_id: i64,
    assigned_only: bool,
) -> Result<Vec<Attribute>> {
    let mut sql = format!("SELECT a.id, a.name FROM {} a WHERE a.user_id = ?", kind.table());
    if assigned_only {
        sql.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM {} l WHERE l.{} = a.id)",
            kind.link_table(),
            kind.link_column()
        ));
    }
    sql.push_str(" ORDER BY a.name DESC, a.id DESC");

    let rows = sqlx::query_as::<_, Attribute>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Load one attribute owned by `user_id`
pub async fn get_attribute(
    pool: &SqlitePool,
    kind: AttributeKind,
    user_id: i64,
    id: i64,
) -> Result<Option<Attribute>> {
    let row = sqlx::query_as::<_, Attribute>(&format!(
        "SELECT id, name FROM {} WHERE id = ? AND user_id = ?",
        kind.table()
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Rename an attribute; `None` if it doesn't exist for this user
pub async fn rename_attribute(
    pool: &SqlitePool,
    kind: AttributeKind,
    user_id: i64,
    id: i64,
    name: &str,
) -> Result<Option<Attribute>> {
    let result = sqlx::query(&format!(
        "UPDATE {} SET name = ? WHERE id = ? AND user_id = ?",
        kind.table()
    ))
    .bind(name)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_attribute(pool, kind, user_id, id).await
}

/// Delete an attribute and its recipe links; `false` if not found
pub async fn delete_attribute(
    pool: &SqlitePool,
    kind: AttributeKind,
    user_id: i64,
    id: i64,
) -> Result<bool> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE id = ? AND user_id = ?",
        kind.table()
    ))
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Id of the user's attribute called `name`, inserting it if missing
///
/// Duplicate names are not prevented by the schema; the oldest match wins.
pub async fn get_or_create(
    conn: &mut SqliteConnection,
    kind: AttributeKind,
    user_id: i64,
    name: &str,
) -> Result<i64> {
    let existing: Option<i64> = sqlx::query_scalar(&format!(
        "SELECT id FROM {} WHERE user_id = ? AND name = ? ORDER BY id LIMIT 1",
        kind.table()
    ))
    .bind(user_id)
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let result = sqlx::query(&format!(
        "INSERT INTO {} (user_id, name) VALUES (?, ?)",
        kind.table()
    ))
    .bind(user_id)
    .bind(name)
    .execute(&mut *conn)
    .await?;

    debug!("Created {} {:?} for user {}", kind.label(), name, user_id);
    Ok(result.last_insert_rowid())
}

/// Replace a recipe's links of `kind` with the named attributes
///
/// An empty list clears the links.
pub async fn replace_recipe_attributes(
    conn: &mut SqliteConnection,
    kind: AttributeKind,
    user_id: i64,
    recipe_id: i64,
    names: &[String],
) -> Result<()> {
    sqlx::query(&format!("DELETE FROM {} WHERE recipe_id = ?", kind.link_table()))
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    for name in names {
        let attribute_id = get_or_create(conn, kind, user_id, name).await?;
        sqlx::query(&format!(
            "INSERT OR IGNORE INTO {} (recipe_id, {}) VALUES (?, ?)",
            kind.link_table(),
            kind.link_column()
        ))
        .bind(recipe_id)
        .bind(attribute_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Attributes of `kind` linked to each of `recipe_ids`, ordered by id
pub async fn attributes_for_recipes(
    pool: &SqlitePool,
    kind: AttributeKind,
    recipe_ids: &[i64],
) -> Result<HashMap<i64, Vec<Attribute>>> {
    let mut by_recipe: HashMap<i64, Vec<Attribute>> = HashMap::new();
    if recipe_ids.is_empty() {
        return Ok(by_recipe);
    }

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT l.recipe_id, a.id, a.name FROM {link} l JOIN {table} a ON a.id = l.{column} WHERE l.recipe_id IN (",
        link = kind.link_table(),
        table = kind.table(),
        column = kind.link_column(),
    ));
    let mut ids = query.separated(", ");
    for id in recipe_ids {
        ids.push_bind(*id);
    }
    query.push(") ORDER BY a.id");

    let rows: Vec<(i64, i64, String)> = query.build_query_as().fetch_all(pool).await?;
    for (recipe_id, id, name) in rows {
        by_recipe
            .entry(recipe_id)
            .or_default()
            .push(Attribute { id, name });
    }

    Ok(by_recipe)
}
