//! Recipe endpoints
//!
//! Lists use the summary representation; everything else returns the detail
//! representation, which adds the description and image URL.

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{PathRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use recipe_common::db::{Attribute, AttributeKind};
use recipe_common::filters::optional_id_list;
use recipe_common::validation::{
    clean_integer, clean_text, non_null, report_missing, CharField, FieldErrors,
    MAX_NAME_LENGTH, REQUIRED,
};
use recipe_common::Price;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::auth::CurrentUser;
use super::body::Payload;
use crate::db::recipes::{self, NewRecipe, Recipe, RecipeChanges, RecipeFilter};
use crate::error::{ApiError, ApiResult};
use crate::media::{detect_image, MediaStore};
use crate::AppState;

/// Largest accepted image upload
pub const MAX_IMAGE_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const NO_FILE: &str = "No file was submitted.";
const EMPTY_FILE: &str = "The submitted file is empty.";
const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Body of recipe writes
///
/// Kept as raw JSON so that `null`, wrong types and strings like `"5.50"` are
/// all reported per field. Unknown keys such as `user` are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct RecipePayload(Map<String, Value>);

impl RecipePayload {
    fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Value of a required field; absence is reported unless `partial`
    fn required(&self, errors: &mut FieldErrors, field: &str, partial: bool) -> Option<&Value> {
        let value = self.0.get(field);
        if value.is_none() {
            report_missing(errors, field, partial);
        }
        value
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipeListParams {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

/// List representation
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: Price,
    pub link: String,
    pub tags: Vec<Attribute>,
    pub ingredients: Vec<Attribute>,
}

/// Detail representation
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub summary: RecipeSummary,
    pub description: String,
    /// Public URL of the image
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecipeImageResponse {
    pub id: i64,
    pub image: Option<String>,
}

impl RecipeSummary {
    fn from_recipe(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags: recipe.tags,
            ingredients: recipe.ingredients,
        }
    }
}

impl RecipeDetail {
    fn new(mut recipe: Recipe, media: &MediaStore) -> Self {
        let image = recipe.image.take().map(|path| media.url_for(&path));
        let description = std::mem::take(&mut recipe.description);
        Self {
            summary: RecipeSummary::from_recipe(recipe),
            description,
            image,
        }
    }
}

/// Python-style type name used in nested payload errors
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Validate nested names under `field`
///
/// `value` must be a list of `{"name": ...}` objects. Item errors are
/// prefixed with the item's position.
fn clean_names(errors: &mut FieldErrors, field: &str, value: &Value) -> Option<Vec<String>> {
    let items = match non_null(errors, field, value)? {
        Value::Array(items) => items,
        other => {
            errors.add(
                field,
                format!("Expected a list of items but got type \"{}\".", type_name(other)),
            );
            return None;
        }
    };

    let name_field = CharField::new().max_length(MAX_NAME_LENGTH);
    let mut names = Vec::with_capacity(items.len());
    let mut valid = true;

    for (index, item) in items.iter().enumerate() {
        let Value::Object(item) = item else {
            errors.add(
                field,
                format!(
                    "Item {}: Invalid data. Expected a dictionary, but got {}.",
                    index,
                    type_name(item)
                ),
            );
            valid = false;
            continue;
        };

        let mut item_errors = FieldErrors::new();
        let cleaned = match item.get("name") {
            Some(name) => clean_text(&mut item_errors, "name", name)
                .and_then(|name| name_field.clean(&mut item_errors, "name", &name)),
            None => {
                item_errors.add("name", REQUIRED);
                None
            }
        };

        match cleaned {
            Some(name) => names.push(name),
            None => {
                valid = false;
                for message in item_errors.get("name").unwrap_or_default() {
                    errors.add(field, format!("Item {}: name: {}", index, message));
                }
            }
        }
    }

    valid.then_some(names)
}

/// Validate a recipe payload
///
/// Title, time and price are required unless `partial`.
fn clean_recipe(payload: &RecipePayload, partial: bool) -> Result<RecipeChanges, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = payload
        .required(&mut errors, "title", partial)
        .and_then(|value| clean_text(&mut errors, "title", value))
        .and_then(|title| {
            CharField::new()
                .max_length(MAX_NAME_LENGTH)
                .clean(&mut errors, "title", &title)
        });

    let time_minutes = payload
        .required(&mut errors, "time_minutes", partial)
        .and_then(|value| clean_integer(&mut errors, "time_minutes", value));

    let price = payload
        .required(&mut errors, "price", partial)
        .and_then(|value| non_null(&mut errors, "price", value))
        .and_then(|value| {
            Price::from_json(value)
                .map_err(|e| errors.add("price", e.to_string()))
                .ok()
        });

    let link = payload
        .get("link")
        .and_then(|value| clean_text(&mut errors, "link", value))
        .and_then(|link| {
            CharField::new()
                .max_length(MAX_NAME_LENGTH)
                .allow_blank()
                .clean(&mut errors, "link", &link)
        });

    let description = payload
        .get("description")
        .and_then(|value| clean_text(&mut errors, "description", value))
        .and_then(|d| CharField::new().allow_blank().clean(&mut errors, "description", &d));

    let tags = payload
        .get(AttributeKind::Tag.field())
        .and_then(|value| clean_names(&mut errors, AttributeKind::Tag.field(), value));

    let ingredients = payload
        .get(AttributeKind::Ingredient.field())
        .and_then(|value| clean_names(&mut errors, AttributeKind::Ingredient.field(), value));

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(RecipeChanges {
        title,
        time_minutes,
        price,
        link,
        description,
        tags,
        ingredients,
    })
}

fn recipe_id(path: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    // Non-numeric ids can't name a recipe
    path.map(|Path(id)| id).map_err(|_| ApiError::NotFound)
}

/// GET /api/recipe/recipes/
pub async fn list_recipes(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    params: Result<Query<RecipeListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<RecipeSummary>>> {
    let Query(params) = params?;

    let tags = optional_id_list("tags", params.tags.as_deref())?;
    let ingredients = optional_id_list("ingredients", params.ingredients.as_deref())?;

    let filter = RecipeFilter { tags, ingredients };
    let recipes = recipes::list_recipes(&state.db, user.id, &filter).await?;
    Ok(Json(recipes.into_iter().map(RecipeSummary::from_recipe).collect()))
}

/// POST /api/recipe/recipes/
pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: ApiResult<Payload<RecipePayload>>,
) -> ApiResult<(StatusCode, Json<RecipeDetail>)> {
    let Payload(payload) = payload?;

    let RecipeChanges {
        title: Some(title),
        time_minutes: Some(time_minutes),
        price: Some(price),
        link,
        description,
        tags,
        ingredients,
    } = clean_recipe(&payload, false)?
    else {
        return Err(ApiError::Internal("validated recipe is incomplete".to_string()));
    };

    let new_recipe = NewRecipe {
        title,
        time_minutes,
        price,
        link: link.unwrap_or_default(),
        description: description.unwrap_or_default(),
        tags: tags.unwrap_or_default(),
        ingredients: ingredients.unwrap_or_default(),
    };

    let recipe = recipes::create_recipe(&state.db, user.id, &new_recipe).await?;
    info!("User {} created recipe {}", user.id, recipe.id);

    Ok((StatusCode::CREATED, Json(RecipeDetail::new(recipe, &state.media))))
}

/// GET /api/recipe/recipes/:id/
pub async fn get_recipe(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<RecipeDetail>> {
    let id = recipe_id(path)?;
    let recipe = recipes::get_recipe(&state.db, user.id, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(RecipeDetail::new(recipe, &state.media)))
}

/// PUT /api/recipe/recipes/:id/
pub async fn put_recipe(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: ApiResult<Payload<RecipePayload>>,
) -> ApiResult<Json<RecipeDetail>> {
    update_recipe(state, user.id, recipe_id(path)?, payload, false).await
}

/// PATCH /api/recipe/recipes/:id/
pub async fn patch_recipe(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: ApiResult<Payload<RecipePayload>>,
) -> ApiResult<Json<RecipeDetail>> {
    update_recipe(state, user.id, recipe_id(path)?, payload, true).await
}

async fn update_recipe(
    state: AppState,
    user_id: i64,
    id: i64,
    payload: ApiResult<Payload<RecipePayload>>,
    partial: bool,
) -> ApiResult<Json<RecipeDetail>> {
    // Existence is checked first so a stranger's recipe is 404 even with a bad body
    if recipes::get_recipe(&state.db, user_id, id).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    let Payload(payload) = payload?;
    let changes = clean_recipe(&payload, partial)?;

    let recipe = recipes::update_recipe(&state.db, user_id, id, &changes)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(RecipeDetail::new(recipe, &state.media)))
}

/// DELETE /api/recipe/recipes/:id/
pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = recipe_id(path)?;
    let removed = recipes::delete_recipe(&state.db, user.id, id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if let Some(image) = &removed.image {
        state.media.remove(image).await;
    }
    info!("User {} deleted recipe {}", user.id, id);

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/recipe/recipes/:id/upload-image/
///
/// Expects a multipart form with an `image` file field.
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    path: Result<Path<i64>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<RecipeImageResponse>> {
    let id = recipe_id(path)?;
    if recipes::get_recipe(&state.db, user.id, id).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            upload = Some(bytes);
            break;
        }
    }

    let Some(bytes) = upload else {
        return Err(FieldErrors::single("image", NO_FILE).into());
    };
    if bytes.is_empty() {
        return Err(FieldErrors::single("image", EMPTY_FILE).into());
    }
    let sniffed = bytes.clone();
    let format = tokio::task::spawn_blocking(move || detect_image(&sniffed))
        .await
        .map_err(|e| ApiError::Internal(format!("Image check failed: {}", e)))?;
    let Some(format) = format else {
        return Err(FieldErrors::single("image", INVALID_IMAGE).into());
    };

    let stored = state.media.save_recipe_image(&bytes, format).await?;
    let replaced = match recipes::set_recipe_image(&state.db, user.id, id, &stored).await {
        Ok(Some(replaced)) => replaced,
        Ok(None) => {
            // Recipe deleted while uploading
            state.media.remove(&stored).await;
            return Err(ApiError::NotFound);
        }
        Err(e) => {
            state.media.remove(&stored).await;
            return Err(e.into());
        }
    };

    if let Some(previous) = &replaced.previous {
        state.media.remove(previous).await;
    }
    info!("Stored image {} for recipe {}", stored, id);

    Ok(Json(RecipeImageResponse {
        id: replaced.recipe.id,
        image: replaced.recipe.image.map(|path| state.media.url_for(&path)),
    }))
}

/// Recipe routes (authentication required)
pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/api/recipe/recipes/", get(list_recipes).post(create_recipe))
        .route(
            "/api/recipe/recipes/:id/",
            get(get_recipe)
                .put(put_recipe)
                .patch(patch_recipe)
                .delete(delete_recipe),
        )
        .route(
            "/api/recipe/recipes/:id/upload-image/",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_UPLOAD_BYTES)),
        )
}
