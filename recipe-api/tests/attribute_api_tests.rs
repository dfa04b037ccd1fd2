//! Integration tests for the tag and ingredient endpoints
//!
//! Both kinds share handlers, so most behaviour is exercised once per kind.

mod helpers;

use axum::http::StatusCode;
use helpers::{detail_url, TestApp};
use recipe_api::db::{attributes, recipes};
use recipe_common::db::AttributeKind;
use serde_json::{json, Value};

const TAGS_URL: &str = "/api/recipe/tags/";
const INGREDIENTS_URL: &str = "/api/recipe/ingredients/";

fn item_url(base: &str, id: i64) -> String {
    format!("{}{}/", base, id)
}

fn names(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect()
}

// =============================================================================
// Public access
// =============================================================================

#[tokio::test]
async fn test_auth_required() {
    let app = TestApp::new().await;

    for url in [TAGS_URL, INGREDIENTS_URL] {
        let res = app.request("GET", url, None, None).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{}", url);
    }
}

#[tokio::test]
async fn test_no_create_endpoint() {
    let app = TestApp::new().await;
    let (_, token) = app.login().await;

    let res = app
        .request("POST", TAGS_URL, Some(&token), Some(json!({"name": "Vegan"})))
        .await;

    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// Tags
// =============================================================================

#[tokio::test]
async fn test_retrieve_tags_ordered_by_name_descending() {
    let app = TestApp::new().await;
    let (user, token) = app.login().await;
    app.create_recipe_with(&user, "r", &["Dessert", "Vegan"], &[]).await;

    let res = app.get(TAGS_URL, &token).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(names(&res.body), ["Vegan", "Dessert"]);
}

#[tokio::test]
async fn test_tags_limited_to_user() {
    let app = TestApp::new().await;
    let (user, token) = app.login().await;
    let other = app.create_user("user2@example.com", "test@123").await;
    app.create_recipe_with(&other, "theirs", &["Fruity"], &[]).await;
    let mine = app.create_recipe_with(&user, "mine", &["Comfort Food"], &[]).await;

    let res = app.get(TAGS_URL, &token).await;

    assert_eq!(res.body.as_array().unwrap().len(), 1);
    assert_eq!(res.body[0]["name"], "Comfort Food");
    assert_eq!(res.body[0]["id"], mine.tags[0].id);
}

#[tokio::test]
async fn test_update_tag() {
    let app = TestApp::new().await;
    let (user, token) = app.login().await;
    let recipe = app.create_recipe_with(&user, "r", &["After Dinner"], &[]).await;
    let tag_id = recipe.tags[0].id;

    let res = app
        .request("PATCH", &item_url(TAGS_URL, tag_id), Some(&token), Some(json!({"name": "Dessert"})))
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({"id": tag_id, "name": "Dessert"}));
    let tag = attributes::get_attribute(&app.db, AttributeKind::Tag, user.id, tag_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tag.name, "Dessert");
}

#[tokio::test]
async fn test_put_tag_requires_name() {
    let app = TestApp::new().await;
    let (user, token) = app.login().await;
    let recipe = app.create_recipe_with(&user, "r", &["Brunch"], &[]).await;

    let res = app
        .request("PUT", &item_url(TAGS_URL, recipe.tags[0].id), Some(&token), Some(json!({})))
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["name"][0], "This field is required.");
}

#[tokio::test]
async fn test_blank_tag_name_rejected() {
    let app = TestApp::new().await;
    let (user, token) = app.login().await;
    let recipe = app.create_recipe_with(&user, "r", &["Brunch"], &[]).await;

    let res = app
        .request("PATCH", &item_url(TAGS_URL, recipe.tags[0].id), Some(&token), Some(json!({"name": "  "})))
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["name"][0], "This field may not be blank.");
}

#[tokio::test]
async fn test_delete_tag() {
    let app = TestApp::new().await;
    let (user, token) = app.login().await;
    let recipe = app.create_recipe_with(&user, "r", &["Breakfast"], &[]).await;
    let tag_id = recipe.tags[0].id;

    let res = app.request("DELETE", &item_url(TAGS_URL, tag_id), Some(&token), None).await;

    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(attributes::get_attribute(&app.db, AttributeKind::Tag, user.id, tag_id)
        .await
        .unwrap()
        .is_none());

    // The recipe survives without the tag
    let recipe = recipes::get_recipe(&app.db, user.id, recipe.id).await.unwrap().unwrap();
    assert!(recipe.tags.is_empty());
}

#[tokio::test]
async fn test_other_users_tag_not_found() {
    let app = TestApp::new().await;
    let (_, token) = app.login().await;
    let other = app.create_user("user2@example.com", "test@123").await;
    let recipe = app.create_recipe_with(&other, "theirs", &["Private"], &[]).await;
    let url = item_url(TAGS_URL, recipe.tags[0].id);

    let patch = app.request("PATCH", &url, Some(&token), Some(json!({"name": "Mine"}))).await;
    let delete = app.request("DELETE", &url, Some(&token), None).await;

    assert_eq!(patch.status, StatusCode::NOT_FOUND);
    assert_eq!(delete.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_filter_tags_assigned_to_recipes() {
    let app = TestApp::new().await;
    let (user, token) = app.login().await;
    let recipe = app.create_recipe_with(&user, "r", &["Breakfast", "Lunch"], &[]).await;
    // Unlink Lunch by replacing the tag set
    app.request(
        "PATCH",
        &detail_url(recipe.id),
        Some(&token),
        Some(json!({"tags": [{"name": "Breakfast"}]})),
    )
    .await;

    let all = app.get(TAGS_URL, &token).await;
    let assigned = app.get(&format!("{}?assigned_only=1", TAGS_URL), &token).await;

    assert_eq!(names(&all.body), ["Lunch", "Breakfast"]);
    assert_eq!(names(&assigned.body), ["Breakfast"]);
}

#[tokio::test]
async fn test_filtered_tags_unique() {
    let app = TestApp::new().await;
    let (user, token) = app.login().await;
    app.create_recipe_with(&user, "Pancakes", &["Breakfast"], &[]).await;
    app.create_recipe_with(&user, "Porridge", &["Breakfast"], &[]).await;
    app.create_recipe_with(&user, "Soup", &["Dinner"], &[]).await;
    app.create_recipe(&user, "Untagged").await;

    let res = app.get(&format!("{}?assigned_only=1", TAGS_URL), &token).await;

    assert_eq!(names(&res.body), ["Dinner", "Breakfast"]);
}

#[tokio::test]
async fn test_assigned_only_must_be_integer() {
    let app = TestApp::new().await;
    let (_, token) = app.login().await;

    let res = app.get(&format!("{}?assigned_only=yes", TAGS_URL), &token).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["assigned_only"][0], "A valid integer is required.");
}

// =============================================================================
// Ingredients
// =============================================================================

#[tokio::test]
async fn test_retrieve_ingredients() {
    let app = TestApp::new().await;
    let (user, token) = app.login().await;
    app.create_recipe_with(&user, "r", &[], &["Kale", "Vanilla"]).await;

    let res = app.get(INGREDIENTS_URL, &token).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(names(&res.body), ["Vanilla", "Kale"]);
}

#[tokio::test]
async fn test_ingredients_limited_to_user() {
    let app = TestApp::new().await;
    let (user, token) = app.login().await;
    let other = app.create_user("user2@example.com", "test@123").await;
    app.create_recipe_with(&other, "theirs", &[], &["Salt"]).await;
    app.create_recipe_with(&user, "mine", &[], &["Pepper"]).await;

    let res = app.get(INGREDIENTS_URL, &token).await;

    assert_eq!(names(&res.body), ["Pepper"]);
}

#[tokio::test]
async fn test_update_ingredient() {
    let app = TestApp::new().await;
    let (user, token) = app.login().await;
    let recipe = app.create_recipe_with(&user, "r", &[], &["Cilantro"]).await;
    let id = recipe.ingredients[0].id;

    let res = app
        .request("PATCH", &item_url(INGREDIENTS_URL, id), Some(&token), Some(json!({"name": "Coriander"})))
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "Coriander");
}

#[tokio::test]
async fn test_delete_ingredient() {
    let app = TestApp::new().await;
    let (user, token) = app.login().await;
    let recipe = app.create_recipe_with(&user, "r", &[], &["Lettuce"]).await;
    let id = recipe.ingredients[0].id;

    let res = app
        .request("DELETE", &item_url(INGREDIENTS_URL, id), Some(&token), None)
        .await;

    assert_eq!(res.status, StatusCode::NO_CONTENT);
    let remaining = attributes::list_attributes(&app.db, AttributeKind::Ingredient, user.id, false)
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn test_filter_ingredients_assigned_to_recipes() {
    let app = TestApp::new().await;
    let (user, token) = app.login().await;
    let recipe = app.create_recipe_with(&user, "r", &[], &["Apples", "Turkey"]).await;
    app.request(
        "PATCH",
        &detail_url(recipe.id),
        Some(&token),
        Some(json!({"ingredients": [{"name": "Apples"}]})),
    )
    .await;

    let res = app.get(&format!("{}?assigned_only=1", INGREDIENTS_URL), &token).await;

    assert_eq!(names(&res.body), ["Apples"]);
}
