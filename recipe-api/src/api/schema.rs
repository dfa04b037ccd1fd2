//! OpenAPI document for the service
//!
//! Hand-assembled; keep in step with the routers in `lib.rs`.

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

/// GET /api/schema/
pub async fn get_schema() -> Json<Value> {
    Json(openapi_document())
}

pub fn schema_routes() -> Router<AppState> {
    Router::new().route("/api/schema/", get(get_schema))
}

/// Write body accepted as JSON or either form encoding
fn json_body(schema: &str) -> Value {
    let schema = json!({ "$ref": format!("#/components/schemas/{}", schema) });
    json!({
        "required": true,
        "content": {
            "application/json": { "schema": schema.clone() },
            "application/x-www-form-urlencoded": { "schema": schema.clone() },
            "multipart/form-data": { "schema": schema }
        }
    })
}

fn json_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{}", name) })
}

fn id_parameter() -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer" }
    })
}

/// Paths for the tag or ingredient collection
fn attribute_paths(plural: &str) -> (String, Value, String, Value) {
    let list = json!({
        "get": {
            "tags": [plural],
            "operationId": format!("{}_list", plural),
            "parameters": [{
                "name": "assigned_only",
                "in": "query",
                "schema": { "type": "integer", "enum": [0, 1] },
                "description": "Filter by items assigned to recipes"
            }],
            "responses": {
                "200": json_response("", json!({ "type": "array", "items": schema_ref("Attribute") }))
            }
        }
    });

    let detail = json!({
        "parameters": [id_parameter()],
        "put": {
            "tags": [plural],
            "operationId": format!("{}_update", plural),
            "requestBody": json_body("AttributeRequest"),
            "responses": { "200": json_response("", schema_ref("Attribute")) }
        },
        "patch": {
            "tags": [plural],
            "operationId": format!("{}_partial_update", plural),
            "requestBody": json_body("AttributeRequest"),
            "responses": { "200": json_response("", schema_ref("Attribute")) }
        },
        "delete": {
            "tags": [plural],
            "operationId": format!("{}_destroy", plural),
            "responses": { "204": { "description": "No response body" } }
        }
    });

    (
        format!("/api/recipe/{}/", plural),
        list,
        format!("/api/recipe/{}/{{id}}/", plural),
        detail,
    )
}

/// Build the OpenAPI 3.0 document
pub fn openapi_document() -> Value {
    let mut paths = json!({
        "/api/user/create/": {
            "post": {
                "tags": ["user"],
                "operationId": "user_create",
                "security": [],
                "requestBody": json_body("UserRequest"),
                "responses": { "201": json_response("", schema_ref("User")) }
            }
        },
        "/api/user/token/": {
            "post": {
                "tags": ["user"],
                "operationId": "user_token_create",
                "security": [],
                "requestBody": json_body("AuthTokenRequest"),
                "responses": { "200": json_response("", schema_ref("AuthToken")) }
            }
        },
        "/api/user/me/": {
            "get": {
                "tags": ["user"],
                "operationId": "user_me_retrieve",
                "responses": { "200": json_response("", schema_ref("User")) }
            },
            "put": {
                "tags": ["user"],
                "operationId": "user_me_update",
                "requestBody": json_body("UserRequest"),
                "responses": { "200": json_response("", schema_ref("User")) }
            },
            "patch": {
                "tags": ["user"],
                "operationId": "user_me_partial_update",
                "requestBody": json_body("UserRequest"),
                "responses": { "200": json_response("", schema_ref("User")) }
            }
        },
        "/api/recipe/recipes/": {
            "get": {
                "tags": ["recipe"],
                "operationId": "recipe_recipes_list",
                "parameters": [
                    {
                        "name": "tags",
                        "in": "query",
                        "schema": { "type": "string" },
                        "description": "Comma separated list of tag IDs to filter"
                    },
                    {
                        "name": "ingredients",
                        "in": "query",
                        "schema": { "type": "string" },
                        "description": "Comma separated list of ingredient IDs to filter"
                    }
                ],
                "responses": {
                    "200": json_response("", json!({ "type": "array", "items": schema_ref("Recipe") }))
                }
            },
            "post": {
                "tags": ["recipe"],
                "operationId": "recipe_recipes_create",
                "requestBody": json_body("RecipeDetailRequest"),
                "responses": { "201": json_response("", schema_ref("RecipeDetail")) }
            }
        },
        "/api/recipe/recipes/{id}/": {
            "parameters": [id_parameter()],
            "get": {
                "tags": ["recipe"],
                "operationId": "recipe_recipes_retrieve",
                "responses": { "200": json_response("", schema_ref("RecipeDetail")) }
            },
            "put": {
                "tags": ["recipe"],
                "operationId": "recipe_recipes_update",
                "requestBody": json_body("RecipeDetailRequest"),
                "responses": { "200": json_response("", schema_ref("RecipeDetail")) }
            },
            "patch": {
                "tags": ["recipe"],
                "operationId": "recipe_recipes_partial_update",
                "requestBody": json_body("RecipeDetailRequest"),
                "responses": { "200": json_response("", schema_ref("RecipeDetail")) }
            },
            "delete": {
                "tags": ["recipe"],
                "operationId": "recipe_recipes_destroy",
                "responses": { "204": { "description": "No response body" } }
            }
        },
        "/api/recipe/recipes/{id}/upload-image/": {
            "parameters": [id_parameter()],
            "post": {
                "tags": ["recipe"],
                "operationId": "recipe_recipes_upload_image_create",
                "requestBody": {
                    "required": true,
                    "content": {
                        "multipart/form-data": {
                            "schema": {
                                "type": "object",
                                "properties": { "image": { "type": "string", "format": "binary" } },
                                "required": ["image"]
                            }
                        }
                    }
                },
                "responses": { "200": json_response("", schema_ref("RecipeImage")) }
            }
        }
    });

    for plural in ["tags", "ingredients"] {
        let (list_path, list, detail_path, detail) = attribute_paths(plural);
        paths[list_path] = list;
        paths[detail_path] = detail;
    }

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Recipe API",
            "version": env!("CARGO_PKG_VERSION")
        },
        "paths": paths,
        "security": [{ "tokenAuth": [] }],
        "components": {
            "securitySchemes": {
                "tokenAuth": {
                    "type": "apiKey",
                    "in": "header",
                    "name": "Authorization",
                    "description": "Token-based authentication with required prefix \"Token\""
                }
            },
            "schemas": component_schemas()
        }
    })
}

fn component_schemas() -> Value {
    json!({
        "User": {
            "type": "object",
            "properties": {
                "email": { "type": "string", "format": "email", "maxLength": 255 },
                "name": { "type": "string", "maxLength": 255 }
            },
            "required": ["email", "name"]
        },
        "UserRequest": {
            "type": "object",
            "properties": {
                "email": { "type": "string", "format": "email", "maxLength": 255 },
                "password": { "type": "string", "writeOnly": true, "minLength": 5, "maxLength": 128 },
                "name": { "type": "string", "maxLength": 255 }
            },
            "required": ["email", "password", "name"]
        },
        "AuthTokenRequest": {
            "type": "object",
            "properties": {
                "email": { "type": "string", "format": "email" },
                "password": { "type": "string", "writeOnly": true }
            },
            "required": ["email", "password"]
        },
        "AuthToken": {
            "type": "object",
            "properties": { "token": { "type": "string", "readOnly": true } },
            "required": ["token"]
        },
        "Attribute": {
            "type": "object",
            "properties": {
                "id": { "type": "integer", "readOnly": true },
                "name": { "type": "string", "maxLength": 255 }
            },
            "required": ["id", "name"]
        },
        "AttributeRequest": {
            "type": "object",
            "properties": { "name": { "type": "string", "minLength": 1, "maxLength": 255 } },
            "required": ["name"]
        },
        "Recipe": {
            "type": "object",
            "properties": {
                "id": { "type": "integer", "readOnly": true },
                "title": { "type": "string", "maxLength": 255 },
                "time_minutes": { "type": "integer" },
                "price": { "type": "string", "format": "decimal", "pattern": "^-?\\d{0,3}(?:\\.\\d{0,2})?$" },
                "link": { "type": "string", "maxLength": 255 },
                "tags": { "type": "array", "items": schema_ref("Attribute") },
                "ingredients": { "type": "array", "items": schema_ref("Attribute") }
            },
            "required": ["id", "title", "time_minutes", "price"]
        },
        "RecipeDetail": {
            "allOf": [
                schema_ref("Recipe"),
                {
                    "type": "object",
                    "properties": {
                        "description": { "type": "string" },
                        "image": { "type": "string", "format": "uri", "nullable": true, "readOnly": true }
                    }
                }
            ]
        },
        "RecipeDetailRequest": {
            "type": "object",
            "properties": {
                "title": { "type": "string", "minLength": 1, "maxLength": 255 },
                "time_minutes": { "type": "integer" },
                "price": { "type": "string", "format": "decimal" },
                "link": { "type": "string", "maxLength": 255 },
                "description": { "type": "string" },
                "tags": { "type": "array", "items": schema_ref("AttributeRequest") },
                "ingredients": { "type": "array", "items": schema_ref("AttributeRequest") }
            },
            "required": ["title", "time_minutes", "price"]
        },
        "RecipeImage": {
            "type": "object",
            "properties": {
                "id": { "type": "integer", "readOnly": true },
                "image": { "type": "string", "format": "uri", "nullable": true }
            },
            "required": ["id"]
        }
    })
}
