//! Shared harness for recipe-api integration tests
//!
//! Each [`TestApp`] owns an in-memory database and a temporary media root,
//! and drives the router in-process with `oneshot`.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use recipe_api::db::recipes::{create_recipe, NewRecipe, Recipe};
use recipe_api::db::{init_memory_database, tokens, users};
use recipe_api::media::MediaStore;
use recipe_api::{build_router, AppState};
use recipe_common::db::User;
use recipe_common::Price;
use serde_json::Value;
use sqlx::SqlitePool;
use std::io::Cursor;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

pub const MULTIPART_BOUNDARY: &str = "recipe-test-boundary";

/// A 10x10 black PNG
pub fn png_bytes() -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image::RgbImage::new(10, 10))
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("Should encode PNG");
    out.into_inner()
}

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub media_dir: TempDir,
}

/// Status plus parsed JSON body (`Null` for empty bodies)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
    pub raw: Vec<u8>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = init_memory_database().await.expect("Should create in-memory database");
        let media_dir = tempfile::tempdir().expect("Should create media dir");
        let media = MediaStore::new(media_dir.path(), "/media");
        let router = build_router(AppState::new(db.clone(), media));

        Self {
            router,
            db,
            media_dir,
        }
    }

    pub async fn create_user(&self, email: &str, password: &str) -> User {
        users::create_user(&self.db, email, password, "test name")
            .await
            .expect("Should create user")
    }

    pub async fn token_for(&self, user: &User) -> String {
        tokens::get_or_create_token(&self.db, user.id)
            .await
            .expect("Should create token")
    }

    /// Default authenticated user and its token
    pub async fn login(&self) -> (User, String) {
        let user = self.create_user("user@example.com", "test@123").await;
        let token = self.token_for(&user).await;
        (user, token)
    }

    pub async fn create_recipe(&self, user: &User, title: &str) -> Recipe {
        self.create_recipe_with(user, title, &[], &[]).await
    }

    pub async fn create_recipe_with(
        &self,
        user: &User,
        title: &str,
        tags: &[&str],
        ingredients: &[&str],
    ) -> Recipe {
        let recipe = NewRecipe {
            title: title.to_string(),
            time_minutes: 22,
            price: Price::from_cents(524),
            link: "https://example.com/recipe.pdf".to_string(),
            description: "description for test".to_string(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
        };
        create_recipe(&self.db, user.id, &recipe)
            .await
            .expect("Should create recipe")
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router should respond");

        let status = response.status();
        let headers = response.headers().clone();
        let raw = response
            .into_body()
            .collect()
            .await
            .expect("Should read body")
            .to_bytes()
            .to_vec();
        let body = if raw.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&raw).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            raw,
        }
    }

    /// JSON request; `token` adds `Authorization: Token <token>`
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Should build request");

        self.send(request).await
    }

    /// Request with a raw body of the given content type
    pub async fn request_with_body(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        content_type: &str,
        body: impl Into<Body>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {}", token));
        }

        let request = builder.body(body.into()).expect("Should build request");
        self.send(request).await
    }

    /// `application/x-www-form-urlencoded` request; `body` is already encoded
    pub async fn form(&self, method: &str, uri: &str, token: Option<&str>, body: &str) -> TestResponse {
        self.request_with_body(
            method,
            uri,
            token,
            "application/x-www-form-urlencoded",
            body.to_string(),
        )
        .await
    }

    /// `multipart/form-data` request of plain text fields
    pub async fn multipart_form(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        fields: &[(&str, &str)],
    ) -> TestResponse {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                MULTIPART_BOUNDARY, name, value
            ));
        }
        body.push_str(&format!("--{}--\r\n", MULTIPART_BOUNDARY));

        let content_type = format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY);
        self.request_with_body(method, uri, token, &content_type, body).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request("GET", uri, Some(token), None).await
    }

    /// Multipart upload of one file field
    pub async fn upload(&self, uri: &str, token: &str, field: &str, bytes: &[u8]) -> TestResponse {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"upload.png\"\r\n",
                field
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Token {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
            )
            .body(Body::from(body))
            .expect("Should build request");

        self.send(request).await
    }
}

pub fn detail_url(id: i64) -> String {
    format!("/api/recipe/recipes/{}/", id)
}

pub fn image_upload_url(id: i64) -> String {
    format!("/api/recipe/recipes/{}/upload-image/", id)
}
