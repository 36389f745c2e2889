#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use image::{ImageBuffer, ImageFormat, Rgb};
use recipe_server::accounts::{self, NewAccount};
use recipe_server::auth::{create_session, DEFAULT_TOKEN_TTL_DAYS};
use recipe_server::catalog::{self, AttributeKind, RecipeChanges};
use recipe_server::config::Config;
use recipe_server::db::{self, DbConn};
use recipe_server::models::{Attribute, Recipe, User};
use recipe_server::AppState;
use serde_json::Value;
use std::io::Cursor;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

pub const PASSWORD: &str = "testpass123";
const BOUNDARY: &str = "recipe-test-boundary";

/// A router over a throwaway database and media directory.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            database_url: dir.path().join("test.db").to_str().unwrap().to_string(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            media_root: dir.path().join("media"),
            token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
        };
        let pool = db::create_pool(&config.database_url).unwrap();
        let state = AppState::new(config, pool);
        let router = recipe_server::app(state.clone());

        Self {
            state,
            router,
            _dir: dir,
        }
    }

    pub fn conn(&self) -> DbConn {
        self.state.pool.get().unwrap()
    }

    pub fn media_path(&self, url: &str) -> PathBuf {
        let relative = url.strip_prefix("/media/").unwrap();
        self.state.media.root().join(relative)
    }

    pub fn create_user(&self, email: &str) -> User {
        accounts::create_user(
            &mut self.conn(),
            NewAccount {
                email,
                password: PASSWORD,
                name: "Test User",
            },
        )
        .unwrap()
    }

    pub fn token_for(&self, user: &User) -> String {
        create_session(&mut self.conn(), user.id, DEFAULT_TOKEN_TTL_DAYS).unwrap()
    }

    /// Create a user and return it with a valid token.
    pub fn login(&self, email: &str) -> (User, String) {
        let user = self.create_user(email);
        let token = self.token_for(&user);
        (user, token)
    }

    pub fn tag(&self, user: &User, name: &str) -> Attribute {
        catalog::create_attribute(&mut self.conn(), AttributeKind::Tag, user.id, name).unwrap()
    }

    pub fn ingredient(&self, user: &User, name: &str) -> Attribute {
        catalog::create_attribute(&mut self.conn(), AttributeKind::Ingredient, user.id, name)
            .unwrap()
    }

    pub fn recipe(&self, user: &User, title: &str) -> Recipe {
        self.recipe_with(user, title, vec![], vec![])
    }

    pub fn recipe_with(
        &self,
        user: &User,
        title: &str,
        tags: Vec<i32>,
        ingredients: Vec<i32>,
    ) -> Recipe {
        catalog::create_recipe(
            &mut self.conn(),
            user.id,
            RecipeChanges {
                title: Some(title.to_string()),
                time_minutes: Some(10),
                price: Some(5.0),
                tags: Some(tags),
                ingredients: Some(ingredients),
                ..Default::default()
            },
        )
        .unwrap()
    }

    pub fn reload_recipe(&self, owner: &User, id: i32) -> Recipe {
        catalog::get_recipe(&mut self.conn(), owner.id, id).unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// POST a multipart form with a single file field.
    pub async fn upload(
        &self,
        uri: &str,
        token: &str,
        field: &str,
        data: &[u8],
    ) -> (StatusCode, Value) {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"upload\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

pub fn png_bytes() -> Vec<u8> {
    let img = ImageBuffer::from_pixel(10, 10, Rgb([40u8, 120, 200]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Ids from a JSON array of objects.
pub fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

pub fn names(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap().to_string())
        .collect()
}
