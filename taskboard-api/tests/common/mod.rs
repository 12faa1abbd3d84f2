//! Common test utilities for HTTP tests
//!
//! A [`TestContext`] owns a router over the in-process store (or
//! PostgreSQL when `DATABASE_URL` is set and asked for) and offers JSON
//! request helpers plus shortcuts to seed users, projects and tasks.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use taskboard_api::app::{build_router, AppState};
use taskboard_shared::db::migrations::run_migrations;
use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
use taskboard_shared::store::{MemoryStore, PgStore, Store};
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestContext {
    pub app: Router,
}

impl TestContext {
    /// Router over a fresh in-process store
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    /// Router over the given store
    pub fn with_store<S: Store>(store: S) -> Self {
        let app = build_router(AppState::new(store), &["*".to_string()]);
        Self { app }
    }

    /// Router over PostgreSQL, `None` when `DATABASE_URL` is unset
    pub async fn postgres() -> Option<Self> {
        let url = match std::env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => url,
            _ => {
                eprintln!("DATABASE_URL not set, skipping PostgreSQL test");
                return None;
            }
        };

        let pool = create_pool(DatabaseConfig {
            url,
            max_connections: 5,
            ..Default::default()
        })
        .await
        .expect("Failed to create pool");
        run_migrations(&pool).await.expect("Migrations failed");

        Some(Self::with_store(PgStore::new(pool)))
    }

    /// Sends a request and returns the status with the parsed JSON body
    ///
    /// Empty bodies come back as `Value::Null`.
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                builder = builder.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("PATCH", uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send("DELETE", uri, None).await
    }

    /// Signs up a user with a unique email and returns its id
    pub async fn create_user(&self, name: &str) -> Uuid {
        let (status, body) = self
            .post(
                "/v1/users",
                json!({
                    "email": format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4()),
                    "name": name,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create user: {}", body);
        id_of(&body)
    }

    /// Creates a project owned by `owner` and returns its id
    pub async fn create_project(&self, owner: Uuid) -> Uuid {
        let (status, body) = self
            .post(
                "/v1/projects",
                json!({ "name": format!("Project {}", Uuid::new_v4()), "ownerId": owner }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project: {}", body);
        id_of(&body)
    }

    /// Appends a task and returns its id
    pub async fn create_task(&self, project: Uuid, title: &str) -> Uuid {
        let (status, body) = self
            .post(
                &format!("/v1/projects/{}/tasks", project),
                json!({ "title": title }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create task: {}", body);
        id_of(&body)
    }

    /// Task titles of a project in listing order
    pub async fn titles(&self, project: Uuid) -> Vec<String> {
        let (status, body) = self.get(&format!("/v1/projects/{}/tasks", project)).await;
        assert_eq!(status, StatusCode::OK);

        body.as_array()
            .unwrap()
            .iter()
            .map(|task| task["title"].as_str().unwrap().to_string())
            .collect()
    }
}

pub fn id_of(body: &Value) -> Uuid {
    body["id"].as_str().unwrap().parse().unwrap()
}
