//! Common test utilities for integration tests
//!
//! Every context gets a fresh in-memory store with three users:
//! - `admin`: admin role
//! - `member`: member
//! - `other`: a second member, for visibility checks
//!
//! Requests are driven straight through the Axum router.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::{Config, MEMORY_DATABASE_URL};
use taskboard_shared::auth::jwt::{create_token, Claims, TokenType};
use taskboard_shared::auth::password::hash_password;
use taskboard_shared::models::task::{ChecklistItem, CreateTask, Task, TaskPriority};
use taskboard_shared::models::user::{CreateUser, User, UserRole};
use taskboard_shared::store::{memory::MemoryStore, TaskStore, UserStore};
use tower::Service as _;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const ADMIN_INVITE_TOKEN: &str = "invite-me-as-admin";
pub const PASSWORD: &str = "password123";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: Router,
    pub config: Config,
    pub admin: User,
    pub member: User,
    pub other: User,
}

impl TestContext {
    pub async fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some(MEMORY_DATABASE_URL.to_string()),
            "JWT_SECRET" => Some(JWT_SECRET.to_string()),
            "ADMIN_INVITE_TOKEN" => Some(ADMIN_INVITE_TOKEN.to_string()),
            _ => None,
        })
        .unwrap();

        let store = Arc::new(MemoryStore::new());
        let password_hash = hash_password(PASSWORD).unwrap();

        let mut users = Vec::new();
        for (name, role) in [
            ("Admin", UserRole::Admin),
            ("Member", UserRole::Member),
            ("Other", UserRole::Member),
        ] {
            let user = store
                .insert_user(CreateUser {
                    name: name.to_string(),
                    email: format!("{}@example.com", name.to_lowercase()),
                    password_hash: password_hash.clone(),
                    role,
                    profile_image_url: None,
                })
                .await
                .unwrap();
            users.push(user);
        }
        let other = users.pop().unwrap();
        let member = users.pop().unwrap();
        let admin = users.pop().unwrap();

        let app = build_router(AppState::new(store.clone(), config.clone()));

        TestContext {
            store,
            app,
            config,
            admin,
            member,
            other,
        }
    }

    /// Mints an access token for `user`
    pub fn token(&self, user: &User) -> String {
        create_token(&Claims::new(user.id, TokenType::Access), JWT_SECRET).unwrap()
    }

    /// Sends a request and returns the status and JSON body
    ///
    /// An empty body comes back as `Value::Null`.
    pub async fn send(
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

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body ({}): {}", status, String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, as_user: &User) -> (StatusCode, Value) {
        let token = self.token(as_user);
        self.send(Method::GET, uri, Some(&token), None).await
    }

    pub async fn post(&self, uri: &str, as_user: &User, body: Value) -> (StatusCode, Value) {
        let token = self.token(as_user);
        self.send(Method::POST, uri, Some(&token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, as_user: &User, body: Value) -> (StatusCode, Value) {
        let token = self.token(as_user);
        self.send(Method::PUT, uri, Some(&token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, as_user: &User) -> (StatusCode, Value) {
        let token = self.token(as_user);
        self.send(Method::DELETE, uri, Some(&token), None).await
    }

    /// Inserts a task directly into the store
    pub async fn create_task(
        &self,
        title: &str,
        assignees: &[Uuid],
        checklist: Vec<ChecklistItem>,
    ) -> Task {
        self.create_task_with(title, assignees, checklist, TaskPriority::Medium, chrono::Duration::days(7))
            .await
    }

    pub async fn create_task_with(
        &self,
        title: &str,
        assignees: &[Uuid],
        checklist: Vec<ChecklistItem>,
        priority: TaskPriority,
        due_in: chrono::Duration,
    ) -> Task {
        self.store
            .insert_task(CreateTask {
                title: title.to_string(),
                description: String::new(),
                priority,
                due_date: chrono::Utc::now() + due_in,
                assigned_to: assignees.to_vec(),
                created_by: self.admin.id,
                todo_checklist: checklist,
                attachments: vec![],
            })
            .await
            .unwrap()
    }

    pub async fn stored_task(&self, id: Uuid) -> Task {
        self.store.find_task(id).await.unwrap().unwrap()
    }
}

/// Checklist with the first `done` of `total` items completed
pub fn checklist(done: usize, total: usize) -> Vec<ChecklistItem> {
    (0..total)
        .map(|i| ChecklistItem::with_completed(format!("step {}", i + 1), i < done))
        .collect()
}
