#![allow(dead_code)]

use agora::config::auth::AuthConfig;
use agora::models::UserModel;
use agora::services::auth::AuthService;
use reqwest::Client;
use sea_orm::{ConnectOptions, ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Once,
};

static INIT: Once = Once::new();
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub const PASSWORD: &str = "test_password_123";

pub fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        // Minimum bcrypt cost keeps registration fast
        std::env::set_var("BCRYPT_COST", "4");
        let config = agora::config::jwt::JwtConfig::from_env().unwrap();
        let _ = agora::utils::jwt::init_jwt_config(config);
    });
}

/// Connect to a migrated, empty database.
///
/// Uses `TEST_DATABASE_URL` when set, otherwise a private in-memory SQLite
/// database per call.
pub async fn setup_db() -> DatabaseConnection {
    init_env();

    let database_url =
        std::env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());

    // An in-memory SQLite database lives and dies with its connection
    connect(database_url, 1).await
}

/// A pooled Postgres connection for tests that need real row locks.
/// `None` unless `TEST_DATABASE_URL` points at Postgres.
pub async fn setup_postgres_pool(max_connections: u32) -> Option<DatabaseConnection> {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;
    if !database_url.starts_with("postgres") {
        return None;
    }
    Some(connect(database_url, max_connections).await)
}

async fn connect(database_url: String, max_connections: u32) -> DatabaseConnection {
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(max_connections)
        .min_connections(1)
        .sqlx_logging(false);

    let db = sea_orm::Database::connect(opt)
        .await
        .expect("Failed to connect to test database");

    agora::migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    cleanup_tables(&db).await;
    db
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let backend = db.get_database_backend();
    if backend != sea_orm::DatabaseBackend::Postgres {
        return;
    }

    for table in ["forum_participants", "forums", "users"] {
        let sql = format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", table);
        let _ = db.execute(Statement::from_string(backend, sql)).await;
    }
}

pub fn unique_username(prefix: &str) -> String {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}_{}", prefix, counter)
}

/// Insert an active user straight through the service layer.
pub async fn seed_user(db: &DatabaseConnection, name: &str) -> UserModel {
    let username = unique_username(&name.to_lowercase().replace(' ', "_"));
    AuthService::new(db.clone())
        .with_config(AuthConfig { bcrypt_cost: 4 })
        .register(name, &username, PASSWORD)
        .await
        .expect("Failed to seed user")
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }
}

pub async fn spawn_app() -> TestApp {
    let db = setup_db().await;

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(agora::routes::create_routes())
        .layer(axum::extract::Extension(db.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
    }
}

/// Register a user over HTTP, log in, and return (user_id, access token).
pub async fn create_test_user(app: &TestApp, name: &str) -> (i32, String) {
    let username = unique_username(&name.to_lowercase().replace(' ', "_"));

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "name": name,
            "username": username,
            "password": PASSWORD
        }))
        .send()
        .await
        .expect("Failed to register user");

    let status = resp.status();
    if status != 201 {
        let body = resp.text().await.unwrap_or_default();
        panic!("Failed to register user '{}': status={}, body={}", username, status, body);
    }

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({
            "username": username,
            "password": PASSWORD
        }))
        .send()
        .await
        .expect("Failed to log in");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse login response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to log in '{}': status={}, body={}", username, status, body);
    }

    let user_id = body["data"]["id"]
        .as_i64()
        .unwrap_or_else(|| panic!("Login response missing id: {}", body)) as i32;
    let token = body["data"]["token"]["access"]
        .as_str()
        .unwrap_or_else(|| panic!("Login response missing access token: {}", body))
        .to_string();
    (user_id, token)
}

/// Create a forum over HTTP and return its id.
pub async fn create_test_forum(app: &TestApp, token: &str, participants: &[i32]) -> i32 {
    let resp = app
        .client
        .post(app.url("/forums"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "topic": "Weekly sync",
            "description": "Status updates",
            "participants": participants
        }))
        .send()
        .await
        .expect("Failed to create forum");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse response");
    if status != 201 {
        panic!("Failed to create forum: status={}, body={}", status, body);
    }

    body["data"]["id"]
        .as_i64()
        .expect("Response missing id field") as i32
}
