#![allow(dead_code)]

use std::str::FromStr;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tower::ServiceExt; // for `oneshot`
use uuid::Uuid;

use issues_api_rust::config::AllowedHosts;
use issues_api_rust::{app, AppState};

pub const ALICE: (&str, &str) = ("alice", "s3cret");
pub const ALICE_ID: i32 = 7;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE users (
        id SERIAL PRIMARY KEY,
        login VARCHAR(255) NOT NULL DEFAULT '',
        firstname VARCHAR(30) NOT NULL DEFAULT '',
        lastname VARCHAR(255) NOT NULL DEFAULT '',
        hashed_password VARCHAR(40) NOT NULL DEFAULT '',
        salt VARCHAR(64)
    )
    "#,
    r#"
    CREATE TABLE issues (
        id SERIAL PRIMARY KEY,
        tracker_id INTEGER,
        project_id INTEGER,
        subject VARCHAR(255) NOT NULL DEFAULT '',
        description TEXT,
        category_id INTEGER,
        status_id INTEGER,
        assigned_to_id INTEGER,
        priority_id INTEGER,
        author_id INTEGER,
        lock_version INTEGER NOT NULL DEFAULT 0,
        created_on TIMESTAMP,
        updated_on TIMESTAMP,
        root_id INTEGER,
        lft INTEGER,
        rgt INTEGER
    )
    "#,
    r#"
    CREATE TABLE checklists (
        id SERIAL PRIMARY KEY,
        is_done BOOLEAN DEFAULT FALSE,
        subject VARCHAR(512) NOT NULL,
        position INTEGER DEFAULT 1,
        issue_id INTEGER NOT NULL REFERENCES issues (id),
        created_at TIMESTAMP,
        updated_at TIMESTAMP,
        is_section BOOLEAN DEFAULT FALSE
    )
    "#,
];

/// An isolated schema in the database named by `TEST_DATABASE_URL`, seeded with users.
/// The database must allow `CREATE EXTENSION pgcrypto`.
///
/// Tests using it are `#[ignore]`d; run them with `cargo test -- --ignored`.
pub struct TestContext {
    pub pool: PgPool,
    schema: String,
    admin: PgPool,
}

impl TestContext {
    pub async fn new() -> Result<Self> {
        let url = std::env::var("TEST_DATABASE_URL")
            .context("TEST_DATABASE_URL must point at a Postgres database")?;

        let admin = PgPool::connect(&url).await.context("connect admin pool")?;
        ensure_pgcrypto(&admin).await?;

        let schema = format!("test_{}", Uuid::new_v4().simple());
        sqlx::query(&format!("CREATE SCHEMA {}", schema))
            .execute(&admin)
            .await?;

        let options = PgConnectOptions::from_str(&url)?
            .options([("search_path", format!("{},public", schema))]);
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("connect test pool")?;

        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&pool).await?;
        }
        seed_user(&pool, ALICE_ID, ALICE.0, ALICE.1, "pepper").await?;
        seed_user(&pool, 8, "twin", "same", "salt-a").await?;
        seed_user(&pool, 9, "twin", "same", "salt-b").await?;

        Ok(Self { pool, schema, admin })
    }

    pub fn app(&self) -> Router {
        app(AppState::new(self.pool.clone(), AllowedHosts::Any))
    }

    pub async fn cleanup(self) -> Result<()> {
        self.pool.close().await;
        sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.admin)
            .await?;
        self.admin.close().await;
        Ok(())
    }
}

async fn ensure_pgcrypto(admin: &PgPool) -> Result<()> {
    // Parallel tests can race on CREATE EXTENSION; only fail if it is still missing.
    if let Err(e) = sqlx::query("CREATE EXTENSION IF NOT EXISTS pgcrypto")
        .execute(admin)
        .await
    {
        let installed: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM pg_extension WHERE extname = 'pgcrypto'")
                .fetch_optional(admin)
                .await?;
        if installed.is_none() {
            return Err(e).context("install pgcrypto");
        }
    }
    Ok(())
}

async fn seed_user(pool: &PgPool, id: i32, login: &str, password: &str, salt: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO users (id, login, firstname, lastname, salt, hashed_password) \
         VALUES ($1, $2, 'Test', 'User', $3, encode(digest($3 || encode(digest($4, 'sha1'), 'hex'), 'sha1'), 'hex'))",
    )
    .bind(id)
    .bind(login)
    .bind(salt)
    .bind(password)
    .execute(pool)
    .await?;
    Ok(())
}

pub fn basic(login: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", login, password)))
}

/// Send one request through the router and decode the JSON body.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    authorization: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let body = match body {
        Some(json) => Body::from(serde_json::to_vec(&json)?),
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body)?).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}
