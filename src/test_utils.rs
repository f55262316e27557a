use std::net::SocketAddr;

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::hash_password;
use crate::config::Config;
use crate::model::role::Role;

pub fn test_config() -> Config {
    Config {
        server_addr: "127.0.0.1:0".to_string(),
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        access_token_ttl: 900,
        refresh_token_ttl: 3600,
        rate_login_per_min: 1000,
        rate_register_per_min: 1000,
        rate_refresh_per_min: 1000,
        rate_protected_per_min: 1000,
        api_prefix: "/api/v1".to_string(),
    }
}

/// Fresh in-memory database with the schema applied. One connection only:
/// every `:memory:` connection is its own database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");

    crate::db::MIGRATOR.run(&pool).await.expect("migrations");

    pool
}

// Hashing is deliberately slow; share one hash across all seeded users.
static TEST_PASSWORD_HASH: Lazy<String> = Lazy::new(|| hash_password("worker123"));

pub async fn seed_user(pool: &SqlitePool, username: &str, role: Role) -> i64 {
    sqlx::query(
        r#"
        INSERT INTO users (username, password, full_name, position, role)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(username)
    .bind(TEST_PASSWORD_HASH.as_str())
    .bind(format!("{username} (full name)"))
    .bind("Operator")
    .bind(role)
    .execute(pool)
    .await
    .expect("seed user")
    .last_insert_rowid()
}

pub async fn seed_attendance(
    pool: &SqlitePool,
    user_id: i64,
    check_in: NaiveDateTime,
    check_out: Option<NaiveDateTime>,
) -> i64 {
    sqlx::query("INSERT INTO attendance (user_id, check_in, check_out) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(check_in)
        .bind(check_out)
        .execute(pool)
        .await
        .expect("seed attendance")
        .last_insert_rowid()
}

/// `Authorization` header value for the given user.
pub fn bearer(config: &Config, user_id: i64, username: &str, role: Role) -> String {
    let token = generate_access_token(
        user_id,
        username.to_string(),
        role,
        &config.jwt_secret,
        config.access_token_ttl,
    );
    format!("Bearer {token}")
}

/// Rate limiting keys on the peer address; test requests need one.
pub fn peer() -> SocketAddr {
    "127.0.0.1:9000".parse().unwrap()
}

pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}
