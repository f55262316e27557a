use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::SqlitePool;

/// true  => username is TAKEN
/// false => username is AVAILABLE (usually we store only taken)
pub static USERNAME_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Mark a single username as taken
pub async fn mark_taken(username: &str) {
    USERNAME_CACHE.insert(username.to_lowercase(), true).await;
}

/// Check if username is taken
pub async fn is_taken(username: &str) -> bool {
    USERNAME_CACHE
        .get(&username.to_lowercase())
        .await
        .unwrap_or(false)
}

/// Batch mark usernames as taken
async fn mark_batch(usernames: &[String]) {
    let futures: Vec<_> = usernames
        .iter()
        .map(|u| USERNAME_CACHE.insert(u.to_lowercase(), true))
        .collect();

    futures::future::join_all(futures).await;
}

/// Load usernames of recently active users into the cache (batched).
pub async fn warmup_username_cache(pool: &SqlitePool, days: i64, batch_size: usize) -> Result<()> {
    let cutoff = Utc::now().naive_utc() - chrono::Duration::days(days);

    let mut stream = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT username
        FROM users
        WHERE last_login_at >= ?
        ORDER BY last_login_at DESC
        "#,
    )
    .bind(cutoff)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (username,) = row?;
        batch.push(username);
        total += 1;

        if batch.len() >= batch_size {
            mark_batch(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        mark_batch(&batch).await;
    }

    tracing::info!(total, days, "Username cache warmup complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use crate::test_utils::{seed_user, test_pool};

    #[actix_web::test]
    async fn warmup_marks_recent_logins_taken() {
        let pool = test_pool().await;
        let id = seed_user(&pool, "cache_recent_user", Role::Worker).await;
        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(Utc::now().naive_utc())
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
        // never logged in, must not be cached
        seed_user(&pool, "cache_stale_user", Role::Worker).await;

        warmup_username_cache(&pool, 30, 2).await.unwrap();

        assert!(is_taken("cache_recent_user").await);
        assert!(is_taken("CACHE_RECENT_USER").await);
        assert!(!is_taken("cache_stale_user").await);
    }
}
