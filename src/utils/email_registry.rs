//! Layered lookup of taken e-mail addresses used on the provisioning path:
//! a cuckoo filter answers "definitely not registered" without touching the
//! database, a moka cache answers "definitely registered" for recently seen
//! accounts, and the users table is the fallback.

use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;
use std::time::Duration;

/// Expected account count and false-positive rate.
/// Tune these based on real user counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static EMAIL_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

/// true => e-mail is TAKEN (only taken addresses are stored)
static EMAIL_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(500_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

#[inline]
fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Record a freshly provisioned e-mail in both layers.
pub async fn mark_taken(email: &str) {
    let email = normalize(email);
    EMAIL_FILTER
        .write()
        .expect("email filter poisoned")
        .add(&email);
    EMAIL_CACHE.insert(email, true).await;
}

/// true  => e-mail AVAILABLE
/// false => e-mail TAKEN
pub async fn is_available(email: &str, pool: &MySqlPool) -> bool {
    let email = normalize(email);

    // 1️⃣ Cuckoo filter — fast negative
    let might_exist = EMAIL_FILTER
        .read()
        .expect("email filter poisoned")
        .contains(&email);
    if !might_exist {
        return true;
    }

    // 2️⃣ Moka cache — fast positive
    if EMAIL_CACHE.get(&email).await.unwrap_or(false) {
        return false;
    }

    // 3️⃣ Database fallback
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
    )
    .bind(&email)
    .fetch_one(pool)
    .await
    .unwrap_or(true); // fail-safe

    !exists
}

/// Warm up both layers with one streaming pass over the users table.
/// Every address goes into the filter; addresses active within
/// `recent_days` also go into the cache.
pub async fn warmup(pool: &MySqlPool, recent_days: u32, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String, bool)>(
        r#"
        SELECT email,
               COALESCE(last_login_at >= NOW() - INTERVAL ? DAY, FALSE) AS recent
        FROM users
        "#,
    )
    .bind(recent_days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;
    let mut recent_total = 0usize;

    while let Some(row) = stream.next().await {
        let (email, recent) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;
        let email = normalize(&email);

        if recent {
            EMAIL_CACHE.insert(email.clone(), true).await;
            recent_total += 1;
        }

        batch.push(email);
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!(
        "Email registry warmup complete: {} accounts, {} recent (last {} days)",
        total,
        recent_total,
        recent_days
    );

    Ok(())
}

fn insert_batch(emails: &[String]) {
    let mut filter = EMAIL_FILTER.write().expect("email filter poisoned");

    for email in emails {
        filter.add(email);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The filter and cache are process-wide, so each test uses its own keys.

    #[actix_web::test]
    async fn marked_email_is_visible_in_both_layers() {
        mark_taken("Taken.User@Example.com").await;

        // No false negatives from a cuckoo filter.
        assert!(
            EMAIL_FILTER
                .read()
                .unwrap()
                .contains(&"taken.user@example.com".to_string())
        );
        assert!(
            EMAIL_CACHE
                .get("taken.user@example.com")
                .await
                .unwrap_or(false)
        );
    }

    #[actix_web::test]
    async fn cache_miss_for_unknown_email() {
        assert!(
            !EMAIL_CACHE
                .get("never.seen@example.com")
                .await
                .unwrap_or(false)
        );
    }

    #[test]
    fn normalization_lowercases_and_trims() {
        assert_eq!(normalize("  Bob@Example.COM "), "bob@example.com");
    }
}
