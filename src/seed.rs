use anyhow::{Result, anyhow};
use sqlx::MySqlPool;

use crate::auth::password::hash_password;
use crate::model::role::Role;
use crate::utils::email_registry;

/// Provision the default accounts so a fresh deployment has one admin and
/// one employee to log in with. Idempotent.
pub async fn seed_default_users(pool: &MySqlPool) -> Result<()> {
    ensure_user(pool, "Admin User", "admin@example.com", "admin123", Role::Admin).await?;
    ensure_user(
        pool,
        "Employee User",
        "employee@example.com",
        "employee123",
        Role::Employee,
    )
    .await?;
    Ok(())
}

async fn ensure_user(
    pool: &MySqlPool,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<()> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
    )
    .bind(email)
    .fetch_one(pool)
    .await?;

    if exists {
        log::info!("Seed account {} already exists", email);
        return Ok(());
    }

    let hashed = hash_password(password).map_err(|e| anyhow!("Password hashing failed: {}", e))?;

    sqlx::query("INSERT INTO users (name, email, password, role) VALUES (?, ?, ?, ?)")
        .bind(name)
        .bind(email)
        .bind(&hashed)
        .bind(role.as_str())
        .execute(pool)
        .await?;

    email_registry::mark_taken(email).await;

    log::info!("Seeded {} account {}", role.as_str(), email);
    Ok(())
}
