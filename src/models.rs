use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::model::role::Role;

#[derive(Deserialize)]
pub struct LoginReqDto {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterReqDto {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(FromRow)]
pub struct UserSql {
    pub id: u64, // 👈 matches BIGINT UNSIGNED
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String, // normalized e-mail
    /// Display name, carried so decision handlers can stamp the audit
    /// message without a user lookup
    pub name: String,
    pub role: Role,
    pub exp: usize,
    pub jti: String,
}
