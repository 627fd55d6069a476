use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

use crate::{
    auth::{
        auth::AuthUser,
        jwt::generate_access_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    model::role::Role,
    models::{LoginReqDto, RegisterReqDto, UserSql},
    utils::email_registry,
};

// auth end points

#[derive(Serialize)]
struct UserProfile {
    id: u64,
    name: String,
    email: String,
    role: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    user: UserProfile,
}

/// Inserts a new account and updates the e-mail registry
async fn insert_user(
    name: &str,
    email: &str,
    password: &str,
    role: Role,
    pool: &MySqlPool,
) -> Result<(), HttpResponse> {
    let hashed = match hash_password(password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Password hashing failed");
            return Err(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to register user"
            })));
        }
    };

    let result = sqlx::query(r#"INSERT INTO users (name, email, password, role) VALUES (?, ?, ?, ?)"#)
        .bind(name)
        .bind(email)
        .bind(&hashed)
        .bind(role.as_str())
        .execute(pool)
        .await;

    match result {
        Ok(_) => {
            // keep the registry consistent with what just hit the table
            email_registry::mark_taken(email).await;
            Ok(())
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code() == Some("23000".into()) {
                    return Err(HttpResponse::Conflict().json(json!({
                        "error": "Email already registered"
                    })));
                }
            }

            error!(error = %e, "Failed to insert user");
            Err(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to register user"
            })))
        }
    }
}

/// Admin-only account provisioning
pub async fn register(
    auth: AuthUser,
    payload: web::Json<RegisterReqDto>,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let name = payload.name.trim();
    let email = payload.email.trim().to_lowercase();
    let password = &payload.password;

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Name, email and password must not be empty"
        })));
    }

    if !email_registry::is_available(&email, pool.get_ref()).await {
        return Ok(HttpResponse::Conflict().json(json!({
            "error": "Email already registered"
        })));
    }

    // Safe to insert after DB check
    match insert_user(name, &email, password, payload.role, pool.get_ref()).await {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "message": "User registered successfully"
        }))),
        Err(err_resp) => Ok(err_resp),
    }
}

#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    // 1️⃣ Basic validation
    let email = user.email.trim().to_lowercase();
    if email.is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return HttpResponse::BadRequest().body("Email or password required");
    }

    debug!("Fetching user from database");

    // 2️⃣ Fetch user
    let db_user = match sqlx::query_as::<_, UserSql>(
        r#"
        SELECT id, name, email, password, role
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(Some(user)) => {
            debug!(user_id = user.id, "User found");
            user
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 3️⃣ Verify password
    debug!("Verifying password");

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().body("Invalid credentials");
    }

    debug!("Password verified");

    let role = match Role::from_str(&db_user.role) {
        Some(r) => r,
        None => {
            error!(user_id = db_user.id, role = %db_user.role, "Unknown role stored for user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 4️⃣ Generate access token
    debug!("Generating access token");

    let token = match generate_access_token(
        db_user.id,
        db_user.email.clone(),
        db_user.name.clone(),
        role,
        &config.jwt_secret,
        config.access_token_ttl,
    ) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 5️⃣ Update last_login_at (non-fatal)
    debug!("Updating last_login_at");

    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(db_user.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
        // intentionally not failing login
    }

    info!("Login successful");

    HttpResponse::Ok().json(LoginResponse {
        token,
        user: UserProfile {
            id: db_user.id,
            name: db_user.name,
            email: db_user.email,
            role: role.as_str().to_string(),
        },
    })
}
