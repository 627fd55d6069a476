use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};
use jsonwebtoken::decode;
use jsonwebtoken::{DecodingKey, Validation};

use crate::config::Config;
use crate::model::role::Role;
use crate::models::Claims;

pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        // An unknown role string fails Claims deserialization, so a
        // tampered role comes out as an invalid token here.
        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            email: data.claims.sub,
            name: data.claims.name,
            role: data.claims.role,
        }))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Employee => Err(actix_web::error::ErrorForbidden("Admin only")),
        }
    }

    /// Roles are exclusive: an admin is not an employee for these endpoints.
    pub fn require_employee(&self) -> actix_web::Result<()> {
        match self.role {
            Role::Employee => Ok(()),
            Role::Admin => Err(actix_web::error::ErrorForbidden("Employee only")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            email: "user@example.com".to_string(),
            name: "User".to_string(),
            role,
        }
    }

    #[test]
    fn admin_check_rejects_employee() {
        assert!(user_with(Role::Admin).require_admin().is_ok());
        assert!(user_with(Role::Employee).require_admin().is_err());
    }

    #[test]
    fn employee_check_rejects_admin() {
        assert!(user_with(Role::Employee).require_employee().is_ok());
        assert!(user_with(Role::Admin).require_employee().is_err());
    }
}
