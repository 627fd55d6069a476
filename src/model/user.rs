use serde::Serialize;
use utoipa::ToSchema;

/// Public identity of a user, resolved at read time for display.
/// Never carries the password hash.
#[derive(Debug, Serialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Alice Rahman",
        "email": "alice@example.com"
    })
)]
pub struct UserIdentity {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Alice Rahman")]
    pub name: String,

    #[schema(example = "alice@example.com")]
    pub email: String,
}
