use crate::api::leave::{CreateLeave, LeaveView, UpdateLeaveStatus};
use crate::model::leave::LeaveAction;
use crate::model::user::UserIdentity;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management System API",
        version = "1.0.0",
        description = r#"
## Leave Management System

This API powers a small **leave-request management** service: employees submit
leave requests, admins approve or reject them, and every decision is recorded
in an audit trail.

### 🔹 Key Features
- **Leave requests**
  - Submit a request with a date range and reason; the inclusive day count is computed for you
- **Role-scoped views**
  - Employees see their own history, admins see every request
- **Decisions with audit trail**
  - A pending request is approved or rejected exactly once, stamping the deciding admin and time

### 🔐 Security
Endpoints under `/leaves` are protected with **JWT Bearer authentication**.
`create` and `my-leaves` are employee-only; `all` and `status` are admin-only.

### 📦 Response Format
- JSON-based RESTful responses

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave::create_leave,
        crate::api::leave::my_leaves,
        crate::api::leave::all_leaves,
        crate::api::leave::update_leave_status,
    ),
    components(
        schemas(
            CreateLeave,
            UpdateLeaveStatus,
            LeaveView,
            LeaveAction,
            UserIdentity
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
