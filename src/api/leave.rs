use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{MySqlPool, prelude::FromRow};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::model::leave::LeaveAction;
use crate::model::user::UserIdentity;

const MIN_REASON_LEN: usize = 10;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-03-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "family trip planned")]
    pub reason: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLeaveStatus {
    #[schema(example = "approved")]
    pub status: LeaveAction,
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee": { "id": 2, "name": "Alice Rahman", "email": "alice@example.com" },
    "start_date": "2024-03-01",
    "end_date": "2024-03-03",
    "reason": "family trip planned",
    "total_days": 3,
    "status": "pending",
    "approved_by": null,
    "approved_at": null,
    "created_at": "2024-02-20T08:30:00Z"
}))]
pub struct LeaveView {
    #[schema(example = 1)]
    pub id: u64,
    /// requesting employee, resolved for display
    pub employee: UserIdentity,
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-03-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "family trip planned")]
    pub reason: String,
    #[schema(example = 3)]
    pub total_days: i64,
    #[schema(example = "pending")]
    pub status: String,
    /// deciding admin, present once the request left `pending`
    pub approved_by: Option<UserIdentity>,
    #[schema(example = "2024-02-21T10:00:00Z", format = "date-time", value_type = Option<String>)]
    pub approved_at: Option<DateTime<Utc>>,
    #[schema(example = "2024-02-20T08:30:00Z", format = "date-time", value_type = Option<String>)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Flat row shape of the read-time join against the users table.
#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    employee_name: String,
    employee_email: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: String,
    total_days: i64,
    status: String,
    approved_by: Option<u64>,
    approver_name: Option<String>,
    approver_email: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
}

impl From<LeaveRow> for LeaveView {
    fn from(row: LeaveRow) -> Self {
        let approved_by = match (row.approved_by, row.approver_name, row.approver_email) {
            (Some(id), Some(name), Some(email)) => Some(UserIdentity { id, name, email }),
            _ => None,
        };

        LeaveView {
            id: row.id,
            employee: UserIdentity {
                id: row.employee_id,
                name: row.employee_name,
                email: row.employee_email,
            },
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            total_days: row.total_days,
            status: row.status,
            approved_by,
            approved_at: row.approved_at,
            created_at: row.created_at,
        }
    }
}

const LEAVE_VIEW_SQL: &str = r#"
SELECT
    l.id,
    l.employee_id,
    e.name  AS employee_name,
    e.email AS employee_email,
    l.start_date,
    l.end_date,
    l.reason,
    l.total_days,
    l.status,
    l.approved_by,
    a.name  AS approver_name,
    a.email AS approver_email,
    l.approved_at,
    l.created_at
FROM leaves l
JOIN users e ON e.id = l.employee_id
LEFT JOIN users a ON a.id = l.approved_by
"#;

/// Inclusive calendar-day count. Computed on dates, never timestamps, so a
/// time-of-day component can not drift the count.
fn total_days(start_date: NaiveDate, end_date: NaiveDate) -> i64 {
    (end_date - start_date).num_days() + 1
}

/// Trimmed reason, or None when shorter than the minimum.
fn normalized_reason(reason: &str) -> Option<&str> {
    let trimmed = reason.trim();
    (trimmed.chars().count() >= MIN_REASON_LEN).then_some(trimmed)
}

fn audit_message(admin_name: &str, action: LeaveAction, leave_id: u64, at: DateTime<Utc>) -> String {
    format!(
        "Admin {} {} leave request {} at {}",
        admin_name,
        action.as_str(),
        leave_id,
        at.to_rfc3339()
    )
}

async fn fetch_leave_view(pool: &MySqlPool, leave_id: u64) -> Result<Option<LeaveView>, sqlx::Error> {
    let sql = format!("{} WHERE l.id = ?", LEAVE_VIEW_SQL);
    let row = sqlx::query_as::<_, LeaveRow>(&sql)
        .bind(leave_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(LeaveView::from))
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/leaves",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request created", body = LeaveView),
        (status = 400, description = "Invalid date range or reason too short"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require_employee()?;

    // 1️⃣ validate dates
    if payload.end_date < payload.start_date {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "end_date cannot be before start_date"
        })));
    }

    // 2️⃣ validate reason
    let reason = match normalized_reason(&payload.reason) {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Reason must be at least 10 characters long"
            })));
        }
    };

    let days = total_days(payload.start_date, payload.end_date);

    // 3️⃣ insert request, status defaults to pending
    let result = sqlx::query(
        r#"
        INSERT INTO leaves
            (employee_id, start_date, end_date, reason, total_days)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(reason)
    .bind(days)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id = auth.user_id, "Failed to create leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let leave_id = result.last_insert_id();

    let leave = fetch_leave_view(pool.get_ref(), leave_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch created leave request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Internal Server Error"))?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Leave request created successfully",
        "leave": leave
    })))
}

/* =========================
Employee's own history
========================= */
#[utoipa::path(
    get,
    path = "/leaves/my-leaves",
    responses(
        (status = 200, description = "Caller's leave requests, newest first", body = [LeaveView]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_employee()?;

    let sql = format!(
        "{} WHERE l.employee_id = ? ORDER BY l.created_at DESC, l.id DESC",
        LEAVE_VIEW_SQL
    );
    let rows = sqlx::query_as::<_, LeaveRow>(&sql)
        .bind(auth.user_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id = auth.user_id, "Failed to fetch own leave requests");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let leaves: Vec<LeaveView> = rows.into_iter().map(LeaveView::from).collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({ "leaves": leaves })))
}

/* =========================
All requests (Admin)
========================= */
#[utoipa::path(
    get,
    path = "/leaves/all",
    responses(
        (status = 200, description = "Every leave request, newest first", body = [LeaveView]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn all_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let sql = format!("{} ORDER BY l.created_at DESC, l.id DESC", LEAVE_VIEW_SQL);
    let rows = sqlx::query_as::<_, LeaveRow>(&sql)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch leave list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let leaves: Vec<LeaveView> = rows.into_iter().map(LeaveView::from).collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({ "leaves": leaves })))
}

/* =========================
Decide a request (Admin)
========================= */
#[utoipa::path(
    put,
    path = "/leaves/{leave_id}/status",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to decide")
    ),
    request_body(
        content = UpdateLeaveStatus,
        description = "Target status, approved or rejected",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request decided", body = LeaveView),
        (status = 400, description = "Invalid status or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_leave_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeaveStatus>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let leave_id = path.into_inner();
    let action = payload.status;

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // The status guard in the WHERE clause makes the transition atomic:
    // of two concurrent decisions exactly one affects a row.
    let result = sqlx::query(
        r#"
        UPDATE leaves
        SET status = ?, approved_by = ?, approved_at = NOW()
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(action.as_str())
    .bind(auth.user_id)
    .bind(leave_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Leave status update failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        // distinguish a missing request from an already-decided one
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM leaves WHERE id = ? LIMIT 1)",
        )
        .bind(leave_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Leave existence probe failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

        return if exists {
            Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Leave request already processed"
            })))
        } else {
            Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Leave request not found"
            })))
        };
    }

    let message = audit_message(&auth.name, action, leave_id, Utc::now());

    sqlx::query(
        r#"
        INSERT INTO audit_logs (admin_id, leave_id, action, message)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(leave_id)
    .bind(action.as_str())
    .bind(&message)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to write audit log");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // transition and audit entry land together or not at all
    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to commit leave decision");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let leave = fetch_leave_view(pool.get_ref(), leave_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch decided leave request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Internal Server Error"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Leave request {} successfully", action.as_str()),
        "leave": leave
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn single_day_counts_as_one() {
        assert_eq!(total_days(date(2024, 3, 1), date(2024, 3, 1)), 1);
    }

    #[test]
    fn count_includes_both_endpoints() {
        assert_eq!(total_days(date(2024, 3, 1), date(2024, 3, 3)), 3);
    }

    #[test]
    fn count_crosses_month_boundaries() {
        assert_eq!(total_days(date(2024, 1, 30), date(2024, 2, 2)), 4);
    }

    #[test]
    fn count_honours_leap_days() {
        // 2024-02-28, 02-29, 03-01
        assert_eq!(total_days(date(2024, 2, 28), date(2024, 3, 1)), 3);
        // 2023 has no Feb 29
        assert_eq!(total_days(date(2023, 2, 28), date(2023, 3, 1)), 2);
    }

    #[test]
    fn reason_is_trimmed_before_length_check() {
        assert_eq!(normalized_reason("   too short   "), None);
        assert_eq!(
            normalized_reason("  family trip planned  "),
            Some("family trip planned")
        );
    }

    #[test]
    fn reason_of_exactly_minimum_length_passes() {
        assert_eq!(normalized_reason("abcdefghij"), Some("abcdefghij"));
        assert_eq!(normalized_reason("abcdefghi"), None);
    }

    #[test]
    fn status_body_accepts_only_terminal_values() {
        let ok: UpdateLeaveStatus = serde_json::from_str(r#"{"status": "approved"}"#).unwrap();
        assert_eq!(ok.status, LeaveAction::Approved);
        let ok: UpdateLeaveStatus = serde_json::from_str(r#"{"status": "rejected"}"#).unwrap();
        assert_eq!(ok.status, LeaveAction::Rejected);

        assert!(serde_json::from_str::<UpdateLeaveStatus>(r#"{"status": "pending"}"#).is_err());
        assert!(serde_json::from_str::<UpdateLeaveStatus>(r#"{"status": "done"}"#).is_err());
        assert!(serde_json::from_str::<UpdateLeaveStatus>(r#"{}"#).is_err());
    }

    #[test]
    fn audit_message_names_admin_action_and_leave() {
        let at = DateTime::parse_from_rfc3339("2024-03-05T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let message = audit_message("Bob", LeaveAction::Approved, 17, at);

        assert!(message.contains("Bob"));
        assert!(message.contains("approved"));
        assert!(message.contains("17"));
        assert!(message.contains("2024-03-05T12:00:00"));
    }

    #[test]
    fn row_without_approver_maps_to_pending_view() {
        let row = LeaveRow {
            id: 1,
            employee_id: 2,
            employee_name: "Alice".to_string(),
            employee_email: "alice@example.com".to_string(),
            start_date: date(2024, 3, 1),
            end_date: date(2024, 3, 3),
            reason: "family trip planned".to_string(),
            total_days: 3,
            status: "pending".to_string(),
            approved_by: None,
            approver_name: None,
            approver_email: None,
            approved_at: None,
            created_at: None,
        };

        let view = LeaveView::from(row);
        assert_eq!(view.employee.name, "Alice");
        assert!(view.approved_by.is_none());
        assert!(view.approved_at.is_none());
        assert_eq!(view.status, "pending");
    }

    #[test]
    fn row_with_approver_resolves_identity() {
        let row = LeaveRow {
            id: 1,
            employee_id: 2,
            employee_name: "Alice".to_string(),
            employee_email: "alice@example.com".to_string(),
            start_date: date(2024, 3, 1),
            end_date: date(2024, 3, 3),
            reason: "family trip planned".to_string(),
            total_days: 3,
            status: "approved".to_string(),
            approved_by: Some(9),
            approver_name: Some("Bob".to_string()),
            approver_email: Some("bob@example.com".to_string()),
            approved_at: None,
            created_at: None,
        };

        let view = LeaveView::from(row);
        let approver = view.approved_by.unwrap();
        assert_eq!(approver.id, 9);
        assert_eq!(approver.name, "Bob");
    }
}
