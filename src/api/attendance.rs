use actix_web::{HttpResponse, web};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::attendance::duration_hours;

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ToggleAction {
    CheckIn,
    CheckOut,
}

#[derive(Deserialize, ToSchema)]
pub struct ToggleReq {
    #[schema(example = "check_in")]
    pub action: ToggleAction,
}

/// Attendance row joined with its owner, the shape shared by the dashboard
/// and report queries.
#[derive(Debug, sqlx::FromRow)]
pub struct AttendanceRow {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub position: String,
    pub check_in: NaiveDateTime,
    pub check_out: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceEntry {
    pub id: i64,
    pub user_id: i64,
    #[schema(example = "ivanov")]
    pub username: String,
    #[schema(example = "Ivan Ivanov")]
    pub full_name: String,
    #[schema(example = "2024-01-15T09:00:00", value_type = String, format = "date-time")]
    pub check_in: NaiveDateTime,
    #[schema(example = "2024-01-15T17:30:00", value_type = String, format = "date-time", nullable = true)]
    pub check_out: Option<NaiveDateTime>,
    pub is_present: bool,
    #[schema(example = 8.5, nullable = true)]
    pub duration_hours: Option<f64>,
}

impl From<AttendanceRow> for AttendanceEntry {
    fn from(row: AttendanceRow) -> Self {
        AttendanceEntry {
            id: row.id,
            user_id: row.user_id,
            username: row.username,
            full_name: row.full_name,
            check_in: row.check_in,
            check_out: row.check_out,
            is_present: row.check_out.is_none(),
            duration_hours: duration_hours(row.check_in, row.check_out),
        }
    }
}

/// Check-in/check-out toggle
#[utoipa::path(
    post,
    path = "/api/v1/attendance",
    request_body = ToggleReq,
    responses(
        (status = 200, description = "Presence toggled", body = Object, example = json!({
            "message": "Checked in successfully"
        })),
        (status = 400, description = "Toggle out of sequence", body = Object, example = json!({
            "error": "Already checked in"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a worker"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn toggle(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    body: web::Json<ToggleReq>,
) -> Result<HttpResponse, ApiError> {
    auth.require_worker()?;

    let now = Utc::now().naive_utc();

    match body.action {
        ToggleAction::CheckIn => {
            // Guarded insert: zero rows affected means an interval is already
            // open. The partial unique index on open intervals backstops a
            // concurrent duplicate submission.
            let result = sqlx::query(
                r#"
                INSERT INTO attendance (user_id, check_in)
                SELECT ?, ?
                WHERE NOT EXISTS (
                    SELECT 1 FROM attendance WHERE user_id = ? AND check_out IS NULL
                )
                "#,
            )
            .bind(auth.user_id)
            .bind(now)
            .bind(auth.user_id)
            .execute(pool.get_ref())
            .await;

            match result {
                Ok(res) if res.rows_affected() == 0 => Err(ApiError::AlreadyCheckedIn),
                Ok(_) => Ok(HttpResponse::Ok().json(json!({
                    "message": "Checked in successfully"
                }))),
                Err(sqlx::Error::Database(db_err))
                    if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
                {
                    Err(ApiError::AlreadyCheckedIn)
                }
                Err(e) => Err(e.into()),
            }
        }
        ToggleAction::CheckOut => {
            let result = sqlx::query(
                r#"
                UPDATE attendance
                SET check_out = ?
                WHERE user_id = ? AND check_out IS NULL
                "#,
            )
            .bind(now)
            .bind(auth.user_id)
            .execute(pool.get_ref())
            .await?;

            if result.rows_affected() == 0 {
                return Err(ApiError::NotCheckedIn);
            }

            Ok(HttpResponse::Ok().json(json!({
                "message": "Checked out successfully"
            })))
        }
    }
}
