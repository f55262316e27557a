use actix_web::{HttpResponse, web};
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::api::attendance::{AttendanceEntry, AttendanceRow};
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::role::Role;

const SELECT_ROWS: &str = r#"
SELECT a.id, a.user_id, u.username, u.full_name, u.position, a.check_in, a.check_out
FROM attendance a
JOIN users u ON u.id = a.user_id
"#;

const RECENT_LIMIT: i64 = 10;

#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    /// Workers currently on shift.
    pub open_intervals: Vec<AttendanceEntry>,
    /// The most recent records, newest first.
    pub recent: Vec<AttendanceEntry>,
    pub show_other_users: bool,
}

/// Dashboard: admins see everyone, workers see only themselves.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses(
        (status = 200, description = "Open intervals plus recent records", body = DashboardResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Dashboard"
)]
pub async fn dashboard(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let show_other_users = auth.role == Role::Admin;

    let (open, recent) = if show_other_users {
        let open = sqlx::query_as::<_, AttendanceRow>(&format!(
            "{SELECT_ROWS} WHERE a.check_out IS NULL ORDER BY a.check_in DESC"
        ))
        .fetch_all(pool.get_ref())
        .await?;

        let recent =
            sqlx::query_as::<_, AttendanceRow>(&format!("{SELECT_ROWS} ORDER BY a.check_in DESC LIMIT ?"))
                .bind(RECENT_LIMIT)
                .fetch_all(pool.get_ref())
                .await?;

        (open, recent)
    } else {
        let open = sqlx::query_as::<_, AttendanceRow>(&format!(
            "{SELECT_ROWS} WHERE a.user_id = ? AND a.check_out IS NULL ORDER BY a.check_in DESC"
        ))
        .bind(auth.user_id)
        .fetch_all(pool.get_ref())
        .await?;

        let recent = sqlx::query_as::<_, AttendanceRow>(&format!(
            "{SELECT_ROWS} WHERE a.user_id = ? ORDER BY a.check_in DESC LIMIT ?"
        ))
        .bind(auth.user_id)
        .bind(RECENT_LIMIT)
        .fetch_all(pool.get_ref())
        .await?;

        (open, recent)
    };

    Ok(HttpResponse::Ok().json(DashboardResponse {
        open_intervals: open.into_iter().map(Into::into).collect(),
        recent: recent.into_iter().map(Into::into).collect(),
        show_other_users,
    }))
}
