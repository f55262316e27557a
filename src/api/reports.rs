use std::collections::HashMap;

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

use crate::api::attendance::{AttendanceEntry, AttendanceRow};
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::attendance::round_hours;
use crate::model::user::UserSummary;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ReportQuery {
    /// Inclusive lower bound on the check-in date
    #[param(example = "2024-01-01", value_type = String, format = "date")]
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on the check-in date
    #[param(example = "2024-01-31", value_type = String, format = "date")]
    #[schema(example = "2024-01-31", value_type = String, format = "date")]
    pub end_date: Option<NaiveDate>,
    /// Restrict the report to one user
    #[param(example = 7)]
    pub user_id: Option<i64>,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    Date(NaiveDate),
    Id(i64),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserReport {
    pub user: UserSummary,
    #[schema(example = 168.5)]
    pub total_hours: f64,
    #[schema(example = 21)]
    pub total_days: i64,
    pub records: Vec<AttendanceEntry>,
}

#[derive(Serialize, ToSchema)]
pub struct ReportResponse {
    pub data: Vec<UserReport>,
}

/// Group fetched rows by owner, preserving first-seen order (rows arrive
/// newest check-in first). Open intervals count as a day but contribute no
/// hours.
pub fn summarize(rows: Vec<AttendanceRow>) -> Vec<UserReport> {
    let mut reports: Vec<UserReport> = Vec::new();
    let mut by_user: HashMap<i64, usize> = HashMap::new();

    for row in rows {
        let idx = *by_user.entry(row.user_id).or_insert_with(|| {
            reports.push(UserReport {
                user: UserSummary {
                    id: row.user_id,
                    username: row.username.clone(),
                    full_name: row.full_name.clone(),
                    position: row.position.clone(),
                },
                total_hours: 0.0,
                total_days: 0,
                records: Vec::new(),
            });
            reports.len() - 1
        });

        let entry: AttendanceEntry = row.into();
        let report = &mut reports[idx];
        report.total_days += 1;
        if let Some(hours) = entry.duration_hours {
            report.total_hours = round_hours(report.total_hours + hours);
        }
        report.records.push(entry);
    }

    reports
}

/// Attendance report grouped by user
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Per-user totals over the filtered records", body = ReportResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn reports(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<FilterValue> = Vec::new();

    if let Some(start_date) = query.start_date {
        conditions.push("date(a.check_in) >= date(?)");
        bindings.push(FilterValue::Date(start_date));
    }

    if let Some(end_date) = query.end_date {
        conditions.push("date(a.check_in) <= date(?)");
        bindings.push(FilterValue::Date(end_date));
    }

    if let Some(user_id) = query.user_id {
        conditions.push("a.user_id = ?");
        bindings.push(FilterValue::Id(user_id));
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        r#"
        SELECT a.id, a.user_id, u.username, u.full_name, u.position, a.check_in, a.check_out
        FROM attendance a
        JOIN users u ON u.id = a.user_id
        {}
        ORDER BY a.check_in DESC
        "#,
        where_clause
    );

    let mut data_query = sqlx::query_as::<_, AttendanceRow>(&sql);
    for binding in &bindings {
        data_query = match binding {
            FilterValue::Date(d) => data_query.bind(*d),
            FilterValue::Id(id) => data_query.bind(*id),
        };
    }

    let rows = data_query.fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(ReportResponse {
        data: summarize(rows),
    }))
}
