use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::attendance::{Attendance, round_hours};
use crate::model::role::Role;
use crate::utils::db_utils::{build_update_sql, execute_update};

/// Columns an admin may touch through the dynamic update.
const UPDATABLE_COLUMNS: &[&str] = &["full_name", "position", "role", "is_active"];

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    /// Search by username, full name or position
    pub search: Option<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct UserResponse {
    #[schema(example = 7)]
    pub id: i64,
    #[schema(example = "ivanov")]
    pub username: String,
    #[schema(example = "Ivan Ivanov")]
    pub full_name: String,
    #[schema(example = "Foreman")]
    pub position: String,
    pub role: Role,
    pub is_active: bool,
}

#[derive(Serialize, ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserResponse>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 5)]
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserAttendanceEntry {
    pub id: i64,
    #[schema(example = "2024-01-15T09:00:00", value_type = String, format = "date-time")]
    pub check_in: NaiveDateTime,
    #[schema(example = "2024-01-15T17:30:00", value_type = String, format = "date-time", nullable = true)]
    pub check_out: Option<NaiveDateTime>,
    pub is_present: bool,
    #[schema(example = 8.5, nullable = true)]
    pub duration_hours: Option<f64>,
}

impl From<Attendance> for UserAttendanceEntry {
    fn from(record: Attendance) -> Self {
        UserAttendanceEntry {
            id: record.id,
            is_present: record.is_present(),
            duration_hours: record.duration_hours(),
            check_in: record.check_in,
            check_out: record.check_out,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct UserDetailResponse {
    pub user: UserResponse,
    /// Hours worked in the current month
    #[schema(example = 168.5)]
    pub total_hours: f64,
    /// Records in the current month
    #[schema(example = 21)]
    pub total_days: i64,
    pub records: Vec<UserAttendanceEntry>,
}

/// Documented shape of the partial-update payload.
#[derive(Deserialize, ToSchema)]
pub struct UpdateUser {
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    Role(Role),
    Bool(bool),
    Text(String),
}

/// List users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Paginated user list", body = UserListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<FilterValue> = Vec::new();

    if let Some(role) = query.role {
        conditions.push("role = ?");
        bindings.push(FilterValue::Role(role));
    }

    if let Some(is_active) = query.is_active {
        conditions.push("is_active = ?");
        bindings.push(FilterValue::Bool(is_active));
    }

    if let Some(search) = &query.search {
        conditions.push("(username LIKE ? OR full_name LIKE ? OR position LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(FilterValue::Text(like.clone()));
        bindings.push(FilterValue::Text(like.clone()));
        bindings.push(FilterValue::Text(like));
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM users {}", where_clause);

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for binding in &bindings {
        count_query = match binding {
            FilterValue::Role(r) => count_query.bind(*r),
            FilterValue::Bool(b) => count_query.bind(*b),
            FilterValue::Text(t) => count_query.bind(t.clone()),
        };
    }
    let total = count_query.fetch_one(pool.get_ref()).await?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT id, username, full_name, position, role, is_active FROM users {} ORDER BY username LIMIT ? OFFSET ?",
        where_clause
    );

    let mut data_query = sqlx::query_as::<_, UserResponse>(&data_sql);
    for binding in &bindings {
        data_query = match binding {
            FilterValue::Role(r) => data_query.bind(*r),
            FilterValue::Bool(b) => data_query.bind(*b),
            FilterValue::Text(t) => data_query.bind(t.clone()),
        };
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let users = data_query.fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(UserListResponse {
        data: users,
        page,
        per_page,
        total,
    }))
}

/// Get one user with full attendance history and current-month totals
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    params(
        ("user_id", Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserDetailResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn get_user(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let user_id = path.into_inner();

    let user = sqlx::query_as::<_, UserResponse>(
        "SELECT id, username, full_name, position, role, is_active FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool.get_ref())
    .await?;

    let Some(user) = user else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "User not found"
        })));
    };

    let records = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, user_id, check_in, check_out
        FROM attendance
        WHERE user_id = ?
        ORDER BY check_in DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool.get_ref())
    .await?;

    // Current-month window; timestamps are stored as naive UTC.
    let today = Utc::now().naive_utc().date();
    let month_start = today.with_day(1).unwrap_or(today).and_time(NaiveTime::MIN);

    let mut total_hours = 0.0;
    let mut total_days = 0i64;
    for record in records.iter().filter(|r| r.check_in >= month_start) {
        total_days += 1;
        if let Some(hours) = record.duration_hours() {
            total_hours = round_hours(total_hours + hours);
        }
    }

    Ok(HttpResponse::Ok().json(UserDetailResponse {
        user,
        total_hours,
        total_days,
        records: records.into_iter().map(Into::into).collect(),
    }))
}

/// Update a user's profile, role or active flag
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}",
    params(
        ("user_id", Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated successfully", body = Object, example = json!({
            "message": "User updated successfully"
        })),
        (status = 400, description = "Unknown column or bad value"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let user_id = path.into_inner();

    if let Some(role) = body.get("role") {
        role.as_str()
            .and_then(|s| s.parse::<Role>().ok())
            .ok_or_else(|| ApiError::Validation("Invalid role".to_string()))?;
    }

    let update = build_update_sql("users", UPDATABLE_COLUMNS, &body, "id", user_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "User not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "User updated successfully"
    })))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web::Data};
    use chrono::{Datelike, Duration, NaiveTime, Utc};
    use serde_json::{Value, json};

    use crate::model::role::Role;
    use crate::routes;
    use crate::test_utils::{bearer, peer, seed_attendance, seed_user, test_config, test_pool};

    #[actix_web::test]
    async fn list_is_admin_only_and_filters() {
        let pool = test_pool().await;
        let config = test_config();
        let admin = seed_user(&pool, "usr_admin", Role::Admin).await;
        let w1 = seed_user(&pool, "usr_w1", Role::Worker).await;
        seed_user(&pool, "usr_w2", Role::Worker).await;

        let app = test::init_service(
            App::new()
                .app_data(Data::new(pool.clone()))
                .app_data(Data::new(config.clone()))
                .configure(|cfg| routes::configure(cfg, config.clone())),
        )
        .await;

        let admin_token = bearer(&config, admin, "usr_admin", Role::Admin);

        let req = test::TestRequest::get()
            .uri("/api/v1/users?role=worker")
            .insert_header(("Authorization", admin_token.clone()))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["data"][0]["username"], "usr_w1");

        let req = test::TestRequest::get()
            .uri("/api/v1/users?search=w2")
            .insert_header(("Authorization", admin_token))
            .peer_addr(peer())
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["data"][0]["username"], "usr_w2");

        // workers get turned away
        let worker_token = bearer(&config, w1, "usr_w1", Role::Worker);
        let req = test::TestRequest::get()
            .uri("/api/v1/users")
            .insert_header(("Authorization", worker_token))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn detail_reports_current_month_totals() {
        let pool = test_pool().await;
        let config = test_config();
        let admin = seed_user(&pool, "usr_det_admin", Role::Admin).await;
        let worker = seed_user(&pool, "usr_det_w", Role::Worker).await;

        let month_start = {
            let today = Utc::now().naive_utc().date();
            today.with_day(1).unwrap().and_time(NaiveTime::MIN)
        };

        // this month: 8.5 hours
        seed_attendance(
            &pool,
            worker,
            month_start + Duration::hours(9),
            Some(month_start + Duration::minutes(17 * 60 + 30)),
        )
        .await;
        // last month: excluded from totals, still in the record list
        seed_attendance(
            &pool,
            worker,
            month_start - Duration::days(1),
            Some(month_start - Duration::days(1) + Duration::hours(8)),
        )
        .await;

        let app = test::init_service(
            App::new()
                .app_data(Data::new(pool.clone()))
                .app_data(Data::new(config.clone()))
                .configure(|cfg| routes::configure(cfg, config.clone())),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/users/{worker}"))
            .insert_header((
                "Authorization",
                bearer(&config, admin, "usr_det_admin", Role::Admin),
            ))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["user"]["username"], "usr_det_w");
        assert_eq!(body["total_days"], 1);
        assert_eq!(body["total_hours"], 8.5);
        assert_eq!(body["records"].as_array().unwrap().len(), 2);

        // unknown user
        let req = test::TestRequest::get()
            .uri("/api/v1/users/99999")
            .insert_header((
                "Authorization",
                bearer(&config, admin, "usr_det_admin", Role::Admin),
            ))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn update_is_whitelisted() {
        let pool = test_pool().await;
        let config = test_config();
        let admin = seed_user(&pool, "usr_upd_admin", Role::Admin).await;
        let worker = seed_user(&pool, "usr_upd_w", Role::Worker).await;
        let token = bearer(&config, admin, "usr_upd_admin", Role::Admin);

        let app = test::init_service(
            App::new()
                .app_data(Data::new(pool.clone()))
                .app_data(Data::new(config.clone()))
                .configure(|cfg| routes::configure(cfg, config.clone())),
        )
        .await;

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/users/{worker}"))
            .insert_header(("Authorization", token.clone()))
            .set_json(json!({"position": "Technologist", "is_active": false}))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let (position, is_active): (String, bool) =
            sqlx::query_as("SELECT position, is_active FROM users WHERE id = ?")
                .bind(worker)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(position, "Technologist");
        assert!(!is_active);

        // password is not an updatable column
        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/users/{worker}"))
            .insert_header(("Authorization", token.clone()))
            .set_json(json!({"password": "hijack"}))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // bogus role values are rejected before touching the database
        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/users/{worker}"))
            .insert_header(("Authorization", token))
            .set_json(json!({"role": "superuser"}))
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
