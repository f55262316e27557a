use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

use crate::api::attendance::{AttendanceEntry, ToggleAction, ToggleReq};
use crate::api::dashboard::DashboardResponse;
use crate::api::reports::{ReportQuery, ReportResponse, UserReport};
use crate::api::users::{
    UpdateUser, UserAttendanceEntry, UserDetailResponse, UserListResponse, UserQuery, UserResponse,
};
use crate::model::role::Role;
use crate::model::user::UserSummary;
use crate::models::RegisterReq;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance System API",
        version = "1.0.0",
        description = r#"
## Employee Attendance Tracking

This API tracks employee check-in/check-out times and produces basic
attendance reports.

### Key Features
- **Presence Tracking**
  - Workers open and close their single presence interval
- **Dashboard**
  - Open intervals plus the most recent records, role-scoped
- **Reporting**
  - Per-user hour and day totals over a date range
- **User Administration**
  - List, inspect and update accounts

### Security
Protected endpoints use **JWT Bearer authentication**. Reporting and user
administration require the **admin** role; recording attendance requires the
**worker** role.
"#,
    ),
    paths(
        crate::api::attendance::toggle,
        crate::api::dashboard::dashboard,
        crate::api::reports::reports,
        crate::api::users::list_users,
        crate::api::users::get_user,
        crate::api::users::update_user,
    ),
    components(
        schemas(
            Role,
            RegisterReq,
            ToggleAction,
            ToggleReq,
            AttendanceEntry,
            DashboardResponse,
            ReportQuery,
            UserReport,
            ReportResponse,
            UserSummary,
            UserQuery,
            UserResponse,
            UserListResponse,
            UserAttendanceEntry,
            UserDetailResponse,
            UpdateUser
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Check-in/check-out APIs"),
        (name = "Dashboard", description = "Presence overview APIs"),
        (name = "Reports", description = "Attendance reporting APIs"),
        (name = "Users", description = "User administration APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        // components are registered above, safe to unwrap
        let components = openapi.components.as_mut().unwrap();
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
