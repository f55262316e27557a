use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::role::Role;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub position: String,
    pub role: Role,
    pub is_active: bool,
}

/// Owner identity attached to grouped report rows.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    #[schema(example = 7)]
    pub id: i64,
    #[schema(example = "ivanov")]
    pub username: String,
    #[schema(example = "Ivan Ivanov")]
    pub full_name: String,
    #[schema(example = "Foreman")]
    pub position: String,
}
