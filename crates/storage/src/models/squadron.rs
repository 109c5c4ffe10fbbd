use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Squadron {
    pub squadron_id: Uuid,
    pub name: String,
    pub total_points: i64,
    pub created_at: DateTime<Utc>,
}
