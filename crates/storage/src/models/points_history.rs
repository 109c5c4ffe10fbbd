use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "points_change_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PointsChangeType {
    RaceResult,
    Adjustment,
}

/// Append-only audit record of a squadron total change. Never mutated or
/// deleted; the sum of `points_change` per squadron reproduces its running
/// total.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PointsHistoryEntry {
    pub entry_id: Uuid,
    pub squadron_id: Uuid,
    pub event_id: Option<Uuid>,
    pub points_change: i64,
    pub previous_total: i64,
    pub new_total: i64,
    pub reason: String,
    pub change_type: PointsChangeType,
    pub modified_by: Uuid,
    pub created_at: DateTime<Utc>,
}
