use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Per-squadron outcome of a finalized event.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SquadronResult {
    pub result_id: Uuid,
    pub event_id: Uuid,
    pub squadron_id: Uuid,
    pub position: i32,
    pub total_points: i64,
    pub points_awarded: i64,
    pub percentage_awarded: i16,
    pub created_at: DateTime<Utc>,
}

/// Per-pilot line of a squadron result.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ResultPilot {
    pub result_pilot_id: Uuid,
    pub result_id: Uuid,
    pub pilot_id: Uuid,
    pub final_position: i32,
    pub individual_points: i64,
    pub kart_number: i16,
}
