use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::Squadron;

/// Request payload for creating a new squadron
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSquadronRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SquadronResponse {
    pub squadron_id: Uuid,
    pub name: String,
    pub total_points: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Squadron> for SquadronResponse {
    fn from(s: Squadron) -> Self {
        Self {
            squadron_id: s.squadron_id,
            name: s.name,
            total_points: s.total_points,
            created_at: s.created_at,
        }
    }
}

/// One row of the league standings, ordered by total points
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StandingsEntry {
    pub rank: i32,
    pub squadron_id: Uuid,
    pub name: String,
    pub total_points: i64,
}
