use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Sanction, SanctionType};

/// Request payload for applying a sanction to a driver
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ApplySanctionRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Driver name must be between 1 and 255 characters"
    ))]
    pub driver_name: String,

    pub sanction_type: SanctionType,

    #[validate(length(min = 1, max = 2000))]
    pub description: String,

    #[validate(range(min = 1, max = 20))]
    pub position_penalty: Option<i32>,

    #[validate(range(min = 1, max = 50))]
    pub points_penalty: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SanctionResponse {
    pub sanction_id: Uuid,
    pub event_id: Uuid,
    pub driver_name: String,
    pub pilot_id: Uuid,
    pub sanction_type: SanctionType,
    pub description: String,
    pub position_penalty: Option<i32>,
    pub points_penalty: Option<i32>,
    pub applied_at: DateTime<Utc>,
}

impl From<Sanction> for SanctionResponse {
    fn from(s: Sanction) -> Self {
        Self {
            sanction_id: s.sanction_id,
            event_id: s.event_id,
            driver_name: s.driver_name,
            pilot_id: s.pilot_id,
            sanction_type: s.sanction_type,
            description: s.description,
            position_penalty: s.position_penalty,
            points_penalty: s.points_penalty,
            applied_at: s.applied_at,
        }
    }
}
