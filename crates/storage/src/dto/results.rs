use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One pilot line inside a squadron result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PilotResultEntry {
    pub pilot_id: Uuid,
    pub final_position: i32,
    pub individual_points: i64,
    pub kart_number: i16,
}

/// A squadron's placement and payout for one finalized event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SquadronResultEntry {
    pub squadron_id: Uuid,
    pub position: i32,
    pub total_points: i64,
    pub points_awarded: i64,
    pub percentage_awarded: i16,
    pub pilots: Vec<PilotResultEntry>,
}
