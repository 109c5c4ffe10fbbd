use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{FairRacingScore, Incident, IncidentStatus, Recognition};

/// Request payload for reporting a fair-racing incident
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReportIncidentRequest {
    pub pilot_id: Uuid,

    pub event_id: Option<Uuid>,

    #[validate(length(min = 1, max = 64))]
    pub category: String,

    #[validate(range(min = 1, max = 3, message = "Severity must be between 1 and 3"))]
    pub severity: i16,

    #[validate(range(min = 1, max = 50))]
    pub points_deducted: i16,
}

/// Request payload for recognising fair driving
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AwardRecognitionRequest {
    pub pilot_id: Uuid,

    pub event_id: Option<Uuid>,

    #[validate(range(min = 3, max = 5, message = "Recognition awards 3 to 5 points"))]
    pub points_awarded: i16,

    #[validate(length(min = 1, max = 2000))]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FairRacingScoreResponse {
    pub pilot_id: Uuid,
    pub current_score: i16,
    pub initial_score: i16,
    pub total_races_clean: i32,
    pub recovery_progress: i32,
    pub last_race_date: Option<DateTime<Utc>>,
}

impl From<FairRacingScore> for FairRacingScoreResponse {
    fn from(score: FairRacingScore) -> Self {
        Self {
            pilot_id: score.pilot_id,
            current_score: score.current_score,
            initial_score: score.initial_score,
            total_races_clean: score.total_races_clean,
            recovery_progress: score.recovery_progress,
            last_race_date: score.last_race_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IncidentResponse {
    pub incident_id: Uuid,
    pub pilot_id: Uuid,
    pub event_id: Option<Uuid>,
    pub category: String,
    pub severity: i16,
    pub points_deducted: i16,
    pub status: IncidentStatus,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl From<Incident> for IncidentResponse {
    fn from(i: Incident) -> Self {
        Self {
            incident_id: i.incident_id,
            pilot_id: i.pilot_id,
            event_id: i.event_id,
            category: i.category,
            severity: i.severity,
            points_deducted: i.points_deducted,
            status: i.status,
            created_at: i.created_at,
            reviewed_at: i.reviewed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecognitionResponse {
    pub recognition_id: Uuid,
    pub pilot_id: Uuid,
    pub event_id: Option<Uuid>,
    pub points_awarded: i16,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl From<Recognition> for RecognitionResponse {
    fn from(r: Recognition) -> Self {
        Self {
            recognition_id: r.recognition_id,
            pilot_id: r.pilot_id,
            event_id: r.event_id,
            points_awarded: r.points_awarded,
            reason: r.reason,
            created_at: r.created_at,
        }
    }
}
