use chrono::Utc;
use sqlx::PgPool;
use storage::dto::fair_racing::{
    AwardRecognitionRequest, FairRacingScoreResponse, IncidentResponse, RecognitionResponse,
    ReportIncidentRequest,
};
use storage::repository::FairRacingRepository;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Caller;
use crate::error::Result;

/// A pilot's fair racing score, created lazily at the initial value
pub async fn get_score(pool: &PgPool, pilot_id: Uuid) -> Result<FairRacingScoreResponse> {
    let score = FairRacingRepository::new(pool).get_or_create(pilot_id).await?;
    Ok(score.into())
}

/// Report an incident for review. The score is untouched until approval.
pub async fn report_incident(
    pool: &PgPool,
    caller: &Caller,
    req: &ReportIncidentRequest,
) -> Result<IncidentResponse> {
    caller.require_organizer()?;
    req.validate()?;

    let incident = FairRacingRepository::new(pool)
        .report_incident(req, caller.account_id)
        .await?;

    tracing::info!(
        incident_id = %incident.incident_id,
        pilot_id = %incident.pilot_id,
        "incident reported"
    );
    Ok(incident.into())
}

/// Approve or reject a pending incident. Approval deducts the incident's
/// points from the pilot's score.
pub async fn review_incident(
    pool: &PgPool,
    caller: &Caller,
    incident_id: Uuid,
    approve: bool,
) -> Result<IncidentResponse> {
    caller.require_organizer()?;

    let incident = FairRacingRepository::new(pool)
        .review_incident(incident_id, approve, caller.account_id, Utc::now())
        .await?;

    tracing::info!(
        incident_id = %incident_id,
        approved = approve,
        "incident reviewed"
    );
    Ok(incident.into())
}

/// Recognise fair driving with 3 to 5 points, clamped at the ceiling
pub async fn award_recognition(
    pool: &PgPool,
    caller: &Caller,
    req: &AwardRecognitionRequest,
) -> Result<RecognitionResponse> {
    caller.require_organizer()?;
    req.validate()?;

    let recognition = FairRacingRepository::new(pool)
        .award_recognition(req, caller.account_id)
        .await?;

    tracing::info!(
        recognition_id = %recognition.recognition_id,
        pilot_id = %recognition.pilot_id,
        points = recognition.points_awarded,
        "recognition awarded"
    );
    Ok(recognition.into())
}

pub async fn pilot_incidents(pool: &PgPool, pilot_id: Uuid) -> Result<Vec<IncidentResponse>> {
    let incidents = FairRacingRepository::new(pool)
        .incidents_for_pilot(pilot_id)
        .await?;
    Ok(incidents.into_iter().map(IncidentResponse::from).collect())
}
