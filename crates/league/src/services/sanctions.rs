use sqlx::PgPool;
use storage::dto::sanction::{ApplySanctionRequest, SanctionResponse};
use storage::repository::SanctionRepository;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Caller;
use crate::collaborators::{IdentityResolver, MatchConfidence};
use crate::error::{LeagueError, Result};

/// Record a sanction against a driver of a not-yet-finalized event. Nothing
/// reaches the pilot's fair-racing score or inbox until finalize, so the
/// organizer can keep amending sanctions during review without side effects
/// leaking out.
pub async fn apply_sanction(
    pool: &PgPool,
    caller: &Caller,
    event_id: Uuid,
    req: &ApplySanctionRequest,
    resolver: &impl IdentityResolver,
) -> Result<SanctionResponse> {
    caller.require_organizer()?;
    req.validate()?;

    let identity = resolver
        .resolve(&req.driver_name)
        .await?
        .ok_or(LeagueError::NotFound)?;

    if identity.confidence == MatchConfidence::Fuzzy {
        tracing::info!(
            driver = %req.driver_name,
            pilot_id = %identity.pilot_id,
            "driver name matched fuzzily"
        );
    }

    let sanction = SanctionRepository::new(pool)
        .create(event_id, identity.pilot_id, req, caller.account_id)
        .await?;

    tracing::info!(
        event_id = %event_id,
        sanction_id = %sanction.sanction_id,
        pilot_id = %sanction.pilot_id,
        "sanction recorded"
    );
    Ok(sanction.into())
}

/// Delete a sanction, permitted only before finalize
pub async fn remove_sanction(pool: &PgPool, caller: &Caller, sanction_id: Uuid) -> Result<()> {
    caller.require_organizer()?;

    SanctionRepository::new(pool).remove(sanction_id).await?;

    tracing::info!(sanction_id = %sanction_id, "sanction removed");
    Ok(())
}

pub async fn list_sanctions(pool: &PgPool, event_id: Uuid) -> Result<Vec<SanctionResponse>> {
    let sanctions = SanctionRepository::new(pool).list_for_event(event_id).await?;
    Ok(sanctions.into_iter().map(SanctionResponse::from).collect())
}
