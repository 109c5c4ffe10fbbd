use sqlx::PgPool;
use storage::dto::squadron::{CreateSquadronRequest, SquadronResponse, StandingsEntry};
use storage::models::PointsHistoryEntry;
use storage::repository::{PointsLedgerRepository, SquadronRepository};
use uuid::Uuid;
use validator::Validate;

use crate::auth::Caller;
use crate::error::Result;

/// Create a new squadron
pub async fn create_squadron(
    pool: &PgPool,
    caller: &Caller,
    req: &CreateSquadronRequest,
) -> Result<SquadronResponse> {
    caller.require_organizer()?;
    req.validate()?;

    let squadron = SquadronRepository::new(pool).create(req).await?;

    tracing::info!(squadron_id = %squadron.squadron_id, name = %squadron.name, "squadron created");
    Ok(squadron.into())
}

pub async fn get_squadron(pool: &PgPool, squadron_id: Uuid) -> Result<SquadronResponse> {
    let squadron = SquadronRepository::new(pool).find_by_id(squadron_id).await?;
    Ok(squadron.into())
}

/// League standings, best total first
pub async fn standings(pool: &PgPool) -> Result<Vec<StandingsEntry>> {
    let standings = SquadronRepository::new(pool).list_standings().await?;
    Ok(standings)
}

/// The append-only audit trail of a squadron's total
pub async fn points_history(pool: &PgPool, squadron_id: Uuid) -> Result<Vec<PointsHistoryEntry>> {
    let history = PointsLedgerRepository::new(pool)
        .history_for_squadron(squadron_id)
        .await?;
    Ok(history)
}
