use chrono::Utc;
use sqlx::PgPool;
use storage::dto::roster::{InvitePilotRequest, InvitationResponse, ParticipationResponse};
use storage::models::ConfirmedPilot;
use storage::repository::ParticipationRepository;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Caller;
use crate::config::LeagueConfig;
use crate::error::{LeagueError, Result};

/// Register a squadron into an event while registration is open
pub async fn register_squadron(
    pool: &PgPool,
    caller: &Caller,
    event_id: Uuid,
    squadron_id: Uuid,
) -> Result<ParticipationResponse> {
    caller.require_captain(squadron_id)?;

    let participation = ParticipationRepository::new(pool)
        .register(event_id, squadron_id, caller.account_id, Utc::now())
        .await?;

    tracing::info!(event_id = %event_id, squadron_id = %squadron_id, "squadron registered");
    Ok(participation.into())
}

/// Withdraw a squadron before registration closes, voiding its open
/// invitations
pub async fn withdraw_squadron(
    pool: &PgPool,
    caller: &Caller,
    event_id: Uuid,
    squadron_id: Uuid,
) -> Result<ParticipationResponse> {
    caller.require_captain(squadron_id)?;

    let participation = ParticipationRepository::new(pool)
        .withdraw(event_id, squadron_id, Utc::now())
        .await?;

    tracing::info!(event_id = %event_id, squadron_id = %squadron_id, "squadron withdrawn");
    Ok(participation.into())
}

/// Invite a teammate onto a kart slot
pub async fn invite_pilot(
    pool: &PgPool,
    caller: &Caller,
    config: &LeagueConfig,
    event_id: Uuid,
    squadron_id: Uuid,
    req: &InvitePilotRequest,
) -> Result<InvitationResponse> {
    caller.require_member(squadron_id)?;
    req.validate()?;

    let invitation = ParticipationRepository::new(pool)
        .invite(
            event_id,
            squadron_id,
            req.pilot_id,
            req.kart_number,
            config.invitation_window(),
            Utc::now(),
        )
        .await?;

    tracing::info!(
        event_id = %event_id,
        pilot_id = %req.pilot_id,
        kart = req.kart_number,
        "pilot invited"
    );
    Ok(invitation.into())
}

/// A squadron's participation record with its confirmed pilots
pub async fn squadron_roster(
    pool: &PgPool,
    event_id: Uuid,
    squadron_id: Uuid,
) -> Result<(ParticipationResponse, Vec<ConfirmedPilot>)> {
    let repo = ParticipationRepository::new(pool);
    let participation = repo.find(event_id, squadron_id).await?;
    let pilots = repo.confirmed_pilots(participation.participation_id).await?;
    Ok((participation.into(), pilots))
}

/// Accept or decline an invitation. Only the invited pilot may respond.
pub async fn respond_to_invitation(
    pool: &PgPool,
    caller: &Caller,
    invitation_id: Uuid,
    accept: bool,
) -> Result<InvitationResponse> {
    let repo = ParticipationRepository::new(pool);

    let invitation = repo.find_invitation(invitation_id).await?;
    if invitation.pilot_id != caller.account_id {
        return Err(LeagueError::Authorization(
            "only the invited pilot may respond".to_string(),
        ));
    }

    let invitation = repo.respond(invitation_id, accept, Utc::now()).await?;

    tracing::info!(
        invitation_id = %invitation_id,
        accepted = accept,
        "invitation resolved"
    );
    Ok(invitation.into())
}
