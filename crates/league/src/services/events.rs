use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use storage::dto::event::{CreateEventRequest, EventResponse};
use storage::dto::results::SquadronResultEntry;
use storage::models::{EventState, SquadronResult};
use storage::repository::{EventRepository, ParticipationRepository};
use uuid::Uuid;
use validator::Validate;

use crate::auth::Caller;
use crate::collaborators::{
    IdentityResolver, NotificationDispatcher, NotificationKind, RaceResultProvider,
};
use crate::error::{LeagueError, Result};
use crate::scoring;

/// Create a new event in draft
pub async fn create_event(
    pool: &PgPool,
    caller: &Caller,
    req: &CreateEventRequest,
) -> Result<EventResponse> {
    caller.require_organizer()?;
    req.validate()?;
    req.validate_dates()
        .map_err(|msg| LeagueError::Validation(msg.to_string()))?;

    let event = EventRepository::new(pool)
        .create(req, caller.account_id)
        .await?;

    tracing::info!(event_id = %event.event_id, name = %event.name, "event created");
    Ok(event.into())
}

pub async fn get_event(pool: &PgPool, event_id: Uuid) -> Result<EventResponse> {
    let event = EventRepository::new(pool).find_by_id(event_id).await?;
    Ok(event.into())
}

pub async fn list_events(pool: &PgPool) -> Result<Vec<EventResponse>> {
    let events = EventRepository::new(pool).list().await?;
    Ok(events.into_iter().map(EventResponse::from).collect())
}

pub async fn publish_event(pool: &PgPool, caller: &Caller, event_id: Uuid) -> Result<EventResponse> {
    advance(pool, caller, event_id, EventState::Draft, EventState::Published).await
}

pub async fn open_registration(
    pool: &PgPool,
    caller: &Caller,
    event_id: Uuid,
) -> Result<EventResponse> {
    advance(
        pool,
        caller,
        event_id,
        EventState::Published,
        EventState::RegistrationOpen,
    )
    .await
}

pub async fn close_registration(
    pool: &PgPool,
    caller: &Caller,
    event_id: Uuid,
) -> Result<EventResponse> {
    advance(
        pool,
        caller,
        event_id,
        EventState::RegistrationOpen,
        EventState::RegistrationClosed,
    )
    .await
}

pub async fn start_event(pool: &PgPool, caller: &Caller, event_id: Uuid) -> Result<EventResponse> {
    advance(
        pool,
        caller,
        event_id,
        EventState::RegistrationClosed,
        EventState::InProgress,
    )
    .await
}

pub async fn complete_event(
    pool: &PgPool,
    caller: &Caller,
    event_id: Uuid,
) -> Result<EventResponse> {
    advance(
        pool,
        caller,
        event_id,
        EventState::InProgress,
        EventState::Completed,
    )
    .await
}

/// Cancel an event from any non-terminal state
pub async fn cancel_event(pool: &PgPool, caller: &Caller, event_id: Uuid) -> Result<EventResponse> {
    caller.require_organizer()?;

    let event = EventRepository::new(pool).cancel(event_id).await?;
    tracing::info!(event_id = %event.event_id, "event cancelled");
    Ok(event.into())
}

/// Begin reviewing the race result of a completed event
pub async fn mark_in_review(
    pool: &PgPool,
    caller: &Caller,
    event_id: Uuid,
) -> Result<EventResponse> {
    caller.require_organizer()?;

    let event = EventRepository::new(pool).mark_in_review(event_id).await?;
    tracing::info!(event_id = %event.event_id, "race result under review");
    Ok(event.into())
}

/// Run the scoring engine over the event's race session. Pure with respect
/// to storage: nothing is written, so a reviewer can re-run it freely while
/// iterating on sanctions.
pub async fn calculate_results(
    pool: &PgPool,
    caller: &Caller,
    event_id: Uuid,
    provider: &impl RaceResultProvider,
    resolver: &impl IdentityResolver,
) -> Result<Vec<SquadronResultEntry>> {
    caller.require_organizer()?;

    let repo = EventRepository::new(pool);
    let event = repo.find_by_id(event_id).await?;

    if event.state != EventState::Completed {
        return Err(LeagueError::State(event.state.as_str().to_string()));
    }
    let Some(session) = event.race_session_id.as_deref() else {
        return Err(LeagueError::Validation(
            "Event has no race session attached".to_string(),
        ));
    };

    let participations = ParticipationRepository::new(pool);
    let roster = participations.confirmed_roster(event_id).await?;
    let order = participations.registration_order(event_id).await?;

    let raw = provider.get_result(session).await?;
    let entries = scoring::assemble_entries(&roster, &raw, resolver).await?;

    Ok(scoring::score_race(event.base_points, &entries, &order))
}

/// Commit a calculated result set: the one-time conversion of a race result
/// into squadron points. Notifications for the event's sanctions go out only
/// after the commit and never fail it.
pub async fn finalize_results(
    pool: &PgPool,
    caller: &Caller,
    event_id: Uuid,
    results: &[SquadronResultEntry],
    notifier: &impl NotificationDispatcher,
) -> Result<Vec<SquadronResult>> {
    caller.require_organizer()?;

    let finalized = EventRepository::new(pool)
        .finalize(event_id, caller.account_id, results, Utc::now())
        .await?;

    tracing::info!(
        event_id = %event_id,
        squadrons = finalized.results.len(),
        sanctions = finalized.sanctions.len(),
        "event results finalized"
    );

    for sanction in &finalized.sanctions {
        let payload = json!({
            "event_id": sanction.event_id,
            "sanction_type": sanction.sanction_type,
            "description": sanction.description,
            "position_penalty": sanction.position_penalty,
            "points_penalty": sanction.points_penalty,
        });

        if let Err(e) = notifier
            .notify(sanction.pilot_id, NotificationKind::SanctionApplied, payload)
            .await
        {
            tracing::warn!(
                pilot_id = %sanction.pilot_id,
                sanction_id = %sanction.sanction_id,
                error = %e,
                "failed to notify sanctioned pilot"
            );
        }
    }

    Ok(finalized.results)
}

/// Stored results of a finalized event
pub async fn event_results(pool: &PgPool, event_id: Uuid) -> Result<Vec<SquadronResult>> {
    let results = EventRepository::new(pool).results(event_id).await?;
    Ok(results)
}

async fn advance(
    pool: &PgPool,
    caller: &Caller,
    event_id: Uuid,
    from: EventState,
    to: EventState,
) -> Result<EventResponse> {
    caller.require_organizer()?;

    let event = EventRepository::new(pool)
        .advance_state(event_id, from, to)
        .await?;

    tracing::info!(event_id = %event.event_id, state = event.state.as_str(), "event state advanced");
    Ok(event.into())
}
