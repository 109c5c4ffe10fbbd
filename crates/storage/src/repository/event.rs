use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::dto::event::CreateEventRequest;
use crate::dto::results::SquadronResultEntry;
use crate::error::{Result, StorageError};
use crate::models::{
    Event, EventState, PointsChangeType, RaceProcessingState, Sanction, SquadronResult,
};
use crate::repository::{fair_racing, points, sanction};

pub(crate) const EVENT_COLUMNS: &str = "event_id, name, category, base_points, event_date, \
     registration_deadline, location, max_squadrons, min_pilots_per_squadron, \
     max_pilots_per_squadron, state, race_processing_state, race_session_id, \
     created_by, created_at, finalized_at, finalized_by";

/// Everything committed by one finalize call. Sanctions are returned so the
/// caller can dispatch the deferred notifications after the commit.
#[derive(Debug)]
pub struct FinalizedEvent {
    pub event: Event,
    pub results: Vec<SquadronResult>,
    pub sanctions: Vec<Sanction>,
}

/// Repository for Event database operations
pub struct EventRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EventRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event in draft
    pub async fn create(&self, req: &CreateEventRequest, created_by: Uuid) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (
                name, category, base_points, event_date, registration_deadline,
                location, max_squadrons, min_pilots_per_squadron,
                max_pilots_per_squadron, race_session_id, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(&req.name)
        .bind(req.category)
        .bind(req.category.base_points())
        .bind(req.event_date)
        .bind(req.registration_deadline)
        .bind(&req.location)
        .bind(req.max_squadrons)
        .bind(req.min_pilots_per_squadron)
        .bind(req.max_pilots_per_squadron)
        .bind(&req.race_session_id)
        .bind(created_by)
        .fetch_one(self.pool)
        .await?;

        Ok(event)
    }

    /// Get an event by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE event_id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(event)
    }

    /// List all events, most recent race date first
    pub async fn list(&self) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY event_date DESC, created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(events)
    }

    /// Move the publication lifecycle from its unique predecessor state.
    /// The transition is a compare-and-swap: of two concurrent calls only one
    /// observes the predecessor and wins.
    pub async fn advance_state(&self, id: Uuid, from: EventState, to: EventState) -> Result<Event> {
        debug_assert!(from.can_advance_to(to));

        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET state = $3
            WHERE event_id = $1 AND state = $2
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(self.pool)
        .await?;

        match event {
            Some(event) => Ok(event),
            None => Err(self.publication_state_error(id).await?),
        }
    }

    /// Cancel an event from any non-terminal state
    pub async fn cancel(&self, id: Uuid) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET state = 'cancelled'
            WHERE event_id = $1 AND state NOT IN ('completed', 'cancelled')
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match event {
            Some(event) => Ok(event),
            None => Err(self.publication_state_error(id).await?),
        }
    }

    /// Begin reviewing the race result of a completed event
    pub async fn mark_in_review(&self, id: Uuid) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET race_processing_state = 'in_review'
            WHERE event_id = $1 AND state = 'completed' AND race_processing_state = 'pending'
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match event {
            Some(event) => Ok(event),
            None => Err(self.review_state_error(id).await?),
        }
    }

    /// Commit a calculated result set. One transaction covers the processing
    /// state flip, every squadron total, every audit row, the stored results
    /// and the fair-racing effects of the event's sanctions; a failure
    /// anywhere rolls the whole set back. The state flip is a
    /// compare-and-swap from in_review, so a second finalize (concurrent or
    /// later) commits nothing and reports the conflict.
    pub async fn finalize(
        &self,
        id: Uuid,
        finalized_by: Uuid,
        results: &[SquadronResultEntry],
        now: DateTime<Utc>,
    ) -> Result<FinalizedEvent> {
        let mut tx = self.pool.begin().await?;

        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET race_processing_state = 'finalized', finalized_at = $2, finalized_by = $3
            WHERE event_id = $1 AND race_processing_state = 'in_review'
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(now)
        .bind(finalized_by)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(event) = event else {
            return Err(self.finalize_state_error(id).await?);
        };

        let mut stored_results = Vec::with_capacity(results.len());
        for entry in results {
            let reason = format!(
                "Event '{}' finish position {} ({}% of {} base points)",
                event.name, entry.position, entry.percentage_awarded, event.base_points
            );

            points::apply_awarded_points(
                &mut tx,
                entry.squadron_id,
                Some(id),
                entry.points_awarded,
                &reason,
                PointsChangeType::RaceResult,
                finalized_by,
            )
            .await?;

            let result = sqlx::query_as::<_, SquadronResult>(
                r#"
                INSERT INTO squadron_results (
                    event_id, squadron_id, position, total_points,
                    points_awarded, percentage_awarded
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING result_id, event_id, squadron_id, position, total_points,
                          points_awarded, percentage_awarded, created_at
                "#,
            )
            .bind(id)
            .bind(entry.squadron_id)
            .bind(entry.position)
            .bind(entry.total_points)
            .bind(entry.points_awarded)
            .bind(entry.percentage_awarded)
            .fetch_one(&mut *tx)
            .await?;

            for pilot in &entry.pilots {
                sqlx::query(
                    r#"
                    INSERT INTO result_pilots (
                        result_id, pilot_id, final_position, individual_points, kart_number
                    )
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(result.result_id)
                .bind(pilot.pilot_id)
                .bind(pilot.final_position)
                .bind(pilot.individual_points)
                .bind(pilot.kart_number)
                .execute(&mut *tx)
                .await?;
            }

            stored_results.push(result);
        }

        let sanctions = sanction::list_for_event_in_tx(&mut tx, id).await?;

        for sanction in &sanctions {
            fair_racing::record_sanction_incident(&mut tx, sanction, finalized_by, now).await?;
        }

        // Every raced pilot without a sanction in this event earns the
        // clean-race recovery point.
        let sanctioned: Vec<Uuid> = sanctions.iter().map(|s| s.pilot_id).collect();
        for entry in results {
            for pilot in &entry.pilots {
                if !sanctioned.contains(&pilot.pilot_id) {
                    fair_racing::record_clean_race(&mut tx, pilot.pilot_id, event.event_date)
                        .await?;
                }
            }
        }

        tx.commit().await?;

        Ok(FinalizedEvent {
            event,
            results: stored_results,
            sanctions,
        })
    }

    /// Stored results of a finalized event, best position first
    pub async fn results(&self, event_id: Uuid) -> Result<Vec<SquadronResult>> {
        let results = sqlx::query_as::<_, SquadronResult>(
            r#"
            SELECT result_id, event_id, squadron_id, position, total_points,
                   points_awarded, percentage_awarded, created_at
            FROM squadron_results
            WHERE event_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(self.pool)
        .await?;

        Ok(results)
    }

    async fn publication_state_error(&self, id: Uuid) -> Result<StorageError> {
        let state = sqlx::query_scalar::<_, EventState>(
            "SELECT state FROM events WHERE event_id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(match state {
            None => StorageError::NotFound,
            Some(state) => StorageError::InvalidState(state.as_str().to_string()),
        })
    }

    async fn review_state_error(&self, id: Uuid) -> Result<StorageError> {
        let row = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE event_id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(match row {
            None => StorageError::NotFound,
            Some(event) if event.state != EventState::Completed => {
                StorageError::InvalidState(event.state.as_str().to_string())
            }
            Some(event) => {
                StorageError::InvalidState(event.race_processing_state.as_str().to_string())
            }
        })
    }

    async fn finalize_state_error(&self, id: Uuid) -> Result<StorageError> {
        let state = sqlx::query_scalar::<_, RaceProcessingState>(
            "SELECT race_processing_state FROM events WHERE event_id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(match state {
            None => StorageError::NotFound,
            // Already finalized: the caller raced a finalize that won.
            Some(RaceProcessingState::Finalized) => StorageError::StaleUpdate,
            Some(state) => StorageError::InvalidState(state.as_str().to_string()),
        })
    }
}

/// Lock an event row for the remainder of the surrounding transaction.
/// Roster mutations serialize on this lock.
pub(crate) async fn lock_event(conn: &mut PgConnection, event_id: Uuid) -> Result<Event> {
    let event = sqlx::query_as::<_, Event>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE event_id = $1 FOR UPDATE"
    ))
    .bind(event_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StorageError::NotFound)?;

    Ok(event)
}
