use chrono::{DateTime, Duration, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{
    ConfirmedPilot, EventState, Invitation, InvitationStatus, Participation, ParticipationStatus,
    RosterSlot, RosterSnapshot,
};
use crate::repository::event::lock_event;

const PARTICIPATION_COLUMNS: &str =
    "participation_id, event_id, squadron_id, registered_by, status, registered_at";

const INVITATION_COLUMNS: &str = "invitation_id, participation_id, pilot_id, kart_number, \
     status, invited_at, expires_at, responded_at";

/// Repository for event rosters: squadron participations, kart-slot
/// invitations and pilot confirmations.
///
/// Every mutation runs in a transaction that first locks the event row, so
/// concurrent roster changes for one event serialize and the checks below
/// cannot be invalidated between validation and commit.
pub struct ParticipationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ParticipationRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Register a squadron into an event while registration is open
    pub async fn register(
        &self,
        event_id: Uuid,
        squadron_id: Uuid,
        registered_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Participation> {
        let mut tx = self.pool.begin().await?;

        let event = lock_event(&mut tx, event_id).await?;
        if event.state != EventState::RegistrationOpen {
            return Err(StorageError::InvalidState(event.state.as_str().to_string()));
        }
        if now >= event.registration_deadline {
            return Err(StorageError::InvalidState(
                "registration deadline passed".to_string(),
            ));
        }

        let registered = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM participations
            WHERE event_id = $1 AND status <> 'cancelled'
            "#,
        )
        .bind(event_id)
        .fetch_one(&mut *tx)
        .await?;

        if registered >= event.max_squadrons as i64 {
            return Err(StorageError::ConstraintViolation(
                "Event squadron capacity reached".to_string(),
            ));
        }

        let participation = sqlx::query_as::<_, Participation>(&format!(
            r#"
            INSERT INTO participations (event_id, squadron_id, registered_by, registered_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {PARTICIPATION_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(squadron_id)
        .bind(registered_by)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.code().as_deref() == Some("23505") {
                    return StorageError::ConstraintViolation(
                        "Squadron already registered for this event".to_string(),
                    );
                }
            }
            StorageError::from(e)
        })?;

        tx.commit().await?;
        Ok(participation)
    }

    /// Cancel a squadron's participation and void its open invitations
    pub async fn withdraw(
        &self,
        event_id: Uuid,
        squadron_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Participation> {
        let mut tx = self.pool.begin().await?;

        let event = lock_event(&mut tx, event_id).await?;
        if event.state != EventState::RegistrationOpen {
            return Err(StorageError::InvalidState(event.state.as_str().to_string()));
        }

        let participation = sqlx::query_as::<_, Participation>(&format!(
            r#"
            UPDATE participations
            SET status = 'cancelled'
            WHERE event_id = $1 AND squadron_id = $2 AND status <> 'cancelled'
            RETURNING {PARTICIPATION_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(squadron_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StorageError::NotFound)?;

        sqlx::query(
            r#"
            UPDATE invitations
            SET status = 'expired', responded_at = $2
            WHERE participation_id = $1 AND status = 'pending'
            "#,
        )
        .bind(participation.participation_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(participation)
    }

    pub async fn find_invitation(&self, invitation_id: Uuid) -> Result<Invitation> {
        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            "SELECT {INVITATION_COLUMNS} FROM invitations WHERE invitation_id = $1"
        ))
        .bind(invitation_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(invitation)
    }

    pub async fn find(&self, event_id: Uuid, squadron_id: Uuid) -> Result<Participation> {
        let participation = sqlx::query_as::<_, Participation>(&format!(
            r#"
            SELECT {PARTICIPATION_COLUMNS} FROM participations
            WHERE event_id = $1 AND squadron_id = $2
            "#
        ))
        .bind(event_id)
        .bind(squadron_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(participation)
    }

    /// Invite a pilot onto a kart slot. The occupancy checks and the insert
    /// run under the event row lock, so of two concurrent invites for the
    /// same kart exactly one commits.
    pub async fn invite(
        &self,
        event_id: Uuid,
        squadron_id: Uuid,
        pilot_id: Uuid,
        kart_number: i16,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<Invitation> {
        let mut tx = self.pool.begin().await?;

        let event = lock_event(&mut tx, event_id).await?;
        if !event.state.allows_roster_changes() {
            return Err(StorageError::InvalidState(event.state.as_str().to_string()));
        }

        let participation = participation_in_tx(&mut tx, event_id, squadron_id).await?;
        if participation.status == ParticipationStatus::Cancelled {
            return Err(StorageError::InvalidState("cancelled".to_string()));
        }

        let snapshot = roster_snapshot(&mut tx, event_id, None).await?;

        if snapshot.squadron_occupancy(squadron_id, now) >= event.max_pilots_per_squadron as usize
        {
            return Err(StorageError::ConstraintViolation(
                "Squadron roster is full".to_string(),
            ));
        }
        if snapshot.kart_taken(kart_number, now) {
            return Err(StorageError::ConstraintViolation(format!(
                "Kart {kart_number} is already assigned"
            )));
        }
        if snapshot.pilot_confirmed(pilot_id) {
            return Err(StorageError::ConstraintViolation(
                "Pilot already confirmed for this event".to_string(),
            ));
        }
        if snapshot.pilot_has_open_invitation(pilot_id, now) {
            return Err(StorageError::ConstraintViolation(
                "Pilot already has an open invitation for this event".to_string(),
            ));
        }

        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            INSERT INTO invitations (participation_id, pilot_id, kart_number, invited_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {INVITATION_COLUMNS}
            "#
        ))
        .bind(participation.participation_id)
        .bind(pilot_id)
        .bind(kart_number)
        .bind(now)
        .bind(now + window)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(invitation)
    }

    /// Accept or decline an invitation. An invitation past its deadline is
    /// transitioned to expired on touch and rejected. Acceptance re-validates
    /// kart availability at commit time and flips the invitation status with
    /// a compare-and-swap, so a raced accept cannot double-assign the slot.
    pub async fn respond(
        &self,
        invitation_id: Uuid,
        accept: bool,
        now: DateTime<Utc>,
    ) -> Result<Invitation> {
        let mut tx = self.pool.begin().await?;

        let (invitation, event_id) = invitation_with_event(&mut tx, invitation_id).await?;

        let event = lock_event(&mut tx, event_id).await?;

        if invitation.status != InvitationStatus::Pending {
            return Err(StorageError::InvalidState(
                "invitation already resolved".to_string(),
            ));
        }

        if invitation.is_expired(now) {
            mark_invitation(&mut tx, invitation_id, InvitationStatus::Expired, now)
                .await?
                .ok_or(StorageError::StaleUpdate)?;
            tx.commit().await?;

            return Err(StorageError::InvalidState("expired".to_string()));
        }

        if !event.state.allows_roster_changes() {
            return Err(StorageError::InvalidState(event.state.as_str().to_string()));
        }

        if !accept {
            let declined = mark_invitation(&mut tx, invitation_id, InvitationStatus::Declined, now)
                .await?
                .ok_or(StorageError::StaleUpdate)?;
            tx.commit().await?;
            return Ok(declined);
        }

        // Commit-time revalidation, with this invitation's own slot excluded.
        let snapshot = roster_snapshot(&mut tx, event_id, Some(invitation_id)).await?;

        if snapshot.kart_taken(invitation.kart_number, now) {
            return Err(StorageError::ConstraintViolation(format!(
                "Kart {} is already assigned",
                invitation.kart_number
            )));
        }
        if snapshot.pilot_confirmed(invitation.pilot_id) {
            return Err(StorageError::ConstraintViolation(
                "Pilot already confirmed for this event".to_string(),
            ));
        }
        let squadron_id = squadron_of_participation(&mut tx, invitation.participation_id).await?;
        if snapshot.squadron_occupancy(squadron_id, now) >= event.max_pilots_per_squadron as usize {
            return Err(StorageError::ConstraintViolation(
                "Squadron roster is full".to_string(),
            ));
        }

        let accepted = mark_invitation(&mut tx, invitation_id, InvitationStatus::Accepted, now)
            .await?
            .ok_or(StorageError::StaleUpdate)?;

        sqlx::query(
            r#"
            INSERT INTO confirmed_pilots (participation_id, pilot_id, kart_number, confirmed_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(accepted.participation_id)
        .bind(accepted.pilot_id)
        .bind(accepted.kart_number)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let confirmed_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM confirmed_pilots WHERE participation_id = $1",
        )
        .bind(accepted.participation_id)
        .fetch_one(&mut *tx)
        .await?;

        if confirmed_count >= event.min_pilots_per_squadron as i64 {
            sqlx::query(
                "UPDATE participations SET status = 'confirmed' WHERE participation_id = $1 AND status = 'pending'",
            )
            .bind(accepted.participation_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(accepted)
    }

    /// Confirmed pilots of an event with their squadron, for result assembly
    pub async fn confirmed_roster(&self, event_id: Uuid) -> Result<Vec<RosterSlot>> {
        let slots = sqlx::query_as::<_, RosterSlot>(
            r#"
            SELECT p.squadron_id, cp.pilot_id, cp.kart_number,
                   NULL::timestamptz AS pending_expires_at
            FROM confirmed_pilots cp
            JOIN participations p ON p.participation_id = cp.participation_id
            WHERE p.event_id = $1 AND p.status <> 'cancelled'
            "#,
        )
        .bind(event_id)
        .fetch_all(self.pool)
        .await?;

        Ok(slots)
    }

    /// Squadron ids in registration order, the final scoring tie-break
    pub async fn registration_order(&self, event_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT squadron_id FROM participations
            WHERE event_id = $1 AND status <> 'cancelled'
            ORDER BY registered_at ASC, participation_id ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }

    pub async fn confirmed_pilots(&self, participation_id: Uuid) -> Result<Vec<ConfirmedPilot>> {
        let pilots = sqlx::query_as::<_, ConfirmedPilot>(
            r#"
            SELECT confirmed_pilot_id, participation_id, pilot_id, kart_number, confirmed_at
            FROM confirmed_pilots
            WHERE participation_id = $1
            ORDER BY confirmed_at ASC
            "#,
        )
        .bind(participation_id)
        .fetch_all(self.pool)
        .await?;

        Ok(pilots)
    }
}

async fn squadron_of_participation(conn: &mut PgConnection, participation_id: Uuid) -> Result<Uuid> {
    let squadron_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT squadron_id FROM participations WHERE participation_id = $1",
    )
    .bind(participation_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(squadron_id)
}

async fn participation_in_tx(
    conn: &mut PgConnection,
    event_id: Uuid,
    squadron_id: Uuid,
) -> Result<Participation> {
    let participation = sqlx::query_as::<_, Participation>(&format!(
        "SELECT {PARTICIPATION_COLUMNS} FROM participations WHERE event_id = $1 AND squadron_id = $2"
    ))
    .bind(event_id)
    .bind(squadron_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StorageError::NotFound)?;

    Ok(participation)
}

async fn invitation_with_event(
    conn: &mut PgConnection,
    invitation_id: Uuid,
) -> Result<(Invitation, Uuid)> {
    let row = sqlx::query_as::<_, Invitation>(&format!(
        "SELECT {INVITATION_COLUMNS} FROM invitations WHERE invitation_id = $1"
    ))
    .bind(invitation_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StorageError::NotFound)?;

    let event_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT event_id FROM participations WHERE participation_id = $1",
    )
    .bind(row.participation_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok((row, event_id))
}

async fn mark_invitation(
    conn: &mut PgConnection,
    invitation_id: Uuid,
    status: InvitationStatus,
    now: DateTime<Utc>,
) -> Result<Option<Invitation>> {
    let invitation = sqlx::query_as::<_, Invitation>(&format!(
        r#"
        UPDATE invitations
        SET status = $2, responded_at = $3
        WHERE invitation_id = $1 AND status = 'pending'
        RETURNING {INVITATION_COLUMNS}
        "#
    ))
    .bind(invitation_id)
    .bind(status)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(invitation)
}

/// Event-wide occupancy: confirmed pilots plus pending invitations. Expiry
/// of pending slots is applied by the caller against its own clock, never
/// from the stored status alone.
async fn roster_snapshot(
    conn: &mut PgConnection,
    event_id: Uuid,
    exclude_invitation: Option<Uuid>,
) -> Result<RosterSnapshot> {
    let slots = sqlx::query_as::<_, RosterSlot>(
        r#"
        SELECT p.squadron_id, cp.pilot_id, cp.kart_number,
               NULL::timestamptz AS pending_expires_at
        FROM confirmed_pilots cp
        JOIN participations p ON p.participation_id = cp.participation_id
        WHERE p.event_id = $1 AND p.status <> 'cancelled'
        UNION ALL
        SELECT p.squadron_id, i.pilot_id, i.kart_number, i.expires_at
        FROM invitations i
        JOIN participations p ON p.participation_id = i.participation_id
        WHERE p.event_id = $1 AND p.status <> 'cancelled'
          AND i.status = 'pending'
          AND ($2::uuid IS NULL OR i.invitation_id <> $2)
        "#,
    )
    .bind(event_id)
    .bind(exclude_invitation)
    .fetch_all(&mut *conn)
    .await?;

    Ok(RosterSnapshot::new(slots))
}
