use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "participation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ParticipationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// One squadron's participation record for one event.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Participation {
    pub participation_id: Uuid,
    pub event_id: Uuid,
    pub squadron_id: Uuid,
    pub registered_by: Uuid,
    pub status: ParticipationStatus,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ConfirmedPilot {
    pub confirmed_pilot_id: Uuid,
    pub participation_id: Uuid,
    pub pilot_id: Uuid,
    pub kart_number: i16,
    pub confirmed_at: DateTime<Utc>,
}

/// One occupied kart slot in an event-wide roster snapshot. A slot is either
/// a confirmed pilot (`pending_expires_at = None`) or a pending invitation
/// that is only counted while unexpired.
#[derive(Debug, Clone, FromRow)]
pub struct RosterSlot {
    pub squadron_id: Uuid,
    pub pilot_id: Uuid,
    pub kart_number: i16,
    pub pending_expires_at: Option<DateTime<Utc>>,
}

impl RosterSlot {
    fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.pending_expires_at {
            None => true,
            Some(expires_at) => now < expires_at,
        }
    }

    fn is_confirmed(&self) -> bool {
        self.pending_expires_at.is_none()
    }
}

/// Event-wide occupancy view backing the roster preconditions. Loaded inside
/// the same transaction that performs the mutation, under the event row lock,
/// so the answers cannot go stale before the commit.
#[derive(Debug, Clone, Default)]
pub struct RosterSnapshot {
    pub slots: Vec<RosterSlot>,
}

impl RosterSnapshot {
    pub fn new(slots: Vec<RosterSlot>) -> Self {
        Self { slots }
    }

    /// Kart held by any confirmed or pending-unexpired slot, in any squadron.
    pub fn kart_taken(&self, kart_number: i16, now: DateTime<Utc>) -> bool {
        self.slots
            .iter()
            .any(|s| s.kart_number == kart_number && s.is_active(now))
    }

    /// Confirmed plus pending-unexpired occupants of one squadron.
    pub fn squadron_occupancy(&self, squadron_id: Uuid, now: DateTime<Utc>) -> usize {
        self.slots
            .iter()
            .filter(|s| s.squadron_id == squadron_id && s.is_active(now))
            .count()
    }

    pub fn pilot_confirmed(&self, pilot_id: Uuid) -> bool {
        self.slots
            .iter()
            .any(|s| s.pilot_id == pilot_id && s.is_confirmed())
    }

    pub fn pilot_has_open_invitation(&self, pilot_id: Uuid, now: DateTime<Utc>) -> bool {
        self.slots
            .iter()
            .any(|s| s.pilot_id == pilot_id && !s.is_confirmed() && s.is_active(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn confirmed(squadron_id: Uuid, pilot_id: Uuid, kart: i16) -> RosterSlot {
        RosterSlot {
            squadron_id,
            pilot_id,
            kart_number: kart,
            pending_expires_at: None,
        }
    }

    fn pending(squadron_id: Uuid, pilot_id: Uuid, kart: i16, expires: DateTime<Utc>) -> RosterSlot {
        RosterSlot {
            squadron_id,
            pilot_id,
            kart_number: kart,
            pending_expires_at: Some(expires),
        }
    }

    #[test]
    fn confirmed_slot_holds_its_kart() {
        let squadron = Uuid::new_v4();
        let snapshot = RosterSnapshot::new(vec![confirmed(squadron, Uuid::new_v4(), 4)]);

        assert!(snapshot.kart_taken(4, now()));
        assert!(!snapshot.kart_taken(5, now()));
    }

    #[test]
    fn pending_slot_holds_kart_across_squadrons_until_expiry() {
        let expires = now() + chrono::Duration::hours(2);
        let snapshot = RosterSnapshot::new(vec![pending(Uuid::new_v4(), Uuid::new_v4(), 9, expires)]);

        // The cross-squadron check: the kart is taken event-wide.
        assert!(snapshot.kart_taken(9, now()));
        // Past expiry the slot is released without any explicit transition.
        assert!(!snapshot.kart_taken(9, expires));
    }

    #[test]
    fn no_two_active_slots_may_share_a_kart() {
        let expires = now() + chrono::Duration::hours(2);
        let snapshot = RosterSnapshot::new(vec![
            confirmed(Uuid::new_v4(), Uuid::new_v4(), 1),
            pending(Uuid::new_v4(), Uuid::new_v4(), 2, expires),
        ]);

        for kart in [1i16, 2] {
            assert!(snapshot.kart_taken(kart, now()));
        }
        let active: Vec<i16> = snapshot
            .slots
            .iter()
            .filter(|s| s.is_active(now()))
            .map(|s| s.kart_number)
            .collect();
        let mut deduped = active.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(active.len(), deduped.len());
    }

    #[test]
    fn occupancy_counts_confirmed_and_unexpired_pending() {
        let squadron = Uuid::new_v4();
        let other = Uuid::new_v4();
        let live = now() + chrono::Duration::hours(1);
        let dead = now() - chrono::Duration::minutes(1);

        let snapshot = RosterSnapshot::new(vec![
            confirmed(squadron, Uuid::new_v4(), 1),
            pending(squadron, Uuid::new_v4(), 2, live),
            pending(squadron, Uuid::new_v4(), 3, dead),
            confirmed(other, Uuid::new_v4(), 4),
        ]);

        assert_eq!(snapshot.squadron_occupancy(squadron, now()), 2);
        assert_eq!(snapshot.squadron_occupancy(other, now()), 1);
    }

    #[test]
    fn pilot_checks_distinguish_confirmed_from_invited() {
        let squadron = Uuid::new_v4();
        let racer = Uuid::new_v4();
        let invitee = Uuid::new_v4();
        let live = now() + chrono::Duration::hours(1);

        let snapshot = RosterSnapshot::new(vec![
            confirmed(squadron, racer, 1),
            pending(squadron, invitee, 2, live),
        ]);

        assert!(snapshot.pilot_confirmed(racer));
        assert!(!snapshot.pilot_confirmed(invitee));
        assert!(snapshot.pilot_has_open_invitation(invitee, now()));
        assert!(!snapshot.pilot_has_open_invitation(racer, now()));
        // Expired invitations no longer block a fresh invite.
        assert!(!snapshot.pilot_has_open_invitation(invitee, live));
    }
}
