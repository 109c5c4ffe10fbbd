use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "invitation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
    Declined,
}

/// A kart-slot invitation. Expiry is evaluated lazily: the stored status is
/// never trusted on its own, every consumer re-checks `expires_at` against
/// the current time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Invitation {
    pub invitation_id: Uuid,
    pub participation_id: Uuid,
    pub pilot_id: Uuid,
    pub kart_number: i16,
    pub status: InvitationStatus,
    pub invited_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl Invitation {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Still pending and inside its validity window.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && !self.is_expired(now)
    }

    /// Status as observed at `now`, folding lazy expiry in.
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvitationStatus {
        if self.status == InvitationStatus::Pending && self.is_expired(now) {
            InvitationStatus::Expired
        } else {
            self.status
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn invitation(status: InvitationStatus, expires_at: DateTime<Utc>) -> Invitation {
        Invitation {
            invitation_id: Uuid::new_v4(),
            participation_id: Uuid::new_v4(),
            pilot_id: Uuid::new_v4(),
            kart_number: 7,
            status,
            invited_at: Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
            expires_at,
            responded_at: None,
        }
    }

    #[test]
    fn pending_before_deadline_is_open() {
        let expires = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let inv = invitation(InvitationStatus::Pending, expires);
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 11, 59, 59).unwrap();

        assert!(inv.is_open(now));
        assert_eq!(inv.effective_status(now), InvitationStatus::Pending);
    }

    #[test]
    fn pending_at_deadline_reads_as_expired() {
        let expires = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let inv = invitation(InvitationStatus::Pending, expires);

        assert!(!inv.is_open(expires));
        assert_eq!(inv.effective_status(expires), InvitationStatus::Expired);
    }

    #[test]
    fn stored_status_wins_once_resolved() {
        let expires = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();

        let accepted = invitation(InvitationStatus::Accepted, expires);
        assert_eq!(accepted.effective_status(now), InvitationStatus::Accepted);
        assert!(!accepted.is_open(now));

        let declined = invitation(InvitationStatus::Declined, expires);
        assert_eq!(declined.effective_status(now), InvitationStatus::Declined);
    }
}
