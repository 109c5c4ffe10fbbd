use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Invitation, InvitationStatus, Participation, ParticipationStatus};

/// Request payload for registering a squadron into an event
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterSquadronRequest {
    pub squadron_id: Uuid,
}

/// Request payload for inviting a pilot onto a kart slot
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct InvitePilotRequest {
    pub pilot_id: Uuid,

    #[validate(range(min = 1, max = 20, message = "Kart number must be between 1 and 20"))]
    pub kart_number: i16,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParticipationResponse {
    pub participation_id: Uuid,
    pub event_id: Uuid,
    pub squadron_id: Uuid,
    pub status: ParticipationStatus,
    pub registered_at: DateTime<Utc>,
}

impl From<Participation> for ParticipationResponse {
    fn from(p: Participation) -> Self {
        Self {
            participation_id: p.participation_id,
            event_id: p.event_id,
            squadron_id: p.squadron_id,
            status: p.status,
            registered_at: p.registered_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvitationResponse {
    pub invitation_id: Uuid,
    pub participation_id: Uuid,
    pub pilot_id: Uuid,
    pub kart_number: i16,
    pub status: InvitationStatus,
    pub invited_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<Invitation> for InvitationResponse {
    fn from(inv: Invitation) -> Self {
        Self {
            invitation_id: inv.invitation_id,
            participation_id: inv.participation_id,
            pilot_id: inv.pilot_id,
            kart_number: inv.kart_number,
            status: inv.status,
            invited_at: inv.invited_at,
            expires_at: inv.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn kart_number_must_stay_in_range() {
        let valid = InvitePilotRequest {
            pilot_id: Uuid::new_v4(),
            kart_number: 20,
        };
        assert!(valid.validate().is_ok());

        let zero = InvitePilotRequest {
            pilot_id: Uuid::new_v4(),
            kart_number: 0,
        };
        assert!(zero.validate().is_err());

        let high = InvitePilotRequest {
            pilot_id: Uuid::new_v4(),
            kart_number: 21,
        };
        assert!(high.validate().is_err());
    }
}
