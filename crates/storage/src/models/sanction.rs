use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sanction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SanctionType {
    Contact,
    DangerousDriving,
    TrackLimits,
    JumpStart,
    UnsportingConduct,
}

impl SanctionType {
    /// Incident severity recorded on the pilot's fair-racing ledger when the
    /// sanction takes effect at finalize.
    pub fn incident_severity(self) -> i16 {
        match self {
            SanctionType::TrackLimits | SanctionType::JumpStart => 1,
            SanctionType::Contact | SanctionType::UnsportingConduct => 2,
            SanctionType::DangerousDriving => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SanctionType::Contact => "contact",
            SanctionType::DangerousDriving => "dangerous_driving",
            SanctionType::TrackLimits => "track_limits",
            SanctionType::JumpStart => "jump_start",
            SanctionType::UnsportingConduct => "unsporting_conduct",
        }
    }
}

/// Fair-racing deduction used when a sanction carries no explicit points
/// penalty: five points per severity step.
pub fn default_penalty_for_severity(severity: i16) -> i16 {
    severity * 5
}

/// A penalty recorded against one driver for one event. Immutable once
/// created; an organizer may delete it while results are still open.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Sanction {
    pub sanction_id: Uuid,
    pub event_id: Uuid,
    pub driver_name: String,
    pub pilot_id: Uuid,
    pub sanction_type: SanctionType,
    pub description: String,
    pub position_penalty: Option<i32>,
    pub points_penalty: Option<i32>,
    pub applied_by: Uuid,
    pub applied_at: DateTime<Utc>,
}

impl Sanction {
    /// Points deducted from the pilot's fair-racing score at finalize.
    pub fn fair_racing_deduction(&self) -> i16 {
        match self.points_penalty {
            Some(points) => points as i16,
            None => default_penalty_for_severity(self.sanction_type.incident_severity()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanction(sanction_type: SanctionType, points_penalty: Option<i32>) -> Sanction {
        Sanction {
            sanction_id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            driver_name: "K. Raikko".to_string(),
            pilot_id: Uuid::new_v4(),
            sanction_type,
            description: "contact at turn 3".to_string(),
            position_penalty: None,
            points_penalty,
            applied_by: Uuid::new_v4(),
            applied_at: Utc::now(),
        }
    }

    #[test]
    fn severity_follows_sanction_type() {
        assert_eq!(SanctionType::TrackLimits.incident_severity(), 1);
        assert_eq!(SanctionType::JumpStart.incident_severity(), 1);
        assert_eq!(SanctionType::Contact.incident_severity(), 2);
        assert_eq!(SanctionType::UnsportingConduct.incident_severity(), 2);
        assert_eq!(SanctionType::DangerousDriving.incident_severity(), 3);
    }

    #[test]
    fn explicit_points_penalty_wins() {
        let s = sanction(SanctionType::Contact, Some(12));
        assert_eq!(s.fair_racing_deduction(), 12);
    }

    #[test]
    fn default_penalty_scales_with_severity() {
        assert_eq!(sanction(SanctionType::TrackLimits, None).fair_racing_deduction(), 5);
        assert_eq!(sanction(SanctionType::Contact, None).fair_racing_deduction(), 10);
        assert_eq!(
            sanction(SanctionType::DangerousDriving, None).fair_racing_deduction(),
            15
        );
    }
}
