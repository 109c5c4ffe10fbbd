use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Event, EventCategory, EventState, RaceProcessingState};

/// Request payload for creating a new event
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEventRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: String,

    pub category: EventCategory,

    pub event_date: DateTime<Utc>,

    pub registration_deadline: DateTime<Utc>,

    #[validate(length(min = 1, max = 255))]
    pub location: String,

    #[validate(range(min = 2, max = 64, message = "Squadron capacity must be 2-64"))]
    pub max_squadrons: i32,

    #[validate(range(min = 1, max = 20))]
    pub min_pilots_per_squadron: i32,

    #[validate(range(min = 1, max = 20))]
    pub max_pilots_per_squadron: i32,

    #[validate(length(max = 255))]
    pub race_session_id: Option<String>,
}

impl CreateEventRequest {
    /// Additional validation that requires multiple fields
    pub fn validate_dates(&self) -> Result<(), &'static str> {
        if self.registration_deadline >= self.event_date {
            return Err("Registration deadline must be strictly before the event date");
        }

        if self.min_pilots_per_squadron > self.max_pilots_per_squadron {
            return Err("Minimum pilots per squadron cannot exceed the maximum");
        }

        Ok(())
    }
}

/// Response containing event details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    pub event_id: Uuid,
    pub name: String,
    pub category: EventCategory,
    pub base_points: i64,
    pub event_date: DateTime<Utc>,
    pub registration_deadline: DateTime<Utc>,
    pub location: String,
    pub max_squadrons: i32,
    pub min_pilots_per_squadron: i32,
    pub max_pilots_per_squadron: i32,
    pub state: EventState,
    pub race_processing_state: RaceProcessingState,
    pub race_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            event_id: event.event_id,
            name: event.name,
            category: event.category,
            base_points: event.base_points,
            event_date: event.event_date,
            registration_deadline: event.registration_deadline,
            location: event.location,
            max_squadrons: event.max_squadrons,
            min_pilots_per_squadron: event.min_pilots_per_squadron,
            max_pilots_per_squadron: event.max_pilots_per_squadron,
            state: event.state,
            race_processing_state: event.race_processing_state,
            race_session_id: event.race_session_id,
            created_at: event.created_at,
            finalized_at: event.finalized_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request() -> CreateEventRequest {
        CreateEventRequest {
            name: "Spring Grand Prix".to_string(),
            category: EventCategory::GrandPrix,
            event_date: Utc.with_ymd_and_hms(2025, 6, 15, 14, 0, 0).unwrap(),
            registration_deadline: Utc.with_ymd_and_hms(2025, 6, 10, 23, 59, 59).unwrap(),
            location: "Circuit Sud".to_string(),
            max_squadrons: 12,
            min_pilots_per_squadron: 2,
            max_pilots_per_squadron: 4,
            race_session_id: None,
        }
    }

    #[test]
    fn valid_request_passes() {
        let req = request();
        assert!(req.validate_dates().is_ok());
    }

    #[test]
    fn deadline_must_precede_event_date() {
        let mut req = request();
        req.registration_deadline = req.event_date;
        assert!(req.validate_dates().is_err());

        req.registration_deadline = req.event_date + chrono::Duration::hours(1);
        assert!(req.validate_dates().is_err());
    }

    #[test]
    fn pilot_bounds_must_be_ordered() {
        let mut req = request();
        req.min_pilots_per_squadron = 5;
        req.max_pilots_per_squadron = 3;
        assert!(req.validate_dates().is_err());
    }
}
