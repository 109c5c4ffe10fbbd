use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Event category. Each category distributes a fixed pool of base points
/// across the squadron payout table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "event_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    GrandPrix,
    National,
    Regional,
    Club,
}

impl EventCategory {
    pub fn base_points(self) -> i64 {
        match self {
            EventCategory::GrandPrix => 2500,
            EventCategory::National => 1500,
            EventCategory::Regional => 800,
            EventCategory::Club => 400,
        }
    }
}

/// Publication lifecycle of an event. Transitions are strictly forward,
/// except that any non-terminal state can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "event_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventState {
    Draft,
    Published,
    RegistrationOpen,
    RegistrationClosed,
    InProgress,
    Completed,
    Cancelled,
}

impl EventState {
    pub fn as_str(self) -> &'static str {
        match self {
            EventState::Draft => "draft",
            EventState::Published => "published",
            EventState::RegistrationOpen => "registration_open",
            EventState::RegistrationClosed => "registration_closed",
            EventState::InProgress => "in_progress",
            EventState::Completed => "completed",
            EventState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, EventState::Completed | EventState::Cancelled)
    }

    /// Whether `self` is the unique predecessor of `next` in the forward
    /// chain, or `next` is a cancellation of a non-terminal state.
    pub fn can_advance_to(self, next: EventState) -> bool {
        use EventState::*;

        match next {
            Cancelled => !self.is_terminal(),
            _ => matches!(
                (self, next),
                (Draft, Published)
                    | (Published, RegistrationOpen)
                    | (RegistrationOpen, RegistrationClosed)
                    | (RegistrationClosed, InProgress)
                    | (InProgress, Completed)
            ),
        }
    }

    /// States during which roster mutations (registration, invitations,
    /// confirmations) are permitted.
    pub fn allows_roster_changes(self) -> bool {
        matches!(
            self,
            EventState::RegistrationOpen | EventState::RegistrationClosed
        )
    }
}

/// Result-processing lifecycle, independent of the publication axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "race_processing_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RaceProcessingState {
    Pending,
    InReview,
    Finalized,
}

impl RaceProcessingState {
    pub fn as_str(self) -> &'static str {
        match self {
            RaceProcessingState::Pending => "pending",
            RaceProcessingState::InReview => "in_review",
            RaceProcessingState::Finalized => "finalized",
        }
    }

    /// Sanctions may only be attached or removed while results are open.
    pub fn allows_sanction_changes(self) -> bool {
        matches!(
            self,
            RaceProcessingState::Pending | RaceProcessingState::InReview
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Event {
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
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub finalized_by: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_chain_is_strict() {
        use EventState::*;

        assert!(Draft.can_advance_to(Published));
        assert!(Published.can_advance_to(RegistrationOpen));
        assert!(RegistrationOpen.can_advance_to(RegistrationClosed));
        assert!(RegistrationClosed.can_advance_to(InProgress));
        assert!(InProgress.can_advance_to(Completed));

        assert!(!Draft.can_advance_to(RegistrationOpen));
        assert!(!Published.can_advance_to(Completed));
        assert!(!RegistrationClosed.can_advance_to(Completed));
        assert!(!Completed.can_advance_to(Published));
    }

    #[test]
    fn no_backwards_transitions() {
        use EventState::*;

        assert!(!Published.can_advance_to(Draft));
        assert!(!RegistrationClosed.can_advance_to(RegistrationOpen));
        assert!(!InProgress.can_advance_to(RegistrationClosed));
    }

    #[test]
    fn cancel_reachable_from_any_non_terminal_state() {
        use EventState::*;

        for state in [Draft, Published, RegistrationOpen, RegistrationClosed, InProgress] {
            assert!(state.can_advance_to(Cancelled), "{state:?} should cancel");
        }
        assert!(!Completed.can_advance_to(Cancelled));
        assert!(!Cancelled.can_advance_to(Cancelled));
    }

    #[test]
    fn roster_changes_only_during_registration_window() {
        use EventState::*;

        assert!(RegistrationOpen.allows_roster_changes());
        assert!(RegistrationClosed.allows_roster_changes());
        for state in [Draft, Published, InProgress, Completed, Cancelled] {
            assert!(!state.allows_roster_changes());
        }
    }

    #[test]
    fn category_base_points() {
        assert_eq!(EventCategory::GrandPrix.base_points(), 2500);
        assert_eq!(EventCategory::National.base_points(), 1500);
        assert_eq!(EventCategory::Regional.base_points(), 800);
        assert_eq!(EventCategory::Club.base_points(), 400);
    }

    #[test]
    fn sanction_window_follows_processing_state() {
        assert!(RaceProcessingState::Pending.allows_sanction_changes());
        assert!(RaceProcessingState::InReview.allows_sanction_changes());
        assert!(!RaceProcessingState::Finalized.allows_sanction_changes());
    }
}
