pub mod event;
pub mod fair_racing_score;
pub mod invitation;
pub mod participation;
pub mod points_history;
pub mod sanction;
pub mod squadron;
pub mod squadron_result;

pub use event::{Event, EventCategory, EventState, RaceProcessingState};
pub use fair_racing_score::{
    CLEAN_RACE_RECOVERY_POINTS, FairRacingScore, INITIAL_FAIR_RACING_SCORE, Incident,
    IncidentStatus, MAX_FAIR_RACING_SCORE, MIN_FAIR_RACING_SCORE, Recognition,
};
pub use invitation::{Invitation, InvitationStatus};
pub use participation::{
    ConfirmedPilot, Participation, ParticipationStatus, RosterSlot, RosterSnapshot,
};
pub use points_history::{PointsChangeType, PointsHistoryEntry};
pub use sanction::{Sanction, SanctionType, default_penalty_for_severity};
pub use squadron::Squadron;
pub use squadron_result::{ResultPilot, SquadronResult};
