pub mod event;
pub mod fair_racing;
pub mod participation;
pub mod points;
pub mod sanction;
pub mod squadron;

pub use event::{EventRepository, FinalizedEvent};
pub use fair_racing::FairRacingRepository;
pub use participation::ParticipationRepository;
pub use points::PointsLedgerRepository;
pub use sanction::SanctionRepository;
pub use squadron::SquadronRepository;
