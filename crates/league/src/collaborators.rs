//! Trait seams for the systems this core consumes but does not own:
//! identity resolution, race results and notification delivery.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("Collaborator returned malformed data: {0}")]
    Malformed(String),
}

/// How confidently a raw driver name was matched to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    Exact,
    Fuzzy,
}

#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    pub pilot_id: Uuid,
    pub confidence: MatchConfidence,
}

/// Maps raw driver name strings to stable pilot identities.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(
        &self,
        driver_name: &str,
    ) -> Result<Option<ResolvedIdentity>, CollaboratorError>;
}

/// One driver's raw outcome in a race session.
#[derive(Debug, Clone)]
pub struct RawRaceEntry {
    pub driver_name: String,
    pub final_position: i32,
    pub kart_number: i16,
}

/// Supplies the per-driver outcome of a finished race session.
#[async_trait]
pub trait RaceResultProvider: Send + Sync {
    async fn get_result(
        &self,
        race_session_id: &str,
    ) -> Result<Vec<RawRaceEntry>, CollaboratorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    SanctionApplied,
}

/// Fire-and-forget delivery of user-facing notifications. Failures are the
/// caller's to log; they never gate a commit.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(
        &self,
        pilot_id: Uuid,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) -> Result<(), CollaboratorError>;
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Resolver over a fixed name table. Exact matches report `Exact`;
    /// case-insensitive matches report `Fuzzy`.
    pub struct StaticIdentityResolver {
        names: HashMap<String, Uuid>,
    }

    impl StaticIdentityResolver {
        pub fn new(entries: &[(&str, Uuid)]) -> Self {
            Self {
                names: entries
                    .iter()
                    .map(|(name, id)| (name.to_string(), *id))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl IdentityResolver for StaticIdentityResolver {
        async fn resolve(
            &self,
            driver_name: &str,
        ) -> Result<Option<ResolvedIdentity>, CollaboratorError> {
            if let Some(&pilot_id) = self.names.get(driver_name) {
                return Ok(Some(ResolvedIdentity {
                    pilot_id,
                    confidence: MatchConfidence::Exact,
                }));
            }

            let lowered = driver_name.to_lowercase();
            for (name, &pilot_id) in &self.names {
                if name.to_lowercase() == lowered {
                    return Ok(Some(ResolvedIdentity {
                        pilot_id,
                        confidence: MatchConfidence::Fuzzy,
                    }));
                }
            }

            Ok(None)
        }
    }

    pub struct StaticRaceResults {
        pub entries: Vec<RawRaceEntry>,
    }

    #[async_trait]
    impl RaceResultProvider for StaticRaceResults {
        async fn get_result(
            &self,
            _race_session_id: &str,
        ) -> Result<Vec<RawRaceEntry>, CollaboratorError> {
            Ok(self.entries.clone())
        }
    }

    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<(Uuid, NotificationKind)>>,
    }

    #[async_trait]
    impl NotificationDispatcher for RecordingNotifier {
        async fn notify(
            &self,
            pilot_id: Uuid,
            kind: NotificationKind,
            _payload: serde_json::Value,
        ) -> Result<(), CollaboratorError> {
            self.sent.lock().unwrap().push((pilot_id, kind));
            Ok(())
        }
    }
}
