use storage::StorageError;
use thiserror::Error;
use validator::ValidationErrors;

use crate::collaborators::CollaboratorError;

/// League operation errors, reported synchronously to the caller
#[derive(Debug, Error)]
pub enum LeagueError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Resource not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Operation invalid in state: {0}")]
    State(String),

    #[error("Collaborator failure: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

pub type Result<T> = std::result::Result<T, LeagueError>;

impl From<StorageError> for LeagueError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::NotFound => Self::NotFound,
            StorageError::ConstraintViolation(msg) => Self::Conflict(msg),
            StorageError::InvalidState(state) => Self::State(state),
            StorageError::StaleUpdate => {
                Self::Conflict("Lost a concurrent update; retry if appropriate".to_string())
            }
            other => Self::Storage(other),
        }
    }
}

impl From<ValidationErrors> for LeagueError {
    fn from(errors: ValidationErrors) -> Self {
        let details: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    format!(
                        "{}: {}",
                        field,
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    )
                })
            })
            .collect();

        Self::Validation(details.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_map_onto_the_taxonomy() {
        assert!(matches!(
            LeagueError::from(StorageError::NotFound),
            LeagueError::NotFound
        ));
        assert!(matches!(
            LeagueError::from(StorageError::ConstraintViolation("kart taken".into())),
            LeagueError::Conflict(_)
        ));
        assert!(matches!(
            LeagueError::from(StorageError::InvalidState("draft".into())),
            LeagueError::State(_)
        ));
        assert!(matches!(
            LeagueError::from(StorageError::StaleUpdate),
            LeagueError::Conflict(_)
        ));
    }
}
