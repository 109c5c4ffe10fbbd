use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::dto::sanction::ApplySanctionRequest;
use crate::error::{Result, StorageError};
use crate::models::{RaceProcessingState, Sanction};

const SANCTION_COLUMNS: &str = "sanction_id, event_id, driver_name, pilot_id, sanction_type, \
     description, position_penalty, points_penalty, applied_by, applied_at";

/// Repository for Sanction database operations
pub struct SanctionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SanctionRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a sanction against a resolved driver. The insert is guarded on
    /// the event still having open results, so a finalize racing past us
    /// cannot end up with an unprocessed sanction.
    pub async fn create(
        &self,
        event_id: Uuid,
        pilot_id: Uuid,
        req: &ApplySanctionRequest,
        applied_by: Uuid,
    ) -> Result<Sanction> {
        let sanction = sqlx::query_as::<_, Sanction>(&format!(
            r#"
            INSERT INTO sanctions (
                event_id, driver_name, pilot_id, sanction_type, description,
                position_penalty, points_penalty, applied_by
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8
            WHERE EXISTS (
                SELECT 1 FROM events
                WHERE event_id = $1
                  AND race_processing_state IN ('pending', 'in_review')
            )
            RETURNING {SANCTION_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(&req.driver_name)
        .bind(pilot_id)
        .bind(req.sanction_type)
        .bind(&req.description)
        .bind(req.position_penalty)
        .bind(req.points_penalty)
        .bind(applied_by)
        .fetch_optional(self.pool)
        .await?;

        match sanction {
            Some(sanction) => Ok(sanction),
            None => Err(self.event_state_error(event_id).await?),
        }
    }

    /// Delete a sanction, permitted only while the event's results are open
    pub async fn remove(&self, sanction_id: Uuid) -> Result<()> {
        let event_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT event_id FROM sanctions WHERE sanction_id = $1",
        )
        .bind(sanction_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        let result = sqlx::query(
            r#"
            DELETE FROM sanctions s
            USING events e
            WHERE s.sanction_id = $1
              AND e.event_id = s.event_id
              AND e.race_processing_state IN ('pending', 'in_review')
            "#,
        )
        .bind(sanction_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.event_state_error(event_id).await?);
        }

        Ok(())
    }

    pub async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Sanction>> {
        let sanctions = sqlx::query_as::<_, Sanction>(&format!(
            "SELECT {SANCTION_COLUMNS} FROM sanctions WHERE event_id = $1 ORDER BY applied_at ASC"
        ))
        .bind(event_id)
        .fetch_all(self.pool)
        .await?;

        Ok(sanctions)
    }

    /// Resolve why a guarded statement matched nothing: missing event or a
    /// closed result-processing state.
    async fn event_state_error(&self, event_id: Uuid) -> Result<StorageError> {
        let state = sqlx::query_scalar::<_, RaceProcessingState>(
            "SELECT race_processing_state FROM events WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(match state {
            None => StorageError::NotFound,
            Some(state) => StorageError::InvalidState(state.as_str().to_string()),
        })
    }
}

/// Sanctions for one event, read inside the finalize transaction
pub(crate) async fn list_for_event_in_tx(
    conn: &mut PgConnection,
    event_id: Uuid,
) -> Result<Vec<Sanction>> {
    let sanctions = sqlx::query_as::<_, Sanction>(&format!(
        "SELECT {SANCTION_COLUMNS} FROM sanctions WHERE event_id = $1 ORDER BY applied_at ASC"
    ))
    .bind(event_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(sanctions)
}
