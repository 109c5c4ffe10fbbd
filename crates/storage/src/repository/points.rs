use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{PointsChangeType, PointsHistoryEntry};

/// Repository for the append-only squadron points audit trail
pub struct PointsLedgerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PointsLedgerRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Audit trail for one squadron, oldest first
    pub async fn history_for_squadron(&self, squadron_id: Uuid) -> Result<Vec<PointsHistoryEntry>> {
        let entries = sqlx::query_as::<_, PointsHistoryEntry>(
            r#"
            SELECT entry_id, squadron_id, event_id, points_change, previous_total,
                   new_total, reason, change_type, modified_by, created_at
            FROM points_history
            WHERE squadron_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(squadron_id)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }
}

/// Apply a points award to a squadron's running total and append the audit
/// row, inside the caller's transaction. The update and the history entry
/// commit or roll back together with everything else in that transaction.
///
/// Race-result awards are never negative on this pathway; sanctions act on
/// fair-racing scores, not squadron totals.
pub(crate) async fn apply_awarded_points(
    conn: &mut PgConnection,
    squadron_id: Uuid,
    event_id: Option<Uuid>,
    points_change: i64,
    reason: &str,
    change_type: PointsChangeType,
    modified_by: Uuid,
) -> Result<PointsHistoryEntry> {
    if change_type == PointsChangeType::RaceResult && points_change < 0 {
        return Err(StorageError::ConstraintViolation(
            "Race results cannot deduct squadron points".to_string(),
        ));
    }

    let new_total = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE squadrons
        SET total_points = total_points + $2
        WHERE squadron_id = $1
        RETURNING total_points
        "#,
    )
    .bind(squadron_id)
    .bind(points_change)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StorageError::NotFound)?;

    let entry = sqlx::query_as::<_, PointsHistoryEntry>(
        r#"
        INSERT INTO points_history (
            squadron_id, event_id, points_change, previous_total, new_total,
            reason, change_type, modified_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING entry_id, squadron_id, event_id, points_change, previous_total,
                  new_total, reason, change_type, modified_by, created_at
        "#,
    )
    .bind(squadron_id)
    .bind(event_id)
    .bind(points_change)
    .bind(new_total - points_change)
    .bind(new_total)
    .bind(reason)
    .bind(change_type)
    .bind(modified_by)
    .fetch_one(&mut *conn)
    .await?;

    Ok(entry)
}
