use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::squadron::{CreateSquadronRequest, StandingsEntry};
use crate::error::{Result, StorageError};
use crate::models::Squadron;

/// Repository for Squadron database operations
pub struct SquadronRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SquadronRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a new squadron
    pub async fn create(&self, req: &CreateSquadronRequest) -> Result<Squadron> {
        let squadron = sqlx::query_as::<_, Squadron>(
            r#"
            INSERT INTO squadrons (name)
            VALUES ($1)
            RETURNING squadron_id, name, total_points, created_at
            "#,
        )
        .bind(&req.name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.code().as_deref() == Some("23505") {
                    return StorageError::ConstraintViolation(
                        "Squadron name already exists".to_string(),
                    );
                }
            }
            StorageError::from(e)
        })?;

        Ok(squadron)
    }

    /// Get a squadron by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Squadron> {
        let squadron = sqlx::query_as::<_, Squadron>(
            r#"
            SELECT squadron_id, name, total_points, created_at
            FROM squadrons
            WHERE squadron_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(squadron)
    }

    /// League standings, best total first. Rank is dense over the returned
    /// rows.
    pub async fn list_standings(&self) -> Result<Vec<StandingsEntry>> {
        let squadrons = sqlx::query_as::<_, Squadron>(
            r#"
            SELECT squadron_id, name, total_points, created_at
            FROM squadrons
            ORDER BY total_points DESC, created_at ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(squadrons
            .into_iter()
            .enumerate()
            .map(|(i, s)| StandingsEntry {
                rank: (i + 1) as i32,
                squadron_id: s.squadron_id,
                name: s.name,
                total_points: s.total_points,
            })
            .collect())
    }
}
