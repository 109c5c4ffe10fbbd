use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::dto::fair_racing::{AwardRecognitionRequest, ReportIncidentRequest};
use crate::error::{Result, StorageError};
use crate::models::{FairRacingScore, Incident, IncidentStatus, Recognition, Sanction};

/// Attempts before an optimistic version check gives up.
const MAX_CAS_ATTEMPTS: u32 = 3;

const SCORE_COLUMNS: &str = "pilot_id, current_score, initial_score, total_races_clean, \
     recovery_progress, last_race_date, version, created_at, updated_at";

/// Repository for per-pilot fair racing scores, incidents and recognitions.
///
/// Score rows are created lazily at the initial score. Concurrent updates to
/// one pilot's score serialize through an optimistic `version` check; the
/// finalize path instead holds the row lock of its surrounding transaction.
pub struct FairRacingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FairRacingRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_pilot(&self, pilot_id: Uuid) -> Result<FairRacingScore> {
        let score = sqlx::query_as::<_, FairRacingScore>(&format!(
            "SELECT {SCORE_COLUMNS} FROM fair_racing_scores WHERE pilot_id = $1"
        ))
        .bind(pilot_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(score)
    }

    /// Fetch a pilot's score row, creating it at the initial score if absent
    pub async fn get_or_create(&self, pilot_id: Uuid) -> Result<FairRacingScore> {
        sqlx::query("INSERT INTO fair_racing_scores (pilot_id) VALUES ($1) ON CONFLICT (pilot_id) DO NOTHING")
            .bind(pilot_id)
            .execute(self.pool)
            .await?;

        self.find_by_pilot(pilot_id).await
    }

    /// Record a pending incident. Reporting has no effect on the score until
    /// the incident is approved.
    pub async fn report_incident(
        &self,
        req: &ReportIncidentRequest,
        reported_by: Uuid,
    ) -> Result<Incident> {
        self.get_or_create(req.pilot_id).await?;

        let incident = sqlx::query_as::<_, Incident>(
            r#"
            INSERT INTO incidents (
                pilot_id, event_id, category, severity, points_deducted, reported_by
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING incident_id, pilot_id, event_id, category, severity, points_deducted,
                      status, reported_by, created_at, reviewed_at, reviewed_by
            "#,
        )
        .bind(req.pilot_id)
        .bind(req.event_id)
        .bind(&req.category)
        .bind(req.severity)
        .bind(req.points_deducted)
        .bind(reported_by)
        .fetch_one(self.pool)
        .await?;

        Ok(incident)
    }

    /// Resolve a pending incident. Approval deducts the incident's points
    /// from the pilot's score; rejection records the review only.
    pub async fn review_incident(
        &self,
        incident_id: Uuid,
        approve: bool,
        reviewed_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Incident> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let mut tx = self.pool.begin().await?;

            let incident = sqlx::query_as::<_, Incident>(
                r#"
                SELECT incident_id, pilot_id, event_id, category, severity, points_deducted,
                       status, reported_by, created_at, reviewed_at, reviewed_by
                FROM incidents
                WHERE incident_id = $1
                "#,
            )
            .bind(incident_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StorageError::NotFound)?;

            if incident.status != IncidentStatus::Pending {
                return Err(StorageError::InvalidState(
                    "incident already reviewed".to_string(),
                ));
            }

            let next_status = if approve {
                IncidentStatus::Approved
            } else {
                IncidentStatus::Rejected
            };

            let reviewed = sqlx::query_as::<_, Incident>(
                r#"
                UPDATE incidents
                SET status = $2, reviewed_at = $3, reviewed_by = $4
                WHERE incident_id = $1 AND status = 'pending'
                RETURNING incident_id, pilot_id, event_id, category, severity, points_deducted,
                          status, reported_by, created_at, reviewed_at, reviewed_by
                "#,
            )
            .bind(incident_id)
            .bind(next_status)
            .bind(now)
            .bind(reviewed_by)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(reviewed) = reviewed else {
                // Another reviewer resolved it between our read and the update.
                return Err(StorageError::StaleUpdate);
            };

            if !approve {
                tx.commit().await?;
                return Ok(reviewed);
            }

            let mut score = score_in_tx(&mut tx, incident.pilot_id).await?;
            let expected_version = score.version;
            score.apply_penalty(incident.points_deducted);

            if persist_score_if_version(&mut tx, &score, expected_version).await? {
                tx.commit().await?;
                return Ok(reviewed);
            }

            // Version moved under us: drop the transaction (rolling back the
            // incident update too) and retry from a fresh read.
            tx.rollback().await?;
        }

        Err(StorageError::StaleUpdate)
    }

    /// Award recognition points, clamped at the ceiling
    pub async fn award_recognition(
        &self,
        req: &AwardRecognitionRequest,
        awarded_by: Uuid,
    ) -> Result<Recognition> {
        self.get_or_create(req.pilot_id).await?;

        for _ in 0..MAX_CAS_ATTEMPTS {
            let mut tx = self.pool.begin().await?;

            let mut score = score_in_tx(&mut tx, req.pilot_id).await?;
            let expected_version = score.version;
            score.award_recognition(req.points_awarded);

            if !persist_score_if_version(&mut tx, &score, expected_version).await? {
                tx.rollback().await?;
                continue;
            }

            let recognition = sqlx::query_as::<_, Recognition>(
                r#"
                INSERT INTO recognitions (pilot_id, event_id, points_awarded, reason, awarded_by)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING recognition_id, pilot_id, event_id, points_awarded, reason,
                          awarded_by, created_at
                "#,
            )
            .bind(req.pilot_id)
            .bind(req.event_id)
            .bind(req.points_awarded)
            .bind(&req.reason)
            .bind(awarded_by)
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;
            return Ok(recognition);
        }

        Err(StorageError::StaleUpdate)
    }

    pub async fn incidents_for_pilot(&self, pilot_id: Uuid) -> Result<Vec<Incident>> {
        let incidents = sqlx::query_as::<_, Incident>(
            r#"
            SELECT incident_id, pilot_id, event_id, category, severity, points_deducted,
                   status, reported_by, created_at, reviewed_at, reviewed_by
            FROM incidents
            WHERE pilot_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(pilot_id)
        .fetch_all(self.pool)
        .await?;

        Ok(incidents)
    }
}

async fn score_in_tx(conn: &mut PgConnection, pilot_id: Uuid) -> Result<FairRacingScore> {
    let score = sqlx::query_as::<_, FairRacingScore>(&format!(
        "SELECT {SCORE_COLUMNS} FROM fair_racing_scores WHERE pilot_id = $1"
    ))
    .bind(pilot_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StorageError::NotFound)?;

    Ok(score)
}

/// Write back a recomputed score iff nobody else bumped the version since it
/// was read. Returns false on a lost race.
async fn persist_score_if_version(
    conn: &mut PgConnection,
    score: &FairRacingScore,
    expected_version: i64,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE fair_racing_scores
        SET current_score = $2, total_races_clean = $3, recovery_progress = $4,
            last_race_date = $5, version = version + 1, updated_at = now()
        WHERE pilot_id = $1 AND version = $6
        "#,
    )
    .bind(score.pilot_id)
    .bind(score.current_score)
    .bind(score.total_races_clean)
    .bind(score.recovery_progress)
    .bind(score.last_race_date)
    .bind(expected_version)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Lock a pilot's score row for the remainder of the surrounding
/// transaction, creating it lazily first. Used by the finalize path, where
/// per-pilot serialization comes from the row lock rather than the version
/// check.
pub(crate) async fn score_for_update(
    conn: &mut PgConnection,
    pilot_id: Uuid,
) -> Result<FairRacingScore> {
    sqlx::query(
        "INSERT INTO fair_racing_scores (pilot_id) VALUES ($1) ON CONFLICT (pilot_id) DO NOTHING",
    )
    .bind(pilot_id)
    .execute(&mut *conn)
    .await?;

    let score = sqlx::query_as::<_, FairRacingScore>(&format!(
        "SELECT {SCORE_COLUMNS} FROM fair_racing_scores WHERE pilot_id = $1 FOR UPDATE"
    ))
    .bind(pilot_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(score)
}

pub(crate) async fn persist_score(conn: &mut PgConnection, score: &FairRacingScore) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE fair_racing_scores
        SET current_score = $2, total_races_clean = $3, recovery_progress = $4,
            last_race_date = $5, version = version + 1, updated_at = now()
        WHERE pilot_id = $1
        "#,
    )
    .bind(score.pilot_id)
    .bind(score.current_score)
    .bind(score.total_races_clean)
    .bind(score.recovery_progress)
    .bind(score.last_race_date)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Record the fair-racing effect of a sanction at finalize time: an already
/// approved incident plus the clamped deduction.
pub(crate) async fn record_sanction_incident(
    conn: &mut PgConnection,
    sanction: &Sanction,
    finalized_by: Uuid,
    now: DateTime<Utc>,
) -> Result<Incident> {
    let mut score = score_for_update(&mut *conn, sanction.pilot_id).await?;
    let deduction = sanction.fair_racing_deduction();

    let incident = sqlx::query_as::<_, Incident>(
        r#"
        INSERT INTO incidents (
            pilot_id, event_id, category, severity, points_deducted, status,
            reported_by, reviewed_at, reviewed_by
        )
        VALUES ($1, $2, $3, $4, $5, 'approved', $6, $7, $8)
        RETURNING incident_id, pilot_id, event_id, category, severity, points_deducted,
                  status, reported_by, created_at, reviewed_at, reviewed_by
        "#,
    )
    .bind(sanction.pilot_id)
    .bind(sanction.event_id)
    .bind(sanction.sanction_type.as_str())
    .bind(sanction.sanction_type.incident_severity())
    .bind(deduction)
    .bind(sanction.applied_by)
    .bind(now)
    .bind(finalized_by)
    .fetch_one(&mut *conn)
    .await?;

    score.apply_penalty(deduction);
    persist_score(&mut *conn, &score).await?;

    Ok(incident)
}

/// Clean-race recovery for one raced pilot, inside the finalize transaction.
pub(crate) async fn record_clean_race(
    conn: &mut PgConnection,
    pilot_id: Uuid,
    race_date: DateTime<Utc>,
) -> Result<()> {
    let mut score = score_for_update(&mut *conn, pilot_id).await?;
    score.apply_clean_race_recovery(race_date);
    persist_score(&mut *conn, &score).await
}
