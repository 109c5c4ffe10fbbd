use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

pub const INITIAL_FAIR_RACING_SCORE: i16 = 85;
pub const MIN_FAIR_RACING_SCORE: i16 = 0;
pub const MAX_FAIR_RACING_SCORE: i16 = 100;
pub const CLEAN_RACE_RECOVERY_POINTS: i16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "incident_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Incident {
    pub incident_id: Uuid,
    pub pilot_id: Uuid,
    pub event_id: Option<Uuid>,
    pub category: String,
    pub severity: i16,
    pub points_deducted: i16,
    pub status: IncidentStatus,
    pub reported_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Recognition {
    pub recognition_id: Uuid,
    pub pilot_id: Uuid,
    pub event_id: Option<Uuid>,
    pub points_awarded: i16,
    pub reason: String,
    pub awarded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Per-pilot reputation score, bounded to [0, 100]. Every mutation clamps
/// immediately, so the stored score is always the clamped running fold of the
/// applied history, not a clamp of the raw sum.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FairRacingScore {
    pub pilot_id: Uuid,
    pub current_score: i16,
    pub initial_score: i16,
    pub total_races_clean: i32,
    pub recovery_progress: i32,
    pub last_race_date: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FairRacingScore {
    /// Deduct points for an approved incident, clamping at the floor.
    pub fn apply_penalty(&mut self, points_deducted: i16) {
        self.current_score =
            (self.current_score - points_deducted).max(MIN_FAIR_RACING_SCORE);
    }

    /// Add recognition points, clamping at the ceiling.
    pub fn award_recognition(&mut self, points_awarded: i16) {
        self.current_score =
            (self.current_score + points_awarded).min(MAX_FAIR_RACING_SCORE);
    }

    /// One clean race: +1 point, clamped, and the recovery counters advance.
    pub fn apply_clean_race_recovery(&mut self, race_date: DateTime<Utc>) {
        self.current_score =
            (self.current_score + CLEAN_RACE_RECOVERY_POINTS).min(MAX_FAIR_RACING_SCORE);
        self.total_races_clean += 1;
        self.recovery_progress += 1;
        self.last_race_date = Some(race_date);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_score() -> FairRacingScore {
        FairRacingScore {
            pilot_id: Uuid::new_v4(),
            current_score: INITIAL_FAIR_RACING_SCORE,
            initial_score: INITIAL_FAIR_RACING_SCORE,
            total_races_clean: 0,
            recovery_progress: 0,
            last_race_date: None,
            version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn penalty_then_recoveries() {
        // New pilot at 85, one approved incident of 10, three clean races.
        let mut score = fresh_score();

        score.apply_penalty(10);
        assert_eq!(score.current_score, 75);

        for _ in 0..3 {
            score.apply_clean_race_recovery(Utc::now());
        }
        assert_eq!(score.current_score, 78);
        assert_eq!(score.total_races_clean, 3);
        assert_eq!(score.recovery_progress, 3);
        assert!(score.last_race_date.is_some());
    }

    #[test]
    fn penalty_clamps_at_zero() {
        let mut score = fresh_score();
        score.apply_penalty(90);
        assert_eq!(score.current_score, 0);
        score.apply_penalty(15);
        assert_eq!(score.current_score, 0);
    }

    #[test]
    fn recognition_clamps_at_hundred() {
        let mut score = fresh_score();
        score.award_recognition(5);
        score.award_recognition(5);
        score.award_recognition(5);
        score.award_recognition(5);
        assert_eq!(score.current_score, 100);
    }

    #[test]
    fn intermediate_clamping_order_matters() {
        // Clamping at each step: 85 -90 => 0, then +5 => 5. A single clamp of
        // the raw sum (85 - 90 + 5 = 0) would differ.
        let mut stepped = fresh_score();
        stepped.apply_penalty(90);
        stepped.award_recognition(5);
        assert_eq!(stepped.current_score, 5);
    }

    #[test]
    fn score_stays_in_bounds_under_any_order() {
        let ops: [(i16, bool); 12] = [
            (30, false),
            (5, true),
            (60, false),
            (4, true),
            (3, true),
            (80, false),
            (5, true),
            (5, true),
            (5, true),
            (1, false),
            (5, true),
            (100, false),
        ];

        let mut score = fresh_score();
        for (points, is_award) in ops {
            if is_award {
                score.award_recognition(points);
            } else {
                score.apply_penalty(points);
            }
            assert!(
                (MIN_FAIR_RACING_SCORE..=MAX_FAIR_RACING_SCORE).contains(&score.current_score),
                "score {} escaped bounds",
                score.current_score
            );
        }
    }

    #[test]
    fn recovery_stops_at_ceiling_but_counters_advance() {
        let mut score = fresh_score();
        for _ in 0..20 {
            score.apply_clean_race_recovery(Utc::now());
        }
        assert_eq!(score.current_score, 100);
        assert_eq!(score.total_races_clean, 20);
        assert_eq!(score.recovery_progress, 20);
    }
}
