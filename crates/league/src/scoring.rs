//! Pure points computation: race entries in, ranked squadron results out.
//! No side effects; identical inputs produce identical output.

use std::collections::HashMap;

use storage::dto::results::{PilotResultEntry, SquadronResultEntry};
use storage::models::RosterSlot;
use uuid::Uuid;

use crate::collaborators::{IdentityResolver, RawRaceEntry};
use crate::error::Result;

/// Individual points by finishing position, 1-indexed. Positions beyond the
/// table score zero.
pub const INDIVIDUAL_POINTS_TABLE: [i64; 20] = [
    25, 22, 20, 18, 16, 15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1,
];

pub fn individual_points(final_position: i32) -> i64 {
    if final_position < 1 {
        return 0;
    }
    INDIVIDUAL_POINTS_TABLE
        .get(final_position as usize - 1)
        .copied()
        .unwrap_or(0)
}

/// Percentage of the event's base points paid out by squadron position.
pub fn payout_percentage(position: i32) -> i16 {
    match position {
        1 => 100,
        2 => 65,
        3 => 45,
        4 => 30,
        5..=8 => 20,
        9..=16 => 10,
        _ => 5,
    }
}

/// Base-points share for a payout percentage, rounded to nearest.
pub fn points_awarded(base_points: i64, percentage: i16) -> i64 {
    (base_points * percentage as i64 + 50) / 100
}

/// One resolved driver outcome, ready for scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceEntry {
    pub pilot_id: Uuid,
    pub squadron_id: Uuid,
    pub final_position: i32,
    pub kart_number: i16,
}

/// Rank squadrons and distribute the event's base points.
///
/// Squadrons are ordered by total points descending. Ties break on the
/// lowest sum of finishing positions, then on squadron registration order
/// (`registration_order`, earliest first); both keys are deterministic, so
/// repeated runs produce identical rankings.
pub fn score_race(
    base_points: i64,
    entries: &[RaceEntry],
    registration_order: &[Uuid],
) -> Vec<SquadronResultEntry> {
    struct Tally {
        total_points: i64,
        position_sum: i64,
        pilots: Vec<PilotResultEntry>,
    }

    let mut tallies: HashMap<Uuid, Tally> = HashMap::new();

    for entry in entries {
        let points = individual_points(entry.final_position);
        let tally = tallies.entry(entry.squadron_id).or_insert(Tally {
            total_points: 0,
            position_sum: 0,
            pilots: Vec::new(),
        });
        tally.total_points += points;
        tally.position_sum += entry.final_position as i64;
        tally.pilots.push(PilotResultEntry {
            pilot_id: entry.pilot_id,
            final_position: entry.final_position,
            individual_points: points,
            kart_number: entry.kart_number,
        });
    }

    let registration_rank = |squadron_id: Uuid| {
        registration_order
            .iter()
            .position(|&id| id == squadron_id)
            .unwrap_or(registration_order.len())
    };

    let mut ranked: Vec<(Uuid, Tally)> = tallies.into_iter().collect();
    ranked.sort_by(|(a_id, a), (b_id, b)| {
        b.total_points
            .cmp(&a.total_points)
            .then(a.position_sum.cmp(&b.position_sum))
            .then(registration_rank(*a_id).cmp(&registration_rank(*b_id)))
            .then(a_id.cmp(b_id))
    });

    ranked
        .into_iter()
        .enumerate()
        .map(|(i, (squadron_id, mut tally))| {
            let position = (i + 1) as i32;
            let percentage = payout_percentage(position);
            tally.pilots.sort_by_key(|p| p.final_position);

            SquadronResultEntry {
                squadron_id,
                position,
                total_points: tally.total_points,
                points_awarded: points_awarded(base_points, percentage),
                percentage_awarded: percentage,
                pilots: tally.pilots,
            }
        })
        .collect()
}

/// Join raw race outcomes with the confirmed roster, resolving driver names
/// through the identity collaborator. Unresolvable names and resolved pilots
/// who are not on the event's roster (guest drivers) are skipped with a
/// warning; scoring only covers registered squadrons.
pub async fn assemble_entries(
    roster: &[RosterSlot],
    raw: &[RawRaceEntry],
    resolver: &impl IdentityResolver,
) -> Result<Vec<RaceEntry>> {
    let mut entries = Vec::with_capacity(raw.len());

    for outcome in raw {
        let Some(identity) = resolver.resolve(&outcome.driver_name).await? else {
            tracing::warn!(driver = %outcome.driver_name, "driver name did not resolve, skipping");
            continue;
        };

        let Some(slot) = roster.iter().find(|s| s.pilot_id == identity.pilot_id) else {
            tracing::warn!(
                driver = %outcome.driver_name,
                pilot_id = %identity.pilot_id,
                "pilot raced but is not on the confirmed roster, skipping"
            );
            continue;
        };

        entries.push(RaceEntry {
            pilot_id: identity.pilot_id,
            squadron_id: slot.squadron_id,
            final_position: outcome.final_position,
            kart_number: outcome.kart_number,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::fakes::StaticIdentityResolver;

    fn entry(squadron_id: Uuid, final_position: i32) -> RaceEntry {
        RaceEntry {
            pilot_id: Uuid::new_v4(),
            squadron_id,
            final_position,
            kart_number: final_position as i16,
        }
    }

    #[test]
    fn individual_points_table_is_exact() {
        let expected = [
            (1, 25),
            (2, 22),
            (3, 20),
            (4, 18),
            (5, 16),
            (6, 15),
            (7, 14),
            (8, 13),
            (9, 12),
            (10, 11),
            (11, 10),
            (12, 9),
            (13, 8),
            (14, 7),
            (15, 6),
            (16, 5),
            (17, 4),
            (18, 3),
            (19, 2),
            (20, 1),
        ];
        for (position, points) in expected {
            assert_eq!(individual_points(position), points, "position {position}");
        }
        assert_eq!(individual_points(21), 0);
        assert_eq!(individual_points(35), 0);
        assert_eq!(individual_points(0), 0);
        assert_eq!(individual_points(-3), 0);
    }

    #[test]
    fn payout_percentages_by_position() {
        assert_eq!(payout_percentage(1), 100);
        assert_eq!(payout_percentage(2), 65);
        assert_eq!(payout_percentage(3), 45);
        assert_eq!(payout_percentage(4), 30);
        for p in 5..=8 {
            assert_eq!(payout_percentage(p), 20);
        }
        for p in 9..=16 {
            assert_eq!(payout_percentage(p), 10);
        }
        assert_eq!(payout_percentage(17), 5);
        assert_eq!(payout_percentage(40), 5);
    }

    #[test]
    fn four_squadrons_split_a_grand_prix_pool() {
        // base 2500: ranks 1-4 take 100/65/45/30 percent.
        let squadrons: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let entries: Vec<RaceEntry> = squadrons
            .iter()
            .enumerate()
            .map(|(i, &s)| entry(s, (i + 1) as i32))
            .collect();

        let results = score_race(2500, &entries, &squadrons);

        let awarded: Vec<i64> = results.iter().map(|r| r.points_awarded).collect();
        assert_eq!(awarded, vec![2500, 1625, 1125, 750]);
        let percentages: Vec<i16> = results.iter().map(|r| r.percentage_awarded).collect();
        assert_eq!(percentages, vec![100, 65, 45, 30]);
    }

    #[test]
    fn winner_contributes_twenty_five_and_backmarker_nothing() {
        let squadron = Uuid::new_v4();
        let winner = entry(squadron, 1);
        let backmarker = entry(squadron, 21);

        let results = score_race(400, &[winner, backmarker], &[squadron]);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].total_points, 25);
        assert_eq!(results[0].pilots[0].individual_points, 25);
        assert_eq!(results[0].pilots[1].individual_points, 0);
    }

    #[test]
    fn payout_sum_matches_independent_computation() {
        let squadrons: Vec<Uuid> = (0..10).map(|_| Uuid::new_v4()).collect();
        let entries: Vec<RaceEntry> = squadrons
            .iter()
            .enumerate()
            .map(|(i, &s)| entry(s, (i + 1) as i32))
            .collect();

        for base in [2500i64, 1500, 800, 400] {
            let results = score_race(base, &entries, &squadrons);
            let total: i64 = results.iter().map(|r| r.points_awarded).sum();
            let expected: i64 = (1..=10)
                .map(|pos| (base * payout_percentage(pos) as i64 + 50) / 100)
                .sum();
            assert_eq!(total, expected, "base {base}");
        }
    }

    #[test]
    fn tie_breaks_on_lower_position_sum() {
        let alpha = Uuid::new_v4();
        let beta = Uuid::new_v4();
        // alpha: 2nd + 5th = 22 + 16 = 38, position sum 7
        // beta:  1st + 8th = 25 + 13 = 38, position sum 9
        let entries = vec![
            entry(alpha, 2),
            entry(alpha, 5),
            entry(beta, 1),
            entry(beta, 8),
        ];

        let results = score_race(800, &entries, &[beta, alpha]);

        assert_eq!(results[0].squadron_id, alpha);
        assert_eq!(results[0].position, 1);
        assert_eq!(results[1].squadron_id, beta);
        assert_eq!(results[1].position, 2);
    }

    #[test]
    fn tie_breaks_on_registration_order_last() {
        let first_registered = Uuid::new_v4();
        let second_registered = Uuid::new_v4();
        // (11th, 14th) and (12th, 13th) both total 17 points with position
        // sum 25, so only registration order separates them.
        let entries = vec![
            entry(second_registered, 11),
            entry(second_registered, 14),
            entry(first_registered, 12),
            entry(first_registered, 13),
        ];

        let results = score_race(800, &entries, &[first_registered, second_registered]);

        assert_eq!(results[0].squadron_id, first_registered);
        assert_eq!(results[1].squadron_id, second_registered);
    }

    #[test]
    fn scoring_is_idempotent() {
        let squadrons: Vec<Uuid> = (0..6).map(|_| Uuid::new_v4()).collect();
        let mut entries = Vec::new();
        for (i, &s) in squadrons.iter().enumerate() {
            entries.push(entry(s, (i * 2 + 1) as i32));
            entries.push(entry(s, (i * 2 + 2) as i32));
        }

        let first = score_race(1500, &entries, &squadrons);
        let second = score_race(1500, &entries, &squadrons);
        assert_eq!(first, second);
    }

    #[test]
    fn no_entries_no_results() {
        assert!(score_race(2500, &[], &[]).is_empty());
    }

    #[test]
    fn pilots_are_listed_by_finishing_position() {
        let squadron = Uuid::new_v4();
        let entries = vec![entry(squadron, 9), entry(squadron, 2), entry(squadron, 5)];

        let results = score_race(400, &entries, &[squadron]);

        let positions: Vec<i32> = results[0].pilots.iter().map(|p| p.final_position).collect();
        assert_eq!(positions, vec![2, 5, 9]);
    }

    #[tokio::test]
    async fn assembly_resolves_names_and_drops_guests() {
        let squadron = Uuid::new_v4();
        let ana = Uuid::new_v4();
        let bruno = Uuid::new_v4();
        let guest = Uuid::new_v4();

        let roster = vec![
            RosterSlot {
                squadron_id: squadron,
                pilot_id: ana,
                kart_number: 3,
                pending_expires_at: None,
            },
            RosterSlot {
                squadron_id: squadron,
                pilot_id: bruno,
                kart_number: 7,
                pending_expires_at: None,
            },
        ];

        let resolver = StaticIdentityResolver::new(&[
            ("Ana Duarte", ana),
            ("Bruno Vidal", bruno),
            ("Guest Driver", guest),
        ]);

        let raw = vec![
            RawRaceEntry {
                driver_name: "Ana Duarte".to_string(),
                final_position: 1,
                kart_number: 3,
            },
            // Case-insensitive fuzzy match still resolves.
            RawRaceEntry {
                driver_name: "bruno vidal".to_string(),
                final_position: 4,
                kart_number: 7,
            },
            // Resolves, but not on the roster.
            RawRaceEntry {
                driver_name: "Guest Driver".to_string(),
                final_position: 2,
                kart_number: 11,
            },
            // Does not resolve at all.
            RawRaceEntry {
                driver_name: "Unknown".to_string(),
                final_position: 3,
                kart_number: 12,
            },
        ];

        let entries = assemble_entries(&roster, &raw, &resolver).await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].pilot_id, ana);
        assert_eq!(entries[0].final_position, 1);
        assert_eq!(entries[1].pilot_id, bruno);
        assert_eq!(entries[1].squadron_id, squadron);
    }
}
