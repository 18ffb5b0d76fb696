//! The dominance fold: cumulative per-region tallies and winners
//!
//! The engine consumes the resolved stream in ascending time order,
//! grouped into one atomic batch per distinct minute, and emits one
//! immutable snapshot per batch. A region's winner is the user with the
//! highest cumulative tally there; ties resolve to the lexicographically
//! smallest user identifier, an explicit policy so the winner sequence is
//! reproducible run over run.
//!
//! All tally state is owned here and never exposed for mutation. Counts
//! only ever increase, so `user_totals` is componentwise non-decreasing
//! across the timeline.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::core::time::minute_floor;
use crate::resolver::ResolvedEvent;

/// The complete cumulative state at one distinct minute. Immutable once
/// emitted; each later minute produces a new, independent snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub timestamp: NaiveDateTime,
    /// Winner per region, for every region tallied so far - dominance is
    /// what is true as of now, not a delta.
    pub region_winners: BTreeMap<String, String>,
    /// Cumulative event count per user, zero-count users included.
    pub user_totals: BTreeMap<String, u64>,
}

/// Stateful fold over the resolved stream.
///
/// Step `t+1` depends on cumulative state from step `t`, so the engine is
/// strictly sequential over batches. Stopping early leaves a valid prefix
/// of the full timeline.
#[derive(Debug, Default)]
pub struct DominanceEngine {
    region_tallies: BTreeMap<String, BTreeMap<String, u64>>,
    user_totals: BTreeMap<String, u64>,
}

impl DominanceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register users up front so every snapshot carries the full roster,
    /// including users who have not scored yet.
    pub fn seed_users<I, S>(&mut self, users: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for user in users {
            self.user_totals.entry(user.into()).or_insert(0);
        }
    }

    /// Apply one minute's batch atomically and emit its snapshot.
    pub fn apply_batch(&mut self, timestamp: NaiveDateTime, batch: &[ResolvedEvent]) -> Snapshot {
        for resolved in batch {
            *self
                .user_totals
                .entry(resolved.event.user.clone())
                .or_insert(0) += 1;
            if resolved.is_unknown() {
                continue;
            }
            *self
                .region_tallies
                .entry(resolved.region.clone())
                .or_default()
                .entry(resolved.event.user.clone())
                .or_insert(0) += 1;
        }

        Snapshot {
            timestamp,
            region_winners: self.current_winners(),
            user_totals: self.user_totals.clone(),
        }
    }

    /// Winner of every region that has ever received a tally.
    pub fn current_winners(&self) -> BTreeMap<String, String> {
        self.region_tallies
            .iter()
            .filter_map(|(region, tallies)| {
                winner(tallies).map(|user| (region.clone(), user.to_string()))
            })
            .collect()
    }

    /// Fold a whole resolved stream (ascending by timestamp) into its
    /// snapshot timeline. An empty stream yields an empty timeline.
    pub fn fold(resolved: &[ResolvedEvent]) -> Vec<Snapshot> {
        let mut engine = Self::new();
        engine.seed_users(resolved.iter().map(|r| r.event.user.as_str()));

        batches(resolved)
            .into_iter()
            .map(|(minute, batch)| engine.apply_batch(minute, batch))
            .collect()
    }
}

/// Maximum tally holder; on a tie, the lexicographically smallest user.
/// BTreeMap iterates users in ascending order, so strict `>` keeps the
/// first maximum holder.
fn winner(tallies: &BTreeMap<String, u64>) -> Option<&str> {
    let mut best: Option<(&str, u64)> = None;
    for (user, &count) in tallies {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((user.as_str(), count));
        }
    }
    best.map(|(user, _)| user)
}

/// Split an ascending stream into runs of events sharing a minute.
fn batches(resolved: &[ResolvedEvent]) -> Vec<(NaiveDateTime, &[ResolvedEvent])> {
    let mut out = Vec::new();
    let mut start = 0;
    while start < resolved.len() {
        let minute = minute_floor(resolved[start].event.timestamp);
        let mut end = start + 1;
        while end < resolved.len() && minute_floor(resolved[end].event.timestamp) == minute {
            end += 1;
        }
        out.push((minute, &resolved[start..end]));
        start = end;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Event;
    use crate::regions::UNKNOWN_REGION;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn resolved(minute: u32, second: u32, user: &str, region: &str) -> ResolvedEvent {
        ResolvedEvent {
            event: Event {
                timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_opt(10, minute, second)
                    .unwrap(),
                user: user.to_string(),
                latitude: 0.0,
                longitude: 0.0,
            },
            region: region.to_string(),
        }
    }

    #[test]
    fn test_empty_stream_empty_timeline() {
        assert!(DominanceEngine::fold(&[]).is_empty());
    }

    #[test]
    fn test_single_minute_single_snapshot() {
        let stream = vec![
            resolved(0, 5, "A", "Italy"),
            resolved(0, 30, "B", "Italy"),
            resolved(0, 59, "B", "France"),
        ];
        let timeline = DominanceEngine::fold(&stream);
        assert_eq!(timeline.len(), 1);
        let snap = &timeline[0];
        assert_eq!(snap.user_totals["A"], 1);
        assert_eq!(snap.user_totals["B"], 2);
        assert_eq!(snap.region_winners["France"], "B");
    }

    #[test]
    fn test_lead_change_between_steps() {
        // t1: A and B tied in Italy -> tie-break picks A.
        // t2: B scores again -> B leads 2-1.
        let stream = vec![
            resolved(0, 0, "A", "Italy"),
            resolved(0, 10, "B", "Italy"),
            resolved(1, 0, "B", "Italy"),
        ];
        let timeline = DominanceEngine::fold(&stream);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].region_winners["Italy"], "A");
        assert_eq!(timeline[0].user_totals["A"], 1);
        assert_eq!(timeline[0].user_totals["B"], 1);
        assert_eq!(timeline[1].region_winners["Italy"], "B");
        assert_eq!(timeline[1].user_totals["B"], 2);
    }

    #[test]
    fn test_tie_break_is_lexicographic() {
        let stream = vec![
            resolved(0, 0, "zoe", "Italy"),
            resolved(1, 0, "anna", "Italy"),
        ];
        let timeline = DominanceEngine::fold(&stream);
        // zoe alone at t1.
        assert_eq!(timeline[0].region_winners["Italy"], "zoe");
        // 1-1 at t2: lexicographically smallest wins.
        assert_eq!(timeline[1].region_winners["Italy"], "anna");
    }

    #[test]
    fn test_untouched_region_keeps_its_winner() {
        let stream = vec![
            resolved(0, 0, "A", "Italy"),
            resolved(1, 0, "B", "France"),
        ];
        let timeline = DominanceEngine::fold(&stream);
        assert_eq!(timeline[1].region_winners["Italy"], "A");
        assert_eq!(timeline[1].region_winners["France"], "B");
    }

    #[test]
    fn test_unknown_region_counts_toward_totals_only() {
        let stream = vec![resolved(0, 0, "A", UNKNOWN_REGION)];
        let timeline = DominanceEngine::fold(&stream);
        assert_eq!(timeline[0].user_totals["A"], 1);
        assert!(timeline[0].region_winners.is_empty());
    }

    #[test]
    fn test_roster_seeded_before_first_score() {
        // B only scores at t2 but appears with 0 at t1.
        let stream = vec![
            resolved(0, 0, "A", "Italy"),
            resolved(1, 0, "B", "Italy"),
        ];
        let timeline = DominanceEngine::fold(&stream);
        assert_eq!(timeline[0].user_totals["B"], 0);
    }

    #[test]
    fn test_partial_consumption_is_valid_prefix() {
        let stream = vec![
            resolved(0, 0, "A", "Italy"),
            resolved(1, 0, "B", "Italy"),
            resolved(2, 0, "B", "France"),
        ];
        let full = DominanceEngine::fold(&stream);

        let mut engine = DominanceEngine::new();
        engine.seed_users(stream.iter().map(|r| r.event.user.as_str()));
        let prefix: Vec<Snapshot> = batches(&stream)
            .into_iter()
            .take(2)
            .map(|(minute, batch)| engine.apply_batch(minute, batch))
            .collect();
        assert_eq!(prefix[..], full[..2]);
    }

    fn arb_stream() -> impl Strategy<Value = Vec<ResolvedEvent>> {
        let entry = (0u32..30, 0u32..60, 0usize..4, 0usize..4);
        prop::collection::vec(entry, 0..80).prop_map(|mut entries| {
            const USERS: [&str; 4] = ["ada", "bea", "cleo", "dora"];
            const REGIONS: [&str; 4] = ["Italy", "France", "Spain", UNKNOWN_REGION];
            entries.sort_by_key(|&(minute, second, _, _)| (minute, second));
            entries
                .into_iter()
                .map(|(minute, second, user, region)| {
                    resolved(minute, second, USERS[user], REGIONS[region])
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn test_totals_monotonic_and_consistent(stream in arb_stream()) {
            let timeline = DominanceEngine::fold(&stream);
            prop_assert_eq!(
                timeline.len(),
                batches(&stream).len()
            );
            for pair in timeline.windows(2) {
                for (user, &count) in &pair[0].user_totals {
                    prop_assert!(pair[1].user_totals[user] >= count);
                }
            }
            // Final totals equal raw per-user event counts.
            if let Some(last) = timeline.last() {
                for (user, &total) in &last.user_totals {
                    let raw = stream.iter().filter(|r| &r.event.user == user).count() as u64;
                    prop_assert_eq!(total, raw);
                }
            }
        }

        #[test]
        fn test_winner_is_maximal_and_deterministic(stream in arb_stream()) {
            let timeline = DominanceEngine::fold(&stream);
            prop_assert_eq!(&timeline, &DominanceEngine::fold(&stream));

            // Replay tallies to check maximality at each step.
            let mut tallies: BTreeMap<&str, BTreeMap<&str, u64>> = BTreeMap::new();
            for ((_, batch), snap) in batches(&stream).into_iter().zip(&timeline) {
                for r in batch {
                    if r.region != UNKNOWN_REGION {
                        *tallies
                            .entry(r.region.as_str())
                            .or_default()
                            .entry(r.event.user.as_str())
                            .or_insert(0) += 1;
                    }
                }
                for (region, contenders) in &tallies {
                    let winner = &snap.region_winners[*region];
                    let top = contenders.values().max().copied().unwrap_or(0);
                    prop_assert_eq!(contenders[winner.as_str()], top);
                }
            }
        }
    }
}
