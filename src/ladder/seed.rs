//! Initial ladder order, before any match is replayed.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::warn;

use super::eligibility;
use crate::config::LadderConfig;
use crate::models::{Competitor, CompetitorId, LadderKey};

/// One ladder's order. Position is the only source of rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ladder {
    pub key: LadderKey,
    pub order: Vec<CompetitorId>,
}

impl Ladder {
    pub fn position(&self, id: &CompetitorId) -> Option<usize> {
        self.order.iter().position(|c| c == id)
    }
}

/// Seeded ladders plus the roster they were built from.
#[derive(Debug, Clone)]
pub struct SeededBoard {
    /// Ladders in display order
    pub ladders: Vec<Ladder>,
    pub roster: HashMap<CompetitorId, Competitor>,
}

impl SeededBoard {
    pub fn ladder(&self, key: &LadderKey) -> Option<&Ladder> {
        self.ladders.iter().find(|l| &l.key == key)
    }

    pub fn competitor(&self, id: &CompetitorId) -> Option<&Competitor> {
        self.roster.get(id)
    }
}

/// Seed order: declared rank ascending (unranked last), then name, then id.
fn seed_order(a: &Competitor, b: &Competitor) -> Ordering {
    let rank = |c: &Competitor| c.seed_rank.unwrap_or(u32::MAX);
    rank(a)
        .cmp(&rank(b))
        .then_with(|| a.seed_rank.is_none().cmp(&b.seed_rank.is_none()))
        .then_with(|| compare_names(&a.name, &b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Case-insensitive name comparison with a case-sensitive tie-break.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Build every configured ladder from the active, eligible competitors.
///
/// Competitors repeating an earlier id are ignored so that no ladder ever
/// lists the same id twice.
pub fn seed_ladders(config: &LadderConfig, competitors: &[Competitor]) -> SeededBoard {
    let mut roster: HashMap<CompetitorId, Competitor> = HashMap::new();
    let mut members: HashMap<LadderKey, Vec<&Competitor>> = HashMap::new();

    for competitor in competitors {
        if roster.contains_key(&competitor.id) {
            warn!("Duplicate competitor id {}, keeping the first row", competitor.id);
            continue;
        }
        roster.insert(competitor.id.clone(), competitor.clone());

        if !competitor.active {
            continue;
        }
        for key in eligibility::resolve(config, &competitor.base_class) {
            members.entry(key).or_default().push(competitor);
        }
    }

    let ladders = config
        .ladder_keys()
        .into_iter()
        .map(|key| {
            let mut list = members.remove(&key).unwrap_or_default();
            list.sort_by(|a, b| seed_order(a, b));
            Ladder {
                order: list.into_iter().map(|c| c.id.clone()).collect(),
                key,
            }
        })
        .collect();

    SeededBoard { ladders, roster }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Arm;
    use pretty_assertions::assert_eq;

    fn ids(ladder: &Ladder) -> Vec<&str> {
        ladder.order.iter().map(|id| id.as_str()).collect()
    }

    #[test]
    fn test_seed_by_rank_then_name() {
        let competitors = vec![
            Competitor::new("cara", "Cara", "u60kg").with_seed_rank(3),
            Competitor::new("bob", "Bob", "u60kg"),
            Competitor::new("alice", "Alice", "u60kg").with_seed_rank(1),
            Competitor::new("abe", "abe", "u60kg"),
        ];

        let board = seed_ladders(&LadderConfig::default(), &competitors);
        let ladder = board.ladder(&LadderKey::new("u60kg", Arm::Right)).unwrap();

        // Unranked competitors trail the ranked ones, ordered by name
        assert_eq!(ids(ladder), vec!["alice", "cara", "abe", "bob"]);
    }

    #[test]
    fn test_inactive_competitors_are_left_off() {
        let competitors = vec![
            Competitor::new("alice", "Alice", "u75kg").with_seed_rank(1),
            Competitor::new("dan", "Dan", "u75kg").with_seed_rank(2).with_active(false),
        ];

        let board = seed_ladders(&LadderConfig::default(), &competitors);
        for ladder in &board.ladders {
            assert!(ladder.position(&CompetitorId::from("dan")).is_none());
        }
        // Still in the roster for name lookups
        assert!(board.competitor(&CompetitorId::from("dan")).is_some());
    }

    #[test]
    fn test_cascade_into_heavier_ladders() {
        let competitors = vec![
            Competitor::new("light", "Light", "u60kg").with_seed_rank(2),
            Competitor::new("heavy", "Heavy", "u85kg").with_seed_rank(1),
        ];

        let board = seed_ladders(&LadderConfig::default(), &competitors);

        let u60 = board.ladder(&LadderKey::new("u60kg", Arm::Left)).unwrap();
        assert_eq!(ids(u60), vec!["light"]);

        let u85 = board.ladder(&LadderKey::new("u85kg", Arm::Left)).unwrap();
        assert_eq!(ids(u85), vec!["heavy", "light"]);

        let open = board.ladder(&LadderKey::new("Open", Arm::Right)).unwrap();
        assert_eq!(ids(open), vec!["heavy", "light"]);
    }

    #[test]
    fn test_unknown_class_on_no_ladder() {
        let competitors = vec![Competitor::new("x", "X", "heavyweight").with_seed_rank(1)];
        let board = seed_ladders(&LadderConfig::default(), &competitors);

        assert_eq!(board.ladders.len(), 8);
        assert!(board.ladders.iter().all(|l| l.order.is_empty()));
    }

    #[test]
    fn test_duplicate_ids_kept_once() {
        let competitors = vec![
            Competitor::new("alice", "Alice", "Open").with_seed_rank(1),
            Competitor::new("alice", "Alice Again", "Open").with_seed_rank(2),
        ];

        let board = seed_ladders(&LadderConfig::default(), &competitors);
        let open = board.ladder(&LadderKey::new("Open", Arm::Left)).unwrap();

        assert_eq!(ids(open), vec!["alice"]);
        assert_eq!(board.competitor(&CompetitorId::from("alice")).unwrap().name, "Alice");
    }

    #[test]
    fn test_compare_names_ignores_case() {
        assert_eq!(compare_names("alice", "Bob"), Ordering::Less);
        assert_eq!(compare_names("Bob", "alice"), Ordering::Greater);
    }
}
