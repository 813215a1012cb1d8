use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::fixtures::{FixtureSet, Match, MatchResult, Score, insert_match};
use crate::processor::strengths_from_fixtures;
use crate::provider::DataProvider;
use crate::team_state::TeamStrength;

/// Provider over plain in-memory collections. Backs the demo mode and most
/// of the integration tests; no storage, no network.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub played: Vec<Match>,
    pub future: Vec<Match>,
    pub ratings: HashMap<String, f64>,
    pub strengths: HashMap<String, TeamStrength>,
    pub table: HashMap<String, u32>,
    saved_ratings: Mutex<HashMap<String, f64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ratings handed to `set_ratings`, for asserting persistence behavior.
    pub fn saved_ratings(&self) -> HashMap<String, f64> {
        self.saved_ratings.lock().expect("ratings lock").clone()
    }
}

fn group(matches: &[Match]) -> FixtureSet {
    let mut fixtures = FixtureSet::new();
    for m in matches {
        insert_match(&mut fixtures, m.clone());
    }
    fixtures
}

impl DataProvider for MemoryStore {
    fn fixtures(&self) -> Result<FixtureSet> {
        Ok(group(&self.played))
    }

    fn future_matches(&self) -> Result<FixtureSet> {
        Ok(group(&self.future))
    }

    fn team_ratings(&self) -> Result<HashMap<String, f64>> {
        Ok(self.ratings.clone())
    }

    fn team_strengths(&self) -> Result<HashMap<String, TeamStrength>> {
        Ok(self.strengths.clone())
    }

    fn head_to_head(&self, team_a: &str, team_b: &str) -> Result<Vec<Match>> {
        Ok(self
            .played
            .iter()
            .filter(|m| {
                (m.home_team == team_a && m.away_team == team_b)
                    || (m.home_team == team_b && m.away_team == team_a)
            })
            .cloned()
            .collect())
    }

    fn current_table(&self) -> Result<HashMap<String, u32>> {
        Ok(self.table.clone())
    }

    fn set_ratings(&self, ratings: &HashMap<String, f64>) -> Result<()> {
        *self.saved_ratings.lock().expect("ratings lock") = ratings.clone();
        Ok(())
    }
}

const DEMO_TEAMS: [&str; 8] = [
    "BODO/GLIMT",
    "BRANN",
    "LILLESTROM",
    "MOLDE",
    "ROSENBORG",
    "TROMSO",
    "VALERENGA",
    "VIKING",
];

const DEMO_LEAGUE: u32 = 103;
const DEMO_SEASON: &str = "2025";

/// Build a synthetic one-league season so the binary runs without a
/// database: a double round robin where the first nine rounds are played
/// (scores drawn from a seeded generator, biased by a quality ladder) and
/// the last five remain to be simulated. Strengths and the current table
/// are derived from the played part, ratings are left for the processor.
pub fn demo_league(seed: u64) -> MemoryStore {
    let mut rng = StdRng::seed_from_u64(seed);
    let start: NaiveDate = "2025-03-30".parse().expect("valid demo start date");
    let played_rounds = 9;

    let mut store = MemoryStore::new();
    for (round_idx, pairings) in double_round_robin(DEMO_TEAMS.len()).iter().enumerate() {
        let date = start + Duration::weeks(round_idx as i64);
        for &(home, away) in pairings {
            let mut m = Match {
                date,
                league_id: DEMO_LEAGUE,
                season: DEMO_SEASON.to_string(),
                round: format!("Round {}", round_idx + 1),
                home_team: DEMO_TEAMS[home].to_string(),
                away_team: DEMO_TEAMS[away].to_string(),
                score: None,
                result: None,
            };
            if round_idx < played_rounds {
                // Quality ladder: lower index, better team. One bonus goal
                // for the better side keeps the table from being pure noise.
                let mut home_goals = rng.gen_range(0..3);
                let mut away_goals = rng.gen_range(0..3);
                if home < away {
                    home_goals += 1;
                } else {
                    away_goals += 1;
                }
                let score = Score {
                    home: home_goals,
                    away: away_goals,
                };
                m.score = Some(score);
                m.result = Some(score.result());
                store.played.push(m);
            } else {
                store.future.push(m);
            }
        }
    }

    let fixtures = group(&store.played);
    store.strengths = strengths_from_fixtures(&fixtures);

    let mut table: HashMap<String, u32> = DEMO_TEAMS
        .iter()
        .map(|t| (t.to_string(), 0))
        .collect();
    for m in &store.played {
        match m.result {
            Some(MatchResult::Home) => *table.get_mut(&m.home_team).expect("demo team") += 3,
            Some(MatchResult::Away) => *table.get_mut(&m.away_team).expect("demo team") += 3,
            Some(MatchResult::Draw) => {
                *table.get_mut(&m.home_team).expect("demo team") += 1;
                *table.get_mut(&m.away_team).expect("demo team") += 1;
            }
            None => {}
        }
    }
    store.table = table;
    store
}

/// Circle-method schedule: n-1 rounds of n/2 pairings, then the mirror with
/// venues swapped. `n` must be even.
fn double_round_robin(n: usize) -> Vec<Vec<(usize, usize)>> {
    let mut rounds = Vec::new();
    let mut rotation: Vec<usize> = (1..n).collect();

    for round in 0..n - 1 {
        let mut pairings = Vec::new();
        let line: Vec<usize> = std::iter::once(0).chain(rotation.iter().copied()).collect();
        for i in 0..n / 2 {
            let (a, b) = (line[i], line[n - 1 - i]);
            // Alternate venues so no side plays home every round.
            if round % 2 == 0 {
                pairings.push((a, b));
            } else {
                pairings.push((b, a));
            }
        }
        rounds.push(pairings);
        rotation.rotate_right(1);
    }

    let second_half: Vec<Vec<(usize, usize)>> = rounds
        .iter()
        .map(|pairings| pairings.iter().map(|&(h, a)| (a, h)).collect())
        .collect();
    rounds.extend(second_half);
    rounds
}
