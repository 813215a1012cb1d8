use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Outcome of a played match, derived from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Home,
    Draw,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    pub fn result(&self) -> MatchResult {
        if self.home > self.away {
            MatchResult::Home
        } else if self.home < self.away {
            MatchResult::Away
        } else {
            MatchResult::Draw
        }
    }
}

/// One fixture. Historical matches carry a score and result; future matches
/// carry neither and are only ever simulated, never written back into history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub date: NaiveDate,
    pub league_id: u32,
    pub season: String,
    pub round: String,
    pub home_team: String,
    pub away_team: String,
    pub score: Option<Score>,
    pub result: Option<MatchResult>,
}

impl Match {
    pub fn played(&self) -> bool {
        self.result.is_some()
    }

    /// Result from the given team's perspective: +1 win, 0 draw or not
    /// involved, -1 loss.
    pub fn result_for(&self, team: &str) -> i32 {
        let Some(result) = self.result else {
            return 0;
        };
        match result {
            MatchResult::Home if self.home_team == team => 1,
            MatchResult::Home if self.away_team == team => -1,
            MatchResult::Away if self.away_team == team => 1,
            MatchResult::Away if self.home_team == team => -1,
            _ => 0,
        }
    }
}

/// season -> round -> matches. BTreeMap keeps season iteration ascending;
/// round labels come back in source order, so date sorting happens in
/// `flatten_by_date`, not here.
pub type FixtureSet = BTreeMap<String, BTreeMap<String, Vec<Match>>>;

/// Team names act as identity keys everywhere, normalized once at the edge.
pub fn normalize_team(name: &str) -> String {
    name.trim().to_uppercase()
}

/// All matches across seasons and rounds in non-decreasing date order.
/// Rating updates are path-dependent, so every consumer that replays history
/// must go through this rather than trusting round label order.
pub fn flatten_by_date(fixtures: &FixtureSet) -> Vec<&Match> {
    let mut all: Vec<&Match> = fixtures
        .values()
        .flat_map(|rounds| rounds.values())
        .flatten()
        .collect();
    all.sort_by_key(|m| m.date);
    all
}

/// Insert a match under its season/round keys.
pub fn insert_match(fixtures: &mut FixtureSet, m: Match) {
    fixtures
        .entry(m.season.clone())
        .or_default()
        .entry(m.round.clone())
        .or_default()
        .push(m);
}
