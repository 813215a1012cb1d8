use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::info;

use crate::elo;
use crate::fixtures::{Match, MatchResult, Score, flatten_by_date};
use crate::form::FormState;
use crate::h2h;
use crate::model_params::ModelParams;
use crate::probability;
use crate::provider::DataProvider;
use crate::team_state::TeamTable;

/// Placeholder scorelines for simulated outcomes. Only the goal-difference
/// sign ever reaches the rating math, so the exact numbers are irrelevant.
const SIM_SCORE_HOME: Score = Score { home: 2, away: 1 };
const SIM_SCORE_DRAW: Score = Score { home: 1, away: 1 };
const SIM_SCORE_AWAY: Score = Score { home: 1, away: 2 };

/// Per-team histogram of finishing ranks across all trials, as percentages.
/// Every rank 1..=league size is present even at 0%.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionDistribution {
    pub trials: usize,
    pub league_size: usize,
    /// team -> percentages indexed by rank - 1. BTreeMap for deterministic
    /// iteration in reports and comparisons.
    pub by_team: BTreeMap<String, Vec<f64>>,
}

impl PositionDistribution {
    pub fn probability(&self, team: &str, rank: usize) -> f64 {
        self.by_team
            .get(team)
            .and_then(|ranks| ranks.get(rank.checked_sub(1)?))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Monte Carlo season simulator. Holds the canonical state read-only; every
/// trial works on its own deep copy, so trials never contaminate each other
/// or the canonical ratings.
pub struct SeasonSimulator {
    params: ModelParams,
    table: TeamTable,
    form: FormState,
    remaining: Vec<Match>,
    current_points: HashMap<String, u32>,
    /// Head-to-head nudge per (home, away) pairing, precomputed once: it
    /// depends only on immutable history, never on trial state.
    h2h_by_pairing: HashMap<(String, String), f64>,
}

impl SeasonSimulator {
    /// Assemble a simulator from canonical state plus the provider's view of
    /// the remaining fixtures, the real table, and head-to-head history.
    pub fn from_provider(
        provider: &dyn DataProvider,
        table: TeamTable,
        form: FormState,
        params: ModelParams,
    ) -> Result<Self> {
        let future = provider.future_matches()?;
        let remaining: Vec<Match> = flatten_by_date(&future).into_iter().cloned().collect();
        let current_points = provider.current_table()?;

        let mut h2h_by_pairing = HashMap::new();
        for m in &remaining {
            let key = (m.home_team.clone(), m.away_team.clone());
            if h2h_by_pairing.contains_key(&key) {
                continue;
            }
            let history = provider.head_to_head(&m.home_team, &m.away_team)?;
            let adjustment = h2h::h2h_adjustment(&history, &m.home_team, &params);
            h2h_by_pairing.insert(key, adjustment);
        }

        Ok(Self::new(
            params,
            table,
            form,
            remaining,
            current_points,
            h2h_by_pairing,
        ))
    }

    pub fn new(
        params: ModelParams,
        table: TeamTable,
        form: FormState,
        mut remaining: Vec<Match>,
        current_points: HashMap<String, u32>,
        h2h_by_pairing: HashMap<(String, String), f64>,
    ) -> Self {
        // Path-dependence again: simulated updates must run in date order.
        remaining.sort_by_key(|m| m.date);
        Self {
            params,
            table,
            form,
            remaining,
            current_points,
            h2h_by_pairing,
        }
    }

    pub fn remaining_fixtures(&self) -> &[Match] {
        &self.remaining
    }

    /// Run `trials` independent trials. With `seed` supplied (and a fixed
    /// decay anchor in the params) the whole distribution is reproducible:
    /// trial i always draws from `StdRng` seeded `seed + i`, regardless of
    /// how rayon schedules the work.
    pub fn run(&self, trials: usize, seed: Option<u64>) -> PositionDistribution {
        let base_seed = seed.unwrap_or_else(|| rand::thread_rng().r#gen());
        info!(
            trials,
            remaining = self.remaining.len(),
            base_seed,
            "simulating season outcomes"
        );

        let tallies: Vec<HashMap<String, u32>> = (0..trials)
            .into_par_iter()
            .map(|trial| {
                let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(trial as u64));
                self.run_trial(&mut rng)
            })
            .collect();

        self.aggregate(&tallies)
    }

    /// One full pass over the remaining fixtures against trial-private
    /// clones of ratings, form, and gain windows.
    fn run_trial(&self, rng: &mut StdRng) -> HashMap<String, u32> {
        let mut ratings = self.table.clone();
        let mut form = self.form.clone();
        let mut points = self.current_points.clone();
        for m in &self.remaining {
            points.entry(m.home_team.clone()).or_insert(0);
            points.entry(m.away_team.clone()).or_insert(0);
        }

        for m in &self.remaining {
            let base = self.params.base_rating(m.league_id);
            let rating_home = ratings.rating_or_init(&m.home_team, base);
            let rating_away = ratings.rating_or_init(&m.away_team, base);
            let (home_strength, away_strength) =
                ratings.matchup_strengths(&m.home_team, &m.away_team);

            let adjusted_home = rating_home + form.form(&m.home_team) * self.params.form_boost;
            let adjusted_away = rating_away + form.form(&m.away_team) * self.params.form_boost;
            let advantage = elo::home_advantage(home_strength, away_strength);
            let h2h_adjustment = self
                .h2h_by_pairing
                .get(&(m.home_team.clone(), m.away_team.clone()))
                .copied()
                .unwrap_or(0.0);

            let probs = probability::match_probabilities(
                &self.params,
                adjusted_home,
                adjusted_away,
                advantage,
                h2h_adjustment,
            );

            let roll: f64 = rng.r#gen();
            let score = if roll < probs.home_win {
                SIM_SCORE_HOME
            } else if roll < probs.home_win + probs.draw {
                SIM_SCORE_DRAW
            } else {
                SIM_SCORE_AWAY
            };
            let result = score.result();

            match result {
                MatchResult::Home => *points.get_mut(&m.home_team).expect("tallied") += 3,
                MatchResult::Away => *points.get_mut(&m.away_team).expect("tallied") += 3,
                MatchResult::Draw => {
                    *points.get_mut(&m.home_team).expect("tallied") += 1;
                    *points.get_mut(&m.away_team).expect("tallied") += 1;
                }
            }

            // Feed the simulated result back through the rating engine and
            // form tracker so later fixtures in this trial see it. This time
            // the ratings do advance.
            let update = elo::update_match(
                &self.params,
                result,
                m.date,
                m.league_id,
                rating_home,
                rating_away,
                home_strength,
                away_strength,
            );
            ratings.set_rating(&m.home_team, update.home);
            ratings.set_rating(&m.away_team, update.away);
            form.record_gain(&m.home_team, update.gain_home);
            form.record_gain(&m.away_team, update.gain_away);
        }

        points
    }

    /// Rank every trial's tally and convert rank frequencies to percentages.
    /// Ties break by the stable alphabetical team order; deliberately no
    /// goal-difference tiebreak, simulated scorelines carry no real margins.
    fn aggregate(&self, tallies: &[HashMap<String, u32>]) -> PositionDistribution {
        let mut teams: Vec<String> = self.current_points.keys().cloned().collect();
        for m in &self.remaining {
            teams.push(m.home_team.clone());
            teams.push(m.away_team.clone());
        }
        teams.sort();
        teams.dedup();

        let league_size = teams.len();
        let mut counts: BTreeMap<String, Vec<u32>> = teams
            .iter()
            .map(|t| (t.clone(), vec![0; league_size]))
            .collect();

        for tally in tallies {
            let mut standings: Vec<(&String, u32)> = teams
                .iter()
                .map(|t| (t, tally.get(t).copied().unwrap_or(0)))
                .collect();
            standings.sort_by(|a, b| b.1.cmp(&a.1));
            for (position, (team, _)) in standings.iter().enumerate() {
                counts.get_mut(*team).expect("known team")[position] += 1;
            }
        }

        let trials = tallies.len();
        let by_team = counts
            .into_iter()
            .map(|(team, ranks)| {
                let percentages = ranks
                    .into_iter()
                    .map(|count| {
                        if trials == 0 {
                            0.0
                        } else {
                            count as f64 / trials as f64 * 100.0
                        }
                    })
                    .collect();
                (team, percentages)
            })
            .collect();

        PositionDistribution {
            trials,
            league_size,
            by_team,
        }
    }
}
