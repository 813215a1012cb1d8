use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model_params::ModelParams;

/// Empirical home/away win fractions, both in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamStrength {
    pub home: f64,
    pub away: f64,
}

/// Mutable per-team state as a plain value type. Cloning a `TeamTable` is a
/// full structural copy, which is what makes simulation trials safe to run
/// off private snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamState {
    pub rating: f64,
    pub home_strength: f64,
    pub away_strength: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TeamTable {
    teams: HashMap<String, TeamState>,
}

impl TeamTable {
    /// Build the canonical table from provider seed data. Teams present in
    /// only one of the two maps still get an entry; the gaps default to the
    /// league base rating or zero strength when first touched.
    pub fn from_seed(
        ratings: &HashMap<String, f64>,
        strengths: &HashMap<String, TeamStrength>,
        params: &ModelParams,
        league_id: u32,
    ) -> Self {
        let mut teams: HashMap<String, TeamState> = HashMap::new();
        for (name, strength) in strengths {
            teams.insert(
                name.clone(),
                TeamState {
                    rating: params.base_rating(league_id),
                    home_strength: strength.home,
                    away_strength: strength.away,
                },
            );
        }
        for (name, rating) in ratings {
            teams
                .entry(name.clone())
                .and_modify(|t| t.rating = *rating)
                .or_insert(TeamState {
                    rating: *rating,
                    home_strength: 0.0,
                    away_strength: 0.0,
                });
        }
        Self { teams }
    }

    /// Rating for a team, inserting the league base rating first if the team
    /// has never been seen. Unknown teams are never an error.
    pub fn rating_or_init(&mut self, team: &str, base_rating: f64) -> f64 {
        self.teams
            .entry(team.to_string())
            .or_insert(TeamState {
                rating: base_rating,
                home_strength: 0.0,
                away_strength: 0.0,
            })
            .rating
    }

    pub fn rating(&self, team: &str) -> Option<f64> {
        self.teams.get(team).map(|t| t.rating)
    }

    pub fn set_rating(&mut self, team: &str, rating: f64) {
        if let Some(state) = self.teams.get_mut(team) {
            state.rating = rating;
        } else {
            self.teams.insert(
                team.to_string(),
                TeamState {
                    rating,
                    home_strength: 0.0,
                    away_strength: 0.0,
                },
            );
        }
    }

    /// Home strength of one team and away strength of the other. Teams
    /// missing from the strength data degrade to zero advantage.
    pub fn matchup_strengths(&self, home_team: &str, away_team: &str) -> (f64, f64) {
        let home = self
            .teams
            .get(home_team)
            .map(|t| t.home_strength)
            .unwrap_or(0.0);
        let away = self
            .teams
            .get(away_team)
            .map(|t| t.away_strength)
            .unwrap_or(0.0);
        (home, away)
    }

    pub fn set_strengths(&mut self, team: &str, strength: TeamStrength, fallback_rating: f64) {
        self.teams
            .entry(team.to_string())
            .and_modify(|t| {
                t.home_strength = strength.home;
                t.away_strength = strength.away;
            })
            .or_insert(TeamState {
                rating: fallback_rating,
                home_strength: strength.home,
                away_strength: strength.away,
            });
    }

    pub fn contains(&self, team: &str) -> bool {
        self.teams.contains_key(team)
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn team_names(&self) -> impl Iterator<Item = &String> {
        self.teams.keys()
    }

    pub fn ratings_map(&self) -> HashMap<String, f64> {
        self.teams
            .iter()
            .map(|(name, state)| (name.clone(), state.rating))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_merges_ratings_and_strengths() {
        let params = ModelParams::default();
        let ratings = HashMap::from([("BRANN".to_string(), 1550.0)]);
        let strengths = HashMap::from([
            (
                "BRANN".to_string(),
                TeamStrength {
                    home: 0.6,
                    away: 0.3,
                },
            ),
            (
                "VIKING".to_string(),
                TeamStrength {
                    home: 0.5,
                    away: 0.4,
                },
            ),
        ]);

        let table = TeamTable::from_seed(&ratings, &strengths, &params, 103);
        assert_eq!(table.rating("BRANN"), Some(1550.0));
        // Strength-only team falls back to the tier base rating.
        assert_eq!(table.rating("VIKING"), Some(1500.0));
        assert_eq!(table.matchup_strengths("BRANN", "VIKING"), (0.6, 0.4));
    }

    #[test]
    fn unknown_team_is_initialized_not_rejected() {
        let mut table = TeamTable::default();
        assert_eq!(table.rating_or_init("MJONDALEN", 1250.0), 1250.0);
        assert!(table.contains("MJONDALEN"));
    }

    #[test]
    fn missing_strengths_degrade_to_zero() {
        let table = TeamTable::default();
        assert_eq!(table.matchup_strengths("A", "B"), (0.0, 0.0));
    }

    #[test]
    fn clone_is_a_structural_copy() {
        let mut canonical = TeamTable::default();
        canonical.set_rating("BRANN", 1500.0);

        let mut trial = canonical.clone();
        trial.set_rating("BRANN", 1700.0);

        assert_eq!(canonical.rating("BRANN"), Some(1500.0));
        assert_eq!(trial.rating("BRANN"), Some(1700.0));
    }
}
