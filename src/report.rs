use crate::probability::OutcomeProbs;
use crate::simulate::PositionDistribution;
use crate::team_state::TeamTable;

/// Probabilities below this render as "-" instead of a near-zero percentage.
const DISPLAY_FLOOR_PCT: f64 = 0.1;

/// Plain-text table of finishing-position probabilities, one row per team,
/// one column per rank. Rows are ordered by each team's probability vector
/// so the likely champion prints first.
pub fn rank_distribution_table(dist: &PositionDistribution) -> String {
    let name_width = dist
        .by_team
        .keys()
        .map(|t| t.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut rows: Vec<(&String, &Vec<f64>)> = dist.by_team.iter().collect();
    rows.sort_by(|a, b| {
        b.1.partial_cmp(a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });

    let mut out = String::new();
    out.push_str(&format!("{:<name_width$}", "Team"));
    for rank in 1..=dist.league_size {
        out.push_str(&format!(" {rank:>6}"));
    }
    out.push('\n');

    for (team, ranks) in rows {
        out.push_str(&format!("{team:<name_width$}"));
        for pct in ranks {
            if *pct < DISPLAY_FLOOR_PCT {
                out.push_str(&format!(" {:>6}", "-"));
            } else {
                out.push_str(&format!(" {pct:>5.1}%"));
            }
        }
        out.push('\n');
    }
    out
}

/// Teams by rating, best first. Ties keep alphabetical order.
pub fn rating_leaderboard(table: &TeamTable) -> String {
    let mut entries: Vec<(String, f64)> = table.ratings_map().into_iter().collect();
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    let name_width = entries.iter().map(|(t, _)| t.len()).max().unwrap_or(4).max(4);
    let mut out = String::new();
    for (i, (team, rating)) in entries.iter().enumerate() {
        out.push_str(&format!("{:>2}. {team:<name_width$} {rating:>7.1}\n", i + 1));
    }
    out
}

/// Single-fixture probability line for the inspection command.
pub fn matchup_line(home: &str, away: &str, probs: &OutcomeProbs) -> String {
    format!(
        "{home} vs {away}: home {:.1}%  draw {:.1}%  away {:.1}%",
        probs.home_win * 100.0,
        probs.draw * 100.0,
        probs.away_win * 100.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probability;
    use crate::model_params::ModelParams;
    use std::collections::BTreeMap;

    #[test]
    fn distribution_table_hides_negligible_cells() {
        let dist = PositionDistribution {
            trials: 1000,
            league_size: 2,
            by_team: BTreeMap::from([
                ("BRANN".to_string(), vec![99.96, 0.04]),
                ("VIKING".to_string(), vec![0.04, 99.96]),
            ]),
        };
        let table = rank_distribution_table(&dist);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        // Likely champion prints first, below-floor cells render as "-".
        assert!(lines[1].starts_with("BRANN"));
        assert!(lines[1].contains('-'));
        assert!(lines[1].contains("100.0%"));
    }

    #[test]
    fn leaderboard_sorts_by_rating_descending() {
        let mut table = TeamTable::default();
        table.set_rating("VIKING", 1450.0);
        table.set_rating("BRANN", 1550.0);
        let board = rating_leaderboard(&table);
        let lines: Vec<&str> = board.lines().collect();
        assert!(lines[0].contains("BRANN"));
        assert!(lines[1].contains("VIKING"));
    }

    #[test]
    fn matchup_line_reports_all_three_outcomes() {
        let params = ModelParams::default();
        let probs = probability::match_probabilities(&params, 1500.0, 1500.0, 0.0, 0.0);
        let line = matchup_line("BRANN", "VIKING", &probs);
        assert!(line.contains("home"));
        assert!(line.contains("draw"));
        assert!(line.contains("away"));
    }
}
