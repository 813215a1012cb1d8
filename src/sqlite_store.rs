use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};

use crate::fixtures::{FixtureSet, Match, Score, insert_match, normalize_team};
use crate::provider::DataProvider;
use crate::team_state::TeamStrength;

/// Relational provider over the application's sqlite file. Schema mirrors
/// what the surrounding tooling maintains: a `teams` table carrying ratings
/// and strengths, played `matches`, `future_matches`, and the real
/// `table_standings`.
pub struct SqliteStore {
    conn: Connection,
    league_ids: Vec<u32>,
}

impl SqliteStore {
    pub fn open(path: &Path, league_ids: Vec<u32>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)
            .with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self { conn, league_ids })
    }

    pub fn open_in_memory(league_ids: Vec<u32>) -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(Self { conn, league_ids })
    }

    fn league_placeholders(&self) -> String {
        vec!["?"; self.league_ids.len()].join(",")
    }

    fn league_values(&self) -> Vec<Value> {
        self.league_ids
            .iter()
            .map(|id| Value::Integer(*id as i64))
            .collect()
    }

    pub fn upsert_team(
        &self,
        name: &str,
        league_id: u32,
        rating: f64,
        strength: TeamStrength,
    ) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO teams (name, league_id, elo_rating, home_strength, away_strength)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(name) DO UPDATE SET
                    league_id = excluded.league_id,
                    elo_rating = excluded.elo_rating,
                    home_strength = excluded.home_strength,
                    away_strength = excluded.away_strength
                "#,
                params![
                    normalize_team(name),
                    league_id,
                    rating,
                    strength.home,
                    strength.away
                ],
            )
            .context("upsert team")?;
        Ok(())
    }

    /// Update only the strength columns, e.g. after re-deriving win
    /// fractions from fixtures.
    pub fn update_strengths(&self, strengths: &HashMap<String, TeamStrength>) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare("UPDATE teams SET home_strength = ?1, away_strength = ?2 WHERE name = ?3")
            .context("prepare strength update")?;
        for (team, strength) in strengths {
            stmt.execute(params![strength.home, strength.away, normalize_team(team)])
                .context("update team strengths")?;
        }
        Ok(())
    }

    pub fn insert_played_match(&self, m: &Match) -> Result<()> {
        let score = m
            .score
            .context("played match stored without a score")?;
        self.conn
            .execute(
                r#"
                INSERT INTO matches
                    (season, round, date, home_team, away_team, home_goals, away_goals, league_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    m.season,
                    m.round,
                    m.date.to_string(),
                    normalize_team(&m.home_team),
                    normalize_team(&m.away_team),
                    score.home,
                    score.away,
                    m.league_id
                ],
            )
            .context("insert match")?;
        Ok(())
    }

    pub fn insert_future_match(&self, m: &Match) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO future_matches (season, round, date, home_team, away_team, league_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    m.season,
                    m.round,
                    m.date.to_string(),
                    normalize_team(&m.home_team),
                    normalize_team(&m.away_team),
                    m.league_id
                ],
            )
            .context("insert future match")?;
        Ok(())
    }

    pub fn set_table_standings(
        &self,
        league_id: u32,
        standings: &HashMap<String, u32>,
    ) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                INSERT INTO table_standings (team, league_id, points)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(team, league_id) DO UPDATE SET points = excluded.points
                "#,
            )
            .context("prepare standings upsert")?;
        for (team, points) in standings {
            stmt.execute(params![normalize_team(team), league_id, points])
                .context("upsert standings row")?;
        }
        Ok(())
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS teams (
            name TEXT PRIMARY KEY,
            league_id INTEGER NOT NULL,
            elo_rating REAL NOT NULL,
            home_strength REAL NOT NULL DEFAULT 0,
            away_strength REAL NOT NULL DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS matches (
            season TEXT NOT NULL,
            round TEXT NOT NULL,
            date TEXT NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            home_goals INTEGER NOT NULL,
            away_goals INTEGER NOT NULL,
            league_id INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_league ON matches(league_id);
        CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(date);
        CREATE INDEX IF NOT EXISTS idx_matches_pairing ON matches(home_team, away_team);
        CREATE TABLE IF NOT EXISTS future_matches (
            season TEXT NOT NULL,
            round TEXT NOT NULL,
            date TEXT NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            league_id INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS table_standings (
            team TEXT NOT NULL,
            league_id INTEGER NOT NULL,
            points INTEGER NOT NULL,
            PRIMARY KEY (team, league_id)
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    raw.parse::<NaiveDate>()
        .with_context(|| format!("invalid date in db: {raw}"))
}

fn match_from_row(
    season: String,
    round: String,
    date: String,
    home_team: String,
    away_team: String,
    goals: Option<(u32, u32)>,
    league_id: u32,
) -> Result<Match> {
    let score = goals.map(|(home, away)| Score { home, away });
    Ok(Match {
        date: parse_date(&date)?,
        league_id,
        season,
        round,
        home_team: normalize_team(&home_team),
        away_team: normalize_team(&away_team),
        score,
        result: score.map(|s| s.result()),
    })
}

impl DataProvider for SqliteStore {
    fn fixtures(&self) -> Result<FixtureSet> {
        let sql = format!(
            r#"
            SELECT season, round, date, home_team, away_team, home_goals, away_goals, league_id
            FROM matches
            WHERE league_id IN ({})
            ORDER BY date ASC
            "#,
            self.league_placeholders()
        );
        let mut stmt = self.conn.prepare(&sql).context("prepare fixtures query")?;
        let rows = stmt
            .query_map(params_from_iter(self.league_values()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, u32>(5)?,
                    row.get::<_, u32>(6)?,
                    row.get::<_, u32>(7)?,
                ))
            })
            .context("query fixtures")?;

        let mut fixtures = FixtureSet::new();
        for row in rows {
            let (season, round, date, home, away, hg, ag, league_id) =
                row.context("read fixture row")?;
            insert_match(
                &mut fixtures,
                match_from_row(season, round, date, home, away, Some((hg, ag)), league_id)?,
            );
        }
        Ok(fixtures)
    }

    fn future_matches(&self) -> Result<FixtureSet> {
        let sql = format!(
            r#"
            SELECT season, round, date, home_team, away_team, league_id
            FROM future_matches
            WHERE league_id IN ({})
            ORDER BY date ASC
            "#,
            self.league_placeholders()
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare future matches query")?;
        let rows = stmt
            .query_map(params_from_iter(self.league_values()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, u32>(5)?,
                ))
            })
            .context("query future matches")?;

        let mut fixtures = FixtureSet::new();
        for row in rows {
            let (season, round, date, home, away, league_id) =
                row.context("read future match row")?;
            insert_match(
                &mut fixtures,
                match_from_row(season, round, date, home, away, None, league_id)?,
            );
        }
        Ok(fixtures)
    }

    fn team_ratings(&self) -> Result<HashMap<String, f64>> {
        let sql = format!(
            "SELECT name, elo_rating FROM teams WHERE league_id IN ({})",
            self.league_placeholders()
        );
        let mut stmt = self.conn.prepare(&sql).context("prepare ratings query")?;
        let rows = stmt
            .query_map(params_from_iter(self.league_values()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })
            .context("query ratings")?;

        let mut ratings = HashMap::new();
        for row in rows {
            let (name, rating) = row.context("read rating row")?;
            ratings.insert(normalize_team(&name), rating);
        }
        Ok(ratings)
    }

    fn team_strengths(&self) -> Result<HashMap<String, TeamStrength>> {
        let sql = format!(
            "SELECT name, home_strength, away_strength FROM teams WHERE league_id IN ({})",
            self.league_placeholders()
        );
        let mut stmt = self.conn.prepare(&sql).context("prepare strengths query")?;
        let rows = stmt
            .query_map(params_from_iter(self.league_values()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                ))
            })
            .context("query strengths")?;

        let mut strengths = HashMap::new();
        for row in rows {
            let (name, home, away) = row.context("read strength row")?;
            strengths.insert(normalize_team(&name), TeamStrength { home, away });
        }
        Ok(strengths)
    }

    fn head_to_head(&self, team_a: &str, team_b: &str) -> Result<Vec<Match>> {
        let sql = format!(
            r#"
            SELECT season, round, date, home_team, away_team, home_goals, away_goals, league_id
            FROM matches
            WHERE league_id IN ({})
              AND ((home_team = ? AND away_team = ?) OR (home_team = ? AND away_team = ?))
            ORDER BY date DESC
            "#,
            self.league_placeholders()
        );
        let a = normalize_team(team_a);
        let b = normalize_team(team_b);
        let mut values = self.league_values();
        values.push(Value::Text(a.clone()));
        values.push(Value::Text(b.clone()));
        values.push(Value::Text(b));
        values.push(Value::Text(a));

        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare head-to-head query")?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, u32>(5)?,
                    row.get::<_, u32>(6)?,
                    row.get::<_, u32>(7)?,
                ))
            })
            .context("query head-to-head matches")?;

        let mut matches = Vec::new();
        for row in rows {
            let (season, round, date, home, away, hg, ag, league_id) =
                row.context("read head-to-head row")?;
            matches.push(match_from_row(
                season,
                round,
                date,
                home,
                away,
                Some((hg, ag)),
                league_id,
            )?);
        }
        Ok(matches)
    }

    fn current_table(&self) -> Result<HashMap<String, u32>> {
        let sql = format!(
            "SELECT team, points FROM table_standings WHERE league_id IN ({})",
            self.league_placeholders()
        );
        let mut stmt = self.conn.prepare(&sql).context("prepare standings query")?;
        let rows = stmt
            .query_map(params_from_iter(self.league_values()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
            })
            .context("query standings")?;

        let mut table = HashMap::new();
        for row in rows {
            let (team, points) = row.context("read standings row")?;
            table.insert(normalize_team(&team), points);
        }
        Ok(table)
    }

    fn set_ratings(&self, ratings: &HashMap<String, f64>) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare("UPDATE teams SET elo_rating = ?1 WHERE name = ?2")
            .context("prepare rating update")?;
        for (team, rating) in ratings {
            stmt.execute(params![rating, normalize_team(team)])
                .context("update team rating")?;
        }
        Ok(())
    }
}
