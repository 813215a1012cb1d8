use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tabelltips::form;
use tabelltips::memory_store;
use tabelltips::model_params::{self, DecayAnchor};
use tabelltips::probability;
use tabelltips::processor::{self, strengths_from_fixtures};
use tabelltips::provider::DataProvider;
use tabelltips::report;
use tabelltips::simulate::SeasonSimulator;
use tabelltips::sqlite_store::SqliteStore;
use tabelltips::team_state::TeamTable;
use tabelltips::{elo, fixtures, h2h};

const DEFAULT_LEAGUE_IDS: &[u32] = &[103];
const DEFAULT_TRIALS: usize = 1000;
const DEFAULT_PARAMS_PATH: &str = "model_params.json";

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if has_flag("--help") || has_flag("-h") {
        print_usage();
        return Ok(());
    }
    run()
}

fn run() -> Result<()> {
    let league_ids = parse_league_ids_arg().unwrap_or_else(|| DEFAULT_LEAGUE_IDS.to_vec());
    if league_ids.is_empty() {
        return Err(anyhow!("no league ids resolved"));
    }

    let params_path = parse_string_arg("--params")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PARAMS_PATH));
    let mut params = model_params::load_params(&params_path);
    if let Some(anchor) = parse_string_arg("--anchor") {
        let date = anchor
            .parse()
            .with_context(|| format!("invalid --anchor date: {anchor}"))?;
        params.decay_anchor = DecayAnchor::Fixed(date);
    }

    let trials = parse_usize_arg("--trials")
        .or_else(|| std::env::var("SIM_TRIALS").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(DEFAULT_TRIALS);
    let seed = parse_u64_arg("--seed");

    let demo_store;
    let sqlite;
    let provider: &dyn DataProvider = if has_flag("--demo") {
        demo_store = memory_store::demo_league(seed.unwrap_or(2025));
        &demo_store
    } else {
        let db_path = parse_string_arg("--db")
            .or_else(|| std::env::var("TABELLTIPS_DB").ok())
            .map(PathBuf::from);
        let Some(db_path) = db_path else {
            bail!("no data source: pass --db <sqlite file>, set TABELLTIPS_DB, or use --demo");
        };
        if !db_path.exists() {
            bail!(
                "sqlite db not found at {} (use --demo to run without one)",
                db_path.display()
            );
        }
        sqlite = SqliteStore::open(&db_path, league_ids.clone())?;
        &sqlite
    };

    let played = provider.fixtures()?;
    let ratings = provider.team_ratings()?;
    let mut strengths = provider.team_strengths()?;
    if has_flag("--refresh-strengths") || strengths.is_empty() {
        strengths = strengths_from_fixtures(&played);
        info!(teams = strengths.len(), "derived strengths from fixtures");
    }

    let primary_league = league_ids[0];
    let mut table = TeamTable::from_seed(&ratings, &strengths, &params, primary_league);
    let processed = processor::process_seasons(&mut table, &played, &params);
    if processed == 0 {
        bail!("no played matches found for leagues {league_ids:?}");
    }
    provider.set_ratings(&table.ratings_map())?;

    println!("Ratings after {processed} matches:");
    print!("{}", report::rating_leaderboard(&table));

    if let Some((home, away)) = parse_matchup_arg() {
        let home = fixtures::normalize_team(&home);
        let away = fixtures::normalize_team(&away);
        let form = form::init_form(&played, &table, &params);
        let rating_home = table
            .rating(&home)
            .ok_or_else(|| anyhow!("unknown team: {home}"))?
            + form.form(&home) * params.form_boost;
        let rating_away = table
            .rating(&away)
            .ok_or_else(|| anyhow!("unknown team: {away}"))?
            + form.form(&away) * params.form_boost;
        let (home_strength, away_strength) = table.matchup_strengths(&home, &away);
        let advantage = elo::home_advantage(home_strength, away_strength);
        let history = provider.head_to_head(&home, &away)?;
        let nudge = h2h::h2h_adjustment(&history, &home, &params);
        let probs =
            probability::match_probabilities(&params, rating_home, rating_away, advantage, nudge);
        println!("{}", report::matchup_line(&home, &away, &probs));
        return Ok(());
    }

    let form = form::init_form(&played, &table, &params);
    let sim = SeasonSimulator::from_provider(provider, table, form, params)?;
    if sim.remaining_fixtures().is_empty() {
        info!("no remaining fixtures, skipping simulation");
        return Ok(());
    }

    let dist = sim.run(trials, seed);
    println!();
    println!("Finishing positions over {trials} trials:");
    print!("{}", report::rank_distribution_table(&dist));
    Ok(())
}

fn print_usage() {
    println!(
        "tabelltips - league rating and season simulation

Usage: tabelltips [options]

  --demo                  run on a built-in synthetic league, no db needed
  --db <path>             sqlite database (or TABELLTIPS_DB env var)
  --league-ids <ids>      comma-separated league ids, default 103
  --trials <n>            simulation trials, default 1000 (SIM_TRIALS env)
  --seed <n>              fix the random seed for reproducible output
  --anchor <yyyy-mm-dd>   pin the rating decay reference date
  --params <path>         model parameter json, default model_params.json
  --match <HOME> <AWAY>   print one fixture's probabilities and exit
  --refresh-strengths     rederive home/away strengths from fixtures"
    );
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}

fn parse_string_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}=")) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn parse_usize_arg(name: &str) -> Option<usize> {
    parse_string_arg(name)?.parse().ok()
}

fn parse_u64_arg(name: &str) -> Option<u64> {
    parse_string_arg(name)?.parse().ok()
}

fn parse_league_ids_arg() -> Option<Vec<u32>> {
    let raw = parse_string_arg("--league-ids")?;
    let ids: Vec<u32> = raw
        .split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect();
    if ids.is_empty() { None } else { Some(ids) }
}

fn parse_matchup_arg() -> Option<(String, String)> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let idx = args.iter().position(|arg| arg == "--match")?;
    let home = args.get(idx + 1)?;
    let away = args.get(idx + 2)?;
    Some((home.clone(), away.clone()))
}
