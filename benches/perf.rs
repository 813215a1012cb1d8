use std::collections::HashMap;

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use tabelltips::form;
use tabelltips::memory_store::demo_league;
use tabelltips::model_params::{DecayAnchor, ModelParams};
use tabelltips::processor;
use tabelltips::provider::DataProvider;
use tabelltips::simulate::SeasonSimulator;
use tabelltips::team_state::TeamTable;

fn bench_params() -> ModelParams {
    ModelParams {
        decay_anchor: DecayAnchor::Fixed("2025-09-01".parse().unwrap()),
        ..ModelParams::default()
    }
}

fn bench_history_replay(c: &mut Criterion) {
    let store = demo_league(17);
    let params = bench_params();
    let played = store.fixtures().unwrap();
    let strengths = store.team_strengths().unwrap();

    c.bench_function("history_replay", |b| {
        b.iter(|| {
            let mut table = TeamTable::from_seed(&HashMap::new(), &strengths, &params, 103);
            let processed = processor::process_seasons(black_box(&mut table), &played, &params);
            black_box(processed);
        })
    });
}

fn bench_season_simulation(c: &mut Criterion) {
    let store = demo_league(17);
    let params = bench_params();
    let played = store.fixtures().unwrap();
    let strengths = store.team_strengths().unwrap();
    let mut table = TeamTable::from_seed(&HashMap::new(), &strengths, &params, 103);
    processor::process_seasons(&mut table, &played, &params);
    let form = form::init_form(&played, &table, &params);
    let sim = SeasonSimulator::from_provider(&store, table, form, params).unwrap();

    c.bench_function("season_simulation_1000_trials", |b| {
        b.iter(|| {
            let dist = sim.run(black_box(1000), Some(7));
            black_box(dist.trials);
        })
    });
}

criterion_group!(benches, bench_history_replay, bench_season_simulation);
criterion_main!(benches);
