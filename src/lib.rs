//! Football league rating and season simulation engine.
//!
//! History is replayed through a time-decayed Elo variant to produce team
//! ratings, a three-game form tracker and head-to-head record feed a
//! win/draw/loss probability model, and a Monte Carlo simulator plays out
//! the remaining fixtures to estimate each team's finishing position.

pub mod elo;
pub mod fixtures;
pub mod form;
pub mod h2h;
pub mod memory_store;
pub mod model_params;
pub mod probability;
pub mod processor;
pub mod provider;
pub mod report;
pub mod simulate;
pub mod sqlite_store;
pub mod team_state;
