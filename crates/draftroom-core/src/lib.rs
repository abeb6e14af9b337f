// Library root: re-exports all modules so integration tests and the
// simulation harness can access the engine's public API.

pub mod config;
pub mod context;
pub mod draft;
pub mod league;
pub mod profile;
pub mod rng;
pub mod state;
pub mod test_support;
pub mod trade;
pub mod valuation;

pub use config::EngineConfig;
pub use context::EngineContext;
pub use league::{LeagueData, PlayerId, TeamId};
pub use state::{SaveState, StateDelta};
