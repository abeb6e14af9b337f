// Player surplus value.
//
// A player is worth what their estimated market contract exceeds their cap hit,
// converted to TVU and scaled by a seeded certainty factor. Overpaid players
// are worth zero, never negative.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ValuationConfig;
use crate::league::{LeagueData, PlayerId, Position, RosterRow};
use crate::rng::SeededStream;

/// Rating midpoint and spread of the performance sigmoid. Spans ratings 60-95.
const PERF_MIDPOINT: f64 = 77.5;
const PERF_SPREAD: f64 = 4.5;
const AGE_DECAY: f64 = 0.012;
const AGE_FLOOR: f64 = 0.2;

/// Breakdown of a player's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerValue {
    pub player_id: PlayerId,
    /// Estimated market AAV in dollars.
    pub market_aav: f64,
    pub cap_hit: f64,
    /// `max(0, market - cap_hit)` in dollars.
    pub surplus: f64,
    pub certainty: f64,
    pub tvu: f64,
}

pub fn performance_factor(rating: f64) -> f64 {
    1.0 / (1.0 + (-(rating - PERF_MIDPOINT) / PERF_SPREAD).exp())
}

pub fn age_factor(age: u32, position: Position) -> f64 {
    let delta = f64::from(age) - f64::from(position.prime_age());
    (1.0 - AGE_DECAY * delta * delta).max(AGE_FLOOR)
}

/// What the open market would pay this player per year.
pub fn estimated_market_aav(salary_cap: f64, row: &RosterRow) -> f64 {
    salary_cap
        * row.position.cap_share()
        * performance_factor(row.rating)
        * age_factor(row.age, row.position)
}

/// Seeded confidence in the valuation, in `[certainty_floor, certainty_ceiling]`.
pub fn certainty_multiplier(cfg: &ValuationConfig, seed: u64, player_id: PlayerId) -> f64 {
    SeededStream::new(seed, "player-certainty").range(
        &[u64::from(player_id)],
        cfg.certainty_floor,
        cfg.certainty_ceiling,
    )
}

pub fn value_row(
    salary_cap: f64,
    cfg: &ValuationConfig,
    seed: u64,
    row: &RosterRow,
) -> PlayerValue {
    let market_aav = estimated_market_aav(salary_cap, row);
    let surplus = (market_aav - row.cap_hit).max(0.0);
    let certainty = certainty_multiplier(cfg, seed, row.player_id);
    let tvu = surplus / 1_000_000.0 * cfg.tvu_per_million * certainty;
    PlayerValue {
        player_id: row.player_id,
        market_aav,
        cap_hit: row.cap_hit,
        surplus,
        certainty,
        tvu,
    }
}

/// Value breakdown for a rostered player, `None` if the id is unknown.
pub fn player_value(
    league: &LeagueData,
    cfg: &ValuationConfig,
    seed: u64,
    player_id: PlayerId,
) -> Option<PlayerValue> {
    league
        .player(player_id)
        .map(|row| value_row(league.salary_cap, cfg, seed, row))
}

/// TVU of a rostered player. Unknown players are worth 0.
pub fn player_tvu(league: &LeagueData, cfg: &ValuationConfig, seed: u64, player_id: PlayerId) -> f64 {
    match player_value(league, cfg, seed, player_id) {
        Some(v) => v.tvu,
        None => {
            debug!("player {player_id} not found in league data, valuing at 0");
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
