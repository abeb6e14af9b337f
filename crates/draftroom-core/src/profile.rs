// Seed-derived negotiating behavior for every team.
//
// Profiles are pure functions of (seed, team) and are recomputed on demand,
// never stored in the save.

use serde::{Deserialize, Serialize};

use crate::config::TradeConfig;
use crate::league::TeamId;
use crate::rng::SeededStream;

const TRAIT_MIN: f64 = 0.15;
const TRAIT_MAX: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Personality {
    Conservative,
    Normal,
    Aggressive,
}

impl Personality {
    pub fn label(&self) -> &'static str {
        match self {
            Personality::Conservative => "conservative",
            Personality::Normal => "normal",
            Personality::Aggressive => "aggressive",
        }
    }
}

/// A front office's trade temperament.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamProfile {
    pub team_id: TeamId,
    /// Appetite for making moves, in `[0.15, 0.95]`.
    pub aggression: f64,
    /// Tolerance for uncertain assets, in `[0.15, 0.95]`.
    pub risk_tolerance: f64,
    pub personality: Personality,
}

impl TeamProfile {
    pub fn derive(seed: u64, team_id: TeamId) -> Self {
        let stream = SeededStream::new(seed, "team-profile");
        let key = u64::from(team_id);
        let aggression = stream.range(&[key, 0], TRAIT_MIN, TRAIT_MAX);
        let risk_tolerance = stream.range(&[key, 1], TRAIT_MIN, TRAIT_MAX);
        let personality = match stream.unit(&[key, 2]) {
            u if u < 1.0 / 3.0 => Personality::Conservative,
            u if u < 2.0 / 3.0 => Personality::Normal,
            _ => Personality::Aggressive,
        };
        Self {
            team_id,
            aggression,
            risk_tolerance,
            personality,
        }
    }

    /// Net TVU this team needs before it will say yes, before leverage.
    pub fn base_threshold(&self, cfg: &TradeConfig) -> f64 {
        match self.personality {
            Personality::Conservative => cfg.threshold_conservative,
            Personality::Normal => cfg.threshold_normal,
            Personality::Aggressive => cfg.threshold_aggressive,
        }
    }
}

/// Draft-room temperament: the trade profile plus how often the team picks
/// up the phone on draft day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DraftTeamProfile {
    pub aggression: f64,
    pub risk_tolerance: f64,
    pub trade_frequency: f64,
}

impl DraftTeamProfile {
    pub fn derive(seed: u64, team_id: TeamId) -> Self {
        let base = TeamProfile::derive(seed, team_id);
        let trade_frequency =
            SeededStream::new(seed, "draft-profile").unit(&[u64::from(team_id)]);
        Self {
            aggression: base.aggression,
            risk_tolerance: base.risk_tolerance,
            trade_frequency,
        }
    }
}
