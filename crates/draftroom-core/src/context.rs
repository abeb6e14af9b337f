// Borrowed bundle of everything an engine call reads.

use crate::config::EngineConfig;
use crate::league::{LeagueData, TeamId};
use crate::state::SaveState;

/// Read-only inputs shared by valuation, evaluation, and the simulators.
///
/// The context owns nothing: every operation that changes the save returns a
/// `StateDelta` instead of mutating through the context.
#[derive(Debug, Clone, Copy)]
pub struct EngineContext<'a> {
    pub league: &'a LeagueData,
    pub save: &'a SaveState,
    pub config: &'a EngineConfig,
    /// League seed. Every seeded stream derives from it.
    pub seed: u64,
    /// The human-controlled team, if any. CPU logic never acts for it.
    pub user_team_id: Option<TeamId>,
}

impl<'a> EngineContext<'a> {
    pub fn new(
        league: &'a LeagueData,
        save: &'a SaveState,
        config: &'a EngineConfig,
        seed: u64,
    ) -> Self {
        Self {
            league,
            save,
            config,
            seed,
            user_team_id: None,
        }
    }

    pub fn with_user(mut self, team_id: TeamId) -> Self {
        self.user_team_id = Some(team_id);
        self
    }

    /// Same league and config, different save. Used when a simulator applies
    /// trades one after another and must evaluate against the updated state.
    pub fn with_save<'b>(&self, save: &'b SaveState) -> EngineContext<'b>
    where
        'a: 'b,
    {
        EngineContext {
            league: self.league,
            save,
            config: self.config,
            seed: self.seed,
            user_team_id: self.user_team_id,
        }
    }

    pub fn is_user_team(&self, team_id: TeamId) -> bool {
        self.user_team_id == Some(team_id)
    }
}
