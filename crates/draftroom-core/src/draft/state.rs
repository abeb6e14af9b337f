// Draft state: pick order, available prospects, results, user preferences.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::board::{DraftProspectBelief, DraftProspectTruth};
use crate::league::{LeagueData, PlayerId, PositionGroup, TeamId};
use crate::profile::DraftTeamProfile;
use crate::state::{PickInventory, PickKey};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftError {
    #[error("the draft is complete")]
    DraftComplete,

    #[error("pick #{pick_no} does not exist in this draft")]
    UnknownPick { pick_no: u32 },

    #[error("pick #{pick_no} has already been made")]
    PickAlreadyMade { pick_no: u32 },

    #[error("pick #{pick_no} is not on the clock (on the clock: #{on_clock})")]
    NotOnClock { pick_no: u32, on_clock: u32 },

    #[error("team {team_id} does not hold pick #{pick_no} (held by {holder})")]
    WrongTeam {
        pick_no: u32,
        team_id: TeamId,
        holder: TeamId,
    },

    #[error("prospect {player_id} is not available")]
    ProspectUnavailable { player_id: PlayerId },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One slot in the draft order. `team_id` is the current holder and changes
/// when the pick is traded; `original_team_id` never does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSlot {
    pub overall: u32,
    pub round: u32,
    pub team_id: TeamId,
    pub original_team_id: TeamId,
}

impl DraftSlot {
    pub fn pick_key(&self) -> PickKey {
        PickKey {
            year_offset: 0,
            round: self.round,
            original_team_id: self.original_team_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftResult {
    pub overall: u32,
    pub round: u32,
    pub team_id: TeamId,
    pub player_id: PlayerId,
    pub note: String,
}

/// Preferences the user sets for their own picks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDraftState {
    pub team_id: Option<TeamId>,
    /// Prospects to take first, in priority order.
    pub targets: Vec<PlayerId>,
    /// Prospects never to take.
    pub no_pick: BTreeSet<PlayerId>,
    pub risk_tolerance: f64,
    /// Score multipliers per position group (absent means 1.0).
    pub positional_urgency: BTreeMap<PositionGroup, f64>,
    /// 0 ignores age, 1 strongly favors younger prospects.
    pub long_term_bias: f64,
}

impl UserDraftState {
    pub fn new(team_id: Option<TeamId>) -> Self {
        Self {
            team_id,
            targets: Vec::new(),
            no_pick: BTreeSet::new(),
            risk_tolerance: 0.5,
            positional_urgency: BTreeMap::new(),
            long_term_bias: 0.0,
        }
    }
}

/// The complete state of a draft in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftState {
    pub year: u32,
    /// Index into `pick_order` of the slot on the clock.
    pub current_pick_index: usize,
    pub pick_order: Vec<DraftSlot>,
    pub available: BTreeSet<PlayerId>,
    /// Completed picks keyed by overall pick number.
    pub results: BTreeMap<u32, DraftResult>,
    pub team_profiles: BTreeMap<TeamId, DraftTeamProfile>,
    pub truth_by_id: BTreeMap<PlayerId, DraftProspectTruth>,
    pub belief_by_team: BTreeMap<TeamId, BTreeMap<PlayerId, DraftProspectBelief>>,
    pub needs_by_team: BTreeMap<TeamId, BTreeMap<PositionGroup, f64>>,
    pub user: UserDraftState,
    pub news: Vec<String>,
    /// Draft-day trades completed per round.
    pub trades_by_round: BTreeMap<u32, u32>,
}

impl DraftState {
    /// The slot currently on the clock, `None` once every pick is made.
    pub fn on_clock(&self) -> Option<&DraftSlot> {
        self.pick_order.get(self.current_pick_index)
    }

    pub fn is_complete(&self) -> bool {
        self.current_pick_index >= self.pick_order.len()
    }

    pub fn slot(&self, pick_no: u32) -> Option<&DraftSlot> {
        self.pick_order.iter().find(|s| s.overall == pick_no)
    }

    /// Slots not yet used, starting with the one on the clock.
    pub fn remaining_slots(&self) -> &[DraftSlot] {
        self.pick_order
            .get(self.current_pick_index..)
            .unwrap_or(&[])
    }

    pub fn trades_in_round(&self, round: u32) -> u32 {
        self.trades_by_round.get(&round).copied().unwrap_or(0)
    }

    pub fn set_targets(&self, targets: Vec<PlayerId>) -> DraftState {
        let mut next = self.clone();
        next.user.targets = targets;
        next
    }

    /// Add the prospect to the no-pick list, or remove it if already there.
    pub fn toggle_no_pick(&self, player_id: PlayerId) -> DraftState {
        let mut next = self.clone();
        if !next.user.no_pick.remove(&player_id) {
            next.user.no_pick.insert(player_id);
        }
        next
    }

    pub fn set_user_risk_tolerance(&self, risk_tolerance: f64) -> DraftState {
        let mut next = self.clone();
        next.user.risk_tolerance = risk_tolerance.clamp(0.0, 1.0);
        next
    }

    pub fn set_positional_urgency(&self, group: PositionGroup, multiplier: f64) -> DraftState {
        let mut next = self.clone();
        next.user
            .positional_urgency
            .insert(group, multiplier.clamp(0.5, 1.5));
        next
    }

    pub fn set_long_term_bias(&self, bias: f64) -> DraftState {
        let mut next = self.clone();
        next.user.long_term_bias = bias.clamp(0.0, 1.0);
        next
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Record `team_id` taking `player_id` with the pick on the clock.
///
/// Removes the prospect from the pool, stores the result under the pick
/// number, appends a news line, and advances the clock.
pub fn apply_pick(
    state: &DraftState,
    league: &LeagueData,
    pick_no: u32,
    team_id: TeamId,
    player_id: PlayerId,
) -> Result<DraftState, DraftError> {
    if state.results.contains_key(&pick_no) {
        return Err(DraftError::PickAlreadyMade { pick_no });
    }
    let Some(slot) = state.slot(pick_no) else {
        return Err(DraftError::UnknownPick { pick_no });
    };
    let on_clock = state.on_clock().ok_or(DraftError::DraftComplete)?;
    if on_clock.overall != pick_no {
        return Err(DraftError::NotOnClock {
            pick_no,
            on_clock: on_clock.overall,
        });
    }
    if slot.team_id != team_id {
        return Err(DraftError::WrongTeam {
            pick_no,
            team_id,
            holder: slot.team_id,
        });
    }
    if !state.available.contains(&player_id) {
        return Err(DraftError::ProspectUnavailable { player_id });
    }

    let note = match league.prospect(player_id) {
        Some(p) => format!("{} {}", p.position.display_str(), p.name),
        None => format!("prospect {player_id}"),
    };
    let headline = format!(
        "#{} (R{}) {}: {}",
        pick_no,
        slot.round,
        league.abbrev(team_id),
        note
    );
    info!("{headline}");

    let mut next = state.clone();
    next.available.remove(&player_id);
    next.results.insert(
        pick_no,
        DraftResult {
            overall: pick_no,
            round: slot.round,
            team_id,
            player_id,
            note,
        },
    );
    next.news.push(headline);
    next.current_pick_index += 1;
    Ok(next)
}

/// Remove a used current-year pick from the inventory so it cannot be traded
/// after the selection.
pub fn consume_drafted_pick(inventory: &PickInventory, slot: &DraftSlot) -> PickInventory {
    let mut next = inventory.clone();
    next.remove(&slot.pick_key());
    next
}

/// Remove every pick the draft has already used.
pub fn consume_used_picks(inventory: &PickInventory, state: &DraftState) -> PickInventory {
    let mut next = inventory.clone();
    for slot in &state.pick_order {
        if state.results.contains_key(&slot.overall) {
            next.remove(&slot.pick_key());
        }
    }
    next
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::init_draft_state;
    use crate::state::SaveState;
    use crate::test_support::{sample_config, sample_league, SAMPLE_SEED};

    fn fresh() -> (LeagueData, DraftState, SaveState) {
        let league = sample_league();
        let config = sample_config();
        let save = SaveState::new(&league, &config);
        let state = init_draft_state(&league, &save, Some(3), SAMPLE_SEED, league.season_year);
        (league, state, save)
    }

    #[test]
    fn apply_pick_advances_clock() {
        let (league, state, _) = fresh();
        let slot = state.on_clock().unwrap().clone();
        let player = *state.available.iter().next().unwrap();

        let next = apply_pick(&state, &league, slot.overall, slot.team_id, player).unwrap();
        assert_eq!(next.current_pick_index, 1);
        assert!(!next.available.contains(&player));
        assert_eq!(next.results[&slot.overall].player_id, player);
        assert_eq!(next.news.len(), state.news.len() + 1);
        // Input untouched.
        assert_eq!(state.current_pick_index, 0);
    }

    #[test]
    fn apply_pick_rejects_misuse() {
        let (league, state, _) = fresh();
        let slot = state.on_clock().unwrap().clone();
        let player = *state.available.iter().next().unwrap();

        match apply_pick(&state, &league, 999, slot.team_id, player) {
            Err(DraftError::UnknownPick { pick_no: 999 }) => {}
            other => panic!("expected UnknownPick, got: {other:?}"),
        }
        let later = state.pick_order[1].overall;
        match apply_pick(&state, &league, later, state.pick_order[1].team_id, player) {
            Err(DraftError::NotOnClock { .. }) => {}
            other => panic!("expected NotOnClock, got: {other:?}"),
        }
        let wrong_team = if slot.team_id == 1 { 2 } else { 1 };
        match apply_pick(&state, &league, slot.overall, wrong_team, player) {
            Err(DraftError::WrongTeam { holder, .. }) => assert_eq!(holder, slot.team_id),
            other => panic!("expected WrongTeam, got: {other:?}"),
        }
        match apply_pick(&state, &league, slot.overall, slot.team_id, 1) {
            Err(DraftError::ProspectUnavailable { player_id: 1 }) => {}
            other => panic!("expected ProspectUnavailable, got: {other:?}"),
        }

        let next = apply_pick(&state, &league, slot.overall, slot.team_id, player).unwrap();
        match apply_pick(&next, &league, slot.overall, slot.team_id, player) {
            Err(DraftError::PickAlreadyMade { .. }) => {}
            other => panic!("expected PickAlreadyMade, got: {other:?}"),
        }
    }

    #[test]
    fn user_setters_return_new_state() {
        let (_, state, _) = fresh();
        let next = state
            .set_targets(vec![5, 6])
            .toggle_no_pick(9)
            .set_user_risk_tolerance(3.0)
            .set_positional_urgency(PositionGroup::Quarterback, 1.3)
            .set_long_term_bias(0.4);
        assert_eq!(next.user.targets, vec![5, 6]);
        assert!(next.user.no_pick.contains(&9));
        assert_eq!(next.user.risk_tolerance, 1.0);
        assert_eq!(next.user.positional_urgency[&PositionGroup::Quarterback], 1.3);
        assert_eq!(next.user.long_term_bias, 0.4);
        assert!(state.user.targets.is_empty());

        let toggled_back = next.toggle_no_pick(9);
        assert!(!toggled_back.user.no_pick.contains(&9));
    }

    #[test]
    fn consumed_picks_leave_inventory() {
        let (league, state, save) = fresh();
        let slot = state.on_clock().unwrap().clone();
        let player = *state.available.iter().next().unwrap();
        let next = apply_pick(&state, &league, slot.overall, slot.team_id, player).unwrap();

        let before = save.pick_inventory.total_picks();
        let single = consume_drafted_pick(&save.pick_inventory, &slot);
        assert_eq!(single.total_picks(), before - 1);
        assert_eq!(single.owner_of(&slot.pick_key()), None);

        let all = consume_used_picks(&save.pick_inventory, &next);
        assert_eq!(all, single);
    }
}
