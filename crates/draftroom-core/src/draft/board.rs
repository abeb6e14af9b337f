// Draft board construction: hidden prospect truth and per-team beliefs.
//
// Truth is generated once per (seed, rank). Every team sees it through its
// own noisy lens: a team-wide bias, per-prospect jitter scaled by the
// prospect's volatility, a need boost, and a scheme-fit draw. Beliefs are
// fixed for the whole draft.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::state::{DraftSlot, DraftState, UserDraftState};
use crate::league::{LeagueData, PlayerId, ProspectRow, TeamId};
use crate::profile::DraftTeamProfile;
use crate::rng::SeededStream;
use crate::state::SaveState;
use crate::valuation::context::team_needs;

const TEAM_BIAS: f64 = 3.0;
const NEED_BOOST: f64 = 4.0;
const FIT_SPREAD: f64 = 3.0;
const MEDICAL_BASE: f64 = 0.03;
const MEDICAL_DURABILITY: f64 = 0.08;
const CHARACTER_BAND: f64 = 0.03;
const SCHEME_BAND: f64 = 0.03;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What a prospect really is. Never shown to teams directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftProspectTruth {
    pub ovr: f64,
    pub pot: f64,
    pub volatility: f64,
    pub durability: f64,
    pub mental: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskFlag {
    Medical,
    Character,
    Scheme,
}

impl RiskFlag {
    /// Score deducted from a flagged prospect when ranking.
    pub fn penalty(&self) -> f64 {
        match self {
            RiskFlag::Medical => 6.0,
            RiskFlag::Character => 4.0,
            RiskFlag::Scheme => 2.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskFlag::Medical => "medical",
            RiskFlag::Character => "character",
            RiskFlag::Scheme => "scheme",
        }
    }
}

/// One team's read on one prospect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftProspectBelief {
    pub grade: f64,
    pub variance: f64,
    /// `1 / (1 + variance / 25)`.
    pub confidence: f64,
    pub scheme_fit: f64,
    pub risk_flag: Option<RiskFlag>,
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Hidden truth for the prospect at board rank `rank`.
pub fn prospect_truth(seed: u64, rank: u32) -> DraftProspectTruth {
    let stream = SeededStream::new(seed, "prospect-truth");
    let key = u64::from(rank.max(1));
    let ovr = (80.0 - 7.0 * f64::from(rank.max(1)).ln() + 5.0 * stream.signed(&[key, 0]))
        .clamp(40.0, 99.0);
    let pot = (ovr + stream.range(&[key, 1], 2.0, 14.0)).min(99.0);
    DraftProspectTruth {
        ovr,
        pot,
        volatility: stream.range(&[key, 2], 0.05, 0.40),
        durability: stream.range(&[key, 3], 0.55, 1.0),
        mental: stream.range(&[key, 4], 0.45, 1.0),
    }
}

/// Team-wide grading bias in `[-3, 3)`.
pub fn team_bias(seed: u64, team_id: TeamId) -> f64 {
    TEAM_BIAS * SeededStream::new(seed, "board-team-bias").signed(&[u64::from(team_id)])
}

/// `team_id`'s belief about `prospect`, given its need at the prospect's
/// position group.
pub fn prospect_belief(
    seed: u64,
    team_id: TeamId,
    prospect: &ProspectRow,
    truth: &DraftProspectTruth,
    need: f64,
) -> DraftProspectBelief {
    let stream = SeededStream::new(seed, "board-belief");
    let team = u64::from(team_id);
    let pid = u64::from(prospect.player_id);

    let spread = 2.0 + 8.0 * truth.volatility;
    let jitter = spread * stream.signed(&[team, pid, 0]);
    let scheme_fit = stream.unit(&[team, pid, 1]);
    let grade = 0.55 * truth.ovr
        + 0.45 * truth.pot
        + team_bias(seed, team_id)
        + jitter
        + NEED_BOOST * need
        + FIT_SPREAD * (scheme_fit - 0.5);
    let variance = spread * spread * (0.8 + 0.4 * stream.unit(&[team, pid, 2]));
    let confidence = 1.0 / (1.0 + variance / 25.0);

    let roll = stream.unit(&[team, pid, 3]);
    let medical = MEDICAL_BASE + MEDICAL_DURABILITY * (1.0 - truth.durability);
    let risk_flag = if roll < medical {
        Some(RiskFlag::Medical)
    } else if roll < medical + CHARACTER_BAND {
        Some(RiskFlag::Character)
    } else if roll < medical + CHARACTER_BAND + SCHEME_BAND {
        Some(RiskFlag::Scheme)
    } else {
        None
    };

    DraftProspectBelief {
        grade,
        variance,
        confidence,
        scheme_fit,
        risk_flag,
    }
}

/// Build a fresh draft for `year`.
///
/// The pick order comes from the current-year picks in the save's inventory,
/// so pre-draft trades are honored. Leagues with no inventory fall back to
/// the draft order rows.
pub fn init_draft_state(
    league: &LeagueData,
    save: &SaveState,
    user_team: Option<TeamId>,
    seed: u64,
    year: u32,
) -> DraftState {
    let mut pick_order: Vec<DraftSlot> = save
        .pick_inventory
        .current_year_slots()
        .into_iter()
        .map(|(overall, round, team_id, original_team_id)| DraftSlot {
            overall,
            round,
            team_id,
            original_team_id,
        })
        .collect();
    if pick_order.is_empty() {
        debug!("pick inventory has no current-year slots, using league draft order");
        let mut rows = league.draft_order.clone();
        rows.sort_by_key(|r| r.overall);
        pick_order = rows
            .into_iter()
            .map(|r| DraftSlot {
                overall: r.overall,
                round: r.round,
                team_id: r.team_id,
                original_team_id: r.team_id,
            })
            .collect();
    }

    let available: BTreeSet<PlayerId> = league.draft_class.iter().map(|p| p.player_id).collect();

    let truth_by_id: BTreeMap<PlayerId, DraftProspectTruth> = league
        .draft_class
        .iter()
        .map(|p| (p.player_id, prospect_truth(seed, p.rank)))
        .collect();

    let mut team_profiles = BTreeMap::new();
    let mut needs_by_team = BTreeMap::new();
    let mut belief_by_team = BTreeMap::new();
    for team_id in league.team_ids() {
        let needs = team_needs(league, save, team_id);
        let beliefs: BTreeMap<PlayerId, DraftProspectBelief> = league
            .draft_class
            .iter()
            .filter_map(|p| {
                let truth = truth_by_id.get(&p.player_id)?;
                let need = needs.get(&p.position.group()).copied().unwrap_or(0.0);
                Some((p.player_id, prospect_belief(seed, team_id, p, truth, need)))
            })
            .collect();
        team_profiles.insert(team_id, DraftTeamProfile::derive(seed, team_id));
        belief_by_team.insert(team_id, beliefs);
        needs_by_team.insert(team_id, needs);
    }

    let opening = format!(
        "{year} draft opens: {} picks, {} prospects",
        pick_order.len(),
        available.len()
    );
    info!("{opening}");

    DraftState {
        year,
        current_pick_index: 0,
        pick_order,
        available,
        results: BTreeMap::new(),
        team_profiles,
        truth_by_id,
        belief_by_team,
        needs_by_team,
        user: UserDraftState::new(user_team),
        news: vec![opening],
        trades_by_round: BTreeMap::new(),
    }
}

// ---------------------------------------------------------------------------
// Board queries
// ---------------------------------------------------------------------------

/// Available prospects' grades on `team_id`'s board, best first.
pub fn board_grades(state: &DraftState, team_id: TeamId) -> Vec<f64> {
    let Some(beliefs) = state.belief_by_team.get(&team_id) else {
        return Vec::new();
    };
    let mut grades: Vec<f64> = state
        .available
        .iter()
        .filter_map(|id| beliefs.get(id).map(|b| b.grade))
        .collect();
    grades.sort_by(|a, b| b.total_cmp(a));
    grades
}

/// How much more `team_id` values the pick at `overall` than par.
///
/// Compares the best grade on its board with the grade it expects to still
/// be there at its next own pick. A steep drop-off makes an aggressive team
/// want to move up. Returns 1.0 when the team already picks first.
pub fn pick_urgency(state: &DraftState, team_id: TeamId, overall: u32, aggression: f64) -> f64 {
    let remaining = state.remaining_slots();
    let Some(target_idx) = remaining.iter().position(|s| s.overall == overall) else {
        return 1.0;
    };
    let next_own = remaining
        .iter()
        .position(|s| s.team_id == team_id && s.overall != overall);
    let picks_between = match next_own {
        Some(idx) if idx < target_idx => return 1.0,
        Some(idx) => idx - target_idx,
        None => remaining.len() - target_idx,
    };

    let grades = board_grades(state, team_id);
    if grades.len() < 2 {
        return 1.0;
    }
    let top = grades[0];
    let expected = grades[picks_between.min(grades.len() - 1)];
    let drop = ((top - expected) / 8.0).clamp(0.0, 1.0);
    1.0 + (0.10 + 0.30 * aggression.clamp(0.0, 1.0)) * drop
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
