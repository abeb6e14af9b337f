// Save-state slices owned by the engine and the copy-on-write delta that
// replaces them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::EngineConfig;
use crate::draft::DraftState;
use crate::league::{LeagueData, PlayerId, RosterRow, TeamId};
use crate::trade::{TradeOffer, TradeThread};

// ---------------------------------------------------------------------------
// Picks
// ---------------------------------------------------------------------------

/// Identity of a draft pick: the year it belongs to, the round, and the team
/// it was originally issued to. Stable across trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PickKey {
    pub year_offset: u32,
    pub round: u32,
    pub original_team_id: TeamId,
}

impl fmt::Display for PickKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Y+{} R{} (orig T{})",
            self.year_offset, self.round, self.original_team_id
        )
    }
}

/// A pick held in a team's inventory. `overall` is known for the current
/// draft year and unknown for future years.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedPick {
    pub year_offset: u32,
    pub round: u32,
    pub overall: Option<u32>,
    pub original_team_id: TeamId,
}

impl OwnedPick {
    pub fn key(&self) -> PickKey {
        PickKey {
            year_offset: self.year_offset,
            round: self.round,
            original_team_id: self.original_team_id,
        }
    }

    fn sort_key(&self) -> (u32, u32, u32, TeamId) {
        (
            self.year_offset,
            self.round,
            self.overall.unwrap_or(u32::MAX),
            self.original_team_id,
        )
    }
}

/// Every team's owned picks, current year and future years.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PickInventory {
    pub by_team: BTreeMap<TeamId, Vec<OwnedPick>>,
}

impl PickInventory {
    /// Seed the inventory from the draft order rows plus one pick per round
    /// for each of `future_years` upcoming drafts.
    pub fn from_league(league: &LeagueData, future_years: u32) -> Self {
        let mut by_team: BTreeMap<TeamId, Vec<OwnedPick>> = BTreeMap::new();
        for team_id in league.team_ids() {
            by_team.entry(team_id).or_default();
        }

        for row in &league.draft_order {
            by_team.entry(row.team_id).or_default().push(OwnedPick {
                year_offset: 0,
                round: row.round,
                overall: Some(row.overall),
                original_team_id: row.team_id,
            });
        }

        let rounds = league.rounds();
        for year_offset in 1..=future_years {
            for team_id in league.team_ids() {
                let picks = by_team.entry(team_id).or_default();
                for round in 1..=rounds {
                    picks.push(OwnedPick {
                        year_offset,
                        round,
                        overall: None,
                        original_team_id: team_id,
                    });
                }
            }
        }

        for picks in by_team.values_mut() {
            picks.sort_by_key(OwnedPick::sort_key);
        }
        Self { by_team }
    }

    /// Picks owned by `team_id`, ordered by year, round, then slot.
    pub fn picks_for(&self, team_id: TeamId) -> &[OwnedPick] {
        self.by_team.get(&team_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find(&self, key: &PickKey) -> Option<(TeamId, &OwnedPick)> {
        self.by_team.iter().find_map(|(team_id, picks)| {
            picks
                .iter()
                .find(|p| p.key() == *key)
                .map(|p| (*team_id, p))
        })
    }

    pub fn owner_of(&self, key: &PickKey) -> Option<TeamId> {
        self.find(key).map(|(team_id, _)| team_id)
    }

    pub fn owns(&self, team_id: TeamId, key: &PickKey) -> bool {
        self.picks_for(team_id).iter().any(|p| p.key() == *key)
    }

    /// Remove a pick from whichever team holds it.
    pub fn remove(&mut self, key: &PickKey) -> Option<OwnedPick> {
        for picks in self.by_team.values_mut() {
            if let Some(idx) = picks.iter().position(|p| p.key() == *key) {
                return Some(picks.remove(idx));
            }
        }
        None
    }

    /// Move a pick to `to_team`. Returns `false` if no team holds it.
    pub fn transfer(&mut self, key: &PickKey, to_team: TeamId) -> bool {
        let Some(pick) = self.remove(key) else {
            return false;
        };
        let picks = self.by_team.entry(to_team).or_default();
        picks.push(pick);
        picks.sort_by_key(OwnedPick::sort_key);
        true
    }

    pub fn total_picks(&self) -> usize {
        self.by_team.values().map(Vec::len).sum()
    }

    /// Current-year picks with a known slot as `(overall, round, owner, original)`,
    /// ordered by overall.
    pub fn current_year_slots(&self) -> Vec<(u32, u32, TeamId, TeamId)> {
        let mut slots: Vec<(u32, u32, TeamId, TeamId)> = self
            .by_team
            .iter()
            .flat_map(|(owner, picks)| {
                picks.iter().filter(|p| p.year_offset == 0).filter_map(move |p| {
                    p.overall
                        .map(|overall| (overall, p.round, *owner, p.original_team_id))
                })
            })
            .collect();
        slots.sort();
        slots
    }
}

// ---------------------------------------------------------------------------
// Cap and reputation
// ---------------------------------------------------------------------------

/// Running cap changes caused by trades, in dollars.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapAdjustment {
    pub cap_hits_delta: f64,
    pub dead_cap_delta: f64,
}

/// How the league's front offices regard the user's trade proposals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReputation {
    /// 0-100, starts neutral at 50.
    pub score: i32,
    pub lowball_strikes: u32,
}

impl Default for TradeReputation {
    fn default() -> Self {
        Self {
            score: 50,
            lowball_strikes: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// SaveState
// ---------------------------------------------------------------------------

/// The save slices the engine reads and replaces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveState {
    pub draft: Option<DraftState>,
    pub trade_inbox: Vec<TradeOffer>,
    pub trade_threads: BTreeMap<String, TradeThread>,
    pub pick_inventory: PickInventory,
    pub player_team_override: BTreeMap<PlayerId, TeamId>,
    pub cap_adjustments: BTreeMap<TeamId, CapAdjustment>,
    pub trade_reputation: TradeReputation,
}

impl SaveState {
    /// Fresh slices for a league: seeded pick inventory, everything else empty.
    pub fn new(league: &LeagueData, config: &EngineConfig) -> Self {
        Self {
            pick_inventory: PickInventory::from_league(league, config.draft.future_years),
            ..Default::default()
        }
    }

    /// Return the next state with every slice present in `delta` replaced.
    pub fn apply_delta(&self, delta: &StateDelta) -> SaveState {
        let mut next = self.clone();
        if let Some(draft) = &delta.draft {
            next.draft = Some(draft.clone());
        }
        if let Some(inbox) = &delta.trade_inbox {
            next.trade_inbox = inbox.clone();
        }
        if let Some(threads) = &delta.trade_threads {
            next.trade_threads = threads.clone();
        }
        if let Some(inventory) = &delta.pick_inventory {
            next.pick_inventory = inventory.clone();
        }
        if let Some(overrides) = &delta.player_team_override {
            next.player_team_override = overrides.clone();
        }
        if let Some(cap) = &delta.cap_adjustments {
            next.cap_adjustments = cap.clone();
        }
        if let Some(rep) = &delta.trade_reputation {
            next.trade_reputation = rep.clone();
        }
        next
    }

    /// Current team of a rostered player: trade overrides first, then the
    /// league row.
    pub fn team_of(&self, league: &LeagueData, player_id: PlayerId) -> Option<TeamId> {
        self.player_team_override
            .get(&player_id)
            .copied()
            .or_else(|| league.player(player_id).map(|p| p.team_id))
    }

    /// Players currently on `team_id`, in league roster order.
    pub fn roster_of<'l>(&self, league: &'l LeagueData, team_id: TeamId) -> Vec<&'l RosterRow> {
        league
            .roster
            .iter()
            .filter(|p| {
                self.player_team_override
                    .get(&p.player_id)
                    .copied()
                    .unwrap_or(p.team_id)
                    == team_id
            })
            .collect()
    }

    /// Adjusted cap total: the league rows' cap hits plus trade deltas and
    /// dead money.
    pub fn team_cap_hits(&self, league: &LeagueData, team_id: TeamId) -> f64 {
        let base: f64 = league
            .roster
            .iter()
            .filter(|p| p.team_id == team_id)
            .map(|p| p.cap_hit)
            .sum();
        let adj = self.cap_adjustments.get(&team_id).cloned().unwrap_or_default();
        base + adj.cap_hits_delta + adj.dead_cap_delta
    }

    pub fn dead_cap(&self, team_id: TeamId) -> f64 {
        self.cap_adjustments
            .get(&team_id)
            .map(|a| a.dead_cap_delta)
            .unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// StateDelta
// ---------------------------------------------------------------------------

/// Replacement slices. `None` leaves the slice untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateDelta {
    pub draft: Option<DraftState>,
    pub trade_inbox: Option<Vec<TradeOffer>>,
    pub trade_threads: Option<BTreeMap<String, TradeThread>>,
    pub pick_inventory: Option<PickInventory>,
    pub player_team_override: Option<BTreeMap<PlayerId, TeamId>>,
    pub cap_adjustments: Option<BTreeMap<TeamId, CapAdjustment>>,
    pub trade_reputation: Option<TradeReputation>,
}

impl StateDelta {
    pub fn is_empty(&self) -> bool {
        self.draft.is_none()
            && self.trade_inbox.is_none()
            && self.trade_threads.is_none()
            && self.pick_inventory.is_none()
            && self.player_team_override.is_none()
            && self.cap_adjustments.is_none()
            && self.trade_reputation.is_none()
    }

    /// Combine two deltas; slices in `later` win.
    pub fn merge(self, later: StateDelta) -> StateDelta {
        StateDelta {
            draft: later.draft.or(self.draft),
            trade_inbox: later.trade_inbox.or(self.trade_inbox),
            trade_threads: later.trade_threads.or(self.trade_threads),
            pick_inventory: later.pick_inventory.or(self.pick_inventory),
            player_team_override: later.player_team_override.or(self.player_team_override),
            cap_adjustments: later.cap_adjustments.or(self.cap_adjustments),
            trade_reputation: later.trade_reputation.or(self.trade_reputation),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
