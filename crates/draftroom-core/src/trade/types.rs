// Trade value objects: assets, offers, evaluations, negotiation threads.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::league::{LeagueData, PlayerId, TeamId};
use crate::state::{OwnedPick, PickKey};

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// Something that can change hands in a trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TradeAsset {
    Pick {
        year_offset: u32,
        round: u32,
        overall: Option<u32>,
        original_team_id: TeamId,
        owner_team_id: TeamId,
    },
    Player {
        player_id: PlayerId,
        owner_team_id: TeamId,
    },
}

/// Identity of an asset regardless of its declared owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AssetId {
    Pick(PickKey),
    Player(PlayerId),
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Pick(key) => write!(f, "pick {key}"),
            AssetId::Player(id) => write!(f, "player {id}"),
        }
    }
}

impl TradeAsset {
    pub fn pick(pick: &OwnedPick, owner_team_id: TeamId) -> Self {
        TradeAsset::Pick {
            year_offset: pick.year_offset,
            round: pick.round,
            overall: pick.overall,
            original_team_id: pick.original_team_id,
            owner_team_id,
        }
    }

    pub fn player(player_id: PlayerId, owner_team_id: TeamId) -> Self {
        TradeAsset::Player {
            player_id,
            owner_team_id,
        }
    }

    pub fn owner(&self) -> TeamId {
        match self {
            TradeAsset::Pick { owner_team_id, .. } | TradeAsset::Player { owner_team_id, .. } => {
                *owner_team_id
            }
        }
    }

    pub fn id(&self) -> AssetId {
        match self {
            TradeAsset::Pick {
                year_offset,
                round,
                original_team_id,
                ..
            } => AssetId::Pick(PickKey {
                year_offset: *year_offset,
                round: *round,
                original_team_id: *original_team_id,
            }),
            TradeAsset::Player { player_id, .. } => AssetId::Player(*player_id),
        }
    }

    pub fn pick_key(&self) -> Option<PickKey> {
        match self {
            TradeAsset::Pick {
                year_offset,
                round,
                original_team_id,
                ..
            } => Some(PickKey {
                year_offset: *year_offset,
                round: *round,
                original_team_id: *original_team_id,
            }),
            TradeAsset::Player { .. } => None,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self, TradeAsset::Player { .. })
    }

    pub fn is_future_pick(&self) -> bool {
        matches!(self, TradeAsset::Pick { year_offset, .. } if *year_offset > 0)
    }

    /// Human-readable label, e.g. `2026 R1 #3` or `QB J. Smith`.
    pub fn label(&self, league: &LeagueData) -> String {
        match self {
            TradeAsset::Pick {
                year_offset,
                round,
                overall,
                original_team_id,
                ..
            } => {
                let year = league.season_year + year_offset;
                match overall {
                    Some(o) if *year_offset == 0 => format!("{year} R{round} #{o}"),
                    _ => format!("{year} R{round} ({})", league.abbrev(*original_team_id)),
                }
            }
            TradeAsset::Player { player_id, .. } => match league.player(*player_id) {
                Some(p) => format!("{} {}", p.position, p.name),
                None => format!("player {player_id}"),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Offers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradePhase {
    Draft,
    Season,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Countered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferOrigin {
    User,
    Cpu,
}

/// One side's valuation of an offer. Always relative to a single team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEval {
    pub net_gain: f64,
    pub threshold: f64,
    pub friction: f64,
    pub risk_buffer: f64,
    pub eff_in: f64,
    pub eff_out: f64,
    pub noise: f64,
    pub drivers: Vec<String>,
}

impl TradeEval {
    /// Eval for a team that is not a party to the offer.
    pub fn zeroed(driver: String) -> Self {
        Self {
            net_gain: 0.0,
            threshold: 0.0,
            friction: 0.0,
            risk_buffer: 0.0,
            eff_in: 0.0,
            eff_out: 0.0,
            noise: 0.0,
            drivers: vec![driver],
        }
    }

    pub fn accepts(&self) -> bool {
        self.net_gain >= self.threshold
    }

    /// How far below threshold the offer landed (negative when accepted).
    pub fn gap(&self) -> f64 {
        self.threshold - self.net_gain
    }
}

/// Recorded evaluations from both parties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferEvals {
    pub from: TradeEval,
    pub to: TradeEval,
}

/// A proposed exchange. `give` flows from `from_team_id` to `to_team_id`,
/// `get` flows the other way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOffer {
    pub id: String,
    pub from_team_id: TeamId,
    pub to_team_id: TeamId,
    pub give: Vec<TradeAsset>,
    pub get: Vec<TradeAsset>,
    pub created_tick: u64,
    pub phase: TradePhase,
    pub status: OfferStatus,
    pub origin: OfferOrigin,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub eval: Option<OfferEvals>,
    /// Teams that have agreed to this exact offer.
    #[serde(default)]
    pub accepted_by: BTreeSet<TeamId>,
}

impl TradeOffer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        from_team_id: TeamId,
        to_team_id: TeamId,
        give: Vec<TradeAsset>,
        get: Vec<TradeAsset>,
        created_tick: u64,
        phase: TradePhase,
        origin: OfferOrigin,
    ) -> Self {
        Self {
            id: id.into(),
            from_team_id,
            to_team_id,
            give,
            get,
            created_tick,
            phase,
            status: OfferStatus::Pending,
            origin,
            message: None,
            eval: None,
            accepted_by: BTreeSet::new(),
        }
    }

    pub fn involves(&self, team_id: TeamId) -> bool {
        self.from_team_id == team_id || self.to_team_id == team_id
    }

    pub fn counterparty(&self, team_id: TeamId) -> Option<TeamId> {
        if team_id == self.from_team_id {
            Some(self.to_team_id)
        } else if team_id == self.to_team_id {
            Some(self.from_team_id)
        } else {
            None
        }
    }

    /// Assets `team_id` would receive.
    pub fn incoming_for(&self, team_id: TeamId) -> &[TradeAsset] {
        if team_id == self.from_team_id {
            &self.get
        } else if team_id == self.to_team_id {
            &self.give
        } else {
            &[]
        }
    }

    /// Assets `team_id` would send.
    pub fn outgoing_for(&self, team_id: TeamId) -> &[TradeAsset] {
        if team_id == self.from_team_id {
            &self.give
        } else if team_id == self.to_team_id {
            &self.get
        } else {
            &[]
        }
    }

    pub fn assets(&self) -> impl Iterator<Item = &TradeAsset> {
        self.give.iter().chain(self.get.iter())
    }

    pub fn mark_accepted_by(&mut self, team_id: TeamId) {
        if self.involves(team_id) {
            self.accepted_by.insert(team_id);
        }
    }

    pub fn is_fully_accepted(&self) -> bool {
        self.accepted_by.contains(&self.from_team_id) && self.accepted_by.contains(&self.to_team_id)
    }

    /// One-line summary for news and event logs.
    pub fn describe(&self, league: &LeagueData) -> String {
        let list = |assets: &[TradeAsset]| -> String {
            if assets.is_empty() {
                "nothing".to_string()
            } else {
                assets
                    .iter()
                    .map(|a| a.label(league))
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        };
        format!(
            "{} sends {} to {} for {}",
            league.abbrev(self.from_team_id),
            list(&self.give),
            league.abbrev(self.to_team_id),
            list(&self.get)
        )
    }
}

// ---------------------------------------------------------------------------
// Threads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreadStatus {
    Open,
    Closed,
}

/// A negotiation between the user and one CPU team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeThread {
    pub id: String,
    pub other_team_id: TeamId,
    pub offers: Vec<TradeOffer>,
    pub status: ThreadStatus,
    pub counters_used: u32,
    pub created_tick: u64,
    pub updated_tick: u64,
}

impl TradeThread {
    pub fn open(id: impl Into<String>, other_team_id: TeamId, tick: u64) -> Self {
        Self {
            id: id.into(),
            other_team_id,
            offers: Vec::new(),
            status: ThreadStatus::Open,
            counters_used: 0,
            created_tick: tick,
            updated_tick: tick,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == ThreadStatus::Open
    }

    pub fn push_offer(&mut self, offer: TradeOffer, tick: u64) {
        self.offers.push(offer);
        self.updated_tick = tick;
    }

    pub fn last_offer(&self) -> Option<&TradeOffer> {
        self.offers.last()
    }

    pub fn last_offer_mut(&mut self) -> Option<&mut TradeOffer> {
        self.offers.last_mut()
    }

    pub fn close(&mut self, tick: u64) {
        self.status = ThreadStatus::Closed;
        self.updated_tick = tick;
    }

    /// Resume a closed negotiation. Counters already spent stay spent.
    pub fn reopen(&mut self, tick: u64) {
        self.status = ThreadStatus::Open;
        self.updated_tick = tick;
    }

    /// Whether the last word on this thread was a completed deal.
    pub fn ended_in_deal(&self) -> bool {
        self.last_offer()
            .is_some_and(|o| o.status == OfferStatus::Accepted)
    }
}
