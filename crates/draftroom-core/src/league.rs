// Read-only league data surface: teams, rosters, draft order, draft class.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub type TeamId = u32;
pub type PlayerId = u32;

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// Football positions as they appear on league rosters and the draft class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    Quarterback,
    RunningBack,
    WideReceiver,
    TightEnd,
    OffensiveLine,
    DefensiveLine,
    Linebacker,
    Cornerback,
    Safety,
    Kicker,
    Punter,
}

impl Position {
    pub const ALL: [Position; 11] = [
        Position::Quarterback,
        Position::RunningBack,
        Position::WideReceiver,
        Position::TightEnd,
        Position::OffensiveLine,
        Position::DefensiveLine,
        Position::Linebacker,
        Position::Cornerback,
        Position::Safety,
        Position::Kicker,
        Position::Punter,
    ];

    /// Parse a roster position string.
    ///
    /// Line and secondary sub-positions collapse onto their unit:
    /// - "T", "G", "C", "OT", "OG" -> OffensiveLine
    /// - "DE", "DT", "NT", "EDGE" -> DefensiveLine
    /// - "OLB", "ILB", "MLB" -> Linebacker
    /// - "FS", "SS" -> Safety
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" | "HB" | "FB" => Some(Position::RunningBack),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "OL" | "OT" | "OG" | "T" | "G" | "C" => Some(Position::OffensiveLine),
            "DL" | "DE" | "DT" | "NT" | "EDGE" => Some(Position::DefensiveLine),
            "LB" | "OLB" | "ILB" | "MLB" => Some(Position::Linebacker),
            "CB" => Some(Position::Cornerback),
            "S" | "FS" | "SS" => Some(Position::Safety),
            "K" => Some(Position::Kicker),
            "P" => Some(Position::Punter),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::OffensiveLine => "OL",
            Position::DefensiveLine => "DL",
            Position::Linebacker => "LB",
            Position::Cornerback => "CB",
            Position::Safety => "S",
            Position::Kicker => "K",
            Position::Punter => "P",
        }
    }

    /// Roster unit this position counts toward for need calculations.
    pub fn group(&self) -> PositionGroup {
        match self {
            Position::Quarterback => PositionGroup::Quarterback,
            Position::RunningBack => PositionGroup::Backfield,
            Position::WideReceiver => PositionGroup::Receiver,
            Position::TightEnd => PositionGroup::TightEnd,
            Position::OffensiveLine => PositionGroup::OffensiveLine,
            Position::DefensiveLine => PositionGroup::DefensiveLine,
            Position::Linebacker => PositionGroup::Linebacker,
            Position::Cornerback | Position::Safety => PositionGroup::Secondary,
            Position::Kicker | Position::Punter => PositionGroup::Specialist,
        }
    }

    /// Share of the salary cap a top starter at this position commands.
    pub fn cap_share(&self) -> f64 {
        match self {
            Position::Quarterback => 0.13,
            Position::RunningBack => 0.035,
            Position::WideReceiver => 0.075,
            Position::TightEnd => 0.045,
            Position::OffensiveLine => 0.055,
            Position::DefensiveLine => 0.07,
            Position::Linebacker => 0.04,
            Position::Cornerback => 0.06,
            Position::Safety => 0.04,
            Position::Kicker => 0.012,
            Position::Punter => 0.01,
        }
    }

    /// Age at which a player at this position is valued highest.
    pub fn prime_age(&self) -> u32 {
        match self {
            Position::Quarterback => 29,
            Position::RunningBack => 25,
            Position::WideReceiver | Position::TightEnd => 27,
            Position::OffensiveLine => 28,
            Position::DefensiveLine => 27,
            Position::Linebacker | Position::Cornerback => 26,
            Position::Safety => 27,
            Position::Kicker | Position::Punter => 31,
        }
    }

    /// Positional premium applied to board grades when picking.
    pub fn draft_multiplier(&self) -> f64 {
        match self {
            Position::Quarterback => 1.10,
            Position::RunningBack => 0.94,
            Position::WideReceiver => 1.02,
            Position::TightEnd => 0.97,
            Position::OffensiveLine => 1.03,
            Position::DefensiveLine => 1.04,
            Position::Linebacker => 0.97,
            Position::Cornerback => 1.02,
            Position::Safety => 0.97,
            Position::Kicker => 0.70,
            Position::Punter => 0.68,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// Roster units used for need scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PositionGroup {
    Quarterback,
    Backfield,
    Receiver,
    TightEnd,
    OffensiveLine,
    DefensiveLine,
    Linebacker,
    Secondary,
    Specialist,
}

impl PositionGroup {
    pub const ALL: [PositionGroup; 9] = [
        PositionGroup::Quarterback,
        PositionGroup::Backfield,
        PositionGroup::Receiver,
        PositionGroup::TightEnd,
        PositionGroup::OffensiveLine,
        PositionGroup::DefensiveLine,
        PositionGroup::Linebacker,
        PositionGroup::Secondary,
        PositionGroup::Specialist,
    ];

    /// Healthy depth a team wants at this unit.
    pub fn desired_count(&self) -> u32 {
        match self {
            PositionGroup::Quarterback => 3,
            PositionGroup::Backfield => 4,
            PositionGroup::Receiver => 6,
            PositionGroup::TightEnd => 3,
            PositionGroup::OffensiveLine => 9,
            PositionGroup::DefensiveLine => 8,
            PositionGroup::Linebacker => 6,
            PositionGroup::Secondary => 9,
            PositionGroup::Specialist => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PositionGroup::Quarterback => "QB",
            PositionGroup::Backfield => "RB",
            PositionGroup::Receiver => "WR",
            PositionGroup::TightEnd => "TE",
            PositionGroup::OffensiveLine => "OL",
            PositionGroup::DefensiveLine => "DL",
            PositionGroup::Linebacker => "LB",
            PositionGroup::Secondary => "DB",
            PositionGroup::Specialist => "ST",
        }
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRow {
    pub team_id: TeamId,
    pub abbrev: String,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    #[serde(default)]
    pub ties: u32,
    /// Team overall rating on the 0-100 scale.
    pub overall: f64,
    #[serde(default)]
    pub cap_space: f64,
}

impl TeamRow {
    pub fn games_played(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// Win percentage with ties as half a win. `None` before any game.
    pub fn win_pct(&self) -> Option<f64> {
        let games = self.games_played();
        if games == 0 {
            return None;
        }
        Some((f64::from(self.wins) + 0.5 * f64::from(self.ties)) / f64::from(games))
    }
}

/// A rostered player. `cap_hit` is the annual cap charge in dollars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterRow {
    pub player_id: PlayerId,
    pub name: String,
    pub position: Position,
    pub age: u32,
    pub rating: f64,
    pub team_id: TeamId,
    pub cap_hit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftOrderRow {
    pub overall: u32,
    pub round: u32,
    pub team_id: TeamId,
}

/// A draft-eligible prospect. `rank` is the consensus board rank (1 = best).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProspectRow {
    pub player_id: PlayerId,
    pub name: String,
    pub position: Position,
    pub age: u32,
    pub rank: u32,
}

// ---------------------------------------------------------------------------
// LeagueData
// ---------------------------------------------------------------------------

/// Everything the engine reads but never writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeagueData {
    pub season_year: u32,
    /// League-wide salary cap in dollars.
    pub salary_cap: f64,
    pub teams: Vec<TeamRow>,
    pub roster: Vec<RosterRow>,
    pub draft_order: Vec<DraftOrderRow>,
    pub draft_class: Vec<ProspectRow>,
}

impl LeagueData {
    pub fn team(&self, team_id: TeamId) -> Option<&TeamRow> {
        self.teams.iter().find(|t| t.team_id == team_id)
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&RosterRow> {
        self.roster.iter().find(|p| p.player_id == player_id)
    }

    pub fn prospect(&self, player_id: PlayerId) -> Option<&ProspectRow> {
        self.draft_class.iter().find(|p| p.player_id == player_id)
    }

    /// All team ids in ascending order.
    pub fn team_ids(&self) -> Vec<TeamId> {
        let ids: BTreeSet<TeamId> = self.teams.iter().map(|t| t.team_id).collect();
        ids.into_iter().collect()
    }

    pub fn num_teams(&self) -> usize {
        self.teams.len()
    }

    /// Number of draft rounds, taken from the draft order rows.
    pub fn rounds(&self) -> u32 {
        self.draft_order.iter().map(|r| r.round).max().unwrap_or(0)
    }

    /// Abbreviation for log and news lines; falls back to `T{id}`.
    pub fn abbrev(&self, team_id: TeamId) -> String {
        self.team(team_id)
            .map(|t| t.abbrev.clone())
            .unwrap_or_else(|| format!("T{team_id}"))
    }

    /// Team strength in `[0, 1]`: `0.6 * win_pct + 0.4 * rating component`.
    ///
    /// Before any game is played only the rating component counts. Unknown
    /// teams sit at a neutral 0.5.
    pub fn team_strength(&self, team_id: TeamId) -> f64 {
        let Some(team) = self.team(team_id) else {
            return 0.5;
        };
        let rating = ((team.overall - 60.0) / 35.0).clamp(0.0, 1.0);
        match team.win_pct() {
            Some(pct) => (0.6 * pct + 0.4 * rating).clamp(0.0, 1.0),
            None => rating,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
