// Shared fixtures for unit and integration tests.
//
// `sample_league` builds a small, fully deterministic eight-team league: a
// clear spread from contender to rebuilder, three-round draft, near-complete
// rosters, and a forty-player draft class.

use crate::config::EngineConfig;
use crate::league::{
    DraftOrderRow, LeagueData, PlayerId, Position, ProspectRow, RosterRow, TeamId, TeamRow,
};
use crate::state::SaveState;
use crate::trade::TradeAsset;

pub const SAMPLE_SEED: u64 = 20_260_417;

const SAMPLE_CAP: f64 = 255_000_000.0;
const ROUNDS: u32 = 3;
const PROSPECTS: u32 = 40;

/// (team id, abbrev, name, wins, losses, overall)
const TEAMS: [(TeamId, &str, &str, u32, u32, f64); 8] = [
    (1, "HAR", "Harbor City Gulls", 15, 2, 92.0),
    (2, "RDG", "Ridgeback Miners", 13, 4, 86.0),
    (3, "LKS", "Lakeshore Pilots", 11, 6, 80.0),
    (4, "PRA", "Prairie Stampede", 9, 8, 76.0),
    (5, "CAN", "Canyon Hawks", 8, 9, 74.0),
    (6, "DUN", "Dunmore Forge", 6, 11, 70.0),
    (7, "BAY", "Baywater Herons", 4, 13, 66.0),
    (8, "FRN", "Frontier Rangers", 2, 15, 61.0),
];

/// Base depth chart before each team's one missing player.
const DEPTH: [(Position, u32); 11] = [
    (Position::Quarterback, 2),
    (Position::RunningBack, 3),
    (Position::WideReceiver, 5),
    (Position::TightEnd, 2),
    (Position::OffensiveLine, 8),
    (Position::DefensiveLine, 7),
    (Position::Linebacker, 5),
    (Position::Cornerback, 4),
    (Position::Safety, 4),
    (Position::Kicker, 1),
    (Position::Punter, 1),
];

pub fn sample_config() -> EngineConfig {
    EngineConfig::default()
}

pub fn sample_save(league: &LeagueData) -> SaveState {
    SaveState::new(league, &sample_config())
}

pub fn sample_league() -> LeagueData {
    let teams: Vec<TeamRow> = TEAMS
        .iter()
        .map(|&(team_id, abbrev, name, wins, losses, overall)| TeamRow {
            team_id,
            abbrev: abbrev.to_string(),
            name: name.to_string(),
            wins,
            losses,
            ties: 0,
            overall,
            cap_space: 12_000_000.0 + f64::from(team_id) * 2_500_000.0,
        })
        .collect();

    // Worst record picks first in every round.
    let order: Vec<TeamId> = (1..=8).rev().collect();
    let mut draft_order = Vec::new();
    for round in 1..=ROUNDS {
        for (i, &team_id) in order.iter().enumerate() {
            draft_order.push(DraftOrderRow {
                overall: (round - 1) * order.len() as u32 + i as u32 + 1,
                round,
                team_id,
            });
        }
    }

    let mut roster = Vec::new();
    for &(team_id, abbrev, _, _, _, team_ovr) in &TEAMS {
        let skipped = team_id as usize % DEPTH.len();
        let mut idx: u32 = 0;
        for (slot, &(position, count)) in DEPTH.iter().enumerate() {
            let count = if slot == skipped { count - 1 } else { count };
            for depth in 0..count {
                roster.push(sample_player(team_id, abbrev, team_ovr, idx, depth, position));
                idx += 1;
            }
        }
    }

    // Franchise quarterback on the worst team, well paid but still a bargain.
    if let Some(qb) = roster
        .iter_mut()
        .find(|p| p.team_id == 8 && p.position == Position::Quarterback)
    {
        qb.name = "FRN Franchise QB".to_string();
        qb.rating = 90.0;
        qb.age = 30;
        qb.cap_hit = 20_000_000.0;
    }

    let draft_class = (1..=PROSPECTS)
        .map(|rank| {
            let position = Position::ALL[(rank as usize * 7) % Position::ALL.len()];
            ProspectRow {
                player_id: 50_000 + rank,
                name: format!("Prospect {rank:02}"),
                position,
                age: 21 + rank % 3,
                rank,
            }
        })
        .collect();

    LeagueData {
        season_year: 2026,
        salary_cap: SAMPLE_CAP,
        teams,
        roster,
        draft_order,
        draft_class,
    }
}

/// The sample league with the runner-up's backup quarterback gone.
///
/// The thin depth chart makes team 2 shop for the worst team's franchise
/// quarterback during the season, so the CPU market actually trades.
pub fn qb_hungry_league() -> LeagueData {
    let mut league = sample_league();
    league.roster.retain(|p| p.player_id != QB_HUNGRY_BACKUP);
    league
}

/// Team 2's backup quarterback, dropped by `qb_hungry_league`.
const QB_HUNGRY_BACKUP: PlayerId = 2001;

fn sample_player(
    team_id: TeamId,
    abbrev: &str,
    team_ovr: f64,
    idx: u32,
    depth: u32,
    position: Position,
) -> RosterRow {
    // Starters sit near the team rating, backups fall off with depth.
    let wobble = f64::from((idx * 13 + team_id * 7) % 11) - 5.0;
    let rating = (team_ovr - 2.0 - 3.0 * f64::from(depth) + wobble).clamp(50.0, 95.0);
    let age = 22 + (idx * 5 + team_id) % 12;
    // Contracts run from deep discount to overpay relative to production.
    let pay = 0.45 + 0.1 * f64::from((idx * 7 + team_id * 3) % 10);
    let production = SAMPLE_CAP * position.cap_share() * rating_share(rating);
    RosterRow {
        player_id: team_id * 1000 + idx,
        name: format!("{abbrev} {} {}", position.display_str(), depth + 1),
        position,
        age,
        rating,
        team_id,
        cap_hit: (production * pay).max(795_000.0),
    }
}

/// Rough fraction of a position's top-of-market deal a player of this
/// rating earns.
fn rating_share(rating: f64) -> f64 {
    ((rating - 50.0) / 45.0).clamp(0.05, 1.0).powi(2)
}

fn find_pick(save: &SaveState, team_id: TeamId, round: u32, year_offset: u32) -> TradeAsset {
    save.pick_inventory
        .picks_for(team_id)
        .iter()
        .find(|p| p.year_offset == year_offset && p.round == round && p.original_team_id == team_id)
        .map(|p| TradeAsset::pick(p, team_id))
        .unwrap_or_else(|| {
            panic!("team {team_id} does not own its year+{year_offset} round {round} pick")
        })
}

/// `team_id`'s own current-year pick in `round`.
pub fn current_pick(save: &SaveState, team_id: TeamId, round: u32) -> TradeAsset {
    find_pick(save, team_id, round, 0)
}

/// `team_id`'s own pick in `round`, `year_offset` drafts out.
pub fn future_pick(save: &SaveState, team_id: TeamId, round: u32, year_offset: u32) -> TradeAsset {
    find_pick(save, team_id, round, year_offset)
}
