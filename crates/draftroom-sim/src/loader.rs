// League data loading from CSV.
//
// Reads data/{teams,roster,draft_order,draft_class}.csv. Malformed rows are
// skipped with a warning; an empty table is a validation error.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use draftroom_core::league::{DraftOrderRow, LeagueData, Position, ProspectRow, RosterRow, TeamRow};
use serde::Deserialize;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LeagueDataError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV rows
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawTeam {
    team_id: u32,
    abbrev: String,
    name: String,
    wins: u32,
    losses: u32,
    #[serde(default)]
    ties: u32,
    overall: f64,
    #[serde(default)]
    cap_space: f64,
}

#[derive(Debug, Deserialize)]
struct RawPlayer {
    player_id: u32,
    name: String,
    pos: String,
    age: u32,
    rating: f64,
    team_id: u32,
    cap_hit: f64,
}

#[derive(Debug, Deserialize)]
struct RawSlot {
    overall: u32,
    round: u32,
    team_id: u32,
}

#[derive(Debug, Deserialize)]
struct RawProspect {
    player_id: u32,
    name: String,
    pos: String,
    age: u32,
    rank: u32,
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

fn load_teams_from_reader<R: Read>(rdr: R) -> Result<Vec<TeamRow>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut teams = Vec::new();
    for result in reader.deserialize::<RawTeam>() {
        match result {
            Ok(raw) => teams.push(TeamRow {
                team_id: raw.team_id,
                abbrev: raw.abbrev.trim().to_string(),
                name: raw.name.trim().to_string(),
                wins: raw.wins,
                losses: raw.losses,
                ties: raw.ties,
                overall: raw.overall,
                cap_space: raw.cap_space,
            }),
            Err(e) => warn!("skipping malformed team row: {}", e),
        }
    }
    Ok(teams)
}

fn load_roster_from_reader<R: Read>(rdr: R) -> Result<Vec<RosterRow>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut roster = Vec::new();
    for result in reader.deserialize::<RawPlayer>() {
        match result {
            Ok(raw) => {
                let Some(position) = Position::from_str_pos(&raw.pos) else {
                    warn!("skipping player '{}': unknown position '{}'", raw.name.trim(), raw.pos);
                    continue;
                };
                if !raw.rating.is_finite() || !raw.cap_hit.is_finite() {
                    warn!("skipping player '{}': non-finite rating or cap hit", raw.name.trim());
                    continue;
                }
                roster.push(RosterRow {
                    player_id: raw.player_id,
                    name: raw.name.trim().to_string(),
                    position,
                    age: raw.age,
                    rating: raw.rating,
                    team_id: raw.team_id,
                    cap_hit: raw.cap_hit,
                });
            }
            Err(e) => warn!("skipping malformed roster row: {}", e),
        }
    }
    Ok(roster)
}

fn load_draft_order_from_reader<R: Read>(rdr: R) -> Result<Vec<DraftOrderRow>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut order = Vec::new();
    for result in reader.deserialize::<RawSlot>() {
        match result {
            Ok(raw) => order.push(DraftOrderRow {
                overall: raw.overall,
                round: raw.round,
                team_id: raw.team_id,
            }),
            Err(e) => warn!("skipping malformed draft order row: {}", e),
        }
    }
    order.sort_by_key(|r| r.overall);
    Ok(order)
}

fn load_draft_class_from_reader<R: Read>(rdr: R) -> Result<Vec<ProspectRow>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut class = Vec::new();
    for result in reader.deserialize::<RawProspect>() {
        match result {
            Ok(raw) => {
                let Some(position) = Position::from_str_pos(&raw.pos) else {
                    warn!("skipping prospect '{}': unknown position '{}'", raw.name.trim(), raw.pos);
                    continue;
                };
                class.push(ProspectRow {
                    player_id: raw.player_id,
                    name: raw.name.trim().to_string(),
                    position,
                    age: raw.age,
                    rank: raw.rank,
                });
            }
            Err(e) => warn!("skipping malformed prospect row: {}", e),
        }
    }
    class.sort_by_key(|p| (p.rank, p.player_id));
    Ok(class)
}

// ---------------------------------------------------------------------------
// File loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<std::fs::File, LeagueDataError> {
    std::fs::File::open(path).map_err(|e| LeagueDataError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn csv_err(path: &Path) -> impl FnOnce(csv::Error) -> LeagueDataError + '_ {
    move |e| LeagueDataError::Csv {
        path: path.display().to_string(),
        source: e,
    }
}

/// Load the four league tables from `data_dir` and check they reference
/// each other consistently.
pub fn load_league(
    data_dir: &Path,
    season_year: u32,
    salary_cap: f64,
) -> Result<LeagueData, LeagueDataError> {
    let teams_path = data_dir.join("teams.csv");
    let roster_path = data_dir.join("roster.csv");
    let order_path = data_dir.join("draft_order.csv");
    let class_path = data_dir.join("draft_class.csv");

    let teams = load_teams_from_reader(open(&teams_path)?).map_err(csv_err(&teams_path))?;
    let roster = load_roster_from_reader(open(&roster_path)?).map_err(csv_err(&roster_path))?;
    let draft_order =
        load_draft_order_from_reader(open(&order_path)?).map_err(csv_err(&order_path))?;
    let draft_class =
        load_draft_class_from_reader(open(&class_path)?).map_err(csv_err(&class_path))?;

    let league = LeagueData {
        season_year,
        salary_cap,
        teams,
        roster,
        draft_order,
        draft_class,
    };
    validate(&league)?;
    info!(
        "Loaded league: {} teams, {} players, {} draft slots, {} prospects",
        league.teams.len(),
        league.roster.len(),
        league.draft_order.len(),
        league.draft_class.len()
    );
    Ok(league)
}

fn validate(league: &LeagueData) -> Result<(), LeagueDataError> {
    if league.teams.is_empty() {
        return Err(LeagueDataError::Validation("teams CSV produced zero valid rows".into()));
    }
    if league.draft_class.is_empty() {
        return Err(LeagueDataError::Validation(
            "draft class CSV produced zero valid rows".into(),
        ));
    }
    let team_ids: BTreeSet<u32> = league.teams.iter().map(|t| t.team_id).collect();
    if team_ids.len() != league.teams.len() {
        return Err(LeagueDataError::Validation("duplicate team_id in teams CSV".into()));
    }
    if let Some(row) = league.roster.iter().find(|p| !team_ids.contains(&p.team_id)) {
        return Err(LeagueDataError::Validation(format!(
            "player {} is on unknown team {}",
            row.player_id, row.team_id
        )));
    }
    if let Some(row) = league.draft_order.iter().find(|r| !team_ids.contains(&r.team_id)) {
        return Err(LeagueDataError::Validation(format!(
            "draft slot #{} belongs to unknown team {}",
            row.overall, row.team_id
        )));
    }
    let slots: BTreeSet<u32> = league.draft_order.iter().map(|r| r.overall).collect();
    if slots.len() != league.draft_order.len() {
        return Err(LeagueDataError::Validation("duplicate overall pick in draft order".into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
