// Draft pick value curve.
//
// TVU(overall) = A * (overall + B)^-k, discounted per year for future drafts.
// Picks whose slot is not yet known are projected from the original team's
// strength.

use tracing::debug;

use crate::config::ValuationConfig;
use crate::league::LeagueData;
use crate::state::{PickKey, SaveState};

/// Base TVU of the pick at `overall` (1-based). Strictly decreasing.
pub fn pick_base_tvu(cfg: &ValuationConfig, overall: u32) -> f64 {
    let x = f64::from(overall.max(1)) + cfg.pick_curve_offset;
    cfg.pick_curve_scale * x.powf(-cfg.pick_curve_exponent)
}

/// Base TVU discounted by `(1 - future_discount)^year_offset`.
pub fn discounted_pick_tvu(cfg: &ValuationConfig, overall: u32, year_offset: u32) -> f64 {
    let factor = (1.0 - cfg.future_discount).powi(year_offset as i32);
    pick_base_tvu(cfg, overall) * factor
}

/// Projected overall slot for a pick whose slot is unknown.
///
/// Weak teams pick early in every round. Future picks are pulled halfway
/// toward the middle of the round since next year's standings are unknown.
pub fn projected_overall(
    league: &LeagueData,
    round: u32,
    original_team_id: u32,
    year_offset: u32,
) -> u32 {
    let teams = league.num_teams().max(1) as f64;
    let strength = league.team_strength(original_team_id);
    let by_strength = 1.0 + (teams - 1.0) * strength;
    let slot = if year_offset == 0 {
        by_strength
    } else {
        0.5 * (teams + 1.0) / 2.0 + 0.5 * by_strength
    };
    let slot = slot.round().clamp(1.0, teams) as u32;
    round.saturating_sub(1) * teams as u32 + slot
}

/// Overall slot for a pick: the declared one, else the inventory's record for
/// current-year picks, else a projection.
pub fn resolve_overall(
    league: &LeagueData,
    save: &SaveState,
    key: &PickKey,
    overall: Option<u32>,
) -> u32 {
    if let Some(o) = overall {
        return o;
    }
    if key.year_offset == 0 {
        if let Some((_, pick)) = save.pick_inventory.find(key) {
            if let Some(o) = pick.overall {
                return o;
            }
        }
        if let Some(row) = league
            .draft_order
            .iter()
            .find(|r| r.round == key.round && r.team_id == key.original_team_id)
        {
            return row.overall;
        }
        debug!("no slot on record for {key}, projecting");
    }
    projected_overall(league, key.round, key.original_team_id, key.year_offset)
}

/// Context-free TVU of a pick.
pub fn pick_tvu(
    league: &LeagueData,
    save: &SaveState,
    cfg: &ValuationConfig,
    key: &PickKey,
    overall: Option<u32>,
) -> f64 {
    let slot = resolve_overall(league, save, key, overall);
    discounted_pick_tvu(cfg, slot, key.year_offset)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
