// Team-context multipliers: competitive window for picks, roster need for
// players.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::league::{LeagueData, PositionGroup, TeamId};
use crate::state::SaveState;

const FUTURE_TILT: f64 = 0.30;
const CURRENT_TILT: f64 = 0.10;
const NEED_BASE: f64 = 0.85;
const NEED_SPAN: f64 = 0.40;

/// Where a team sits on the rebuild/contend spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamWindow {
    Rebuilding,
    Middle,
    Contending,
}

impl TeamWindow {
    pub fn from_strength(strength: f64) -> Self {
        if strength >= 0.55 {
            TeamWindow::Contending
        } else if strength <= 0.45 {
            TeamWindow::Rebuilding
        } else {
            TeamWindow::Middle
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TeamWindow::Rebuilding => "rebuilding",
            TeamWindow::Middle => "middle",
            TeamWindow::Contending => "contending",
        }
    }
}

/// Pick multiplier from team strength `s`: `tilt = 2 * (0.5 - s)`, then
/// `1 + 0.30 * tilt` for future picks and `1 + 0.10 * tilt` for current ones.
///
/// Rebuilders (tilt > 0) value picks above par; contenders discount them.
pub fn window_multiplier(strength: f64, year_offset: u32) -> f64 {
    let tilt = 2.0 * (0.5 - strength.clamp(0.0, 1.0));
    if year_offset > 0 {
        1.0 + FUTURE_TILT * tilt
    } else {
        1.0 + CURRENT_TILT * tilt
    }
}

/// Shortfall at a position group, in `[0, 1]`.
pub fn need_score(league: &LeagueData, save: &SaveState, team_id: TeamId, group: PositionGroup) -> f64 {
    let desired = f64::from(group.desired_count());
    let have = save
        .roster_of(league, team_id)
        .iter()
        .filter(|p| p.position.group() == group)
        .count() as f64;
    ((desired - have) / desired).clamp(0.0, 1.0)
}

/// `0.85 + 0.40 * need`, in `[0.85, 1.25]`.
pub fn need_multiplier(need: f64) -> f64 {
    NEED_BASE + NEED_SPAN * need.clamp(0.0, 1.0)
}

/// Need score for every group.
pub fn team_needs(
    league: &LeagueData,
    save: &SaveState,
    team_id: TeamId,
) -> BTreeMap<PositionGroup, f64> {
    PositionGroup::ALL
        .iter()
        .map(|&group| (group, need_score(league, save, team_id, group)))
        .collect()
}

/// The group with the largest shortfall. Ties go to the earlier group in
/// `PositionGroup::ALL`.
pub fn top_need(league: &LeagueData, save: &SaveState, team_id: TeamId) -> Option<(PositionGroup, f64)> {
    let needs = team_needs(league, save, team_id);
    let mut best: Option<(PositionGroup, f64)> = None;
    for group in PositionGroup::ALL {
        let need = needs.get(&group).copied().unwrap_or(0.0);
        if best.map_or(true, |(_, b)| need > b) {
            best = Some((group, need));
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{qb_hungry_league, sample_config, sample_league};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn rebuilder_values_future_first_above_contender() {
        let rebuilder = window_multiplier(0.1, 1);
        let contender = window_multiplier(0.9, 1);
        assert!(rebuilder > contender);
        assert!(approx_eq(rebuilder, 1.24, 1e-12));
        assert!(approx_eq(contender, 0.76, 1e-12));
    }

    #[test]
    fn current_picks_tilt_less() {
        assert!(approx_eq(window_multiplier(0.0, 0), 1.10, 1e-12));
        assert!(approx_eq(window_multiplier(1.0, 0), 0.90, 1e-12));
        assert!(approx_eq(window_multiplier(0.5, 2), 1.0, 1e-12));
    }

    #[test]
    fn need_multiplier_bounds() {
        assert!(approx_eq(need_multiplier(0.0), 0.85, 1e-12));
        assert!(approx_eq(need_multiplier(1.0), 1.25, 1e-12));
        assert!(approx_eq(need_multiplier(7.0), 1.25, 1e-12));
    }

    #[test]
    fn needs_track_roster_moves() {
        let league = sample_league();
        let save = SaveState::new(&league, &sample_config());
        let qb = league
            .roster
            .iter()
            .find(|p| p.team_id == 1 && p.position.group() == PositionGroup::Quarterback)
            .unwrap();

        let before = need_score(&league, &save, 1, PositionGroup::Quarterback);
        let mut moved = save.clone();
        moved.player_team_override.insert(qb.player_id, 2);
        let after = need_score(&league, &moved, 1, PositionGroup::Quarterback);
        assert!(after > before);
        assert!(approx_eq(after - before, 1.0 / 3.0, 1e-12));

        let needs = team_needs(&league, &moved, 1);
        assert_eq!(needs.len(), PositionGroup::ALL.len());
        assert!(approx_eq(needs[&PositionGroup::Quarterback], after, 1e-12));
    }

    #[test]
    fn team_needs_agree_with_need_score() {
        let league = qb_hungry_league();
        let save = SaveState::new(&league, &sample_config());
        for team_id in league.team_ids() {
            let needs = team_needs(&league, &save, team_id);
            for group in PositionGroup::ALL {
                assert_eq!(needs[&group], need_score(&league, &save, team_id, group));
            }
        }
        let (group, need) = top_need(&league, &save, 2).unwrap();
        assert_eq!(group, PositionGroup::Quarterback);
        assert!(approx_eq(need, 2.0 / 3.0, 1e-12));
    }

    #[test]
    fn windows_from_strength() {
        assert_eq!(TeamWindow::from_strength(0.9), TeamWindow::Contending);
        assert_eq!(TeamWindow::from_strength(0.5), TeamWindow::Middle);
        assert_eq!(TeamWindow::from_strength(0.1), TeamWindow::Rebuilding);
    }
}
