// Pick selection for CPU teams and the user's auto-pick.

use tracing::{debug, warn};

use super::board::{DraftProspectBelief, RiskFlag};
use super::state::{apply_pick, DraftState};
use crate::config::{DraftConfig, TOP_N_WEIGHTS};
use crate::league::{LeagueData, PlayerId, ProspectRow, TeamId};
use crate::profile::DraftTeamProfile;
use crate::rng::SeededStream;

const RISK_SCALE: f64 = 0.9;
/// Score bonus per year under 23 at full long-term bias.
const YOUTH_BONUS: f64 = 1.5;

/// A ranked board entry.
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    player_id: PlayerId,
    score: f64,
    grade: f64,
}

fn candidate_score(
    belief: &DraftProspectBelief,
    prospect: &ProspectRow,
    risk_tolerance: f64,
    urgency: f64,
    long_term_bias: f64,
) -> f64 {
    let flag_penalty = belief.risk_flag.map(|f| f.penalty()).unwrap_or(0.0);
    let risk_penalty =
        belief.variance.sqrt() * (1.0 - risk_tolerance) * RISK_SCALE + flag_penalty;
    let youth = long_term_bias * YOUTH_BONUS * (23.0 - f64::from(prospect.age));
    belief.grade * prospect.position.draft_multiplier() * urgency - risk_penalty + youth
}

fn rank(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    candidates
}

/// Choose among the top `top_n` with the fixed weight ladder. `top_n` is
/// bounded by config validation.
fn choose(stream: SeededStream, key: &[u64], ranked: &[Candidate], top_n: usize) -> Option<(usize, Candidate)> {
    let n = ranked.len().min(top_n).min(TOP_N_WEIGHTS.len()).max(1);
    if ranked.is_empty() {
        return None;
    }
    let idx = stream.weighted_index(key, &TOP_N_WEIGHTS[..n]);
    ranked.get(idx).cloned().map(|c| (idx, c))
}

fn current_pick_no(state: &DraftState) -> u64 {
    state.on_clock().map(|s| u64::from(s.overall)).unwrap_or(0)
}

/// Consensus fallback when a team has no board: lowest rank available.
fn consensus_pick(state: &DraftState, league: &LeagueData) -> Option<(PlayerId, String)> {
    league
        .draft_class
        .iter()
        .filter(|p| state.available.contains(&p.player_id))
        .min_by_key(|p| (p.rank, p.player_id))
        .map(|p| {
            (
                p.player_id,
                format!("consensus board: {} {} (rank {})", p.position, p.name, p.rank),
            )
        })
}

/// CPU selection for `team_id` at the pick on the clock.
///
/// Teams below the medical-skip tolerance drop medically flagged prospects
/// (unless nothing else is left). The rest are ranked by
/// `grade * position_multiplier - risk_penalty`, and one of the top N is
/// chosen with seeded weights.
pub fn best_pick_for_team(
    state: &DraftState,
    league: &LeagueData,
    cfg: &DraftConfig,
    team_id: TeamId,
    seed: u64,
) -> Option<(PlayerId, String)> {
    let Some(beliefs) = state.belief_by_team.get(&team_id) else {
        debug!("team {team_id} has no draft board, using consensus");
        return consensus_pick(state, league);
    };
    let profile = state
        .team_profiles
        .get(&team_id)
        .copied()
        .unwrap_or_else(|| DraftTeamProfile::derive(seed, team_id));
    let skip_medical = profile.risk_tolerance < cfg.medical_skip_below;

    let score_all = |skip: bool| -> Vec<Candidate> {
        league
            .draft_class
            .iter()
            .filter(|p| state.available.contains(&p.player_id))
            .filter_map(|p| {
                let belief = beliefs.get(&p.player_id)?;
                if skip && belief.risk_flag == Some(RiskFlag::Medical) {
                    return None;
                }
                Some(Candidate {
                    player_id: p.player_id,
                    score: candidate_score(belief, p, profile.risk_tolerance, 1.0, 0.0),
                    grade: belief.grade,
                })
            })
            .collect()
    };

    let mut ranked = rank(score_all(skip_medical));
    if ranked.is_empty() && skip_medical {
        ranked = rank(score_all(false));
    }

    let stream = SeededStream::new(seed, "cpu-pick");
    let (idx, pick) = choose(
        stream,
        &[current_pick_no(state), u64::from(team_id)],
        &ranked,
        cfg.top_n,
    )?;
    let prospect = league.prospect(pick.player_id)?;
    Some((
        pick.player_id,
        format!(
            "{} takes {} {} (grade {:.1}, board #{})",
            league.abbrev(team_id),
            prospect.position,
            prospect.name,
            pick.grade,
            idx + 1
        ),
    ))
}

/// Auto-pick for the user's team.
///
/// A live target is taken first. Otherwise the user's own board is ranked
/// with the user's risk tolerance, positional urgency, and long-term bias,
/// skipping anything on the no-pick list.
pub fn user_auto_pick(
    state: &DraftState,
    league: &LeagueData,
    cfg: &DraftConfig,
    user_team: TeamId,
    seed: u64,
) -> Option<(PlayerId, String)> {
    let user = &state.user;
    if let Some(target) = user
        .targets
        .iter()
        .find(|id| state.available.contains(*id) && !user.no_pick.contains(*id))
    {
        let label = league
            .prospect(*target)
            .map(|p| format!("{} {}", p.position, p.name))
            .unwrap_or_else(|| format!("prospect {target}"));
        return Some((*target, format!("target: {label}")));
    }

    let beliefs = state.belief_by_team.get(&user_team)?;
    let ranked = rank(
        league
            .draft_class
            .iter()
            .filter(|p| state.available.contains(&p.player_id) && !user.no_pick.contains(&p.player_id))
            .filter_map(|p| {
                let belief = beliefs.get(&p.player_id)?;
                let urgency = user
                    .positional_urgency
                    .get(&p.position.group())
                    .copied()
                    .unwrap_or(1.0);
                Some(Candidate {
                    player_id: p.player_id,
                    score: candidate_score(
                        belief,
                        p,
                        user.risk_tolerance,
                        urgency,
                        user.long_term_bias,
                    ),
                    grade: belief.grade,
                })
            })
            .collect(),
    );

    let stream = SeededStream::new(seed, "user-auto-pick");
    let (idx, pick) = choose(
        stream,
        &[current_pick_no(state), u64::from(user_team)],
        &ranked,
        cfg.top_n,
    )?;
    let prospect = league.prospect(pick.player_id)?;
    Some((
        pick.player_id,
        format!(
            "auto: {} {} (grade {:.1}, board #{})",
            prospect.position,
            prospect.name,
            pick.grade,
            idx + 1
        ),
    ))
}

/// Make CPU picks until the user is on the clock or the draft ends.
pub fn run_cpu_picks(
    state: &DraftState,
    league: &LeagueData,
    cfg: &DraftConfig,
    user_team: Option<TeamId>,
    seed: u64,
) -> (DraftState, Vec<String>) {
    let mut current = state.clone();
    let mut events = Vec::new();
    while let Some(slot) = current.on_clock().cloned() {
        if Some(slot.team_id) == user_team {
            break;
        }
        let Some((player_id, note)) = best_pick_for_team(&current, league, cfg, slot.team_id, seed)
        else {
            warn!("no prospect left for pick #{}", slot.overall);
            break;
        };
        match apply_pick(&current, league, slot.overall, slot.team_id, player_id) {
            Ok(next) => {
                events.push(format!("#{} {note}", slot.overall));
                current = next;
            }
            Err(e) => {
                warn!("CPU pick #{} failed: {e}", slot.overall);
                break;
            }
        }
    }
    (current, events)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
