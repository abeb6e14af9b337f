// CPU market activity: inbound draft offers to the user and CPU-to-CPU
// trades on draft day and during the season.
//
// Every gate and tie-break is keyed by (seed, tick or pick number, team), so
// the same call against the same save always produces the same trades.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use super::apply::try_apply_trade;
use super::evaluate::{asset_base_tvu, evaluate_offer};
use super::negotiate::accept_decision;
use super::types::{OfferEvals, OfferOrigin, OfferStatus, TradeAsset, TradeEval, TradeOffer, TradePhase};
use crate::context::EngineContext;
use crate::draft::DraftSlot;
use crate::league::{PlayerId, TeamId};
use crate::profile::{DraftTeamProfile, TeamProfile};
use crate::rng::SeededStream;
use crate::state::StateDelta;
use crate::valuation::context::{top_need, TeamWindow};
use crate::valuation::player::player_tvu;

/// Packages aim for this band around the target value.
const PACKAGE_LOW: f64 = 0.90;
const PACKAGE_HIGH: f64 = 1.20;
/// Players each buyer looks at per week.
const SHORTLIST: usize = 3;

// ---------------------------------------------------------------------------
// Package building
// ---------------------------------------------------------------------------

/// Assemble picks from `team_id`'s inventory worth roughly `target` TVU.
///
/// Current-year picks at or before `after_overall` are never offered (they
/// are used or about to be). Greedy from the most valuable pick that still
/// fits under the band; falls back to the cheapest single pick that covers
/// the target. Empty when nothing works.
pub fn build_pick_package(
    ctx: &EngineContext<'_>,
    team_id: TeamId,
    target: f64,
    after_overall: Option<u32>,
) -> Vec<TradeAsset> {
    let max_assets = ctx.config.market.max_package_assets;
    let mut candidates: Vec<(f64, TradeAsset)> = ctx
        .save
        .pick_inventory
        .picks_for(team_id)
        .iter()
        .filter(|p| match (p.year_offset, p.overall, after_overall) {
            (0, Some(o), Some(after)) => o > after,
            _ => true,
        })
        .map(|p| {
            let asset = TradeAsset::pick(p, team_id);
            (asset_base_tvu(ctx, &asset), asset)
        })
        .collect();
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.id().cmp(&b.1.id())));

    let mut package = Vec::new();
    let mut value = 0.0;
    for (v, asset) in &candidates {
        if value >= target * PACKAGE_LOW || package.len() >= max_assets {
            break;
        }
        if value + v <= target * PACKAGE_HIGH {
            value += v;
            package.push(asset.clone());
        }
    }
    if value >= target * PACKAGE_LOW {
        return package;
    }

    candidates
        .iter()
        .rev()
        .find(|(v, _)| *v >= target)
        .map(|(_, a)| vec![a.clone()])
        .unwrap_or_default()
}

/// Mark an offer accepted by both parties with both evals recorded.
fn finalize(mut offer: TradeOffer, from_eval: TradeEval, to_eval: TradeEval) -> TradeOffer {
    offer.eval = Some(OfferEvals {
        from: from_eval,
        to: to_eval,
    });
    let (a, b) = (offer.from_team_id, offer.to_team_id);
    offer.mark_accepted_by(a);
    offer.mark_accepted_by(b);
    offer.status = OfferStatus::Accepted;
    offer
}

fn pick_asset_for_slot(ctx: &EngineContext<'_>, slot: &DraftSlot) -> Option<TradeAsset> {
    let key = slot.pick_key();
    let (owner, pick) = ctx.save.pick_inventory.find(&key)?;
    if owner != slot.team_id {
        warn!("pick #{} is held by {owner} in the inventory but slot says {}", slot.overall, slot.team_id);
        return None;
    }
    Some(TradeAsset::pick(pick, owner))
}

// ---------------------------------------------------------------------------
// Inbound draft offers
// ---------------------------------------------------------------------------

/// Offers from CPU teams for the user's pick at `pick_no`.
///
/// Each CPU team passes a seeded gate driven by its trade frequency, builds
/// a pick package near the pick's value, and only sends it if it would
/// accept the deal itself. Offers are sorted best-for-the-user first.
pub fn generate_inbound_draft_offers(
    ctx: &EngineContext<'_>,
    user_team: TeamId,
    pick_no: u32,
    max_offers: usize,
) -> Vec<TradeOffer> {
    let Some(draft) = &ctx.save.draft else {
        return Vec::new();
    };
    let Some(slot) = draft.slot(pick_no).filter(|s| s.team_id == user_team) else {
        debug!("user does not hold pick #{pick_no}");
        return Vec::new();
    };
    if draft.results.contains_key(&pick_no) {
        return Vec::new();
    }
    let Some(user_pick) = pick_asset_for_slot(ctx, slot) else {
        return Vec::new();
    };
    let target = asset_base_tvu(ctx, &user_pick);
    let gate = SeededStream::new(ctx.seed, "inbound-offer-gate");

    let mut offers: Vec<(f64, TradeOffer)> = Vec::new();
    for team_id in ctx.league.team_ids() {
        if team_id == user_team {
            continue;
        }
        let profile = draft
            .team_profiles
            .get(&team_id)
            .copied()
            .unwrap_or_else(|| DraftTeamProfile::derive(ctx.seed, team_id));
        if !gate.chance(&[u64::from(pick_no), u64::from(team_id)], profile.trade_frequency) {
            continue;
        }
        let package = build_pick_package(ctx, team_id, target, Some(pick_no));
        if package.is_empty() {
            continue;
        }
        let mut offer = TradeOffer::new(
            format!("in-{}-{pick_no}-{team_id}", draft.year),
            team_id,
            user_team,
            package,
            vec![user_pick.clone()],
            u64::from(pick_no),
            TradePhase::Draft,
            OfferOrigin::Cpu,
        );
        let decision = accept_decision(ctx, &offer, team_id);
        if !decision.accept {
            debug!("{} passes on #{pick_no}: {}", ctx.league.abbrev(team_id), decision.rationale);
            continue;
        }
        let user_eval = evaluate_offer(ctx, &offer, user_team);
        let appeal = user_eval.net_gain - user_eval.threshold;
        offer.eval = Some(OfferEvals {
            from: decision.eval,
            to: user_eval,
        });
        offer.mark_accepted_by(team_id);
        offer.message = Some(format!(
            "{} wants to move up to #{pick_no}",
            ctx.league.abbrev(team_id)
        ));
        offers.push((appeal, offer));
    }

    offers.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| a.1.from_team_id.cmp(&b.1.from_team_id))
    });
    offers
        .into_iter()
        .take(max_offers)
        .map(|(_, o)| o)
        .collect()
}

// ---------------------------------------------------------------------------
// CPU-to-CPU draft trades
// ---------------------------------------------------------------------------

/// At most one CPU-to-CPU trade for the pick on the clock.
///
/// Skipped when the user is on the clock or the round has used its trade
/// allowance. Among CPU teams that pass the gate and build a package both
/// sides accept, the holder takes the offer it likes best.
pub fn simulate_cpu_cpu_draft_trades(
    ctx: &EngineContext<'_>,
    max_per_round: u32,
) -> (StateDelta, Vec<String>) {
    let Some(draft) = &ctx.save.draft else {
        return (StateDelta::default(), Vec::new());
    };
    let Some(slot) = draft.on_clock().cloned() else {
        return (StateDelta::default(), Vec::new());
    };
    if ctx.is_user_team(slot.team_id) || draft.trades_in_round(slot.round) >= max_per_round {
        return (StateDelta::default(), Vec::new());
    }
    let Some(pick) = pick_asset_for_slot(ctx, &slot) else {
        return (StateDelta::default(), Vec::new());
    };
    let holder = slot.team_id;
    let target = asset_base_tvu(ctx, &pick);
    let gate = SeededStream::new(ctx.seed, "draft-trade-gate");

    let mut best: Option<(f64, TradeOffer)> = None;
    for team_id in ctx.league.team_ids() {
        if team_id == holder || ctx.is_user_team(team_id) {
            continue;
        }
        let profile = draft
            .team_profiles
            .get(&team_id)
            .copied()
            .unwrap_or_else(|| DraftTeamProfile::derive(ctx.seed, team_id));
        let p = profile.trade_frequency * (0.5 + 0.5 * profile.aggression);
        if !gate.chance(&[u64::from(slot.overall), u64::from(team_id)], p) {
            continue;
        }
        let package = build_pick_package(ctx, team_id, target, Some(slot.overall));
        if package.is_empty() {
            continue;
        }
        let offer = TradeOffer::new(
            format!("dt-{}-{}-{team_id}", draft.year, slot.overall),
            team_id,
            holder,
            package,
            vec![pick.clone()],
            u64::from(slot.overall),
            TradePhase::Draft,
            OfferOrigin::Cpu,
        );
        let buyer = accept_decision(ctx, &offer, team_id);
        if !buyer.accept {
            continue;
        }
        let seller = accept_decision(ctx, &offer, holder);
        if !seller.accept {
            continue;
        }
        let margin = seller.eval.net_gain - seller.eval.threshold;
        if best.as_ref().map_or(true, |(m, _)| margin > *m) {
            best = Some((margin, finalize(offer, buyer.eval, seller.eval)));
        }
    }

    let Some((_, offer)) = best else {
        return (StateDelta::default(), Vec::new());
    };
    let mut delta = match try_apply_trade(ctx, &offer) {
        Ok(d) => d,
        Err(e) => {
            warn!("draft trade {} failed to apply: {e}", offer.id);
            return (StateDelta::default(), Vec::new());
        }
    };

    let event = format!("Draft trade: {}", offer.describe(ctx.league));
    info!("{event}");
    let mut next_draft = delta.draft.take().unwrap_or_else(|| draft.clone());
    *next_draft.trades_by_round.entry(slot.round).or_insert(0) += 1;
    next_draft.news.push(event.clone());
    delta.draft = Some(next_draft);
    (delta, vec![event])
}

// ---------------------------------------------------------------------------
// CPU-to-CPU season trades
// ---------------------------------------------------------------------------

/// Weekly CPU trade market.
///
/// Contenders shop for a veteran at their biggest need from rebuilding
/// teams, paying in picks. Both sides must accept, trades apply one after
/// another against the updated save, and at most `max_trades_per_week`
/// happen. The user's team never takes part.
pub fn simulate_cpu_cpu_season_trades(
    ctx: &EngineContext<'_>,
    tick: u64,
    max_trades_per_week: u32,
) -> (StateDelta, Vec<String>) {
    let league = ctx.league;
    let gate = SeededStream::new(ctx.seed, "season-trade-gate");
    let mut working = ctx.save.clone();
    let mut events = Vec::new();
    let mut trades = 0u32;

    let cpu_teams: Vec<TeamId> = league
        .team_ids()
        .into_iter()
        .filter(|t| !ctx.is_user_team(*t))
        .collect();
    let window = |t: TeamId| TeamWindow::from_strength(league.team_strength(t));
    let buyers: Vec<TeamId> = cpu_teams
        .iter()
        .copied()
        .filter(|t| window(*t) == TeamWindow::Contending)
        .collect();
    let sellers: BTreeSet<TeamId> = cpu_teams
        .iter()
        .copied()
        .filter(|t| window(*t) == TeamWindow::Rebuilding)
        .collect();

    for buyer in buyers {
        if trades >= max_trades_per_week {
            break;
        }
        let profile = TeamProfile::derive(ctx.seed, buyer);
        let frequency = DraftTeamProfile::derive(ctx.seed, buyer).trade_frequency;
        let p = frequency * (0.4 + 0.6 * profile.aggression);
        if !gate.chance(&[tick, u64::from(buyer)], p) {
            continue;
        }

        let wctx = ctx.with_save(&working);
        let Some((group, need)) = top_need(league, &working, buyer) else {
            continue;
        };
        if need <= 0.0 {
            continue;
        }

        let mut shortlist: Vec<(f64, PlayerId, TeamId)> = league
            .roster
            .iter()
            .filter(|p| p.position.group() == group)
            .filter_map(|p| {
                let team = working.team_of(league, p.player_id)?;
                if !sellers.contains(&team) {
                    return None;
                }
                let tvu = player_tvu(league, &ctx.config.valuation, ctx.seed, p.player_id);
                (tvu > 0.0).then_some((tvu, p.player_id, team))
            })
            .collect();
        shortlist.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        shortlist.truncate(SHORTLIST);

        let mut applied = None;
        for (tvu, player_id, seller) in shortlist {
            let package = build_pick_package(&wctx, buyer, tvu, None);
            if package.is_empty() {
                continue;
            }
            let offer = TradeOffer::new(
                format!("st-{tick}-{buyer}-{player_id}"),
                buyer,
                seller,
                package,
                vec![TradeAsset::player(player_id, seller)],
                tick,
                TradePhase::Season,
                OfferOrigin::Cpu,
            );
            let buy = accept_decision(&wctx, &offer, buyer);
            if !buy.accept {
                continue;
            }
            let sell = accept_decision(&wctx, &offer, seller);
            if !sell.accept {
                continue;
            }
            let offer = finalize(offer, buy.eval, sell.eval);
            match try_apply_trade(&wctx, &offer) {
                Ok(delta) => {
                    applied = Some((offer, delta));
                    break;
                }
                Err(e) => warn!("season trade {} failed to apply: {e}", offer.id),
            }
        }

        if let Some((offer, delta)) = applied {
            let event = format!("Week {tick} trade: {}", offer.describe(league));
            info!("{event}");
            events.push(event);
            working = working.apply_delta(&delta);
            trades += 1;
        }
    }

    if trades == 0 {
        return (StateDelta::default(), events);
    }
    let delta = StateDelta {
        draft: working.draft.clone(),
        pick_inventory: Some(working.pick_inventory),
        player_team_override: Some(working.player_team_override),
        cap_adjustments: Some(working.cap_adjustments),
        ..Default::default()
    };
    (delta, events)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
