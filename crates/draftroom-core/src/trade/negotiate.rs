// Accept / reject decisions and counter-offer construction.

use tracing::{debug, info};

use super::evaluate::evaluate_offer;
use super::types::{OfferEvals, OfferOrigin, OfferStatus, TradeAsset, TradeEval, TradeOffer, TradeThread};
use crate::config::NegotiationConfig;
use crate::context::EngineContext;
use crate::league::TeamId;
use crate::state::{OwnedPick, TradeReputation};

/// Outcome of a team weighing an offer.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptDecision {
    pub accept: bool,
    /// The eval the decision was made on, reputation penalty included.
    pub eval: TradeEval,
    pub rationale: String,
}

/// Threshold multiplier for user offers: `1 + strike_penalty * min(strikes, max)`.
pub fn reputation_penalty(reputation: &TradeReputation, cfg: &NegotiationConfig) -> f64 {
    1.0 + cfg.strike_penalty * f64::from(reputation.lowball_strikes.min(cfg.max_strikes))
}

/// Decide whether `team_id` accepts `offer`.
///
/// Accepts iff `net_gain >= threshold`. When the user proposed the offer and
/// `team_id` is the team being asked, the threshold first carries the user's
/// reputation penalty from the save.
pub fn accept_decision(ctx: &EngineContext<'_>, offer: &TradeOffer, team_id: TeamId) -> AcceptDecision {
    let mut eval = evaluate_offer(ctx, offer, team_id);
    if offer.origin == OfferOrigin::User && team_id == offer.to_team_id {
        let penalty = reputation_penalty(&ctx.save.trade_reputation, &ctx.config.negotiation);
        if penalty > 1.0 {
            eval.threshold *= penalty;
            eval.drivers.push(format!("reputation penalty x{penalty:.2}"));
        }
    }

    let accept = eval.accepts();
    let abbrev = ctx.league.abbrev(team_id);
    let rationale = if accept {
        format!(
            "{abbrev} accepts: net {:+.0} clears threshold {:.0}",
            eval.net_gain, eval.threshold
        )
    } else {
        format!(
            "{abbrev} declines: net {:+.0} is {:.0} short of threshold {:.0}",
            eval.net_gain,
            eval.gap(),
            eval.threshold
        )
    };
    debug!("offer {}: {rationale}", offer.id);

    AcceptDecision {
        accept,
        eval,
        rationale,
    }
}

/// Ordering bucket for sweetener rounds: mid rounds first, firsts last.
fn round_bucket(round: u32) -> u32 {
    match round {
        3..=5 => 0,
        2 => 1,
        6 => 2,
        1 => 4,
        _ => 3,
    }
}

/// Sweetener candidates from `team_id`'s inventory, in asking order: future
/// picks before current ones, then by round bucket.
pub fn sweetener_candidates(
    ctx: &EngineContext<'_>,
    team_id: TeamId,
    exclude: &TradeOffer,
) -> Vec<OwnedPick> {
    let listed: Vec<_> = exclude.assets().filter_map(TradeAsset::pick_key).collect();
    let mut picks: Vec<OwnedPick> = ctx
        .save
        .pick_inventory
        .picks_for(team_id)
        .iter()
        .filter(|p| !listed.contains(&p.key()))
        .cloned()
        .collect();
    picks.sort_by_key(|p| {
        (
            u32::from(p.year_offset == 0),
            round_bucket(p.round),
            p.round,
            p.year_offset,
            p.overall.unwrap_or(u32::MAX),
            p.original_team_id,
        )
    });
    picks
}

/// Build a counter in which `countering_team` asks the other side for one
/// more pick.
///
/// Candidates are tried in asking order; the first that flips the
/// countering team to accept is returned, already accepted by it. Returns
/// `None` when the thread has used its counters, the gap is beyond the
/// ceiling, or no single pick closes it.
pub fn build_counter_offer(
    ctx: &EngineContext<'_>,
    thread: &TradeThread,
    last_offer: &TradeOffer,
    countering_team: TeamId,
    max_counters: u32,
) -> Option<TradeOffer> {
    if thread.counters_used >= max_counters {
        debug!("thread {} has used {} counters", thread.id, thread.counters_used);
        return None;
    }
    let other = last_offer.counterparty(countering_team)?;

    let current = accept_decision(ctx, last_offer, countering_team);
    if current.accept {
        return None;
    }
    if current.eval.gap() > ctx.config.negotiation.gap_ceiling {
        debug!(
            "gap {:.0} on {} exceeds ceiling, no counter",
            current.eval.gap(),
            last_offer.id
        );
        return None;
    }

    let counter_id = format!("{}-c{}", thread.id, thread.counters_used + 1);
    for pick in sweetener_candidates(ctx, other, last_offer) {
        let mut give = last_offer.outgoing_for(countering_team).to_vec();
        let mut get = last_offer.incoming_for(countering_team).to_vec();
        get.push(TradeAsset::pick(&pick, other));
        give.sort_by_key(TradeAsset::id);
        get.sort_by_key(TradeAsset::id);

        let mut counter = TradeOffer::new(
            counter_id.clone(),
            countering_team,
            other,
            give,
            get,
            last_offer.created_tick,
            last_offer.phase,
            OfferOrigin::Cpu,
        );
        // The counterer keeps the bar it held the original offer to.
        let mut decision = accept_decision(ctx, &counter, countering_team);
        decision.eval.threshold = decision.eval.threshold.max(current.eval.threshold);
        if !decision.eval.accepts() {
            continue;
        }

        let added = TradeAsset::pick(&pick, other).label(ctx.league);
        let other_eval = evaluate_offer(ctx, &counter, other);
        counter.eval = Some(OfferEvals {
            from: decision.eval,
            to: other_eval,
        });
        counter.message = Some(format!(
            "{} would do it if you add {added}",
            ctx.league.abbrev(countering_team)
        ));
        counter.status = OfferStatus::Pending;
        counter.mark_accepted_by(countering_team);
        info!("counter {} on thread {}: add {added}", counter.id, thread.id);
        return Some(counter);
    }

    debug!("no single sweetener closes the gap on {}", last_offer.id);
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
