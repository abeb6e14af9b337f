// User trade desk: proposals, counters, inbound offers, and reputation.
//
// Every operation returns the replaced slices as a `StateDelta`; the caller
// folds it into the save.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::info;

use super::apply::{try_apply_trade, validate_offer, ApplyError};
use super::evaluate::evaluate_offer;
use super::negotiate::{accept_decision, build_counter_offer};
use super::types::{OfferEvals, OfferOrigin, OfferStatus, TradeOffer, TradePhase, TradeThread};
use crate::config::NegotiationConfig;
use crate::context::EngineContext;
use crate::league::TeamId;
use crate::state::{SaveState, StateDelta, TradeReputation};

const LOWBALL_SCORE: i32 = -5;
const ACCEPTED_SCORE: i32 = 3;
const NEAR_MISS_SCORE: i32 = 1;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeskError {
    #[error("no user team is set")]
    NoUserTeam,

    #[error("offer {offer_id} is not from the user's team")]
    NotUserOffer { offer_id: String },

    #[error("offer {offer_id} is not addressed to the user's team")]
    NotForUser { offer_id: String },

    #[error("unknown trade thread {thread_id}")]
    UnknownThread { thread_id: String },

    #[error("thread {thread_id} has no pending counter")]
    NoPendingCounter { thread_id: String },

    #[error("no pending inbound offer {offer_id}")]
    UnknownOffer { offer_id: String },

    #[error("invalid offer: {0}")]
    Invalid(#[from] ApplyError),
}

/// What happened to a user proposal or response.
#[derive(Debug, Clone, PartialEq)]
pub enum ProposalOutcome {
    Accepted { offer_id: String, message: String },
    Countered { counter: TradeOffer, message: String },
    Rejected { offer_id: String, message: String },
}

// ---------------------------------------------------------------------------
// Reputation
// ---------------------------------------------------------------------------

fn adjust_score(rep: &mut TradeReputation, by: i32) {
    rep.score = (rep.score + by).clamp(0, 100);
}

/// Reputation after the CPU accepted a user deal: one strike forgiven.
pub fn reputation_after_accept(rep: &TradeReputation) -> TradeReputation {
    let mut next = rep.clone();
    next.lowball_strikes = next.lowball_strikes.saturating_sub(1);
    adjust_score(&mut next, ACCEPTED_SCORE);
    next
}

/// Reputation after the CPU rejected a user offer that fell `gap` short.
pub fn reputation_after_reject(
    rep: &TradeReputation,
    gap: f64,
    cfg: &NegotiationConfig,
) -> TradeReputation {
    let mut next = rep.clone();
    if gap > cfg.gap_ceiling {
        next.lowball_strikes += 1;
        adjust_score(&mut next, LOWBALL_SCORE);
    } else if gap <= cfg.near_miss_gap {
        adjust_score(&mut next, NEAR_MISS_SCORE);
    }
    next
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn user_team(ctx: &EngineContext<'_>) -> Result<TeamId, DeskError> {
    ctx.user_team_id.ok_or(DeskError::NoUserTeam)
}

/// The negotiation a new proposal to `other` continues.
///
/// An open thread wins; otherwise the latest thread that did not end in a
/// deal is reopened with its counter count intact. Only a completed deal
/// starts the counter budget over.
fn thread_for_proposal(save: &SaveState, other: TeamId, tick: u64) -> TradeThread {
    let with_other = || save.trade_threads.values().filter(move |t| t.other_team_id == other);
    if let Some(open) = with_other().find(|t| t.is_open()) {
        return open.clone();
    }
    let resumable = with_other()
        .filter(|t| !t.ended_in_deal())
        .max_by(|a, b| a.updated_tick.cmp(&b.updated_tick).then_with(|| a.id.cmp(&b.id)));
    match resumable {
        Some(closed) => {
            let mut thread = closed.clone();
            thread.reopen(tick);
            thread
        }
        None => {
            let n = with_other().count();
            TradeThread::open(format!("t{other}-{tick}-{n}"), other, tick)
        }
    }
}

/// Evaluate both sides, record the evals, and apply if the CPU agrees.
/// Returns the finalized offer and the apply delta when accepted.
fn settle_with_cpu(
    ctx: &EngineContext<'_>,
    mut offer: TradeOffer,
    user: TeamId,
    cpu: TeamId,
) -> Result<(TradeOffer, Option<StateDelta>, String), DeskError> {
    let decision = accept_decision(ctx, &offer, cpu);
    let user_eval = evaluate_offer(ctx, &offer, user);
    offer.eval = Some(if offer.from_team_id == user {
        OfferEvals {
            from: user_eval,
            to: decision.eval.clone(),
        }
    } else {
        OfferEvals {
            from: decision.eval.clone(),
            to: user_eval,
        }
    });
    offer.mark_accepted_by(user);
    if !decision.accept {
        offer.status = OfferStatus::Rejected;
        return Ok((offer, None, decision.rationale));
    }
    offer.mark_accepted_by(cpu);
    offer.status = OfferStatus::Accepted;
    let delta = try_apply_trade(ctx, &offer)?;
    Ok((offer, Some(delta), decision.rationale))
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Send a user proposal to a CPU team.
///
/// The CPU accepts (and the trade is applied), counters when the gap is
/// within the ceiling and the thread has counters left, or rejects.
/// A rejection beyond the gap ceiling closes the thread; one within it
/// leaves the thread open. Reputation moves with the result.
pub fn propose_user_offer(
    ctx: &EngineContext<'_>,
    offer: TradeOffer,
    tick: u64,
) -> Result<(ProposalOutcome, StateDelta), DeskError> {
    let user = user_team(ctx)?;
    if offer.from_team_id != user {
        return Err(DeskError::NotUserOffer { offer_id: offer.id });
    }
    validate_offer(ctx, &offer)?;
    let cpu = offer.to_team_id;

    let mut offer = offer;
    offer.origin = OfferOrigin::User;
    offer.status = OfferStatus::Pending;
    offer.created_tick = tick;
    offer.accepted_by.clear();

    let mut threads = ctx.save.trade_threads.clone();
    let mut thread = thread_for_proposal(ctx.save, cpu, tick);
    let mut inbox = ctx.save.trade_inbox.clone();
    // A new proposal supersedes any counter still waiting on this thread.
    if let Some(stale) = thread
        .last_offer_mut()
        .filter(|o| o.origin == OfferOrigin::Cpu && o.status == OfferStatus::Pending)
    {
        stale.status = OfferStatus::Rejected;
        let stale_id = stale.id.clone();
        inbox.retain(|o| o.id != stale_id);
    }
    let rep = &ctx.save.trade_reputation;
    let neg = &ctx.config.negotiation;

    let (mut offer, applied, rationale) = settle_with_cpu(ctx, offer, user, cpu)?;
    let offer_id = offer.id.clone();

    let (outcome, reputation, apply_delta) = if let Some(delta) = applied {
        info!("user offer {offer_id} accepted: {rationale}");
        thread.push_offer(offer, tick);
        thread.close(tick);
        (
            ProposalOutcome::Accepted {
                offer_id,
                message: rationale,
            },
            reputation_after_accept(rep),
            Some(delta),
        )
    } else {
        let gap = offer.eval.as_ref().map(|e| e.to.gap()).unwrap_or(f64::INFINITY);
        let reputation = reputation_after_reject(rep, gap, neg);
        let counter = build_counter_offer(ctx, &thread, &offer, cpu, neg.max_counters);
        match counter {
            Some(counter) => {
                offer.status = OfferStatus::Countered;
                thread.push_offer(offer, tick);
                thread.counters_used += 1;
                let mut counter = counter;
                counter.created_tick = tick;
                let message = counter
                    .message
                    .clone()
                    .unwrap_or_else(|| "counter offer".to_string());
                inbox.push(counter.clone());
                thread.push_offer(counter.clone(), tick);
                info!("user offer {offer_id} countered: {message}");
                (
                    ProposalOutcome::Countered { counter, message },
                    reputation,
                    None,
                )
            }
            None => {
                info!("user offer {offer_id} rejected: {rationale}");
                thread.push_offer(offer, tick);
                // Too far apart to keep talking.
                if gap > neg.gap_ceiling {
                    thread.close(tick);
                }
                (
                    ProposalOutcome::Rejected {
                        offer_id,
                        message: rationale,
                    },
                    reputation,
                    None,
                )
            }
        }
    };

    threads.insert(thread.id.clone(), thread);
    let delta = StateDelta {
        trade_inbox: Some(inbox),
        trade_threads: Some(threads),
        trade_reputation: Some(reputation),
        ..Default::default()
    };
    let delta = match apply_delta {
        Some(applied) => delta.merge(applied),
        None => delta,
    };
    Ok((outcome, delta))
}

/// Accept or decline the CPU counter waiting on `thread_id`.
///
/// An accepted counter is re-checked against the current state before it is
/// applied; a CPU that no longer likes it withdraws.
pub fn respond_to_counter(
    ctx: &EngineContext<'_>,
    thread_id: &str,
    accept: bool,
    tick: u64,
) -> Result<(ProposalOutcome, StateDelta), DeskError> {
    let user = user_team(ctx)?;
    let mut thread = ctx
        .save
        .trade_threads
        .get(thread_id)
        .cloned()
        .ok_or_else(|| DeskError::UnknownThread {
            thread_id: thread_id.to_string(),
        })?;
    let pending = thread
        .last_offer()
        .filter(|o| thread.is_open() && o.origin == OfferOrigin::Cpu && o.status == OfferStatus::Pending)
        .cloned()
        .ok_or_else(|| DeskError::NoPendingCounter {
            thread_id: thread_id.to_string(),
        })?;

    let inbox: Vec<TradeOffer> = ctx
        .save
        .trade_inbox
        .iter()
        .filter(|o| o.id != pending.id)
        .cloned()
        .collect();
    let mut threads = ctx.save.trade_threads.clone();
    let cpu = thread.other_team_id;

    let (outcome, reputation, apply_delta, resolved) = if accept {
        let (offer, applied, rationale) = settle_with_cpu(ctx, pending, user, cpu)?;
        match applied {
            Some(delta) => (
                ProposalOutcome::Accepted {
                    offer_id: offer.id.clone(),
                    message: rationale,
                },
                reputation_after_accept(&ctx.save.trade_reputation),
                Some(delta),
                offer,
            ),
            None => (
                ProposalOutcome::Rejected {
                    offer_id: offer.id.clone(),
                    message: format!("{} withdrew the counter", ctx.league.abbrev(cpu)),
                },
                ctx.save.trade_reputation.clone(),
                None,
                offer,
            ),
        }
    } else {
        let mut offer = pending;
        offer.status = OfferStatus::Rejected;
        (
            ProposalOutcome::Rejected {
                offer_id: offer.id.clone(),
                message: "counter declined".to_string(),
            },
            ctx.save.trade_reputation.clone(),
            None,
            offer,
        )
    };

    if let Some(last) = thread.last_offer_mut() {
        *last = resolved;
    }
    thread.close(tick);
    threads.insert(thread.id.clone(), thread);

    let delta = StateDelta {
        trade_inbox: Some(inbox),
        trade_threads: Some(threads),
        trade_reputation: Some(reputation),
        ..Default::default()
    };
    let delta = match apply_delta {
        Some(applied) => delta.merge(applied),
        None => delta,
    };
    Ok((outcome, delta))
}

/// Accept or decline an inbound CPU offer sitting in the inbox.
pub fn respond_to_inbound(
    ctx: &EngineContext<'_>,
    offer_id: &str,
    accept: bool,
) -> Result<(ProposalOutcome, StateDelta), DeskError> {
    let user = user_team(ctx)?;
    let offer = ctx
        .save
        .trade_inbox
        .iter()
        .find(|o| o.id == offer_id && o.status == OfferStatus::Pending)
        .cloned()
        .ok_or_else(|| DeskError::UnknownOffer {
            offer_id: offer_id.to_string(),
        })?;
    if offer.to_team_id != user {
        return Err(DeskError::NotForUser {
            offer_id: offer.id,
        });
    }
    let cpu = offer.from_team_id;

    let inbox: Vec<TradeOffer> = ctx
        .save
        .trade_inbox
        .iter()
        .filter(|o| o.id != offer_id)
        .cloned()
        .collect();

    if !accept {
        info!("user declined inbound offer {offer_id}");
        let delta = StateDelta {
            trade_inbox: Some(inbox),
            ..Default::default()
        };
        return Ok((
            ProposalOutcome::Rejected {
                offer_id: offer_id.to_string(),
                message: "offer declined".to_string(),
            },
            delta,
        ));
    }

    let (offer, applied, rationale) = settle_with_cpu(ctx, offer, user, cpu)?;
    let delta = StateDelta {
        trade_inbox: Some(inbox),
        ..Default::default()
    };
    match applied {
        Some(applied) => Ok((
            ProposalOutcome::Accepted {
                offer_id: offer.id,
                message: rationale,
            },
            delta.merge(applied),
        )),
        None => Ok((
            ProposalOutcome::Rejected {
                offer_id: offer.id,
                message: format!("{} pulled the offer", ctx.league.abbrev(cpu)),
            },
            delta,
        )),
    }
}

/// Post a fresh batch of inbound draft offers.
///
/// Earlier pending draft-day offers that are not part of an open negotiation
/// expire; offers already in the inbox under the same id are not duplicated.
pub fn post_inbound_offers(save: &SaveState, offers: Vec<TradeOffer>) -> StateDelta {
    let in_threads: BTreeMap<&str, ()> = save
        .trade_threads
        .values()
        .filter(|t| t.is_open())
        .flat_map(|t| t.offers.iter().map(|o| (o.id.as_str(), ())))
        .collect();
    let mut inbox: Vec<TradeOffer> = save
        .trade_inbox
        .iter()
        .filter(|o| {
            !(o.phase == TradePhase::Draft
                && o.origin == OfferOrigin::Cpu
                && o.status == OfferStatus::Pending
                && !in_threads.contains_key(o.id.as_str()))
        })
        .cloned()
        .collect();
    for offer in offers {
        if !inbox.iter().any(|o| o.id == offer.id) {
            inbox.push(offer);
        }
    }
    StateDelta {
        trade_inbox: Some(inbox),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{current_pick, future_pick, sample_config, sample_league, SAMPLE_SEED};
    use crate::trade::types::TradePhase;

    const USER: TeamId = 3;

    #[test]
    fn reputation_rules() {
        let cfg = NegotiationConfig::default();
        let rep = TradeReputation::default();

        let lowball = reputation_after_reject(&rep, 500.0, &cfg);
        assert_eq!(lowball.lowball_strikes, 1);
        assert_eq!(lowball.score, 45);

        let near = reputation_after_reject(&rep, 30.0, &cfg);
        assert_eq!(near.lowball_strikes, 0);
        assert_eq!(near.score, 51);

        let middling = reputation_after_reject(&rep, 120.0, &cfg);
        assert_eq!(middling, rep);

        let accepted = reputation_after_accept(&lowball);
        assert_eq!(accepted.lowball_strikes, 0);
        assert_eq!(accepted.score, 48);

        let mut top = TradeReputation {
            score: 99,
            lowball_strikes: 0,
        };
        top = reputation_after_accept(&top);
        assert_eq!(top.score, 100);
        let mut bottom = TradeReputation {
            score: 2,
            lowball_strikes: 0,
        };
        bottom = reputation_after_reject(&bottom, 1_000.0, &cfg);
        assert_eq!(bottom.score, 0);
    }

    #[test]
    fn proposal_requires_user_team() {
        let league = sample_league();
        let config = sample_config();
        let save = SaveState::new(&league, &config);
        let ctx = EngineContext::new(&league, &save, &config, SAMPLE_SEED);
        let offer = TradeOffer::new(
            "u1",
            USER,
            5,
            vec![future_pick(&save, USER, 3, 1)],
            vec![],
            0,
            TradePhase::Season,
            OfferOrigin::User,
        );
        assert_eq!(propose_user_offer(&ctx, offer.clone(), 1).unwrap_err(), DeskError::NoUserTeam);

        let ctx = ctx.with_user(4);
        assert!(matches!(
            propose_user_offer(&ctx, offer, 1),
            Err(DeskError::NotUserOffer { .. })
        ));
    }

    #[test]
    fn gift_is_accepted_and_applied() {
        let league = sample_league();
        let config = sample_config();
        let save = SaveState::new(&league, &config);
        let ctx = EngineContext::new(&league, &save, &config, SAMPLE_SEED).with_user(USER);
        // Two firsts for nothing.
        let offer = TradeOffer::new(
            "gift",
            USER,
            5,
            vec![current_pick(&save, USER, 1), future_pick(&save, USER, 1, 1)],
            vec![],
            0,
            TradePhase::Season,
            OfferOrigin::User,
        );
        let (outcome, delta) = propose_user_offer(&ctx, offer, 7).unwrap();
        assert!(matches!(outcome, ProposalOutcome::Accepted { .. }), "{outcome:?}");
        let next = save.apply_delta(&delta);
        assert_eq!(next.pick_inventory.picks_for(5).len(), save.pick_inventory.picks_for(5).len() + 2);
        assert_eq!(next.trade_threads.len(), 1);
        let thread = next.trade_threads.values().next().unwrap();
        assert!(!thread.is_open());
        assert_eq!(thread.offers[0].status, OfferStatus::Accepted);
        assert_eq!(next.trade_reputation.score, 53);
    }

    #[test]
    fn lowball_is_rejected_with_strike() {
        let league = sample_league();
        let config = sample_config();
        let save = SaveState::new(&league, &config);
        let ctx = EngineContext::new(&league, &save, &config, SAMPLE_SEED).with_user(USER);
        // A future seventh-equivalent (last round) for their first overall pick.
        let offer = TradeOffer::new(
            "low",
            USER,
            8,
            vec![future_pick(&save, USER, 3, 2)],
            vec![current_pick(&save, 8, 1)],
            0,
            TradePhase::Season,
            OfferOrigin::User,
        );
        let (outcome, delta) = propose_user_offer(&ctx, offer, 2).unwrap();
        assert!(matches!(outcome, ProposalOutcome::Rejected { .. }), "{outcome:?}");
        let next = save.apply_delta(&delta);
        assert_eq!(next.trade_reputation.lowball_strikes, 1);
        assert_eq!(next.trade_reputation.score, 45);
        assert_eq!(next.pick_inventory, save.pick_inventory);
        // Too far apart: the thread is closed.
        assert_eq!(next.trade_threads.len(), 1);
        assert!(next.trade_threads.values().all(|t| !t.is_open()));
    }

    /// Second-rounder swap that lands inside the gap ceiling for team 5.
    fn even_swap(save: &SaveState) -> TradeOffer {
        TradeOffer::new(
            "even",
            USER,
            5,
            vec![future_pick(save, USER, 2, 1)],
            vec![future_pick(save, 5, 2, 1)],
            0,
            TradePhase::Season,
            OfferOrigin::User,
        )
    }

    #[test]
    fn counters_can_be_answered() {
        let league = sample_league();
        let config = sample_config();
        let save = SaveState::new(&league, &config);
        let ctx = EngineContext::new(&league, &save, &config, SAMPLE_SEED).with_user(USER);

        let (outcome, delta) = propose_user_offer(&ctx, even_swap(&save), 10).unwrap();
        let ProposalOutcome::Countered { counter, .. } = outcome else {
            panic!("expected a counter, got {outcome:?}");
        };
        let after = save.apply_delta(&delta);
        // Middling gap: reputation untouched.
        assert_eq!(after.trade_reputation, save.trade_reputation);
        assert!(after.trade_inbox.iter().any(|o| o.id == counter.id));
        assert_eq!(counter.from_team_id, 5);
        assert_eq!(counter.get.len(), 2);
        let thread_id = "t5-10-0".to_string();
        assert_eq!(counter.id, format!("{thread_id}-c1"));
        assert_eq!(after.trade_threads[&thread_id].counters_used, 1);

        let ctx2 = ctx.with_save(&after);
        let (declined, d2) = respond_to_counter(&ctx2, &thread_id, false, 11).unwrap();
        assert!(matches!(declined, ProposalOutcome::Rejected { .. }));
        let closed = after.apply_delta(&d2);
        assert!(!closed.trade_threads[&thread_id].is_open());
        assert!(closed.trade_inbox.iter().all(|o| o.id != counter.id));
        assert!(matches!(
            respond_to_counter(&ctx.with_save(&closed), &thread_id, true, 12),
            Err(DeskError::NoPendingCounter { .. })
        ));
    }

    #[test]
    fn declining_counters_does_not_reset_the_cap() {
        let league = sample_league();
        let config = sample_config();
        let mut save = SaveState::new(&league, &config);
        let max = config.negotiation.max_counters;
        let mut counters = 0;
        let mut tick = 10;

        for _ in 0..6 {
            let ctx = EngineContext::new(&league, &save, &config, SAMPLE_SEED).with_user(USER);
            let (outcome, delta) = propose_user_offer(&ctx, even_swap(&save), tick).unwrap();
            save = save.apply_delta(&delta);
            tick += 1;
            if let ProposalOutcome::Countered { counter, .. } = outcome {
                counters += 1;
                assert_eq!(counter.id, format!("t5-10-0-c{counters}"));
                let ctx = EngineContext::new(&league, &save, &config, SAMPLE_SEED).with_user(USER);
                let (_, delta) = respond_to_counter(&ctx, "t5-10-0", false, tick).unwrap();
                save = save.apply_delta(&delta);
                tick += 1;
            } else {
                assert!(matches!(outcome, ProposalOutcome::Rejected { .. }), "{outcome:?}");
            }
        }

        assert_eq!(counters, max);
        // One negotiation with team 5, still open after in-ceiling rejections.
        assert_eq!(save.trade_threads.len(), 1);
        let thread = &save.trade_threads["t5-10-0"];
        assert_eq!(thread.counters_used, max);
        assert!(thread.is_open());
        assert!(save.trade_inbox.is_empty());
    }

    #[test]
    fn a_closed_deal_starts_a_new_thread() {
        let league = sample_league();
        let config = sample_config();
        let save = SaveState::new(&league, &config);
        let ctx = EngineContext::new(&league, &save, &config, SAMPLE_SEED).with_user(USER);
        let gift = TradeOffer::new(
            "gift",
            USER,
            5,
            vec![current_pick(&save, USER, 1)],
            vec![],
            0,
            TradePhase::Season,
            OfferOrigin::User,
        );
        let (outcome, delta) = propose_user_offer(&ctx, gift, 3).unwrap();
        assert!(matches!(outcome, ProposalOutcome::Accepted { .. }), "{outcome:?}");
        let after = save.apply_delta(&delta);

        let ctx = ctx.with_save(&after);
        let (_, delta) = propose_user_offer(&ctx, even_swap(&after), 4).unwrap();
        let next = after.apply_delta(&delta);
        let ids: Vec<&str> = next.trade_threads.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["t5-3-0", "t5-4-1"]);
        assert_eq!(next.trade_threads["t5-3-0"].offers.len(), 1);
    }

    #[test]
    fn inbound_posting_expires_stale_offers() {
        let league = sample_league();
        let config = sample_config();
        let save = SaveState::new(&league, &config);
        let make = |id: &str| {
            TradeOffer::new(
                id,
                5,
                USER,
                vec![future_pick(&save, 5, 2, 1)],
                vec![current_pick(&save, USER, 1)],
                1,
                TradePhase::Draft,
                OfferOrigin::Cpu,
            )
        };
        let first = save.apply_delta(&post_inbound_offers(&save, vec![make("a"), make("b")]));
        assert_eq!(first.trade_inbox.len(), 2);
        let second = first.apply_delta(&post_inbound_offers(&first, vec![make("c"), make("c")]));
        let ids: Vec<&str> = second.trade_inbox.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
    }

    #[test]
    fn unknown_inbound_offer() {
        let league = sample_league();
        let config = sample_config();
        let save = SaveState::new(&league, &config);
        let ctx = EngineContext::new(&league, &save, &config, SAMPLE_SEED).with_user(USER);
        assert!(matches!(
            respond_to_inbound(&ctx, "nope", true),
            Err(DeskError::UnknownOffer { .. })
        ));
    }
}
