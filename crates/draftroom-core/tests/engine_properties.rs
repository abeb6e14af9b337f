// Property tests for the trade engine.
//
// These run against the public API only: valuation, evaluation, decisions,
// counters, and application, checked for determinism, symmetry, and asset
// conservation over the synthetic league in `test_support`.

use std::collections::{BTreeMap, BTreeSet};

use draftroom_core::config::NegotiationConfig;
use draftroom_core::profile::TeamProfile;
use draftroom_core::state::PickKey;
use draftroom_core::test_support::{
    current_pick, future_pick, qb_hungry_league, sample_config, sample_league, sample_save,
    SAMPLE_SEED,
};
use draftroom_core::trade::desk::{propose_user_offer, respond_to_counter, ProposalOutcome};
use draftroom_core::trade::negotiate::reputation_penalty;
use draftroom_core::trade::{
    accept_decision, build_counter_offer, evaluate_offer, simulate_cpu_cpu_season_trades,
    OfferOrigin, TradeAsset, TradeOffer, TradePhase, TradeThread,
};
use draftroom_core::valuation::pick::{discounted_pick_tvu, pick_base_tvu};
use draftroom_core::{EngineContext, SaveState, TeamId};

// ===========================================================================
// Helpers
// ===========================================================================

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// A spread of offers touching every team, picks and players mixed.
fn offer_mix(league: &draftroom_core::LeagueData, save: &SaveState) -> Vec<TradeOffer> {
    let mut offers = Vec::new();
    for from in 1..=8u32 {
        let to = from % 8 + 1;
        let player = league
            .roster
            .iter()
            .find(|p| p.team_id == to)
            .map(|p| TradeAsset::player(p.player_id, to));
        let mut get = vec![future_pick(save, to, 2, 1)];
        get.extend(player);
        offers.push(TradeOffer::new(
            format!("mix-{from}-{to}"),
            from,
            to,
            vec![current_pick(save, from, 2), future_pick(save, from, 1, 2)],
            get,
            0,
            TradePhase::Season,
            OfferOrigin::Cpu,
        ));
    }
    offers
}

fn all_pick_keys(save: &SaveState) -> Vec<PickKey> {
    save.pick_inventory
        .by_team
        .values()
        .flat_map(|picks| picks.iter().map(|p| p.key()))
        .collect()
}

// ===========================================================================
// Determinism and symmetry
// ===========================================================================

#[test]
fn evaluation_is_a_pure_function_of_inputs() {
    let league = sample_league();
    let config = sample_config();
    let save = sample_save(&league);
    let ctx = EngineContext::new(&league, &save, &config, SAMPLE_SEED);
    for offer in offer_mix(&league, &save) {
        for team in [offer.from_team_id, offer.to_team_id] {
            assert_eq!(evaluate_offer(&ctx, &offer, team), evaluate_offer(&ctx, &offer, team));
        }
    }
    assert_eq!(TeamProfile::derive(SAMPLE_SEED, 4), TeamProfile::derive(SAMPLE_SEED, 4));
}

#[test]
fn friction_and_uncertainty_match_across_sides() {
    let league = sample_league();
    let config = sample_config();
    let save = sample_save(&league);
    let ctx = EngineContext::new(&league, &save, &config, SAMPLE_SEED);
    for offer in offer_mix(&league, &save) {
        let from = evaluate_offer(&ctx, &offer, offer.from_team_id);
        let to = evaluate_offer(&ctx, &offer, offer.to_team_id);
        assert!(approx_eq(from.friction, to.friction, 1e-12), "{}", offer.id);

        // risk_buffer / (1.5 - risk_tolerance) is the shared uncertainty term.
        let rt_from = TeamProfile::derive(SAMPLE_SEED, offer.from_team_id).risk_tolerance;
        let rt_to = TeamProfile::derive(SAMPLE_SEED, offer.to_team_id).risk_tolerance;
        assert!(approx_eq(
            from.risk_buffer / (1.5 - rt_from),
            to.risk_buffer / (1.5 - rt_to),
            1e-9
        ));

        // What one side sends the other receives, before context.
        assert!(from.eff_in > 0.0 && to.eff_in > 0.0);
    }
}

#[test]
fn pick_curve_is_monotonic_in_slot_and_year() {
    let cfg = sample_config().valuation;
    for overall in 1..=256 {
        assert!(pick_base_tvu(&cfg, overall) > pick_base_tvu(&cfg, overall + 1));
        for year in 0..3 {
            assert!(discounted_pick_tvu(&cfg, overall, year) > discounted_pick_tvu(&cfg, overall, year + 1));
        }
    }
}

// ===========================================================================
// Decisions and counters
// ===========================================================================

#[test]
fn decisions_follow_net_gain_and_reputation() {
    let league = sample_league();
    let config = sample_config();
    let mut save = sample_save(&league);
    save.trade_reputation.lowball_strikes = 2;
    let ctx = EngineContext::new(&league, &save, &config, SAMPLE_SEED).with_user(1);

    for mut offer in offer_mix(&league, &save) {
        for team in [offer.from_team_id, offer.to_team_id] {
            let d = accept_decision(&ctx, &offer, team);
            assert_eq!(d.accept, d.eval.net_gain >= d.eval.threshold);
        }
        offer.origin = OfferOrigin::User;
        let plain = evaluate_offer(&ctx, &offer, offer.to_team_id);
        let penalized = accept_decision(&ctx, &offer, offer.to_team_id);
        let factor = reputation_penalty(&save.trade_reputation, &NegotiationConfig::default());
        assert!(approx_eq(factor, 1.24, 1e-12));
        assert!(approx_eq(penalized.eval.threshold, plain.threshold * factor, 1e-9));
        assert!(approx_eq(penalized.eval.net_gain, plain.net_gain, 1e-12));
    }
}

#[test]
fn counters_stop_at_the_cap() {
    let league = sample_league();
    let config = sample_config();
    let save = sample_save(&league);
    let ctx = EngineContext::new(&league, &save, &config, SAMPLE_SEED);
    let offer = TradeOffer::new(
        "cap",
        2,
        6,
        vec![future_pick(&save, 2, 3, 2)],
        vec![future_pick(&save, 6, 3, 1)],
        0,
        TradePhase::Season,
        OfferOrigin::User,
    );
    let mut thread = TradeThread::open("t6-0", 6, 0);
    for used in 2..5 {
        thread.counters_used = used;
        assert!(build_counter_offer(&ctx, &thread, &offer, 6, 2).is_none());
    }
}

#[test]
fn desk_counters_per_partner_never_exceed_the_cap() {
    let league = sample_league();
    let config = sample_config();
    let user: TeamId = 3;
    let mut save = sample_save(&league);
    let mut counters: BTreeMap<TeamId, u32> = BTreeMap::new();
    let mut tick = 0u64;

    // Team 5 first: it counters this swap until the cap, then keeps refusing.
    for partner in [5u32, 1, 2, 4, 6, 7, 8] {
        for _ in 0..5 {
            let ctx = EngineContext::new(&league, &save, &config, SAMPLE_SEED).with_user(user);
            let offer = TradeOffer::new(
                "even",
                user,
                partner,
                vec![future_pick(&save, user, 2, 1)],
                vec![future_pick(&save, partner, 2, 1)],
                tick,
                TradePhase::Season,
                OfferOrigin::User,
            );
            let Ok((outcome, delta)) = propose_user_offer(&ctx, offer, tick) else {
                break;
            };
            save = save.apply_delta(&delta);
            tick += 1;
            match outcome {
                ProposalOutcome::Accepted { .. } => break,
                ProposalOutcome::Countered { .. } => {
                    *counters.entry(partner).or_default() += 1;
                    let thread_id = save
                        .trade_threads
                        .values()
                        .find(|t| t.other_team_id == partner && t.is_open())
                        .map(|t| t.id.clone())
                        .unwrap();
                    let ctx = EngineContext::new(&league, &save, &config, SAMPLE_SEED).with_user(user);
                    let (_, delta) = respond_to_counter(&ctx, &thread_id, false, tick).unwrap();
                    save = save.apply_delta(&delta);
                    tick += 1;
                }
                ProposalOutcome::Rejected { .. } => {}
            }
        }
    }

    let max = config.negotiation.max_counters;
    assert_eq!(counters.get(&5), Some(&max));
    for (partner, used) in &counters {
        assert!(*used <= max, "team {partner} countered {used} times");
    }
    for thread in save.trade_threads.values() {
        assert!(thread.counters_used <= max, "{}", thread.id);
    }
}

// ===========================================================================
// Conservation
// ===========================================================================

#[test]
fn season_market_conserves_assets() {
    let league = qb_hungry_league();
    let config = sample_config();
    let start = sample_save(&league);
    let mut save = start.clone();
    let mut traded = 0;

    for week in 1..=17u64 {
        let ctx = EngineContext::new(&league, &save, &config, SAMPLE_SEED).with_user(4);
        let (delta, events) =
            simulate_cpu_cpu_season_trades(&ctx, week, config.market.max_trades_per_week);
        assert!(events.len() as u32 <= config.market.max_trades_per_week);
        traded += events.len();
        save = save.apply_delta(&delta);
    }
    assert!(traded > 0, "no season trade fired");
    assert!(!save.player_team_override.is_empty());

    let before = all_pick_keys(&start);
    let after = all_pick_keys(&save);
    assert_eq!(before.len(), after.len());
    let unique: BTreeSet<PickKey> = after.iter().copied().collect();
    assert_eq!(unique.len(), after.len());
    assert_eq!(unique, before.into_iter().collect::<BTreeSet<_>>());
    assert_ne!(save.pick_inventory, start.pick_inventory);

    // Every rostered player still belongs to exactly one team.
    for row in &league.roster {
        assert!(save.team_of(&league, row.player_id).is_some());
    }
    // Moved cap hits balance; only dead money is new, a quarter of what left.
    let moved: f64 = save.cap_adjustments.values().map(|c| c.cap_hits_delta).sum();
    assert!(approx_eq(moved, 0.0, 1e-3));
    let shed: f64 = save
        .cap_adjustments
        .values()
        .map(|c| c.cap_hits_delta.min(0.0))
        .sum();
    let dead: f64 = save.cap_adjustments.values().map(|c| c.dead_cap_delta).sum();
    assert!(shed < 0.0);
    assert!(approx_eq(dead, -0.25 * shed, 1e-3));
    // The user's team is never touched.
    assert_eq!(save.pick_inventory.picks_for(4), start.pick_inventory.picks_for(4));
    assert!(!save.cap_adjustments.contains_key(&4));
}
