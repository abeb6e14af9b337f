// Offer evaluation from one team's perspective.
//
// The same function runs for both parties. Nothing here reads the other
// side's threshold, noise draw, or recorded eval.

use tracing::debug;

use super::types::{TradeAsset, TradeEval, TradeOffer};
use crate::context::EngineContext;
use crate::draft::pick_urgency;
use crate::league::TeamId;
use crate::profile::TeamProfile;
use crate::rng::{text_key, SeededStream};
use crate::valuation::context::{need_multiplier, need_score, window_multiplier};
use crate::valuation::pick::{pick_tvu, resolve_overall};
use crate::valuation::player::player_tvu;

/// Context-free TVU of an asset. Unknown assets are worth 0.
pub fn asset_base_tvu(ctx: &EngineContext<'_>, asset: &TradeAsset) -> f64 {
    match asset {
        TradeAsset::Pick { overall, .. } => match asset.pick_key() {
            Some(key) => pick_tvu(ctx.league, ctx.save, &ctx.config.valuation, &key, *overall),
            None => 0.0,
        },
        TradeAsset::Player { player_id, .. } => {
            player_tvu(ctx.league, &ctx.config.valuation, ctx.seed, *player_id)
        }
    }
}

/// Multiplier `team_id` applies to `asset`, with a short label for drivers.
///
/// Players scale with roster need at their group. Picks scale with the
/// team's competitive window, and an incoming pick that is on the clock
/// also carries the team's draft-day urgency.
pub fn context_multiplier(
    ctx: &EngineContext<'_>,
    team_id: TeamId,
    asset: &TradeAsset,
    incoming: bool,
) -> (f64, String) {
    match asset {
        TradeAsset::Player { player_id, .. } => match ctx.league.player(*player_id) {
            Some(row) => {
                let group = row.position.group();
                let need = need_score(ctx.league, ctx.save, team_id, group);
                (need_multiplier(need), format!("{} need {:.2}", group.label(), need))
            }
            None => (1.0, "unknown player".to_string()),
        },
        TradeAsset::Pick {
            year_offset,
            overall,
            ..
        } => {
            let strength = ctx.league.team_strength(team_id);
            let window = window_multiplier(strength, *year_offset);
            let mut label = format!("window {window:.2}");
            let mut mult = window;
            if incoming && *year_offset == 0 {
                if let (Some(draft), Some(key)) = (&ctx.save.draft, asset.pick_key()) {
                    let slot = resolve_overall(ctx.league, ctx.save, &key, *overall);
                    if draft.on_clock().map(|s| s.overall) == Some(slot) {
                        let aggression = TeamProfile::derive(ctx.seed, team_id).aggression;
                        let urgency = pick_urgency(draft, team_id, slot, aggression);
                        mult *= urgency;
                        label.push_str(&format!(", on-clock urgency {urgency:.2}"));
                    }
                }
            }
            (mult, label)
        }
    }
}

/// Evaluate `offer` for `perspective`.
///
/// `net_gain = eff_in - eff_out - friction - risk_buffer + noise`, against
/// `threshold = base_threshold(personality) * leverage`.
pub fn evaluate_offer(ctx: &EngineContext<'_>, offer: &TradeOffer, perspective: TeamId) -> TradeEval {
    if !offer.involves(perspective) {
        debug!("team {perspective} is not a party to offer {}", offer.id);
        return TradeEval::zeroed(format!(
            "{} is not a party to this offer",
            ctx.league.abbrev(perspective)
        ));
    }

    let cfg = &ctx.config.trade;
    let profile = TeamProfile::derive(ctx.seed, perspective);
    let mut drivers = Vec::new();

    let mut side_value = |assets: &[TradeAsset], incoming: bool| -> f64 {
        let mut total = 0.0;
        for asset in assets {
            let base = asset_base_tvu(ctx, asset);
            let (mult, why) = context_multiplier(ctx, perspective, asset, incoming);
            let eff = base * mult;
            drivers.push(format!(
                "{} {}: {:.0} TVU x{:.2} ({why})",
                if incoming { "in" } else { "out" },
                asset.label(ctx.league),
                base,
                mult
            ));
            total += eff;
        }
        total
    };
    let eff_in = side_value(offer.incoming_for(perspective), true);
    let eff_out = side_value(offer.outgoing_for(perspective), false);

    let leverage = if perspective == offer.to_team_id {
        cfg.receiver_leverage
    } else {
        1.0
    };
    let threshold = profile.base_threshold(cfg) * leverage;

    let total_assets = offer.assets().count() as f64;
    let player_assets = offer.assets().filter(|a| a.is_player()).count() as f64;
    let future_picks = offer.assets().filter(|a| a.is_future_pick()).count() as f64;
    let friction =
        cfg.friction_base + cfg.friction_per_asset * total_assets + cfg.friction_per_player * player_assets;

    let any_player = if player_assets > 0.0 { 1.0 } else { 0.0 };
    let uncertainty = future_picks + 0.5 * player_assets + any_player;
    let risk_buffer = cfg.risk_rho * uncertainty * (1.5 - profile.risk_tolerance);

    let stream = SeededStream::new(ctx.seed, "offer-noise");
    let key = [u64::from(perspective), text_key(&offer.id)];
    let amp = stream.range(&[key[0], key[1], 0], cfg.noise_min, cfg.noise_max);
    let sign = if stream.chance(&[key[0], key[1], 1], 0.5) { 1.0 } else { -1.0 };
    let noise = (eff_in + eff_out) * amp * sign;

    let net_gain = eff_in - eff_out - friction - risk_buffer + noise;

    drivers.push(format!(
        "{} ({}) threshold {:.0} (leverage x{:.2})",
        ctx.league.abbrev(perspective),
        profile.personality.label(),
        threshold,
        leverage
    ));
    drivers.push(format!(
        "friction {friction:.0}, risk buffer {risk_buffer:.0}, noise {noise:+.0}"
    ));

    TradeEval {
        net_gain,
        threshold,
        friction,
        risk_buffer,
        eff_in,
        eff_out,
        noise,
        drivers,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
