// Trade application: the all-or-nothing move of an accepted offer's assets.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::info;

use super::types::{AssetId, OfferStatus, TradeAsset, TradeOffer};
use crate::context::EngineContext;
use crate::league::{PlayerId, TeamId};
use crate::state::{PickKey, StateDelta};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplyError {
    #[error("offer {offer_id} is not accepted (status {status:?})")]
    NotAccepted { offer_id: String, status: OfferStatus },

    #[error("offer {offer_id} has no recorded evaluations")]
    MissingEvaluation { offer_id: String },

    #[error("team {team_id} has not accepted offer {offer_id}")]
    MissingAcceptance { offer_id: String, team_id: TeamId },

    #[error("team {team_id} recorded net {net_gain:.1} below threshold {threshold:.1} on offer {offer_id}")]
    BelowThreshold {
        offer_id: String,
        team_id: TeamId,
        net_gain: f64,
        threshold: f64,
    },

    #[error("offer {offer_id} trades a team with itself ({team_id})")]
    SameTeam { offer_id: String, team_id: TeamId },

    #[error("offer {offer_id} moves no assets")]
    EmptyOffer { offer_id: String },

    #[error("{asset} is listed more than once")]
    DuplicateAsset { asset: AssetId },

    #[error("{asset} is declared on team {declared} but that side is team {expected}")]
    WrongSide {
        asset: AssetId,
        declared: TeamId,
        expected: TeamId,
    },

    #[error("pick {key} is not owned by team {team_id}")]
    PickNotOwned { key: PickKey, team_id: TeamId },

    #[error("player {player_id} is not on team {team_id}")]
    PlayerNotOnTeam { player_id: PlayerId, team_id: TeamId },

    #[error("player {player_id} is not in the league")]
    UnknownPlayer { player_id: PlayerId },
}

/// Structural checks: distinct parties, no duplicates, and every asset held
/// by the side that lists it. Does not look at status or acceptance.
pub fn validate_offer(ctx: &EngineContext<'_>, offer: &TradeOffer) -> Result<(), ApplyError> {
    if offer.from_team_id == offer.to_team_id {
        return Err(ApplyError::SameTeam {
            offer_id: offer.id.clone(),
            team_id: offer.from_team_id,
        });
    }
    if offer.give.is_empty() && offer.get.is_empty() {
        return Err(ApplyError::EmptyOffer {
            offer_id: offer.id.clone(),
        });
    }

    let mut seen = BTreeSet::new();
    let sides = [
        (&offer.give, offer.from_team_id),
        (&offer.get, offer.to_team_id),
    ];
    for (assets, side) in sides {
        for asset in assets.iter() {
            let id = asset.id();
            if !seen.insert(id) {
                return Err(ApplyError::DuplicateAsset { asset: id });
            }
            if asset.owner() != side {
                return Err(ApplyError::WrongSide {
                    asset: id,
                    declared: asset.owner(),
                    expected: side,
                });
            }
            match asset {
                TradeAsset::Pick { .. } => {
                    let Some(key) = asset.pick_key() else { continue };
                    if !ctx.save.pick_inventory.owns(side, &key) {
                        return Err(ApplyError::PickNotOwned { key, team_id: side });
                    }
                }
                TradeAsset::Player { player_id, .. } => {
                    if ctx.league.player(*player_id).is_none() {
                        return Err(ApplyError::UnknownPlayer {
                            player_id: *player_id,
                        });
                    }
                    if ctx.save.team_of(ctx.league, *player_id) != Some(side) {
                        return Err(ApplyError::PlayerNotOnTeam {
                            player_id: *player_id,
                            team_id: side,
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

/// Check the acceptance contract: status, recorded evals, and each party's
/// agreement. A CPU party's recorded eval must also clear its threshold; the
/// user may accept any deal.
fn check_acceptance(ctx: &EngineContext<'_>, offer: &TradeOffer) -> Result<(), ApplyError> {
    if offer.status != OfferStatus::Accepted {
        return Err(ApplyError::NotAccepted {
            offer_id: offer.id.clone(),
            status: offer.status,
        });
    }
    let Some(evals) = &offer.eval else {
        return Err(ApplyError::MissingEvaluation {
            offer_id: offer.id.clone(),
        });
    };
    for (team_id, eval) in [(offer.from_team_id, &evals.from), (offer.to_team_id, &evals.to)] {
        if !offer.accepted_by.contains(&team_id) {
            return Err(ApplyError::MissingAcceptance {
                offer_id: offer.id.clone(),
                team_id,
            });
        }
        if !ctx.is_user_team(team_id) && !eval.accepts() {
            return Err(ApplyError::BelowThreshold {
                offer_id: offer.id.clone(),
                team_id,
                net_gain: eval.net_gain,
                threshold: eval.threshold,
            });
        }
    }
    Ok(())
}

/// Apply an accepted offer, returning the replaced slices.
///
/// Picks move in the inventory and, when a draft is loaded, in its pick
/// order. Players move through the team override map. Each traded player's
/// cap hit leaves the sender (which keeps a dead-cap share) and lands on the
/// receiver. Nothing is applied if any check fails.
pub fn try_apply_trade(ctx: &EngineContext<'_>, offer: &TradeOffer) -> Result<StateDelta, ApplyError> {
    check_acceptance(ctx, offer)?;
    validate_offer(ctx, offer)?;

    let mut inventory = ctx.save.pick_inventory.clone();
    let mut overrides = ctx.save.player_team_override.clone();
    let mut cap = ctx.save.cap_adjustments.clone();
    let mut draft = ctx.save.draft.clone();
    let mut draft_changed = false;
    let dead_fraction = ctx.config.trade.dead_cap_fraction;

    let moves = offer
        .give
        .iter()
        .map(|a| (a, offer.from_team_id, offer.to_team_id))
        .chain(offer.get.iter().map(|a| (a, offer.to_team_id, offer.from_team_id)));

    for (asset, sender, receiver) in moves {
        match asset {
            TradeAsset::Pick { .. } => {
                let Some(key) = asset.pick_key() else { continue };
                if !inventory.transfer(&key, receiver) {
                    return Err(ApplyError::PickNotOwned {
                        key,
                        team_id: sender,
                    });
                }
                if key.year_offset == 0 {
                    if let Some(d) = draft.as_mut() {
                        for slot in d.pick_order.iter_mut().skip(d.current_pick_index) {
                            if slot.pick_key() == key {
                                slot.team_id = receiver;
                                draft_changed = true;
                            }
                        }
                    }
                }
            }
            TradeAsset::Player { player_id, .. } => {
                let row = ctx
                    .league
                    .player(*player_id)
                    .ok_or(ApplyError::UnknownPlayer {
                        player_id: *player_id,
                    })?;
                if row.team_id == receiver {
                    overrides.remove(player_id);
                } else {
                    overrides.insert(*player_id, receiver);
                }
                let out = cap.entry(sender).or_default();
                out.cap_hits_delta -= row.cap_hit;
                out.dead_cap_delta += dead_fraction * row.cap_hit;
                cap.entry(receiver).or_default().cap_hits_delta += row.cap_hit;
            }
        }
    }

    info!("trade applied: {}", offer.describe(ctx.league));

    Ok(StateDelta {
        draft: if draft_changed { draft } else { None },
        pick_inventory: Some(inventory),
        player_team_override: Some(overrides),
        cap_adjustments: Some(cap),
        ..Default::default()
    })
}

/// Like [`try_apply_trade`], but a violated contract is a programming error.
pub fn apply_trade(ctx: &EngineContext<'_>, offer: &TradeOffer) -> StateDelta {
    match try_apply_trade(ctx, offer) {
        Ok(delta) => delta,
        Err(e) => panic!("trade application contract violated: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
