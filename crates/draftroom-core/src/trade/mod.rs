// Trade engine: offer evaluation, negotiation, application, and the CPU
// market.

pub mod apply;
pub mod desk;
pub mod evaluate;
pub mod market;
pub mod negotiate;
pub mod types;

pub use apply::{apply_trade, try_apply_trade, validate_offer, ApplyError};
pub use desk::{
    post_inbound_offers, propose_user_offer, respond_to_counter, respond_to_inbound, DeskError,
    ProposalOutcome,
};
pub use evaluate::{asset_base_tvu, evaluate_offer};
pub use market::{
    build_pick_package, generate_inbound_draft_offers, simulate_cpu_cpu_draft_trades,
    simulate_cpu_cpu_season_trades,
};
pub use negotiate::{accept_decision, build_counter_offer, AcceptDecision};
pub use types::{
    AssetId, OfferEvals, OfferOrigin, OfferStatus, ThreadStatus, TradeAsset, TradeEval,
    TradeOffer, TradePhase, TradeThread,
};
