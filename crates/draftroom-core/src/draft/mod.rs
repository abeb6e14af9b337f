// Draft engine: board generation, pick selection, and pick bookkeeping.

pub mod board;
pub mod select;
pub mod state;

pub use board::{
    init_draft_state, pick_urgency, DraftProspectBelief, DraftProspectTruth, RiskFlag,
};
pub use select::{best_pick_for_team, run_cpu_picks, user_auto_pick};
pub use state::{
    apply_pick, consume_drafted_pick, consume_used_picks, DraftError, DraftResult, DraftSlot,
    DraftState, UserDraftState,
};
