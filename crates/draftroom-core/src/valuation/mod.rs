// Valuation engine: pick curve, player surplus, team context multipliers.

pub mod context;
pub mod pick;
pub mod player;
