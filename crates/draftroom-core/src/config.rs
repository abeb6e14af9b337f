// Engine configuration loading and validation (config/engine.toml).
//
// Every tunable has a default equal to the engine's reference constants, so a
// missing file, a missing section, or a missing key all fall back cleanly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub valuation: ValuationConfig,
    pub trade: TradeConfig,
    pub negotiation: NegotiationConfig,
    pub draft: DraftConfig,
    pub market: MarketConfig,
}

// ---------------------------------------------------------------------------
// [valuation]
// ---------------------------------------------------------------------------

/// Pick curve and player surplus constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    /// `A` in `A * (pick + B)^-k`.
    pub pick_curve_scale: f64,
    /// `B` in `A * (pick + B)^-k`.
    pub pick_curve_offset: f64,
    /// `k` in `A * (pick + B)^-k`.
    pub pick_curve_exponent: f64,
    /// Per-year discount applied to future picks.
    pub future_discount: f64,
    /// TVU granted per $1M of annual surplus value.
    pub tvu_per_million: f64,
    pub certainty_floor: f64,
    pub certainty_ceiling: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            pick_curve_scale: 10_000.0,
            pick_curve_offset: 10.0,
            pick_curve_exponent: 0.62,
            future_discount: 0.15,
            tvu_per_million: 120.0,
            certainty_floor: 0.75,
            certainty_ceiling: 1.05,
        }
    }
}

// ---------------------------------------------------------------------------
// [trade]
// ---------------------------------------------------------------------------

/// Offer evaluation constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeConfig {
    pub friction_base: f64,
    pub friction_per_asset: f64,
    pub friction_per_player: f64,
    /// `rho` in `risk_buffer = rho * uncertainty * (1.5 - risk_tolerance)`.
    pub risk_rho: f64,
    pub noise_min: f64,
    pub noise_max: f64,
    /// Threshold multiplier for the side being asked.
    pub receiver_leverage: f64,
    pub threshold_conservative: f64,
    pub threshold_normal: f64,
    pub threshold_aggressive: f64,
    /// Share of a traded player's AAV the sending team carries as dead cap.
    pub dead_cap_fraction: f64,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            friction_base: 15.0,
            friction_per_asset: 8.0,
            friction_per_player: 18.0,
            risk_rho: 25.0,
            noise_min: 0.02,
            noise_max: 0.06,
            receiver_leverage: 1.15,
            threshold_conservative: 90.0,
            threshold_normal: 50.0,
            threshold_aggressive: 20.0,
            dead_cap_fraction: 0.25,
        }
    }
}

// ---------------------------------------------------------------------------
// [negotiation]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiationConfig {
    /// Rejections further than this from threshold close without a counter.
    pub gap_ceiling: f64,
    pub max_counters: u32,
    /// Rejections within this gap count as near misses for reputation.
    pub near_miss_gap: f64,
    /// Threshold multiplier added per lowball strike.
    pub strike_penalty: f64,
    pub max_strikes: u32,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            gap_ceiling: 220.0,
            max_counters: 2,
            near_miss_gap: 60.0,
            strike_penalty: 0.12,
            max_strikes: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// [draft]
// ---------------------------------------------------------------------------

/// Weights over the top of the board. The favorite is likely, not certain.
pub const TOP_N_WEIGHTS: [f64; 3] = [0.55, 0.30, 0.15];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftConfig {
    /// Future draft years seeded into every team's pick inventory.
    pub future_years: u32,
    /// Board depth the CPU samples from when picking, at most
    /// `TOP_N_WEIGHTS.len()`.
    pub top_n: usize,
    /// Teams below this risk tolerance skip prospects with a medical flag.
    pub medical_skip_below: f64,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            future_years: 2,
            top_n: 3,
            medical_skip_below: 0.45,
        }
    }
}

// ---------------------------------------------------------------------------
// [market]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub max_per_round: u32,
    pub max_trades_per_week: u32,
    pub inbound_max_offers: usize,
    /// Most assets a CPU team will bundle into one package.
    pub max_package_assets: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            max_per_round: 2,
            max_trades_per_week: 2,
            inbound_max_offers: 3,
            max_package_assets: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/engine.toml` relative to `base_dir`.
pub fn load_config_from(base_dir: &Path) -> Result<EngineConfig, ConfigError> {
    let path = base_dir.join("config").join("engine.toml");
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;
    let config = parse_config(&text).map_err(|e| match e {
        ConfigError::ParseError { source, .. } => ConfigError::ParseError {
            path: path.clone(),
            source,
        },
        other => other,
    })?;
    Ok(config)
}

/// Parse and validate a TOML string.
pub fn parse_config(text: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: PathBuf::from("<inline>"),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Copy `defaults/engine.toml` into `config/` when the latter is missing.
/// Returns `true` if a file was copied.
pub fn ensure_config_file(base_dir: &Path) -> Result<bool, ConfigError> {
    let target = base_dir.join("config").join("engine.toml");
    if target.exists() {
        return Ok(false);
    }
    let source = base_dir.join("defaults").join("engine.toml");
    if !source.exists() {
        return Ok(false);
    }

    std::fs::create_dir_all(base_dir.join("config")).map_err(|e| {
        ConfigError::DefaultsCopyError {
            message: format!("failed to create config directory: {e}"),
        }
    })?;
    std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {}: {e}", source.display()),
    })?;
    Ok(true)
}

/// Load `config/engine.toml` if present (after seeding it from defaults),
/// otherwise fall back to built-in defaults.
pub fn load_or_default(base_dir: &Path) -> Result<EngineConfig, ConfigError> {
    if ensure_config_file(base_dir)? {
        info!("Copied default engine.toml into config/");
    }
    match load_config_from(base_dir) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound { path }) => {
            info!("{} not found, using built-in engine defaults", path.display());
            Ok(EngineConfig::default())
        }
        Err(e) => Err(e),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message,
    }
}

fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
    let v = &config.valuation;
    let positive: &[(&str, f64)] = &[
        ("valuation.pick_curve_scale", v.pick_curve_scale),
        ("valuation.pick_curve_exponent", v.pick_curve_exponent),
        ("valuation.tvu_per_million", v.tvu_per_million),
        ("valuation.certainty_floor", v.certainty_floor),
    ];
    for (name, val) in positive {
        if *val <= 0.0 {
            return Err(invalid(name, format!("must be > 0, got {val}")));
        }
    }
    if v.pick_curve_offset < 0.0 {
        return Err(invalid(
            "valuation.pick_curve_offset",
            format!("must be >= 0, got {}", v.pick_curve_offset),
        ));
    }
    if !(0.0..1.0).contains(&v.future_discount) {
        return Err(invalid(
            "valuation.future_discount",
            format!("must be in [0, 1), got {}", v.future_discount),
        ));
    }
    if v.certainty_ceiling < v.certainty_floor {
        return Err(invalid(
            "valuation.certainty_ceiling",
            format!(
                "must be >= certainty_floor ({}), got {}",
                v.certainty_floor, v.certainty_ceiling
            ),
        ));
    }

    let t = &config.trade;
    let non_negative: &[(&str, f64)] = &[
        ("trade.friction_base", t.friction_base),
        ("trade.friction_per_asset", t.friction_per_asset),
        ("trade.friction_per_player", t.friction_per_player),
        ("trade.risk_rho", t.risk_rho),
        ("trade.noise_min", t.noise_min),
        ("trade.threshold_conservative", t.threshold_conservative),
        ("trade.threshold_normal", t.threshold_normal),
        ("trade.threshold_aggressive", t.threshold_aggressive),
    ];
    for (name, val) in non_negative {
        if *val < 0.0 {
            return Err(invalid(name, format!("must be >= 0, got {val}")));
        }
    }
    if t.noise_max < t.noise_min || t.noise_max > 0.5 {
        return Err(invalid(
            "trade.noise_max",
            format!("must be in [noise_min, 0.5], got {}", t.noise_max),
        ));
    }
    if t.receiver_leverage <= 0.0 {
        return Err(invalid(
            "trade.receiver_leverage",
            format!("must be > 0, got {}", t.receiver_leverage),
        ));
    }
    if !(0.0..=1.0).contains(&t.dead_cap_fraction) {
        return Err(invalid(
            "trade.dead_cap_fraction",
            format!("must be between 0.0 and 1.0 inclusive, got {}", t.dead_cap_fraction),
        ));
    }

    let n = &config.negotiation;
    if n.gap_ceiling <= 0.0 {
        return Err(invalid(
            "negotiation.gap_ceiling",
            format!("must be > 0, got {}", n.gap_ceiling),
        ));
    }
    if n.strike_penalty < 0.0 {
        return Err(invalid(
            "negotiation.strike_penalty",
            format!("must be >= 0, got {}", n.strike_penalty),
        ));
    }

    let d = &config.draft;
    if d.top_n == 0 || d.top_n > TOP_N_WEIGHTS.len() {
        return Err(invalid(
            "draft.top_n",
            format!("must be between 1 and {}, got {}", TOP_N_WEIGHTS.len(), d.top_n),
        ));
    }
    if !(0.0..=1.0).contains(&d.medical_skip_below) {
        return Err(invalid(
            "draft.medical_skip_below",
            format!("must be between 0.0 and 1.0 inclusive, got {}", d.medical_skip_below),
        ));
    }

    if config.market.max_package_assets == 0 {
        return Err(invalid("market.max_package_assets", "must be > 0".into()));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
