// Harness settings (config/league.toml).
//
// Describes the run rather than the engine: which season, whose team the
// user controls, the seed, and where the league CSVs live.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    pub season_year: u32,
    pub salary_cap: f64,
    pub seed: u64,
    /// Team the user controls. `None` runs an all-CPU league.
    pub user_team_id: Option<u32>,
    pub season_weeks: u32,
    /// Directory holding the league CSVs, relative to the base directory.
    pub data_dir: String,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            season_year: 2026,
            salary_cap: 255_000_000.0,
            seed: 20_260_417,
            user_team_id: None,
            season_weeks: 17,
            data_dir: "data".into(),
        }
    }
}

/// Read `config/league.toml` under `base_dir`, or defaults when absent.
pub fn load_settings(base_dir: &Path) -> anyhow::Result<SimSettings> {
    let path = base_dir.join("config").join("league.toml");
    if !path.exists() {
        info!("{} not found, using default harness settings", path.display());
        return Ok(SimSettings::default());
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let settings: SimSettings =
        toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))?;
    anyhow::ensure!(settings.salary_cap > 0.0, "salary_cap must be positive");
    Ok(settings)
}
