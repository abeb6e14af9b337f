// Headless league harness entry point.
//
// Startup sequence:
// 1. Resolve the base directory and initialize tracing under it (log to
//    file, stdout carries the report)
// 2. Load harness settings and engine config
// 3. Load league CSVs
// 4. Run the draft, then the season's trade market
// 5. Print the event log and a JSON summary

mod loader;
mod run;
mod settings;

use std::path::{Path, PathBuf};

use anyhow::Context;
use draftroom_core::config::load_or_default;
use draftroom_core::SaveState;
use tracing::info;

fn main() -> anyhow::Result<()> {
    // 1. Base directory, then tracing
    let base_dir = match std::env::args().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().context("failed to resolve working directory")?,
    };
    init_tracing(&base_dir)?;
    info!("draftroom-sim starting up in {}", base_dir.display());

    // 2. Settings and engine config
    let settings = settings::load_settings(&base_dir)?;
    let config = load_or_default(&base_dir).context("failed to load engine configuration")?;
    info!(
        "Settings loaded: season {}, seed {}, user team {:?}",
        settings.season_year, settings.seed, settings.user_team_id
    );

    // 3. League data
    let data_dir = base_dir.join(&settings.data_dir);
    let league = loader::load_league(&data_dir, settings.season_year, settings.salary_cap)
        .with_context(|| format!("failed to load league data from {}", data_dir.display()))?;
    if let Some(user) = settings.user_team_id {
        anyhow::ensure!(
            league.team(user).is_some(),
            "user_team_id {user} is not in teams.csv"
        );
    }

    // 4. Draft, then season
    let save = SaveState::new(&league, &config);
    let (save, draft_events) =
        run::run_draft(&league, &config, settings.seed, settings.user_team_id, save);
    let (save, season_events) = run::run_season(
        &league,
        &config,
        settings.seed,
        settings.user_team_id,
        settings.season_weeks,
        save,
    );

    // 5. Report
    println!("== Draft ==");
    for event in &draft_events {
        println!("{event}");
    }
    println!("== Season ==");
    for event in &season_events {
        println!("{event}");
    }
    let summary = run::RunSummary::collect(
        &league,
        &save,
        settings.seed,
        settings.user_team_id,
        season_events.len(),
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("failed to serialize run summary")?
    );

    let out_dir = log_dir(&base_dir);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let save_path = out_dir.join("final_save.json");
    let json = serde_json::to_string_pretty(&save).context("failed to serialize save state")?;
    std::fs::write(&save_path, json)
        .with_context(|| format!("failed to write {}", save_path.display()))?;
    info!("Final save state written to {}", save_path.display());

    Ok(())
}

/// Logs and the final save land next to the league data, not the shell's cwd.
fn log_dir(base_dir: &Path) -> PathBuf {
    base_dir.join("logs")
}

/// Initialize tracing to log to a file so stdout stays a clean report.
fn init_tracing(base_dir: &Path) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = log_dir(base_dir);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;

    let log_file = std::fs::File::create(log_dir.join("draftroom-sim.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("draftroom_core=info,draftroom_sim=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
