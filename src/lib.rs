mod config;
pub mod entities;
pub mod plugin;
pub mod replay;
pub mod settings;
pub mod telemetry;
pub mod world;

pub use plugin::{EmptierStats, LootEmptier};
pub use settings::{Settings, TriggerMode};
pub use world::host::{ContainerHost, Scheduler};
pub use world::policy::{EmptyAction, TriggerPolicy};
pub use world::tracker::{
    CloseOutcome, DestroyOutcome, FireOutcome, LootTracker, OpenOutcome, TrackedContainer,
    TrackingState,
};

pub fn run(args: &[String]) -> Result<(), String> {
    let config = config::AppConfig::from_args(args)?;
    telemetry::logging::init(&config.root)?;

    let (settings, report) = Settings::load_or_create(&config.root)?;
    telemetry::logging::log_game(&format!("settings loaded from {}", report.path.display()));
    println!("loot_emptier: settings");
    println!("- file: {}", report.path.display());
    if report.created {
        println!("- created with defaults");
    }
    if let Some(previous) = report.migrated_from.as_deref() {
        println!("- upgraded from version '{}' to {}", previous, settings.version);
    }
    for correction in &report.corrections {
        eprintln!("loot_emptier: settings {}", correction);
    }
    println!("- trigger: {:?}", settings.trigger_policy());
    println!("- delay seconds: {}", settings.delay_seconds);
    println!("- remove instead of drop: {}", settings.remove_instead_of_drop);

    let Some(script_path) = config.script.as_ref() else {
        return Ok(());
    };
    let script = replay::ReplayScript::load(script_path).map_err(|err| err.to_string())?;
    let summary = replay::run(&settings, &script).map_err(|err| err.to_string())?;
    telemetry::logging::log_game(&format!(
        "replay {} finished: {} emptied, {} cancelled",
        script_path.display(),
        summary.stats.fired,
        summary.stats.cancelled
    ));

    println!("loot_emptier: replay {}", script_path.display());
    for (container, outcome) in &summary.emptied {
        println!("- container {}: {:?}", container, outcome);
    }
    println!(
        "- scheduled={}, fired={}, cancelled={}, aborted={}",
        summary.stats.scheduled, summary.stats.fired, summary.stats.cancelled, summary.stats.aborted
    );
    println!(
        "- destroyed={}, ground stacks={}, cleared stacks={}, surviving={}",
        summary.destroyed_containers,
        summary.ground_stacks,
        summary.cleared_stacks,
        summary.surviving_containers
    );
    Ok(())
}
