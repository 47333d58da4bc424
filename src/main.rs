mod app;
mod input;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use digipet::alerts::{AlertMonitor, LogSink};
use digipet::clock::SystemClock;
use digipet::config::{load_settings, project_paths, Paths, Settings};
use digipet::driver::Driver;
use digipet::model::{PetState, Rules};
use digipet::service::{watch_step, PetService};
use digipet::sim::{derive_mood, Action};
use digipet::storage::JsonFileStore;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "digipet")]
#[command(about = "A tiny virtual pet that lives in your terminal")]
struct Cli {
    /// Where the pet, settings and log live (default: platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace). RUST_LOG wins.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Open the pet screen (default)
    Run,
    /// Keep the pet simulated in the background and log alerts
    Watch,
    /// Print the pet after catching up on elapsed time
    Status,
    Feed,
    Play,
    Clean,
    /// Put the pet to sleep or wake it up
    Sleep,
    /// Start over with a new egg
    Reset,
}

impl Command {
    fn action(self) -> Option<Action> {
        match self {
            Command::Feed => Some(Action::Feed),
            Command::Play => Some(Action::Play),
            Command::Clean => Some(Action::Clean),
            Command::Sleep => Some(Action::ToggleSleep),
            Command::Reset => Some(Action::Reset),
            Command::Run | Command::Watch | Command::Status => None,
        }
    }
}

fn init_logging(level: &str, paths: &Paths, to_file: bool) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(level).parse_default_env();
    if to_file {
        // The alternate screen owns stdout/stderr while the UI runs.
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&paths.log_path)
            .with_context(|| format!("could not open log {}", paths.log_path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init()?;
    Ok(())
}

type Service = PetService<JsonFileStore, SystemClock>;

fn print_pet(pet: &PetState) {
    println!(
        "{} | age {:.2} days | {:?} | {}{}",
        pet.stage().as_str(),
        pet.age(),
        derive_mood(pet),
        if pet.is_alive() { "alive" } else { "dead" },
        if pet.is_sleeping() { ", sleeping" } else { "" }
    );
    println!(
        "hunger {:5.1}  happiness {:5.1}  energy {:5.1}  cleanliness {:5.1}  milestones {}",
        pet.hunger(),
        pet.happiness(),
        pet.energy(),
        pet.cleanliness(),
        pet.milestones_achieved()
    );
}

fn watch(service: Service, rules: &Rules, settings: &Settings) -> Result<()> {
    let mut monitor = AlertMonitor::new(settings.alert_cooldown_ms());
    let mut sink = LogSink;

    // Run once immediately so a long absence is reported without waiting.
    if watch_step(&service, &mut monitor, &mut sink).is_break() {
        return Ok(());
    }

    let mut driver = Driver::new("digipet-watch", Duration::from_secs(rules.watch_step_secs));
    driver.start(move || watch_step(&service, &mut monitor, &mut sink))?;
    log::info!("watching every {}s", rules.watch_step_secs);
    if !driver.join() {
        anyhow::bail!("background watch stopped unexpectedly");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Run);

    let paths = project_paths(cli.data_dir.as_deref())?;
    let settings = load_settings(&paths.settings_path);
    let level = cli.log_level.clone().unwrap_or_else(|| settings.log_level.clone());
    init_logging(&level, &paths, command == Command::Run)?;

    let rules = Rules::default();
    let service = PetService::new(
        JsonFileStore::new(&paths.pet_path),
        SystemClock,
        rules.clone(),
    );

    match command {
        Command::Run => app::run(service, settings, paths),
        Command::Watch => watch(service, &rules, &settings),
        Command::Status => {
            let (pet, summary) = service.resume();
            if summary.has_anything() {
                println!("(caught up {:.0} minutes)", summary.elapsed_minutes);
            }
            print_pet(&pet);
            Ok(())
        }
        other => {
            let Some(action) = other.action() else {
                return Ok(());
            };
            service.resume();
            let (pet, outcome) = service.act(action);
            println!("{}", outcome.message());
            print_pet(&pet);
            Ok(())
        }
    }
}
