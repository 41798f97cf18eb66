//! Headless session runner.
//!
//! Loads a catalog directory, resumes from a file-backed save, plays a
//! scripted session (one click per simulated second, greedy purchases) and
//! logs everything the engine reports.
//!
//! Usage: `clicker-demo [CATALOG_DIR] [SAVE_DIR] [SECONDS]`
//!
//! Set `RUST_LOG=debug` to see individual purchases and unlocks.

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clicker_core::engine::Engine;
use clicker_core::event::{Event, EventKind};
use clicker_core::format::format_number;
use clicker_core::storage::FileStorage;
use clicker_core::upgrade::Upgrade;
use clicker_data::load_game_data;

const DEFAULT_SECONDS: u64 = 300;

/// The producer the scripted player clicks.
const CLICK_TARGET: &str = "cursor";

struct Args {
    catalog_dir: PathBuf,
    save_dir: PathBuf,
    seconds: u64,
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let catalog_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/data")));
    let save_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("clicker-demo-save"));
    let seconds = match args.next() {
        Some(s) => s.parse()?,
        None => DEFAULT_SECONDS,
    };
    Ok(Args {
        catalog_dir,
        save_dir,
        seconds,
    })
}

fn total_cost(upgrade: &Upgrade<'_>) -> f64 {
    upgrade.cost().iter().map(|c| c.amount).sum()
}

/// Buy the cheapest purchasable upgrade. Returns its id on success.
fn buy_cheapest(engine: &mut Engine) -> Option<String> {
    let id = engine
        .upgrades()
        .filter(|u| u.can_purchase())
        .min_by(|a, b| total_cost(a).total_cmp(&total_cost(b)))
        .map(|u| u.id().to_string())?;
    engine.purchase(&id).then_some(id)
}

fn log_events(engine: &mut Engine) {
    engine.subscribe(EventKind::ProducerUnlocked, |event| {
        if let Event::ProducerUnlocked { producer_name, .. } = event {
            log::info!("unlocked {producer_name}");
        }
    });
    engine.subscribe(EventKind::UpgradePurchased, |event| {
        if let Event::UpgradePurchased {
            upgrade_id,
            cost,
            new_level,
        } = event
        {
            let paid: Vec<String> = cost
                .iter()
                .map(|c| format!("{} {}", format_number(c.amount), c.currency))
                .collect();
            log::info!("bought {upgrade_id} level {new_level} for {}", paid.join(", "));
        }
    });
    engine.subscribe(EventKind::AchievementUnlocked, |event| {
        if let Event::AchievementUnlocked {
            achievement_name, ..
        } = event
        {
            log::info!("achievement: {achievement_name}");
        }
    });
}

fn print_summary(engine: &Engine) {
    let view = engine.view();
    println!("\n=== After {} ticks ===", engine.ticks());
    for (currency, text) in &view.currencies_text {
        println!(
            "{currency:>10}: {text} (lifetime {}, {}/s)",
            view.total_currencies_text[currency],
            view.production_per_second_text
                .get(currency)
                .map_or("0", String::as_str),
        );
    }
    println!();
    for producer in engine.producers().filter(|p| p.unlocked()) {
        println!(
            "{:>14} x{}",
            producer.name(),
            format_number(producer.multiplier())
        );
    }
    println!();
    for upgrade in engine.upgrades().filter(|u| u.level() > 0) {
        println!(
            "{:>14} level {}/{}",
            upgrade.name(),
            upgrade.level(),
            upgrade.max_level()
        );
    }
    let earned = view.achievements.iter().filter(|a| a.unlocked).count();
    println!("\nAchievements: {earned}/{}", view.achievements.len());
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    let data = load_game_data(&args.catalog_dir)?;
    let storage = FileStorage::new(&args.save_dir)?;
    log::info!("saving to {}", storage.dir().display());

    let mut engine = Engine::new(data.catalog, storage, data.config)?;
    log_events(&mut engine);

    let interval = engine.config().tick_interval().max(Duration::from_millis(1));
    let mut elapsed = Duration::ZERO;
    while elapsed < Duration::from_secs(args.seconds) {
        if let Some(mut target) = engine.producer_mut(CLICK_TARGET) {
            target.tick();
        }
        while buy_cheapest(&mut engine).is_some() {}
        engine.advance(interval);
        elapsed += interval;
    }

    for err in engine.take_persistence_errors() {
        log::warn!("save failed during session: {err}");
    }
    print_summary(&engine);
    engine.dispose()?;
    Ok(())
}
