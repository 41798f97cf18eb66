//! Headless session: a tiny catalog played by a scripted player.
//!
//! Builds a catalog with one manual and two automatic producers, clicks once
//! per simulated second, buys whatever it can afford, then restarts the
//! engine from the saved snapshot to show the state survives.
//!
//! Run with: `cargo run -p clicker-core --example headless_session`

use clicker_core::catalog::*;
use clicker_core::engine::{Engine, EngineConfig};
use clicker_core::event::{Event, EventKind};
use clicker_core::format::format_number;
use clicker_core::storage::MemoryStorage;
use clicker_core::upgrade::Upgrade;
use std::time::Duration;

fn producer(id: &str, name: &str, auto: bool, rate: f64) -> ProducerDef {
    ProducerDef {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        auto,
        base_production: vec![CurrencyAmount::new("cookies", rate)],
    }
}

fn upgrade(id: &str, with_unlock: bool, effect: UpgradeEffect, cost: f64) -> UpgradeDef {
    UpgradeDef {
        id: id.to_string(),
        name: id.replace('_', " "),
        description: String::new(),
        with_unlock,
        effect: vec![effect],
        base_cost: vec![CurrencyAmount::new("cookies", cost)],
        cost_multiplier: 1.15,
        max_level: 25,
    }
}

fn build_catalog() -> Catalog {
    let mut b = Catalog::builder();
    b.register_currency(
        "cookies",
        CurrencyInfo {
            icon: "cookie".to_string(),
            color: "#c68642".to_string(),
        },
    )
    .register_producer(producer("cursor", "Cursor", false, 1.0))
    .register_producer(producer("grandma", "Grandma", true, 1.0))
    .register_producer(producer("bakery", "Bakery", true, 8.0))
    .register_upgrade(UpgradeDef {
        max_level: 1,
        ..upgrade("hands", true, UpgradeEffect::multiplier("cursor", 2.0), 0.0)
    })
    .register_upgrade(upgrade("hire_grandma", true, UpgradeEffect::additive("grandma", 1.0), 10.0))
    .register_upgrade(upgrade("open_bakery", true, UpgradeEffect::multiplier("bakery", 1.5), 200.0))
    .register_upgrade(upgrade("rolling_pins", false, UpgradeEffect::multiplier("grandma", 2.0), 50.0))
    .register_achievement(AchievementDef::new(
        "hundred",
        "Hundredfold",
        "Bake 100 cookies.",
        |view| view.total("cookies") >= 100.0,
    ))
    .register_achievement(AchievementDef::new(
        "industrial",
        "Industrial",
        "Reach 10 cookies per second.",
        |view| view.rate("cookies") >= 10.0,
    ));
    b.build().unwrap()
}

fn total_cost(upgrade: &Upgrade<'_>) -> f64 {
    upgrade.cost().iter().map(|c| c.amount).sum()
}

/// Buy the cheapest purchasable upgrade, if any.
fn buy_cheapest(engine: &mut Engine) -> Option<String> {
    let id = engine
        .upgrades()
        .filter(|u| u.can_purchase())
        .min_by(|a, b| total_cost(a).total_cmp(&total_cost(b)))
        .map(|u| u.id().to_string())?;
    engine.purchase(&id).then_some(id)
}

fn main() {
    let storage = MemoryStorage::new();
    let mut engine = Engine::new(build_catalog(), storage.clone(), EngineConfig::default()).unwrap();

    engine.subscribe(EventKind::AchievementUnlocked, |event| {
        if let Event::AchievementUnlocked { achievement_name, .. } = event {
            println!("  * achievement: {achievement_name}");
        }
    });
    engine.subscribe(EventKind::ProducerUnlocked, |event| {
        if let Event::ProducerUnlocked { producer_name, .. } = event {
            println!("  * unlocked {producer_name}");
        }
    });

    // --- Step 1: Play for two simulated minutes ---

    for second in 1..=120 {
        if let Some(mut cursor) = engine.producer_mut("cursor") {
            cursor.tick();
        }
        while let Some(id) = buy_cheapest(&mut engine) {
            println!("[{second:>3}s] bought {id}");
        }
        engine.advance(Duration::from_secs(1));
    }

    let view = engine.view();
    println!(
        "\nAfter {} ticks: {} cookies ({} total), {}/s",
        engine.ticks(),
        view.currencies_text["cookies"],
        view.total_currencies_text["cookies"],
        view.production_per_second_text["cookies"],
    );
    engine.dispose().unwrap();

    // --- Step 2: Restart from the snapshot ---

    let restored = Engine::new(build_catalog(), storage, EngineConfig::default()).unwrap();
    println!(
        "Restored: {} cookies, {} achievements, grandma multiplier x{}",
        format_number(restored.state().balance("cookies")),
        restored.state().achievements.len(),
        format_number(restored.producer_by_id("grandma").unwrap().multiplier()),
    );
}
