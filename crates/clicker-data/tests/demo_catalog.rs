//! Loads the catalog shipped with the demo binary and plays it headlessly.

use std::path::Path;
use std::time::Duration;

use clicker_core::engine::{DEFAULT_SAVE_KEY, Engine};
use clicker_core::storage::MemoryStorage;
use clicker_data::load_game_data;

fn demo_dir() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../clicker-demo/data"))
}

#[test]
fn demo_catalog_loads() {
    let data = load_game_data(demo_dir()).unwrap();
    assert_eq!(data.catalog.currencies().len(), 1);
    assert_eq!(data.catalog.producers().len(), 5);
    assert_eq!(data.catalog.upgrades().len(), 8);
    assert_eq!(data.catalog.achievements().len(), 6);
    assert_eq!(data.config.save_key, "clicker-demo-save");
    assert_ne!(data.config.save_key, DEFAULT_SAVE_KEY);
    assert_eq!(data.config.event_history, 128);
}

#[test]
fn demo_catalog_plays() {
    let data = load_game_data(demo_dir()).unwrap();
    let storage = MemoryStorage::new();
    let mut engine = Engine::new(data.catalog, storage.clone(), data.config).unwrap();

    assert!(engine.purchase("start"));
    for _ in 0..15 {
        engine.producer_mut("cursor").unwrap().tick();
    }
    assert!(engine.purchase("hire_grandma"));
    assert_eq!(engine.production_per_second()["cookies"], 1.0);

    engine.advance(Duration::from_secs(10));
    let view = engine.view();
    assert_eq!(view.total("cookies"), 25.0);
    assert!(view.achievement_unlocked("first_cookie"));
    assert!(!view.achievement_unlocked("baker"));

    engine.dispose().unwrap();
    assert!(storage.contains("clicker-demo-save"));
}
