//! Shared test helpers for unit tests, integration tests and downstream
//! crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::catalog::*;
use crate::engine::{Engine, EngineConfig};
use crate::event::{Event, EventKind};
use crate::storage::{MemoryStorage, Storage, StorageError};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

// ===========================================================================
// Definition constructors
// ===========================================================================

/// A producer named after its id.
pub fn producer(id: &str, auto: bool, base: &[(&str, f64)]) -> ProducerDef {
    ProducerDef {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        auto,
        base_production: base
            .iter()
            .map(|&(currency, amount)| CurrencyAmount::new(currency, amount))
            .collect(),
    }
}

fn upgrade(id: &str, effect: Vec<UpgradeEffect>, base_cost: f64) -> UpgradeDef {
    UpgradeDef {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        with_unlock: false,
        effect,
        base_cost: vec![CurrencyAmount::new("gold", base_cost)],
        cost_multiplier: 1.5,
        max_level: 10,
    }
}

/// Gold-priced multiplier upgrade on one producer. Cost grows 1.5x, max 10.
pub fn multiplier_upgrade(id: &str, target: &str, value: f64, base_cost: f64) -> UpgradeDef {
    upgrade(id, vec![UpgradeEffect::multiplier(target, value)], base_cost)
}

/// Gold-priced additive upgrade on one producer. Cost grows 1.5x, max 10.
pub fn additive_upgrade(id: &str, target: &str, value: f64, base_cost: f64) -> UpgradeDef {
    upgrade(id, vec![UpgradeEffect::additive(target, value)], base_cost)
}

/// Gold-priced `with_unlock` upgrade with a multiplier effect per target.
pub fn unlock_upgrade(id: &str, targets: &[&str], value: f64, base_cost: f64) -> UpgradeDef {
    let effect = targets
        .iter()
        .map(|t| UpgradeEffect::multiplier(*t, value))
        .collect();
    UpgradeDef {
        with_unlock: true,
        ..upgrade(id, effect, base_cost)
    }
}

// ===========================================================================
// Catalogs
// ===========================================================================

/// One currency (`gold`) and:
///
/// - producers `hand` (manual, 1 gold), `mine` (auto, 1 gold), `farm` (auto, 5 gold)
/// - upgrades `start` (unlocks `hand`, free), `open_farm` (unlocks `farm`, 50),
///   `drill` (x2 `mine`, 10), `cart` (+0.5 `mine`, 20)
/// - achievements `first_gold` (1 gold earned) and `rich` (1000 gold earned)
pub fn basic_catalog() -> Catalog {
    let mut b = CatalogBuilder::new();
    b.register_currency(
        "gold",
        CurrencyInfo {
            icon: "coin".to_string(),
            color: "#ffd700".to_string(),
        },
    )
    .register_producer(producer("hand", false, &[("gold", 1.0)]))
    .register_producer(producer("mine", true, &[("gold", 1.0)]))
    .register_producer(producer("farm", true, &[("gold", 5.0)]))
    .register_upgrade(unlock_upgrade("start", &["hand"], 2.0, 0.0))
    .register_upgrade(unlock_upgrade("open_farm", &["farm"], 2.0, 50.0))
    .register_upgrade(multiplier_upgrade("drill", "mine", 2.0, 10.0))
    .register_upgrade(additive_upgrade("cart", "mine", 0.5, 20.0))
    .register_achievement(AchievementDef::new(
        "first_gold",
        "First Gold",
        "Earn your first gold.",
        |view| view.total("gold") >= 1.0,
    ))
    .register_achievement(AchievementDef::new(
        "rich",
        "Rich",
        "Earn 1000 gold.",
        |view| view.total("gold") >= 1000.0,
    ));
    b.build().expect("basic catalog is valid")
}

// ===========================================================================
// Engines
// ===========================================================================

/// Engine over a fresh [`MemoryStorage`]; the returned clone shares it.
pub fn memory_engine(catalog: Catalog) -> (Engine, MemoryStorage) {
    let storage = MemoryStorage::new();
    let engine = Engine::new(catalog, storage.clone(), EngineConfig::default())
        .expect("empty storage always loads");
    (engine, storage)
}

/// Credit `amount` gold to the balance and lifetime total, as if produced.
pub fn grant_gold(engine: &mut Engine, amount: f64) {
    engine.state.credit("gold", amount);
}

// ===========================================================================
// Storage fault injection
// ===========================================================================

/// A [`MemoryStorage`] whose writes can be made to fail on demand.
#[derive(Debug, Clone, Default)]
pub struct FailingStorage {
    pub inner: MemoryStorage,
    failing: Rc<Cell<bool>>,
}

impl FailingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }
}

impl Storage for FailingStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.failing.get() {
            return Err(StorageError::Unavailable("quota exceeded".to_string()));
        }
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.failing.get() {
            return Err(StorageError::Unavailable("backend offline".to_string()));
        }
        self.inner.remove(key)
    }
}

// ===========================================================================
// Event recording
// ===========================================================================

/// Collects every event of every kind emitted by an engine.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Rc<RefCell<Vec<Event>>>,
}

impl EventRecorder {
    /// Subscribe to every kind except `GameStateChanged`, which would make
    /// each tick derive a view.
    pub fn attach(engine: &mut Engine) -> Self {
        let recorder = Self::default();
        for kind in EventKind::ALL {
            if kind == EventKind::GameStateChanged {
                continue;
            }
            let events = recorder.events.clone();
            engine.subscribe(kind, move |e| events.borrow_mut().push(e.clone()));
        }
        recorder
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.borrow().iter().filter(|e| e.kind() == kind).count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}
