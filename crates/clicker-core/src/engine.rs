//! The engine: owns the canonical game state and orchestrates ticks,
//! achievements, persistence and notifications.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - The immutable [`Catalog`] of definitions
//! - The single mutable [`GameState`]
//! - An [`EventBus`] for notifications
//! - The [`Storage`] collaborator snapshots are flushed to
//! - A [`TickClock`] converting host time into tick cycles
//!
//! Producers and upgrades are not separate objects. [`Producer`] and
//! [`Upgrade`] are views borrowed from the engine; [`ProducerMut`] and
//! [`UpgradeMut`] hold its exclusive borrow for the length of a mutation, so
//! nothing can observe a half-applied purchase.
//!
//! # Tick Cycle
//!
//! Each `step()` runs:
//! 1. **Produce** -- every unlocked auto producer ticks
//! 2. **Achievements** -- locked achievements are checked against a fresh view
//! 3. **Persist** -- the state is flushed to storage
//! 4. **Notify** -- `GameStateChanged` is emitted if anyone listens

use crate::catalog::{AchievementDef, Catalog};
use crate::event::{
    Event, EventBufferIter, EventBus, EventKind, ListenerId, DEFAULT_HISTORY_CAPACITY,
};
use crate::producer::{Producer, ProducerMut};
use crate::serialize::{load_state, save_state, PersistenceError};
use crate::sim::{TickClock, DEFAULT_TICK_INTERVAL};
use crate::state::GameState;
use crate::storage::Storage;
use crate::upgrade::{Upgrade, UpgradeMut};
use crate::view::{derive_view, production_per_second, DerivedView};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Storage key used when none is configured.
pub const DEFAULT_SAVE_KEY: &str = "clicker-game-save";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Engine settings. Every field has a default, so partial config files load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Storage key the snapshot lives under.
    pub save_key: String,
    /// Length of one tick cycle in milliseconds.
    pub tick_interval_ms: u64,
    /// Capacity of the recent-events ring buffer.
    pub event_history: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_key: DEFAULT_SAVE_KEY.to_string(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            event_history: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn with_save_key(mut self, key: impl Into<String>) -> Self {
        self.save_key = key.into();
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_event_history(mut self, capacity: usize) -> Self {
        self.event_history = capacity;
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The clicker state engine.
pub struct Engine {
    pub(crate) catalog: Catalog,
    pub(crate) state: GameState,
    pub(crate) events: EventBus,
    storage: Box<dyn Storage>,
    config: EngineConfig,
    clock: TickClock,
    /// Tick cycles completed by this instance. Not persisted.
    ticks: u64,
    disposed: bool,
    /// Failures from flushes that had no caller to report to.
    persistence_errors: Vec<PersistenceError>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("ticks", &self.ticks)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine over `catalog`, restoring the snapshot stored under
    /// the configured key if there is one.
    ///
    /// A present but undecodable snapshot is reported as
    /// [`PersistenceError::CorruptSaveData`] and no engine is created, so the
    /// bad snapshot is left untouched for inspection.
    pub fn new(
        catalog: Catalog,
        storage: impl Storage + 'static,
        config: EngineConfig,
    ) -> Result<Self, PersistenceError> {
        let (state, restored) = match load_state(&storage, &config.save_key)? {
            Some(state) => (state, true),
            None => (GameState::new(&catalog), false),
        };
        log::info!(
            "engine created ({} producers, {} upgrades, {} achievements), save '{}' {}",
            catalog.producers().len(),
            catalog.upgrades().len(),
            catalog.achievements().len(),
            config.save_key,
            if restored { "restored" } else { "not found" },
        );

        Ok(Self {
            catalog,
            state,
            events: EventBus::new(config.event_history),
            storage: Box::new(storage),
            clock: TickClock::new(config.tick_interval()),
            config,
            ticks: 0,
            disposed: false,
            persistence_errors: Vec::new(),
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Register a listener for one event kind.
    pub fn subscribe(&mut self, kind: EventKind, listener: impl FnMut(&Event) + 'static) -> ListenerId {
        self.events.subscribe(kind, Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Recently emitted events, oldest first.
    pub fn recent_events(&self) -> EventBufferIter<'_> {
        self.events.recent()
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub fn producer_by_id(&self, id: &str) -> Option<Producer<'_>> {
        let def = self.catalog.get_producer(id)?;
        Some(Producer::new(def, &self.catalog, &self.state))
    }

    /// All producers in definition order.
    pub fn producers(&self) -> impl Iterator<Item = Producer<'_>> {
        self.catalog
            .producers()
            .iter()
            .map(|def| Producer::new(def, &self.catalog, &self.state))
    }

    pub fn producer_mut(&mut self, id: &str) -> Option<ProducerMut<'_>> {
        let index = self.catalog.producer_index(id)?;
        Some(ProducerMut::new(self, index))
    }

    pub fn upgrade_by_id(&self, id: &str) -> Option<Upgrade<'_>> {
        let def = self.catalog.get_upgrade(id)?;
        Some(Upgrade::new(def, &self.state))
    }

    /// All upgrades in definition order.
    pub fn upgrades(&self) -> impl Iterator<Item = Upgrade<'_>> {
        self.catalog
            .upgrades()
            .iter()
            .map(|def| Upgrade::new(def, &self.state))
    }

    pub fn upgrade_mut(&mut self, id: &str) -> Option<UpgradeMut<'_>> {
        let index = self.catalog.upgrade_index(id)?;
        Some(UpgradeMut::new(self, index))
    }

    pub fn achievement_by_id(&self, id: &str) -> Option<&AchievementDef> {
        self.catalog.get_achievement(id)
    }

    // -----------------------------------------------------------------------
    // Gameplay
    // -----------------------------------------------------------------------

    /// Purchase one level of an upgrade. `false` for unknown ids or when the
    /// purchase is not possible.
    pub fn purchase(&mut self, upgrade_id: &str) -> bool {
        self.upgrade_mut(upgrade_id).is_some_and(|mut u| u.purchase())
    }

    /// Unlock a producer. `false` for unknown ids or if already unlocked.
    pub fn unlock(&mut self, producer_id: &str) -> bool {
        self.unlock_producer(producer_id)
    }

    pub(crate) fn unlock_producer(&mut self, producer_id: &str) -> bool {
        self.producer_mut(producer_id).is_some_and(|mut p| p.unlock())
    }

    /// Per-currency production of all unlocked auto producers.
    pub fn production_per_second(&self) -> IndexMap<String, f64> {
        production_per_second(&self.catalog, &self.state)
    }

    /// Compute the derived view of the current state.
    pub fn view(&self) -> DerivedView {
        derive_view(&self.catalog, &self.state)
    }

    // -----------------------------------------------------------------------
    // Ticking
    // -----------------------------------------------------------------------

    /// Run exactly one tick cycle. Returns `false` once disposed.
    pub fn step(&mut self) -> bool {
        if !self.clock.is_running() {
            return false;
        }
        self.run_tick_cycle();
        true
    }

    /// Report elapsed host time; runs one tick cycle per whole interval and
    /// returns how many ran. Always zero once disposed.
    pub fn advance(&mut self, elapsed: Duration) -> u64 {
        let due = self.clock.accumulate(elapsed);
        for _ in 0..due {
            self.run_tick_cycle();
        }
        due
    }

    fn run_tick_cycle(&mut self) {
        for index in 0..self.catalog.producers().len() {
            let def = &self.catalog.producers()[index];
            if def.auto && self.state.is_unlocked(&def.id) {
                ProducerMut::new(self, index).tick();
            }
        }

        self.check_achievements();
        self.persist();
        self.ticks += 1;
        log::trace!("tick {} complete", self.ticks);

        if self.events.has_listeners(EventKind::GameStateChanged) {
            let view = self.view();
            self.events.emit(Event::GameStateChanged {
                state: Box::new(view),
            });
        }
    }

    /// Evaluate every locked achievement against a freshly derived view and
    /// unlock those whose condition holds. Persists once if anything
    /// unlocked. Returns the ids unlocked by this pass.
    pub fn check_achievements(&mut self) -> Vec<String> {
        let view = self.view();
        let mut unlocked = Vec::new();

        for achievement in self.catalog.achievements() {
            if self.state.has_achievement(&achievement.id) || !achievement.is_met(&view) {
                continue;
            }
            self.state.achievements.insert(achievement.id.clone());
            log::debug!("achievement unlocked: '{}'", achievement.id);
            self.events.emit(Event::AchievementUnlocked {
                achievement_id: achievement.id.clone(),
                achievement_name: achievement.name.clone(),
            });
            unlocked.push(achievement.id.clone());
        }

        if !unlocked.is_empty() {
            self.persist();
        }
        unlocked
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Flush the state to storage.
    pub fn save(&mut self) -> Result<(), PersistenceError> {
        save_state(self.storage.as_mut(), &self.config.save_key, &self.state)
    }

    /// Replace the dynamic state wholesale with the stored snapshot.
    /// Returns `false` and leaves the state alone if there is none.
    pub fn load(&mut self) -> Result<bool, PersistenceError> {
        match load_state(self.storage.as_ref(), &self.config.save_key)? {
            Some(state) => {
                self.state = state;
                log::info!("loaded save '{}'", self.config.save_key);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Flush from a context that cannot return the error. Failures are
    /// logged and queued for [`Engine::take_persistence_errors`].
    pub(crate) fn persist(&mut self) {
        if let Err(err) = self.save() {
            log::warn!("failed to persist game state: {err}");
            self.persistence_errors.push(err);
        }
    }

    /// Drain failures from flushes triggered by ticks, purchases and unlocks.
    pub fn take_persistence_errors(&mut self) -> Vec<PersistenceError> {
        std::mem::take(&mut self.persistence_errors)
    }

    /// Flush a final save and stop the tick clock. Calling it again is a
    /// no-op.
    pub fn dispose(&mut self) -> Result<(), PersistenceError> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        let flushed = self.save();
        self.clock.stop();
        log::info!("engine disposed after {} ticks", self.ticks);
        flushed
    }

    /// Dispose, then delete the stored snapshot. In-memory state is left as
    /// is; the engine is expected to be discarded afterwards.
    pub fn reset(&mut self) -> Result<(), PersistenceError> {
        let flushed = self.dispose();
        self.storage.remove(&self.config.save_key)?;
        log::info!("removed save '{}'", self.config.save_key);
        flushed
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if !self.disposed
            && let Err(err) = self.dispose()
        {
            log::warn!("final flush on drop failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::test_utils::*;

    #[test]
    fn lookups_return_none_on_miss() {
        let (engine, _) = memory_engine(basic_catalog());
        assert!(engine.producer_by_id("nope").is_none());
        assert!(engine.upgrade_by_id("nope").is_none());
        assert!(engine.achievement_by_id("nope").is_none());
        assert!(engine.producer_by_id("mine").is_some());
        assert_eq!(engine.achievement_by_id("rich").unwrap().name, "Rich");
    }

    #[test]
    fn unknown_ids_are_inert() {
        let (mut engine, _) = memory_engine(basic_catalog());
        assert!(!engine.purchase("nope"));
        assert!(!engine.unlock("nope"));
        assert!(engine.producer_mut("nope").is_none());
        assert!(engine.upgrade_mut("nope").is_none());
    }

    #[test]
    fn step_credits_unlocked_auto_producers() {
        let (mut engine, _) = memory_engine(basic_catalog());
        engine.unlock("mine");
        engine.unlock("hand");
        assert!(engine.step());
        assert_eq!(engine.state().balance("gold"), 1.0);
        assert_eq!(engine.ticks(), 1);
    }

    #[test]
    fn advance_runs_whole_intervals() {
        let (mut engine, _) = memory_engine(basic_catalog());
        engine.unlock("mine");
        assert_eq!(engine.advance(Duration::from_millis(3400)), 3);
        assert_eq!(engine.advance(Duration::from_millis(600)), 1);
        assert_eq!(engine.state().total("gold"), 4.0);
    }

    #[test]
    fn tick_flushes_to_storage() {
        let (mut engine, storage) = memory_engine(basic_catalog());
        assert!(!storage.contains(DEFAULT_SAVE_KEY));
        engine.step();
        assert!(storage.contains(DEFAULT_SAVE_KEY));
    }

    #[test]
    fn custom_save_key_is_used() {
        let storage = MemoryStorage::new();
        let config = EngineConfig::default().with_save_key("slot-2");
        let mut engine = Engine::new(basic_catalog(), storage.clone(), config).unwrap();
        engine.save().unwrap();
        assert!(storage.contains("slot-2"));
        assert!(!storage.contains(DEFAULT_SAVE_KEY));
    }

    #[test]
    fn dispose_is_idempotent_and_stops_ticking() {
        let (mut engine, _) = memory_engine(basic_catalog());
        engine.unlock("mine");
        engine.dispose().unwrap();
        engine.dispose().unwrap();
        assert!(engine.is_disposed());
        assert!(!engine.step());
        assert_eq!(engine.advance(Duration::from_secs(5)), 0);
        assert_eq!(engine.state().balance("gold"), 0.0);
    }

    #[test]
    fn reset_removes_the_snapshot() {
        let (mut engine, storage) = memory_engine(basic_catalog());
        engine.step();
        engine.reset().unwrap();
        assert!(!storage.contains(DEFAULT_SAVE_KEY));
        assert!(engine.is_disposed());
    }

    #[test]
    fn drop_flushes_a_final_save() {
        let (mut engine, storage) = memory_engine(basic_catalog());
        engine.unlock("mine");
        storage.clone().remove(DEFAULT_SAVE_KEY).unwrap();
        drop(engine);
        assert!(storage.contains(DEFAULT_SAVE_KEY));
    }

    #[test]
    fn config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.save_key, "clicker-game-save");
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.event_history, 256);
    }

    #[test]
    fn partial_config_deserializes_with_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"save_key":"x"}"#).unwrap();
        assert_eq!(config.save_key, "x");
        assert_eq!(config.tick_interval_ms, 1000);
    }
}
