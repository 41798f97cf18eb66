//! Clicker Core -- the state engine for incremental ("clicker") games.
//!
//! This crate turns persisted game state plus an immutable content catalog
//! into effective production rates, purchase costs, unlock eligibility and
//! achievement triggers, and advances simulated time one fixed-interval tick
//! at a time.
//!
//! # Tick Cycle
//!
//! Each call to [`engine::Engine::step`] (or each whole interval accumulated
//! by [`engine::Engine::advance`]) runs:
//!
//! 1. **Produce** -- every unlocked auto producer credits its production to
//!    the current and lifetime currency totals.
//! 2. **Achievements** -- a fresh [`view::DerivedView`] is computed and every
//!    locked achievement predicate is evaluated against it.
//! 3. **Persist** -- the state snapshot is flushed to the storage collaborator.
//!
//! Purchases flow the other way: [`upgrade::UpgradeMut::purchase`] deducts the
//! cost, raises the level, unlocks dependent producers, then persists and
//! notifies.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- Owns the canonical [`state::GameState`] and drives
//!   ticks, persistence and notifications.
//! - [`catalog::Catalog`] -- Immutable producer, upgrade and achievement
//!   definitions plus the currency registry.
//! - [`producer::Producer`] / [`upgrade::Upgrade`] -- Read views over one
//!   definition and the shared state; the `*Mut` handles mutate it.
//! - [`event::EventBus`] -- Listener registration and a ring buffer of recent
//!   events.
//! - [`storage::Storage`] -- The key-value persistence collaborator.

pub mod catalog;
pub mod engine;
pub mod event;
pub mod format;
pub mod producer;
pub mod serialize;
pub mod sim;
pub mod state;
pub mod storage;
pub mod upgrade;
pub mod view;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
