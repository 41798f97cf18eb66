//! The persisted game state aggregate.
//!
//! [`GameState`] holds only dynamic fields. It is keyed by the string ids of
//! the [`Catalog`] definitions and uses insertion-ordered maps so snapshots
//! and views are deterministic.

use crate::catalog::Catalog;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Dynamic state of one producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerState {
    /// Monotonic: only a full reset clears it.
    pub unlocked: bool,
}

/// Dynamic state of one upgrade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeState {
    /// Number of purchases so far. Never exceeds the definition's `max_level`.
    pub level: u32,
}

/// Everything that is saved between sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Current balance per currency.
    pub currencies: IndexMap<String, f64>,
    /// Lifetime production per currency. Spending never reduces it.
    pub total_currencies: IndexMap<String, f64>,
    pub producers: IndexMap<String, ProducerState>,
    pub upgrades: IndexMap<String, UpgradeState>,
    /// Unlocked achievement ids in unlock order.
    pub achievements: IndexSet<String>,
}

impl GameState {
    /// Fresh state for a catalog: all counters zero, nothing unlocked.
    pub fn new(catalog: &Catalog) -> Self {
        let zeros: IndexMap<String, f64> = catalog
            .currencies()
            .keys()
            .map(|id| (id.clone(), 0.0))
            .collect();

        Self {
            currencies: zeros.clone(),
            total_currencies: zeros,
            producers: catalog
                .producers()
                .iter()
                .map(|p| (p.id.clone(), ProducerState::default()))
                .collect(),
            upgrades: catalog
                .upgrades()
                .iter()
                .map(|u| (u.id.clone(), UpgradeState::default()))
                .collect(),
            achievements: IndexSet::new(),
        }
    }

    /// Current balance. Currencies never seen read as zero.
    pub fn balance(&self, currency: &str) -> f64 {
        self.currencies.get(currency).copied().unwrap_or(0.0)
    }

    /// Lifetime total. Currencies never seen read as zero.
    pub fn total(&self, currency: &str) -> f64 {
        self.total_currencies.get(currency).copied().unwrap_or(0.0)
    }

    /// Producers missing from a loaded snapshot read as locked.
    pub fn is_unlocked(&self, producer_id: &str) -> bool {
        self.producers
            .get(producer_id)
            .is_some_and(|p| p.unlocked)
    }

    /// Upgrades missing from a loaded snapshot read as level 0.
    pub fn level(&self, upgrade_id: &str) -> u32 {
        self.upgrades.get(upgrade_id).map_or(0, |u| u.level)
    }

    pub fn has_achievement(&self, achievement_id: &str) -> bool {
        self.achievements.contains(achievement_id)
    }

    pub(crate) fn set_unlocked(&mut self, producer_id: &str, unlocked: bool) {
        self.producers
            .entry(producer_id.to_string())
            .or_default()
            .unlocked = unlocked;
    }

    pub(crate) fn set_level(&mut self, upgrade_id: &str, level: u32) {
        self.upgrades
            .entry(upgrade_id.to_string())
            .or_default()
            .level = level;
    }

    /// Add produced currency to both the balance and the lifetime total.
    pub(crate) fn credit(&mut self, currency: &str, amount: f64) {
        *self.currencies.entry(currency.to_string()).or_insert(0.0) += amount;
        *self
            .total_currencies
            .entry(currency.to_string())
            .or_insert(0.0) += amount;
    }

    /// Spend from the balance only.
    pub(crate) fn debit(&mut self, currency: &str, amount: f64) {
        *self.currencies.entry(currency.to_string()).or_insert(0.0) -= amount;
    }
}
