//! Serde data file structs for game content definitions.
//!
//! Producers and upgrades are read straight into the engine's
//! [`ProducerDef`] and [`UpgradeDef`]. Currencies and achievements need a
//! file-specific shape: currencies are keyed by id in the catalog, and
//! achievements carry a declarative [`Condition`] instead of a closure.

use crate::condition::Condition;
use clicker_core::catalog::{AchievementDef, CurrencyInfo};
use serde::Deserialize;

pub use clicker_core::catalog::{ProducerDef as ProducerData, UpgradeDef as UpgradeData};

/// A currency entry in `currencies.*`.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyData {
    pub id: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
}

impl CurrencyData {
    pub fn info(&self) -> CurrencyInfo {
        CurrencyInfo {
            icon: self.icon.clone(),
            color: self.color.clone(),
        }
    }
}

/// An achievement entry in `achievements.*`.
#[derive(Debug, Clone, Deserialize)]
pub struct AchievementData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub condition: Condition,
}

impl AchievementData {
    pub fn into_def(self) -> AchievementDef {
        AchievementDef::new(
            self.id,
            self.name,
            self.description,
            self.condition.into_predicate(),
        )
    }
}
