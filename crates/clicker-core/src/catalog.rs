//! Immutable game content: the currency registry and the producer, upgrade
//! and achievement definitions.
//!
//! Definitions are registered on a [`CatalogBuilder`] and frozen by
//! [`CatalogBuilder::build`]. Only the dynamic fields live in
//! [`GameState`](crate::state::GameState); nothing here is ever persisted.

use crate::view::DerivedView;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ---------------------------------------------------------------------------
// Currencies
// ---------------------------------------------------------------------------

/// An amount of one currency. Used for production rates and costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyAmount {
    pub currency: String,
    pub amount: f64,
}

impl CurrencyAmount {
    pub fn new(currency: impl Into<String>, amount: f64) -> Self {
        Self {
            currency: currency.into(),
            amount,
        }
    }
}

/// Display metadata for a currency. Irrelevant to the engine's arithmetic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyInfo {
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
}

// ---------------------------------------------------------------------------
// Producers
// ---------------------------------------------------------------------------

/// A production line definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Whether the line produces on its own every tick.
    pub auto: bool,
    /// Output per tick at multiplier 1.
    pub base_production: Vec<CurrencyAmount>,
}

// ---------------------------------------------------------------------------
// Upgrades
// ---------------------------------------------------------------------------

/// How an upgrade effect folds into a producer's multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// `multiplier *= value ^ level`
    Multiplier,
    /// `multiplier += value * level`
    Additive,
}

/// One modifier an upgrade applies to a producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeEffect {
    pub producer_id: String,
    #[serde(rename = "type")]
    pub kind: EffectKind,
    pub value: f64,
}

impl UpgradeEffect {
    pub fn multiplier(producer_id: impl Into<String>, value: f64) -> Self {
        Self {
            producer_id: producer_id.into(),
            kind: EffectKind::Multiplier,
            value,
        }
    }

    pub fn additive(producer_id: impl Into<String>, value: f64) -> Self {
        Self {
            producer_id: producer_id.into(),
            kind: EffectKind::Additive,
            value,
        }
    }
}

/// A repeatable purchase definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Level 1 unlocks every producer named in `effect` instead of boosting it.
    #[serde(default)]
    pub with_unlock: bool,
    #[serde(default)]
    pub effect: Vec<UpgradeEffect>,
    pub base_cost: Vec<CurrencyAmount>,
    /// Cost growth per level: `base_cost * cost_multiplier ^ level`.
    pub cost_multiplier: f64,
    pub max_level: u32,
}

impl UpgradeDef {
    /// Distinct producer ids referenced by `effect`, in first-seen order.
    pub fn unlock_targets(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.effect
            .iter()
            .map(|e| e.producer_id.as_str())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Achievements
// ---------------------------------------------------------------------------

/// Predicate deciding whether an achievement is earned.
pub type AchievementCondition = Box<dyn Fn(&DerivedView) -> bool>;

/// A one-time flag earned when its condition first holds.
pub struct AchievementDef {
    pub id: String,
    pub name: String,
    pub description: String,
    pub condition: AchievementCondition,
}

impl AchievementDef {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        condition: impl Fn(&DerivedView) -> bool + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            condition: Box::new(condition),
        }
    }

    /// Evaluate the condition against a view.
    pub fn is_met(&self, view: &DerivedView) -> bool {
        (self.condition)(view)
    }
}

impl std::fmt::Debug for AchievementDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AchievementDef")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("condition", &"<fn>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },
    #[error("empty {kind} id")]
    EmptyId { kind: &'static str },
    #[error("upgrade '{upgrade}' has invalid cost multiplier {value}")]
    InvalidCostMultiplier { upgrade: String, value: f64 },
    #[error("not found: {0}")]
    NotFound(String),
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for constructing an immutable [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    currencies: IndexMap<String, CurrencyInfo>,
    producers: Vec<ProducerDef>,
    upgrades: Vec<UpgradeDef>,
    achievements: Vec<AchievementDef>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a currency. Re-registering an id replaces its display info.
    pub fn register_currency(&mut self, id: &str, info: CurrencyInfo) -> &mut Self {
        self.currencies.insert(id.to_string(), info);
        self
    }

    pub fn register_producer(&mut self, producer: ProducerDef) -> &mut Self {
        self.producers.push(producer);
        self
    }

    pub fn register_upgrade(&mut self, upgrade: UpgradeDef) -> &mut Self {
        self.upgrades.push(upgrade);
        self
    }

    pub fn register_achievement(&mut self, achievement: AchievementDef) -> &mut Self {
        self.achievements.push(achievement);
        self
    }

    /// Mutate a registered upgrade by id before the catalog is frozen.
    pub fn mutate_upgrade<F>(&mut self, id: &str, f: F) -> Result<(), CatalogError>
    where
        F: FnOnce(&mut UpgradeDef),
    {
        let upgrade = self
            .upgrades
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        f(upgrade);
        Ok(())
    }

    /// Validate and freeze the catalog.
    ///
    /// Duplicate or empty ids and unusable cost multipliers are errors.
    /// Effects naming an unknown producer stay inert and are only logged.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let producer_index = index_ids("producer", self.producers.iter().map(|p| &p.id))?;
        let upgrade_index = index_ids("upgrade", self.upgrades.iter().map(|u| &u.id))?;
        let achievement_index =
            index_ids("achievement", self.achievements.iter().map(|a| &a.id))?;

        for upgrade in &self.upgrades {
            if !upgrade.cost_multiplier.is_finite() || upgrade.cost_multiplier < 0.0 {
                return Err(CatalogError::InvalidCostMultiplier {
                    upgrade: upgrade.id.clone(),
                    value: upgrade.cost_multiplier,
                });
            }
            for effect in &upgrade.effect {
                if !producer_index.contains_key(&effect.producer_id) {
                    log::warn!(
                        "upgrade '{}' targets unknown producer '{}'; effect is inert",
                        upgrade.id,
                        effect.producer_id
                    );
                }
            }
            for price in &upgrade.base_cost {
                if !self.currencies.contains_key(&price.currency) {
                    log::warn!(
                        "upgrade '{}' costs unregistered currency '{}'",
                        upgrade.id,
                        price.currency
                    );
                }
            }
        }
        for producer in &self.producers {
            for price in &producer.base_production {
                if !self.currencies.contains_key(&price.currency) {
                    log::warn!(
                        "producer '{}' yields unregistered currency '{}'",
                        producer.id,
                        price.currency
                    );
                }
            }
        }

        Ok(Catalog {
            currencies: self.currencies,
            producers: self.producers,
            producer_index,
            upgrades: self.upgrades,
            upgrade_index,
            achievements: self.achievements,
            achievement_index,
        })
    }
}

fn index_ids<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a String>,
) -> Result<HashMap<String, usize>, CatalogError> {
    let mut index = HashMap::new();
    for (i, id) in ids.enumerate() {
        if id.is_empty() {
            return Err(CatalogError::EmptyId { kind });
        }
        if index.insert(id.clone(), i).is_some() {
            return Err(CatalogError::DuplicateId {
                kind,
                id: id.clone(),
            });
        }
    }
    Ok(index)
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable content catalog. Frozen after [`CatalogBuilder::build`].
/// Definition order is significant: upgrades are folded into production
/// in the order they were registered.
#[derive(Debug)]
pub struct Catalog {
    currencies: IndexMap<String, CurrencyInfo>,
    producers: Vec<ProducerDef>,
    producer_index: HashMap<String, usize>,
    upgrades: Vec<UpgradeDef>,
    upgrade_index: HashMap<String, usize>,
    achievements: Vec<AchievementDef>,
    achievement_index: HashMap<String, usize>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    pub fn currencies(&self) -> &IndexMap<String, CurrencyInfo> {
        &self.currencies
    }

    pub fn producers(&self) -> &[ProducerDef] {
        &self.producers
    }

    pub fn upgrades(&self) -> &[UpgradeDef] {
        &self.upgrades
    }

    pub fn achievements(&self) -> &[AchievementDef] {
        &self.achievements
    }

    pub fn producer_index(&self, id: &str) -> Option<usize> {
        self.producer_index.get(id).copied()
    }

    pub fn upgrade_index(&self, id: &str) -> Option<usize> {
        self.upgrade_index.get(id).copied()
    }

    pub fn get_producer(&self, id: &str) -> Option<&ProducerDef> {
        self.producer_index(id).map(|i| &self.producers[i])
    }

    pub fn get_upgrade(&self, id: &str) -> Option<&UpgradeDef> {
        self.upgrade_index(id).map(|i| &self.upgrades[i])
    }

    pub fn get_achievement(&self, id: &str) -> Option<&AchievementDef> {
        self.achievement_index
            .get(id)
            .map(|&i| &self.achievements[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn setup_builder() -> CatalogBuilder {
        let mut b = CatalogBuilder::new();
        b.register_currency("gold", CurrencyInfo::default())
            .register_producer(producer("mine", true, &[("gold", 1.0)]))
            .register_upgrade(multiplier_upgrade("drill", "mine", 2.0, 10.0));
        b
    }

    #[test]
    fn register_and_build() {
        let catalog = setup_builder().build().unwrap();
        assert_eq!(catalog.currencies().len(), 1);
        assert_eq!(catalog.producers().len(), 1);
        assert_eq!(catalog.upgrades().len(), 1);
        assert!(catalog.achievements().is_empty());
    }

    #[test]
    fn lookup_by_id() {
        let catalog = setup_builder().build().unwrap();
        assert_eq!(catalog.get_producer("mine").unwrap().name, "mine");
        assert!(catalog.get_producer("nonexistent").is_none());
        assert_eq!(catalog.upgrade_index("drill"), Some(0));
        assert!(catalog.get_achievement("nope").is_none());
    }

    #[test]
    fn duplicate_producer_fails() {
        let mut b = setup_builder();
        b.register_producer(producer("mine", false, &[]));
        assert!(matches!(
            b.build(),
            Err(CatalogError::DuplicateId { kind: "producer", .. })
        ));
    }

    #[test]
    fn empty_upgrade_id_fails() {
        let mut b = setup_builder();
        b.register_upgrade(multiplier_upgrade("", "mine", 2.0, 1.0));
        assert!(matches!(
            b.build(),
            Err(CatalogError::EmptyId { kind: "upgrade" })
        ));
    }

    #[test]
    fn nan_cost_multiplier_fails() {
        let mut b = setup_builder();
        b.mutate_upgrade("drill", |u| u.cost_multiplier = f64::NAN)
            .unwrap();
        assert!(matches!(
            b.build(),
            Err(CatalogError::InvalidCostMultiplier { .. })
        ));
    }

    #[test]
    fn mutate_nonexistent_fails() {
        let mut b = setup_builder();
        assert!(b.mutate_upgrade("nonexistent", |_| {}).is_err());
    }

    #[test]
    fn unknown_effect_target_is_accepted() {
        let mut b = setup_builder();
        b.register_upgrade(multiplier_upgrade("ghost", "missing", 3.0, 1.0));
        assert!(b.build().is_ok());
    }

    #[test]
    fn unlock_targets_are_deduplicated() {
        let mut upgrade = multiplier_upgrade("u", "a", 2.0, 1.0);
        upgrade.effect.push(UpgradeEffect::additive("b", 1.0));
        upgrade.effect.push(UpgradeEffect::additive("a", 1.0));
        assert_eq!(upgrade.unlock_targets(), vec!["a", "b"]);
    }

    #[test]
    fn effect_kind_uses_type_key() {
        let json = r#"{"producerId":"mine","type":"additive","value":0.5}"#;
        let effect: UpgradeEffect = serde_json::from_str(json).unwrap();
        assert_eq!(effect, UpgradeEffect::additive("mine", 0.5));
    }
}
