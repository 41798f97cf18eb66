//! Producer views: effective production under upgrades, unlocking, and the
//! per-tick currency credit.

use crate::catalog::{Catalog, CurrencyAmount, EffectKind, ProducerDef, UpgradeDef};
use crate::engine::Engine;
use crate::event::Event;
use crate::state::GameState;
use crate::upgrade::contributing_level;

// ---------------------------------------------------------------------------
// Pure rules
// ---------------------------------------------------------------------------

/// Scalar multiplier applied to a producer's base production.
///
/// Starts at 1.0 and folds every upgrade in definition order: each matching
/// multiplier effect does `m *= value ^ level`, each additive effect does
/// `m += value * level`, where `level` is the upgrade's contributing level.
pub fn production_multiplier(producer_id: &str, upgrades: &[UpgradeDef], state: &GameState) -> f64 {
    let mut multiplier = 1.0;
    for upgrade in upgrades {
        let Some(level) = contributing_level(upgrade, state.level(&upgrade.id)) else {
            continue;
        };
        for effect in upgrade.effect.iter().filter(|e| e.producer_id == producer_id) {
            match effect.kind {
                EffectKind::Multiplier => multiplier *= effect.value.powf(f64::from(level)),
                EffectKind::Additive => multiplier += effect.value * f64::from(level),
            }
        }
    }
    multiplier
}

/// Per-tick output of a producer. Empty while locked.
pub fn production(def: &ProducerDef, upgrades: &[UpgradeDef], state: &GameState) -> Vec<CurrencyAmount> {
    if !state.is_unlocked(&def.id) {
        return Vec::new();
    }
    let multiplier = production_multiplier(&def.id, upgrades, state);
    def.base_production
        .iter()
        .map(|price| CurrencyAmount::new(price.currency.clone(), price.amount * multiplier))
        .collect()
}

// ---------------------------------------------------------------------------
// Read view
// ---------------------------------------------------------------------------

/// Read-only view of one producer over the engine's state.
#[derive(Debug, Clone, Copy)]
pub struct Producer<'a> {
    def: &'a ProducerDef,
    catalog: &'a Catalog,
    state: &'a GameState,
}

impl<'a> Producer<'a> {
    pub(crate) fn new(def: &'a ProducerDef, catalog: &'a Catalog, state: &'a GameState) -> Self {
        Self { def, catalog, state }
    }

    pub fn definition(&self) -> &'a ProducerDef {
        self.def
    }

    pub fn id(&self) -> &'a str {
        &self.def.id
    }

    pub fn name(&self) -> &'a str {
        &self.def.name
    }

    pub fn description(&self) -> &'a str {
        &self.def.description
    }

    pub fn auto(&self) -> bool {
        self.def.auto
    }

    pub fn base_production(&self) -> &'a [CurrencyAmount] {
        &self.def.base_production
    }

    pub fn unlocked(&self) -> bool {
        self.state.is_unlocked(&self.def.id)
    }

    pub fn multiplier(&self) -> f64 {
        production_multiplier(&self.def.id, self.catalog.upgrades(), self.state)
    }

    pub fn production(&self) -> Vec<CurrencyAmount> {
        production(self.def, self.catalog.upgrades(), self.state)
    }
}

// ---------------------------------------------------------------------------
// Mutating handle
// ---------------------------------------------------------------------------

/// Exclusive handle to one producer.
#[derive(Debug)]
pub struct ProducerMut<'a> {
    engine: &'a mut Engine,
    index: usize,
}

impl<'a> ProducerMut<'a> {
    pub(crate) fn new(engine: &'a mut Engine, index: usize) -> Self {
        Self { engine, index }
    }

    pub fn view(&self) -> Producer<'_> {
        let catalog = &self.engine.catalog;
        Producer::new(&catalog.producers()[self.index], catalog, &self.engine.state)
    }

    pub fn unlocked(&self) -> bool {
        self.view().unlocked()
    }

    /// Write the unlock flag directly. Idempotent, no persistence or events.
    pub fn set_unlocked(&mut self, unlocked: bool) {
        let id = &self.engine.catalog.producers()[self.index].id;
        self.engine.state.set_unlocked(id, unlocked);
    }

    pub fn production(&self) -> Vec<CurrencyAmount> {
        self.view().production()
    }

    /// Unlock the producer. Returns `false` if it already was; otherwise
    /// persists and emits [`Event::ProducerUnlocked`].
    pub fn unlock(&mut self) -> bool {
        if self.unlocked() {
            return false;
        }
        self.set_unlocked(true);

        let def = &self.engine.catalog.producers()[self.index];
        let event = Event::ProducerUnlocked {
            producer_id: def.id.clone(),
            producer_name: def.name.clone(),
        };
        log::debug!("unlocked producer '{}'", def.id);
        self.engine.persist();
        self.engine.events.emit(event);
        true
    }

    /// Advance this producer by one tick, crediting its production to the
    /// balance and the lifetime total. No-op while locked.
    pub fn tick(&mut self) {
        for price in self.production() {
            self.engine.state.credit(&price.currency, price.amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::UpgradeEffect;
    use crate::test_utils::*;

    fn unlocked_state(levels: &[(&str, u32)]) -> GameState {
        let mut state = GameState::default();
        state.set_unlocked("mine", true);
        for &(id, level) in levels {
            state.set_level(id, level);
        }
        state
    }

    #[test]
    fn locked_producer_yields_nothing() {
        let def = producer("mine", true, &[("gold", 1.0)]);
        let state = GameState::default();
        assert!(production(&def, &[], &state).is_empty());
    }

    #[test]
    fn multiplier_effect_is_exponential_in_level() {
        let def = producer("mine", true, &[("gold", 1.0)]);
        let upgrades = vec![multiplier_upgrade("drill", "mine", 2.0, 1.0)];
        let state = unlocked_state(&[("drill", 3)]);
        assert_eq!(production(&def, &upgrades, &state), vec![CurrencyAmount::new("gold", 8.0)]);
    }

    #[test]
    fn additive_effect_is_linear_in_level() {
        let def = producer("mine", true, &[("gold", 1.0)]);
        let upgrades = vec![additive_upgrade("cart", "mine", 0.5, 1.0)];
        let state = unlocked_state(&[("cart", 2)]);
        assert_eq!(production(&def, &upgrades, &state), vec![CurrencyAmount::new("gold", 2.0)]);
    }

    #[test]
    fn unlock_upgrade_boosts_from_second_level() {
        let upgrades = vec![unlock_upgrade("open", &["mine"], 2.0, 0.0)];
        let at_one = unlocked_state(&[("open", 1)]);
        let at_two = unlocked_state(&[("open", 2)]);
        assert_eq!(production_multiplier("mine", &upgrades, &at_one), 1.0);
        assert_eq!(production_multiplier("mine", &upgrades, &at_two), 2.0);
    }

    #[test]
    fn upgrades_fold_in_definition_order() {
        let upgrades = vec![
            additive_upgrade("cart", "mine", 1.0, 1.0),
            multiplier_upgrade("drill", "mine", 3.0, 1.0),
        ];
        let state = unlocked_state(&[("cart", 1), ("drill", 1)]);
        // (1 + 1) * 3
        assert_eq!(production_multiplier("mine", &upgrades, &state), 6.0);

        let reversed: Vec<_> = upgrades.into_iter().rev().collect();
        // 1 * 3 + 1
        assert_eq!(production_multiplier("mine", &reversed, &state), 4.0);
    }

    #[test]
    fn effects_on_other_producers_are_ignored() {
        let mut upgrade = multiplier_upgrade("drill", "farm", 5.0, 1.0);
        upgrade.effect.push(UpgradeEffect::multiplier("nowhere", 7.0));
        let state = unlocked_state(&[("drill", 2)]);
        assert_eq!(production_multiplier("mine", &[upgrade], &state), 1.0);
    }

    #[test]
    fn every_base_entry_is_scaled() {
        let def = producer("mine", true, &[("gold", 1.5), ("gems", 0.25)]);
        let upgrades = vec![multiplier_upgrade("drill", "mine", 2.0, 1.0)];
        let state = unlocked_state(&[("drill", 1)]);
        assert_eq!(
            production(&def, &upgrades, &state),
            vec![CurrencyAmount::new("gold", 3.0), CurrencyAmount::new("gems", 0.5)]
        );
    }
}
