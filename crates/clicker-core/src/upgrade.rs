//! Upgrade views: cost scaling, purchase eligibility and the purchase
//! transaction.

use crate::catalog::{CurrencyAmount, UpgradeDef};
use crate::engine::Engine;
use crate::event::Event;
use crate::state::GameState;

// ---------------------------------------------------------------------------
// Pure rules
// ---------------------------------------------------------------------------

/// Cost of the next purchase at `level`: every base cost entry scaled by
/// `cost_multiplier ^ level` and floored.
pub fn cost_at_level(def: &UpgradeDef, level: u32) -> Vec<CurrencyAmount> {
    let multiplier = def.cost_multiplier.powf(f64::from(level));
    def.base_cost
        .iter()
        .map(|price| CurrencyAmount::new(price.currency.clone(), (price.amount * multiplier).floor()))
        .collect()
}

/// The level an upgrade contributes to production with, or `None` when it
/// contributes nothing.
///
/// For `with_unlock` upgrades the first level is spent unlocking, so level
/// `n` boosts with magnitude `n - 1`.
pub fn contributing_level(def: &UpgradeDef, level: u32) -> Option<u32> {
    match (level, def.with_unlock) {
        (0, _) => None,
        (1, true) => None,
        (n, true) => Some(n - 1),
        (n, false) => Some(n),
    }
}

/// Whether every entry of `cost` is covered by the current balances.
pub fn can_afford(state: &GameState, cost: &[CurrencyAmount]) -> bool {
    cost.iter()
        .all(|price| state.balance(&price.currency) >= price.amount)
}

/// Affordable and below `max_level`.
pub fn can_purchase(def: &UpgradeDef, state: &GameState) -> bool {
    let level = state.level(&def.id);
    level < def.max_level && can_afford(state, &cost_at_level(def, level))
}

// ---------------------------------------------------------------------------
// Read view
// ---------------------------------------------------------------------------

/// Read-only view of one upgrade over the engine's state.
#[derive(Debug, Clone, Copy)]
pub struct Upgrade<'a> {
    def: &'a UpgradeDef,
    state: &'a GameState,
}

impl<'a> Upgrade<'a> {
    pub(crate) fn new(def: &'a UpgradeDef, state: &'a GameState) -> Self {
        Self { def, state }
    }

    pub fn definition(&self) -> &'a UpgradeDef {
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

    pub fn with_unlock(&self) -> bool {
        self.def.with_unlock
    }

    pub fn max_level(&self) -> u32 {
        self.def.max_level
    }

    pub fn level(&self) -> u32 {
        self.state.level(&self.def.id)
    }

    pub fn is_maxed(&self) -> bool {
        self.level() >= self.def.max_level
    }

    /// Cost of the next purchase.
    pub fn cost(&self) -> Vec<CurrencyAmount> {
        cost_at_level(self.def, self.level())
    }

    pub fn can_purchase(&self) -> bool {
        can_purchase(self.def, self.state)
    }
}

// ---------------------------------------------------------------------------
// Mutating handle
// ---------------------------------------------------------------------------

/// Exclusive handle to one upgrade. Borrows the engine so purchases run to
/// completion before anything else can touch the state.
#[derive(Debug)]
pub struct UpgradeMut<'a> {
    engine: &'a mut Engine,
    index: usize,
}

impl<'a> UpgradeMut<'a> {
    pub(crate) fn new(engine: &'a mut Engine, index: usize) -> Self {
        Self { engine, index }
    }

    pub fn view(&self) -> Upgrade<'_> {
        Upgrade::new(&self.engine.catalog.upgrades()[self.index], &self.engine.state)
    }

    pub fn level(&self) -> u32 {
        self.view().level()
    }

    /// Overwrite the level, clamped to `max_level`. Does not persist.
    pub fn set_level(&mut self, level: u32) {
        let def = &self.engine.catalog.upgrades()[self.index];
        self.engine.state.set_level(&def.id, level.min(def.max_level));
    }

    pub fn cost(&self) -> Vec<CurrencyAmount> {
        self.view().cost()
    }

    pub fn can_purchase(&self) -> bool {
        self.view().can_purchase()
    }

    /// Buy one level.
    ///
    /// Returns `false` with no side effects when the upgrade is maxed or
    /// unaffordable. Otherwise deducts the cost, raises the level, unlocks
    /// every producer in `effect` if `with_unlock` is set, persists, and
    /// emits [`Event::UpgradePurchased`].
    pub fn purchase(&mut self) -> bool {
        let engine = &mut *self.engine;
        let def = &engine.catalog.upgrades()[self.index];
        let level = engine.state.level(&def.id);
        if level >= def.max_level {
            return false;
        }
        let cost = cost_at_level(def, level);
        if !can_afford(&engine.state, &cost) {
            return false;
        }

        for price in &cost {
            engine.state.debit(&price.currency, price.amount);
        }
        let new_level = level + 1;
        engine.state.set_level(&def.id, new_level);

        let upgrade_id = def.id.clone();
        let targets: Vec<String> = if def.with_unlock {
            def.unlock_targets().into_iter().map(String::from).collect()
        } else {
            Vec::new()
        };
        for producer_id in &targets {
            engine.unlock_producer(producer_id);
        }

        log::debug!("purchased upgrade '{upgrade_id}' -> level {new_level}");
        engine.persist();
        engine.events.emit(Event::UpgradePurchased {
            upgrade_id,
            cost,
            new_level,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn scaling_upgrade() -> UpgradeDef {
        let mut def = multiplier_upgrade("drill", "mine", 2.0, 10.0);
        def.cost_multiplier = 1.5;
        def
    }

    #[test]
    fn cost_is_floored_geometric_growth() {
        let def = scaling_upgrade();
        assert_eq!(cost_at_level(&def, 0)[0].amount, 10.0);
        assert_eq!(cost_at_level(&def, 1)[0].amount, 15.0);
        assert_eq!(cost_at_level(&def, 2)[0].amount, 22.0);
    }

    #[test]
    fn cost_keeps_currency_order() {
        let mut def = scaling_upgrade();
        def.base_cost.push(CurrencyAmount::new("gems", 3.0));
        let cost = cost_at_level(&def, 1);
        assert_eq!(cost[0].currency, "gold");
        assert_eq!(cost[1], CurrencyAmount::new("gems", 4.0));
    }

    #[test]
    fn contributing_level_plain_upgrade() {
        let def = scaling_upgrade();
        assert_eq!(contributing_level(&def, 0), None);
        assert_eq!(contributing_level(&def, 1), Some(1));
        assert_eq!(contributing_level(&def, 3), Some(3));
    }

    #[test]
    fn contributing_level_unlock_upgrade_spends_first_level() {
        let def = unlock_upgrade("open", &["mine"], 2.0, 0.0);
        assert_eq!(contributing_level(&def, 0), None);
        assert_eq!(contributing_level(&def, 1), None);
        assert_eq!(contributing_level(&def, 2), Some(1));
    }

    #[test]
    fn can_purchase_requires_balance_and_headroom() {
        let def = scaling_upgrade();
        let mut state = GameState::default();
        assert!(!can_purchase(&def, &state));

        state.credit("gold", 10.0);
        assert!(can_purchase(&def, &state));

        state.set_level("drill", def.max_level);
        state.credit("gold", 1e9);
        assert!(!can_purchase(&def, &state));
    }

    #[test]
    fn can_afford_treats_unknown_currency_as_empty() {
        let state = GameState::default();
        assert!(!can_afford(&state, &[CurrencyAmount::new("gems", 1.0)]));
        assert!(can_afford(&state, &[CurrencyAmount::new("gems", 0.0)]));
    }
}
