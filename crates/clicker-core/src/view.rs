//! The derived view: a read-only projection of the game state with
//! production rates, formatted strings and achievement annotations.
//!
//! Recomputed on demand by [`derive_view`]; never persisted. Achievement
//! predicates receive it as their only input.

use crate::catalog::Catalog;
use crate::format::format_number;
use crate::producer::production;
use crate::state::{GameState, ProducerState, UpgradeState};
use indexmap::IndexMap;
use serde::Serialize;

/// An achievement definition annotated with its unlock status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementStatus {
    pub id: String,
    pub name: String,
    pub description: String,
    pub unlocked: bool,
}

/// Snapshot of everything a display or an achievement predicate needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedView {
    pub currencies: IndexMap<String, f64>,
    pub total_currencies: IndexMap<String, f64>,
    pub producers: IndexMap<String, ProducerState>,
    pub upgrades: IndexMap<String, UpgradeState>,

    /// Per-currency production of all unlocked auto producers.
    pub production_per_second: IndexMap<String, f64>,
    /// Per-producer production, empty for locked producers.
    pub production_per_producer: IndexMap<String, IndexMap<String, f64>>,

    pub currencies_text: IndexMap<String, String>,
    pub total_currencies_text: IndexMap<String, String>,
    pub production_per_second_text: IndexMap<String, String>,
    pub production_per_producer_text: IndexMap<String, IndexMap<String, String>>,

    pub achievements: Vec<AchievementStatus>,
}

impl DerivedView {
    pub fn currency(&self, id: &str) -> f64 {
        self.currencies.get(id).copied().unwrap_or(0.0)
    }

    pub fn total(&self, id: &str) -> f64 {
        self.total_currencies.get(id).copied().unwrap_or(0.0)
    }

    pub fn rate(&self, id: &str) -> f64 {
        self.production_per_second.get(id).copied().unwrap_or(0.0)
    }

    pub fn producer_unlocked(&self, id: &str) -> bool {
        self.producers.get(id).is_some_and(|p| p.unlocked)
    }

    pub fn upgrade_level(&self, id: &str) -> u32 {
        self.upgrades.get(id).map_or(0, |u| u.level)
    }

    pub fn achievement_unlocked(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a.id == id && a.unlocked)
    }
}

/// Sum of production over all unlocked auto producers, keyed by currency.
///
/// Every currency in the state starts at zero so idle currencies still
/// appear; currencies only a producer knows about are appended.
pub fn production_per_second(catalog: &Catalog, state: &GameState) -> IndexMap<String, f64> {
    let mut totals: IndexMap<String, f64> = state
        .currencies
        .keys()
        .map(|id| (id.clone(), 0.0))
        .collect();

    for def in catalog.producers().iter().filter(|p| p.auto) {
        for price in production(def, catalog.upgrades(), state) {
            *totals.entry(price.currency).or_insert(0.0) += price.amount;
        }
    }
    totals
}

fn format_map(values: &IndexMap<String, f64>) -> IndexMap<String, String> {
    values
        .iter()
        .map(|(id, v)| (id.clone(), format_number(*v)))
        .collect()
}

/// Compute the derived view for a state.
pub fn derive_view(catalog: &Catalog, state: &GameState) -> DerivedView {
    let production_per_second = production_per_second(catalog, state);

    let production_per_producer: IndexMap<String, IndexMap<String, f64>> = catalog
        .producers()
        .iter()
        .map(|def| {
            let mut rates = IndexMap::new();
            for price in production(def, catalog.upgrades(), state) {
                *rates.entry(price.currency).or_insert(0.0) += price.amount;
            }
            (def.id.clone(), rates)
        })
        .collect();

    let achievements = catalog
        .achievements()
        .iter()
        .map(|a| AchievementStatus {
            id: a.id.clone(),
            name: a.name.clone(),
            description: a.description.clone(),
            unlocked: state.has_achievement(&a.id),
        })
        .collect();

    DerivedView {
        currencies_text: format_map(&state.currencies),
        total_currencies_text: format_map(&state.total_currencies),
        production_per_second_text: format_map(&production_per_second),
        production_per_producer_text: production_per_producer
            .iter()
            .map(|(id, rates)| (id.clone(), format_map(rates)))
            .collect(),
        currencies: state.currencies.clone(),
        total_currencies: state.total_currencies.clone(),
        producers: state.producers.clone(),
        upgrades: state.upgrades.clone(),
        production_per_second,
        production_per_producer,
        achievements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn production_counts_only_unlocked_auto_producers() {
        let catalog = basic_catalog();
        let mut state = GameState::new(&catalog);
        assert_eq!(production_per_second(&catalog, &state)["gold"], 0.0);

        state.set_unlocked("mine", true);
        state.set_unlocked("hand", true);
        // "hand" is manual and never counts.
        assert_eq!(production_per_second(&catalog, &state)["gold"], 1.0);
    }

    #[test]
    fn view_formats_and_annotates() {
        let catalog = basic_catalog();
        let mut state = GameState::new(&catalog);
        state.credit("gold", 1500.0);
        state.set_unlocked("mine", true);
        state.achievements.insert("first_gold".to_string());

        let view = derive_view(&catalog, &state);
        assert_eq!(view.currencies_text["gold"], "1.5K");
        assert_eq!(view.production_per_second_text["gold"], "1");
        assert_eq!(view.production_per_producer["mine"]["gold"], 1.0);
        assert!(view.production_per_producer["hand"].is_empty());
        assert!(view.achievement_unlocked("first_gold"));
        assert!(!view.achievement_unlocked("rich"));
        assert!(view.producer_unlocked("mine"));
        assert_eq!(view.total("gold"), 1500.0);
    }
}
