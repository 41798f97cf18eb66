//! Declarative achievement conditions.
//!
//! Data files cannot carry closures, so achievements name one of a small set
//! of threshold checks over the derived view. [`Condition::into_predicate`]
//! turns a parsed condition into the boxed predicate the engine evaluates.

use clicker_core::view::DerivedView;
use serde::Deserialize;

/// A predicate over the derived view, as written in a data file.
///
/// RON: `total_at_least(currency: "cookies", amount: 100.0)`
/// JSON: `{"producer_unlocked": "grandma"}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Current balance of a currency is at least `amount`.
    CurrencyAtLeast { currency: String, amount: f64 },
    /// Lifetime production of a currency is at least `amount`.
    TotalAtLeast { currency: String, amount: f64 },
    /// Per-second production of a currency is at least `amount`.
    ProductionAtLeast { currency: String, amount: f64 },
    ProducerUnlocked(String),
    UpgradeLevelAtLeast { upgrade: String, level: u32 },
    /// Every nested condition holds. Empty is always true.
    All(Vec<Condition>),
    /// At least one nested condition holds. Empty is always false.
    Any(Vec<Condition>),
}

/// The kind of definition a condition refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Currency,
    Producer,
    Upgrade,
}

impl RefKind {
    pub fn name(self) -> &'static str {
        match self {
            RefKind::Currency => "currency",
            RefKind::Producer => "producer",
            RefKind::Upgrade => "upgrade",
        }
    }
}

impl Condition {
    pub fn evaluate(&self, view: &DerivedView) -> bool {
        match self {
            Condition::CurrencyAtLeast { currency, amount } => view.currency(currency) >= *amount,
            Condition::TotalAtLeast { currency, amount } => view.total(currency) >= *amount,
            Condition::ProductionAtLeast { currency, amount } => view.rate(currency) >= *amount,
            Condition::ProducerUnlocked(id) => view.producer_unlocked(id),
            Condition::UpgradeLevelAtLeast { upgrade, level } => view.upgrade_level(upgrade) >= *level,
            Condition::All(conditions) => conditions.iter().all(|c| c.evaluate(view)),
            Condition::Any(conditions) => conditions.iter().any(|c| c.evaluate(view)),
        }
    }

    /// Every definition id this condition names, depth first.
    pub fn references(&self) -> Vec<(RefKind, &str)> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references<'a>(&'a self, refs: &mut Vec<(RefKind, &'a str)>) {
        match self {
            Condition::CurrencyAtLeast { currency, .. }
            | Condition::TotalAtLeast { currency, .. }
            | Condition::ProductionAtLeast { currency, .. } => {
                refs.push((RefKind::Currency, currency));
            }
            Condition::ProducerUnlocked(id) => refs.push((RefKind::Producer, id)),
            Condition::UpgradeLevelAtLeast { upgrade, .. } => refs.push((RefKind::Upgrade, upgrade)),
            Condition::All(conditions) | Condition::Any(conditions) => {
                for c in conditions {
                    c.collect_references(refs);
                }
            }
        }
    }

    pub fn into_predicate(self) -> impl Fn(&DerivedView) -> bool + 'static {
        move |view| self.evaluate(view)
    }
}
