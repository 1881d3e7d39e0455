//! Contracts the staff core consumes from the rest of the game, plus
//! small in-memory implementations used by the runner and the tests.
//!
//! RULE: the core never looks collaborators up; they are handed to the
//! orchestrator at construction (Economy, Reputation) or passed per call
//! (Customer).

use crate::role::TaskKind;
use serde::{Deserialize, Serialize};

pub trait Economy {
    /// Take `amount` out of the business account. False when funds are short;
    /// nothing is withdrawn in that case.
    fn withdraw(&mut self, amount: f64, category: &str) -> bool;
    fn deposit(&mut self, amount: f64, category: &str);
}

pub trait Reputation {
    fn adjust(&mut self, amount: f64, reason: &str);
    fn trigger_authority_event(&mut self, reason: &str);
}

/// The target of a single interaction.
pub trait Customer {
    fn id(&self) -> &str;
    fn has_request(&self) -> bool;
    fn request_kind(&self) -> TaskKind;
    fn is_high_priority(&self) -> bool;
    fn adjust_satisfaction(&mut self, delta: f64, reason: &str);

    /// Ideal parameter vector for the order, when it has tunable parameters.
    fn preference(&self) -> Option<Vec<f64>> {
        None
    }
}

impl<T: Economy + ?Sized> Economy for &mut T {
    fn withdraw(&mut self, amount: f64, category: &str) -> bool {
        (**self).withdraw(amount, category)
    }

    fn deposit(&mut self, amount: f64, category: &str) {
        (**self).deposit(amount, category)
    }
}

impl<T: Reputation + ?Sized> Reputation for &mut T {
    fn adjust(&mut self, amount: f64, reason: &str) {
        (**self).adjust(amount, reason)
    }

    fn trigger_authority_event(&mut self, reason: &str) {
        (**self).trigger_authority_event(reason)
    }
}

// ── Ledger ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Positive for deposits, negative for withdrawals.
    pub amount:   f64,
    pub category: String,
}

/// A plain cash account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    pub balance: f64,
    pub entries: Vec<LedgerEntry>,
    /// Withdrawals refused for lack of funds, by category.
    pub refused: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn with_balance(balance: f64) -> Self {
        Self { balance, ..Self::default() }
    }

    /// Net flow recorded under `category`.
    pub fn total_for(&self, category: &str) -> f64 {
        self.entries
            .iter()
            .filter(|e| e.category == category)
            .map(|e| e.amount)
            .sum()
    }
}

impl Economy for Ledger {
    fn withdraw(&mut self, amount: f64, category: &str) -> bool {
        if !amount.is_finite() || amount < 0.0 {
            return false;
        }
        if amount > self.balance {
            self.refused.push(LedgerEntry { amount: -amount, category: category.into() });
            return false;
        }
        self.balance -= amount;
        self.entries.push(LedgerEntry { amount: -amount, category: category.into() });
        true
    }

    fn deposit(&mut self, amount: f64, category: &str) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }
        self.balance += amount;
        self.entries.push(LedgerEntry { amount, category: category.into() });
    }
}

// ── Reputation board ────────────────────────────────────────────────────────

/// Reputation score bounded to [0, 100].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationBoard {
    pub score: f64,
    /// Flat score loss per authority event.
    pub authority_penalty: f64,
    pub history: Vec<(f64, String)>,
    pub authority_events: Vec<String>,
}

impl ReputationBoard {
    pub fn new(initial_score: f64) -> Self {
        Self {
            score: initial_score.clamp(0.0, 100.0),
            authority_penalty: 10.0,
            history: Vec::new(),
            authority_events: Vec::new(),
        }
    }
}

impl Default for ReputationBoard {
    fn default() -> Self {
        Self::new(75.0)
    }
}

impl Reputation for ReputationBoard {
    fn adjust(&mut self, amount: f64, reason: &str) {
        let prev = self.score;
        self.score = (self.score + amount).clamp(0.0, 100.0);
        self.history.push((self.score - prev, reason.to_string()));
    }

    fn trigger_authority_event(&mut self, reason: &str) {
        self.authority_events.push(reason.to_string());
        let penalty = -self.authority_penalty;
        self.adjust(penalty, reason);
    }
}

// ── Walk-in customer ────────────────────────────────────────────────────────

/// A customer with at most one outstanding request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkInCustomer {
    pub id:           String,
    pub request:      Option<TaskKind>,
    pub urgent:       bool,
    pub satisfaction: f64,
    pub preference:   Option<Vec<f64>>,
}

impl WalkInCustomer {
    pub fn new(id: impl Into<String>, request: TaskKind) -> Self {
        Self {
            id: id.into(),
            request: Some(request),
            urgent: false,
            satisfaction: 0.5,
            preference: None,
        }
    }

    pub fn urgent(mut self) -> Self {
        self.urgent = true;
        self
    }

    pub fn with_preference(mut self, optimal: Vec<f64>) -> Self {
        self.preference = Some(optimal);
        self
    }
}

impl Customer for WalkInCustomer {
    fn id(&self) -> &str {
        &self.id
    }

    fn has_request(&self) -> bool {
        self.request.is_some()
    }

    fn request_kind(&self) -> TaskKind {
        self.request.unwrap_or(TaskKind::TakeOrder)
    }

    fn is_high_priority(&self) -> bool {
        self.urgent
    }

    fn adjust_satisfaction(&mut self, delta: f64, _reason: &str) {
        self.satisfaction = (self.satisfaction + delta).clamp(0.0, 1.0);
    }

    fn preference(&self) -> Option<Vec<f64>> {
        self.preference.clone()
    }
}
