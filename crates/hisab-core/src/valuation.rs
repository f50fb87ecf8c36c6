//! # Valuation Module
//!
//! Batch-level cost tracking and full-history inventory valuation.
//!
//! ## Replay Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Valuation Replay                                    │
//! │                                                                         │
//! │  stock_movements (ordered)          BatchQueues                         │
//! │  ────────────────────────           ───────────                         │
//! │                                                                         │
//! │  stock_in  10 @ 500 ──────────────► item-1: [10@500]                    │
//! │  stock_in  10 @ 700 ──────────────► item-1: [10@500, 10@700]            │
//! │  stock_out 12       ──────────────► FIFO: [ 8@700]  value 5600          │
//! │                                     LIFO: [ 8@500]  value 4000          │
//! │                                                                         │
//! │  Every loading run replays the ledger from the first entry. No          │
//! │  snapshots, no incremental state. History is the only truth.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Properties the fold maintains
//! - `stock_in` always appends a batch at the queue tail; the cost method
//!   only decides which end `stock_out` consumes from.
//! - Remaining stock per item is the same under FIFO and LIFO; only the
//!   remaining *value* differs.
//! - An outflow larger than what the queues hold drains them and records
//!   the uncovered remainder as a shortfall. It never errors and never
//!   goes negative.
//! - Inflows after a drained queue start clean new batches; no debt is
//!   carried forward.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Item, MovementKind, StockMovement};

// =============================================================================
// Cost Method
// =============================================================================

/// Which end of the batch queue outflows consume from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostMethod {
    /// First in, first out: oldest batches are consumed first.
    #[default]
    Fifo,
    /// Last in, first out: newest batches are consumed first.
    Lifo,
}

impl CostMethod {
    /// Stable lowercase name for logs and CLI flags.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CostMethod::Fifo => "fifo",
            CostMethod::Lifo => "lifo",
        }
    }
}

// =============================================================================
// Batches
// =============================================================================

/// A cost batch: units received together at one unit cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Units remaining in this batch.
    pub quantity: i64,
    /// Unit cost in paisa, frozen from the stock_in entry.
    pub unit_cost_paisa: i64,
    /// When the batch arrived (the stock_in entry's timestamp).
    pub received_at: DateTime<Utc>,
}

impl Batch {
    /// Remaining value of the batch (quantity × unit cost) in paisa.
    #[inline]
    pub fn value_paisa(&self) -> i64 {
        self.quantity * self.unit_cost_paisa
    }

    /// Unit cost as Money.
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_paisa(self.unit_cost_paisa)
    }
}

/// Per-item batch queues, built by folding the stock ledger.
///
/// ## Queue discipline
/// One `VecDeque<Batch>` per item. Inflows push at the back in ledger
/// order, so the front is always the oldest batch. Outflows pop from the
/// front (FIFO) or the back (LIFO), shrinking a batch in place when it
/// is only partly consumed.
#[derive(Debug, Clone)]
pub struct BatchQueues {
    method: CostMethod,
    queues: HashMap<String, VecDeque<Batch>>,
    shortfalls: HashMap<String, i64>,
}

impl BatchQueues {
    /// Creates empty queues for the given cost method.
    pub fn new(method: CostMethod) -> Self {
        BatchQueues {
            method,
            queues: HashMap::new(),
            shortfalls: HashMap::new(),
        }
    }

    /// The cost method these queues consume under.
    #[inline]
    pub fn method(&self) -> CostMethod {
        self.method
    }

    /// Applies one ledger entry.
    ///
    /// Entries must be fed in ledger order; the fold has no way to
    /// reorder history after the fact.
    pub fn apply(&mut self, movement: &StockMovement) {
        match movement.kind {
            MovementKind::StockIn => self.receive(
                &movement.item_id,
                movement.quantity,
                movement.unit_price_paisa,
                movement.occurred_at,
            ),
            MovementKind::StockOut => self.consume(&movement.item_id, movement.quantity),
        }
    }

    /// Opens a new batch at the tail of the item's queue.
    fn receive(&mut self, item_id: &str, quantity: i64, unit_cost_paisa: i64, at: DateTime<Utc>) {
        self.queues
            .entry(item_id.to_string())
            .or_default()
            .push_back(Batch {
                quantity,
                unit_cost_paisa,
                received_at: at,
            });
    }

    /// Consumes `quantity` units from the item's queue.
    ///
    /// FIFO eats from the front, LIFO from the back. A batch larger than
    /// the remainder shrinks in place; smaller batches are removed whole.
    /// Units the queue cannot cover are recorded as shortfall and
    /// otherwise dropped.
    fn consume(&mut self, item_id: &str, quantity: i64) {
        let mut remaining = quantity;

        if let Some(queue) = self.queues.get_mut(item_id) {
            while remaining > 0 {
                let batch = match self.method {
                    CostMethod::Fifo => queue.front_mut(),
                    CostMethod::Lifo => queue.back_mut(),
                };
                let Some(batch) = batch else { break };

                if batch.quantity > remaining {
                    batch.quantity -= remaining;
                    remaining = 0;
                } else {
                    remaining -= batch.quantity;
                    match self.method {
                        CostMethod::Fifo => queue.pop_front(),
                        CostMethod::Lifo => queue.pop_back(),
                    };
                }
            }
        }

        if remaining > 0 {
            *self.shortfalls.entry(item_id.to_string()).or_insert(0) += remaining;
        }
    }

    /// Units remaining across the item's batches.
    pub fn stock_of(&self, item_id: &str) -> i64 {
        self.queues
            .get(item_id)
            .map(|q| q.iter().map(|b| b.quantity).sum())
            .unwrap_or(0)
    }

    /// Remaining value of the item's batches in paisa.
    pub fn value_of(&self, item_id: &str) -> i64 {
        self.queues
            .get(item_id)
            .map(|q| q.iter().map(Batch::value_paisa).sum())
            .unwrap_or(0)
    }

    /// Units outflows asked for that no batch could cover.
    pub fn shortfall_of(&self, item_id: &str) -> i64 {
        self.shortfalls.get(item_id).copied().unwrap_or(0)
    }

    /// The item's remaining batches in queue order (oldest first), for
    /// inspection and reporting.
    pub fn batches_of(&self, item_id: &str) -> impl Iterator<Item = &Batch> + '_ {
        self.queues.get(item_id).into_iter().flatten()
    }

    fn has_batches(&self, item_id: &str) -> bool {
        self.queues.get(item_id).is_some_and(|q| !q.is_empty())
    }
}

// =============================================================================
// Valuation Report
// =============================================================================

/// One item's line in a valuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemValuation {
    pub item_id: String,
    pub name: String,
    /// Units remaining, derived from the ledger (not the cached counter).
    pub stock: i64,
    /// Remaining batch value in paisa.
    pub value_paisa: i64,
    /// Outflow units the batch history could not cover.
    pub shortfall: i64,
    /// The cost layers still open, oldest first.
    pub batches: Vec<Batch>,
}

impl ItemValuation {
    /// Remaining value as Money.
    #[inline]
    pub fn value(&self) -> Money {
        Money::from_paisa(self.value_paisa)
    }
}

/// A complete inventory valuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valuation {
    /// Cost method the replay consumed under.
    pub method: CostMethod,
    /// Per-item lines, in the order the item registry was supplied.
    pub items: Vec<ItemValuation>,
    /// Sum of all item values in paisa.
    pub total_value_paisa: i64,
    /// Sum of all remaining units.
    pub total_stock_units: i64,
}

impl Valuation {
    /// Total value as Money.
    #[inline]
    pub fn total_value(&self) -> Money {
        Money::from_paisa(self.total_value_paisa)
    }
}

/// Values the inventory by replaying the full ledger.
///
/// ## Arguments
/// - `items`: the item registry to report on. Archived items are
///   excluded from valuation by not being passed here; their ledger
///   entries still fold through the queues but produce no line.
/// - `movements`: the complete stock ledger in ledger order (time
///   ascending, insertion order breaking ties).
/// - `method`: FIFO or LIFO consumption.
///
/// ## Behavior
/// Items whose queues hold nothing and recorded no shortfall are left
/// out of the report; they would only add zero lines. The fold is pure:
/// replaying the same ledger twice produces the same valuation.
pub fn value_items(items: &[Item], movements: &[StockMovement], method: CostMethod) -> Valuation {
    let mut queues = BatchQueues::new(method);
    for movement in movements {
        queues.apply(movement);
    }

    let mut lines = Vec::new();
    let mut total_value_paisa: i64 = 0;
    let mut total_stock_units: i64 = 0;

    for item in items {
        let shortfall = queues.shortfall_of(&item.id);
        if !queues.has_batches(&item.id) && shortfall == 0 {
            continue;
        }

        let stock = queues.stock_of(&item.id);
        let value_paisa = queues.value_of(&item.id);
        total_value_paisa += value_paisa;
        total_stock_units += stock;

        lines.push(ItemValuation {
            item_id: item.id.clone(),
            name: item.name.clone(),
            stock,
            value_paisa,
            shortfall,
            batches: queues.batches_of(&item.id).cloned().collect(),
        });
    }

    Valuation {
        method,
        items: lines,
        total_value_paisa,
        total_stock_units,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, 12, 0, 0).unwrap()
    }

    fn registry_item(id: &str, name: &str) -> Item {
        Item {
            id: id.to_string(),
            name: name.to_string(),
            category_id: None,
            unit_price_paisa: 0,
            current_stock: 0,
            is_archived: false,
            created_at: day(1),
            updated_at: day(1),
        }
    }

    fn stock_in(item: &str, qty: i64, cost: i64, d: u32) -> StockMovement {
        StockMovement::stock_in(item, qty, Money::from_paisa(cost), "seed", day(d))
    }

    fn stock_out(item: &str, qty: i64, d: u32) -> StockMovement {
        StockMovement::stock_out(item, qty, Money::from_paisa(0), "seed", day(d))
    }

    /// Two batches of 10 at 500 then 700 paisa, sell 12.
    fn two_batch_ledger() -> Vec<StockMovement> {
        vec![
            stock_in("rice", 10, 500, 1),
            stock_in("rice", 10, 700, 2),
            stock_out("rice", 12, 3),
        ]
    }

    #[test]
    fn test_fifo_consumes_oldest_first() {
        let mut queues = BatchQueues::new(CostMethod::Fifo);
        for m in two_batch_ledger() {
            queues.apply(&m);
        }

        // 10@500 gone, 2 taken from 10@700 → 8@700
        assert_eq!(queues.stock_of("rice"), 8);
        assert_eq!(queues.value_of("rice"), 5600);
        assert_eq!(queues.shortfall_of("rice"), 0);

        let batches: Vec<_> = queues.batches_of("rice").collect();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].quantity, 8);
        assert_eq!(batches[0].unit_cost_paisa, 700);
    }

    #[test]
    fn test_lifo_consumes_newest_first() {
        let mut queues = BatchQueues::new(CostMethod::Lifo);
        for m in two_batch_ledger() {
            queues.apply(&m);
        }

        // 10@700 gone, 2 taken from 10@500 → 8@500
        assert_eq!(queues.stock_of("rice"), 8);
        assert_eq!(queues.value_of("rice"), 4000);

        let batches: Vec<_> = queues.batches_of("rice").collect();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].quantity, 8);
        assert_eq!(batches[0].unit_cost_paisa, 500);
    }

    #[test]
    fn test_stock_is_method_invariant() {
        let ledger = vec![
            stock_in("chai", 5, 300, 1),
            stock_in("chai", 7, 350, 2),
            stock_out("chai", 4, 3),
            stock_in("chai", 3, 400, 4),
            stock_out("chai", 6, 5),
        ];

        let mut fifo = BatchQueues::new(CostMethod::Fifo);
        let mut lifo = BatchQueues::new(CostMethod::Lifo);
        for m in &ledger {
            fifo.apply(m);
            lifo.apply(m);
        }

        assert_eq!(fifo.stock_of("chai"), 5);
        assert_eq!(lifo.stock_of("chai"), 5);
        // Value is where the methods diverge
        assert_ne!(fifo.value_of("chai"), lifo.value_of("chai"));
    }

    #[test]
    fn test_partial_consumption_shrinks_batch_in_place() {
        let mut queues = BatchQueues::new(CostMethod::Fifo);
        queues.apply(&stock_in("atta", 10, 500, 1));
        queues.apply(&stock_out("atta", 4, 2));

        let batches: Vec<_> = queues.batches_of("atta").collect();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].quantity, 6);
        assert_eq!(batches[0].received_at, day(1));
        assert_eq!(queues.value_of("atta"), 3000);
    }

    #[test]
    fn test_oversold_drains_and_records_shortfall() {
        let mut queues = BatchQueues::new(CostMethod::Fifo);
        queues.apply(&stock_in("ghee", 5, 1000, 1));
        queues.apply(&stock_out("ghee", 9, 2));

        // 5 covered, 4 uncovered: dropped from value but counted
        assert_eq!(queues.stock_of("ghee"), 0);
        assert_eq!(queues.value_of("ghee"), 0);
        assert_eq!(queues.shortfall_of("ghee"), 4);
    }

    #[test]
    fn test_outflow_with_no_history_is_all_shortfall() {
        let mut queues = BatchQueues::new(CostMethod::Fifo);
        queues.apply(&stock_out("unknown", 3, 1));

        assert_eq!(queues.stock_of("unknown"), 0);
        assert_eq!(queues.value_of("unknown"), 0);
        assert_eq!(queues.shortfall_of("unknown"), 3);
    }

    #[test]
    fn test_inflow_after_drain_starts_fresh() {
        let mut queues = BatchQueues::new(CostMethod::Fifo);
        queues.apply(&stock_in("soap", 2, 800, 1));
        queues.apply(&stock_out("soap", 5, 2)); // shortfall 3
        queues.apply(&stock_in("soap", 6, 900, 3));

        // No debt carried: the new batch is untouched
        assert_eq!(queues.stock_of("soap"), 6);
        assert_eq!(queues.value_of("soap"), 5400);
        assert_eq!(queues.shortfall_of("soap"), 3);
    }

    #[test]
    fn test_items_do_not_interfere() {
        let mut queues = BatchQueues::new(CostMethod::Fifo);
        queues.apply(&stock_in("a", 10, 100, 1));
        queues.apply(&stock_in("b", 10, 200, 1));
        queues.apply(&stock_out("a", 10, 2));

        assert_eq!(queues.stock_of("a"), 0);
        assert_eq!(queues.stock_of("b"), 10);
        assert_eq!(queues.value_of("b"), 2000);
    }

    #[test]
    fn test_valuation_totals() {
        let items = vec![
            registry_item("rice", "Basmati Rice 5kg"),
            registry_item("chai", "Tapal Danedar 190g"),
        ];
        let ledger = vec![
            stock_in("rice", 10, 500, 1),
            stock_in("rice", 10, 700, 2),
            stock_out("rice", 12, 3),
            stock_in("chai", 4, 350, 2),
        ];

        let report = value_items(&items, &ledger, CostMethod::Fifo);

        assert_eq!(report.items.len(), 2);
        assert_eq!(report.total_value_paisa, 5600 + 1400);
        assert_eq!(report.total_stock_units, 8 + 4);
        assert_eq!(report.total_value(), Money::from_paisa(7000));

        // Registry order, with open layers attached
        let rice = &report.items[0];
        assert_eq!(rice.item_id, "rice");
        assert_eq!(rice.batches.len(), 1);
        assert_eq!(rice.batches[0].quantity, 8);
        assert_eq!(rice.batches[0].unit_cost_paisa, 700);
    }

    #[test]
    fn test_valuation_skips_items_without_history() {
        let items = vec![
            registry_item("rice", "Basmati Rice 5kg"),
            registry_item("never-stocked", "Ghost Item"),
        ];
        let ledger = vec![stock_in("rice", 2, 500, 1)];

        let report = value_items(&items, &ledger, CostMethod::Fifo);

        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].item_id, "rice");
    }

    #[test]
    fn test_valuation_keeps_drained_item_with_shortfall() {
        let items = vec![registry_item("ghee", "Dalda Ghee 1kg")];
        let ledger = vec![stock_in("ghee", 5, 1000, 1), stock_out("ghee", 9, 2)];

        let report = value_items(&items, &ledger, CostMethod::Fifo);

        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].stock, 0);
        assert_eq!(report.items[0].value_paisa, 0);
        assert_eq!(report.items[0].shortfall, 4);
        assert!(report.items[0].batches.is_empty());
        assert_eq!(report.total_value_paisa, 0);
    }

    #[test]
    fn test_valuation_excludes_items_outside_registry() {
        // Archived items are filtered before the registry reaches the
        // fold; their ledger entries must not leak into the totals.
        let items = vec![registry_item("rice", "Basmati Rice 5kg")];
        let ledger = vec![
            stock_in("rice", 2, 500, 1),
            stock_in("archived-item", 100, 9900, 1),
        ];

        let report = value_items(&items, &ledger, CostMethod::Fifo);

        assert_eq!(report.items.len(), 1);
        assert_eq!(report.total_value_paisa, 1000);
    }

    #[test]
    fn test_empty_ledger_values_to_zero() {
        let items = vec![registry_item("rice", "Basmati Rice 5kg")];
        let report = value_items(&items, &[], CostMethod::Fifo);

        assert!(report.items.is_empty());
        assert_eq!(report.total_value_paisa, 0);
        assert_eq!(report.total_stock_units, 0);
    }

    #[test]
    fn test_replay_is_deterministic() {
        let items = vec![registry_item("rice", "Basmati Rice 5kg")];
        let ledger = two_batch_ledger();

        let first = value_items(&items, &ledger, CostMethod::Lifo);
        let second = value_items(&items, &ledger, CostMethod::Lifo);

        assert_eq!(first, second);
    }
}
