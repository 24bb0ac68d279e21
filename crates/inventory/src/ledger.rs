//! The stock rule and a pure replay of one product's ledger.
//!
//! `next_stock` is what the stores run on the write path. `StockLedger` is a
//! verification helper: it replays a persisted movement log and checks every
//! recorded level. The infra store tests run it against both backends.

use shopledger_core::{DomainError, DomainResult};

use crate::record::{ChangeType, InventoryChange, InventoryRecord};

/// Compute the stock level that results from applying `change` to `current`.
///
/// This is the single stock rule shared by every store: it runs inside the
/// per-product critical section, after the current snapshot has been read and
/// before anything is written. An `OUT` that would go below zero is rejected
/// here, so a rejected change never reaches the write path.
pub fn next_stock(current: i64, change: &InventoryChange) -> DomainResult<i64> {
    change.validate()?;

    let next = match change.change_type {
        ChangeType::In | ChangeType::Adjustment => current.checked_add(change.quantity),
        ChangeType::Out => {
            let next = current.checked_sub(change.quantity);
            if matches!(next, Some(n) if n < 0) {
                return Err(DomainError::insufficient_stock(current, change.quantity));
            }
            next
        }
    };

    next.ok_or_else(|| DomainError::validation("stock level out of range"))
}

/// Pure, in-memory replay of a single product's ledger.
///
/// Mirrors what the stores persist: a running stock level starting at zero and
/// the list of accepted changes with their resulting levels. Used to check that
/// a persisted movement log is internally consistent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockLedger {
    stock: i64,
    accepted: Vec<(InventoryChange, i64)>,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stock(&self) -> i64 {
        self.stock
    }

    pub fn accepted(&self) -> &[(InventoryChange, i64)] {
        &self.accepted
    }

    /// Apply a change; on rejection the ledger is left untouched.
    pub fn apply(&mut self, change: InventoryChange) -> DomainResult<i64> {
        let next = next_stock(self.stock, &change)?;
        self.stock = next;
        self.accepted.push((change, next));
        Ok(next)
    }

    /// Check a product's persisted movement rows (in append order).
    ///
    /// Every movement's recorded `stock` must equal the running level after
    /// replaying it, and the level must never dip below zero. Snapshot rows are
    /// skipped. Returns the final replayed level.
    pub fn verify(movements: &[InventoryRecord]) -> DomainResult<i64> {
        let mut ledger = StockLedger::new();
        for row in movements {
            let Some(change_type) = row.change_type else {
                continue;
            };
            let change = InventoryChange {
                product_id: row.product_id,
                change_type,
                quantity: row.quantity,
                reference: row.reference.clone(),
            };
            let next = ledger.apply(change)?;
            if next != row.stock {
                return Err(DomainError::validation(format!(
                    "movement {} records stock {} but replay gives {}",
                    row.id, row.stock, next
                )));
            }
        }
        Ok(ledger.stock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shopledger_core::{MovementId, ProductId};

    fn change(change_type: ChangeType, quantity: i64) -> InventoryChange {
        InventoryChange::new(ProductId::new(1), change_type, quantity, None).unwrap()
    }

    #[test]
    fn in_and_adjustment_add_stock() {
        assert_eq!(next_stock(0, &change(ChangeType::In, 10)).unwrap(), 10);
        assert_eq!(next_stock(10, &change(ChangeType::Adjustment, 5)).unwrap(), 15);
    }

    #[test]
    fn out_subtracts_down_to_zero() {
        assert_eq!(next_stock(10, &change(ChangeType::Out, 10)).unwrap(), 0);
    }

    #[test]
    fn out_below_zero_is_insufficient_stock() {
        let err = next_stock(3, &change(ChangeType::Out, 4)).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                available: 3,
                requested: 4
            }
        );
    }

    #[test]
    fn rule_re_checks_quantity() {
        let bad = InventoryChange {
            product_id: ProductId::new(1),
            change_type: ChangeType::In,
            quantity: 0,
            reference: None,
        };
        assert!(matches!(next_stock(5, &bad), Err(DomainError::Validation(_))));
    }

    #[test]
    fn overflow_is_rejected() {
        assert!(next_stock(i64::MAX, &change(ChangeType::In, 1)).is_err());
    }

    #[test]
    fn in_100_out_30_out_80_leaves_70() {
        let mut ledger = StockLedger::new();
        assert_eq!(ledger.apply(change(ChangeType::In, 100)).unwrap(), 100);
        assert_eq!(ledger.apply(change(ChangeType::Out, 30)).unwrap(), 70);

        let err = ledger.apply(change(ChangeType::Out, 80)).unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock { available: 70, requested: 80 }));
        assert_eq!(ledger.stock(), 70);
        assert_eq!(ledger.accepted().len(), 2);
    }

    #[test]
    fn verify_detects_inconsistent_rows() {
        let now = Utc::now();
        let row = |id: i64, ct: ChangeType, qty: i64, stock: i64| InventoryRecord {
            id: MovementId::new(id),
            product_id: ProductId::new(1),
            change_type: Some(ct),
            quantity: qty,
            stock,
            change_date: now,
            reference: None,
        };

        let good = vec![row(1, ChangeType::In, 5, 5), row(2, ChangeType::Out, 2, 3)];
        assert_eq!(StockLedger::verify(&good).unwrap(), 3);

        let bad = vec![row(1, ChangeType::In, 5, 5), row(2, ChangeType::Out, 2, 4)];
        assert!(StockLedger::verify(&bad).is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_change() -> impl Strategy<Value = (ChangeType, i64)> {
            (
                prop_oneof![
                    Just(ChangeType::In),
                    Just(ChangeType::Out),
                    Just(ChangeType::Adjustment)
                ],
                1i64..500,
            )
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: the final level equals the signed sum of accepted changes,
            /// and rejected OUTs never change the level.
            #[test]
            fn stock_is_signed_sum_of_accepted_changes(
                changes in proptest::collection::vec(any_change(), 0..60)
            ) {
                let mut ledger = StockLedger::new();
                let mut expected = 0i64;

                for (ct, qty) in changes {
                    let before = ledger.stock();
                    match ledger.apply(change(ct, qty)) {
                        Ok(next) => {
                            expected += match ct {
                                ChangeType::Out => -qty,
                                _ => qty,
                            };
                            prop_assert_eq!(next, expected);
                        }
                        Err(DomainError::InsufficientStock { available, requested }) => {
                            prop_assert_eq!(ct, ChangeType::Out);
                            prop_assert_eq!(available, before);
                            prop_assert!(requested > before);
                            prop_assert_eq!(ledger.stock(), before);
                        }
                        Err(other) => prop_assert!(false, "unexpected error {other:?}"),
                    }
                    prop_assert!(ledger.stock() >= 0);
                }

                prop_assert_eq!(ledger.stock(), expected);
            }
        }
    }
}
